//! Response management operations

use super::models::*;
use crate::categories::{normalize_slug, Category, CategoryRef};
use crate::error::{ServiceError, ServiceResult};
use crate::store::ContentStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Query for the public response list
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// Category id or slug
    pub category: Option<String>,
    pub tag: Option<String>,
    pub sort: ResponseSort,
    pub skip: usize,
    pub limit: usize,
}

/// Manager for response operations
pub struct ResponseManager {
    store: Arc<dyn ContentStore>,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Keep the first occurrence of each id
fn dedupe(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

fn replace_text(target: &mut String, value: Option<String>, field: &str) -> ServiceResult<()> {
    if let Some(value) = value {
        if value.trim().is_empty() {
            return Err(ServiceError::validation(format!("{} cannot be empty", field)));
        }
        *target = value;
    }
    Ok(())
}

impl ResponseManager {
    /// Create a new response manager
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Filtered, sorted page of summaries plus the total match count.
    ///
    /// A category key that resolves to nothing yields an empty page.
    pub async fn list(&self, params: ListParams) -> ServiceResult<(Vec<ResponseSummary>, usize)> {
        let category = match params.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(key) => match self.resolve_category(key).await? {
                Some(id) => Some(id),
                None => return Ok((Vec::new(), 0)),
            },
        };

        let filter = ResponseFilter {
            category,
            tag: params.tag.filter(|t| !t.is_empty()),
            sort: params.sort,
            skip: params.skip,
            limit: params.limit,
        };

        let (responses, total) = self.store.list_responses(&filter).await?;
        let mut summaries = Vec::with_capacity(responses.len());
        for response in &responses {
            let categories = self.category_refs(&response.categories).await?;
            summaries.push(response.summary(categories));
        }

        Ok((summaries, total))
    }

    /// Full record with resolved categories
    pub async fn get(&self, id: &str) -> ServiceResult<ResponseDetail> {
        let response = self.find(id).await?;
        let categories = self.category_refs(&response.categories).await?;
        Ok(response.detail(categories))
    }

    /// Create a response authored by `author`
    pub async fn create(
        &self,
        req: CreateResponseRequest,
        author: &str,
    ) -> ServiceResult<ResponseDetail> {
        let (Some(title), Some(question), Some(answer), Some(excerpt)) = (
            required(req.title),
            required(req.question),
            required(req.answer),
            required(req.excerpt),
        ) else {
            return Err(ServiceError::validation(
                "Please provide title, question, answer, and excerpt",
            ));
        };

        let now = Utc::now();
        let response = Response {
            id: Uuid::new_v4(),
            title: title.trim().to_string(),
            question,
            answer,
            excerpt,
            references: req.references.unwrap_or_default(),
            categories: dedupe(req.categories.unwrap_or_default()),
            tags: req.tags.unwrap_or_default(),
            author: author.to_string(),
            pdf_url: None,
            created_at: now,
            updated_at: now,
        };

        self.store.create_response(&response).await?;
        info!(response_id = %response.id, author = %response.author, "Created response");

        let categories = self.category_refs(&response.categories).await?;
        Ok(response.detail(categories))
    }

    /// Apply a partial update. Arrays replace wholesale.
    pub async fn update(&self, id: &str, req: UpdateResponseRequest) -> ServiceResult<ResponseDetail> {
        let mut response = self.find(id).await?;

        replace_text(
            &mut response.title,
            req.title.map(|t| t.trim().to_string()),
            "Title",
        )?;
        replace_text(&mut response.question, req.question, "Question")?;
        replace_text(&mut response.answer, req.answer, "Answer")?;
        replace_text(&mut response.excerpt, req.excerpt, "Excerpt")?;
        if let Some(references) = req.references {
            response.references = references;
        }
        if let Some(categories) = req.categories {
            response.categories = dedupe(categories);
        }
        if let Some(tags) = req.tags {
            response.tags = tags;
        }
        response.updated_at = Utc::now();

        if !self.store.update_response(&response).await? {
            return Err(ServiceError::not_found("Response not found"));
        }
        debug!(response_id = %response.id, "Updated response");

        let categories = self.category_refs(&response.categories).await?;
        Ok(response.detail(categories))
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let id = parse_id(id)?;
        if !self.store.delete_response(id).await? {
            return Err(ServiceError::not_found("Response not found"));
        }
        info!(response_id = %id, "Deleted response");
        Ok(())
    }

    /// Relevance-ranked search, capped at [`SEARCH_RESULT_LIMIT`]
    pub async fn search(&self, query: Option<&str>) -> ServiceResult<Vec<ResponseSummary>> {
        let query = query.map(str::trim).unwrap_or_default();
        if query.is_empty() {
            return Err(ServiceError::validation("Please provide a search term"));
        }

        let hits = self
            .store
            .search_responses(query, SEARCH_RESULT_LIMIT)
            .await?;
        debug!(query, hits = hits.len(), "Searched responses");

        let mut summaries = Vec::with_capacity(hits.len());
        for (response, _score) in &hits {
            let categories = self.category_refs(&response.categories).await?;
            summaries.push(response.summary(categories));
        }
        Ok(summaries)
    }

    /// PDF export placeholder: no document is rendered.
    pub async fn export_pdf(&self, id: &str) -> ServiceResult<PdfExport> {
        let response = self.find(id).await?;
        Ok(PdfExport {
            pdf_url: format!("/pdfs/{}.pdf", response.id),
            title: response.title,
        })
    }

    async fn find(&self, id: &str) -> ServiceResult<Response> {
        let id = parse_id(id)?;
        self.store
            .get_response(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Response not found"))
    }

    async fn resolve_category(&self, key: &str) -> ServiceResult<Option<Uuid>> {
        if let Ok(id) = key.parse::<Uuid>() {
            return Ok(Some(id));
        }
        Ok(self
            .store
            .get_category_by_slug(&normalize_slug(key))
            .await?
            .map(|c| c.id))
    }

    /// Display data for the categories that still exist
    async fn category_refs(&self, ids: &[Uuid]) -> ServiceResult<Vec<CategoryRef>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .store
            .get_categories_by_ids(ids)
            .await?
            .iter()
            .map(Category::reference)
            .collect())
    }
}

/// Malformed ids cannot resolve, so they are reported as not found
fn parse_id(id: &str) -> ServiceResult<Uuid> {
    id.parse()
        .map_err(|_| ServiceError::not_found("Response not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_helpers::{test_category, test_response};

    fn manager() -> (ResponseManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (ResponseManager::new(store.clone()), store)
    }

    fn create_req(title: &str) -> CreateResponseRequest {
        CreateResponseRequest {
            title: Some(title.to_string()),
            question: Some(format!("What is {}?", title)),
            answer: Some(format!("<p>{} explained.</p>", title)),
            excerpt: Some("Short".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_missing_field_writes_nothing() {
        let (mgr, store) = manager();
        let mut req = create_req("Trinity");
        req.excerpt = None;

        let err = mgr.create(req, "Editor").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(store.responses.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_sets_author_and_defaults() {
        let (mgr, _) = manager();
        let created = mgr.create(create_req("Trinity"), "Ada Editor").await.unwrap();
        assert_eq!(created.author, "Ada Editor");
        assert!(created.references.is_empty());
        assert!(created.categories.is_empty());
        assert!(created.tags.is_empty());
        assert!(created.pdf_url.is_none());
    }

    #[tokio::test]
    async fn test_title_is_trimmed_on_write() {
        let (mgr, store) = manager();
        let created = mgr.create(create_req("  Trinity \n"), "Editor").await.unwrap();
        assert_eq!(created.title, "Trinity");

        let updated = mgr
            .update(
                &created.id.to_string(),
                UpdateResponseRequest {
                    title: Some("\tThe Trinity  ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "The Trinity");
        let stored = store.get_response(created.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "The Trinity");
    }

    #[tokio::test]
    async fn test_create_dedupes_categories_and_resolves_names() {
        let (mgr, store) = manager();
        let deity = test_category("Deity");
        store.create_category(&deity).await.unwrap();

        let mut req = create_req("Trinity");
        req.categories = Some(vec![deity.id, deity.id, Uuid::new_v4()]);
        let created = mgr.create(req, "Editor").await.unwrap();

        // Unknown id is kept in storage but not resolvable for display
        let stored = store.get_response(created.id).await.unwrap().unwrap();
        assert_eq!(stored.categories.len(), 2);
        assert_eq!(created.categories.len(), 1);
        assert_eq!(created.categories[0].slug, "deity");
    }

    #[tokio::test]
    async fn test_get_malformed_id_is_not_found() {
        let (mgr, _) = manager();
        let err = mgr.get("not-a-uuid").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let (mgr, _) = manager();
        let created = mgr.create(create_req("Trinity"), "Editor").await.unwrap();

        let updated = mgr
            .update(
                &created.id.to_string(),
                UpdateResponseRequest {
                    tags: Some(vec!["God".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Trinity");
        assert_eq!(updated.tags, vec!["God"]);
        assert_eq!(updated.author, "Editor");
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_rejects_blank_required_text() {
        let (mgr, _) = manager();
        let created = mgr.create(create_req("Trinity"), "Editor").await.unwrap();
        let err = mgr
            .update(
                &created.id.to_string(),
                UpdateResponseRequest {
                    title: Some("  ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (mgr, _) = manager();
        let err = mgr.delete(&Uuid::new_v4().to_string()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_by_slug_and_unknown_slug() {
        let (mgr, store) = manager();
        let deity = test_category("Deity");
        store.create_category(&deity).await.unwrap();
        let mut tagged = test_response("Trinity");
        tagged.categories = vec![deity.id];
        store.create_response(&tagged).await.unwrap();
        store.create_response(&test_response("Other")).await.unwrap();

        let params = ListParams {
            category: Some("DEITY".to_string()),
            limit: 10,
            ..Default::default()
        };
        let (page, total) = mgr.list(params).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].title, "Trinity");
        assert_eq!(page[0].categories[0].name, "Deity");

        let params = ListParams {
            category: Some("missing".to_string()),
            limit: 10,
            ..Default::default()
        };
        let (page, total) = mgr.list(params).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let (mgr, _) = manager();
        assert!(matches!(
            mgr.search(None).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            mgr.search(Some("   ")).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_pdf_export_stub() {
        let (mgr, _) = manager();
        let created = mgr.create(create_req("Trinity"), "Editor").await.unwrap();
        let pdf = mgr.export_pdf(&created.id.to_string()).await.unwrap();
        assert_eq!(pdf.title, "Trinity");
        assert_eq!(pdf.pdf_url, format!("/pdfs/{}.pdf", created.id));
    }
}

//! Category management operations

use super::models::*;
use crate::error::{ServiceError, ServiceResult};
use crate::responses::{ResponseFilter, ResponseSort, ResponseSummary};
use crate::store::ContentStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A page of responses in one category, with the category echoed back
pub struct CategoryResponsesPage {
    pub category: CategoryListing,
    pub responses: Vec<ResponseSummary>,
    pub total: usize,
}

/// Manager for category operations
pub struct CategoryManager {
    store: Arc<dyn ContentStore>,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl CategoryManager {
    /// Create a new category manager
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// All categories sorted by name, optionally with live response counts
    pub async fn list(&self, with_counts: bool) -> ServiceResult<Vec<CategoryListing>> {
        let categories = self.store.list_categories().await?;
        let mut listings: Vec<CategoryListing> = categories.iter().map(Category::listing).collect();

        if with_counts {
            let counts = self.store.count_responses_per_category().await?;
            for listing in &mut listings {
                listing.count = Some(counts.get(&listing.id).copied().unwrap_or(0));
            }
        }

        Ok(listings)
    }

    /// Resolve a category by id, or by slug when the key is not a UUID
    pub async fn resolve(&self, key: &str) -> ServiceResult<Option<Category>> {
        match key.parse::<Uuid>() {
            Ok(id) => Ok(self.store.get_category(id).await?),
            Err(_) => Ok(self.store.get_category_by_slug(&normalize_slug(key)).await?),
        }
    }

    /// Get a category by id or slug
    pub async fn get(&self, key: &str) -> ServiceResult<Category> {
        self.resolve(key)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category not found"))
    }

    /// Create a category. Name, description and slug are required; name and
    /// slug must be unused.
    pub async fn create(&self, req: CreateCategoryRequest) -> ServiceResult<Category> {
        let (Some(name), Some(description), Some(slug)) = (
            required(req.name),
            required(req.description),
            required(req.slug),
        ) else {
            return Err(ServiceError::validation(
                "Please provide name, description, and slug",
            ));
        };

        let category = Category::new(&name, &description, &slug, req.parent_category);
        self.check_unique(&category, None).await?;

        if let Some(parent) = category.parent_category {
            self.require_parent(parent).await?;
        }

        self.store.create_category(&category).await?;
        info!(category_id = %category.id, slug = %category.slug, "Created category");
        Ok(category)
    }

    /// Apply a partial update
    pub async fn update(&self, key: &str, req: UpdateCategoryRequest) -> ServiceResult<Category> {
        let mut category = self.get(key).await?;

        if let Some(name) = req.name {
            if name.trim().is_empty() {
                return Err(ServiceError::validation("Category name cannot be empty"));
            }
            category.name = name.trim().to_string();
        }
        if let Some(description) = req.description {
            if description.trim().is_empty() {
                return Err(ServiceError::validation("Category description cannot be empty"));
            }
            category.description = description;
        }
        if let Some(slug) = req.slug {
            if slug.trim().is_empty() {
                return Err(ServiceError::validation("Category slug cannot be empty"));
            }
            category.slug = normalize_slug(&slug);
        }

        self.check_unique(&category, Some(category.id)).await?;

        if let Some(parent) = req.parent_category {
            if let Some(parent_id) = parent {
                self.require_parent(parent_id).await?;
                self.check_no_cycle(category.id, parent_id).await?;
            }
            category.parent_category = parent;
        }

        category.updated_at = chrono::Utc::now();
        if !self.store.update_category(&category).await? {
            return Err(ServiceError::not_found("Category not found"));
        }

        debug!(category_id = %category.id, "Updated category");
        Ok(category)
    }

    /// Delete a category unless responses or child categories still point at it
    pub async fn delete(&self, key: &str) -> ServiceResult<()> {
        let category = self.get(key).await?;

        match self.store.delete_category_guarded(category.id).await? {
            CategoryDeletion::Deleted => {
                info!(category_id = %category.id, "Deleted category");
                Ok(())
            }
            CategoryDeletion::NotFound => Err(ServiceError::not_found("Category not found")),
            CategoryDeletion::ReferencedByResponses(count) => {
                warn!(category_id = %category.id, responses = count, "Refused category delete");
                Err(ServiceError::conflict(format!(
                    "Cannot delete category that is used in {} responses",
                    count
                )))
            }
            CategoryDeletion::HasChildren(count) => {
                warn!(category_id = %category.id, children = count, "Refused category delete");
                Err(ServiceError::conflict(format!(
                    "Cannot delete category that is a parent for {} other categories",
                    count
                )))
            }
        }
    }

    /// Paginated responses referencing one category
    pub async fn responses(
        &self,
        key: &str,
        sort: ResponseSort,
        skip: usize,
        limit: usize,
    ) -> ServiceResult<CategoryResponsesPage> {
        let category = self.get(key).await?;
        let filter = ResponseFilter {
            category: Some(category.id),
            tag: None,
            sort,
            skip,
            limit,
        };
        let (responses, total) = self.store.list_responses(&filter).await?;

        let mut summaries = Vec::with_capacity(responses.len());
        for response in &responses {
            let categories = self
                .store
                .get_categories_by_ids(&response.categories)
                .await?
                .iter()
                .map(Category::reference)
                .collect();
            summaries.push(response.summary(categories));
        }

        Ok(CategoryResponsesPage {
            category: category.listing(),
            responses: summaries,
            total,
        })
    }

    async fn check_unique(&self, category: &Category, exclude: Option<Uuid>) -> ServiceResult<()> {
        let clash = self
            .store
            .find_category_conflict(Some(&category.name), Some(&category.slug), exclude)
            .await?;

        match clash {
            Some(existing) if existing.name == category.name => Err(ServiceError::conflict(
                "Category with this name already exists",
            )),
            Some(_) => Err(ServiceError::conflict(
                "Category with this slug already exists",
            )),
            None => Ok(()),
        }
    }

    async fn require_parent(&self, parent: Uuid) -> ServiceResult<()> {
        if self.store.get_category(parent).await?.is_none() {
            return Err(ServiceError::validation("Parent category not found"));
        }
        Ok(())
    }

    /// Walk up from `parent`; reaching `id` means the new link closes a loop.
    async fn check_no_cycle(&self, id: Uuid, parent: Uuid) -> ServiceResult<()> {
        let mut seen = HashSet::new();
        let mut cursor = Some(parent);

        while let Some(current) = cursor {
            if current == id {
                return Err(ServiceError::validation(
                    "A category cannot be its own ancestor",
                ));
            }
            if !seen.insert(current) {
                break;
            }
            cursor = self
                .store
                .get_category(current)
                .await?
                .and_then(|c| c.parent_category);
        }
        Ok(())
    }
}

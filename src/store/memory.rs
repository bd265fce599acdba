//! In-memory implementation of ContentStore.
//!
//! Collections live behind `tokio::sync::RwLock` and keep insertion order,
//! which is the "natural storage order" used to break sort ties. Used for
//! local development (`storage.backend: memory`) and as the test double.
//!
//! Category name and slug uniqueness is enforced again under the write lock,
//! like the Neo4j constraints: when two writers race past the manager's
//! conflict check, the loser gets an error rather than a duplicate.

use crate::categories::{Category, CategoryDeletion};
use crate::responses::{sort_responses, Response, ResponseFilter};
use crate::store::traits::ContentStore;
use crate::users::User;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    pub categories: RwLock<Vec<Category>>,
    pub responses: RwLock<Vec<Response>>,
    pub users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryStore {
    /// Create a new empty MemoryStore.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Another category already holds this name or slug
fn clashes(existing: &Category, candidate: &Category) -> bool {
    existing.id != candidate.id
        && (existing.name == candidate.name || existing.slug == candidate.slug)
}

/// Lowercase alphanumeric words
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// A title hit counts as much as this many body hits.
const TITLE_WEIGHT: usize = 3;

/// Weighted query-term occurrences: title hits count [`TITLE_WEIGHT`] times,
/// question and answer hits once.
fn text_score(response: &Response, terms: &[String]) -> f64 {
    let title = tokenize(&response.title);
    let mut body = tokenize(&response.question);
    body.extend(tokenize(&response.answer));

    let hits = |words: &[String], term: &String| words.iter().filter(|w| *w == term).count();
    terms
        .iter()
        .map(|term| TITLE_WEIGHT * hits(&title[..], term) + hits(&body[..], term))
        .sum::<usize>() as f64
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    // ========================================================================
    // Category operations
    // ========================================================================

    async fn create_category(&self, category: &Category) -> Result<()> {
        let mut categories = self.categories.write().await;
        if categories.iter().any(|c| clashes(c, category)) {
            bail!("Duplicate category name or slug: {}", category.slug);
        }
        categories.push(category.clone());
        Ok(())
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(self
            .categories
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        Ok(self
            .categories
            .read()
            .await
            .iter()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn find_category_conflict(
        &self,
        name: Option<&str>,
        slug: Option<&str>,
        exclude: Option<Uuid>,
    ) -> Result<Option<Category>> {
        let categories = self.categories.read().await;
        Ok(categories
            .iter()
            .filter(|c| Some(c.id) != exclude)
            .find(|c| name == Some(c.name.as_str()) || slug == Some(c.slug.as_str()))
            .cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories = self.categories.read().await.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_categories_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Category>> {
        let categories = self.categories.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| categories.iter().find(|c| c.id == *id).cloned())
            .collect())
    }

    async fn count_responses_per_category(&self) -> Result<HashMap<Uuid, usize>> {
        let mut counts = HashMap::new();
        for response in self.responses.read().await.iter() {
            for category in &response.categories {
                *counts.entry(*category).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn update_category(&self, category: &Category) -> Result<bool> {
        let mut categories = self.categories.write().await;
        if categories.iter().any(|c| clashes(c, category)) {
            bail!("Duplicate category name or slug: {}", category.slug);
        }
        match categories.iter_mut().find(|c| c.id == category.id) {
            Some(existing) => {
                *existing = category.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_category_guarded(&self, id: Uuid) -> Result<CategoryDeletion> {
        // Lock order: categories, then responses.
        let mut categories = self.categories.write().await;
        let responses = self.responses.write().await;

        let Some(position) = categories.iter().position(|c| c.id == id) else {
            return Ok(CategoryDeletion::NotFound);
        };

        let referencing = responses
            .iter()
            .filter(|r| r.categories.contains(&id))
            .count();
        if referencing > 0 {
            return Ok(CategoryDeletion::ReferencedByResponses(referencing));
        }

        let children = categories
            .iter()
            .filter(|c| c.parent_category == Some(id))
            .count();
        if children > 0 {
            return Ok(CategoryDeletion::HasChildren(children));
        }

        categories.remove(position);
        Ok(CategoryDeletion::Deleted)
    }

    // ========================================================================
    // Response operations
    // ========================================================================

    async fn create_response(&self, response: &Response) -> Result<()> {
        self.responses.write().await.push(response.clone());
        Ok(())
    }

    async fn get_response(&self, id: Uuid) -> Result<Option<Response>> {
        Ok(self
            .responses
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn update_response(&self, response: &Response) -> Result<bool> {
        let mut responses = self.responses.write().await;
        match responses.iter_mut().find(|r| r.id == response.id) {
            Some(existing) => {
                *existing = response.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_response(&self, id: Uuid) -> Result<bool> {
        let mut responses = self.responses.write().await;
        let before = responses.len();
        responses.retain(|r| r.id != id);
        Ok(responses.len() < before)
    }

    async fn list_responses(&self, filter: &ResponseFilter) -> Result<(Vec<Response>, usize)> {
        let mut matching: Vec<Response> = self
            .responses
            .read()
            .await
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        let total = matching.len();

        sort_responses(&mut matching, filter.sort);
        let page = matching
            .into_iter()
            .skip(filter.skip)
            .take(filter.limit)
            .collect();

        Ok((page, total))
    }

    async fn search_responses(&self, query: &str, limit: usize) -> Result<Vec<(Response, f64)>> {
        let terms = tokenize(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<(Response, f64)> = self
            .responses
            .read()
            .await
            .iter()
            .map(|r| (r.clone(), text_score(r, &terms)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        hits.sort_by(|a, b| b.1.total_cmp(&a.1));
        hits.truncate(limit);
        Ok(hits)
    }

    // ========================================================================
    // User operations
    // ========================================================================

    async fn create_user(&self, user: &User) -> Result<()> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

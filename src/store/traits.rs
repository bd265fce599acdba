//! ContentStore trait definition
//!
//! The single storage interface behind the managers. `Neo4jClient` is the
//! production implementation and `MemoryStore` the development/test one;
//! callers never know which is in use.

use crate::categories::{Category, CategoryDeletion};
use crate::responses::{Response, ResponseFilter};
use crate::users::User;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Backend name for health output
    fn backend_name(&self) -> &'static str;

    /// Verify connectivity to the backing database
    async fn health_check(&self) -> Result<bool>;

    // ========================================================================
    // Category operations
    // ========================================================================

    /// Insert a new category. Uniqueness is checked by the caller.
    async fn create_category(&self, category: &Category) -> Result<()>;

    /// Get a category by ID
    async fn get_category(&self, id: Uuid) -> Result<Option<Category>>;

    /// Get a category by (lowercase) slug
    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// Find a category other than `exclude` whose name equals `name` or whose
    /// slug equals `slug`.
    async fn find_category_conflict(
        &self,
        name: Option<&str>,
        slug: Option<&str>,
        exclude: Option<Uuid>,
    ) -> Result<Option<Category>>;

    /// All categories, sorted by name
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Categories for the given ids. Unknown ids are skipped; order follows `ids`.
    async fn get_categories_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Category>>;

    /// Number of responses referencing each category id
    async fn count_responses_per_category(&self) -> Result<HashMap<Uuid, usize>>;

    /// Replace a stored category. Returns false if it no longer exists.
    async fn update_category(&self, category: &Category) -> Result<bool>;

    /// Delete a category if no response and no child category references it.
    ///
    /// The reference counts and the delete happen atomically.
    async fn delete_category_guarded(&self, id: Uuid) -> Result<CategoryDeletion>;

    // ========================================================================
    // Response operations
    // ========================================================================

    /// Insert a new response
    async fn create_response(&self, response: &Response) -> Result<()>;

    /// Get a response by ID
    async fn get_response(&self, id: Uuid) -> Result<Option<Response>>;

    /// Replace a stored response. Returns false if it no longer exists.
    async fn update_response(&self, response: &Response) -> Result<bool>;

    /// Delete a response. Returns false if it did not exist.
    async fn delete_response(&self, id: Uuid) -> Result<bool>;

    /// Filtered, sorted page of responses plus the total match count
    async fn list_responses(&self, filter: &ResponseFilter) -> Result<(Vec<Response>, usize)>;

    /// Relevance-ranked text search over title, question and answer.
    ///
    /// Returns (response, score) pairs, best first, at most `limit`.
    async fn search_responses(&self, query: &str, limit: usize) -> Result<Vec<(Response, f64)>>;

    // ========================================================================
    // User operations
    // ========================================================================

    /// Insert a new user. Email uniqueness is checked by the caller.
    async fn create_user(&self, user: &User) -> Result<()>;

    /// Get a user by internal ID
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Get a user by normalized email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Replace a stored user. Returns false if it no longer exists.
    async fn update_user(&self, user: &User) -> Result<bool>;
}

//! `ContentStore` implementation for `Neo4jClient`.
//!
//! Every method delegates to the corresponding inherent method on `Neo4jClient`.

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use super::client::Neo4jClient;
use crate::categories::{Category, CategoryDeletion};
use crate::responses::{Response, ResponseFilter};
use crate::store::ContentStore;
use crate::users::User;

#[async_trait]
impl ContentStore for Neo4jClient {
    fn backend_name(&self) -> &'static str {
        "neo4j"
    }

    async fn health_check(&self) -> anyhow::Result<bool> {
        self.health_check().await
    }

    // ========================================================================
    // Category operations
    // ========================================================================

    async fn create_category(&self, category: &Category) -> anyhow::Result<()> {
        self.create_category(category).await
    }

    async fn get_category(&self, id: Uuid) -> anyhow::Result<Option<Category>> {
        self.get_category(id).await
    }

    async fn get_category_by_slug(&self, slug: &str) -> anyhow::Result<Option<Category>> {
        self.get_category_by_slug(slug).await
    }

    async fn find_category_conflict(
        &self,
        name: Option<&str>,
        slug: Option<&str>,
        exclude: Option<Uuid>,
    ) -> anyhow::Result<Option<Category>> {
        self.find_category_conflict(name, slug, exclude).await
    }

    async fn list_categories(&self) -> anyhow::Result<Vec<Category>> {
        self.list_categories().await
    }

    async fn get_categories_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Category>> {
        self.get_categories_by_ids(ids).await
    }

    async fn count_responses_per_category(&self) -> anyhow::Result<HashMap<Uuid, usize>> {
        self.count_responses_per_category().await
    }

    async fn update_category(&self, category: &Category) -> anyhow::Result<bool> {
        self.update_category(category).await
    }

    async fn delete_category_guarded(&self, id: Uuid) -> anyhow::Result<CategoryDeletion> {
        self.delete_category_guarded(id).await
    }

    // ========================================================================
    // Response operations
    // ========================================================================

    async fn create_response(&self, response: &Response) -> anyhow::Result<()> {
        self.create_response(response).await
    }

    async fn get_response(&self, id: Uuid) -> anyhow::Result<Option<Response>> {
        self.get_response(id).await
    }

    async fn update_response(&self, response: &Response) -> anyhow::Result<bool> {
        self.update_response(response).await
    }

    async fn delete_response(&self, id: Uuid) -> anyhow::Result<bool> {
        self.delete_response(id).await
    }

    async fn list_responses(
        &self,
        filter: &ResponseFilter,
    ) -> anyhow::Result<(Vec<Response>, usize)> {
        self.list_responses(filter).await
    }

    async fn search_responses(
        &self,
        query: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<(Response, f64)>> {
        self.search_responses(query, limit).await
    }

    // ========================================================================
    // User operations
    // ========================================================================

    async fn create_user(&self, user: &User) -> anyhow::Result<()> {
        self.create_user(user).await
    }

    async fn get_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        self.get_user_by_id(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.get_user_by_email(email).await
    }

    async fn update_user(&self, user: &User) -> anyhow::Result<bool> {
        self.update_user(user).await
    }
}

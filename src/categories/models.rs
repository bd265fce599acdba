//! Category models and DTOs
//!
//! A category is a named, slugged topic tag. Categories may nest under a
//! parent category; responses reference categories by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A stored category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Always lowercase
    pub slug: String,
    pub parent_category: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Build a new category, normalizing name and slug the way the store expects.
    pub fn new(name: &str, description: &str, slug: &str, parent: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            description: description.to_string(),
            slug: normalize_slug(slug),
            parent_category: parent,
            created_at: now,
            updated_at: now,
        }
    }

    /// Display fields only (list view)
    pub fn listing(&self) -> CategoryListing {
        CategoryListing {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            slug: self.slug.clone(),
            count: None,
        }
    }

    /// Name + slug, as embedded in responses
    pub fn reference(&self) -> CategoryRef {
        CategoryRef {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
        }
    }
}

/// Slugs are trimmed and stored lowercase.
pub fn normalize_slug(slug: &str) -> String {
    slug.trim().to_lowercase()
}

/// Category as shown in list endpoints
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryListing {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub slug: String,
    /// Live response count, only when explicitly requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

/// Resolved category display data embedded in responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Outcome of the integrity-guarded category delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryDeletion {
    Deleted,
    NotFound,
    /// Responses still reference the category
    ReferencedByResponses(usize),
    /// Other categories still name it as parent
    HasChildren(usize),
}

/// Request body for POST /api/categories
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub parent_category: Option<Uuid>,
}

/// Request body for PUT /api/categories/{id}
///
/// `parentCategory` distinguishes "absent" (keep) from `null` (clear).
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub parent_category: Option<Option<Uuid>>,
}

/// Maps a present field (even `null`) to `Some`, leaving absent fields `None`.
fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

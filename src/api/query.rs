//! Query parameter structs and JSON envelopes shared by the handlers

use crate::categories::CategoryListing;
use crate::responses::ResponseSort;
use serde::{Deserialize, Deserializer, Serialize};

/// Default page number
pub const DEFAULT_PAGE: usize = 1;
/// Default page size
pub const DEFAULT_LIMIT: usize = 10;
/// Largest accepted page size
pub const MAX_LIMIT: usize = 100;

/// Positive integers only; anything else reads as absent.
fn deserialize_positive<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0))
}

/// Query-string booleans: `true` / `1` / `yes`
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(matches!(
        s.as_deref().map(str::trim),
        Some("true") | Some("1") | Some("yes")
    ))
}

/// Page/limit/sort/filter parameters for response lists
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ListQuery {
    #[serde(default, deserialize_with = "deserialize_positive")]
    pub page: Option<usize>,
    #[serde(default, deserialize_with = "deserialize_positive")]
    pub limit: Option<usize>,
    /// `newest` | `oldest` | `az` | `za`
    pub sort: Option<String>,
    /// Category id or slug
    pub category: Option<String>,
    pub tag: Option<String>,
}

impl ListQuery {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    /// Page size, capped at [`MAX_LIMIT`]
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }

    /// Rows to skip before the current page
    pub fn skip(&self) -> usize {
        (self.page() - 1).saturating_mul(self.limit())
    }

    pub fn sort(&self) -> ResponseSort {
        ResponseSort::parse_or_default(self.sort.as_deref())
    }
}

/// `?q=` for search
#[derive(Debug, Deserialize, Default, Clone)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// `?counts=true` on the category list
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CategoryListQuery {
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub counts: bool,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let total_pages = total.div_ceil(limit.max(1));
        Self {
            page,
            limit,
            total,
            total_pages,
            has_more: page < total_pages,
        }
    }
}

/// `{success, data, pagination}` (+ `category` on category pages)
#[derive(Debug, Serialize)]
pub struct ListEnvelope<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryListing>,
}

impl<T> ListEnvelope<T> {
    pub fn new(data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            success: true,
            data,
            pagination,
            category: None,
        }
    }
}

/// `{success, count, data}`
#[derive(Debug, Serialize)]
pub struct CollectionEnvelope<T> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> CollectionEnvelope<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

/// `{success, data}`
#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// `{success, message}`, plus `data` when there is a payload to go with it
#[derive(Debug, Serialize)]
pub struct MessageEnvelope<T = ()> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl MessageEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

impl<T> MessageEnvelope<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

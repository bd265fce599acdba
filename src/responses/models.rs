//! Response models, list/sort/filter types and DTOs
//!
//! A response is a published question/answer record. It carries embedded
//! citations ([`Reference`]), weak links to categories (bare ids) and
//! free-form tags.

use crate::categories::CategoryRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum number of hits returned by full-text search
pub const SEARCH_RESULT_LIMIT: usize = 20;

/// An embedded citation: paper / section / paragraph plus the quoted text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reference {
    pub paper: u32,
    pub section: u32,
    pub paragraph: u32,
    pub quote: String,
}

/// A stored response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: Uuid,
    pub title: String,
    pub question: String,
    /// Rich text (HTML)
    pub answer: String,
    pub excerpt: String,
    pub references: Vec<Reference>,
    /// Category ids; existence is not enforced on write
    pub categories: Vec<Uuid>,
    pub tags: Vec<String>,
    pub author: String,
    pub pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List/search projection: no answer body, no references
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSummary {
    pub id: Uuid,
    pub title: String,
    pub question: String,
    pub excerpt: String,
    pub categories: Vec<CategoryRef>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Full record with categories resolved to display data
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDetail {
    pub id: Uuid,
    pub title: String,
    pub question: String,
    pub answer: String,
    pub excerpt: String,
    pub references: Vec<Reference>,
    pub categories: Vec<CategoryRef>,
    pub tags: Vec<String>,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Response {
    pub fn summary(&self, categories: Vec<CategoryRef>) -> ResponseSummary {
        ResponseSummary {
            id: self.id,
            title: self.title.clone(),
            question: self.question.clone(),
            excerpt: self.excerpt.clone(),
            categories,
            tags: self.tags.clone(),
            created_at: self.created_at,
        }
    }

    pub fn detail(self, categories: Vec<CategoryRef>) -> ResponseDetail {
        ResponseDetail {
            id: self.id,
            title: self.title,
            question: self.question,
            answer: self.answer,
            excerpt: self.excerpt,
            references: self.references,
            categories,
            tags: self.tags,
            author: self.author,
            pdf_url: self.pdf_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// ============================================================================
// Sorting / filtering
// ============================================================================

/// Sort order for response lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseSort {
    #[default]
    Newest,
    Oldest,
    TitleAsc,
    TitleDesc,
}

impl ResponseSort {
    /// Parse a `sort` query value, falling back to newest-first.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for ResponseSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "newest" | "-createdAt" => Ok(Self::Newest),
            "oldest" | "createdAt" => Ok(Self::Oldest),
            "az" | "title" => Ok(Self::TitleAsc),
            "za" | "-title" => Ok(Self::TitleDesc),
            other => Err(format!("Unknown sort key: {}", other)),
        }
    }
}

impl fmt::Display for ResponseSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Newest => write!(f, "newest"),
            Self::Oldest => write!(f, "oldest"),
            Self::TitleAsc => write!(f, "az"),
            Self::TitleDesc => write!(f, "za"),
        }
    }
}

/// Store-level query for response lists. Filters combine with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseFilter {
    pub category: Option<Uuid>,
    pub tag: Option<String>,
    pub sort: ResponseSort,
    pub skip: usize,
    pub limit: usize,
}

impl ResponseFilter {
    pub fn matches(&self, response: &Response) -> bool {
        if let Some(category) = self.category {
            if !response.categories.contains(&category) {
                return false;
            }
        }
        if let Some(ref tag) = self.tag {
            if !response.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        true
    }
}

/// Sort in place. The sort is stable, so ties keep storage order.
pub fn sort_responses(responses: &mut [Response], sort: ResponseSort) {
    match sort {
        ResponseSort::Newest => responses.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        ResponseSort::Oldest => responses.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        ResponseSort::TitleAsc => responses.sort_by(|a, b| a.title.cmp(&b.title)),
        ResponseSort::TitleDesc => responses.sort_by(|a, b| b.title.cmp(&a.title)),
    }
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Request body for POST /api/responses
///
/// No `author` field: the author comes from the authenticated caller and a
/// client-supplied value is dropped during deserialization.
#[derive(Debug, Deserialize, Default)]
pub struct CreateResponseRequest {
    pub title: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub excerpt: Option<String>,
    pub references: Option<Vec<Reference>>,
    pub categories: Option<Vec<Uuid>>,
    pub tags: Option<Vec<String>>,
}

/// Request body for PUT /api/responses/{id}
///
/// Omitted fields keep their stored values; arrays replace wholesale.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateResponseRequest {
    pub title: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub excerpt: Option<String>,
    pub references: Option<Vec<Reference>>,
    pub categories: Option<Vec<Uuid>>,
    pub tags: Option<Vec<String>>,
}

/// Placeholder returned by the PDF export endpoint
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PdfExport {
    pub title: String,
    pub pdf_url: String,
}

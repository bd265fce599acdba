//! Domain error taxonomy shared by the managers.
//!
//! Managers return [`ServiceError`]; the HTTP layer maps each variant to a
//! status code in `api::handlers::AppError`.

use thiserror::Error;

/// Result alias for manager operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Errors surfaced by the response, category and user managers.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Missing or invalid input (required field, search query, parent link)
    #[error("{0}")]
    Validation(String),

    /// Identifier does not resolve
    #[error("{0}")]
    NotFound(String),

    /// Duplicate unique field or referential-integrity violation
    #[error("{0}")]
    Conflict(String),

    /// Missing, invalid or expired credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Valid identity, but the action is not allowed
    #[error("{0}")]
    Forbidden(String),

    /// Persistence or runtime failure
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_bare_message() {
        let err = ServiceError::conflict("Category with this slug already exists");
        assert_eq!(err.to_string(), "Category with this slug already exists");
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err: ServiceError = anyhow::anyhow!("connection reset").into();
        assert!(matches!(err, ServiceError::Store(_)));
        assert_eq!(err.to_string(), "connection reset");
    }
}

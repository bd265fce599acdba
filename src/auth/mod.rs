//! Authentication: JWT issuance and the authenticate/authorize gate
//!
//! Provides:
//! - JWT token encoding/decoding (`jwt` submodule)
//! - `require_auth` and `authorize` middleware (`middleware` submodule)
//! - `AuthUser` extractor for handlers (`extractor` submodule)

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use extractor::AuthUser;

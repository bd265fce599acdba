//! HTTP API for responses, categories and accounts

pub mod auth_handlers;
pub mod category_handlers;
pub mod handlers;
pub mod query;
pub mod response_handlers;
pub mod routes;

pub use query::*;
pub use routes::create_router;

//! Responses: published question/answer records

pub mod manager;
pub mod models;

pub use manager::{ListParams, ResponseManager};
pub use models::*;

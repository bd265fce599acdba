//! Categories: topic tags that responses reference by id

pub mod manager;
pub mod models;

pub use manager::{CategoryManager, CategoryResponsesPage};
pub use models::*;

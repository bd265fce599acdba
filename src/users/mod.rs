//! User accounts, password hashing and the account operations behind /api/auth

pub mod manager;
pub mod models;
pub mod password;

pub use manager::UserManager;
pub use models::*;

//! Neo4j storage backend

pub mod client;
mod impl_content_store;

pub use client::Neo4jClient;

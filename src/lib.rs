//! Popular Revelation
//!
//! Content API for a catalog of question/answer responses:
//! - Responses with embedded references, category links and tags
//! - Categories with unique names/slugs and an integrity-guarded delete
//! - Paginated, filtered and sorted listings plus full-text search
//! - JWT authentication with admin / editor / viewer roles
//! - Neo4j storage, or an in-memory store for development

pub mod api;
pub mod auth;
pub mod categories;
pub mod error;
pub mod neo4j;
pub mod responses;
pub mod store;
pub mod users;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use store::ContentStore;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub storage: StorageYamlConfig,
    pub neo4j: Neo4jYamlConfig,
    /// Auth section: if absent, auth_config will be None (deny-by-default)
    pub auth: Option<AuthConfig>,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
    /// `production` hides internal error detail from clients
    pub environment: String,
    /// Single allowed CORS origin; any origin when unset
    pub cors_origin: Option<String>,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            environment: "development".into(),
            cors_origin: None,
        }
    }
}

/// Which `ContentStore` implementation to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Neo4j,
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neo4j => write!(f, "neo4j"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "neo4j" => Ok(Self::Neo4j),
            "memory" => Ok(Self::Memory),
            other => Err(format!("Unknown storage backend: {}", other)),
        }
    }
}

/// Storage configuration section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageYamlConfig {
    pub backend: StorageBackend,
}

/// Neo4j configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for Neo4jYamlConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: "revelation".into(),
        }
    }
}

fn default_jwt_expiry() -> u64 {
    604800
}

fn default_bcrypt_cost() -> u32 {
    users::password::DEFAULT_BCRYPT_COST
}

fn default_true() -> bool {
    true
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// JWT signing secret (HS256, minimum 32 characters recommended)
    pub jwt_secret: String,
    /// JWT token lifetime in seconds (default: 604800 = 7 days)
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_secs: u64,
    /// bcrypt work factor for new password hashes
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    /// Allow self-service registration via POST /api/auth/register
    #[serde(default = "default_true")]
    pub allow_registration: bool,
}

impl AuthConfig {
    /// Auth section with defaults for everything but the secret
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_expiry_secs: default_jwt_expiry(),
            bcrypt_cost: default_bcrypt_cost(),
            allow_registration: true,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origin: Option<String>,
    pub storage_backend: StorageBackend,
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    /// Auth config: None means protected routes are denied
    pub auth_config: Option<AuthConfig>,
}

impl Config {
    /// Load configuration from `config.yaml` (if present) and env vars.
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let storage_backend = match std::env::var("STORAGE_BACKEND") {
            Ok(value) => value
                .parse()
                .map_err(anyhow::Error::msg)
                .context("Invalid STORAGE_BACKEND")?,
            Err(_) => yaml.storage.backend,
        };

        let mut auth_config = match std::env::var("JWT_SECRET") {
            Ok(secret) => Some(match yaml.auth {
                Some(auth) => AuthConfig {
                    jwt_secret: secret,
                    ..auth
                },
                None => AuthConfig::with_secret(secret),
            }),
            Err(_) => yaml.auth,
        };
        if let Some(ref mut auth) = auth_config {
            if let Some(expiry) = std::env::var("JWT_EXPIRY_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
            {
                auth.jwt_expiry_secs = expiry;
            }
            if auth.jwt_secret.len() < 32 {
                tracing::warn!("JWT secret is shorter than 32 characters");
            }
        }

        Ok(Self {
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.server.port),
            environment: std::env::var("APP_ENV").unwrap_or(yaml.server.environment),
            cors_origin: std::env::var("CORS_ORIGIN").ok().or(yaml.server.cors_origin),
            storage_backend,
            neo4j_uri: std::env::var("NEO4J_URI").unwrap_or(yaml.neo4j.uri),
            neo4j_user: std::env::var("NEO4J_USER").unwrap_or(yaml.neo4j.user),
            neo4j_password: std::env::var("NEO4J_PASSWORD").unwrap_or(yaml.neo4j.password),
            auth_config,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Connect the configured storage backend
    pub async fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn ContentStore> = match config.storage_backend {
            StorageBackend::Neo4j => Arc::new(
                neo4j::Neo4jClient::new(
                    &config.neo4j_uri,
                    &config.neo4j_user,
                    &config.neo4j_password,
                )
                .await?,
            ),
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                Arc::new(store::MemoryStore::new())
            }
        };

        Ok(Self {
            store,
            config: Arc::new(config),
        })
    }
}

/// Run the HTTP server until Ctrl-C
pub async fn start_server(config: Config) -> Result<()> {
    api::handlers::set_production_mode(config.is_production());
    if config.auth_config.is_none() {
        tracing::warn!("No auth section configured; protected routes will deny all requests");
    }

    let state = AppState::new(config).await?;
    tracing::info!(backend = %state.config.storage_backend, "Storage connected");

    let server_state = Arc::new(api::handlers::ServerState::new(
        state.store.clone(),
        state.config.auth_config.clone(),
    ));
    let app = api::create_router(server_state, state.config.cors_origin.as_deref());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], state.config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

//! Shared fixtures for unit tests

use crate::api::handlers::{ApiState, ServerState};
use crate::auth::jwt::issue_token;
use crate::categories::Category;
use crate::responses::Response;
use crate::store::{ContentStore, MemoryStore};
use crate::users::{password::hash_password, Role, User};
use crate::AuthConfig;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-minimum-32-chars!!";

/// Auth config with a cheap bcrypt cost
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiry_secs: 3600,
        bcrypt_cost: 4,
        allow_registration: true,
    }
}

/// Server state over a fresh MemoryStore
pub fn test_state(auth_config: Option<AuthConfig>) -> ApiState {
    Arc::new(ServerState::new(Arc::new(MemoryStore::new()), auth_config))
}

/// Category named `name` with slug `name.to_lowercase()`
pub fn test_category(name: &str) -> Category {
    Category::new(name, &format!("About {}", name), name, None)
}

pub fn test_response(title: &str) -> Response {
    let now = Utc::now();
    Response {
        id: Uuid::new_v4(),
        title: title.to_string(),
        question: format!("What about {}?", title),
        answer: format!("<p>{}</p>", title),
        excerpt: format!("On {}", title),
        references: vec![],
        categories: vec![],
        tags: vec![],
        author: "Test Editor".to_string(),
        pdf_url: None,
        created_at: now,
        updated_at: now,
    }
}

/// Store a user with the given role and return it with a valid token
pub async fn seed_user(state: &ApiState, role: Role, active: bool) -> (User, String) {
    let email = format!("{}-{}@revelation.org", role, Uuid::new_v4().simple());
    let mut user = User::new(
        &format!("Test {}", role),
        &email,
        hash_password("test-password", 4).unwrap(),
        role,
    );
    user.is_active = active;
    state.store.create_user(&user).await.unwrap();

    let token = issue_token(&user, &test_auth_config()).unwrap();
    (user, token)
}

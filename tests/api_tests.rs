//! API integration tests
//!
//! Drive the full router in-process over a MemoryStore.
//! Run with: cargo test --test api_tests

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use popular_revelation::api::create_router;
use popular_revelation::api::handlers::ServerState;
use popular_revelation::store::{ContentStore, MemoryStore};
use popular_revelation::users::{Role, UserManager};
use popular_revelation::AuthConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // oneshot

const TEST_SECRET: &str = "integration-secret-key-32-chars-min!";

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    admin: String,
    editor: String,
    viewer: String,
}

fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiry_secs: 3600,
        bcrypt_cost: 4,
        allow_registration: true,
    }
}

async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let users = UserManager::new(store.clone(), Some(auth_config()));
    for (name, email, role) in [
        ("Admin", "admin@revelation.org", Role::Admin),
        ("Ada Editor", "editor@revelation.org", Role::Editor),
        ("Vic Viewer", "viewer@revelation.org", Role::Viewer),
    ] {
        users
            .create_user(name, email, "password-123", role)
            .await
            .unwrap();
    }

    let state = Arc::new(ServerState::new(store.clone(), Some(auth_config())));
    let router = create_router(state, None);

    let mut app = TestApp {
        router,
        store,
        admin: String::new(),
        editor: String::new(),
        viewer: String::new(),
    };
    app.admin = app.login("admin@revelation.org").await;
    app.editor = app.login("editor@revelation.org").await;
    app.viewer = app.login("viewer@revelation.org").await;
    app
}

impl TestApp {
    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send_raw(method, uri, token, body.map(|b| b.to_string()))
            .await
    }

    /// Like `send`, with the body passed through untouched
    async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = self.router.clone().oneshot(request).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"email": email, "password": "password-123"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn create_category(&self, name: &str, slug: &str) -> Value {
        let (status, body) = self
            .send(
                "POST",
                "/api/categories",
                Some(&self.editor),
                Some(json!({"name": name, "description": format!("About {}", name), "slug": slug})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    async fn create_response(&self, title: &str, categories: Vec<&str>) -> Value {
        let (status, body) = self
            .send(
                "POST",
                "/api/responses",
                Some(&self.editor),
                Some(json!({
                    "title": title,
                    "question": format!("What is {}?", title),
                    "answer": format!("<p>{} is explained here.</p>", title),
                    "excerpt": format!("About {}", title),
                    "categories": categories,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }
}

// ============================================================================
// Auth gate
// ============================================================================

#[tokio::test]
async fn test_protected_route_without_token_is_401() {
    let app = spawn_app().await;
    let (status, body) = app
        .send("POST", "/api/categories", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Authorization token required");
}

#[tokio::test]
async fn test_viewer_cannot_delete_but_admin_can() {
    let app = spawn_app().await;
    let created = app.create_response("Trinity", vec![]).await;
    let uri = format!("/api/responses/{}", created["id"].as_str().unwrap());

    let (status, body) = app.send("DELETE", &uri, Some(&app.viewer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Insufficient permissions");

    let (status, _) = app.send("DELETE", &uri, Some(&app.editor), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send("DELETE", &uri, Some(&app.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Response deleted successfully");

    let (status, _) = app.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deactivated_account_is_403() {
    let app = spawn_app().await;
    let mut user = app
        .store
        .get_user_by_email("editor@revelation.org")
        .await
        .unwrap()
        .unwrap();
    user.is_active = false;
    app.store.update_user(&user).await.unwrap();

    let (status, body) = app
        .send("GET", "/api/auth/profile", Some(&app.editor), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "User account is deactivated");
}

// ============================================================================
// Responses
// ============================================================================

#[tokio::test]
async fn test_create_missing_title_is_400_and_not_persisted() {
    let app = spawn_app().await;
    let (status, body) = app
        .send(
            "POST",
            "/api/responses",
            Some(&app.editor),
            Some(json!({"question": "Q?", "answer": "<p>A</p>", "excerpt": "E"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Please provide title, question, answer, and excerpt"
    );
    assert!(app.store.responses.read().await.is_empty());
}

#[tokio::test]
async fn test_unparseable_bodies_are_400_json() {
    let app = spawn_app().await;
    let (status, body) = app
        .send(
            "POST",
            "/api/responses",
            Some(&app.editor),
            Some(json!({
                "title": "Trinity",
                "question": "Q?",
                "answer": "<p>A</p>",
                "excerpt": "E",
                "categories": ["not-a-uuid"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("categories"));

    let (status, body) = app
        .send_raw(
            "POST",
            "/api/categories",
            Some(&app.editor),
            Some(r#"{"name": "Deity", "slug": "dei"#.to_string()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());

    assert!(app.store.responses.read().await.is_empty());
    assert!(app.store.categories.read().await.is_empty());
}

#[tokio::test]
async fn test_author_comes_from_caller() {
    let app = spawn_app().await;
    let (status, body) = app
        .send(
            "POST",
            "/api/responses",
            Some(&app.editor),
            Some(json!({
                "title": "Adjusters",
                "question": "What are Thought Adjusters?",
                "answer": "<p>Fragments.</p>",
                "excerpt": "Fragments",
                "author": "Mallory"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["author"], "Ada Editor");
    assert_eq!(body["data"]["references"], json!([]));
    assert_eq!(body["data"]["tags"], json!([]));
}

#[tokio::test]
async fn test_pagination_envelope() {
    let app = spawn_app().await;
    for i in 0..25 {
        app.create_response(&format!("Response {:02}", i), vec![])
            .await;
    }

    let (status, body) = app
        .send("GET", "/api/responses?page=3&limit=10&sort=az", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"][0]["title"], "Response 20");
    assert!(body["data"][0].get("answer").is_none());
    assert_eq!(
        body["pagination"],
        json!({"page": 3, "limit": 10, "total": 25, "totalPages": 3, "hasMore": false})
    );

    let (_, body) = app
        .send("GET", "/api/responses?page=9&limit=10", None, None)
        .await;
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["pagination"]["hasMore"], false);

    let (status, body) = app
        .send(
            "GET",
            "/api/responses?page=18446744073709551615&limit=10",
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["pagination"]["total"], 25);
    assert_eq!(body["pagination"]["hasMore"], false);

    let (_, body) = app
        .send("GET", "/api/responses?page=1&limit=10&sort=bogus", None, None)
        .await;
    assert_eq!(body["pagination"]["hasMore"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_filters_combine_with_and() {
    let app = spawn_app().await;
    let deity = app.create_category("Deity", "deity").await;
    let deity_id = deity["id"].as_str().unwrap();

    let tagged = app.create_response("Trinity", vec![deity_id]).await;
    app.create_response("Paradise", vec![deity_id]).await;
    app.create_response("Morontia", vec![]).await;

    let uri = format!("/api/responses/{}", tagged["id"].as_str().unwrap());
    let (status, _) = app
        .send("PUT", &uri, Some(&app.editor), Some(json!({"tags": ["God"]})))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .send("GET", "/api/responses?category=deity", None, None)
        .await;
    assert_eq!(body["pagination"]["total"], 2);

    let (_, body) = app
        .send("GET", "/api/responses?category=deity&tag=God", None, None)
        .await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Trinity");
    assert_eq!(body["data"][0]["categories"][0]["slug"], "deity");
}

#[tokio::test]
async fn test_get_detail_resolves_categories() {
    let app = spawn_app().await;
    let deity = app.create_category("Deity", "deity").await;
    let created = app
        .create_response("Trinity", vec![deity["id"].as_str().unwrap()])
        .await;

    let (status, body) = app
        .send(
            "GET",
            &format!("/api/responses/{}", created["id"].as_str().unwrap()),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["categories"][0]["name"], "Deity");
    assert!(body["data"]["answer"].is_string());

    let (status, body) = app
        .send("GET", "/api/responses/not-an-id", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Response not found");
}

#[tokio::test]
async fn test_search() {
    let app = spawn_app().await;
    app.create_response("Mansion worlds", vec![]).await;
    app.create_response("Trinity", vec![]).await;

    let (status, body) = app.send("GET", "/api/responses/search", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please provide a search term");

    let (status, body) = app
        .send("GET", "/api/responses/search?q=mansion", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["title"], "Mansion worlds");
}

#[tokio::test]
async fn test_pdf_stub() {
    let app = spawn_app().await;
    let created = app.create_response("Trinity", vec![]).await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = app
        .send("GET", &format!("/api/responses/{}/pdf", id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Trinity");
    assert_eq!(body["data"]["pdfUrl"], format!("/pdfs/{}.pdf", id));
}

// ============================================================================
// Categories
// ============================================================================

#[tokio::test]
async fn test_duplicate_slug_differing_case_is_rejected() {
    let app = spawn_app().await;
    app.create_category("Deity", "deity").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/categories",
            Some(&app.editor),
            Some(json!({"name": "Godhead", "description": "Other", "slug": "DEITY"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Category with this slug already exists");
}

#[tokio::test]
async fn test_referenced_category_delete_is_refused() {
    let app = spawn_app().await;
    let deity = app.create_category("Deity", "deity").await;
    let id = deity["id"].as_str().unwrap();
    app.create_response("Trinity", vec![id]).await;

    let uri = format!("/api/categories/{}", id);
    let (status, body) = app.send("DELETE", &uri, Some(&app.admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Cannot delete category that is used in 1 responses"
    );

    let (status, _) = app.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unreferenced_category_delete() {
    let app = spawn_app().await;
    app.create_category("Deity", "deity").await;

    let (status, body) = app
        .send("DELETE", "/api/categories/deity", Some(&app.admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Category deleted successfully");

    let (status, _) = app.send("GET", "/api/categories/deity", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_list_and_counts() {
    let app = spawn_app().await;
    let deity = app.create_category("Deity", "deity").await;
    app.create_category("Afterlife", "afterlife").await;
    app.create_response("Trinity", vec![deity["id"].as_str().unwrap()])
        .await;

    let (_, body) = app.send("GET", "/api/categories", None, None).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["name"], "Afterlife");
    assert!(body["data"][0].get("count").is_none());

    let (_, body) = app
        .send("GET", "/api/categories?counts=true", None, None)
        .await;
    assert_eq!(body["data"][0]["count"], 0);
    assert_eq!(body["data"][1]["count"], 1);
}

#[tokio::test]
async fn test_category_responses_envelope() {
    let app = spawn_app().await;
    let deity = app.create_category("Deity", "deity").await;
    app.create_response("Trinity", vec![deity["id"].as_str().unwrap()])
        .await;
    app.create_response("Unrelated", vec![]).await;

    let (status, body) = app
        .send("GET", "/api/categories/deity/responses", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"]["slug"], "deity");
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Trinity");

    let (status, _) = app
        .send("GET", "/api/categories/missing/responses", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_update_parent_null_clears() {
    let app = spawn_app().await;
    let root = app.create_category("Cosmology", "cosmology").await;
    let (status, child) = app
        .send(
            "POST",
            "/api/categories",
            Some(&app.editor),
            Some(json!({
                "name": "Paradise",
                "description": "Centre",
                "slug": "paradise",
                "parentCategory": root["id"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(child["data"]["parentCategory"], root["id"]);

    let (status, body) = app
        .send(
            "PUT",
            "/api/categories/paradise",
            Some(&app.editor),
            Some(json!({"parentCategory": null})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["parentCategory"], Value::Null);
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn test_register_profile_and_password_change() {
    let app = spawn_app().await;
    let (status, body) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"name": "New Reader", "email": "New@Revelation.org", "password": "first-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["user"]["role"], "viewer");
    assert!(body["data"]["user"].get("passwordHash").is_none());
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = app
        .send("GET", "/api/auth/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "new@revelation.org");

    let (status, _) = app
        .send(
            "POST",
            "/api/auth/change-password",
            Some(&token),
            Some(json!({"currentPassword": "first-password", "newPassword": "second-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "new@revelation.org", "password": "first-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "new@revelation.org", "password": "second-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

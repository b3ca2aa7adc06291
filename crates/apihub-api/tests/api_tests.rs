//! End-to-end tests for the HTTP API.
//!
//! Every test builds its own router over a fresh in-memory database and
//! drives it with `oneshot`, so tests are independent of each other.

use argon2::Params;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use jsonwebtoken::Algorithm;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use apihub_api::auth::{Passwords, TokenKeys};
use apihub_api::router;
use apihub_api::state::{AppState, AppStateInner};
use apihub_api::users::ensure_superuser;
use apihub_db::{Database, queries};

// =============================================================================
// Helpers
// =============================================================================

const ADMIN_EMAIL: &str = "admin@example.com";
const PASSWORD: &str = "correct-horse";

struct TestApp {
    state: AppState,
    app: Router,
}

impl TestApp {
    fn new() -> Self {
        let db = Database::in_memory().unwrap();
        let tokens = TokenKeys::new("test-secret", Algorithm::HS256, chrono::Duration::minutes(30));
        let passwords = Passwords::new(Params::new(8, 1, 1, None).unwrap()).unwrap();
        let state = AppStateInner::new(db, tokens, passwords);
        let app = router(state.clone());
        Self { state, app }
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request("GET", uri, token, None)).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request("POST", uri, token, Some(body))).await
    }

    async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request("PUT", uri, token, Some(body))).await
    }

    async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request("DELETE", uri, token, None)).await
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        let req = Request::post("/user/token")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("grant_type=password&username={}&password={}", email, password)))
            .unwrap();
        self.send(req).await
    }

    async fn token_for(&self, email: &str) -> String {
        let (status, body) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        ensure_superuser(&self.state, ADMIN_EMAIL.into(), PASSWORD.into())
            .await
            .unwrap();
        self.token_for(ADMIN_EMAIL).await
    }

    /// Registers through the API, then activates the account directly.
    async fn user_token(&self, email: &str) -> String {
        let (status, body) = self
            .post("/user/", None, json!({"email": email, "password": PASSWORD}))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        let id = body["id"].as_str().unwrap().to_string();
        self.state
            .db
            .with_conn(|conn| queries::set_user_flags(conn, &id, Some(true), None))
            .unwrap();
        self.token_for(email).await
    }

    async fn category(&self, admin: &str, name: &str) -> String {
        let (status, body) = self
            .post("/sentence/category", Some(admin), json!({"name": name}))
            .await;
        assert_eq!(status, StatusCode::CREATED, "category create failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    async fn sentence(&self, token: &str, category_id: &str, content: &str) -> Value {
        let (status, body) = self
            .post(
                "/sentence/",
                Some(token),
                json!({"category_id": category_id, "content": content}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "sentence create failed: {}", body);
        body
    }

    fn sentence_count(&self) -> i64 {
        self.state
            .db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM sentences", [], |r| r.get(0))?))
            .unwrap()
    }
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_reports_uptime() {
    let t = TestApp::new();
    let (status, body) = t.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime"]["formatted"].as_str().unwrap().ends_with('s'));
    assert!(body["timestamp"].is_string());
}

// =============================================================================
// Users & auth
// =============================================================================

#[tokio::test]
async fn register_creates_inactive_user() {
    let t = TestApp::new();
    let (status, body) = t
        .post(
            "/user/",
            None,
            json!({"email": "reader@example.com", "password": "pw", "nickname": "reader"}),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "reader@example.com");
    assert_eq!(body["nickname"], "reader");
    assert_eq!(body["active"], false);
    assert_eq!(body["is_superuser"], false);
    assert!(body.get("hashed_password").is_none());
}

#[tokio::test]
async fn register_same_email_twice_is_rejected() {
    let t = TestApp::new();
    let payload = json!({"email": "dup@example.com", "password": "pw"});

    let (first, _) = t.post("/user/", None, payload.clone()).await;
    let (second, body) = t.post("/user/", None, payload).await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn register_validates_input() {
    let t = TestApp::new();

    let (status, _) = t.post("/user/", None, json!({"email": "nope", "password": "pw"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = t
        .post("/user/", None, json!({"email": "a@example.com", "password": ""}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = t
        .post(
            "/user/",
            None,
            json!({"email": "a@example.com", "password": "pw", "nickname": "ninechars"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let t = TestApp::new();
    t.user_token("known@example.com").await;

    let (wrong_status, wrong_body) = t.login("known@example.com", "not-it").await;
    let (missing_status, missing_body) = t.login("ghost@example.com", "not-it").await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, missing_body);
}

#[tokio::test]
async fn login_failure_carries_bearer_challenge() {
    let t = TestApp::new();
    let req = Request::post("/user/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=ghost@example.com&password=x"))
        .unwrap();
    let resp = t.app.clone().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
}

#[tokio::test]
async fn inactive_account_cannot_log_in() {
    let t = TestApp::new();
    t.post("/user/", None, json!({"email": "idle@example.com", "password": PASSWORD}))
        .await;

    let (status, body) = t.login("idle@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Account is not active");
}

#[tokio::test]
async fn me_requires_a_valid_token() {
    let t = TestApp::new();
    let token = t.user_token("me@example.com").await;

    let (status, body) = t.get("/user/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "me@example.com");

    let (status, _) = t.get("/user/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t.get("/user/me", Some("garbage.token.value")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleted_user_takes_sentences_and_token_with_them() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    let token = t.user_token("leaving@example.com").await;
    let cat = t.category(&admin, "Exit").await;
    t.sentence(&token, &cat, "mine, for now").await;
    t.sentence(&admin, &cat, "stays behind").await;
    assert_eq!(t.sentence_count(), 2);

    let (_, me) = t.get("/user/me", Some(&token)).await;
    let id = me["id"].as_str().unwrap().to_string();
    t.state
        .db
        .with_conn(|conn| {
            conn.execute("DELETE FROM users WHERE id = ?1", [&id])?;
            Ok(())
        })
        .unwrap();

    assert_eq!(t.sentence_count(), 1);
    let (status, body) = t.get("/sentence/all?limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["content"], "stays behind");

    let (status, _) = t.get("/user/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_activates_and_promotes_users() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    let (_, user) = t
        .post("/user/", None, json!({"email": "new@example.com", "password": PASSWORD}))
        .await;
    let uri = format!("/user/{}", user["id"].as_str().unwrap());

    let req = Request::patch(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", admin))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"active": true, "is_superuser": true}).to_string()))
        .unwrap();
    let (status, body) = t.send(req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], true);
    assert_eq!(body["is_superuser"], true);

    let promoted = t.token_for("new@example.com").await;
    let (status, _) = t
        .post("/sentence/category", Some(&promoted), json!({"name": "Granted"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn regular_user_cannot_administer_users() {
    let t = TestApp::new();
    let token = t.user_token("plain@example.com").await;
    let (_, me) = t.get("/user/me", Some(&token)).await;

    let req = Request::patch(format!("/user/{}", me["id"].as_str().unwrap()))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"is_superuser": true}).to_string()))
        .unwrap();
    let (status, _) = t.send(req).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Categories
// =============================================================================

#[tokio::test]
async fn duplicate_category_name_conflicts() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    t.category(&admin, "Poetry").await;

    let (status, body) = t
        .post("/sentence/category", Some(&admin), json!({"name": "Poetry"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn rename_respects_other_names_but_not_its_own() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    let a = t.category(&admin, "A").await;
    t.category(&admin, "B").await;

    let (status, _) = t
        .put(&format!("/sentence/category/{}", a), Some(&admin), json!({"name": "B"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = t
        .put(
            &format!("/sentence/category/{}", a),
            Some(&admin),
            json!({"name": "A", "description": "first letter"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "A");
    assert_eq!(body["description"], "first letter");
}

#[tokio::test]
async fn category_mutations_need_privilege() {
    let t = TestApp::new();
    let token = t.user_token("plain@example.com").await;

    let (status, _) = t
        .post("/sentence/category", Some(&token), json!({"name": "Mine"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.post("/sentence/category", None, json!({"name": "Mine"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn categories_are_listed_by_name_without_auth() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    t.category(&admin, "Zen").await;
    t.category(&admin, "Art").await;

    let (status, body) = t.get("/sentence/category", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Art", "Zen"]);
}

#[tokio::test]
async fn deleting_a_category_removes_its_sentences() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    let cat = t.category(&admin, "Doomed").await;
    t.sentence(&admin, &cat, "gone soon").await;

    let (status, body) = t.delete(&format!("/sentence/category/{}", cat), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"]["name"], "Doomed");
    assert_eq!(t.sentence_count(), 0);

    let (status, _) = t.delete(&format!("/sentence/category/{}", cat), Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Sentence creation
// =============================================================================

#[tokio::test]
async fn privilege_decides_initial_disabled_state() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    let user = t.user_token("writer@example.com").await;
    let cat = t.category(&admin, "Mixed").await;

    let by_admin = t.sentence(&admin, &cat, "published").await;
    let by_user = t.sentence(&user, &cat, "pending").await;

    assert_eq!(by_admin["is_disabled"], false);
    assert_eq!(by_user["is_disabled"], true);
    assert_eq!(by_user["likes"], 0);
    assert_eq!(by_user["category"]["name"], "Mixed");
}

#[tokio::test]
async fn batch_with_internal_duplicate_inserts_nothing() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    let cat = t.category(&admin, "Batch").await;

    let (status, _) = t
        .post(
            "/sentence/",
            Some(&admin),
            json!([
                {"category_id": cat, "content": "a"},
                {"category_id": cat, "content": "a"}
            ]),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(t.sentence_count(), 0);
}

#[tokio::test]
async fn batch_with_stored_duplicate_inserts_nothing() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    let cat = t.category(&admin, "Batch").await;
    t.sentence(&admin, &cat, "already here").await;

    let (status, _) = t
        .post(
            "/sentence/",
            Some(&admin),
            json!([
                {"category_id": cat, "content": "brand new"},
                {"category_id": cat, "content": "already here"}
            ]),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(t.sentence_count(), 1);
}

#[tokio::test]
async fn batch_reply_mirrors_request_shape() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    let cat = t.category(&admin, "Shapes").await;

    let (status, body) = t
        .post(
            "/sentence/",
            Some(&admin),
            json!([
                {"category_id": cat, "content": "one", "from_who": "me"},
                {"category_id": cat, "content": "two"}
            ]),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["from_who"], "me");

    let single = t.sentence(&admin, &cat, "three").await;
    assert!(single.is_object());

    let (status, _) = t.post("/sentence/", Some(&admin), json!([])).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_into_missing_category_is_not_found() {
    let t = TestApp::new();
    let admin = t.admin_token().await;

    let (status, _) = t
        .post(
            "/sentence/",
            Some(&admin),
            json!({"category_id": Uuid::new_v4(), "content": "lost"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Sentence update / delete
// =============================================================================

#[tokio::test]
async fn only_owner_or_admin_may_modify() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    let owner = t.user_token("owner@example.com").await;
    let other = t.user_token("other@example.com").await;
    let cat = t.category(&admin, "Owned").await;

    let s = t.sentence(&owner, &cat, "mine").await;
    let uri = format!("/sentence/{}", s["id"].as_str().unwrap());

    let (status, _) = t.put(&uri, Some(&other), json!({"content": "stolen"})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = t.delete(&uri, Some(&other)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t.put(&uri, Some(&owner), json!({"content": "still mine"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "still mine");

    let (status, body) = t.delete(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sentence"]["content"], "still mine");

    let (status, _) = t.delete(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_cannot_self_approve() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    let owner = t.user_token("owner@example.com").await;
    let cat = t.category(&admin, "Queue").await;

    let s = t.sentence(&owner, &cat, "let me in").await;
    let uri = format!("/sentence/{}", s["id"].as_str().unwrap());

    let (status, _) = t.put(&uri, Some(&owner), json!({"is_disabled": false})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t.put(&uri, Some(&admin), json!({"is_disabled": false})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_disabled"], false);
}

#[tokio::test]
async fn update_checks_content_and_category() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    let cat = t.category(&admin, "First").await;
    let moved_to = t.category(&admin, "Second").await;

    let a = t.sentence(&admin, &cat, "alpha").await;
    t.sentence(&admin, &cat, "beta").await;
    let uri = format!("/sentence/{}", a["id"].as_str().unwrap());

    let (status, _) = t.put(&uri, Some(&admin), json!({"content": "beta"})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = t.put(&uri, Some(&admin), json!({"content": "alpha"})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t
        .put(&uri, Some(&admin), json!({"category_id": Uuid::new_v4()}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = t
        .put(&uri, Some(&admin), json!({"category_id": moved_to, "from_source": null}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"]["name"], "Second");
    assert!(body["from_source"].is_null());

    let (status, _) = t
        .put(&format!("/sentence/{}", Uuid::new_v4()), Some(&admin), json!({"content": "x"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Sampling
// =============================================================================

#[tokio::test]
async fn sample_is_capped_by_what_exists() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    let small = t.category(&admin, "Small").await;
    let other = t.category(&admin, "Other").await;
    for content in ["one", "two", "three"] {
        t.sentence(&admin, &small, content).await;
    }
    t.sentence(&admin, &other, "elsewhere").await;

    let (status, body) = t.get(&format!("/sentence/{}?limit=5", small), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|s| s["category"]["name"] == "Small"));

    let (status, body) = t.get("/sentence/all?limit=20", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 4);

    let (_, body) = t.get("/sentence/all", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn sample_rejects_bad_input() {
    let t = TestApp::new();

    let (status, _) = t.get("/sentence/all?limit=0", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = t.get("/sentence/all?limit=21", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = t.get("/sentence/not-a-category", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = t.get(&format!("/sentence/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Moderation
// =============================================================================

#[tokio::test]
async fn paginated_returns_newest_first() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    let cat = t.category(&admin, "Paged").await;
    for content in ["s1", "s2", "s3", "s4", "s5"] {
        t.sentence(&admin, &cat, content).await;
    }

    let (status, body) = t
        .get("/sentence/admin/paginated?page=1&page_size=2", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["total_pages"], 3);
    assert_eq!(body["page"], 1);
    let contents: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["s5", "s4"]);

    let (_, last) = t
        .get("/sentence/admin/paginated?page=3&page_size=2", Some(&admin))
        .await;
    assert_eq!(last["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn paginated_scopes_and_filters() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    let user = t.user_token("scoped@example.com").await;
    let cat = t.category(&admin, "Scope").await;
    t.sentence(&admin, &cat, "admin wrote 100%").await;
    t.sentence(&user, &cat, "user wrote this").await;

    let (_, mine) = t.get("/sentence/admin/paginated", Some(&user)).await;
    assert_eq!(mine["total"], 1);
    assert_eq!(mine["items"][0]["content"], "user wrote this");

    let (_, all) = t.get("/sentence/admin/paginated", Some(&admin)).await;
    assert_eq!(all["total"], 2);

    let (_, pending) = t
        .get("/sentence/admin/paginated?is_disabled=true", Some(&admin))
        .await;
    assert_eq!(pending["total"], 1);

    let (_, searched) = t
        .get("/sentence/admin/paginated?search=100%25", Some(&admin))
        .await;
    assert_eq!(searched["total"], 1);
    assert_eq!(searched["items"][0]["content"], "admin wrote 100%");

    let (status, _) = t
        .get("/sentence/admin/paginated?page_size=101", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = t.get("/sentence/admin/paginated?page=0", Some(&admin)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn batch_status_and_delete() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    let user = t.user_token("batch@example.com").await;
    let cat = t.category(&admin, "Bulk").await;

    let a = t.sentence(&user, &cat, "first").await;
    let b = t.sentence(&user, &cat, "second").await;
    let ids = json!([a["id"], b["id"]]);

    let (status, _) = t
        .post(
            "/sentence/admin/batch/status",
            Some(&user),
            json!({"ids": ids, "is_disabled": false}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t
        .post("/sentence/admin/batch/status", Some(&admin), json!({"ids": ids}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = t
        .post(
            "/sentence/admin/batch/status",
            Some(&admin),
            json!({"ids": [], "is_disabled": false}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = t
        .post(
            "/sentence/admin/batch/status",
            Some(&admin),
            json!({"ids": ids, "is_disabled": false}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["affected"], 2);

    let (_, live) = t
        .get("/sentence/admin/paginated?is_disabled=false", Some(&admin))
        .await;
    assert_eq!(live["total"], 2);

    let (status, body) = t
        .post("/sentence/admin/batch/delete", Some(&admin), json!({"ids": ids}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["affected"], 2);
    assert_eq!(t.sentence_count(), 0);
}

// =============================================================================
// Likes
// =============================================================================

#[tokio::test]
async fn likes_count_up_and_floor_at_zero() {
    let t = TestApp::new();
    let admin = t.admin_token().await;
    let cat = t.category(&admin, "Liked").await;
    let s = t.sentence(&admin, &cat, "likeable").await;
    let id = s["id"].as_str().unwrap();

    let (status, body) = t.post(&format!("/sentence/unlike/{}", id), None, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["likes"], 0);

    let req = Request::post(format!("/sentence/like/{}", id))
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = t.send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["likes"], 1);

    let (_, body) = t.post(&format!("/sentence/like/{}", id), None, json!({})).await;
    assert_eq!(body["likes"], 2);

    let (_, body) = t.post(&format!("/sentence/unlike/{}", id), None, json!({})).await;
    assert_eq!(body["likes"], 1);

    let (status, _) = t
        .post(&format!("/sentence/like/{}", Uuid::new_v4()), None, json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use expense_tracker_server::{AppState, auth, build_router, database};
use serde_json::Value;
use tower::util::ServiceExt;

pub const TEST_SESSION_SECRET: &str =
    "test_secret_key_at_least_64_chars_long_test_secret_key_at_least_64_";

#[derive(Clone)]
pub struct TestConfig {
    pub temp_dir_path: String,
}

impl TestConfig {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let temp_dir_path = temp_dir.path().to_string_lossy().to_string();
        std::mem::forget(temp_dir);
        Ok(Self { temp_dir_path })
    }

    pub fn data_path(&self) -> String {
        self.temp_dir_path.clone()
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub async fn setup_test_state() -> anyhow::Result<AppState> {
    let test_config = TestConfig::new()?;
    let db = database::init_db(&test_config.data_path()).await?;
    Ok(AppState::new(db))
}

pub async fn setup_test_app() -> anyhow::Result<TestApp> {
    let state = setup_test_state().await?;
    let router = build_router(state.clone(), TEST_SESSION_SECRET, false)?;

    Ok(TestApp { router, state })
}

pub async fn create_test_user(
    app_state: &AppState,
    username: &str,
    password: &str,
) -> anyhow::Result<String> {
    let user = auth::create_user(&app_state.db, username, password)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create test user: {}", e))?;
    Ok(user.id)
}

pub async fn login_user(app: &Router, username: &str, password: &str) -> anyhow::Result<String> {
    let payload = serde_json::json!({
        "username": username,
        "password": password
    });

    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .map_err(|e| anyhow::anyhow!("Failed to build request: {}", e))?;

    let response = app
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to execute request: {}", e))?;

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v: &axum::http::HeaderValue| v.to_str().ok())
        .ok_or_else(|| anyhow::anyhow!("No session cookie in response"))?;

    // Only the name=value pair goes back in a Cookie header.
    let cookie = set_cookie
        .split(';')
        .next()
        .unwrap_or(set_cookie)
        .to_string();
    Ok(cookie)
}

fn parse_body_as_json_or_string(bytes: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => value,
        Err(_) => Value::String(String::from_utf8_lossy(bytes).to_string()),
    }
}

pub async fn json_request(
    app: &TestApp,
    method: &str,
    uri: &str,
    cookie: &str,
    payload: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if !cookie.is_empty() {
        builder = builder.header("cookie", cookie);
    }
    let body = match payload {
        Some(payload) => {
            builder = builder.header("content-type", "application/json");
            Body::from(payload.to_string())
        }
        None => Body::empty(),
    };
    let request = builder
        .body(body)
        .map_err(|e| anyhow::anyhow!("Failed to build request: {}", e))?;

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to execute request: {}", e))?;

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read response body: {}", e))?;

    Ok((status, parse_body_as_json_or_string(&bytes)))
}

/// Registers and logs in a user, returning `(user_id, cookie)`.
pub async fn signed_in_user(app: &TestApp, username: &str) -> anyhow::Result<(String, String)> {
    let user_id = create_test_user(&app.state, username, "password123").await?;
    let cookie = login_user(&app.router, username, "password123").await?;
    Ok((user_id, cookie))
}

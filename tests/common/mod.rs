#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use my_finance_server::{AppState, app_router, auth::JwtConfig, database};
use serde_json::Value;
use time::UtcOffset;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test_jwt_secret_that_is_at_least_32_chars";
pub const TEST_PASSWORD: &str = "password123";

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

pub async fn setup_test_app() -> anyhow::Result<TestApp> {
    let test_config = TestConfig::new()?;

    let db = database::init_db(&test_config.data_path())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize database: {}", e))?;

    let jwt = JwtConfig::new(TEST_JWT_SECRET, 1, 24);
    let state = AppState::new(db, jwt, UtcOffset::UTC);
    let router = app_router(state.clone());

    Ok(TestApp { router, state })
}

/// A registered user and the bearer token issued at registration.
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

pub async fn register_user(app: &TestApp, name: &str) -> TestUser {
    let email = format!("{}-{}@example.com", name, Uuid::new_v4().simple());
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(serde_json::json!({
            "name": name,
            "email": email,
            "password": TEST_PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    TestUser {
        id: body["user"]["id"].as_str().expect("user id").to_string(),
        email,
        token: body["access_token"].as_str().expect("access token").to_string(),
    }
}

/// Sends one request through the router and decodes the JSON body
/// (`Value::Null` for empty bodies).
pub async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
    payload: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let body = match payload {
        Some(payload) => {
            builder = builder.header("content-type", "application/json");
            Body::from(payload.to_string())
        }
        None => Body::empty(),
    };
    let request = builder.body(body).expect("build request");

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("execute request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8(bytes.to_vec()).expect("utf8"))
        })
    };
    (status, body)
}

pub async fn get(app: &TestApp, uri: &str, user: &TestUser) -> (StatusCode, Value) {
    send(app, "GET", uri, Some(&user.token), None).await
}

pub async fn post(
    app: &TestApp,
    uri: &str,
    user: &TestUser,
    payload: Value,
) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(&user.token), Some(payload)).await
}

pub async fn put(app: &TestApp, uri: &str, user: &TestUser, payload: Value) -> (StatusCode, Value) {
    send(app, "PUT", uri, Some(&user.token), Some(payload)).await
}

pub async fn delete(app: &TestApp, uri: &str, user: &TestUser) -> (StatusCode, Value) {
    send(app, "DELETE", uri, Some(&user.token), None).await
}

pub async fn create_account(app: &TestApp, user: &TestUser, name: &str, balance: f64) -> String {
    let (status, body) = post(
        app,
        "/accounts",
        user,
        serde_json::json!({
            "name": name,
            "type": "checking",
            "balance": balance,
            "currency": "XAF",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create account failed: {}", body);
    body["id"].as_str().expect("account id").to_string()
}

/// Creates a category with a unique name and returns its id.
pub async fn create_category(app: &TestApp, user: &TestUser, category_type: &str) -> String {
    let (status, body) = post(
        app,
        "/categories",
        user,
        serde_json::json!({
            "name": format!("Cat {}", &Uuid::new_v4().simple().to_string()[..8]),
            "type": category_type,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create category failed: {}", body);
    body["id"].as_str().expect("category id").to_string()
}

pub async fn create_transaction(
    app: &TestApp,
    user: &TestUser,
    payload: Value,
) -> Value {
    let (status, body) = post(app, "/transactions", user, payload).await;
    assert_eq!(status, StatusCode::CREATED, "create transaction failed: {}", body);
    body
}

pub async fn account_balance(app: &TestApp, user: &TestUser, account_id: &str) -> f64 {
    let (status, body) = get(app, &format!("/accounts/{}/balance", account_id), user).await;
    assert_eq!(status, StatusCode::OK);
    body["balance"].as_f64().expect("balance")
}

/// The last day of the month before the current one, as `YYYY-MM-DD`.
pub fn last_day_of_previous_month() -> String {
    let first = time::OffsetDateTime::now_utc()
        .date()
        .replace_day(1)
        .expect("first of month");
    my_finance_server::utils::format_date(first.previous_day().expect("previous day"))
}

/// Today's date as `YYYY-MM-DD` in UTC, matching the test app's offset.
pub fn today() -> String {
    my_finance_server::utils::format_date(time::OffsetDateTime::now_utc().date())
}

pub fn assert_error(body: &Value, code: &str) {
    assert_eq!(body["success"], false, "not an error envelope: {}", body);
    assert_eq!(body["code"], code, "unexpected error code: {}", body);
    assert!(body["message"].is_string());
}

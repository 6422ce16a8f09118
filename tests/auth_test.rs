mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{TEST_PASSWORD, assert_error, register_user, send, setup_test_app};

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let app = setup_test_app().await.expect("setup");

    let (status, body) = send(&app, "GET", "/accounts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&body, "UNAUTHORIZED");

    let (status, body) = send(&app, "GET", "/finance/dashboard", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&body, "UNAUTHORIZED");
}

#[tokio::test]
async fn register_login_refresh_and_me() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": user.email.to_uppercase(), "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["id"], user.id.as_str());
    assert!(body["user"].get("password_hash").is_none());
    let refresh_token = body["refresh_token"].as_str().expect("refresh").to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access_token"].as_str().expect("access").to_string();

    let (status, body) = send(&app, "GET", "/auth/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], user.email.as_str());
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "bob").await;

    let (_, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": user.email, "password": TEST_PASSWORD })),
    )
    .await;
    let refresh_token = body["refresh_token"].as_str().expect("refresh");

    let (status, _) = send(&app, "GET", "/auth/me", Some(refresh_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": user.token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_and_duplicate_email() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "carol").await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": user.email, "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&body, "UNAUTHORIZED");

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "Carol", "email": user.email, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error(&body, "CONFLICT");
}

#[tokio::test]
async fn registration_validates_input() {
    let app = setup_test_app().await.expect("setup");

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "Dan", "email": "dan@example.com", "password": "123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "Dan", "email": "not-an-email", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn registration_seeds_accounts_and_categories() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "erin").await;

    let (status, body) = common::get(&app, "/accounts", &user).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 5);

    let (_, body) = common::get(&app, "/categories?type=task", &user).await;
    assert_eq!(body["total_count"], 7);
    let (_, body) = common::get(&app, "/categories?type=expense", &user).await;
    assert_eq!(body["total_count"], 8);
    let (_, body) = common::get(&app, "/categories?type=revenue", &user).await;
    assert_eq!(body["total_count"], 5);
}

#[tokio::test]
async fn profile_update_changes_name_email_and_password() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "frank").await;
    let taken = register_user(&app, "gina").await;

    let (status, body) = send(
        &app,
        "PUT",
        "/auth/me",
        Some(&user.token),
        Some(json!({ "email": taken.email.to_uppercase() })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error(&body, "CONFLICT");

    let (status, _) = send(&app, "PUT", "/auth/me", Some(&user.token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let new_email = format!("renamed-{}", user.email);
    let (status, body) = send(
        &app,
        "PUT",
        "/auth/me",
        Some(&user.token),
        Some(json!({ "name": "Franklin", "email": new_email, "password": "new-secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Franklin");
    assert_eq!(body["email"], new_email.as_str());

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": user.email, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": new_email, "password": "new-secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleting_a_user_removes_everything_they_own() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "hank").await;
    let bystander = register_user(&app, "iris").await;

    let account = common::create_account(&app, &user, "Main", 10.0).await;
    let transaction = common::create_transaction(
        &app,
        &user,
        json!({
            "account_id": account,
            "type": "income",
            "amount": 5.0,
            "description": "pocket money",
            "date": common::today(),
        }),
    )
    .await;
    let transaction_id = transaction["id"].as_str().expect("id");

    let (status, _) = send(&app, "DELETE", "/auth/me", Some(&user.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/auth/me", Some(&user.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, accounts) = common::get(&app, "/accounts", &user).await;
    assert_eq!(accounts["total_count"], 0);
    let (_, categories) = common::get(&app, "/categories", &user).await;
    assert_eq!(categories["total_count"], 0);
    let uri = format!("/transactions/{}", transaction_id);
    let (status, _) = common::get(&app, &uri, &user).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": user.email, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, accounts) = common::get(&app, "/accounts", &bystander).await;
    assert_eq!(accounts["total_count"], 5);
}

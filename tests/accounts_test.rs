mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;

#[tokio::test]
async fn account_crud_round_trip() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "alice").await;

    let (status, body) = post(
        &app,
        "/accounts",
        &user,
        json!({ "name": "Main", "type": "bank", "balance": 250.456, "currency": "eur" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["currency"], "EUR");
    assert_eq!(body["balance"], 250.46);
    assert_eq!(body["type"], "bank");
    let id = body["id"].as_str().expect("id").to_string();
    let created = body;

    let (status, fetched) = get(&app, &format!("/accounts/{}", id), &user).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, body) = put(
        &app,
        &format!("/accounts/{}", id),
        &user,
        json!({ "name": "Renamed" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Renamed");

    let (status, body) = get(&app, &format!("/accounts/{}", id), &user).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Renamed");

    let (status, _) = delete(&app, &format!("/accounts/{}", id), &user).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = get(&app, &format!("/accounts/{}", id), &user).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "NOT_FOUND");
}

#[tokio::test]
async fn account_validation_errors() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "bob").await;

    let cases = [
        json!({ "name": "   ", "type": "checking", "currency": "XAF" }),
        json!({ "name": "Valid", "type": "crypto", "currency": "XAF" }),
        json!({ "name": "Valid", "type": "checking", "currency": "EURO" }),
        json!({ "name": "Valid", "type": "checking", "currency": "XAF", "balance": -1.0 }),
    ];
    for payload in cases {
        let (status, body) = post(&app, "/accounts", &user, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert_error(&body, "VALIDATION_ERROR");
    }

    let account = create_account(&app, &user, "Main", 0.0).await;
    let (status, _) = put(&app, &format!("/accounts/{}", account), &user, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn other_users_accounts_are_forbidden() {
    let app = setup_test_app().await.expect("setup");
    let owner = register_user(&app, "owner").await;
    let intruder = register_user(&app, "intruder").await;
    let account = create_account(&app, &owner, "Private", 100.0).await;

    let (status, body) = get(&app, &format!("/accounts/{}", account), &intruder).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error(&body, "FORBIDDEN");

    let (status, _) = put(
        &app,
        &format!("/accounts/{}", account),
        &intruder,
        json!({ "name": "Stolen" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = delete(&app, &format!("/accounts/{}", account), &intruder).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = post(
        &app,
        "/transactions",
        &intruder,
        json!({
            "account_id": account,
            "type": "expense",
            "amount": 10.0,
            "description": "sneaky",
            "date": today(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = get(&app, "/accounts", &intruder).await;
    let ids: Vec<&str> = body["accounts"]
        .as_array()
        .expect("accounts")
        .iter()
        .filter_map(|a| a["id"].as_str())
        .collect();
    assert!(!ids.contains(&account.as_str()));
}

#[tokio::test]
async fn account_list_paginates() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "carol").await;

    let (status, body) = get(&app, "/accounts?limit=2&offset=1", &user).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accounts"].as_array().expect("accounts").len(), 2);
    assert_eq!(body["total_count"], 5);

    let (status, _) = get(&app, "/accounts?limit=0", &user).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_an_account_removes_its_transactions() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "dave").await;
    let account = create_account(&app, &user, "Temp", 0.0).await;

    let tx = create_transaction(
        &app,
        &user,
        json!({
            "account_id": account,
            "type": "income",
            "amount": 40.0,
            "description": "gift",
            "date": today(),
        }),
    )
    .await;
    let tx_id = tx["id"].as_str().expect("id");

    let (status, _) = delete(&app, &format!("/accounts/{}", account), &user).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get(&app, &format!("/transactions/{}", tx_id), &user).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

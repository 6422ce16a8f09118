mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;

#[tokio::test]
async fn duplicate_names_conflict_per_type() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "alice").await;

    let payload = json!({ "name": "Pets", "type": "expense" });
    let (status, _) = post(&app, "/categories", &user, payload).await;
    assert_eq!(status, StatusCode::CREATED);

    let payload = json!({ "name": "pets", "type": "expense" });
    let (status, body) = post(&app, "/categories", &user, payload).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error(&body, "CONFLICT");

    let payload = json!({ "name": "Pets", "type": "task" });
    let (status, _) = post(&app, "/categories", &user, payload).await;
    assert_eq!(status, StatusCode::CREATED);

    let other = register_user(&app, "bob").await;
    let payload = json!({ "name": "Pets", "type": "expense" });
    let (status, _) = post(&app, "/categories", &other, payload).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn subcategories_are_one_level_deep() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "carol").await;

    let parent = create_category(&app, &user, "expense").await;
    let (status, child) = post(
        &app,
        "/categories",
        &user,
        json!({ "name": "Child", "type": "expense", "parent_id": parent }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(child["parent_id"], parent.as_str());

    let (status, _) = post(
        &app,
        "/categories",
        &user,
        json!({ "name": "Grandchild", "type": "expense", "parent_id": child["id"] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        &app,
        "/categories",
        &user,
        json!({ "name": "Mixed", "type": "revenue", "parent_id": parent }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = delete(&app, &format!("/categories/{}", parent), &user).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error(&body, "CONFLICT");
}

#[tokio::test]
async fn categories_in_use_cannot_be_deleted() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "dave").await;
    let account = create_account(&app, &user, "Main", 0.0).await;
    let category = create_category(&app, &user, "expense").await;

    create_transaction(
        &app,
        &user,
        json!({
            "account_id": account,
            "category_id": category,
            "type": "expense",
            "amount": 12.5,
            "description": "lunch",
            "date": today(),
        }),
    )
    .await;

    let (status, _) = delete(&app, &format!("/categories/{}", category), &user).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn soft_deleted_categories_disappear_and_free_tasks() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "erin").await;
    let category = create_category(&app, &user, "task").await;

    let (status, task) = post(
        &app,
        "/tasks",
        &user,
        json!({ "title": "Read", "priority": "low", "category_id": category }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = delete(&app, &format!("/categories/{}", category), &user).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get(&app, &format!("/categories/{}", category), &user).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = get(&app, "/categories?type=task", &user).await;
    assert_eq!(body["total_count"], 7);

    let (_, task) = get(&app, &format!("/tasks/{}", task["id"].as_str().expect("id")), &user).await;
    assert!(task["category_id"].is_null());
}

#[tokio::test]
async fn search_and_update() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "frank").await;

    let (_, body) = get(&app, "/categories?search=sal", &user).await;
    assert_eq!(body["total_count"], 1);
    let salary = body["categories"][0]["id"].as_str().expect("id").to_string();

    let (status, body) = put(
        &app,
        &format!("/categories/{}", salary),
        &user,
        json!({ "name": "Wages", "color": "#000000" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Wages");

    let (status, _) = put(
        &app,
        &format!("/categories/{}", salary),
        &user,
        json!({ "name": "Business" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = get(&app, "/categories?type=savings", &user).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;

async fn expense(app: &TestApp, user: &TestUser, account: &str, category: &str, amount: f64) {
    create_transaction(
        app,
        user,
        json!({
            "account_id": account,
            "category_id": category,
            "type": "expense",
            "amount": amount,
            "description": "spend",
            "date": today(),
        }),
    )
    .await;
}

#[tokio::test]
async fn overspent_budget_is_in_danger() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "alice").await;
    let account = create_account(&app, &user, "Main", 0.0).await;
    let category = create_category(&app, &user, "expense").await;

    let (status, budget) = post(
        &app,
        "/budgets",
        &user,
        json!({
            "category_id": category,
            "name": "Food",
            "amount_planned": 500.0,
            "period": "monthly",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let budget_id = budget["id"].as_str().expect("id");

    expense(&app, &user, &account, &category, 600.0).await;

    let (status, body) = get(&app, &format!("/budgets/{}/status", budget_id), &user).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "danger");
    assert_eq!(body["percentage_used"], 120.0);
    assert_eq!(body["remaining_amount"], -100.0);
    assert_eq!(body["amount_spent"], 600.0);
    assert!(body["days_remaining"].as_i64().expect("days") >= 0);
}

#[tokio::test]
async fn budget_requires_a_money_category() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "bob").await;
    let task_category = create_category(&app, &user, "task").await;

    let (status, body) = post(
        &app,
        "/budgets",
        &user,
        json!({
            "category_id": task_category,
            "name": "Chores",
            "amount_planned": 10.0,
            "period": "weekly",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "VALIDATION_ERROR");

    let (status, _) = post(
        &app,
        "/budgets",
        &user,
        json!({
            "category_id": "missing",
            "name": "Ghost",
            "amount_planned": 10.0,
            "period": "weekly",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let other = register_user(&app, "other").await;
    let foreign = create_category(&app, &other, "expense").await;
    let (status, _) = post(
        &app,
        "/budgets",
        &user,
        json!({
            "category_id": foreign,
            "name": "Theirs",
            "amount_planned": 10.0,
            "period": "weekly",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn dashboard_reports_debts_and_month_summary() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "carol").await;
    let wallet = create_account(&app, &user, "Wallet", 0.0).await;
    let card = create_account(&app, &user, "Card", 0.0).await;
    let category = create_category(&app, &user, "expense").await;

    create_transaction(
        &app,
        &user,
        json!({
            "account_id": wallet,
            "type": "income",
            "amount": 1000.0,
            "description": "salary",
            "date": today(),
            "recurring": true,
        }),
    )
    .await;
    expense(&app, &user, &card, &category, 250.0).await;

    let (status, budget) = post(
        &app,
        "/budgets",
        &user,
        json!({
            "category_id": category,
            "name": "Cards",
            "amount_planned": 200.0,
            "period": "monthly",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, goal) = post(
        &app,
        "/saving-goals",
        &user,
        json!({ "title": "Done already", "target_amount": 10.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = put(
        &app,
        &format!("/saving-goals/{}", goal["id"].as_str().expect("goal id")),
        &user,
        json!({ "current_amount": 10.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, "/finance/dashboard", &user).await;
    assert_eq!(status, StatusCode::OK);

    let debts = body["debts"].as_array().expect("debts");
    assert_eq!(debts.len(), 1);
    assert_eq!(debts[0]["account_id"], card.as_str());
    assert_eq!(debts[0]["debt_amount"], 250.0);

    let summary = &body["summary"];
    assert_eq!(summary["total_balance"], 1000.0);
    assert_eq!(summary["total_debts"], 250.0);
    assert_eq!(summary["monthly_income"], 1000.0);
    assert_eq!(summary["monthly_expenses"], 250.0);
    assert_eq!(summary["budgets_overspent"], 1);
    assert_eq!(summary["saving_goals_achieved"], 1);

    assert_eq!(body["recurring_transactions"].as_array().expect("recurring").len(), 1);
    assert_eq!(body["current_month_transactions"].as_array().expect("month").len(), 2);

    let statuses = body["budgets_with_status"].as_array().expect("budgets");
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0]["id"], budget["id"]);
    assert_eq!(statuses[0]["status"], "danger");

    // The dashboard never persists recomputed spend.
    let budget_uri = format!("/budgets/{}", budget["id"].as_str().expect("id"));
    let (_, stored) = get(&app, &budget_uri, &user).await;
    assert_eq!(stored["amount_spent"], 0.0);
}

#[tokio::test]
async fn empty_dashboard_for_new_user() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "dave").await;

    let (status, body) = get(&app, "/finance/dashboard", &user).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accounts"].as_array().expect("accounts").len(), 5);
    assert!(body["debts"].as_array().expect("debts").is_empty());
    assert_eq!(body["summary"]["total_balance"], 0.0);
    assert_eq!(body["summary"]["budgets_overspent"], 0);
}

#[tokio::test]
async fn previous_month_stays_out_of_the_current_window() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "fay").await;
    let account = create_account(&app, &user, "Main", 1000.0).await;
    let category = create_category(&app, &user, "expense").await;

    let (status, budget) = post(
        &app,
        "/budgets",
        &user,
        json!({
            "category_id": category,
            "name": "Groceries",
            "amount_planned": 100.0,
            "period": "monthly",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    expense(&app, &user, &account, &category, 30.0).await;
    let old_rent = create_transaction(
        &app,
        &user,
        json!({
            "account_id": account,
            "category_id": category,
            "type": "expense",
            "amount": 500.0,
            "description": "last month",
            "date": last_day_of_previous_month(),
            "recurring": true,
        }),
    )
    .await;

    let (status, body) = get(&app, "/finance/dashboard", &user).await;
    assert_eq!(status, StatusCode::OK);

    let month = body["current_month_transactions"].as_array().expect("month");
    assert_eq!(month.len(), 1);
    assert_eq!(month[0]["amount"], 30.0);
    assert_eq!(body["summary"]["monthly_expenses"], 30.0);

    let statuses = body["budgets_with_status"].as_array().expect("budgets");
    assert_eq!(statuses[0]["amount_spent"], 30.0);
    assert_eq!(statuses[0]["status"], "good");

    let recurring = body["recurring_transactions"].as_array().expect("recurring");
    assert_eq!(recurring.len(), 1);
    assert_eq!(recurring[0]["id"], old_rent["id"]);

    let status_uri = format!("/budgets/{}/status", budget["id"].as_str().expect("id"));
    let (_, single) = get(&app, &status_uri, &user).await;
    assert_eq!(single["amount_spent"], 30.0);
}

#[tokio::test]
async fn budget_stats_cover_the_current_month() {
    let app = setup_test_app().await.expect("setup");
    let user = register_user(&app, "gus").await;
    let account = create_account(&app, &user, "Main", 0.0).await;
    let food = create_category(&app, &user, "expense").await;
    let fun = create_category(&app, &user, "expense").await;

    for (category, planned) in [(&food, 200.0), (&fun, 300.0)] {
        let (status, _) = post(
            &app,
            "/budgets",
            &user,
            json!({
                "category_id": category,
                "name": "Monthly",
                "amount_planned": planned,
                "period": "monthly",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    expense(&app, &user, &account, &food, 250.0).await;
    expense(&app, &user, &account, &fun, 50.0).await;

    let (status, stats) = get(&app, "/budgets/stats", &user).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["budget_count"], 2);
    assert_eq!(stats["total_planned"], 500.0);
    assert_eq!(stats["total_spent"], 300.0);
    assert_eq!(stats["remaining"], 200.0);
    assert_eq!(stats["over_budget_count"], 1);
    assert_eq!(stats["utilization_rate"], 60.0);
    assert_eq!(stats["period"].as_str().expect("period").len(), 7);
}

pub mod accounts;
pub mod auth;
pub mod budget_status;
pub mod budgets;
pub mod categories;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod database;
pub mod defaults;
pub mod error;
pub mod models;
pub mod preferences;
pub mod reconcile;
pub mod saving_goals;
pub mod store;
pub mod tasks;
pub mod transactions;
pub mod utils;

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post},
};
use time::{OffsetDateTime, UtcOffset};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

// Re-export types at crate root for convenient importing
pub use crate::database::{Db, TransactionError, with_transaction};

use crate::auth::JwtConfig;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub jwt: Arc<JwtConfig>,
    /// Offset used to decide which calendar month "now" falls in
    pub utc_offset: UtcOffset,
}

impl AppState {
    pub fn new(db: Db, jwt: JwtConfig, utc_offset: UtcOffset) -> Self {
        Self {
            db,
            jwt: Arc::new(jwt),
            utc_offset,
        }
    }

    pub fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.utc_offset)
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("my_finance_server=info,tower_http=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route(
            "/auth/me",
            get(auth::me).put(auth::update_me).delete(auth::delete_me),
        )
        .route(
            "/accounts",
            post(accounts::create_account).get(accounts::get_accounts),
        )
        .route(
            "/accounts/{id}",
            get(accounts::get_account)
                .put(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .route("/accounts/{id}/balance", get(accounts::get_account_balance))
        .route("/accounts/{id}/details", get(accounts::get_account_details))
        .route("/accounts/{id}/reconcile", post(accounts::reconcile_account))
        .route(
            "/transactions",
            post(transactions::create_transaction).get(transactions::get_transactions),
        )
        .route(
            "/transactions/stats",
            get(transactions::get_transaction_stats),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
        .route(
            "/budgets",
            post(budgets::create_budget).get(budgets::get_budgets),
        )
        .route("/budgets/stats", get(budgets::get_budget_stats))
        .route(
            "/budgets/{id}",
            get(budgets::get_budget)
                .put(budgets::update_budget)
                .delete(budgets::delete_budget),
        )
        .route("/budgets/{id}/status", get(budgets::get_budget_status))
        .route(
            "/saving-goals",
            post(saving_goals::create_saving_goal).get(saving_goals::get_saving_goals),
        )
        .route(
            "/saving-goals/{id}",
            get(saving_goals::get_saving_goal)
                .put(saving_goals::update_saving_goal)
                .delete(saving_goals::delete_saving_goal),
        )
        .route(
            "/categories",
            post(categories::create_category).get(categories::get_categories),
        )
        .route(
            "/categories/{id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route("/tasks", post(tasks::create_task).get(tasks::get_tasks))
        .route("/tasks/stats", get(tasks::get_task_stats))
        .route(
            "/tasks/{id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/tasks/{id}/complete", post(tasks::complete_task))
        .route(
            "/preferences",
            post(preferences::create_preferences)
                .get(preferences::get_preferences)
                .put(preferences::update_preferences)
                .delete(preferences::delete_preferences),
        )
        .route("/finance/dashboard", get(dashboard::get_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "My Finance Server - API ready"
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

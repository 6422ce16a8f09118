use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use libsql::Connection;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::budget_status::{amount_spent_in, budget_status, month_bounds, percentage_used};
use crate::constants::*;
use crate::error::{AppError, AppResult};
use crate::models::{
    Budget, BudgetPeriod, BudgetStats, BudgetWithStatus, CategoryType, CreateBudgetPayload,
    GetBudgetsResponse, ListQuery, Transaction, UpdateBudgetPayload,
};
use crate::store;
use crate::utils::{
    ensure_owned, format_date, now_rfc3339, parse_enum, round_amount, validate_list_limit,
    validate_non_negative_amount, validate_offset, validate_positive_amount,
    validate_string_length,
};
use crate::{AppState, Db};

pub fn validate_budget_name(name: &str) -> AppResult<()> {
    validate_string_length(name, "Budget name", MAX_TITLE_LENGTH)
}

async fn load_owned_budget(
    conn: &Connection,
    user_id: &str,
    budget_id: &str,
) -> AppResult<Budget> {
    let budget = store::budgets::get_by_id(conn, budget_id).await?;
    ensure_owned(budget, |b| b.user_id.as_str(), user_id, "Budget")
}

pub async fn create_budget_for_user(
    db: &Db,
    user_id: &str,
    payload: CreateBudgetPayload,
) -> AppResult<Budget> {
    validate_budget_name(&payload.name)?;
    let amount_planned = validate_positive_amount(payload.amount_planned, "Planned amount")?;
    let period: BudgetPeriod = parse_enum(&payload.period, "budget period")?;

    let conn = db.write().await;

    let category = store::categories::get_by_id(&conn, payload.category_id.trim()).await?;
    let category = ensure_owned(category, |c| c.user_id.as_str(), user_id, "Category")?;
    if category.category_type == CategoryType::Task {
        return Err(AppError::validation("Budgets can only target expense or revenue categories"));
    }

    let now = now_rfc3339();
    let budget = Budget {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        category_id: category.id,
        name: payload.name.trim().to_string(),
        amount_planned,
        amount_spent: 0.0,
        period,
        created_at: now.clone(),
        updated_at: now,
    };
    store::budgets::insert(&conn, &budget).await?;
    tracing::info!(user_id, budget_id = %budget.id, "budget created");

    Ok(budget)
}

pub async fn update_budget_for_user(
    db: &Db,
    user_id: &str,
    budget_id: &str,
    payload: UpdateBudgetPayload,
) -> AppResult<Budget> {
    if payload.name.is_none()
        && payload.amount_planned.is_none()
        && payload.amount_spent.is_none()
        && payload.period.is_none()
    {
        return Err(AppError::validation(ERR_EMPTY_UPDATE));
    }

    let conn = db.write().await;
    let mut budget = load_owned_budget(&conn, user_id, budget_id).await?;

    if let Some(name) = payload.name {
        validate_budget_name(&name)?;
        budget.name = name.trim().to_string();
    }
    if let Some(planned) = payload.amount_planned {
        budget.amount_planned = validate_positive_amount(planned, "Planned amount")?;
    }
    if let Some(spent) = payload.amount_spent {
        budget.amount_spent = validate_non_negative_amount(spent, "Spent amount")?;
    }
    if let Some(period) = payload.period {
        budget.period = parse_enum(&period, "budget period")?;
    }
    budget.updated_at = now_rfc3339();

    if store::budgets::update(&conn, &budget).await? == 0 {
        return Err(AppError::not_found("Budget"));
    }
    Ok(budget)
}

pub async fn create_budget(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBudgetPayload>,
) -> Result<(StatusCode, Json<Budget>), AppError> {
    let budget = create_budget_for_user(&app_state.db, &user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

pub async fn get_budgets(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<(StatusCode, Json<GetBudgetsResponse>), AppError> {
    let limit = validate_list_limit(query.limit)?;
    let offset = validate_offset(query.offset)?;

    let conn = app_state.db.read().await;
    let total_count = store::budgets::count_by_user_id(&conn, &user.id).await?;
    let budgets = store::budgets::list(&conn, &user.id, limit, offset).await?;

    Ok((
        StatusCode::OK,
        Json(GetBudgetsResponse {
            budgets,
            total_count,
        }),
    ))
}

pub async fn get_budget(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(budget_id): Path<String>,
) -> Result<(StatusCode, Json<Budget>), AppError> {
    let conn = app_state.db.read().await;
    let budget = load_owned_budget(&conn, &user.id, &budget_id).await?;
    Ok((StatusCode::OK, Json(budget)))
}

/// Status of one budget against the current month's transactions.
pub async fn get_budget_status(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(budget_id): Path<String>,
) -> Result<(StatusCode, Json<BudgetWithStatus>), AppError> {
    let now = app_state.now();
    let (start, end) = month_bounds(now.date())
        .ok_or_else(|| AppError::Internal("current date out of range".into()))?;

    let conn = app_state.db.read().await;
    let mut budget = load_owned_budget(&conn, &user.id, &budget_id).await?;
    let month = store::transactions::get_by_date_range(
        &conn,
        &user.id,
        &format_date(start),
        &format_date(end),
    )
    .await?;
    budget.amount_spent = amount_spent_in(&budget.category_id, &month);

    Ok((StatusCode::OK, Json(budget_status(budget, now))))
}

/// Aggregates `budgets` against one month of transactions. A budget counts as
/// over budget once its spend exceeds the plan.
pub fn budget_stats(budgets: &[Budget], month: &[Transaction], period: String) -> BudgetStats {
    let mut stats = BudgetStats {
        period,
        ..Default::default()
    };
    for budget in budgets {
        let spent = amount_spent_in(&budget.category_id, month);
        stats.total_planned += budget.amount_planned;
        stats.total_spent += spent;
        stats.budget_count += 1;
        if spent > budget.amount_planned {
            stats.over_budget_count += 1;
        }
    }

    stats.total_planned = round_amount(stats.total_planned);
    stats.total_spent = round_amount(stats.total_spent);
    stats.remaining = round_amount(stats.total_planned - stats.total_spent);
    stats.utilization_rate = round_amount(percentage_used(stats.total_spent, stats.total_planned));
    stats
}

pub async fn get_budget_stats(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<BudgetStats>), AppError> {
    let today = app_state.now().date();
    let (start, end) = month_bounds(today)
        .ok_or_else(|| AppError::Internal("current date out of range".into()))?;

    let conn = app_state.db.read().await;
    let budgets = store::budgets::get_by_user_id(&conn, &user.id).await?;
    let month = store::transactions::get_by_date_range(
        &conn,
        &user.id,
        &format_date(start),
        &format_date(end),
    )
    .await?;

    let period = format!("{:02}/{}", u8::from(today.month()), today.year());
    Ok((StatusCode::OK, Json(budget_stats(&budgets, &month, period))))
}

pub async fn update_budget(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(budget_id): Path<String>,
    Json(payload): Json<UpdateBudgetPayload>,
) -> Result<(StatusCode, Json<Budget>), AppError> {
    let budget = update_budget_for_user(&app_state.db, &user.id, &budget_id, payload).await?;
    Ok((StatusCode::OK, Json(budget)))
}

pub async fn delete_budget(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(budget_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let conn = app_state.db.write().await;
    load_owned_budget(&conn, &user.id, &budget_id).await?;
    if store::budgets::delete(&conn, &user.id, &budget_id).await? == 0 {
        return Err(AppError::not_found("Budget"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;

    fn budget(category: &str, planned: f64) -> Budget {
        Budget {
            id: format!("b-{}", category),
            user_id: "u1".into(),
            category_id: category.into(),
            name: category.into(),
            amount_planned: planned,
            amount_spent: 0.0,
            period: BudgetPeriod::Monthly,
            created_at: "2026-10-01T00:00:00Z".into(),
            updated_at: "2026-10-01T00:00:00Z".into(),
        }
    }

    fn spend(category: &str, amount: f64) -> Transaction {
        Transaction {
            id: format!("t-{}-{}", category, amount),
            user_id: "u1".into(),
            account_id: "a1".into(),
            category_id: Some(category.into()),
            transaction_type: TransactionType::Expense,
            saving_goal_id: None,
            amount,
            description: "spend".into(),
            date: "2026-10-10".into(),
            recurring: false,
            created_at: "2026-10-10T00:00:00Z".into(),
            updated_at: "2026-10-10T00:00:00Z".into(),
        }
    }

    #[test]
    fn stats_total_every_budget() {
        let budgets = [budget("food", 500.0), budget("rent", 1000.0)];
        let month = [spend("food", 600.0), spend("rent", 300.0), spend("other", 50.0)];

        let stats = budget_stats(&budgets, &month, "10/2026".into());
        assert_eq!(
            stats,
            BudgetStats {
                period: "10/2026".into(),
                total_planned: 1500.0,
                total_spent: 900.0,
                remaining: 600.0,
                budget_count: 2,
                over_budget_count: 1,
                utilization_rate: 60.0,
            }
        );
    }

    #[test]
    fn spending_exactly_the_plan_is_not_over_budget() {
        let stats = budget_stats(&[budget("food", 100.0)], &[spend("food", 100.0)], "x".into());
        assert_eq!(stats.over_budget_count, 0);
        assert_eq!(stats.utilization_rate, 100.0);
    }

    #[test]
    fn no_budgets_means_zero_utilization() {
        let stats = budget_stats(&[], &[spend("food", 10.0)], "x".into());
        assert_eq!(stats.budget_count, 0);
        assert_eq!(stats.utilization_rate, 0.0);
    }
}

use axum::{Json, extract::State, http::StatusCode};

use crate::auth::AuthUser;
use crate::constants::ERR_EMPTY_UPDATE;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreatePreferencesPayload, ExpensePreferences, IncomePreferences, Preferences,
    UpdatePreferencesPayload,
};
use crate::store;
use crate::utils::{now_rfc3339, round_amount, validate_date};
use crate::AppState;

fn validate_amount(value: f64, field_name: &str) -> AppResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::validation(format!(
            "{} cannot be negative",
            field_name
        )));
    }
    Ok(round_amount(value))
}

fn validate_income(income: &mut IncomePreferences) -> AppResult<()> {
    income.monthly_total = validate_amount(income.monthly_total, "Monthly income")?;
    income.debt_amount = validate_amount(income.debt_amount, "Debt amount")?;
    Ok(())
}

fn validate_expenses(expenses: &mut ExpensePreferences) -> AppResult<()> {
    expenses.food = validate_amount(expenses.food, "Food budget")?;
    expenses.transport = validate_amount(expenses.transport, "Transport budget")?;
    expenses.housing = validate_amount(expenses.housing, "Housing budget")?;
    expenses.subscriptions = validate_amount(expenses.subscriptions, "Subscriptions budget")?;
    Ok(())
}

fn validate_sections(prefs: &mut Preferences) -> AppResult<()> {
    validate_income(&mut prefs.income)?;
    validate_expenses(&mut prefs.expenses)?;
    prefs.goals.savings_target = validate_amount(prefs.goals.savings_target, "Savings target")?;
    if !prefs.goals.deadline.trim().is_empty() {
        validate_date(&prefs.goals.deadline)?;
    }
    Ok(())
}

pub async fn create_preferences(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePreferencesPayload>,
) -> Result<(StatusCode, Json<Preferences>), AppError> {
    let now = now_rfc3339();
    let mut prefs = Preferences {
        user_id: user.id.clone(),
        income: payload.income,
        expenses: payload.expenses,
        goals: payload.goals,
        habits: payload.habits,
        created_at: now.clone(),
        updated_at: now,
    };
    validate_sections(&mut prefs)?;

    let conn = app_state.db.write().await;
    if store::preferences::get_by_user_id(&conn, &user.id).await?.is_some() {
        return Err(AppError::Conflict(
            "Preferences already exist for this user".to_string(),
        ));
    }
    store::preferences::insert(&conn, &prefs).await?;

    Ok((StatusCode::CREATED, Json(prefs)))
}

pub async fn get_preferences(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<Preferences>), AppError> {
    let conn = app_state.db.read().await;
    let prefs = store::preferences::get_by_user_id(&conn, &user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Preferences"))?;
    Ok((StatusCode::OK, Json(prefs)))
}

/// Replaces each section present in the payload; absent sections are kept.
pub async fn update_preferences(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdatePreferencesPayload>,
) -> Result<(StatusCode, Json<Preferences>), AppError> {
    if payload.income.is_none()
        && payload.expenses.is_none()
        && payload.goals.is_none()
        && payload.habits.is_none()
    {
        return Err(AppError::validation(ERR_EMPTY_UPDATE));
    }

    let conn = app_state.db.write().await;
    let mut prefs = store::preferences::get_by_user_id(&conn, &user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Preferences"))?;

    if let Some(income) = payload.income {
        prefs.income = income;
    }
    if let Some(expenses) = payload.expenses {
        prefs.expenses = expenses;
    }
    if let Some(goals) = payload.goals {
        prefs.goals = goals;
    }
    if let Some(habits) = payload.habits {
        prefs.habits = habits;
    }
    validate_sections(&mut prefs)?;
    prefs.updated_at = now_rfc3339();

    store::preferences::update(&conn, &prefs).await?;
    Ok((StatusCode::OK, Json(prefs)))
}

pub async fn delete_preferences(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, AppError> {
    let conn = app_state.db.write().await;
    if store::preferences::delete(&conn, &user.id).await? == 0 {
        return Err(AppError::not_found("Preferences"));
    }
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use libsql::Connection;
use uuid::Uuid;

use crate::accounts::load_owned_account;
use crate::auth::AuthUser;
use crate::constants::*;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateSavingGoalPayload, GetSavingGoalsResponse, GoalFrequency, ListQuery, SavingGoal,
    UpdateSavingGoalPayload,
};
use crate::reconcile::move_goal_contribution;
use crate::store;
use crate::utils::{
    ensure_owned, now_rfc3339, parse_enum, validate_date, validate_list_limit,
    validate_non_negative_amount, validate_offset, validate_positive_amount,
    validate_string_length,
};
use crate::{AppState, Db, with_transaction};

pub fn validate_goal_title(title: &str) -> AppResult<()> {
    validate_string_length(title, "Title", MAX_TITLE_LENGTH)
}

async fn load_owned_goal(
    conn: &Connection,
    user_id: &str,
    goal_id: &str,
) -> AppResult<SavingGoal> {
    let goal = store::saving_goals::get_by_id(conn, goal_id).await?;
    ensure_owned(goal, |g| g.user_id.as_str(), user_id, "Saving goal")
}

fn parse_deadline(deadline: Option<String>) -> AppResult<Option<String>> {
    match deadline.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()) {
        Some(d) => {
            validate_date(&d)?;
            Ok(Some(d))
        }
        None => Ok(None),
    }
}

pub async fn create_saving_goal_for_user(
    db: &Db,
    user_id: &str,
    payload: CreateSavingGoalPayload,
) -> AppResult<SavingGoal> {
    validate_goal_title(&payload.title)?;
    let target_amount = validate_positive_amount(payload.target_amount, "Target amount")?;
    let deadline = parse_deadline(payload.deadline)?;
    let frequency = match payload.frequency.as_deref() {
        Some(f) => parse_enum(f, "frequency")?,
        None => GoalFrequency::Monthly,
    };
    let account_id = payload
        .account_id
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());

    let conn = db.write().await;
    if let Some(ref account_id) = account_id {
        load_owned_account(&conn, user_id, account_id).await?;
    }

    let now = now_rfc3339();
    let goal = SavingGoal {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        account_id,
        title: payload.title.trim().to_string(),
        target_amount,
        current_amount: 0.0,
        deadline,
        is_achieved: false,
        frequency,
        created_at: now.clone(),
        updated_at: now,
    };
    store::saving_goals::insert(&conn, &goal).await?;
    tracing::info!(user_id, goal_id = %goal.id, "saving goal created");

    Ok(goal)
}

/// Applies a partial update. Reaching the target marks the goal achieved;
/// the flag is never cleared again.
pub async fn update_saving_goal_for_user(
    db: &Db,
    user_id: &str,
    goal_id: &str,
    payload: UpdateSavingGoalPayload,
) -> AppResult<SavingGoal> {
    if payload.title.is_none()
        && payload.target_amount.is_none()
        && payload.current_amount.is_none()
        && payload.deadline.is_none()
        && payload.frequency.is_none()
        && payload.account_id.is_none()
    {
        return Err(AppError::validation(ERR_EMPTY_UPDATE));
    }

    let user_id = user_id.to_string();
    let goal_id = goal_id.to_string();
    with_transaction(db, |conn| {
        Box::pin(async move {
            let mut goal = load_owned_goal(conn, &user_id, &goal_id).await?;
            let previous_account = goal.account_id.clone();

            if let Some(title) = payload.title {
                validate_goal_title(&title)?;
                goal.title = title.trim().to_string();
            }
            if let Some(target) = payload.target_amount {
                goal.target_amount = validate_positive_amount(target, "Target amount")?;
            }
            if let Some(current) = payload.current_amount {
                goal.current_amount = validate_non_negative_amount(current, "Current amount")?;
            }
            if payload.deadline.is_some() {
                goal.deadline = parse_deadline(payload.deadline)?;
            }
            if let Some(frequency) = payload.frequency {
                goal.frequency = parse_enum(&frequency, "frequency")?;
            }
            if let Some(account_id) = payload.account_id {
                let account_id = account_id.trim().to_string();
                if account_id.is_empty() {
                    goal.account_id = None;
                } else {
                    load_owned_account(conn, &user_id, &account_id).await?;
                    goal.account_id = Some(account_id);
                }
            }

            if goal.current_amount >= goal.target_amount {
                goal.is_achieved = true;
            }
            goal.updated_at = now_rfc3339();

            if store::saving_goals::update(conn, &goal).await? == 0 {
                return Err(AppError::not_found("Saving goal"));
            }
            move_goal_contribution(
                conn,
                &user_id,
                &goal.id,
                previous_account.as_deref(),
                goal.account_id.as_deref(),
            )
            .await?;

            if goal.is_achieved {
                tracing::info!(user_id = %user_id, goal_id = %goal.id, "saving goal achieved");
            }
            Ok(goal)
        })
    })
    .await
}

/// Linked transactions keep existing with their goal reference cleared, so
/// their contribution leaves the goal's account.
pub async fn delete_saving_goal_for_user(db: &Db, user_id: &str, goal_id: &str) -> AppResult<()> {
    let user_id = user_id.to_string();
    let goal_id = goal_id.to_string();
    with_transaction(db, |conn| {
        Box::pin(async move {
            let goal = load_owned_goal(conn, &user_id, &goal_id).await?;
            move_goal_contribution(conn, &user_id, &goal.id, goal.account_id.as_deref(), None)
                .await?;
            if store::saving_goals::delete(conn, &user_id, &goal_id).await? == 0 {
                return Err(AppError::not_found("Saving goal"));
            }
            Ok(())
        })
    })
    .await
}

pub async fn create_saving_goal(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateSavingGoalPayload>,
) -> Result<(StatusCode, Json<SavingGoal>), AppError> {
    let goal = create_saving_goal_for_user(&app_state.db, &user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn get_saving_goals(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<(StatusCode, Json<GetSavingGoalsResponse>), AppError> {
    let limit = validate_list_limit(query.limit)?;
    let offset = validate_offset(query.offset)?;

    let conn = app_state.db.read().await;
    let total_count = store::saving_goals::count_by_user_id(&conn, &user.id).await?;
    let saving_goals = store::saving_goals::list(&conn, &user.id, limit, offset).await?;

    Ok((
        StatusCode::OK,
        Json(GetSavingGoalsResponse {
            saving_goals,
            total_count,
        }),
    ))
}

pub async fn get_saving_goal(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(goal_id): Path<String>,
) -> Result<(StatusCode, Json<SavingGoal>), AppError> {
    let conn = app_state.db.read().await;
    let goal = load_owned_goal(&conn, &user.id, &goal_id).await?;
    Ok((StatusCode::OK, Json(goal)))
}

pub async fn update_saving_goal(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(goal_id): Path<String>,
    Json(payload): Json<UpdateSavingGoalPayload>,
) -> Result<(StatusCode, Json<SavingGoal>), AppError> {
    let goal = update_saving_goal_for_user(&app_state.db, &user.id, &goal_id, payload).await?;
    Ok((StatusCode::OK, Json(goal)))
}

pub async fn delete_saving_goal(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(goal_id): Path<String>,
) -> Result<StatusCode, AppError> {
    delete_saving_goal_for_user(&app_state.db, &user.id, &goal_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

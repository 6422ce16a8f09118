use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use libsql::Connection;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::constants::*;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateTaskPayload, GetTasksQuery, GetTasksResponse, Task, TaskPriority, TaskStats, TaskStatus,
    UpdateTaskPayload,
};
use crate::store;
use crate::utils::{
    ensure_owned, now_rfc3339, parse_enum, round_amount, validate_list_limit,
    validate_max_length, validate_offset, validate_string_length, validate_timestamp,
};
use crate::{AppState, Db};

pub fn validate_task_title(title: &str) -> AppResult<()> {
    validate_string_length(title, "Title", MAX_TITLE_LENGTH)
}

pub fn validate_minutes(minutes: i64, field_name: &str) -> AppResult<i64> {
    if !(0..=MAX_TASK_MINUTES).contains(&minutes) {
        return Err(AppError::validation(format!(
            "{} must be between 0 and {} minutes",
            field_name, MAX_TASK_MINUTES
        )));
    }
    Ok(minutes)
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

async fn load_owned_task(conn: &Connection, user_id: &str, task_id: &str) -> AppResult<Task> {
    let task = store::tasks::get_by_id(conn, task_id).await?;
    ensure_owned(task, |t| t.user_id.as_str(), user_id, "Task")
}

async fn ensure_category(conn: &Connection, user_id: &str, category_id: &str) -> AppResult<()> {
    let category = store::categories::get_by_id(conn, category_id).await?;
    ensure_owned(category, |c| c.user_id.as_str(), user_id, "Category").map(|_| ())
}

pub fn task_stats(total_tasks: u32, completed_tasks: u32) -> TaskStats {
    let completion_rate = if total_tasks > 0 {
        round_amount(f64::from(completed_tasks) / f64::from(total_tasks) * 100.0)
    } else {
        0.0
    };
    TaskStats {
        total_tasks,
        completed_tasks,
        pending_tasks: total_tasks - completed_tasks,
        completion_rate,
    }
}

pub async fn create_task_for_user(
    db: &Db,
    user_id: &str,
    payload: CreateTaskPayload,
) -> AppResult<Task> {
    validate_task_title(&payload.title)?;
    validate_max_length(&payload.description, "Description", MAX_TASK_DESCRIPTION_LENGTH)?;
    let priority: TaskPriority = parse_enum(&payload.priority, "priority")?;
    let duration_planned = validate_minutes(payload.duration_planned, "Planned duration")?;
    let due_date = clean_optional(payload.due_date);
    if let Some(ref due) = due_date {
        validate_timestamp(due, "Due date")?;
    }
    let recurrence_rule = clean_optional(payload.recurrence_rule);
    if let Some(ref rule) = recurrence_rule {
        validate_max_length(rule, "Recurrence rule", MAX_RECURRENCE_RULE_LENGTH)?;
    }
    let category_id = clean_optional(payload.category_id);

    let conn = db.write().await;
    if let Some(ref category_id) = category_id {
        ensure_category(&conn, user_id, category_id).await?;
    }

    let now = now_rfc3339();
    let task = Task {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        category_id,
        title: payload.title.trim().to_string(),
        description: payload.description.trim().to_string(),
        priority,
        due_date,
        duration_planned,
        duration_spent: 0,
        status: TaskStatus::Incoming,
        recurrence_rule,
        created_at: now.clone(),
        updated_at: now,
    };
    store::tasks::insert(&conn, &task).await?;

    Ok(task)
}

pub async fn update_task_for_user(
    db: &Db,
    user_id: &str,
    task_id: &str,
    payload: UpdateTaskPayload,
) -> AppResult<Task> {
    let conn = db.write().await;
    let mut task = load_owned_task(&conn, user_id, task_id).await?;

    if let Some(title) = payload.title {
        validate_task_title(&title)?;
        task.title = title.trim().to_string();
    }
    if let Some(description) = payload.description {
        validate_max_length(&description, "Description", MAX_TASK_DESCRIPTION_LENGTH)?;
        task.description = description.trim().to_string();
    }
    if let Some(priority) = payload.priority {
        task.priority = parse_enum(&priority, "priority")?;
    }
    if let Some(due) = payload.due_date {
        task.due_date = clean_optional(Some(due));
        if let Some(ref due) = task.due_date {
            validate_timestamp(due, "Due date")?;
        }
    }
    if let Some(minutes) = payload.duration_planned {
        task.duration_planned = validate_minutes(minutes, "Planned duration")?;
    }
    if let Some(minutes) = payload.duration_spent {
        task.duration_spent = validate_minutes(minutes, "Spent duration")?;
    }
    if let Some(status) = payload.status {
        task.status = parse_enum(&status, "status")?;
    }
    if let Some(category_id) = payload.category_id {
        task.category_id = clean_optional(Some(category_id));
        if let Some(ref category_id) = task.category_id {
            ensure_category(&conn, user_id, category_id).await?;
        }
    }
    if let Some(rule) = payload.recurrence_rule {
        task.recurrence_rule = clean_optional(Some(rule));
        if let Some(ref rule) = task.recurrence_rule {
            validate_max_length(rule, "Recurrence rule", MAX_RECURRENCE_RULE_LENGTH)?;
        }
    }
    task.updated_at = now_rfc3339();

    if store::tasks::update(&conn, &task).await? == 0 {
        return Err(AppError::not_found("Task"));
    }
    Ok(task)
}

pub async fn create_task(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTaskPayload>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = create_task_for_user(&app_state.db, &user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_tasks(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<GetTasksQuery>,
) -> Result<(StatusCode, Json<GetTasksResponse>), AppError> {
    let limit = validate_list_limit(query.limit)?;
    let offset = validate_offset(query.offset)?;
    let status: Option<TaskStatus> = query
        .status
        .as_deref()
        .map(|s| parse_enum(s, "status"))
        .transpose()?;

    let conn = app_state.db.read().await;
    let total_count = store::tasks::count(&conn, &user.id, status).await?;
    let tasks = store::tasks::list(&conn, &user.id, status, limit, offset).await?;

    Ok((StatusCode::OK, Json(GetTasksResponse { tasks, total_count })))
}

pub async fn get_task_stats(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<TaskStats>), AppError> {
    let conn = app_state.db.read().await;
    let total = store::tasks::count(&conn, &user.id, None).await?;
    let done = store::tasks::count(&conn, &user.id, Some(TaskStatus::Done)).await?;
    Ok((StatusCode::OK, Json(task_stats(total, done))))
}

pub async fn get_task(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<String>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let conn = app_state.db.read().await;
    let task = load_owned_task(&conn, &user.id, &task_id).await?;
    Ok((StatusCode::OK, Json(task)))
}

pub async fn update_task(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<String>,
    Json(payload): Json<UpdateTaskPayload>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = update_task_for_user(&app_state.db, &user.id, &task_id, payload).await?;
    Ok((StatusCode::OK, Json(task)))
}

pub async fn complete_task(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<String>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let payload = UpdateTaskPayload {
        status: Some(TaskStatus::Done.as_str().to_string()),
        ..Default::default()
    };
    let task = update_task_for_user(&app_state.db, &user.id, &task_id, payload).await?;
    Ok((StatusCode::OK, Json(task)))
}

pub async fn delete_task(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let conn = app_state.db.write().await;
    load_owned_task(&conn, &user.id, &task_id).await?;
    if store::tasks::delete(&conn, &user.id, &task_id).await? == 0 {
        return Err(AppError::not_found("Task"));
    }
    Ok(StatusCode::NO_CONTENT)
}

use libsql::{Connection, Row, Value};

use super::{collect_rows, count_rows, enum_column, first_row, invalid_row};
use crate::error::AppResult;
use crate::models::{Task, TaskStatus};
use crate::utils::db_error_with_context;

const TASK_COLUMNS: &str = "id, user_id, category_id, title, description, priority, due_date, duration_planned, duration_spent, status, recurrence_rule, created_at, updated_at";

pub fn extract_task_from_row(row: &Row) -> AppResult<Task> {
    let bad = |_: libsql::Error| invalid_row("task");
    Ok(Task {
        id: row.get(0).map_err(bad)?,
        user_id: row.get(1).map_err(bad)?,
        category_id: row.get(2).map_err(bad)?,
        title: row.get(3).map_err(bad)?,
        description: row.get(4).map_err(bad)?,
        priority: enum_column(row, 5, "task")?,
        due_date: row.get(6).map_err(bad)?,
        duration_planned: row.get(7).map_err(bad)?,
        duration_spent: row.get(8).map_err(bad)?,
        status: enum_column(row, 9, "task")?,
        recurrence_rule: row.get(10).map_err(bad)?,
        created_at: row.get(11).map_err(bad)?,
        updated_at: row.get(12).map_err(bad)?,
    })
}

fn status_clause(user_id: &str, status: Option<TaskStatus>) -> (String, Vec<Value>) {
    let mut clause = String::from("user_id = ?");
    let mut params = vec![Value::Text(user_id.to_string())];
    if let Some(status) = status {
        clause.push_str(" AND status = ?");
        params.push(Value::Text(status.as_str().to_string()));
    }
    (clause, params)
}

pub async fn insert(conn: &Connection, task: &Task) -> AppResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO tasks ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            TASK_COLUMNS
        ),
        libsql::params![
            task.id.as_str(),
            task.user_id.as_str(),
            task.category_id.clone(),
            task.title.as_str(),
            task.description.as_str(),
            task.priority.as_str(),
            task.due_date.clone(),
            task.duration_planned,
            task.duration_spent,
            task.status.as_str(),
            task.recurrence_rule.clone(),
            task.created_at.as_str(),
            task.updated_at.as_str(),
        ],
    )
    .await
    .map_err(|_| db_error_with_context("task creation failed"))?;
    Ok(())
}

pub async fn get_by_id(conn: &Connection, task_id: &str) -> AppResult<Option<Task>> {
    let rows = conn
        .query(
            &format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS),
            [task_id],
        )
        .await
        .map_err(|_| db_error_with_context("failed to query task"))?;
    first_row(rows, extract_task_from_row).await
}

pub async fn list(
    conn: &Connection,
    user_id: &str,
    status: Option<TaskStatus>,
    limit: u32,
    offset: u32,
) -> AppResult<Vec<Task>> {
    let (clause, mut params) = status_clause(user_id, status);
    params.push(Value::Integer(i64::from(limit)));
    params.push(Value::Integer(i64::from(offset)));
    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM tasks WHERE {} ORDER BY due_date IS NULL, due_date, created_at LIMIT ? OFFSET ?",
                TASK_COLUMNS, clause
            ),
            params,
        )
        .await
        .map_err(|_| db_error_with_context("failed to query tasks"))?;
    collect_rows(rows, extract_task_from_row).await
}

pub async fn count(conn: &Connection, user_id: &str, status: Option<TaskStatus>) -> AppResult<u32> {
    let (clause, params) = status_clause(user_id, status);
    let rows = conn
        .query(&format!("SELECT COUNT(*) FROM tasks WHERE {}", clause), params)
        .await
        .map_err(|_| db_error_with_context("failed to count tasks"))?;
    count_rows(rows).await
}

pub async fn update(conn: &Connection, task: &Task) -> AppResult<u64> {
    conn.execute(
        "UPDATE tasks SET category_id = ?, title = ?, description = ?, priority = ?, due_date = ?, duration_planned = ?, duration_spent = ?, status = ?, recurrence_rule = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        libsql::params![
            task.category_id.clone(),
            task.title.as_str(),
            task.description.as_str(),
            task.priority.as_str(),
            task.due_date.clone(),
            task.duration_planned,
            task.duration_spent,
            task.status.as_str(),
            task.recurrence_rule.clone(),
            task.updated_at.as_str(),
            task.id.as_str(),
            task.user_id.as_str(),
        ],
    )
    .await
    .map_err(|_| db_error_with_context("failed to update task"))
}

pub async fn delete(conn: &Connection, user_id: &str, task_id: &str) -> AppResult<u64> {
    conn.execute(
        "DELETE FROM tasks WHERE id = ? AND user_id = ?",
        (task_id, user_id),
    )
    .await
    .map_err(|_| db_error_with_context("failed to delete task"))
}

/// Clears the category of every task pointing at a deleted category.
pub async fn detach_category(
    conn: &Connection,
    user_id: &str,
    category_id: &str,
) -> AppResult<u64> {
    conn.execute(
        "UPDATE tasks SET category_id = NULL WHERE user_id = ? AND category_id = ?",
        (user_id, category_id),
    )
    .await
    .map_err(|_| db_error_with_context("failed to detach tasks from category"))
}

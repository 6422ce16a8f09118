use libsql::{Connection, Row};

use super::{collect_rows, count_rows, enum_column, first_row, invalid_row};
use crate::error::AppResult;
use crate::models::SavingGoal;
use crate::utils::db_error_with_context;

const SAVING_GOAL_COLUMNS: &str = "id, user_id, account_id, title, target_amount, current_amount, deadline, is_achieved, frequency, created_at, updated_at";

pub fn extract_saving_goal_from_row(row: &Row) -> AppResult<SavingGoal> {
    let bad = |_: libsql::Error| invalid_row("saving goal");
    Ok(SavingGoal {
        id: row.get(0).map_err(bad)?,
        user_id: row.get(1).map_err(bad)?,
        account_id: row.get(2).map_err(bad)?,
        title: row.get(3).map_err(bad)?,
        target_amount: row.get(4).map_err(bad)?,
        current_amount: row.get(5).map_err(bad)?,
        deadline: row.get(6).map_err(bad)?,
        is_achieved: row.get(7).map_err(bad)?,
        frequency: enum_column(row, 8, "saving goal")?,
        created_at: row.get(9).map_err(bad)?,
        updated_at: row.get(10).map_err(bad)?,
    })
}

pub async fn insert(conn: &Connection, goal: &SavingGoal) -> AppResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO saving_goals ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            SAVING_GOAL_COLUMNS
        ),
        libsql::params![
            goal.id.as_str(),
            goal.user_id.as_str(),
            goal.account_id.clone(),
            goal.title.as_str(),
            goal.target_amount,
            goal.current_amount,
            goal.deadline.clone(),
            goal.is_achieved,
            goal.frequency.as_str(),
            goal.created_at.as_str(),
            goal.updated_at.as_str(),
        ],
    )
    .await
    .map_err(|_| db_error_with_context("saving goal creation failed"))?;
    Ok(())
}

pub async fn get_by_id(conn: &Connection, goal_id: &str) -> AppResult<Option<SavingGoal>> {
    let rows = conn
        .query(
            &format!("SELECT {} FROM saving_goals WHERE id = ?", SAVING_GOAL_COLUMNS),
            [goal_id],
        )
        .await
        .map_err(|_| db_error_with_context("failed to query saving goal"))?;
    first_row(rows, extract_saving_goal_from_row).await
}

pub async fn list(
    conn: &Connection,
    user_id: &str,
    limit: u32,
    offset: u32,
) -> AppResult<Vec<SavingGoal>> {
    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM saving_goals WHERE user_id = ? ORDER BY created_at, rowid LIMIT ? OFFSET ?",
                SAVING_GOAL_COLUMNS
            ),
            (user_id, limit, offset),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query saving goals"))?;
    collect_rows(rows, extract_saving_goal_from_row).await
}

pub async fn get_by_user_id(conn: &Connection, user_id: &str) -> AppResult<Vec<SavingGoal>> {
    list(conn, user_id, u32::MAX, 0).await
}

pub async fn count_by_user_id(conn: &Connection, user_id: &str) -> AppResult<u32> {
    let rows = conn
        .query("SELECT COUNT(*) FROM saving_goals WHERE user_id = ?", [user_id])
        .await
        .map_err(|_| db_error_with_context("failed to count saving goals"))?;
    count_rows(rows).await
}

/// Goals linked to one account; these feed balance reconciliation.
pub async fn get_by_account_id(
    conn: &Connection,
    user_id: &str,
    account_id: &str,
) -> AppResult<Vec<SavingGoal>> {
    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM saving_goals WHERE user_id = ? AND account_id = ? ORDER BY created_at, rowid",
                SAVING_GOAL_COLUMNS
            ),
            (user_id, account_id),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query account saving goals"))?;
    collect_rows(rows, extract_saving_goal_from_row).await
}

pub async fn update(conn: &Connection, goal: &SavingGoal) -> AppResult<u64> {
    conn.execute(
        "UPDATE saving_goals SET account_id = ?, title = ?, target_amount = ?, current_amount = ?, deadline = ?, is_achieved = ?, frequency = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        libsql::params![
            goal.account_id.clone(),
            goal.title.as_str(),
            goal.target_amount,
            goal.current_amount,
            goal.deadline.clone(),
            goal.is_achieved,
            goal.frequency.as_str(),
            goal.updated_at.as_str(),
            goal.id.as_str(),
            goal.user_id.as_str(),
        ],
    )
    .await
    .map_err(|_| db_error_with_context("failed to update saving goal"))
}

pub async fn delete(conn: &Connection, user_id: &str, goal_id: &str) -> AppResult<u64> {
    conn.execute(
        "DELETE FROM saving_goals WHERE id = ? AND user_id = ?",
        (goal_id, user_id),
    )
    .await
    .map_err(|_| db_error_with_context("failed to delete saving goal"))
}

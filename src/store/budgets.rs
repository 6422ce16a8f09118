use libsql::{Connection, Row};

use super::{collect_rows, count_rows, enum_column, first_row, invalid_row};
use crate::error::AppResult;
use crate::models::Budget;
use crate::utils::db_error_with_context;

const BUDGET_COLUMNS: &str =
    "id, user_id, category_id, name, amount_planned, amount_spent, period, created_at, updated_at";

pub fn extract_budget_from_row(row: &Row) -> AppResult<Budget> {
    let bad = |_: libsql::Error| invalid_row("budget");
    Ok(Budget {
        id: row.get(0).map_err(bad)?,
        user_id: row.get(1).map_err(bad)?,
        category_id: row.get(2).map_err(bad)?,
        name: row.get(3).map_err(bad)?,
        amount_planned: row.get(4).map_err(bad)?,
        amount_spent: row.get(5).map_err(bad)?,
        period: enum_column(row, 6, "budget")?,
        created_at: row.get(7).map_err(bad)?,
        updated_at: row.get(8).map_err(bad)?,
    })
}

pub async fn insert(conn: &Connection, budget: &Budget) -> AppResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO budgets ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            BUDGET_COLUMNS
        ),
        libsql::params![
            budget.id.as_str(),
            budget.user_id.as_str(),
            budget.category_id.as_str(),
            budget.name.as_str(),
            budget.amount_planned,
            budget.amount_spent,
            budget.period.as_str(),
            budget.created_at.as_str(),
            budget.updated_at.as_str(),
        ],
    )
    .await
    .map_err(|_| db_error_with_context("budget creation failed"))?;
    Ok(())
}

pub async fn get_by_id(conn: &Connection, budget_id: &str) -> AppResult<Option<Budget>> {
    let rows = conn
        .query(
            &format!("SELECT {} FROM budgets WHERE id = ?", BUDGET_COLUMNS),
            [budget_id],
        )
        .await
        .map_err(|_| db_error_with_context("failed to query budget"))?;
    first_row(rows, extract_budget_from_row).await
}

pub async fn list(
    conn: &Connection,
    user_id: &str,
    limit: u32,
    offset: u32,
) -> AppResult<Vec<Budget>> {
    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM budgets WHERE user_id = ? ORDER BY created_at, rowid LIMIT ? OFFSET ?",
                BUDGET_COLUMNS
            ),
            (user_id, limit, offset),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query budgets"))?;
    collect_rows(rows, extract_budget_from_row).await
}

pub async fn get_by_user_id(conn: &Connection, user_id: &str) -> AppResult<Vec<Budget>> {
    list(conn, user_id, u32::MAX, 0).await
}

pub async fn count_by_user_id(conn: &Connection, user_id: &str) -> AppResult<u32> {
    let rows = conn
        .query("SELECT COUNT(*) FROM budgets WHERE user_id = ?", [user_id])
        .await
        .map_err(|_| db_error_with_context("failed to count budgets"))?;
    count_rows(rows).await
}

pub async fn count_by_category(
    conn: &Connection,
    user_id: &str,
    category_id: &str,
) -> AppResult<u32> {
    let rows = conn
        .query(
            "SELECT COUNT(*) FROM budgets WHERE user_id = ? AND category_id = ?",
            (user_id, category_id),
        )
        .await
        .map_err(|_| db_error_with_context("failed to check category usage"))?;
    count_rows(rows).await
}

pub async fn update(conn: &Connection, budget: &Budget) -> AppResult<u64> {
    conn.execute(
        "UPDATE budgets SET name = ?, amount_planned = ?, amount_spent = ?, period = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        libsql::params![
            budget.name.as_str(),
            budget.amount_planned,
            budget.amount_spent,
            budget.period.as_str(),
            budget.updated_at.as_str(),
            budget.id.as_str(),
            budget.user_id.as_str(),
        ],
    )
    .await
    .map_err(|_| db_error_with_context("failed to update budget"))
}

pub async fn delete(conn: &Connection, user_id: &str, budget_id: &str) -> AppResult<u64> {
    conn.execute(
        "DELETE FROM budgets WHERE id = ? AND user_id = ?",
        (budget_id, user_id),
    )
    .await
    .map_err(|_| db_error_with_context("failed to delete budget"))
}

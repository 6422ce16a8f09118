use libsql::{Connection, Row};
use serde::{Serialize, de::DeserializeOwned};

use super::{first_row, invalid_row};
use crate::error::AppResult;
use crate::models::Preferences;
use crate::utils::db_error_with_context;

// Each section is stored as a JSON document in its own TEXT column.

fn section<T: DeserializeOwned>(row: &Row, index: i32) -> AppResult<T> {
    let raw: String = row.get(index).map_err(|_| invalid_row("preferences"))?;
    serde_json::from_str(&raw).map_err(|_| invalid_row("preferences"))
}

fn encode<T: Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string(value).map_err(|_| db_error_with_context("failed to encode preferences"))
}

pub fn extract_preferences_from_row(row: &Row) -> AppResult<Preferences> {
    let bad = |_: libsql::Error| invalid_row("preferences");
    Ok(Preferences {
        user_id: row.get(0).map_err(bad)?,
        income: section(row, 1)?,
        expenses: section(row, 2)?,
        goals: section(row, 3)?,
        habits: section(row, 4)?,
        created_at: row.get(5).map_err(bad)?,
        updated_at: row.get(6).map_err(bad)?,
    })
}

pub async fn insert(conn: &Connection, prefs: &Preferences) -> AppResult<()> {
    conn.execute(
        "INSERT INTO preferences (user_id, income, expenses, goals, habits, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        libsql::params![
            prefs.user_id.as_str(),
            encode(&prefs.income)?,
            encode(&prefs.expenses)?,
            encode(&prefs.goals)?,
            encode(&prefs.habits)?,
            prefs.created_at.as_str(),
            prefs.updated_at.as_str(),
        ],
    )
    .await
    .map_err(|_| db_error_with_context("preferences creation failed"))?;
    Ok(())
}

pub async fn get_by_user_id(conn: &Connection, user_id: &str) -> AppResult<Option<Preferences>> {
    let rows = conn
        .query(
            "SELECT user_id, income, expenses, goals, habits, created_at, updated_at FROM preferences WHERE user_id = ?",
            [user_id],
        )
        .await
        .map_err(|_| db_error_with_context("failed to query preferences"))?;
    first_row(rows, extract_preferences_from_row).await
}

pub async fn update(conn: &Connection, prefs: &Preferences) -> AppResult<u64> {
    conn.execute(
        "UPDATE preferences SET income = ?, expenses = ?, goals = ?, habits = ?, updated_at = ? WHERE user_id = ?",
        libsql::params![
            encode(&prefs.income)?,
            encode(&prefs.expenses)?,
            encode(&prefs.goals)?,
            encode(&prefs.habits)?,
            prefs.updated_at.as_str(),
            prefs.user_id.as_str(),
        ],
    )
    .await
    .map_err(|_| db_error_with_context("failed to update preferences"))
}

pub async fn delete(conn: &Connection, user_id: &str) -> AppResult<u64> {
    conn.execute("DELETE FROM preferences WHERE user_id = ?", [user_id])
        .await
        .map_err(|_| db_error_with_context("failed to delete preferences"))
}

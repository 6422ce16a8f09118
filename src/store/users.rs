use libsql::{Connection, Row};

use super::{first_row, invalid_row};
use crate::error::AppResult;
use crate::models::User;
use crate::utils::db_error_with_context;

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

pub fn extract_user_from_row(row: &Row) -> AppResult<User> {
    let bad = |_: libsql::Error| invalid_row("user");
    Ok(User {
        id: row.get(0).map_err(bad)?,
        name: row.get(1).map_err(bad)?,
        email: row.get(2).map_err(bad)?,
        password_hash: row.get(3).map_err(bad)?,
        created_at: row.get(4).map_err(bad)?,
        updated_at: row.get(5).map_err(bad)?,
    })
}

pub async fn insert(conn: &Connection, user: &User) -> AppResult<()> {
    conn.execute(
        &format!("INSERT INTO users ({}) VALUES (?, ?, ?, ?, ?, ?)", USER_COLUMNS),
        (
            user.id.as_str(),
            user.name.as_str(),
            user.email.as_str(),
            user.password_hash.as_str(),
            user.created_at.as_str(),
            user.updated_at.as_str(),
        ),
    )
    .await
    .map_err(|_| db_error_with_context("user creation failed"))?;
    Ok(())
}

pub async fn get_by_id(conn: &Connection, user_id: &str) -> AppResult<Option<User>> {
    let rows = conn
        .query(
            &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
            [user_id],
        )
        .await
        .map_err(|_| db_error_with_context("failed to query user"))?;
    first_row(rows, extract_user_from_row).await
}

/// Emails are stored lower-cased, so lookups compare exactly.
pub async fn get_by_email(conn: &Connection, email: &str) -> AppResult<Option<User>> {
    let rows = conn
        .query(
            &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
            [email],
        )
        .await
        .map_err(|_| db_error_with_context("failed to query user"))?;
    first_row(rows, extract_user_from_row).await
}

pub async fn update(conn: &Connection, user: &User) -> AppResult<u64> {
    conn.execute(
        "UPDATE users SET name = ?, email = ?, password_hash = ?, updated_at = ? WHERE id = ?",
        (
            user.name.as_str(),
            user.email.as_str(),
            user.password_hash.as_str(),
            user.updated_at.as_str(),
            user.id.as_str(),
        ),
    )
    .await
    .map_err(|_| db_error_with_context("failed to update user"))
}

/// Owned rows go with the user through `ON DELETE CASCADE`.
pub async fn delete(conn: &Connection, user_id: &str) -> AppResult<u64> {
    conn.execute("DELETE FROM users WHERE id = ?", [user_id])
        .await
        .map_err(|_| db_error_with_context("failed to delete user"))
}

use libsql::{Connection, Row};

use super::{collect_rows, count_rows, enum_column, first_row, invalid_row};
use crate::error::AppResult;
use crate::models::Account;
use crate::utils::db_error_with_context;

const ACCOUNT_COLUMNS: &str = "id, user_id, name, type, balance, currency, icon, color, account_number, created_at, updated_at";

pub fn extract_account_from_row(row: &Row) -> AppResult<Account> {
    let bad = |_: libsql::Error| invalid_row("account");
    Ok(Account {
        id: row.get(0).map_err(bad)?,
        user_id: row.get(1).map_err(bad)?,
        name: row.get(2).map_err(bad)?,
        account_type: enum_column(row, 3, "account")?,
        balance: row.get(4).map_err(bad)?,
        currency: row.get(5).map_err(bad)?,
        icon: row.get(6).map_err(bad)?,
        color: row.get(7).map_err(bad)?,
        account_number: row.get(8).map_err(bad)?,
        created_at: row.get(9).map_err(bad)?,
        updated_at: row.get(10).map_err(bad)?,
    })
}

pub async fn insert(conn: &Connection, account: &Account) -> AppResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO accounts ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            ACCOUNT_COLUMNS
        ),
        libsql::params![
            account.id.as_str(),
            account.user_id.as_str(),
            account.name.as_str(),
            account.account_type.as_str(),
            account.balance,
            account.currency.as_str(),
            account.icon.as_str(),
            account.color.as_str(),
            account.account_number.clone(),
            account.created_at.as_str(),
            account.updated_at.as_str(),
        ],
    )
    .await
    .map_err(|_| db_error_with_context("account creation failed"))?;
    Ok(())
}

pub async fn get_by_id(conn: &Connection, account_id: &str) -> AppResult<Option<Account>> {
    let rows = conn
        .query(
            &format!("SELECT {} FROM accounts WHERE id = ?", ACCOUNT_COLUMNS),
            [account_id],
        )
        .await
        .map_err(|_| db_error_with_context("failed to query account"))?;
    first_row(rows, extract_account_from_row).await
}

pub async fn get_by_user_id(conn: &Connection, user_id: &str) -> AppResult<Vec<Account>> {
    list(conn, user_id, u32::MAX, 0).await
}

pub async fn list(
    conn: &Connection,
    user_id: &str,
    limit: u32,
    offset: u32,
) -> AppResult<Vec<Account>> {
    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM accounts WHERE user_id = ? ORDER BY created_at, rowid LIMIT ? OFFSET ?",
                ACCOUNT_COLUMNS
            ),
            (user_id, limit, offset),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query accounts"))?;
    collect_rows(rows, extract_account_from_row).await
}

pub async fn count_by_user_id(conn: &Connection, user_id: &str) -> AppResult<u32> {
    let rows = conn
        .query("SELECT COUNT(*) FROM accounts WHERE user_id = ?", [user_id])
        .await
        .map_err(|_| db_error_with_context("failed to count accounts"))?;
    count_rows(rows).await
}

pub async fn update(conn: &Connection, account: &Account) -> AppResult<u64> {
    conn.execute(
        "UPDATE accounts SET name = ?, type = ?, balance = ?, currency = ?, icon = ?, color = ?, account_number = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        libsql::params![
            account.name.as_str(),
            account.account_type.as_str(),
            account.balance,
            account.currency.as_str(),
            account.icon.as_str(),
            account.color.as_str(),
            account.account_number.clone(),
            account.updated_at.as_str(),
            account.id.as_str(),
            account.user_id.as_str(),
        ],
    )
    .await
    .map_err(|_| db_error_with_context("failed to update account"))
}

pub async fn delete(conn: &Connection, user_id: &str, account_id: &str) -> AppResult<u64> {
    conn.execute(
        "DELETE FROM accounts WHERE id = ? AND user_id = ?",
        (account_id, user_id),
    )
    .await
    .map_err(|_| db_error_with_context("failed to delete account"))
}

/// Adds `delta` to the stored balance in place.
pub async fn adjust_balance(
    conn: &Connection,
    user_id: &str,
    account_id: &str,
    delta: f64,
    updated_at: &str,
) -> AppResult<u64> {
    conn.execute(
        "UPDATE accounts SET balance = ROUND(balance + ?, 2), updated_at = ? WHERE id = ? AND user_id = ?",
        libsql::params![delta, updated_at, account_id, user_id],
    )
    .await
    .map_err(|_| db_error_with_context("failed to adjust account balance"))
}

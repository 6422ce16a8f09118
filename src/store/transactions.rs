use libsql::{Connection, Row, Value};

use super::{collect_rows, count_rows, enum_column, first_row, invalid_row};
use crate::error::AppResult;
use crate::models::{Transaction, TransactionType};
use crate::utils::db_error_with_context;

const TRANSACTION_COLUMNS: &str = "id, user_id, account_id, category_id, type, saving_goal_id, amount, description, date, recurring, created_at, updated_at";

/// Optional narrowing applied on top of the owning user.
#[derive(Debug, Default, Clone)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub account_id: Option<String>,
    pub category_id: Option<String>,
    /// Inclusive `YYYY-MM-DD` bounds.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl TransactionFilter {
    fn where_clause(&self, user_id: &str) -> (String, Vec<Value>) {
        let mut clause = String::from("user_id = ?");
        let mut params = vec![Value::Text(user_id.to_string())];

        if let Some(kind) = self.transaction_type {
            clause.push_str(" AND type = ?");
            params.push(Value::Text(kind.as_str().to_string()));
        }
        if let Some(ref account_id) = self.account_id {
            clause.push_str(" AND account_id = ?");
            params.push(Value::Text(account_id.clone()));
        }
        if let Some(ref category_id) = self.category_id {
            clause.push_str(" AND category_id = ?");
            params.push(Value::Text(category_id.clone()));
        }
        if let Some(ref start) = self.start_date {
            clause.push_str(" AND date >= ?");
            params.push(Value::Text(start.clone()));
        }
        if let Some(ref end) = self.end_date {
            clause.push_str(" AND date <= ?");
            params.push(Value::Text(end.clone()));
        }

        (clause, params)
    }
}

pub fn extract_transaction_from_row(row: &Row) -> AppResult<Transaction> {
    let bad = |_: libsql::Error| invalid_row("transaction");
    Ok(Transaction {
        id: row.get(0).map_err(bad)?,
        user_id: row.get(1).map_err(bad)?,
        account_id: row.get(2).map_err(bad)?,
        category_id: row.get(3).map_err(bad)?,
        transaction_type: enum_column(row, 4, "transaction")?,
        saving_goal_id: row.get(5).map_err(bad)?,
        amount: row.get(6).map_err(bad)?,
        description: row.get(7).map_err(bad)?,
        date: row.get(8).map_err(bad)?,
        recurring: row.get(9).map_err(bad)?,
        created_at: row.get(10).map_err(bad)?,
        updated_at: row.get(11).map_err(bad)?,
    })
}

pub async fn insert(conn: &Connection, transaction: &Transaction) -> AppResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO transactions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            TRANSACTION_COLUMNS
        ),
        libsql::params![
            transaction.id.as_str(),
            transaction.user_id.as_str(),
            transaction.account_id.as_str(),
            transaction.category_id.clone(),
            transaction.transaction_type.as_str(),
            transaction.saving_goal_id.clone(),
            transaction.amount,
            transaction.description.as_str(),
            transaction.date.as_str(),
            transaction.recurring,
            transaction.created_at.as_str(),
            transaction.updated_at.as_str(),
        ],
    )
    .await
    .map_err(|_| db_error_with_context("transaction creation failed"))?;
    Ok(())
}

pub async fn get_by_id(conn: &Connection, transaction_id: &str) -> AppResult<Option<Transaction>> {
    let rows = conn
        .query(
            &format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS),
            [transaction_id],
        )
        .await
        .map_err(|_| db_error_with_context("failed to query transaction"))?;
    first_row(rows, extract_transaction_from_row).await
}

pub async fn list(
    conn: &Connection,
    user_id: &str,
    filter: &TransactionFilter,
    limit: u32,
    offset: u32,
) -> AppResult<Vec<Transaction>> {
    let (clause, mut params) = filter.where_clause(user_id);
    params.push(Value::Integer(i64::from(limit)));
    params.push(Value::Integer(i64::from(offset)));

    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM transactions WHERE {} ORDER BY date DESC, created_at DESC, rowid DESC LIMIT ? OFFSET ?",
                TRANSACTION_COLUMNS, clause
            ),
            params,
        )
        .await
        .map_err(|_| db_error_with_context("failed to query transactions"))?;
    collect_rows(rows, extract_transaction_from_row).await
}

pub async fn count(conn: &Connection, user_id: &str, filter: &TransactionFilter) -> AppResult<u32> {
    let (clause, params) = filter.where_clause(user_id);
    let rows = conn
        .query(
            &format!("SELECT COUNT(*) FROM transactions WHERE {}", clause),
            params,
        )
        .await
        .map_err(|_| db_error_with_context("failed to count transactions"))?;
    count_rows(rows).await
}

pub async fn get_by_user_id(conn: &Connection, user_id: &str) -> AppResult<Vec<Transaction>> {
    list(conn, user_id, &TransactionFilter::default(), u32::MAX, 0).await
}

pub async fn get_by_account_id(
    conn: &Connection,
    user_id: &str,
    account_id: &str,
) -> AppResult<Vec<Transaction>> {
    let filter = TransactionFilter {
        account_id: Some(account_id.to_string()),
        ..Default::default()
    };
    list(conn, user_id, &filter, u32::MAX, 0).await
}

pub async fn get_by_saving_goal_id(
    conn: &Connection,
    user_id: &str,
    saving_goal_id: &str,
) -> AppResult<Vec<Transaction>> {
    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM transactions WHERE user_id = ? AND saving_goal_id = ? ORDER BY date DESC, rowid DESC",
                TRANSACTION_COLUMNS
            ),
            (user_id, saving_goal_id),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query goal transactions"))?;
    collect_rows(rows, extract_transaction_from_row).await
}

/// Transactions dated within `[start, end]` (inclusive `YYYY-MM-DD`).
pub async fn get_by_date_range(
    conn: &Connection,
    user_id: &str,
    start: &str,
    end: &str,
) -> AppResult<Vec<Transaction>> {
    let filter = TransactionFilter {
        start_date: Some(start.to_string()),
        end_date: Some(end.to_string()),
        ..Default::default()
    };
    list(conn, user_id, &filter, u32::MAX, 0).await
}

pub async fn count_by_category(
    conn: &Connection,
    user_id: &str,
    category_id: &str,
) -> AppResult<u32> {
    let rows = conn
        .query(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ? AND category_id = ?",
            (user_id, category_id),
        )
        .await
        .map_err(|_| db_error_with_context("failed to check category usage"))?;
    count_rows(rows).await
}

pub async fn update(conn: &Connection, transaction: &Transaction) -> AppResult<u64> {
    conn.execute(
        "UPDATE transactions SET account_id = ?, category_id = ?, type = ?, saving_goal_id = ?, amount = ?, description = ?, date = ?, recurring = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        libsql::params![
            transaction.account_id.as_str(),
            transaction.category_id.clone(),
            transaction.transaction_type.as_str(),
            transaction.saving_goal_id.clone(),
            transaction.amount,
            transaction.description.as_str(),
            transaction.date.as_str(),
            transaction.recurring,
            transaction.updated_at.as_str(),
            transaction.id.as_str(),
            transaction.user_id.as_str(),
        ],
    )
    .await
    .map_err(|_| db_error_with_context("failed to update transaction"))
}

pub async fn delete(conn: &Connection, user_id: &str, transaction_id: &str) -> AppResult<u64> {
    conn.execute(
        "DELETE FROM transactions WHERE id = ? AND user_id = ?",
        (transaction_id, user_id),
    )
    .await
    .map_err(|_| db_error_with_context("failed to delete transaction"))
}

//! Persistence functions for each entity.
//!
//! Every function borrows a `libsql::Connection` rather than the shared
//! handle, so callers decide which lock to hold and can compose several
//! calls inside `with_transaction`.

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod preferences;
pub mod saving_goals;
pub mod tasks;
pub mod transactions;
pub mod users;

use libsql::{Row, Rows};

use crate::error::AppResult;
use crate::utils::{db_error, db_error_with_context};

pub(crate) async fn collect_rows<T>(
    mut rows: Rows,
    extract: fn(&Row) -> AppResult<T>,
) -> AppResult<Vec<T>> {
    let mut items = Vec::new();
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        items.push(extract(&row)?);
    }
    Ok(items)
}

pub(crate) async fn first_row<T>(
    mut rows: Rows,
    extract: fn(&Row) -> AppResult<T>,
) -> AppResult<Option<T>> {
    match rows.next().await.map_err(|_| db_error())? {
        Some(row) => Ok(Some(extract(&row)?)),
        None => Ok(None),
    }
}

pub(crate) async fn count_rows(mut rows: Rows) -> AppResult<u32> {
    match rows.next().await.map_err(|_| db_error())? {
        Some(row) => row
            .get::<u32>(0)
            .map_err(|_| db_error_with_context("invalid count")),
        None => Ok(0),
    }
}

pub(crate) fn invalid_row(entity: &str) -> crate::error::AppError {
    db_error_with_context(&format!("invalid {} data", entity))
}

/// Parses a stored enum column.
pub(crate) fn enum_column<T>(row: &Row, index: i32, entity: &str) -> AppResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(index).map_err(|_| invalid_row(entity))?;
    raw.parse().map_err(|_| invalid_row(entity))
}

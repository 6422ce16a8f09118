use libsql::{Connection, Row, Value};

use super::{collect_rows, count_rows, enum_column, first_row, invalid_row};
use crate::error::AppResult;
use crate::models::{Category, CategoryType};
use crate::utils::db_error_with_context;

const CATEGORY_COLUMNS: &str = "id, user_id, name, type, parent_id, icon, color, created_at";

pub fn extract_category_from_row(row: &Row) -> AppResult<Category> {
    let bad = |_: libsql::Error| invalid_row("category");
    Ok(Category {
        id: row.get(0).map_err(bad)?,
        user_id: row.get(1).map_err(bad)?,
        name: row.get(2).map_err(bad)?,
        category_type: enum_column(row, 3, "category")?,
        parent_id: row.get(4).map_err(bad)?,
        icon: row.get(5).map_err(bad)?,
        color: row.get(6).map_err(bad)?,
        created_at: row.get(7).map_err(bad)?,
    })
}

fn list_clause(
    user_id: &str,
    category_type: Option<CategoryType>,
    search: Option<&str>,
) -> (String, Vec<Value>) {
    let mut clause = String::from("user_id = ? AND deleted_at IS NULL");
    let mut params = vec![Value::Text(user_id.to_string())];
    if let Some(kind) = category_type {
        clause.push_str(" AND type = ?");
        params.push(Value::Text(kind.as_str().to_string()));
    }
    if let Some(term) = search {
        clause.push_str(" AND LOWER(name) LIKE LOWER(?)");
        params.push(Value::Text(format!("%{}%", term)));
    }
    (clause, params)
}

pub async fn insert(conn: &Connection, category: &Category) -> AppResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO categories ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            CATEGORY_COLUMNS
        ),
        libsql::params![
            category.id.as_str(),
            category.user_id.as_str(),
            category.name.as_str(),
            category.category_type.as_str(),
            category.parent_id.clone(),
            category.icon.as_str(),
            category.color.as_str(),
            category.created_at.as_str(),
        ],
    )
    .await
    .map_err(|_| db_error_with_context("category creation failed"))?;
    Ok(())
}

/// Soft-deleted categories are treated as absent.
pub async fn get_by_id(conn: &Connection, category_id: &str) -> AppResult<Option<Category>> {
    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM categories WHERE id = ? AND deleted_at IS NULL",
                CATEGORY_COLUMNS
            ),
            [category_id],
        )
        .await
        .map_err(|_| db_error_with_context("failed to query category"))?;
    first_row(rows, extract_category_from_row).await
}

pub async fn list(
    conn: &Connection,
    user_id: &str,
    category_type: Option<CategoryType>,
    search: Option<&str>,
    limit: u32,
    offset: u32,
) -> AppResult<Vec<Category>> {
    let (clause, mut params) = list_clause(user_id, category_type, search);
    params.push(Value::Integer(i64::from(limit)));
    params.push(Value::Integer(i64::from(offset)));
    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM categories WHERE {} ORDER BY type, name LIMIT ? OFFSET ?",
                CATEGORY_COLUMNS, clause
            ),
            params,
        )
        .await
        .map_err(|_| db_error_with_context("failed to query categories"))?;
    collect_rows(rows, extract_category_from_row).await
}

pub async fn count(
    conn: &Connection,
    user_id: &str,
    category_type: Option<CategoryType>,
    search: Option<&str>,
) -> AppResult<u32> {
    let (clause, params) = list_clause(user_id, category_type, search);
    let rows = conn
        .query(&format!("SELECT COUNT(*) FROM categories WHERE {}", clause), params)
        .await
        .map_err(|_| db_error_with_context("failed to count categories"))?;
    count_rows(rows).await
}

/// Case-insensitive name lookup among the user's live categories of one type,
/// ignoring `exclude_id` (the category being renamed).
pub async fn name_taken(
    conn: &Connection,
    user_id: &str,
    category_type: CategoryType,
    name: &str,
    exclude_id: Option<&str>,
) -> AppResult<bool> {
    let rows = conn
        .query(
            "SELECT COUNT(*) FROM categories WHERE user_id = ? AND type = ? AND LOWER(name) = LOWER(?) AND deleted_at IS NULL AND id != ?",
            (user_id, category_type.as_str(), name, exclude_id.unwrap_or("")),
        )
        .await
        .map_err(|_| db_error_with_context("failed to check existing category"))?;
    Ok(count_rows(rows).await? > 0)
}

pub async fn update(conn: &Connection, category: &Category) -> AppResult<u64> {
    conn.execute(
        "UPDATE categories SET name = ?, parent_id = ?, icon = ?, color = ? WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
        libsql::params![
            category.name.as_str(),
            category.parent_id.clone(),
            category.icon.as_str(),
            category.color.as_str(),
            category.id.as_str(),
            category.user_id.as_str(),
        ],
    )
    .await
    .map_err(|_| db_error_with_context("failed to update category"))
}

pub async fn soft_delete(
    conn: &Connection,
    user_id: &str,
    category_id: &str,
    deleted_at: &str,
) -> AppResult<u64> {
    conn.execute(
        "UPDATE categories SET deleted_at = ? WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
        (deleted_at, category_id, user_id),
    )
    .await
    .map_err(|_| db_error_with_context("failed to delete category"))
}

pub async fn count_children(conn: &Connection, user_id: &str, category_id: &str) -> AppResult<u32> {
    let rows = conn
        .query(
            "SELECT COUNT(*) FROM categories WHERE user_id = ? AND parent_id = ? AND deleted_at IS NULL",
            (user_id, category_id),
        )
        .await
        .map_err(|_| db_error_with_context("failed to count subcategories"))?;
    count_rows(rows).await
}

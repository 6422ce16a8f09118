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
    Category, CategoryType, CreateCategoryPayload, GetCategoriesQuery, GetCategoriesResponse,
    UpdateCategoryPayload,
};
use crate::store;
use crate::utils::{
    ensure_owned, now_rfc3339, parse_enum, validate_list_limit, validate_max_length,
    validate_offset, validate_string_length,
};
use crate::{AppState, with_transaction};

pub fn validate_category_name(name: &str) -> AppResult<()> {
    validate_string_length(name, "Category name", MAX_CATEGORY_NAME_LENGTH)
}

fn validate_decorations(icon: &str, color: &str) -> AppResult<()> {
    validate_max_length(icon, "Icon", MAX_ICON_LENGTH)?;
    validate_max_length(color, "Color", MAX_COLOR_LENGTH)
}

async fn load_owned_category(
    conn: &Connection,
    user_id: &str,
    category_id: &str,
) -> AppResult<Category> {
    let category = store::categories::get_by_id(conn, category_id).await?;
    ensure_owned(category, |c| c.user_id.as_str(), user_id, "Category")
}

/// A parent must be a top-level category of the same type.
async fn validate_parent(
    conn: &Connection,
    user_id: &str,
    parent_id: &str,
    category_type: CategoryType,
    child_id: Option<&str>,
) -> AppResult<()> {
    if Some(parent_id) == child_id {
        return Err(AppError::validation("A category cannot be its own parent"));
    }
    let parent = load_owned_category(conn, user_id, parent_id).await?;
    if parent.category_type != category_type {
        return Err(AppError::validation(
            "Parent category must have the same type",
        ));
    }
    if parent.parent_id.is_some() {
        return Err(AppError::validation(
            "Categories can only be nested one level deep",
        ));
    }
    Ok(())
}

fn name_conflict() -> AppError {
    AppError::Conflict("Category name already exists (case-insensitive)".to_string())
}

pub async fn create_category(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    validate_category_name(&payload.name)?;
    validate_decorations(&payload.icon, &payload.color)?;
    let category_type: CategoryType = parse_enum(&payload.category_type, "category type")?;

    let category = Category {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        name: payload.name.trim().to_string(),
        category_type,
        parent_id: payload
            .parent_id
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
        icon: payload.icon.trim().to_string(),
        color: payload.color.trim().to_string(),
        created_at: now_rfc3339(),
    };

    let created = category.clone();
    with_transaction(&app_state.db, |conn| {
        Box::pin(async move {
            if store::categories::name_taken(
                conn,
                &created.user_id,
                created.category_type,
                &created.name,
                None,
            )
            .await?
            {
                return Err(name_conflict());
            }
            if let Some(ref parent_id) = created.parent_id {
                validate_parent(conn, &created.user_id, parent_id, created.category_type, None)
                    .await?;
            }
            store::categories::insert(conn, &created).await
        })
    })
    .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get_categories(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<GetCategoriesQuery>,
) -> Result<(StatusCode, Json<GetCategoriesResponse>), AppError> {
    let limit = validate_list_limit(query.limit)?;
    let offset = validate_offset(query.offset)?;

    let category_type: Option<CategoryType> = query
        .category_type
        .as_deref()
        .map(|t| parse_enum(t, "category type"))
        .transpose()?;
    let search_term = query
        .search
        .as_ref()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());
    if let Some(search) = search_term {
        validate_string_length(search, "Search term", MAX_SEARCH_TERM_LENGTH)?;
    }

    let conn = app_state.db.read().await;
    let total_count =
        store::categories::count(&conn, &user.id, category_type, search_term).await?;
    let categories = store::categories::list(
        &conn,
        &user.id,
        category_type,
        search_term,
        limit,
        offset,
    )
    .await?;

    Ok((
        StatusCode::OK,
        Json(GetCategoriesResponse {
            categories,
            total_count,
            limit,
            offset,
        }),
    ))
}

pub async fn get_category(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(category_id): Path<String>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let conn = app_state.db.read().await;
    let category = load_owned_category(&conn, &user.id, &category_id).await?;
    Ok((StatusCode::OK, Json(category)))
}

pub async fn update_category(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(category_id): Path<String>,
    Json(payload): Json<UpdateCategoryPayload>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    if payload.name.is_none()
        && payload.parent_id.is_none()
        && payload.icon.is_none()
        && payload.color.is_none()
    {
        return Err(AppError::validation(ERR_EMPTY_UPDATE));
    }

    let conn = app_state.db.write().await;
    let mut category = load_owned_category(&conn, &user.id, &category_id).await?;

    if let Some(name) = payload.name {
        validate_category_name(&name)?;
        let name = name.trim().to_string();
        if store::categories::name_taken(
            &conn,
            &user.id,
            category.category_type,
            &name,
            Some(&category.id),
        )
        .await?
        {
            return Err(name_conflict());
        }
        category.name = name;
    }
    if let Some(parent_id) = payload.parent_id {
        let parent_id = parent_id.trim().to_string();
        if parent_id.is_empty() {
            category.parent_id = None;
        } else {
            if store::categories::count_children(&conn, &user.id, &category.id).await? > 0 {
                return Err(AppError::validation(
                    "A category with subcategories cannot be nested",
                ));
            }
            validate_parent(
                &conn,
                &user.id,
                &parent_id,
                category.category_type,
                Some(&category.id),
            )
            .await?;
            category.parent_id = Some(parent_id);
        }
    }
    if let Some(icon) = payload.icon {
        category.icon = icon.trim().to_string();
    }
    if let Some(color) = payload.color {
        category.color = color.trim().to_string();
    }
    validate_decorations(&category.icon, &category.color)?;

    if store::categories::update(&conn, &category).await? == 0 {
        return Err(AppError::not_found("Category"));
    }

    Ok((StatusCode::OK, Json(category)))
}

/// Soft-deletes a category that no transaction, budget or subcategory still
/// uses. Tasks pointing at it lose their category.
pub async fn delete_category(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(category_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let user_id = user.id.clone();
    with_transaction(&app_state.db, |conn| {
        Box::pin(async move {
            load_owned_category(conn, &user_id, &category_id).await?;

            if store::transactions::count_by_category(conn, &user_id, &category_id).await? > 0 {
                return Err(AppError::Conflict(
                    "Cannot delete category: it has associated transactions".to_string(),
                ));
            }
            if store::budgets::count_by_category(conn, &user_id, &category_id).await? > 0 {
                return Err(AppError::Conflict(
                    "Cannot delete category: it has associated budgets".to_string(),
                ));
            }
            if store::categories::count_children(conn, &user_id, &category_id).await? > 0 {
                return Err(AppError::Conflict(
                    "Cannot delete category: it has subcategories".to_string(),
                ));
            }

            store::tasks::detach_category(conn, &user_id, &category_id).await?;
            if store::categories::soft_delete(conn, &user_id, &category_id, &now_rfc3339()).await?
                == 0
            {
                return Err(AppError::not_found("Category"));
            }
            Ok(())
        })
    })
    .await?;

    tracing::info!(user_id = %user.id, "category deleted");
    Ok(StatusCode::NO_CONTENT)
}

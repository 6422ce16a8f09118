use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use libsql::Connection;
use uuid::Uuid;

use crate::accounts::load_owned_account;
use crate::auth::AuthUser;
use crate::constants::*;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateTransactionPayload, GetTransactionsQuery, GetTransactionsResponse, Transaction,
    TransactionStats, TransactionType, UpdateTransactionPayload,
};
use crate::reconcile::{apply_balance_effects, load_balance_effects};
use crate::store::{self, transactions::TransactionFilter};
use crate::utils::{
    ensure_owned, now_rfc3339, parse_enum, round_amount, validate_date, validate_list_limit,
    validate_offset, validate_positive_amount, validate_string_length,
};
use crate::{AppState, Db, with_transaction};

const TRANSFER: &str = "transfer";

pub fn validate_description(description: &str) -> AppResult<()> {
    validate_string_length(description, "Description", MAX_DESCRIPTION_LENGTH)
}

/// Empty strings in optional id fields mean "no reference".
fn non_empty(id: Option<String>) -> Option<String> {
    id.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

async fn ensure_category(conn: &Connection, user_id: &str, category_id: &str) -> AppResult<()> {
    let category = store::categories::get_by_id(conn, category_id).await?;
    ensure_owned(category, |c| c.user_id.as_str(), user_id, "Category").map(|_| ())
}

/// Returns the account the goal is linked to, if any.
async fn ensure_saving_goal(
    conn: &Connection,
    user_id: &str,
    goal_id: &str,
) -> AppResult<Option<String>> {
    let goal = store::saving_goals::get_by_id(conn, goal_id).await?;
    ensure_owned(goal, |g| g.user_id.as_str(), user_id, "Saving goal").map(|g| g.account_id)
}

pub fn transaction_stats(transactions: &[Transaction]) -> TransactionStats {
    let mut total_income = 0.0;
    let mut total_expense = 0.0;
    for transaction in transactions {
        match transaction.transaction_type {
            TransactionType::Income => total_income += transaction.amount,
            TransactionType::Expense => total_expense += transaction.amount,
            TransactionType::Saving => {}
        }
    }
    TransactionStats {
        total_income: round_amount(total_income),
        total_expense: round_amount(total_expense),
        net_amount: round_amount(total_income - total_expense),
        count: transactions.len() as u32,
    }
}

pub async fn create_transaction_for_user(
    db: &Db,
    user_id: &str,
    payload: CreateTransactionPayload,
) -> AppResult<Transaction> {
    validate_description(&payload.description)?;
    validate_date(&payload.date)?;
    let amount = validate_positive_amount(payload.amount, "Amount")?;

    let is_transfer = payload.transaction_type.trim().eq_ignore_ascii_case(TRANSFER);
    let transaction_type: TransactionType = if is_transfer {
        TransactionType::Expense
    } else {
        parse_enum(&payload.transaction_type, "transaction type")?
    };

    let to_account_id = non_empty(payload.to_account_id);
    let category_id = non_empty(payload.category_id);
    let saving_goal_id = non_empty(payload.saving_goal_id);

    if is_transfer {
        match to_account_id.as_deref() {
            None => return Err(AppError::validation("Transfers require to_account_id")),
            Some(to) if to == payload.account_id => {
                return Err(AppError::validation("Cannot transfer to the same account"));
            }
            Some(_) => {}
        }
        if saving_goal_id.is_some() {
            return Err(AppError::validation("Transfers cannot be linked to a saving goal"));
        }
    }

    let now = now_rfc3339();
    let transaction = Transaction {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        account_id: payload.account_id.trim().to_string(),
        category_id: if is_transfer { None } else { category_id },
        transaction_type,
        saving_goal_id,
        amount,
        description: payload.description.trim().to_string(),
        date: payload.date.trim().to_string(),
        recurring: payload.recurring && !is_transfer,
        created_at: now.clone(),
        updated_at: now,
    };

    let counterpart = to_account_id.map(|to| Transaction {
        id: Uuid::new_v4().to_string(),
        account_id: to,
        transaction_type: TransactionType::Income,
        ..transaction.clone()
    });

    let user_id = user_id.to_string();
    let created = transaction.clone();
    with_transaction(db, |conn| {
        Box::pin(async move {
            load_owned_account(conn, &user_id, &created.account_id).await?;
            if let Some(ref category_id) = created.category_id {
                ensure_category(conn, &user_id, category_id).await?;
            }
            if let Some(ref goal_id) = created.saving_goal_id {
                ensure_saving_goal(conn, &user_id, goal_id).await?;
            }

            store::transactions::insert(conn, &created).await?;
            let mut effects = load_balance_effects(conn, &created).await?;

            if let Some(ref income) = counterpart {
                load_owned_account(conn, &user_id, &income.account_id).await?;
                store::transactions::insert(conn, income).await?;
                effects.extend(load_balance_effects(conn, income).await?);
            }

            apply_balance_effects(conn, &user_id, &effects, 1.0).await
        })
    })
    .await?;

    tracing::info!(
        user_id = %transaction.user_id,
        transaction_id = %transaction.id,
        kind = if is_transfer { TRANSFER } else { transaction.transaction_type.as_str() },
        amount = transaction.amount,
        "transaction created"
    );

    Ok(transaction)
}

pub async fn update_transaction_for_user(
    db: &Db,
    user_id: &str,
    transaction_id: &str,
    payload: UpdateTransactionPayload,
) -> AppResult<Transaction> {
    if payload.account_id.is_none()
        && payload.category_id.is_none()
        && payload.transaction_type.is_none()
        && payload.saving_goal_id.is_none()
        && payload.amount.is_none()
        && payload.description.is_none()
        && payload.date.is_none()
        && payload.recurring.is_none()
    {
        return Err(AppError::validation(ERR_EMPTY_UPDATE));
    }

    if let Some(ref description) = payload.description {
        validate_description(description)?;
    }
    if let Some(ref date) = payload.date {
        validate_date(date)?;
    }
    let amount = payload
        .amount
        .map(|a| validate_positive_amount(a, "Amount"))
        .transpose()?;
    let transaction_type: Option<TransactionType> = payload
        .transaction_type
        .as_deref()
        .map(|t| parse_enum(t, "transaction type"))
        .transpose()?;

    let user_id = user_id.to_string();
    let transaction_id = transaction_id.to_string();
    with_transaction(db, |conn| {
        Box::pin(async move {
            let existing = store::transactions::get_by_id(conn, &transaction_id).await?;
            let existing =
                ensure_owned(existing, |t| t.user_id.as_str(), &user_id, "Transaction")?;
            let previous = load_balance_effects(conn, &existing).await?;
            let mut updated = existing;

            if let Some(account_id) = non_empty(payload.account_id) {
                load_owned_account(conn, &user_id, &account_id).await?;
                updated.account_id = account_id;
            }
            if let Some(category_id) = payload.category_id {
                updated.category_id = non_empty(Some(category_id));
                if let Some(ref category_id) = updated.category_id {
                    ensure_category(conn, &user_id, category_id).await?;
                }
            }
            if let Some(goal_id) = payload.saving_goal_id {
                updated.saving_goal_id = non_empty(Some(goal_id));
                if let Some(ref goal_id) = updated.saving_goal_id {
                    ensure_saving_goal(conn, &user_id, goal_id).await?;
                }
            }
            if let Some(kind) = transaction_type {
                updated.transaction_type = kind;
            }
            if let Some(amount) = amount {
                updated.amount = amount;
            }
            if let Some(description) = payload.description {
                updated.description = description.trim().to_string();
            }
            if let Some(date) = payload.date {
                updated.date = date.trim().to_string();
            }
            if let Some(recurring) = payload.recurring {
                updated.recurring = recurring;
            }
            updated.updated_at = now_rfc3339();

            if store::transactions::update(conn, &updated).await? == 0 {
                return Err(AppError::not_found("Transaction"));
            }

            apply_balance_effects(conn, &user_id, &previous, -1.0).await?;
            let current = load_balance_effects(conn, &updated).await?;
            apply_balance_effects(conn, &user_id, &current, 1.0).await?;
            Ok(updated)
        })
    })
    .await
}

pub async fn delete_transaction_for_user(
    db: &Db,
    user_id: &str,
    transaction_id: &str,
) -> AppResult<()> {
    let user_id = user_id.to_string();
    let transaction_id = transaction_id.to_string();
    with_transaction(db, |conn| {
        Box::pin(async move {
            let existing = store::transactions::get_by_id(conn, &transaction_id).await?;
            let existing =
                ensure_owned(existing, |t| t.user_id.as_str(), &user_id, "Transaction")?;
            let effects = load_balance_effects(conn, &existing).await?;

            if store::transactions::delete(conn, &user_id, &transaction_id).await? == 0 {
                return Err(AppError::not_found("Transaction"));
            }
            apply_balance_effects(conn, &user_id, &effects, -1.0).await
        })
    })
    .await
}

fn filter_from_query(query: &GetTransactionsQuery) -> AppResult<TransactionFilter> {
    if let Some(ref start) = query.start_date {
        validate_date(start)?;
    }
    if let Some(ref end) = query.end_date {
        validate_date(end)?;
    }
    Ok(TransactionFilter {
        transaction_type: query
            .transaction_type
            .as_deref()
            .map(|t| parse_enum(t, "transaction type"))
            .transpose()?,
        account_id: query.account_id.clone(),
        category_id: query.category_id.clone(),
        start_date: query.start_date.as_ref().map(|d| d.trim().to_string()),
        end_date: query.end_date.as_ref().map(|d| d.trim().to_string()),
    })
}

pub async fn create_transaction(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTransactionPayload>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let transaction = create_transaction_for_user(&app_state.db, &user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn get_transactions(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<GetTransactionsQuery>,
) -> Result<(StatusCode, Json<GetTransactionsResponse>), AppError> {
    let limit = validate_list_limit(query.limit)?;
    let offset = validate_offset(query.offset)?;
    let filter = filter_from_query(&query)?;

    let conn = app_state.db.read().await;
    let total_count = store::transactions::count(&conn, &user.id, &filter).await?;
    let transactions = store::transactions::list(&conn, &user.id, &filter, limit, offset).await?;

    Ok((
        StatusCode::OK,
        Json(GetTransactionsResponse {
            transactions,
            total_count,
        }),
    ))
}

pub async fn get_transaction(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(transaction_id): Path<String>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let conn = app_state.db.read().await;
    let transaction = store::transactions::get_by_id(&conn, &transaction_id).await?;
    let transaction = ensure_owned(transaction, |t| t.user_id.as_str(), &user.id, "Transaction")?;
    Ok((StatusCode::OK, Json(transaction)))
}

pub async fn get_transaction_stats(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<TransactionStats>), AppError> {
    let conn = app_state.db.read().await;
    let transactions = store::transactions::get_by_user_id(&conn, &user.id).await?;
    Ok((StatusCode::OK, Json(transaction_stats(&transactions))))
}

pub async fn update_transaction(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(transaction_id): Path<String>,
    Json(payload): Json<UpdateTransactionPayload>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let transaction =
        update_transaction_for_user(&app_state.db, &user.id, &transaction_id, payload).await?;
    Ok((StatusCode::OK, Json(transaction)))
}

pub async fn delete_transaction(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(transaction_id): Path<String>,
) -> Result<StatusCode, AppError> {
    delete_transaction_for_user(&app_state.db, &user.id, &transaction_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(kind: TransactionType, amount: f64) -> Transaction {
        Transaction {
            id: "t".into(),
            user_id: "u".into(),
            account_id: "a".into(),
            category_id: None,
            transaction_type: kind,
            saving_goal_id: None,
            amount,
            description: "d".into(),
            date: "2024-01-01".into(),
            recurring: false,
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: "2024-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn stats_ignore_savings_in_totals_but_count_them() {
        let stats = transaction_stats(&[
            tx(TransactionType::Income, 1000.0),
            tx(TransactionType::Expense, 250.5),
            tx(TransactionType::Saving, 100.0),
        ]);
        assert_eq!(
            stats,
            TransactionStats {
                total_income: 1000.0,
                total_expense: 250.5,
                net_amount: 749.5,
                count: 3,
            }
        );
    }

    #[test]
    fn query_filters_are_validated() {
        let bad_date = GetTransactionsQuery {
            start_date: Some("2024-13-01".into()),
            ..Default::default()
        };
        assert!(filter_from_query(&bad_date).is_err());

        let bad_type = GetTransactionsQuery {
            transaction_type: Some("gift".into()),
            ..Default::default()
        };
        assert!(filter_from_query(&bad_type).is_err());

        let ok = GetTransactionsQuery {
            transaction_type: Some("Income".into()),
            end_date: Some("2024-01-31".into()),
            ..Default::default()
        };
        let filter = filter_from_query(&ok).unwrap();
        assert_eq!(filter.transaction_type, Some(TransactionType::Income));
        assert_eq!(filter.end_date.as_deref(), Some("2024-01-31"));
    }
}

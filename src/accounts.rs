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
    Account, AccountBalanceResponse, AccountDetailsResponse, AccountType, CreateAccountPayload,
    GetAccountsResponse, ListQuery, UpdateAccountPayload,
};
use crate::reconcile::{apply_balance_effects, load_balance_effects, reconcile};
use crate::store;
use crate::utils::{
    ensure_owned, now_rfc3339, parse_enum, validate_list_limit, validate_max_length,
    validate_non_negative_amount, validate_offset, validate_string_length,
};
use crate::{AppState, Db, with_transaction};

pub fn validate_account_name(name: &str) -> AppResult<()> {
    validate_string_length(name, "Account name", MAX_TITLE_LENGTH)
}

/// Accepts a three-letter code in any case and returns it upper-cased.
pub fn validate_currency(currency: &str) -> AppResult<String> {
    let code = currency.trim();
    if code.len() != CURRENCY_CODE_LENGTH || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::validation("Currency must be a three-letter code"));
    }
    Ok(code.to_ascii_uppercase())
}

fn validate_decorations(icon: &str, color: &str, account_number: Option<&str>) -> AppResult<()> {
    validate_max_length(icon, "Icon", MAX_ICON_LENGTH)?;
    validate_max_length(color, "Color", MAX_COLOR_LENGTH)?;
    if let Some(number) = account_number {
        validate_max_length(number, "Account number", MAX_ACCOUNT_NUMBER_LENGTH)?;
    }
    Ok(())
}

pub async fn load_owned_account(
    conn: &Connection,
    user_id: &str,
    account_id: &str,
) -> AppResult<Account> {
    let account = store::accounts::get_by_id(conn, account_id).await?;
    ensure_owned(account, |a| a.user_id.as_str(), user_id, "Account")
}

pub async fn create_account_for_user(
    db: &Db,
    user_id: &str,
    payload: CreateAccountPayload,
) -> AppResult<Account> {
    validate_account_name(&payload.name)?;
    let account_type: AccountType = parse_enum(&payload.account_type, "account type")?;
    let currency = validate_currency(&payload.currency)?;
    let balance = validate_non_negative_amount(payload.balance, "Balance")?;
    validate_decorations(&payload.icon, &payload.color, payload.account_number.as_deref())?;

    let now = now_rfc3339();
    let account = Account {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        name: payload.name.trim().to_string(),
        account_type,
        balance,
        currency,
        icon: payload.icon.trim().to_string(),
        color: payload.color.trim().to_string(),
        account_number: payload
            .account_number
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        created_at: now.clone(),
        updated_at: now,
    };

    let conn = db.write().await;
    store::accounts::insert(&conn, &account).await?;
    tracing::info!(user_id, account_id = %account.id, "account created");

    Ok(account)
}

pub async fn update_account_for_user(
    db: &Db,
    user_id: &str,
    account_id: &str,
    payload: UpdateAccountPayload,
) -> AppResult<Account> {
    if payload.name.is_none()
        && payload.account_type.is_none()
        && payload.balance.is_none()
        && payload.currency.is_none()
        && payload.icon.is_none()
        && payload.color.is_none()
        && payload.account_number.is_none()
    {
        return Err(AppError::validation(ERR_EMPTY_UPDATE));
    }

    let conn = db.write().await;
    let mut account = load_owned_account(&conn, user_id, account_id).await?;

    if let Some(name) = payload.name {
        validate_account_name(&name)?;
        account.name = name.trim().to_string();
    }
    if let Some(account_type) = payload.account_type {
        account.account_type = parse_enum(&account_type, "account type")?;
    }
    if let Some(balance) = payload.balance {
        account.balance = validate_non_negative_amount(balance, "Balance")?;
    }
    if let Some(currency) = payload.currency {
        account.currency = validate_currency(&currency)?;
    }
    if let Some(icon) = payload.icon {
        account.icon = icon.trim().to_string();
    }
    if let Some(color) = payload.color {
        account.color = color.trim().to_string();
    }
    if let Some(number) = payload.account_number {
        let number = number.trim().to_string();
        account.account_number = (!number.is_empty()).then_some(number);
    }
    validate_decorations(&account.icon, &account.color, account.account_number.as_deref())?;

    account.updated_at = now_rfc3339();
    if store::accounts::update(&conn, &account).await? == 0 {
        return Err(AppError::not_found("Account"));
    }

    Ok(account)
}

pub async fn create_account(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateAccountPayload>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let account = create_account_for_user(&app_state.db, &user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn get_accounts(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<(StatusCode, Json<GetAccountsResponse>), AppError> {
    let limit = validate_list_limit(query.limit)?;
    let offset = validate_offset(query.offset)?;

    let conn = app_state.db.read().await;
    let total_count = store::accounts::count_by_user_id(&conn, &user.id).await?;
    let accounts = store::accounts::list(&conn, &user.id, limit, offset).await?;

    Ok((
        StatusCode::OK,
        Json(GetAccountsResponse {
            accounts,
            total_count,
        }),
    ))
}

pub async fn get_account(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(account_id): Path<String>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let conn = app_state.db.read().await;
    let account = load_owned_account(&conn, &user.id, &account_id).await?;
    Ok((StatusCode::OK, Json(account)))
}

pub async fn update_account(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(account_id): Path<String>,
    Json(payload): Json<UpdateAccountPayload>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let account = update_account_for_user(&app_state.db, &user.id, &account_id, payload).await?;
    Ok((StatusCode::OK, Json(account)))
}

/// Removes the account together with its transactions. Whatever those
/// transactions added to other accounts through saving goals is taken back.
pub async fn delete_account_for_user(db: &Db, user_id: &str, account_id: &str) -> AppResult<()> {
    let user_id = user_id.to_string();
    let account_id = account_id.to_string();
    with_transaction(db, |conn| {
        Box::pin(async move {
            load_owned_account(conn, &user_id, &account_id).await?;

            let transactions =
                store::transactions::get_by_account_id(conn, &user_id, &account_id).await?;
            let mut elsewhere = Vec::new();
            for transaction in &transactions {
                let effects = load_balance_effects(conn, transaction).await?;
                elsewhere.extend(effects.into_iter().filter(|(id, _)| *id != account_id));
            }
            apply_balance_effects(conn, &user_id, &elsewhere, -1.0).await?;

            if store::accounts::delete(conn, &user_id, &account_id).await? == 0 {
                return Err(AppError::not_found("Account"));
            }
            tracing::info!(user_id = %user_id, %account_id, "account deleted");
            Ok(())
        })
    })
    .await
}

pub async fn delete_account(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(account_id): Path<String>,
) -> Result<StatusCode, AppError> {
    delete_account_for_user(&app_state.db, &user.id, &account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_account_balance(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(account_id): Path<String>,
) -> Result<(StatusCode, Json<AccountBalanceResponse>), AppError> {
    let conn = app_state.db.read().await;
    let account = load_owned_account(&conn, &user.id, &account_id).await?;
    Ok((
        StatusCode::OK,
        Json(AccountBalanceResponse {
            account_id: account.id,
            balance: account.balance,
            currency: account.currency,
        }),
    ))
}

pub async fn get_account_details(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(account_id): Path<String>,
) -> Result<(StatusCode, Json<AccountDetailsResponse>), AppError> {
    let conn = app_state.db.read().await;
    let account = load_owned_account(&conn, &user.id, &account_id).await?;
    let transactions =
        store::transactions::get_by_account_id(&conn, &user.id, &account_id).await?;
    Ok((
        StatusCode::OK,
        Json(AccountDetailsResponse {
            account,
            transactions,
        }),
    ))
}

pub async fn reconcile_account(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(account_id): Path<String>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let account = reconcile(&app_state.db, &user.id, &account_id).await?;
    Ok((StatusCode::OK, Json(account)))
}

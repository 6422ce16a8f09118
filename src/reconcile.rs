use libsql::Connection;

use crate::Db;
use crate::error::AppResult;
use crate::models::{Account, Transaction, TransactionType};
use crate::store;
use crate::utils::{ensure_owned, now_rfc3339, round_amount};

/// Signed contribution of a transaction booked directly on an account.
fn signed_amount(transaction: &Transaction) -> f64 {
    match transaction.transaction_type {
        TransactionType::Income => transaction.amount,
        TransactionType::Expense | TransactionType::Saving => -transaction.amount,
    }
}

/// Balance implied by an account's own history plus the transactions of the
/// saving goals linked to it. Goal transactions always count positively.
pub fn compute_balance(
    account_transactions: &[Transaction],
    goal_transactions: &[Transaction],
) -> f64 {
    let own: f64 = account_transactions.iter().map(signed_amount).sum();
    let goals: f64 = goal_transactions.iter().map(|t| t.amount).sum();
    round_amount(own + goals)
}

/// Recomputes and persists the balance of one account.
///
/// An account with no transactions keeps its stored balance. The caller must
/// hold the write lock for the read/sum/write sequence to be serialized with
/// other writers in this process.
pub async fn reconcile_account_balance(
    conn: &Connection,
    user_id: &str,
    account_id: &str,
) -> AppResult<Account> {
    let account = store::accounts::get_by_id(conn, account_id).await?;
    let mut account = ensure_owned(account, |a| a.user_id.as_str(), user_id, "Account")?;

    let transactions = store::transactions::get_by_account_id(conn, user_id, account_id).await?;
    if transactions.is_empty() {
        return Ok(account);
    }

    let goals = store::saving_goals::get_by_account_id(conn, user_id, account_id).await?;
    let mut goal_transactions = Vec::new();
    for goal in &goals {
        goal_transactions
            .extend(store::transactions::get_by_saving_goal_id(conn, user_id, &goal.id).await?);
    }

    let balance = compute_balance(&transactions, &goal_transactions);
    if balance != account.balance {
        tracing::info!(
            user_id,
            account_id,
            previous = account.balance,
            balance,
            "account balance reconciled"
        );
    }

    account.balance = balance;
    account.updated_at = now_rfc3339();
    store::accounts::update(conn, &account).await?;

    Ok(account)
}

pub async fn reconcile(db: &Db, user_id: &str, account_id: &str) -> AppResult<Account> {
    let conn = db.write().await;
    reconcile_account_balance(&conn, user_id, account_id).await
}

/// Stored-balance changes caused by booking `transaction`: its signed amount
/// on its own account, plus its amount on the account of its saving goal.
///
/// Mirrors `compute_balance`, so applying the effects of every transaction to
/// a zero balance yields the reconciled balance.
pub fn balance_effects(
    transaction: &Transaction,
    goal_account_id: Option<&str>,
) -> Vec<(String, f64)> {
    let mut effects = vec![(transaction.account_id.clone(), signed_amount(transaction))];
    if let Some(goal_account_id) = goal_account_id {
        effects.push((goal_account_id.to_string(), transaction.amount));
    }
    effects
}

/// `balance_effects` with the goal account looked up from the store.
pub async fn load_balance_effects(
    conn: &Connection,
    transaction: &Transaction,
) -> AppResult<Vec<(String, f64)>> {
    let goal_account_id = match transaction.saving_goal_id {
        Some(ref goal_id) => store::saving_goals::get_by_id(conn, goal_id)
            .await?
            .and_then(|goal| goal.account_id),
        None => None,
    };
    Ok(balance_effects(transaction, goal_account_id.as_deref()))
}

/// Adds each delta to its account's stored balance. Pass `-1.0` as `sign` to
/// undo effects computed earlier.
pub async fn apply_balance_effects(
    conn: &Connection,
    user_id: &str,
    effects: &[(String, f64)],
    sign: f64,
) -> AppResult<()> {
    let now = now_rfc3339();
    for (account_id, delta) in effects {
        let delta = round_amount(delta * sign);
        if delta == 0.0 {
            continue;
        }
        // Accounts removed since the effect was computed are skipped.
        store::accounts::adjust_balance(conn, user_id, account_id, delta, &now).await?;
    }
    Ok(())
}

/// Moves the contribution of a goal's transactions from the account it was
/// linked to onto the one it is linked to now. Either side may be unlinked.
pub async fn move_goal_contribution(
    conn: &Connection,
    user_id: &str,
    goal_id: &str,
    from: Option<&str>,
    to: Option<&str>,
) -> AppResult<()> {
    if from == to {
        return Ok(());
    }
    let transactions = store::transactions::get_by_saving_goal_id(conn, user_id, goal_id).await?;
    let total = round_amount(transactions.iter().map(|t| t.amount).sum());
    if total == 0.0 {
        return Ok(());
    }

    let mut effects = Vec::new();
    if let Some(from) = from {
        effects.push((from.to_string(), -total));
    }
    if let Some(to) = to {
        effects.push((to.to_string(), total));
    }
    tracing::info!(user_id, goal_id, total, "saving goal contribution moved");
    apply_balance_effects(conn, user_id, &effects, 1.0).await
}

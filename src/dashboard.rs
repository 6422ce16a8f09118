use axum::{Json, extract::State, http::StatusCode};
use libsql::Connection;
use time::OffsetDateTime;

use crate::AppState;
use crate::auth::AuthUser;
use crate::budget_status::{amount_spent_in, budget_status, month_bounds};
use crate::error::{AppError, AppResult};
use crate::models::{
    Account, BudgetStatus, BudgetWithStatus, DashboardSummary, Debt, FinanceDashboard, SavingGoal,
    Transaction, TransactionType,
};
use crate::store;
use crate::utils::{format_date, round_amount};

/// Accounts with a negative balance, reported as positive debt amounts.
pub fn detect_debts(accounts: &[Account]) -> Vec<Debt> {
    accounts
        .iter()
        .filter(|a| a.balance < 0.0)
        .map(|a| Debt {
            account_id: a.id.clone(),
            account_name: a.name.clone(),
            debt_amount: round_amount(-a.balance),
            currency: a.currency.clone(),
        })
        .collect()
}

pub fn summarize(
    accounts: &[Account],
    month_transactions: &[Transaction],
    budgets: &[BudgetWithStatus],
    goals: &[SavingGoal],
    debts: &[Debt],
) -> DashboardSummary {
    let mut summary = DashboardSummary {
        total_balance: accounts
            .iter()
            .filter(|a| a.balance > 0.0)
            .map(|a| a.balance)
            .sum(),
        total_debts: debts.iter().map(|d| d.debt_amount).sum(),
        budgets_overspent: budgets
            .iter()
            .filter(|b| b.status == BudgetStatus::Danger)
            .count() as u32,
        saving_goals_achieved: goals.iter().filter(|g| g.is_achieved).count() as u32,
        ..Default::default()
    };

    for transaction in month_transactions {
        match transaction.transaction_type {
            TransactionType::Income => summary.monthly_income += transaction.amount,
            TransactionType::Expense => summary.monthly_expenses += transaction.amount,
            TransactionType::Saving => summary.monthly_savings += transaction.amount,
        }
    }

    summary.total_balance = round_amount(summary.total_balance);
    summary.total_debts = round_amount(summary.total_debts);
    summary.monthly_income = round_amount(summary.monthly_income);
    summary.monthly_expenses = round_amount(summary.monthly_expenses);
    summary.monthly_savings = round_amount(summary.monthly_savings);
    summary
}

/// Composes the finance snapshot for `now`'s calendar month. Budget spend is
/// recomputed in memory from the month's transactions and not persisted.
pub async fn build_dashboard(
    conn: &Connection,
    user_id: &str,
    now: OffsetDateTime,
) -> AppResult<FinanceDashboard> {
    let accounts = store::accounts::get_by_user_id(conn, user_id).await?;

    let (month_start, month_end) = month_bounds(now.date())
        .ok_or_else(|| AppError::Internal("current date out of range".into()))?;
    let current_month_transactions = store::transactions::get_by_date_range(
        conn,
        user_id,
        &format_date(month_start),
        &format_date(month_end),
    )
    .await?;

    let budgets_with_status: Vec<BudgetWithStatus> = store::budgets::get_by_user_id(conn, user_id)
        .await?
        .into_iter()
        .map(|mut budget| {
            budget.amount_spent = amount_spent_in(&budget.category_id, &current_month_transactions);
            budget_status(budget, now)
        })
        .collect();

    let saving_goals = store::saving_goals::get_by_user_id(conn, user_id).await?;
    let debts = detect_debts(&accounts);

    let recurring_transactions: Vec<Transaction> =
        store::transactions::get_by_user_id(conn, user_id)
            .await?
            .into_iter()
            .filter(|t| t.recurring)
            .collect();

    let summary = summarize(
        &accounts,
        &current_month_transactions,
        &budgets_with_status,
        &saving_goals,
        &debts,
    );

    Ok(FinanceDashboard {
        accounts,
        current_month_transactions,
        budgets_with_status,
        saving_goals,
        debts,
        recurring_transactions,
        summary,
    })
}

pub async fn get_dashboard(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<FinanceDashboard>), AppError> {
    let now = app_state.now();
    let conn = app_state.db.read().await;
    let dashboard = build_dashboard(&conn, &user.id, now).await?;
    Ok((StatusCode::OK, Json(dashboard)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountType;

    fn account(id: &str, balance: f64) -> Account {
        Account {
            id: id.into(),
            user_id: "u1".into(),
            name: format!("Account {}", id),
            account_type: AccountType::Checking,
            balance,
            currency: "XAF".into(),
            icon: String::new(),
            color: String::new(),
            account_number: None,
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: "2024-01-01T00:00:00Z".into(),
        }
    }

    fn tx(kind: TransactionType, amount: f64) -> Transaction {
        Transaction {
            id: format!("{}-{}", kind, amount),
            user_id: "u1".into(),
            account_id: "a".into(),
            category_id: None,
            transaction_type: kind,
            saving_goal_id: None,
            amount,
            description: "x".into(),
            date: "2024-03-02".into(),
            recurring: false,
            created_at: "2024-03-02T00:00:00Z".into(),
            updated_at: "2024-03-02T00:00:00Z".into(),
        }
    }

    #[test]
    fn negative_balances_become_debts() {
        let accounts = vec![account("a", 1000.0), account("b", -500.0)];
        let debts = detect_debts(&accounts);
        assert_eq!(debts.len(), 1);
        assert_eq!(debts[0].account_id, "b");
        assert_eq!(debts[0].debt_amount, 500.0);

        let summary = summarize(&accounts, &[], &[], &[], &debts);
        assert_eq!(summary.total_balance, 1000.0);
        assert_eq!(summary.total_debts, 500.0);
    }

    #[test]
    fn monthly_buckets_by_type() {
        let month = vec![
            tx(TransactionType::Income, 1000.0),
            tx(TransactionType::Expense, 300.0),
            tx(TransactionType::Saving, 50.0),
        ];
        let summary = summarize(&[], &month, &[], &[], &[]);
        assert_eq!(summary.monthly_income, 1000.0);
        assert_eq!(summary.monthly_expenses, 300.0);
        assert_eq!(summary.monthly_savings, 50.0);
        assert_eq!(summary.budgets_overspent, 0);
    }

    #[test]
    fn empty_user_has_zero_summary() {
        assert_eq!(summarize(&[], &[], &[], &[], &[]), DashboardSummary::default());
    }
}

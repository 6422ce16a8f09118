//! Spend-to-plan evaluation for budgets.
//!
//! Everything here is pure: callers pass the clock in, so the same budget
//! and instant always produce the same status.

use time::macros::time;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime};

use crate::constants::{BUDGET_DANGER_PERCENT, BUDGET_WARNING_PERCENT, DEFAULT_DAYS_REMAINING};
use crate::models::{Budget, BudgetPeriod, BudgetStatus, BudgetWithStatus, Transaction};
use crate::utils::round_amount;

/// `spent / planned * 100`, or 0 when nothing was planned.
pub fn percentage_used(amount_spent: f64, amount_planned: f64) -> f64 {
    if amount_planned > 0.0 {
        amount_spent / amount_planned * 100.0
    } else {
        0.0
    }
}

pub fn status_for(percentage: f64) -> BudgetStatus {
    if percentage >= BUDGET_DANGER_PERCENT {
        BudgetStatus::Danger
    } else if percentage >= BUDGET_WARNING_PERCENT {
        BudgetStatus::Warning
    } else {
        BudgetStatus::Good
    }
}

/// First and last calendar day of the month containing `date`.
pub fn month_bounds(date: Date) -> Option<(Date, Date)> {
    let first = date.replace_day(1).ok()?;
    let (next_year, next_month) = match date.month() {
        Month::December => (date.year() + 1, Month::January),
        month => (date.year(), month.next()),
    };
    let last = Date::from_calendar_date(next_year, next_month, 1)
        .ok()?
        .previous_day()?;
    Some((first, last))
}

fn whole_days_until_end_of(day: Date, now: OffsetDateTime) -> i64 {
    let end = PrimitiveDateTime::new(day, time!(23:59:59)).assume_offset(now.offset());
    (end - now).whole_days()
}

/// Whole days left in the budget's current period, truncated toward zero.
pub fn days_remaining(period: BudgetPeriod, now: OffsetDateTime) -> i64 {
    let today = now.date();
    let period_end = match period {
        BudgetPeriod::Monthly => month_bounds(today).map(|(_, last)| last),
        BudgetPeriod::Yearly => Date::from_calendar_date(today.year(), Month::December, 31).ok(),
        BudgetPeriod::Weekly => return 7 - i64::from(today.weekday().number_from_monday()),
        BudgetPeriod::Daily => None,
    };

    period_end
        .map(|end| whole_days_until_end_of(end, now))
        .unwrap_or(DEFAULT_DAYS_REMAINING)
}

/// Sum of amounts of `transactions` in the budget's category, whatever their
/// type.
pub fn amount_spent_in(category_id: &str, transactions: &[Transaction]) -> f64 {
    let total: f64 = transactions
        .iter()
        .filter(|t| t.category_id.as_deref() == Some(category_id))
        .map(|t| t.amount)
        .sum();
    round_amount(total)
}

pub fn budget_status(budget: Budget, now: OffsetDateTime) -> BudgetWithStatus {
    let percentage = percentage_used(budget.amount_spent, budget.amount_planned);
    BudgetWithStatus {
        status: status_for(percentage),
        percentage_used: percentage,
        remaining_amount: round_amount(budget.amount_planned - budget.amount_spent),
        days_remaining: days_remaining(budget.period, now),
        budget,
    }
}

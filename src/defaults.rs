use libsql::Connection;
use uuid::Uuid;

use crate::constants::DEFAULT_CURRENCY;
use crate::error::AppResult;
use crate::models::{Account, AccountType, Category, CategoryType};
use crate::store;
use crate::utils::now_rfc3339;

// (name, type, icon, color)
const DEFAULT_ACCOUNTS: [(&str, AccountType, &str, &str); 5] = [
    ("Wallet (Cash)", AccountType::Cash, "ion:cash", "#00B894"),
    ("Bank Account", AccountType::Checking, "fa5:university", "#0984E3"),
    ("MOMO", AccountType::MobileMoney, "mci:cellphone", "#FDCB6E"),
    ("OM", AccountType::MobileMoney, "mci:cellphone", "#E17055"),
    ("Savings", AccountType::Savings, "fa5:piggy-bank", "#A29BFE"),
];

const DEFAULT_CATEGORIES: [(&str, CategoryType, &str, &str); 20] = [
    ("Work", CategoryType::Task, "md:work", "#FF6B6B"),
    ("Studies", CategoryType::Task, "ion:book", "#4ECDC4"),
    ("Health", CategoryType::Task, "fa5:heartbeat", "#FF7675"),
    ("Sport", CategoryType::Task, "mci:run", "#74B9FF"),
    ("Errands", CategoryType::Task, "md:shopping-cart", "#55A3FF"),
    ("Home", CategoryType::Task, "ion:home", "#A29BFE"),
    ("Leisure", CategoryType::Task, "fa:gamepad", "#FD79A8"),
    ("Food", CategoryType::Expense, "md:restaurant", "#FF6B6B"),
    ("Transport", CategoryType::Expense, "ion:car", "#4ECDC4"),
    ("Housing", CategoryType::Expense, "fa5:house-user", "#45B7D1"),
    ("Health", CategoryType::Expense, "fa5:clinic-medical", "#FF7675"),
    ("Subscriptions", CategoryType::Expense, "mci:netflix", "#E17055"),
    ("Entertainment", CategoryType::Expense, "md:movie", "#FD79A8"),
    ("Shopping", CategoryType::Expense, "fa5:tshirt", "#FDCB6E"),
    ("Education", CategoryType::Expense, "ion:school", "#6C5CE7"),
    ("Salary", CategoryType::Revenue, "fa5:money-check-alt", "#00B894"),
    ("Business", CategoryType::Revenue, "ion:briefcase", "#00CEC9"),
    ("Investments", CategoryType::Revenue, "mci:chart-line", "#74B9FF"),
    ("Gifts", CategoryType::Revenue, "ion:gift", "#FD79A8"),
    ("Refunds", CategoryType::Revenue, "fa5:hand-holding-usd", "#55A3FF"),
];

/// Creates the starter accounts and categories for a newly registered user.
/// Runs on the registration transaction's connection.
pub async fn seed_defaults(conn: &Connection, user_id: &str) -> AppResult<()> {
    let now = now_rfc3339();

    for (name, account_type, icon, color) in DEFAULT_ACCOUNTS {
        let account = Account {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            account_type,
            balance: 0.0,
            currency: DEFAULT_CURRENCY.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            account_number: None,
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        store::accounts::insert(conn, &account).await?;
    }

    for (name, category_type, icon, color) in DEFAULT_CATEGORIES {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            category_type,
            parent_id: None,
            icon: icon.to_string(),
            color: color.to_string(),
            created_at: now.clone(),
        };
        store::categories::insert(conn, &category).await?;
    }

    tracing::debug!(
        user_id,
        accounts = DEFAULT_ACCOUNTS.len(),
        categories = DEFAULT_CATEGORIES.len(),
        "seeded default data"
    );
    Ok(())
}

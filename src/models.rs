use serde::{Deserialize, Serialize};

/// Closed set of lowercase string values stored as TEXT and sent as JSON strings.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "'{}' is not one of: {}",
                        other,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(AccountType {
    Checking => "checking",
    Savings => "savings",
    MobileMoney => "mobile_money",
    Cash => "cash",
    Bank => "bank",
});

string_enum!(TransactionType {
    Income => "income",
    Expense => "expense",
    Saving => "saving",
});

string_enum!(
    /// `daily` is accepted but has no dedicated days-remaining rule.
    BudgetPeriod {
        Weekly => "weekly",
        Monthly => "monthly",
        Yearly => "yearly",
        Daily => "daily",
    }
);

string_enum!(GoalFrequency {
    Weekly => "weekly",
    Monthly => "monthly",
    Yearly => "yearly",
});

string_enum!(CategoryType {
    Expense => "expense",
    Revenue => "revenue",
    Task => "task",
});

string_enum!(TaskPriority {
    Low => "low",
    Medium => "medium",
    High => "high",
});

string_enum!(TaskStatus {
    Incoming => "incoming",
    Running => "running",
    Done => "done",
    Expired => "expired",
});

string_enum!(BudgetStatus {
    Good => "good",
    Warning => "warning",
    Danger => "danger",
});

// ---------------------------------------------------------------------------
// Users and auth
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshPayload {
    pub refresh_token: String,
}

#[derive(Deserialize, Default)]
pub struct UpdateUserPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub balance: f64,
    pub currency: String,
    pub icon: String,
    pub color: String,
    pub account_number: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct CreateAccountPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: String,
    #[serde(default)]
    pub balance: f64,
    pub currency: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    pub account_number: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct UpdateAccountPayload {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub balance: Option<f64>,
    pub currency: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub account_number: Option<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Serialize)]
pub struct GetAccountsResponse {
    pub accounts: Vec<Account>,
    pub total_count: u32,
}

#[derive(Serialize)]
pub struct AccountBalanceResponse {
    pub account_id: String,
    pub balance: f64,
    pub currency: String,
}

#[derive(Serialize)]
pub struct AccountDetailsResponse {
    pub account: Account,
    pub transactions: Vec<Transaction>,
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub category_id: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub saving_goal_id: Option<String>,
    pub amount: f64,
    pub description: String,
    pub date: String,
    pub recurring: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// `type` may also be `transfer`, which requires `to_account_id`.
#[derive(Deserialize)]
pub struct CreateTransactionPayload {
    pub account_id: String,
    pub category_id: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub to_account_id: Option<String>,
    pub saving_goal_id: Option<String>,
    pub amount: f64,
    pub description: String,
    pub date: String,
    #[serde(default)]
    pub recurring: bool,
}

#[derive(Deserialize, Default)]
pub struct UpdateTransactionPayload {
    pub account_id: Option<String>,
    pub category_id: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub saving_goal_id: Option<String>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub recurring: Option<bool>,
}

#[derive(Deserialize, Default)]
pub struct GetTransactionsQuery {
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub account_id: Option<String>,
    pub category_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Serialize)]
pub struct GetTransactionsResponse {
    pub transactions: Vec<Transaction>,
    pub total_count: u32,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct TransactionStats {
    pub total_income: f64,
    pub total_expense: f64,
    pub net_amount: f64,
    pub count: u32,
}

// ---------------------------------------------------------------------------
// Saving goals
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SavingGoal {
    pub id: String,
    pub user_id: String,
    pub account_id: Option<String>,
    pub title: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub deadline: Option<String>,
    pub is_achieved: bool,
    pub frequency: GoalFrequency,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct CreateSavingGoalPayload {
    pub title: String,
    pub target_amount: f64,
    pub deadline: Option<String>,
    pub frequency: Option<String>,
    pub account_id: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct UpdateSavingGoalPayload {
    pub title: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub deadline: Option<String>,
    pub frequency: Option<String>,
    pub account_id: Option<String>,
}

#[derive(Serialize)]
pub struct GetSavingGoalsResponse {
    pub saving_goals: Vec<SavingGoal>,
    pub total_count: u32,
}

// ---------------------------------------------------------------------------
// Budgets
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub name: String,
    pub amount_planned: f64,
    pub amount_spent: f64,
    pub period: BudgetPeriod,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct CreateBudgetPayload {
    pub category_id: String,
    pub name: String,
    pub amount_planned: f64,
    pub period: String,
}

#[derive(Deserialize, Default)]
pub struct UpdateBudgetPayload {
    pub name: Option<String>,
    pub amount_planned: Option<f64>,
    pub amount_spent: Option<f64>,
    pub period: Option<String>,
}

#[derive(Serialize)]
pub struct GetBudgetsResponse {
    pub budgets: Vec<Budget>,
    pub total_count: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BudgetWithStatus {
    #[serde(flatten)]
    pub budget: Budget,
    pub status: BudgetStatus,
    pub percentage_used: f64,
    pub remaining_amount: f64,
    pub days_remaining: i64,
}

/// Totals over every budget for one month, with spend recomputed from that
/// month's transactions.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct BudgetStats {
    /// `MM/YYYY`
    pub period: String,
    pub total_planned: f64,
    pub total_spent: f64,
    pub remaining: f64,
    pub budget_count: u32,
    pub over_budget_count: u32,
    pub utilization_rate: f64,
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub parent_id: Option<String>,
    pub icon: String,
    pub color: String,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct CreateCategoryPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: String,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Deserialize, Default)]
pub struct UpdateCategoryPayload {
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Deserialize)]
pub struct GetCategoriesQuery {
    #[serde(rename = "type")]
    pub category_type: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Serialize)]
pub struct GetCategoriesResponse {
    pub categories: Vec<Category>,
    pub total_count: u32,
    pub limit: u32,
    pub offset: u32,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub category_id: Option<String>,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub due_date: Option<String>,
    pub duration_planned: i64,
    pub duration_spent: i64,
    pub status: TaskStatus,
    pub recurrence_rule: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct CreateTaskPayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: String,
    pub due_date: Option<String>,
    #[serde(default)]
    pub duration_planned: i64,
    pub category_id: Option<String>,
    pub recurrence_rule: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct UpdateTaskPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub duration_planned: Option<i64>,
    pub duration_spent: Option<i64>,
    pub status: Option<String>,
    pub category_id: Option<String>,
    pub recurrence_rule: Option<String>,
}

#[derive(Deserialize)]
pub struct GetTasksQuery {
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Serialize)]
pub struct GetTasksResponse {
    pub tasks: Vec<Task>,
    pub total_count: u32,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct TaskStats {
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub pending_tasks: u32,
    pub completion_rate: f64,
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct IncomePreferences {
    pub sources: Vec<String>,
    pub monthly_total: f64,
    pub accounts: Vec<String>,
    pub has_debt: bool,
    pub debt_amount: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ExpensePreferences {
    pub top_categories: Vec<String>,
    pub food: f64,
    pub transport: f64,
    pub housing: f64,
    pub subscriptions: f64,
    pub alerts_enabled: bool,
    pub auto_budget: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GoalPreferences {
    pub main_goal: String,
    pub secondary_goal: String,
    pub savings_target: f64,
    pub deadline: String,
    pub advice_enabled: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct HabitPreferences {
    pub planning_time: String,
    pub daily_focus_time: String,
    pub custom_habit: String,
    pub summary_type: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Preferences {
    pub user_id: String,
    pub income: IncomePreferences,
    pub expenses: ExpensePreferences,
    pub goals: GoalPreferences,
    pub habits: HabitPreferences,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct CreatePreferencesPayload {
    pub income: IncomePreferences,
    pub expenses: ExpensePreferences,
    pub goals: GoalPreferences,
    pub habits: HabitPreferences,
}

#[derive(Deserialize, Default)]
pub struct UpdatePreferencesPayload {
    pub income: Option<IncomePreferences>,
    pub expenses: Option<ExpensePreferences>,
    pub goals: Option<GoalPreferences>,
    pub habits: Option<HabitPreferences>,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Debt {
    pub account_id: String,
    pub account_name: String,
    pub debt_amount: f64,
    pub currency: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct DashboardSummary {
    pub total_balance: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub monthly_savings: f64,
    pub total_debts: f64,
    pub budgets_overspent: u32,
    pub saving_goals_achieved: u32,
}

#[derive(Serialize, Debug, Clone)]
pub struct FinanceDashboard {
    pub accounts: Vec<Account>,
    pub current_month_transactions: Vec<Transaction>,
    pub budgets_with_status: Vec<BudgetWithStatus>,
    pub saving_goals: Vec<SavingGoal>,
    pub debts: Vec<Debt>,
    pub recurring_transactions: Vec<Transaction>,
    pub summary: DashboardSummary,
}

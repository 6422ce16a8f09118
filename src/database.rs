use anyhow::Result;
use libsql::{Builder, Connection};
use std::future::Future;
use std::pin::Pin;
use std::{path::Path, sync::Arc};
use tokio::sync::RwLock;

use crate::constants::DATABASE_FILE_NAME;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id             TEXT    PRIMARY KEY,
    name           TEXT    NOT NULL,
    email          TEXT    UNIQUE NOT NULL,
    password_hash  TEXT    NOT NULL,
    created_at     TEXT    NOT NULL,
    updated_at     TEXT    NOT NULL
);
"#;

const CREATE_CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id          TEXT    PRIMARY KEY,
    user_id     TEXT    NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name        TEXT    NOT NULL,
    type        TEXT    NOT NULL,
    parent_id   TEXT    REFERENCES categories(id),
    icon        TEXT    NOT NULL DEFAULT '',
    color       TEXT    NOT NULL DEFAULT '',
    created_at  TEXT    NOT NULL,
    deleted_at  TEXT
);
"#;

const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id              TEXT    PRIMARY KEY,
    user_id         TEXT    NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name            TEXT    NOT NULL,
    type            TEXT    NOT NULL,
    balance         REAL    NOT NULL DEFAULT 0,
    currency        TEXT    NOT NULL,
    icon            TEXT    NOT NULL DEFAULT '',
    color           TEXT    NOT NULL DEFAULT '',
    account_number  TEXT,
    created_at      TEXT    NOT NULL,
    updated_at      TEXT    NOT NULL
);
"#;

const CREATE_SAVING_GOALS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS saving_goals (
    id              TEXT    PRIMARY KEY,
    user_id         TEXT    NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    account_id      TEXT    REFERENCES accounts(id) ON DELETE SET NULL,
    title           TEXT    NOT NULL,
    target_amount   REAL    NOT NULL,
    current_amount  REAL    NOT NULL DEFAULT 0,
    deadline        TEXT,
    is_achieved     BOOLEAN NOT NULL DEFAULT FALSE,
    frequency       TEXT    NOT NULL,
    created_at      TEXT    NOT NULL,
    updated_at      TEXT    NOT NULL
);
"#;

const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id              TEXT    PRIMARY KEY,
    user_id         TEXT    NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    account_id      TEXT    NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    category_id     TEXT    REFERENCES categories(id),
    type            TEXT    NOT NULL,
    saving_goal_id  TEXT    REFERENCES saving_goals(id) ON DELETE SET NULL,
    amount          REAL    NOT NULL,
    description     TEXT    NOT NULL,
    date            TEXT    NOT NULL,
    recurring       BOOLEAN NOT NULL DEFAULT FALSE,
    created_at      TEXT    NOT NULL,
    updated_at      TEXT    NOT NULL
);
"#;

const CREATE_BUDGETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS budgets (
    id              TEXT    PRIMARY KEY,
    user_id         TEXT    NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    category_id     TEXT    NOT NULL REFERENCES categories(id),
    name            TEXT    NOT NULL,
    amount_planned  REAL    NOT NULL,
    amount_spent    REAL    NOT NULL DEFAULT 0,
    period          TEXT    NOT NULL,
    created_at      TEXT    NOT NULL,
    updated_at      TEXT    NOT NULL
);
"#;

const CREATE_TASKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id                TEXT    PRIMARY KEY,
    user_id           TEXT    NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    category_id       TEXT    REFERENCES categories(id),
    title             TEXT    NOT NULL,
    description       TEXT    NOT NULL DEFAULT '',
    priority          TEXT    NOT NULL,
    due_date          TEXT,
    duration_planned  INTEGER NOT NULL DEFAULT 0,
    duration_spent    INTEGER NOT NULL DEFAULT 0,
    status            TEXT    NOT NULL,
    recurrence_rule   TEXT,
    created_at        TEXT    NOT NULL,
    updated_at        TEXT    NOT NULL
);
"#;

const CREATE_PREFERENCES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS preferences (
    user_id     TEXT    PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    income      TEXT    NOT NULL,
    expenses    TEXT    NOT NULL,
    goals       TEXT    NOT NULL,
    habits      TEXT    NOT NULL,
    created_at  TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL
);
"#;

const CREATE_INDEXES: [&str; 8] = [
    "CREATE INDEX IF NOT EXISTS idx_categories_user ON categories(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_accounts_user ON accounts(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_saving_goals_user ON saving_goals(user_id, account_id)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_user_account ON transactions(user_id, account_id)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_goal ON transactions(saving_goal_id)",
    "CREATE INDEX IF NOT EXISTS idx_budgets_user ON budgets(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id)",
];

pub type Db = Arc<RwLock<Connection>>;

/// Opens (or creates) `<data_dir>/finance.db` and applies the schema.
pub async fn init_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join(DATABASE_FILE_NAME);
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;

    conn.execute("PRAGMA foreign_keys = ON", ()).await?;
    for statement in [
        CREATE_USERS_TABLE,
        CREATE_CATEGORIES_TABLE,
        CREATE_ACCOUNTS_TABLE,
        CREATE_SAVING_GOALS_TABLE,
        CREATE_TRANSACTIONS_TABLE,
        CREATE_BUDGETS_TABLE,
        CREATE_TASKS_TABLE,
        CREATE_PREFERENCES_TABLE,
    ] {
        conn.execute(statement, ()).await?;
    }
    for index in CREATE_INDEXES {
        conn.execute(index, ()).await?;
    }

    tracing::info!(path = %data_dir, "database ready");
    Ok(Arc::new(RwLock::new(conn)))
}

/// Runs `f` between BEGIN and COMMIT while holding the write lock, rolling
/// back when it returns an error.
///
/// The closure returns a boxed future so it can borrow the connection.
pub async fn with_transaction<F, T, E>(db: &Db, f: F) -> Result<T, E>
where
    F: for<'a> FnOnce(&'a Connection) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>,
    E: From<TransactionError>,
{
    let conn = db.write().await;

    conn.execute("BEGIN TRANSACTION", ())
        .await
        .map_err(|_| TransactionError::Begin)?;

    match f(&conn).await {
        Ok(result) => {
            conn.execute("COMMIT", ())
                .await
                .map_err(|_| TransactionError::Commit)?;
            Ok(result)
        }
        Err(e) => {
            let _ = conn.execute("ROLLBACK", ()).await;
            Err(e)
        }
    }
}

#[derive(Debug)]
pub enum TransactionError {
    Begin,
    Commit,
}

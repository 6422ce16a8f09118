// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_DATA_PATH: &str = "data";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:8080";
pub const DATABASE_FILE_NAME: &str = "finance.db";

// Token configuration
pub const MIN_JWT_SECRET_LENGTH: usize = 32;
pub const DEFAULT_ACCESS_TOKEN_HOURS: i64 = 24;
pub const DEFAULT_REFRESH_TOKEN_HOURS: i64 = 168;
pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";
pub const BEARER: &str = "Bearer";

// Database limits and defaults
pub const DEFAULT_LIST_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;
pub const MAX_OFFSET: u32 = 1_000_000;

// Validation limits
pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_EMAIL_LENGTH: usize = 255;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_DESCRIPTION_LENGTH: usize = 255;
pub const MAX_TASK_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;
pub const MAX_SEARCH_TERM_LENGTH: usize = 100;
pub const MAX_ICON_LENGTH: usize = 50;
pub const MAX_COLOR_LENGTH: usize = 20;
pub const MAX_ACCOUNT_NUMBER_LENGTH: usize = 50;
pub const MAX_RECURRENCE_RULE_LENGTH: usize = 255;
pub const MAX_TASK_MINUTES: i64 = 1440;
pub const CURRENCY_CODE_LENGTH: usize = 3;
pub const DEFAULT_CURRENCY: &str = "XAF";

// Budget status thresholds (percent of plan consumed)
pub const BUDGET_DANGER_PERCENT: f64 = 100.0;
pub const BUDGET_WARNING_PERCENT: f64 = 80.0;
pub const DEFAULT_DAYS_REMAINING: i64 = 30;

// Error messages
pub const ERR_DATABASE_OPERATION: &str = "Database operation failed";
pub const ERR_UNAUTHORIZED: &str = "Missing or invalid access token";
pub const ERR_INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const ERR_EMPTY_UPDATE: &str = "At least one field must be provided for update";

use std::str::FromStr;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::constants::*;
use crate::error::{AppError, AppResult};

pub fn db_error() -> AppError {
    AppError::Internal(ERR_DATABASE_OPERATION.to_string())
}

pub fn db_error_with_context(context: &str) -> AppError {
    AppError::Internal(format!("Database error: {}", context))
}

/// Current UTC instant as an RFC 3339 string, used for audit columns.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

pub fn round_amount(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub fn validate_string_length(value: &str, field_name: &str, max_length: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!(
            "{} cannot be empty",
            field_name
        )));
    }
    validate_max_length(value, field_name, max_length)
}

/// Length check for optional decorative fields where empty is allowed.
pub fn validate_max_length(value: &str, field_name: &str, max_length: usize) -> AppResult<()> {
    if value.chars().count() > max_length {
        return Err(AppError::validation(format!(
            "{} must be less than {} characters",
            field_name, max_length
        )));
    }
    Ok(())
}

pub fn parse_date(value: &str) -> AppResult<Date> {
    if value.trim().is_empty() {
        return Err(AppError::validation("Date cannot be empty"));
    }
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::validation("Invalid date format, expected YYYY-MM-DD"))
}

pub fn validate_date(value: &str) -> AppResult<()> {
    parse_date(value).map(|_| ())
}

pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

pub fn validate_timestamp(value: &str, field_name: &str) -> AppResult<()> {
    OffsetDateTime::parse(value.trim(), &Rfc3339)
        .map(|_| ())
        .map_err(|_| AppError::validation(format!("{} must be an RFC 3339 timestamp", field_name)))
}

/// Rejects zero, negative and non-finite amounts; returns the value rounded
/// to two fractional digits.
pub fn validate_positive_amount(amount: f64, field_name: &str) -> AppResult<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::validation(format!(
            "{} must be greater than zero",
            field_name
        )));
    }
    Ok(round_amount(amount))
}

pub fn validate_non_negative_amount(amount: f64, field_name: &str) -> AppResult<f64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::validation(format!(
            "{} cannot be negative",
            field_name
        )));
    }
    Ok(round_amount(amount))
}

pub fn parse_enum<T>(value: &str, field_name: &str) -> AppResult<T>
where
    T: FromStr<Err = String>,
{
    value
        .trim()
        .to_lowercase()
        .parse()
        .map_err(|e| AppError::validation(format!("Invalid {}: {}", field_name, e)))
}

/// Unwraps a store lookup, mapping absence to NotFound and a foreign owner
/// to Forbidden.
pub fn ensure_owned<T>(
    entity: Option<T>,
    owner: impl Fn(&T) -> &str,
    user_id: &str,
    what: &str,
) -> AppResult<T> {
    let entity = entity.ok_or_else(|| AppError::not_found(what))?;
    if owner(&entity) != user_id {
        return Err(AppError::forbidden(what));
    }
    Ok(entity)
}

pub fn validate_limit(limit: Option<u32>, default: u32) -> AppResult<u32> {
    match limit {
        Some(0) => Err(AppError::validation("Limit must be greater than 0")),
        Some(l) if l > MAX_LIMIT => Err(AppError::validation(format!(
            "Limit cannot exceed {}",
            MAX_LIMIT
        ))),
        Some(l) => Ok(l),
        None => Ok(default),
    }
}

pub fn validate_list_limit(limit: Option<u32>) -> AppResult<u32> {
    validate_limit(limit, DEFAULT_LIST_LIMIT)
}

pub fn validate_offset(offset: Option<u32>) -> AppResult<u32> {
    match offset {
        Some(o) if o > MAX_OFFSET => Err(AppError::validation(format!(
            "Offset cannot exceed {}",
            MAX_OFFSET
        ))),
        Some(o) => Ok(o),
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BudgetPeriod;

    #[test]
    fn amounts_are_rounded_to_cents() {
        assert_eq!(round_amount(10.005_1), 10.01);
        assert_eq!(validate_positive_amount(12.344, "Amount").unwrap(), 12.34);
        assert!(validate_positive_amount(0.0, "Amount").is_err());
        assert!(validate_positive_amount(-3.0, "Amount").is_err());
        assert!(validate_positive_amount(f64::NAN, "Amount").is_err());
        assert_eq!(validate_non_negative_amount(0.0, "Balance").unwrap(), 0.0);
    }

    #[test]
    fn dates_must_be_calendar_days() {
        assert!(validate_date("2024-02-29").is_ok());
        assert!(validate_date("2023-02-29").is_err());
        assert!(validate_date("29/02/2024").is_err());
        assert!(validate_date("   ").is_err());
        assert_eq!(format_date(parse_date("2024-03-07").unwrap()), "2024-03-07");
    }

    #[test]
    fn enum_values_are_case_insensitive() {
        let period: BudgetPeriod = parse_enum(" Monthly ", "period").unwrap();
        assert_eq!(period, BudgetPeriod::Monthly);
        let err = parse_enum::<BudgetPeriod>("fortnightly", "period").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn limits_and_offsets() {
        assert_eq!(validate_list_limit(None).unwrap(), DEFAULT_LIST_LIMIT);
        assert!(validate_list_limit(Some(0)).is_err());
        assert!(validate_list_limit(Some(MAX_LIMIT + 1)).is_err());
        assert_eq!(validate_offset(None).unwrap(), 0);
        assert!(validate_offset(Some(MAX_OFFSET + 1)).is_err());
    }

    #[test]
    fn ownership_checks() {
        let owned = ensure_owned(Some(("a", 1)), |e| e.0, "a", "Account");
        assert!(owned.is_ok());
        let foreign = ensure_owned(Some(("b", 1)), |e| e.0, "a", "Account");
        assert!(matches!(foreign, Err(AppError::Forbidden(_))));
        let missing = ensure_owned(None::<(&str, i32)>, |e| e.0, "a", "Account");
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }
}

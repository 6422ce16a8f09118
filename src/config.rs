use time::UtcOffset;

use crate::constants::*;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set")]
    MissingJwtSecret,
    #[error("JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long")]
    WeakJwtSecret,
    #[error("{name} has an invalid value: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Runtime settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_path: String,
    pub jwt_secret: String,
    pub access_token_hours: i64,
    pub refresh_token_hours: i64,
    pub frontend_origin: String,
    pub utc_offset: UtcOffset,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("HOST", DEFAULT_HOST);
        let port = parse_env("PORT", DEFAULT_PORT)?;
        let data_path = env_or("DATABASE_PATH", DEFAULT_DATA_PATH);

        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingJwtSecret)?;
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::WeakJwtSecret);
        }

        let access_token_hours = parse_env(
            "JWT_EXPIRATION_HOURS",
            &DEFAULT_ACCESS_TOKEN_HOURS.to_string(),
        )?;
        let refresh_token_hours = parse_env(
            "JWT_REFRESH_EXPIRATION_HOURS",
            &DEFAULT_REFRESH_TOKEN_HOURS.to_string(),
        )?;

        let frontend_origin = env_or("FRONTEND_ORIGIN", DEFAULT_FRONTEND_ORIGIN);

        let offset_raw = env_or("APP_UTC_OFFSET", "+00:00");
        let utc_offset = parse_utc_offset(&offset_raw).ok_or(ConfigError::InvalidValue {
            name: "APP_UTC_OFFSET",
            value: offset_raw.clone(),
        })?;

        Ok(Self {
            host,
            port,
            data_path,
            jwt_secret,
            access_token_hours,
            refresh_token_hours,
            frontend_origin,
            utc_offset,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = env_or(name, default);
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name, value })
}

/// Parses `+HH:MM` / `-HH:MM` (also accepts `Z`).
pub fn parse_utc_offset(value: &str) -> Option<UtcOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return Some(UtcOffset::UTC);
    }
    let format = time::macros::format_description!("[offset_hour sign:mandatory]:[offset_minute]");
    UtcOffset::parse(value, &format).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_utc_offset("Z"), Some(UtcOffset::UTC));
        assert_eq!(
            parse_utc_offset("+01:00"),
            UtcOffset::from_hms(1, 0, 0).ok()
        );
        assert_eq!(
            parse_utc_offset("-05:30"),
            UtcOffset::from_hms(-5, -30, 0).ok()
        );
        assert_eq!(parse_utc_offset("one hour"), None);
    }
}

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use password_hash::rand_core::OsRng;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::constants::*;
use crate::defaults::seed_defaults;
use crate::error::{AppError, AppResult};
use crate::models::{
    LoginPayload, PublicUser, RefreshPayload, RegisterPayload, TokenResponse, UpdateUserPayload,
    User,
};
use crate::store;
use crate::utils::{now_rfc3339, validate_string_length};
use crate::{AppState, with_transaction};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing material and lifetimes for access/refresh tokens.
pub struct JwtConfig {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtConfig {
    pub fn new(secret: &str, access_hours: i64, refresh_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::hours(access_hours),
            refresh_ttl: Duration::hours(refresh_hours),
        }
    }

    pub fn issue(&self, user: &User, token_type: &str) -> AppResult<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = if token_type == TOKEN_TYPE_REFRESH {
            self.refresh_ttl
        } else {
            self.access_ttl
        };
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            token_type: token_type.to_string(),
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))
    }

    /// Verifies signature and expiry and requires the given token type.
    pub fn verify(&self, token: &str, token_type: &str) -> AppResult<Claims> {
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &self.decoding,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| AppError::Unauthorized(ERR_UNAUTHORIZED.to_string()))?;

        if data.claims.token_type != token_type {
            return Err(AppError::Unauthorized(format!(
                "Expected a {} token",
                token_type
            )));
        }
        Ok(data.claims)
    }

    fn token_response(&self, user: User) -> AppResult<TokenResponse> {
        Ok(TokenResponse {
            access_token: self.issue(&user, TOKEN_TYPE_ACCESS)?,
            refresh_token: self.issue(&user, TOKEN_TYPE_REFRESH)?,
            token_type: BEARER.to_string(),
            expires_in: self.access_ttl.whole_seconds(),
            user: user.into(),
        })
    }
}

/// The caller identified by a valid bearer access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix(BEARER))
            .and_then(|rest| rest.strip_prefix(' '))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Unauthorized(ERR_UNAUTHORIZED.to_string()))?;

        let claims = state.jwt.verify(token, TOKEN_TYPE_ACCESS)?;
        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError::Internal("failed to hash password".into()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn validate_name(name: &str) -> AppResult<()> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(AppError::validation(format!(
            "Name must be at least {} characters",
            MIN_NAME_LENGTH
        )));
    }
    validate_string_length(name, "Name", MAX_NAME_LENGTH)
}

fn validate_email(email: &str) -> AppResult<()> {
    validate_string_length(email, "Email", MAX_EMAIL_LENGTH)?;
    match email.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AppError::validation("Email address is invalid")),
    }
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn validate_registration(payload: &RegisterPayload) -> AppResult<()> {
    validate_name(&payload.name)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)
}

pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    validate_registration(&payload)?;

    let now = now_rfc3339();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_lowercase(),
        password_hash: hash_password(&payload.password)?,
        created_at: now.clone(),
        updated_at: now,
    };

    let new_user = user.clone();
    with_transaction(&app_state.db, |conn| {
        Box::pin(async move {
            if store::users::get_by_email(conn, &new_user.email).await?.is_some() {
                return Err(AppError::Conflict("Email is already registered".into()));
            }
            store::users::insert(conn, &new_user).await?;
            seed_defaults(conn, &new_user.id).await
        })
    })
    .await?;

    tracing::info!(user_id = %user.id, "user registered");
    let response = app_state.jwt.token_response(user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let email = payload.email.trim().to_lowercase();
    let user = {
        let conn = app_state.db.read().await;
        store::users::get_by_email(&conn, &email).await?
    };

    let user = match user {
        Some(user) if verify_password(&payload.password, &user.password_hash) => user,
        _ => {
            tracing::warn!(email = %email, "failed login attempt");
            return Err(AppError::Unauthorized(ERR_INVALID_CREDENTIALS.to_string()));
        }
    };

    let response = app_state.jwt.token_response(user)?;
    Ok((StatusCode::OK, Json(response)))
}

pub async fn refresh(
    State(app_state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let claims = app_state
        .jwt
        .verify(payload.refresh_token.trim(), TOKEN_TYPE_REFRESH)?;

    let user = {
        let conn = app_state.db.read().await;
        store::users::get_by_id(&conn, &claims.sub).await?
    }
    .ok_or_else(|| AppError::Unauthorized(ERR_UNAUTHORIZED.to_string()))?;

    let response = app_state.jwt.token_response(user)?;
    Ok((StatusCode::OK, Json(response)))
}

pub async fn me(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let conn = app_state.db.read().await;
    let found = store::users::get_by_id(&conn, &user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok((StatusCode::OK, Json(found.into())))
}

/// Updates name, email and password; only present fields change. A new email
/// must not belong to another user.
pub async fn update_me(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    if payload.name.is_none() && payload.email.is_none() && payload.password.is_none() {
        return Err(AppError::validation(ERR_EMPTY_UPDATE));
    }
    if let Some(ref name) = payload.name {
        validate_name(name)?;
    }
    if let Some(ref email) = payload.email {
        validate_email(email)?;
    }
    let password_hash = match payload.password {
        Some(ref password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let conn = app_state.db.write().await;
    let mut found = store::users::get_by_id(&conn, &user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if let Some(name) = payload.name {
        found.name = name.trim().to_string();
    }
    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        if email != found.email {
            if store::users::get_by_email(&conn, &email).await?.is_some() {
                return Err(AppError::Conflict("Email is already registered".into()));
            }
            found.email = email;
        }
    }
    if let Some(hash) = password_hash {
        found.password_hash = hash;
    }
    found.updated_at = now_rfc3339();

    if store::users::update(&conn, &found).await? == 0 {
        return Err(AppError::not_found("User"));
    }
    tracing::info!(user_id = %found.id, "user profile updated");

    Ok((StatusCode::OK, Json(found.into())))
}

/// Deletes the caller and everything they own.
pub async fn delete_me(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, AppError> {
    let conn = app_state.db.write().await;
    if store::users::delete(&conn, &user.id).await? == 0 {
        return Err(AppError::not_found("User"));
    }
    tracing::info!(user_id = %user.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

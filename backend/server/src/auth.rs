//! # Auth
//!
//! Bearer tokens and password hashes.
//!
//! - Tokens are HS256 JWTs carrying the user id (`sub`) and an expiry (`exp`)
//! - Passwords are bcrypt hashes, computed on the blocking pool
//! - Admin rights live on the user record, not in the token, so revoking them
//!   takes effect on the next request
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use tokio::task::spawn_blocking;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{config::Config, error::AppError, models::User, state::State, utils::now};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

pub fn issue_token(user_id: &str, config: &Config) -> Result<String, AppError> {
    let expiration = Utc::now() + Duration::hours(config.jwt_expiration_hours);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration.timestamp(),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?)
}

pub fn verify_token(token: &str, config: &Config) -> Result<String, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::Unauthorized("Token scaduto"),
        _ => {
            debug!("Rejected token: {e}");
            AppError::Unauthorized("Token non valido")
        }
    })?;

    if data.claims.sub.is_empty() {
        return Err(AppError::Unauthorized("Token non valido"));
    }

    Ok(data.claims.sub)
}

pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_string();

    Ok(spawn_blocking(move || bcrypt::hash(password, cost)).await??)
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hash = hash.to_string();

    Ok(spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false)).await?)
}

/// Checks credentials, returning the user only when they match.
pub async fn authenticate(state: &State, email: &str, password: &str) -> Result<Option<User>, AppError> {
    let Some(user) = state.database.find_user_by_email(email.trim()).await? else {
        return Ok(None);
    };

    if verify_password(password, &user.password).await? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Makes sure the configured admin account exists and carries admin rights.
pub async fn ensure_admin(state: &State) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&state.config.admin_email, &state.config.admin_password)
    else {
        return Ok(());
    };

    match state.database.find_user_by_email(email).await? {
        Some(user) if user.is_admin => {
            debug!("Admin {email} already present");
        }
        Some(mut user) => {
            user.is_admin = true;
            state.database.save_user(&user).await?;

            info!("Granted admin rights to {email}");
        }
        None => {
            let user = User {
                id: Uuid::new_v4().to_string(),
                username: email.split('@').next().unwrap_or(email).to_string(),
                email: email.clone(),
                password: hash_password(password, state.config.bcrypt_cost).await?,
                created_at: now(),
                is_admin: true,
            };
            state.database.create_user(&user).await?;

            info!("Created admin account {email}");
        }
    }

    Ok(())
}

fn bearer(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

/// The user behind a valid bearer token.
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<State>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<State>) -> Result<Self, Self::Rejection> {
        let token = bearer(parts).ok_or(AppError::NotAuthenticated)?;
        let user_id = verify_token(token, &state.config)?;

        let user = state
            .database
            .find_user_by_id(&user_id)
            .await?
            .ok_or(AppError::Unauthorized("Utente non trovato"))?;

        Ok(Self(user))
    }
}

/// A [`CurrentUser`] with admin rights.
pub struct AdminUser(pub User);

impl FromRequestParts<Arc<State>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<State>) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_admin {
            return Err(AppError::Forbidden("Accesso riservato agli amministratori"));
        }

        Ok(Self(user))
    }
}

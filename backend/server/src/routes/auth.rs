use std::sync::Arc;

use axum::{Json, extract::State as Extract};
use tracing::info;

use crate::{
    auth::{CurrentUser, authenticate, hash_password, issue_token},
    error::AppError,
    extract::Payload,
    models::{TokenResponse, User, UserCreate, UserLogin, UserResponse},
    state::State,
    utils::{new_id, now, sanitize_registration},
};

pub async fn register_handler(
    Extract(state): Extract<Arc<State>>,
    Payload(mut payload): Payload<UserCreate>,
) -> Result<Json<TokenResponse>, AppError> {
    sanitize_registration(&mut payload)?;

    if state
        .database
        .find_user_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::MalformedPayload("Email già registrata".to_string()));
    }

    if state
        .database
        .find_user_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(AppError::MalformedPayload("Username già in uso".to_string()));
    }

    let user = User {
        id: new_id(),
        username: payload.username,
        email: payload.email,
        password: hash_password(&payload.password, state.config.bcrypt_cost).await?,
        created_at: now(),
        is_admin: false,
    };

    state.database.create_user(&user).await?;
    info!("Registered {} ({})", user.username, user.id);

    let token = issue_token(&user.id, &state.config)?;

    Ok(Json(TokenResponse::bearer(token, &user)))
}

pub async fn login_handler(
    Extract(state): Extract<Arc<State>>,
    Payload(payload): Payload<UserLogin>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = authenticate(&state, &payload.email, &payload.password)
        .await?
        .ok_or(AppError::Unauthorized("Credenziali non valide"))?;

    let token = issue_token(&user.id, &state.config)?;

    Ok(Json(TokenResponse::bearer(token, &user)))
}

pub async fn me_handler(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

//! # Admin
//!
//! Commission back office: news management, the trainer roster and Pokémon
//! assignment. Everything except `/login` requires an [`AdminUser`].
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State as Extract,
    routing::{delete, get, post, put},
};
use tracing::info;

use super::news::new_news;
use crate::{
    auth::{AdminUser, authenticate, issue_token},
    error::AppError,
    extract::{Params, Payload},
    models::{
        MIN_LEVEL, Message, NewsCreate, NewsItem, NewsUpdate, PokemonAssign, TokenResponse, User,
        UserLogin, UserPokemon, UserResponse,
    },
    state::State,
    utils::now,
};

pub fn router() -> Router<Arc<State>> {
    Router::new()
        .route("/login", post(login_handler))
        .route("/news", get(list_news_handler).post(create_news_handler))
        .route("/news/{news_id}", put(update_news_handler).delete(delete_news_handler))
        .route("/users", get(list_users_handler))
        .route(
            "/users/{user_id}/pokemon",
            get(list_pokemon_handler).post(assign_pokemon_handler),
        )
        .route("/users/{user_id}/pokemon/{pokemon_id}", delete(remove_pokemon_handler))
}

pub async fn login_handler(
    Extract(state): Extract<Arc<State>>,
    Payload(payload): Payload<UserLogin>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = authenticate(&state, &payload.email, &payload.password)
        .await?
        .filter(|user| user.is_admin)
        .ok_or(AppError::Unauthorized("Credenziali admin non valide"))?;

    let token = issue_token(&user.id, &state.config)?;
    info!("Admin {} logged in", user.email);

    Ok(Json(TokenResponse {
        is_admin: Some(true),
        ..TokenResponse::bearer(token, &user)
    }))
}

pub async fn list_news_handler(
    Extract(state): Extract<Arc<State>>,
    _admin: AdminUser,
) -> Result<Json<Vec<NewsItem>>, AppError> {
    Ok(Json(state.database.list_news(false).await?))
}

pub async fn create_news_handler(
    Extract(state): Extract<Arc<State>>,
    _admin: AdminUser,
    Payload(payload): Payload<NewsCreate>,
) -> Result<Json<NewsItem>, AppError> {
    let item = new_news(payload);
    state.database.insert_news(&item).await?;

    Ok(Json(item))
}

pub async fn update_news_handler(
    Extract(state): Extract<Arc<State>>,
    _admin: AdminUser,
    Params(news_id): Params<String>,
    Payload(update): Payload<NewsUpdate>,
) -> Result<Json<NewsItem>, AppError> {
    let mut item = state
        .database
        .find_news(&news_id)
        .await?
        .ok_or(AppError::NotFound("Notizia non trovata"))?;

    update.apply(&mut item);
    state.database.save_news(&item).await?;

    Ok(Json(item))
}

pub async fn delete_news_handler(
    Extract(state): Extract<Arc<State>>,
    AdminUser(admin): AdminUser,
    Params(news_id): Params<String>,
) -> Result<Json<Message>, AppError> {
    if !state.database.delete_news(&news_id).await? {
        return Err(AppError::NotFound("Notizia non trovata"));
    }

    info!("{} deleted news {news_id}", admin.email);

    Ok(Json(Message::new("Notizia eliminata con successo")))
}

pub async fn list_users_handler(
    Extract(state): Extract<Arc<State>>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.database.list_users().await?;

    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

async fn existing_user(state: &State, user_id: &str) -> Result<User, AppError> {
    state
        .database
        .find_user_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("Utente non trovato"))
}

pub async fn list_pokemon_handler(
    Extract(state): Extract<Arc<State>>,
    _admin: AdminUser,
    Params(user_id): Params<String>,
) -> Result<Json<Vec<UserPokemon>>, AppError> {
    let user = existing_user(&state, &user_id).await?;

    Ok(Json(state.database.list_pokemon(&user.id).await?))
}

pub async fn assign_pokemon_handler(
    Extract(state): Extract<Arc<State>>,
    _admin: AdminUser,
    Params(user_id): Params<String>,
    Payload(payload): Payload<PokemonAssign>,
) -> Result<Json<UserPokemon>, AppError> {
    let user = existing_user(&state, &user_id).await?;

    let pokemon_name = payload.pokemon_name.trim().to_lowercase();
    if pokemon_name.is_empty() {
        return Err(AppError::MalformedPayload(
            "Nome del Pokémon obbligatorio".to_string(),
        ));
    }

    if state
        .database
        .find_pokemon(&user.id, payload.pokemon_id)
        .await?
        .is_some()
    {
        return Err(AppError::MalformedPayload(
            "Pokémon già assegnato a questo utente".to_string(),
        ));
    }

    let pokemon = UserPokemon {
        id: UserPokemon::key(&user.id, payload.pokemon_id),
        user_id: user.id.clone(),
        pokemon_id: payload.pokemon_id,
        pokemon_name,
        nickname: None,
        level: MIN_LEVEL,
        assigned_at: now(),
    };

    state.database.assign_pokemon(&pokemon).await?;
    info!("Assigned {} to {}", pokemon.pokemon_name, user.username);

    Ok(Json(pokemon))
}

pub async fn remove_pokemon_handler(
    Extract(state): Extract<Arc<State>>,
    _admin: AdminUser,
    Params((user_id, pokemon_id)): Params<(String, u32)>,
) -> Result<Json<Message>, AppError> {
    if !state.database.remove_pokemon(&user_id, pokemon_id).await? {
        return Err(AppError::NotFound("Pokémon non trovato"));
    }

    Ok(Json(Message::new("Pokémon rimosso con successo")))
}

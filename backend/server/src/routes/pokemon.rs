use std::sync::Arc;

use axum::{Json, extract::State as Extract};

use crate::{
    auth::CurrentUser,
    error::AppError,
    extract::{Params, Payload},
    models::{PokemonUpdate, UserPokemon},
    state::State,
    utils::{check_level, clean_nickname},
};

const NOT_OWNED: &str = "Pokémon non trovato";

pub async fn list_handler(
    Extract(state): Extract<Arc<State>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<UserPokemon>>, AppError> {
    Ok(Json(state.database.list_pokemon(&user.id).await?))
}

pub async fn detail_handler(
    Extract(state): Extract<Arc<State>>,
    CurrentUser(user): CurrentUser,
    Params(pokemon_id): Params<u32>,
) -> Result<Json<UserPokemon>, AppError> {
    state
        .database
        .find_pokemon(&user.id, pokemon_id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(NOT_OWNED))
}

/// Applies an update, validating before anything changes.
pub fn apply_update(pokemon: &mut UserPokemon, update: PokemonUpdate) -> Result<(), AppError> {
    if update.nickname.is_none() && update.level.is_none() {
        return Err(AppError::MalformedPayload(
            "Nessun campo da aggiornare".to_string(),
        ));
    }

    let level = update.level.map(check_level).transpose()?;

    if let Some(nickname) = update.nickname {
        pokemon.nickname = clean_nickname(nickname);
    }

    if let Some(level) = level {
        pokemon.level = level;
    }

    Ok(())
}

pub async fn update_handler(
    Extract(state): Extract<Arc<State>>,
    CurrentUser(user): CurrentUser,
    Params(pokemon_id): Params<u32>,
    Payload(update): Payload<PokemonUpdate>,
) -> Result<Json<UserPokemon>, AppError> {
    let mut pokemon = state
        .database
        .find_pokemon(&user.id, pokemon_id)
        .await?
        .ok_or(AppError::NotFound(NOT_OWNED))?;

    apply_update(&mut pokemon, update)?;
    state.database.save_pokemon(&pokemon).await?;

    Ok(Json(pokemon))
}

use std::sync::Arc;

use axum::{Json, extract::State as Extract};
use tracing::info;

use crate::{
    auth::CurrentUser,
    error::AppError,
    extract::{Params, Payload},
    models::{NewsCreate, NewsItem},
    state::State,
    utils::{new_id, now},
};

pub fn default_news() -> NewsItem {
    NewsItem {
        id: new_id(),
        title: "Questionario sulla Personalità".to_string(),
        description: "Scopri quale tipo di allenatore sei! Completa il questionario della Commissione dell'Accademia per ricevere la tua valutazione ufficiale.".to_string(),
        news_type: "questionnaire".to_string(),
        is_active: true,
        created_at: now(),
        size: "hero".to_string(),
    }
}

pub fn new_news(payload: NewsCreate) -> NewsItem {
    NewsItem {
        id: new_id(),
        title: payload.title,
        description: payload.description,
        news_type: payload.news_type,
        is_active: true,
        created_at: now(),
        size: payload.size,
    }
}

/// Active news, seeding the questionnaire announcement on an empty board.
pub async fn list_handler(
    Extract(state): Extract<Arc<State>>,
    _user: CurrentUser,
) -> Result<Json<Vec<NewsItem>>, AppError> {
    let news = state.database.list_news(true).await?;

    if !news.is_empty() {
        return Ok(Json(news));
    }

    let item = default_news();
    state.database.insert_news(&item).await?;
    info!("Seeded default news {}", item.id);

    Ok(Json(vec![item]))
}

pub async fn detail_handler(
    Extract(state): Extract<Arc<State>>,
    _user: CurrentUser,
    Params(news_id): Params<String>,
) -> Result<Json<NewsItem>, AppError> {
    state
        .database
        .find_news(&news_id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Notizia non trovata"))
}

pub async fn create_handler(
    Extract(state): Extract<Arc<State>>,
    _user: CurrentUser,
    Payload(payload): Payload<NewsCreate>,
) -> Result<Json<NewsItem>, AppError> {
    let item = new_news(payload);
    state.database.insert_news(&item).await?;

    Ok(Json(item))
}

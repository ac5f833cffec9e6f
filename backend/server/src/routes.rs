use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};

pub mod admin;
pub mod auth;
pub mod news;
pub mod pokemon;
pub mod quiz;

use crate::state::State;

pub fn api() -> Router<Arc<State>> {
    Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/me", get(auth::me_handler))
        .route("/news", get(news::list_handler).post(news::create_handler))
        .route("/news/{news_id}", get(news::detail_handler))
        .route("/quiz/submit", post(quiz::submit_handler))
        .route("/quiz/history", get(quiz::history_handler))
        .route("/pokemon/my", get(pokemon::list_handler))
        .route(
            "/pokemon/my/{pokemon_id}",
            get(pokemon::detail_handler).put(pokemon::update_handler),
        )
        .nest("/admin", admin::router())
}

pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "Pokémon Academy API" }))
}

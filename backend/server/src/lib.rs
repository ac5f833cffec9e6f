//! Backend of the Pokémon Academy portal.
//!
//! # Overview
//! - Trainers register, log in and read the Academy news board
//! - The personality questionnaire is scored by the [`quiz`] crate, stored, and
//!   mailed to the commission
//! - Admins manage news and assign Pokémon to trainers, who can then nickname
//!   and level them
//!
//! Every route lives under `/api`. Authenticated routes expect
//! `Authorization: Bearer <token>` as issued by `/api/auth/login`.
//!
//!
//!
//! # Storage
//! Documents are JSON values in Redis hashes, one hash per collection. See
//! [`database`] for the layout. `STORE=memory` swaps Redis for a process-local
//! map, handy for running the frontend without any services.
//!
//!
//!
//! # Setup
//!
//! Run against a local Redis.
//! ```sh
//! REDIS_URL=redis://127.0.0.1:6379 RUST_LOG=info cargo run -p academy
//! ```
//!
//! Run without Redis.
//! ```sh
//! STORE=memory RUST_LOG=info cargo run -p academy
//! ```
//!
//! Seed an admin account on startup.
//! ```sh
//! ADMIN_EMAIL=admin@academy.it ADMIN_PASSWORD=Init1234 cargo run -p academy
//! ```
//!
//! Secrets (`JWT_SECRET`, `RESEND_API_KEY`, `ADMIN_PASSWORD`) can also be
//! mounted as `/run/secrets/<NAME>`.
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::get,
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod extract;
pub mod models;
pub mod notify;
pub mod routes;
pub mod state;
pub mod utils;

use config::Config;
use state::State;

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = State::new(config).await?;

    info!("Starting server...");
    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

pub fn build_router(state: Arc<State>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/api", get(routes::root_handler))
        .route("/api/", get(routes::root_handler))
        .nest("/api", routes::api())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(Duration::from_secs(60 * 60));

    if origins.iter().any(|origin| origin == "*") {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| warn!("Ignoring CORS origin {origin}: {e}"))
                .ok()
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(allowed))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

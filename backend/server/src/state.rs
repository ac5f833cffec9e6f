use std::sync::Arc;

use tracing::info;

use super::{
    auth::ensure_admin,
    config::{Config, StoreKind},
    database::{Database, MemoryStore, RedisStore},
    error::AppError,
    notify::Notifier,
};

pub struct State {
    pub config: Config,
    pub database: Database,
    pub notifier: Notifier,
}

impl State {
    pub async fn new(config: Config) -> Result<Arc<Self>, AppError> {
        let database = match config.store {
            StoreKind::Redis => Database::new(RedisStore::connect(&config.redis_url).await?),
            StoreKind::Memory => {
                info!("Using in-memory store, data is lost on shutdown");
                Database::new(MemoryStore::new())
            }
        };

        let state = Self::with_database(config, database);
        ensure_admin(&state).await?;

        Ok(state)
    }

    pub fn with_database(config: Config, database: Database) -> Arc<Self> {
        let notifier = Notifier::new(&config);

        Arc::new(Self {
            config,
            database,
            notifier,
        })
    }
}

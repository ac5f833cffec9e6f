//! # Document Store
//!
//! JSON documents addressed by `(collection, id)`.
//!
//! ## Redis
//!
//! - One hash per collection: `academy:{collection}`
//! - Field is the document id, value is the serialized document
//! - Lookups by id are O(1), listings read the whole hash (`HVALS`)
//! - Collections stay small (users, news, quiz responses, assignments), so
//!   filtering by email or owner happens in process
//!
//! ## Memory
//!
//! Same layout in a process-local map. Used by tests and by `STORE=memory`
//! for local runs without Redis. Nothing survives a restart.
use std::collections::HashMap;

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    error::AppError,
    models::{NEWS, NewsItem, QUIZ_RESPONSES, QuizResponse, USER_POKEMON, USERS, User, UserPokemon},
};

const KEY_PREFIX: &str = "academy";
pub const LIST_LIMIT: usize = 100;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn put(&self, collection: &str, id: &str, document: String) -> Result<(), AppError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<String>, AppError>;

    async fn all(&self, collection: &str) -> Result<Vec<String>, AppError>;

    /// Returns whether a document was removed.
    async fn remove(&self, collection: &str, id: &str) -> Result<bool, AppError>;
}

pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let config = ConnectionManagerConfig::new().set_number_of_retries(1);

        let client = Client::open(redis_url)?;
        let connection = client.get_connection_manager_with_config(config).await?;

        info!("Connected to Redis at {redis_url}");

        Ok(Self { connection })
    }
}

fn hash_key(collection: &str) -> String {
    format!("{KEY_PREFIX}:{collection}")
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn put(&self, collection: &str, id: &str, document: String) -> Result<(), AppError> {
        let mut connection = self.connection.clone();
        let _: () = connection.hset(hash_key(collection), id, document).await?;

        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<String>, AppError> {
        let mut connection = self.connection.clone();

        Ok(connection.hget(hash_key(collection), id).await?)
    }

    async fn all(&self, collection: &str) -> Result<Vec<String>, AppError> {
        let mut connection = self.connection.clone();

        Ok(connection.hvals(hash_key(collection)).await?)
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        let mut connection = self.connection.clone();
        let removed: i64 = connection.hdel(hash_key(collection), id).await?;

        Ok(removed > 0)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(&self, collection: &str, id: &str, document: String) -> Result<(), AppError> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);

        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<String>, AppError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|documents| documents.get(id).cloned()))
    }

    async fn all(&self, collection: &str) -> Result<Vec<String>, AppError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|documents| documents.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        Ok(self
            .collections
            .write()
            .await
            .get_mut(collection)
            .is_some_and(|documents| documents.remove(id).is_some()))
    }
}

/// Typed access to the Academy collections.
pub struct Database {
    store: Box<dyn DocumentStore>,
}

impl Database {
    pub fn new(store: impl DocumentStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    async fn insert<T: Serialize>(&self, collection: &str, id: &str, document: &T) -> Result<(), AppError> {
        self.store
            .put(collection, id, serde_json::to_string(document)?)
            .await
    }

    async fn find<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError> {
        self.store
            .get(collection, id)
            .await?
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(AppError::from)
    }

    async fn load_all<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, AppError> {
        let mut documents = Vec::new();

        for raw in self.store.all(collection).await? {
            match serde_json::from_str(&raw) {
                Ok(document) => documents.push(document),
                Err(e) => warn!("Skipping unreadable {collection} document: {e}"),
            }
        }

        Ok(documents)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .load_all::<User>(USERS)
            .await?
            .into_iter()
            .find(|user| user.email.eq_ignore_ascii_case(email)))
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .load_all::<User>(USERS)
            .await?
            .into_iter()
            .find(|user| user.username == username))
    }

    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        self.find(USERS, id).await
    }

    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        self.insert(USERS, &user.id, user).await
    }

    pub async fn save_user(&self, user: &User) -> Result<(), AppError> {
        self.insert(USERS, &user.id, user).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users = self.load_all::<User>(USERS).await?;
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(users)
    }

    pub async fn list_news(&self, active_only: bool) -> Result<Vec<NewsItem>, AppError> {
        let mut news: Vec<NewsItem> = self
            .load_all::<NewsItem>(NEWS)
            .await?
            .into_iter()
            .filter(|item| !active_only || item.is_active)
            .collect();

        news.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        news.truncate(LIST_LIMIT);

        Ok(news)
    }

    pub async fn find_news(&self, id: &str) -> Result<Option<NewsItem>, AppError> {
        self.find(NEWS, id).await
    }

    pub async fn insert_news(&self, news: &NewsItem) -> Result<(), AppError> {
        self.insert(NEWS, &news.id, news).await
    }

    pub async fn save_news(&self, news: &NewsItem) -> Result<(), AppError> {
        self.insert(NEWS, &news.id, news).await
    }

    pub async fn delete_news(&self, id: &str) -> Result<bool, AppError> {
        self.store.remove(NEWS, id).await
    }

    pub async fn insert_quiz_response(&self, response: &QuizResponse) -> Result<(), AppError> {
        self.insert(QUIZ_RESPONSES, &response.id, response).await
    }

    pub async fn quiz_history(&self, user_id: &str) -> Result<Vec<QuizResponse>, AppError> {
        let mut history: Vec<QuizResponse> = self
            .load_all::<QuizResponse>(QUIZ_RESPONSES)
            .await?
            .into_iter()
            .filter(|response| response.user_id == user_id)
            .collect();

        history.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        history.truncate(LIST_LIMIT);

        Ok(history)
    }

    pub async fn assign_pokemon(&self, pokemon: &UserPokemon) -> Result<(), AppError> {
        self.insert(USER_POKEMON, &pokemon.id, pokemon).await
    }

    pub async fn save_pokemon(&self, pokemon: &UserPokemon) -> Result<(), AppError> {
        self.insert(USER_POKEMON, &pokemon.id, pokemon).await
    }

    pub async fn find_pokemon(&self, user_id: &str, pokemon_id: u32) -> Result<Option<UserPokemon>, AppError> {
        self.find(USER_POKEMON, &UserPokemon::key(user_id, pokemon_id))
            .await
    }

    pub async fn list_pokemon(&self, user_id: &str) -> Result<Vec<UserPokemon>, AppError> {
        let mut pokemon: Vec<UserPokemon> = self
            .load_all::<UserPokemon>(USER_POKEMON)
            .await?
            .into_iter()
            .filter(|pokemon| pokemon.user_id == user_id)
            .collect();

        pokemon.sort_by(|a, b| {
            a.assigned_at
                .cmp(&b.assigned_at)
                .then(a.pokemon_id.cmp(&b.pokemon_id))
        });

        Ok(pokemon)
    }

    pub async fn remove_pokemon(&self, user_id: &str, pokemon_id: u32) -> Result<bool, AppError> {
        self.store
            .remove(USER_POKEMON, &UserPokemon::key(user_id, pokemon_id))
            .await
    }
}

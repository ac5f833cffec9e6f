//! # Documents
//!
//! Records kept in the document store and the payloads exchanged with the
//! frontend.
//!
//! | Collection | Document | Id |
//! |---|---|---|
//! | users | [`User`] | uuid v4 |
//! | news | [`NewsItem`] | uuid v4 |
//! | quiz_responses | [`QuizResponse`] | uuid v4 |
//! | user_pokemon | [`UserPokemon`] | `{user_id}:{pokemon_id}` |
//!
//! Timestamps are RFC 3339 strings in UTC, so they sort lexicographically.
use quiz::{QuizAnswer, QuizResult};
use serde::{Deserialize, Deserializer, Serialize};

pub const USERS: &str = "users";
pub const NEWS: &str = "news";
pub const QUIZ_RESPONSES: &str = "quiz_responses";
pub const USER_POKEMON: &str = "user_pokemon";

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: user.created_at.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UserLogin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub is_admin: Option<bool>,
}

impl TokenResponse {
    pub fn bearer(access_token: String, user: &User) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            user: user.into(),
            is_admin: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub news_type: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: String,
    #[serde(default = "default_size")]
    pub size: String,
}

#[derive(Debug, Deserialize)]
pub struct NewsCreate {
    pub title: String,
    pub description: String,
    pub news_type: String,
    #[serde(default = "default_size")]
    pub size: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub news_type: Option<String>,
    pub size: Option<String>,
    pub is_active: Option<bool>,
}

impl NewsUpdate {
    pub fn apply(self, news: &mut NewsItem) {
        if let Some(title) = self.title {
            news.title = title;
        }
        if let Some(description) = self.description {
            news.description = description;
        }
        if let Some(news_type) = self.news_type {
            news.news_type = news_type;
        }
        if let Some(size) = self.size {
            news.size = size;
        }
        if let Some(is_active) = self.is_active {
            news.is_active = is_active;
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_size() -> String {
    "normal".to_string()
}

#[derive(Debug, Deserialize)]
pub struct QuizSubmit {
    pub answers: Vec<QuizAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResponse {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub answers: Vec<QuizAnswer>,
    pub result: QuizResult,
    pub submitted_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPokemon {
    pub id: String,
    pub user_id: String,
    pub pokemon_id: u32,
    pub pokemon_name: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default = "default_level")]
    pub level: u8,
    pub assigned_at: String,
}

impl UserPokemon {
    pub fn key(user_id: &str, pokemon_id: u32) -> String {
        format!("{user_id}:{pokemon_id}")
    }
}

fn default_level() -> u8 {
    MIN_LEVEL
}

#[derive(Debug, Deserialize)]
pub struct PokemonAssign {
    pub pokemon_id: u32,
    pub pokemon_name: String,
}

/// Partial update of an owned Pokémon.
///
/// `nickname` tells an absent field (`None`) from an explicit `null`
/// (`Some(None)`), which clears it. `level` stays wide so out of range values
/// reach validation instead of failing deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct PokemonUpdate {
    #[serde(default, deserialize_with = "present")]
    pub nickname: Option<Option<String>>,
    pub level: Option<i64>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

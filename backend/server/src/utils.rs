use std::sync::LazyLock;

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{MAX_LEVEL, MIN_LEVEL, UserCreate},
};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern")
});

pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn is_email(input: &str) -> bool {
    EMAIL.is_match(input)
}

/// Trims the registration fields in place and rejects empty or malformed ones.
pub fn sanitize_registration(user: &mut UserCreate) -> Result<(), AppError> {
    user.username = user.username.trim().to_string();
    user.email = user.email.trim().to_string();

    if user.username.is_empty() {
        return Err(AppError::MalformedPayload("Username obbligatorio".to_string()));
    }

    if !is_email(&user.email) {
        return Err(AppError::MalformedPayload("Email non valida".to_string()));
    }

    if user.password.trim().is_empty() {
        return Err(AppError::MalformedPayload("Password obbligatoria".to_string()));
    }

    Ok(())
}

pub fn check_level(level: i64) -> Result<u8, AppError> {
    u8::try_from(level)
        .ok()
        .filter(|level| (MIN_LEVEL..=MAX_LEVEL).contains(level))
        .ok_or_else(|| {
            AppError::MalformedPayload(format!(
                "Il livello deve essere compreso tra {MIN_LEVEL} e {MAX_LEVEL}"
            ))
        })
}

/// Blank nicknames clear the field.
pub fn clean_nickname(nickname: Option<String>) -> Option<String> {
    nickname
        .map(|nickname| nickname.trim().to_string())
        .filter(|nickname| !nickname.is_empty())
}

use std::{env, fmt::Display, fs::read_to_string, ops::RangeInclusive, str::FromStr};

use tracing::{info, warn};

use crate::{error::AppError, notify::RESEND_ENDPOINT};

const DEV_JWT_SECRET: &str = "pokemon-academy-secret-key-2024";
/// Token lifetime bounds, one hour to one year.
const JWT_EXPIRATION_RANGE: RangeInclusive<i64> = 1..=8760;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Redis,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store {other:?}, expected redis or memory")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub store: StoreKind,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
    pub resend_api_key: Option<String>,
    pub resend_url: String,
    pub sender_email: String,
    pub recipient_email: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|key| var(key).or_else(|| read_secret(key)))
    }

    /// Builds the config from any key lookup, environment or not.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set, using the development secret");
            DEV_JWT_SECRET.to_string()
        });

        let jwt_expiration_hours: i64 = try_load(&lookup, "JWT_EXPIRATION_HOURS", "24")?;
        if !JWT_EXPIRATION_RANGE.contains(&jwt_expiration_hours) {
            return Err(AppError::Config(format!(
                "JWT_EXPIRATION_HOURS must be within {}..={}, got {jwt_expiration_hours}",
                JWT_EXPIRATION_RANGE.start(),
                JWT_EXPIRATION_RANGE.end()
            )));
        }

        Ok(Self {
            port: try_load(&lookup, "RUST_PORT", "8001")?,
            store: try_load(&lookup, "STORE", "redis")?,
            redis_url: try_load(&lookup, "REDIS_URL", "redis://127.0.0.1:6379")?,
            jwt_secret,
            jwt_expiration_hours,
            bcrypt_cost: try_load(&lookup, "BCRYPT_COST", "12")?,
            cors_origins: try_load::<String>(&lookup, "CORS_ORIGINS", "*")?
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            resend_api_key: lookup("RESEND_API_KEY").filter(|key| !key.is_empty()),
            resend_url: try_load(&lookup, "RESEND_URL", RESEND_ENDPOINT)?,
            sender_email: try_load(&lookup, "SENDER_EMAIL", "onboarding@resend.dev")?,
            recipient_email: try_load(&lookup, "RECIPIENT_EMAIL", "test@gmail.com")?,
            admin_email: lookup("ADMIN_EMAIL"),
            admin_password: lookup("ADMIN_PASSWORD"),
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string())
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, AppError>
where
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            AppError::Config(format!("invalid {key}: {e}"))
        })
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path).ok().map(|s| s.trim().to_string())
}

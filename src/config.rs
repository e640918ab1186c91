use std::env;
use std::net::SocketAddr;

use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite://daily.db";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:3000";

#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

/// Which key-value store backs the view counter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CounterBackend {
    Redis(String),
    KvRest { url: String, token: String },
    Disabled,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub supabase: Option<SupabaseConfig>,
    pub database_url: String,
    pub public_base_url: String,
    pub counter: CounterBackend,
    pub production: bool,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let supabase = match (var("SUPABASE_URL"), var("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(SupabaseConfig {
                url: url.trim_end_matches('/').to_string(),
                anon_key,
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(AppError::BadRequest("SUPABASE_ANON_KEY is not set".to_string()));
            }
            (None, Some(_)) => {
                return Err(AppError::BadRequest("SUPABASE_URL is not set".to_string()));
            }
        };

        let counter = select_counter_backend(
            var("REDIS_URL"),
            var("KV_REST_API_URL"),
            var("KV_REST_API_TOKEN"),
        );

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::BadRequest(format!("BIND_ADDR is invalid: {}", e)))?;

        Ok(Self {
            supabase,
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            public_base_url: var("PUBLIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            counter,
            production: var("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production")),
            bind_addr,
        })
    }
}

/// A Redis connection string wins over the REST pair; anything else disables counting.
fn select_counter_backend(
    redis_url: Option<String>,
    kv_url: Option<String>,
    kv_token: Option<String>,
) -> CounterBackend {
    if let Some(url) = redis_url.filter(|u| u.starts_with("redis://") || u.starts_with("rediss://")) {
        return CounterBackend::Redis(url);
    }
    match (kv_url, kv_token) {
        (Some(url), Some(token)) => CounterBackend::KvRest {
            url: url.trim_end_matches('/').to_string(),
            token,
        },
        _ => CounterBackend::Disabled,
    }
}

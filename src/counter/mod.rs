pub mod kv_rest;
pub mod redis_store;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::CounterBackend;
use crate::error::AppError;

pub use kv_rest::KvRestCounterStore;
pub use redis_store::RedisCounterStore;

/// A remote integer counter keyed by string.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Current value, `None` when the key has never been set.
    async fn get(&self, key: &str) -> Result<Option<i64>, AppError>;
    /// Atomically adds one, starting from zero, and returns the new value.
    async fn increment(&self, key: &str) -> Result<i64, AppError>;
}

pub fn from_config(backend: &CounterBackend) -> Result<Option<Arc<dyn CounterStore>>, AppError> {
    let store: Arc<dyn CounterStore> = match backend {
        CounterBackend::Redis(url) => Arc::new(RedisCounterStore::new(url)?),
        CounterBackend::KvRest { url, token } => Arc::new(KvRestCounterStore::new(url, token)?),
        CounterBackend::Disabled => return Ok(None),
    };
    Ok(Some(store))
}

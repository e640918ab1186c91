use async_trait::async_trait;
use redis::AsyncCommands;

use crate::counter::CounterStore;
use crate::error::AppError;

/// Counter backed by a Redis-protocol server; opens one connection per call.
pub struct RedisCounterStore {
    client: redis::Client,
}

impl RedisCounterStore {
    pub fn new(url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(url)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<i64> = conn.get(key).await?;
        Ok(value)
    }

    async fn increment(&self, key: &str) -> Result<i64, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: i64 = conn.incr(key, 1).await?;
        Ok(value)
    }
}

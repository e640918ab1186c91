use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::counter::CounterStore;
use crate::error::AppError;

/// Counter backed by a managed KV store's REST interface (`/get`, `/incr`).
pub struct KvRestCounterStore {
    client: Client,
    url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct KvResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

impl KvRestCounterStore {
    pub fn new(url: &str, token: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::InternalServerError(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn command(&self, command: &str, key: &str) -> Result<Value, AppError> {
        let url = format!("{}/{}/{}", self.url, command, urlencoding::encode(key));
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!("KV {} error {}: {}", command, status, body)));
        }

        let body: KvResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(AppError::Remote(format!("KV {} error: {}", command, error)));
        }
        Ok(body.result)
    }
}

/// Values come back as JSON numbers or as numeric strings.
fn parse_count(value: &Value) -> Result<Option<i64>, AppError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| AppError::Remote(format!("counter is not an integer: {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::Remote(format!("counter is not an integer: {}", s))),
        other => Err(AppError::Remote(format!("unexpected counter value: {}", other))),
    }
}

#[async_trait]
impl CounterStore for KvRestCounterStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, AppError> {
        let value = self.command("get", key).await?;
        parse_count(&value)
    }

    async fn increment(&self, key: &str) -> Result<i64, AppError> {
        let value = self.command("incr", key).await?;
        parse_count(&value)?
            .ok_or_else(|| AppError::Remote("incr returned no value".to_string()))
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::error::AppError;

const FALLBACK: &str = "—";

#[async_trait]
pub trait ViewCountSource: Send + Sync {
    /// Never fails; an unavailable count reads as zero.
    async fn view_count(&self, slug: &str) -> u64;
}

/// Asks a running server for the count, keeping its cookies like a browser would.
pub struct HttpViewCountSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ViewCountBody {
    count: u64,
}

impl HttpViewCountSource {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| AppError::InternalServerError(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, slug: &str) -> Result<u64, AppError> {
        let url = format!("{}/api/views/{}", self.base_url, urlencoding::encode(slug));
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Remote(format!("view count returned {}", response.status())));
        }
        Ok(response.json::<ViewCountBody>().await?.count)
    }
}

#[async_trait]
impl ViewCountSource for HttpViewCountSource {
    async fn view_count(&self, slug: &str) -> u64 {
        self.fetch(slug).await.unwrap_or_else(|e| {
            warn!("fetching view count for {} failed: {}", slug, e);
            0
        })
    }
}

/// The page-view figure in the header. Requests the count at most once per mount.
pub struct ViewBadge {
    slug: String,
    count: Option<u64>,
    requested: bool,
}

impl ViewBadge {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            count: None,
            requested: false,
        }
    }

    pub fn count(&self) -> Option<u64> {
        self.count
    }

    pub async fn mount(&mut self, source: &dyn ViewCountSource) {
        if self.requested {
            return;
        }
        self.requested = true;
        self.count = Some(source.view_count(&self.slug).await);
    }

    pub fn display(&self) -> String {
        self.count
            .map(group_thousands)
            .unwrap_or_else(|| FALLBACK.to_string())
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

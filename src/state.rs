use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::counter;
use crate::db::{self, LocalBackend};
use crate::error::AppError;
use crate::services::ViewCounter;
use crate::supabase::{NoteRepository, ObjectStorage, SupabaseHttpClient};

#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<dyn NoteRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub views: ViewCounter,
}

impl AppState {
    /// Wires the hosted backend when it is configured, the local SQLite store otherwise.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let (notes, storage): (Arc<dyn NoteRepository>, Arc<dyn ObjectStorage>) =
            match &config.supabase {
                Some(supabase) => {
                    info!("using hosted backend at {}", supabase.url);
                    let client = Arc::new(SupabaseHttpClient::new(supabase.clone())?);
                    (client.clone(), client)
                }
                None => {
                    info!("using local backend at {}", config.database_url);
                    let pool = db::connect(&config.database_url).await?;
                    let local = Arc::new(LocalBackend::new(pool, config.public_base_url.clone()));
                    (local.clone(), local)
                }
            };

        let store = counter::from_config(&config.counter).unwrap_or_else(|e| {
            warn!("view counter disabled: {}", e);
            None
        });
        if store.is_none() {
            info!("no counter store configured, view counts read as 0");
        }

        Ok(Self {
            notes,
            storage,
            views: ViewCounter::new(store, config.production),
        })
    }
}

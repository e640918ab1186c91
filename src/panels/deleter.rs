use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::AppError;
use crate::services::delete_note;
use crate::supabase::{NoteRepository, ObjectStorage};

/// How the notes panel asks the server to delete a note.
#[async_trait]
pub trait NoteDeleter: Send + Sync {
    async fn delete_note(&self, id: &str) -> Result<(), AppError>;
}

/// Calls `DELETE /api/notes/{id}` on a running server.
pub struct HttpNoteDeleter {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl HttpNoteDeleter {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::InternalServerError(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl NoteDeleter for HttpNoteDeleter {
    async fn delete_note(&self, id: &str) -> Result<(), AppError> {
        let url = format!("{}/api/notes/{}", self.base_url, urlencoding::encode(id));
        let response = self.client.delete(&url).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| super::notes::DELETE_FAILED.to_string());

        Err(match status {
            StatusCode::BAD_REQUEST => AppError::BadRequest(message),
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            _ => AppError::InternalServerError(message),
        })
    }
}

/// Runs the deletion in-process against the same backend the server uses.
pub struct DirectNoteDeleter {
    notes: Arc<dyn NoteRepository>,
    storage: Arc<dyn ObjectStorage>,
}

impl DirectNoteDeleter {
    pub fn new(notes: Arc<dyn NoteRepository>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { notes, storage }
    }
}

#[async_trait]
impl NoteDeleter for DirectNoteDeleter {
    async fn delete_note(&self, id: &str) -> Result<(), AppError> {
        delete_note(self.notes.as_ref(), self.storage.as_ref(), id).await
    }
}

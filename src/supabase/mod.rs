pub mod dto;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, header::CONTENT_TYPE};

use crate::config::SupabaseConfig;
use crate::error::AppError;
use crate::models::{NewNote, NewTodo, Note, Todo};

/// Storage bucket holding uploaded note files.
pub const NOTES_BUCKET: &str = "notes";

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Todos for one calendar day, oldest first.
    async fn list_todos_for_day(&self, day: NaiveDate) -> Result<Vec<Todo>, AppError>;
    async fn insert_todo(&self, todo: NewTodo) -> Result<Todo, AppError>;
    async fn set_todo_complete(&self, id: &str, is_complete: bool) -> Result<(), AppError>;
    async fn delete_todo(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// All notes, newest first.
    async fn list_notes(&self) -> Result<Vec<Note>, AppError>;
    async fn find_note_file_url(&self, id: &str) -> Result<Option<String>, AppError>;
    async fn insert_note(&self, note: NewNote) -> Result<Note, AppError>;
    async fn delete_note(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores a new object; fails if the key is already taken.
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AppError>;
    fn public_url(&self, key: &str) -> String;
    async fn remove(&self, keys: &[String]) -> Result<(), AppError>;
    async fn fetch_text(&self, public_url: &str) -> Result<String, AppError>;
    async fn download(&self, key: &str) -> Result<Option<StoredObject>, AppError>;
}

pub struct SupabaseHttpClient {
    client: Client,
    config: SupabaseConfig,
}

impl SupabaseHttpClient {
    pub fn new(config: SupabaseConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::InternalServerError(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn table_url(&self, table: &str, query: &str) -> String {
        format!("{}/rest/v1/{}?{}", self.config.url, table, query)
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.url,
            NOTES_BUCKET,
            urlencoding::encode(key)
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", self.config.anon_key))
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response, AppError> {
        let response = self.authorized(builder).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!("{} failed with {}: {}", what, status, body)));
        }
        Ok(response)
    }

    async fn insert_row<T, R>(&self, table: &str, row: &T) -> Result<R, AppError>
    where
        T: serde::Serialize + Sync,
        R: serde::de::DeserializeOwned + Send,
    {
        let request = self
            .client
            .post(self.table_url(table, "select=*"))
            .header("Prefer", "return=representation")
            .json(&[row]);
        let rows: Vec<R> = self
            .send(request, &format!("insert into {}", table))
            .await?
            .json()
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::Remote(format!("insert into {} returned no row", table)))
    }
}

#[async_trait]
impl TodoRepository for SupabaseHttpClient {
    async fn list_todos_for_day(&self, day: NaiveDate) -> Result<Vec<Todo>, AppError> {
        let url = self.table_url(
            "todos",
            &format!("select=*&day=eq.{}&order=created_at.asc", day.format("%Y-%m-%d")),
        );
        let todos = self
            .send(self.client.get(url), "list todos")
            .await?
            .json::<Vec<Todo>>()
            .await?;
        tracing::debug!("fetched {} todos for {}", todos.len(), day);
        Ok(todos)
    }

    async fn insert_todo(&self, todo: NewTodo) -> Result<Todo, AppError> {
        self.insert_row("todos", &todo).await
    }

    async fn set_todo_complete(&self, id: &str, is_complete: bool) -> Result<(), AppError> {
        let url = self.table_url("todos", &format!("id=eq.{}", urlencoding::encode(id)));
        let request = self
            .client
            .patch(url)
            .json(&dto::SetCompleteRequest { is_complete });
        self.send(request, "update todo").await?;
        Ok(())
    }

    async fn delete_todo(&self, id: &str) -> Result<(), AppError> {
        let url = self.table_url("todos", &format!("id=eq.{}", urlencoding::encode(id)));
        self.send(self.client.delete(url), "delete todo").await?;
        Ok(())
    }
}

#[async_trait]
impl NoteRepository for SupabaseHttpClient {
    async fn list_notes(&self) -> Result<Vec<Note>, AppError> {
        let url = self.table_url("notes", "select=*&order=created_at.desc");
        let notes = self
            .send(self.client.get(url), "list notes")
            .await?
            .json::<Vec<Note>>()
            .await?;
        Ok(notes)
    }

    async fn find_note_file_url(&self, id: &str) -> Result<Option<String>, AppError> {
        let url = self.table_url(
            "notes",
            &format!("select=file_url&id=eq.{}", urlencoding::encode(id)),
        );
        let rows = self
            .send(self.client.get(url), "find note")
            .await?
            .json::<Vec<dto::FileUrlRow>>()
            .await?;
        Ok(rows.into_iter().next().map(|row| row.file_url))
    }

    async fn insert_note(&self, note: NewNote) -> Result<Note, AppError> {
        self.insert_row("notes", &note).await
    }

    async fn delete_note(&self, id: &str) -> Result<(), AppError> {
        let url = self.table_url("notes", &format!("id=eq.{}", urlencoding::encode(id)));
        self.send(self.client.delete(url), "delete note").await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for SupabaseHttpClient {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        let request = self
            .client
            .post(self.object_url(key))
            .header(CONTENT_TYPE, content_type)
            .header("cache-control", "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes);
        self.send(request, "upload object").await?;
        tracing::info!("uploaded {}/{}", NOTES_BUCKET, key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.url,
            NOTES_BUCKET,
            urlencoding::encode(key)
        )
    }

    async fn remove(&self, keys: &[String]) -> Result<(), AppError> {
        let url = format!("{}/storage/v1/object/{}", self.config.url, NOTES_BUCKET);
        let request = self
            .client
            .delete(url)
            .json(&dto::RemoveObjectsRequest { prefixes: keys });
        self.send(request, "remove objects").await?;
        Ok(())
    }

    async fn fetch_text(&self, public_url: &str) -> Result<String, AppError> {
        let response = self.client.get(public_url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Remote(format!(
                "fetching {} failed with {}",
                public_url,
                response.status()
            )));
        }
        Ok(response.text().await?)
    }

    async fn download(&self, key: &str) -> Result<Option<StoredObject>, AppError> {
        let response = self.client.get(self.public_url(key)).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AppError::Remote(format!(
                "download of {} failed with {}",
                key,
                response.status()
            )));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        Ok(Some(StoredObject { bytes, content_type }))
    }
}

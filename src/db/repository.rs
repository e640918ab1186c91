use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewNote, NewTodo, Note, Todo};
use crate::services::notes::storage_key_from_url;
use crate::supabase::{NOTES_BUCKET, NoteRepository, ObjectStorage, StoredObject, TodoRepository};

/// SQLite stand-in for the hosted tables and the `notes` bucket.
#[derive(Clone)]
pub struct LocalBackend {
    db: SqlitePool,
    public_base_url: String,
}

impl LocalBackend {
    pub fn new(db: SqlitePool, public_base_url: impl Into<String>) -> Self {
        Self {
            db,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    async fn find_todo_by_id(&self, id: &str) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(
            "SELECT id, title, is_complete, day, created_at FROM todos WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    async fn find_note_by_id(&self, id: &str) -> Result<Option<Note>, sqlx::Error> {
        sqlx::query_as::<_, Note>(
            "SELECT id, title, file_url, file_name, created_at FROM notes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }
}

#[async_trait]
impl TodoRepository for LocalBackend {
    async fn list_todos_for_day(&self, day: NaiveDate) -> Result<Vec<Todo>, AppError> {
        let todos = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, title, is_complete, day, created_at
            FROM todos
            WHERE day = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(day)
        .fetch_all(&self.db)
        .await?;
        Ok(todos)
    }

    async fn insert_todo(&self, todo: NewTodo) -> Result<Todo, AppError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO todos (id, title, is_complete, day, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&id)
        .bind(&todo.title)
        .bind(todo.is_complete)
        .bind(todo.day)
        .bind(now)
        .execute(&self.db)
        .await?;

        self.find_todo_by_id(&id)
            .await?
            .ok_or_else(|| AppError::Database(sqlx::Error::RowNotFound))
    }

    async fn set_todo_complete(&self, id: &str, is_complete: bool) -> Result<(), AppError> {
        sqlx::query("UPDATE todos SET is_complete = ?1 WHERE id = ?2")
            .bind(is_complete)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_todo(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl NoteRepository for LocalBackend {
    async fn list_notes(&self) -> Result<Vec<Note>, AppError> {
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, title, file_url, file_name, created_at
            FROM notes
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(notes)
    }

    async fn find_note_file_url(&self, id: &str) -> Result<Option<String>, AppError> {
        let url = sqlx::query_scalar::<_, String>("SELECT file_url FROM notes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(url)
    }

    async fn insert_note(&self, note: NewNote) -> Result<Note, AppError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO notes (id, title, file_url, file_name, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&id)
        .bind(&note.title)
        .bind(&note.file_url)
        .bind(&note.file_name)
        .bind(now)
        .execute(&self.db)
        .await?;

        self.find_note_by_id(&id)
            .await?
            .ok_or_else(|| AppError::Database(sqlx::Error::RowNotFound))
    }

    async fn delete_note(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for LocalBackend {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO objects (key, content_type, bytes, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(content_type)
        .bind(bytes)
        .bind(Utc::now())
        .execute(&self.db)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Err(AppError::Remote(format!("object {} already exists", key)));
        }
        tracing::info!("stored {}/{}", NOTES_BUCKET, key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_base_url,
            NOTES_BUCKET,
            urlencoding::encode(key)
        )
    }

    async fn remove(&self, keys: &[String]) -> Result<(), AppError> {
        for key in keys {
            sqlx::query("DELETE FROM objects WHERE key = ?")
                .bind(key)
                .execute(&self.db)
                .await?;
        }
        Ok(())
    }

    async fn fetch_text(&self, public_url: &str) -> Result<String, AppError> {
        let key = public_url
            .strip_prefix(&self.public_base_url)
            .and_then(storage_key_from_url)
            .ok_or_else(|| AppError::Remote(format!("{} is not a local object", public_url)))?;

        let object = self
            .download(&key)
            .await?
            .ok_or_else(|| AppError::Remote(format!("object {} not found", key)))?;

        String::from_utf8(object.bytes)
            .map_err(|_| AppError::Remote(format!("object {} is not valid UTF-8", key)))
    }

    async fn download(&self, key: &str) -> Result<Option<StoredObject>, AppError> {
        let row = sqlx::query_as::<_, (Vec<u8>, String)>(
            "SELECT bytes, content_type FROM objects WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(|(bytes, content_type)| StoredObject { bytes, content_type }))
    }
}

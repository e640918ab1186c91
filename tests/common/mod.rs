#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use daily::db::{self, LocalBackend};
use daily::error::AppError;
use daily::models::{NewNote, NewTodo, Note, Todo};
use daily::supabase::{NoteRepository, ObjectStorage, StoredObject, TodoRepository};

pub const BASE_URL: &str = "http://localhost:3000";

pub async fn local_backend() -> Arc<LocalBackend> {
    let pool = db::connect("sqlite::memory:")
        .await
        .expect("Failed to create database");
    Arc::new(LocalBackend::new(pool, BASE_URL))
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Switches that make the wrapped backend reject individual calls.
#[derive(Default)]
pub struct Faults {
    pub list: AtomicBool,
    pub insert: AtomicBool,
    pub update: AtomicBool,
    pub delete: AtomicBool,
    pub find: AtomicBool,
    pub upload: AtomicBool,
    pub remove: AtomicBool,
    pub fetch: AtomicBool,
}

fn check(flag: &AtomicBool, what: &str) -> Result<(), AppError> {
    if flag.load(Ordering::SeqCst) {
        Err(AppError::Remote(format!("{} rejected", what)))
    } else {
        Ok(())
    }
}

/// Local backend wrapper that can fail on demand and counts every remote call.
pub struct FlakyBackend {
    pub inner: Arc<LocalBackend>,
    pub faults: Faults,
    pub calls: AtomicUsize,
}

impl FlakyBackend {
    pub async fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: local_backend().await,
            faults: Faults::default(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn fail(flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TodoRepository for FlakyBackend {
    async fn list_todos_for_day(&self, day: NaiveDate) -> Result<Vec<Todo>, AppError> {
        self.hit();
        check(&self.faults.list, "list todos")?;
        self.inner.list_todos_for_day(day).await
    }

    async fn insert_todo(&self, todo: NewTodo) -> Result<Todo, AppError> {
        self.hit();
        check(&self.faults.insert, "insert todo")?;
        self.inner.insert_todo(todo).await
    }

    async fn set_todo_complete(&self, id: &str, is_complete: bool) -> Result<(), AppError> {
        self.hit();
        check(&self.faults.update, "update todo")?;
        self.inner.set_todo_complete(id, is_complete).await
    }

    async fn delete_todo(&self, id: &str) -> Result<(), AppError> {
        self.hit();
        check(&self.faults.delete, "delete todo")?;
        self.inner.delete_todo(id).await
    }
}

#[async_trait]
impl NoteRepository for FlakyBackend {
    async fn list_notes(&self) -> Result<Vec<Note>, AppError> {
        self.hit();
        check(&self.faults.list, "list notes")?;
        self.inner.list_notes().await
    }

    async fn find_note_file_url(&self, id: &str) -> Result<Option<String>, AppError> {
        self.hit();
        check(&self.faults.find, "find note")?;
        self.inner.find_note_file_url(id).await
    }

    async fn insert_note(&self, note: NewNote) -> Result<Note, AppError> {
        self.hit();
        check(&self.faults.insert, "insert note")?;
        self.inner.insert_note(note).await
    }

    async fn delete_note(&self, id: &str) -> Result<(), AppError> {
        self.hit();
        check(&self.faults.delete, "delete note")?;
        self.inner.delete_note(id).await
    }
}

#[async_trait]
impl ObjectStorage for FlakyBackend {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        self.hit();
        check(&self.faults.upload, "upload")?;
        self.inner.upload(key, bytes, content_type).await
    }

    fn public_url(&self, key: &str) -> String {
        self.inner.public_url(key)
    }

    async fn remove(&self, keys: &[String]) -> Result<(), AppError> {
        self.hit();
        check(&self.faults.remove, "remove")?;
        self.inner.remove(keys).await
    }

    async fn fetch_text(&self, public_url: &str) -> Result<String, AppError> {
        self.hit();
        check(&self.faults.fetch, "fetch")?;
        self.inner.fetch_text(public_url).await
    }

    async fn download(&self, key: &str) -> Result<Option<StoredObject>, AppError> {
        self.hit();
        self.inner.download(key).await
    }
}

/// Counts rows in the local tables.
pub async fn count_rows(backend: &LocalBackend, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(backend.pool())
        .await
        .expect("count rows")
}

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{}", addr)
}

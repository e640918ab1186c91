use axum::Json;
use axum::extract::Path;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::delete;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use axum_extra::extract::CookieJar;
use serde::Serialize;

use crate::demo::{DemoPage, demo_page};
use crate::error::AppError;
use crate::services::delete_note;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DeleteNoteResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ViewCountResponse {
    pub count: u64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/notes/{id}", delete(delete_note_handler))
        .route("/api/views/{slug}", get(view_count))
        .route("/api/demo", get(demo))
        .route("/notes/{*key}", get(download_object))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn delete_note_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteNoteResponse>, AppError> {
    delete_note(state.notes.as_ref(), state.storage.as_ref(), &id).await?;
    Ok(Json(DeleteNoteResponse { success: true }))
}

async fn view_count(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    jar: CookieJar,
) -> (CookieJar, Json<ViewCountResponse>) {
    let (jar, count) = state.views.get_and_increment(&slug, jar).await;
    (jar, Json(ViewCountResponse { count }))
}

async fn demo() -> Json<DemoPage> {
    Json(demo_page())
}

async fn download_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let object = state
        .storage
        .download(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No stored file named {}", key)))?;

    let headers = [
        (header::CONTENT_TYPE, object.content_type),
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
    ];
    Ok((headers, object.bytes).into_response())
}

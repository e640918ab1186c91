use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::{error, warn};

use crate::error::AppError;
use crate::markdown::{LOAD_FAILED_PLACEHOLDER, render_markdown};
use crate::models::{NewNote, Note};
use crate::panels::deleter::NoteDeleter;
use crate::panels::optimistic::apply_with_rollback;
use crate::supabase::{NoteRepository, ObjectStorage};

pub const LOAD_FAILED: &str = "Failed to load notes, please try again later.";
pub const UNSUPPORTED_FILE: &str = "Only PDF or Markdown files are supported.";
pub const MISSING_FIELDS: &str = "Choose a file and enter a note title.";
pub const UPLOAD_FAILED: &str = "File upload failed, please try again later.";
pub const SAVE_FAILED: &str = "Saving the note failed, please try again later.";
pub const DELETE_FAILED: &str = "Delete failed, please try again later.";

const ALLOWED_MIME_TYPES: &[&str] = &["application/pdf", "text/markdown", "text/x-markdown"];
const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".md", ".markdown"];
const MARKDOWN_EXTENSIONS: &[&str] = &[".md", ".markdown"];
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"];
const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 6;

/// A file picked by the user, not yet uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn is_supported(&self) -> bool {
        ALLOWED_MIME_TYPES.contains(&self.mime_type.as_str())
            || extension(&self.name)
                .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
    }

    fn kind(&self) -> NoteKind {
        match note_kind(&self.name) {
            kind @ (NoteKind::Markdown | NoteKind::Pdf) => kind,
            _ => match self.mime_type.as_str() {
                "application/pdf" => NoteKind::Pdf,
                "text/markdown" | "text/x-markdown" => NoteKind::Markdown,
                _ => NoteKind::Other,
            },
        }
    }

    /// The type the object is stored and served with. Never the browser's claim verbatim.
    pub fn content_type(&self) -> &'static str {
        match self.kind() {
            NoteKind::Markdown => "text/markdown",
            NoteKind::Pdf => "application/pdf",
            _ => "application/octet-stream",
        }
    }

    /// Extension for the storage key, derived from the type when the name has none we accept.
    pub fn key_extension(&self) -> &str {
        extension(&self.name)
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(match self.kind() {
                NoteKind::Markdown => ".md",
                NoteKind::Pdf => ".pdf",
                _ => "",
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Markdown,
    Pdf,
    Image,
    Other,
}

pub fn note_kind(file_name: &str) -> NoteKind {
    let lower = file_name.to_lowercase();
    if MARKDOWN_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        NoteKind::Markdown
    } else if lower.ends_with(".pdf") {
        NoteKind::Pdf
    } else if IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        NoteKind::Image
    } else {
        NoteKind::Other
    }
}

fn extension(file_name: &str) -> Option<&str> {
    file_name.rfind('.').map(|i| &file_name[i..])
}

/// Storage key for an upload: millisecond timestamp, random suffix, extension.
pub fn object_key(extension: &str, timestamp_millis: i64, suffix: &str) -> String {
    format!("{}_{}{}", timestamp_millis, suffix, extension)
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

/// What opening a note did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenedNote {
    /// The URL should be opened in a new browsing context.
    External(String),
    /// The note is now shown in the preview.
    Preview,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownPreview {
    pub title: String,
    pub source: String,
    pub html: String,
}

/// The personal notes list, upload form and Markdown preview.
pub struct NotesPanel {
    notes_repo: Arc<dyn NoteRepository>,
    storage: Arc<dyn ObjectStorage>,
    deleter: Arc<dyn NoteDeleter>,
    notes: Vec<Note>,
    title: String,
    selected: Option<SelectedFile>,
    error: Option<String>,
    is_loading: bool,
    is_uploading: bool,
    preview: Option<MarkdownPreview>,
}

impl NotesPanel {
    pub fn new(
        notes_repo: Arc<dyn NoteRepository>,
        storage: Arc<dyn ObjectStorage>,
        deleter: Arc<dyn NoteDeleter>,
    ) -> Self {
        Self {
            notes_repo,
            storage,
            deleter,
            notes: Vec::new(),
            title: String::new(),
            selected: None,
            error: None,
            is_loading: true,
            is_uploading: false,
            preview: None,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, value: impl Into<String>) {
        self.title = value.into();
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_uploading(&self) -> bool {
        self.is_uploading
    }

    pub fn can_upload(&self) -> bool {
        !self.is_uploading && self.selected.is_some() && !self.title.trim().is_empty()
    }

    pub fn preview(&self) -> Option<&MarkdownPreview> {
        self.preview.as_ref()
    }

    pub async fn load(&mut self) {
        self.is_loading = true;
        self.error = None;

        match self.notes_repo.list_notes().await {
            Ok(notes) => self.notes = notes,
            Err(e) => {
                error!("loading notes failed: {}", e);
                self.error = Some(LOAD_FAILED.to_string());
            }
        }

        self.is_loading = false;
    }

    /// Stages `file` for upload if it is a PDF or Markdown file.
    pub fn select_file(&mut self, file: SelectedFile) -> bool {
        if file.is_supported() {
            self.selected = Some(file);
            self.error = None;
            true
        } else {
            self.selected = None;
            self.error = Some(UNSUPPORTED_FILE.to_string());
            false
        }
    }

    pub async fn upload(&mut self) {
        let title = self.title.trim().to_string();
        let Some(file) = self.selected.as_ref().filter(|_| !title.is_empty()) else {
            self.error = Some(MISSING_FIELDS.to_string());
            return;
        };

        self.is_uploading = true;
        self.error = None;

        let key = object_key(file.key_extension(), Utc::now().timestamp_millis(), &random_suffix());
        let file_name = file.name.clone();

        if let Err(e) = self
            .storage
            .upload(&key, file.bytes.clone(), file.content_type())
            .await
        {
            error!("uploading {} failed: {}", file_name, e);
            self.error = Some(UPLOAD_FAILED.to_string());
            self.is_uploading = false;
            return;
        }

        let new_note = NewNote {
            title,
            file_url: self.storage.public_url(&key),
            file_name,
        };

        match self.notes_repo.insert_note(new_note).await {
            Ok(note) => {
                self.notes.insert(0, note);
                self.title.clear();
                self.selected = None;
            }
            Err(e) => {
                error!("saving note metadata failed: {}", e);
                self.error = Some(SAVE_FAILED.to_string());
                if let Err(e) = self.storage.remove(&[key.clone()]).await {
                    warn!("could not remove orphaned upload {}: {}", key, e);
                }
            }
        }

        self.is_uploading = false;
    }

    /// Opens Markdown notes in the preview; everything else opens externally.
    pub async fn open(&mut self, note: &Note) -> OpenedNote {
        if note_kind(&note.file_name) != NoteKind::Markdown {
            return OpenedNote::External(note.file_url.clone());
        }

        let source = match self.storage.fetch_text(&note.file_url).await {
            Ok(text) => text,
            Err(e) => {
                error!("fetching markdown for note {} failed: {}", note.id, e);
                LOAD_FAILED_PLACEHOLDER.to_string()
            }
        };

        self.preview = Some(MarkdownPreview {
            title: note.title.clone(),
            html: render_markdown(&source),
            source,
        });
        OpenedNote::Preview
    }

    pub fn close_preview(&mut self) {
        self.preview = None;
    }

    /// Deletes a note after `confirm` agrees, restoring the list if the server refuses.
    pub async fn delete<F>(&mut self, id: &str, confirm: F)
    where
        F: FnOnce(&Note) -> bool,
    {
        let Some(note) = self.notes.iter().find(|n| n.id == id) else {
            return;
        };
        if !confirm(note) {
            return;
        }

        self.error = None;

        let result = apply_with_rollback(
            &mut self.notes,
            |notes| notes.retain(|n| n.id != id),
            self.deleter.delete_note(id),
        )
        .await;

        if let Err(e) = result {
            error!("deleting note {} failed: {}", id, e);
            self.error = Some(user_message(e));
        }
    }
}

/// The server's own message where there is one, otherwise a generic line.
fn user_message(e: AppError) -> String {
    match e {
        AppError::BadRequest(msg)
        | AppError::NotFound(msg)
        | AppError::InternalServerError(msg)
        | AppError::Validation(msg) => msg,
        _ => DELETE_FAILED.to_string(),
    }
}

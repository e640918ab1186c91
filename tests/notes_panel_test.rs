mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use daily::error::AppError;
use daily::markdown::LOAD_FAILED_PLACEHOLDER;
use daily::models::NewNote;
use daily::panels::notes::{DELETE_FAILED, MISSING_FIELDS, SAVE_FAILED, UNSUPPORTED_FILE, UPLOAD_FAILED};
use daily::panels::{DirectNoteDeleter, NoteDeleter, NotesPanel, OpenedNote, SelectedFile};
use daily::supabase::{NoteRepository, ObjectStorage};

use common::{FlakyBackend, count_rows};

fn panel_for(backend: &Arc<FlakyBackend>) -> NotesPanel {
    let deleter = Arc::new(DirectNoteDeleter::new(backend.clone(), backend.clone()));
    NotesPanel::new(backend.clone(), backend.clone(), deleter)
}

fn markdown_file(name: &str, text: &str) -> SelectedFile {
    SelectedFile::new(name, "text/markdown", text.as_bytes().to_vec())
}

struct RefusingDeleter(Option<AppError>);

#[async_trait]
impl NoteDeleter for RefusingDeleter {
    async fn delete_note(&self, _id: &str) -> Result<(), AppError> {
        Err(match &self.0 {
            Some(AppError::NotFound(msg)) => AppError::NotFound(msg.clone()),
            _ => AppError::Remote("network unreachable".to_string()),
        })
    }
}

#[tokio::test]
async fn upload_and_preview_markdown_note() {
    let backend = FlakyBackend::new().await;
    let mut panel = panel_for(&backend);
    panel.load().await;

    panel.set_title("Ideas");
    assert!(panel.select_file(markdown_file(
        "notes.md",
        "# Ideas\n\n![diagram](./diagram.png)\n\n![logo](https://example.com/logo.png)",
    )));
    assert!(panel.can_upload());
    panel.upload().await;

    assert!(panel.error().is_none());
    assert_eq!(panel.notes().len(), 1);
    let note = panel.notes()[0].clone();
    assert_eq!(note.title, "Ideas");
    assert_eq!(note.file_name, "notes.md");
    assert_eq!(note.created_on(), Local::now().format("%Y-%m-%d").to_string());
    assert!(note.file_url.starts_with("http://localhost:3000/notes/"));
    assert!(note.file_url.ends_with(".md"));
    assert_eq!(panel.title(), "");
    assert!(panel.selected_file().is_none());

    let opened = panel.open(&note).await;
    assert_eq!(opened, OpenedNote::Preview);
    let preview = panel.preview().expect("preview open");
    assert_eq!(preview.title, "Ideas");
    assert!(preview.html.contains("<h1>Ideas</h1>"));
    assert!(preview.html.contains("[Local image unavailable]"));
    assert!(!preview.html.contains("diagram.png"));
    assert!(preview.html.contains(r#"src="https://example.com/logo.png""#));

    panel.close_preview();
    assert!(panel.preview().is_none());
}

#[tokio::test]
async fn newest_upload_goes_first() {
    let backend = FlakyBackend::new().await;
    let mut panel = panel_for(&backend);

    for title in ["first", "second"] {
        panel.set_title(title);
        panel.select_file(markdown_file("a.md", "x"));
        panel.upload().await;
    }

    let titles: Vec<&str> = panel.notes().iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["second", "first"]);
    assert_eq!(count_rows(&backend.inner, "objects").await, 2);
}

#[tokio::test]
async fn unsupported_file_is_rejected_before_any_call() {
    let backend = FlakyBackend::new().await;
    let mut panel = panel_for(&backend);

    panel.set_title("Report");
    let accepted = panel.select_file(SelectedFile::new(
        "report.docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        vec![1, 2, 3],
    ));
    assert!(!accepted);
    assert_eq!(panel.error(), Some(UNSUPPORTED_FILE));
    assert!(panel.selected_file().is_none());

    panel.upload().await;
    assert_eq!(panel.error(), Some(MISSING_FIELDS));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn missing_title_makes_no_call() {
    let backend = FlakyBackend::new().await;
    let mut panel = panel_for(&backend);

    panel.set_title("   ");
    panel.select_file(markdown_file("a.md", "x"));
    assert!(!panel.can_upload());
    panel.upload().await;

    assert_eq!(panel.error(), Some(MISSING_FIELDS));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn failed_object_upload_aborts_before_metadata() {
    let backend = FlakyBackend::new().await;
    FlakyBackend::fail(&backend.faults.upload);
    let mut panel = panel_for(&backend);

    panel.set_title("Ideas");
    panel.select_file(markdown_file("a.md", "x"));
    panel.upload().await;

    assert_eq!(panel.error(), Some(UPLOAD_FAILED));
    assert!(panel.notes().is_empty());
    assert_eq!(panel.title(), "Ideas");
    assert!(panel.selected_file().is_some());
    assert_eq!(count_rows(&backend.inner, "notes").await, 0);
}

#[tokio::test]
async fn failed_metadata_insert_removes_uploaded_object() {
    let backend = FlakyBackend::new().await;
    FlakyBackend::fail(&backend.faults.insert);
    let mut panel = panel_for(&backend);

    panel.set_title("Ideas");
    panel.select_file(markdown_file("a.md", "x"));
    panel.upload().await;

    assert_eq!(panel.error(), Some(SAVE_FAILED));
    assert!(panel.notes().is_empty());
    assert!(!panel.is_uploading());
    assert_eq!(count_rows(&backend.inner, "objects").await, 0);
}

#[tokio::test]
async fn pdf_and_images_open_externally() {
    let backend = FlakyBackend::new().await;
    let mut panel = panel_for(&backend);

    for name in ["paper.pdf", "photo.PNG"] {
        let note = backend
            .inner
            .insert_note(NewNote {
                title: name.to_string(),
                file_url: format!("http://localhost:3000/notes/{}", name),
                file_name: name.to_string(),
            })
            .await
            .unwrap();

        let opened = panel.open(&note).await;
        assert_eq!(opened, OpenedNote::External(note.file_url.clone()));
    }
    assert!(panel.preview().is_none());
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn unreadable_markdown_shows_placeholder() {
    let backend = FlakyBackend::new().await;
    let mut panel = panel_for(&backend);
    let note = backend
        .inner
        .insert_note(NewNote {
            title: "Gone".to_string(),
            file_url: backend.inner.public_url("missing.md"),
            file_name: "missing.md".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(panel.open(&note).await, OpenedNote::Preview);

    let preview = panel.preview().expect("preview open");
    assert_eq!(preview.source, LOAD_FAILED_PLACEHOLDER);
    assert!(preview.html.contains("<strong>Failed to load</strong>"));
}

#[tokio::test]
async fn delete_goes_through_endpoint_logic() {
    let backend = FlakyBackend::new().await;
    let mut panel = panel_for(&backend);
    panel.set_title("Ideas");
    panel.select_file(markdown_file("a.md", "x"));
    panel.upload().await;
    let id = panel.notes()[0].id.clone();

    panel.delete(&id, |_| false).await;
    assert_eq!(panel.notes().len(), 1);

    panel.delete(&id, |note| note.title == "Ideas").await;
    assert!(panel.notes().is_empty());
    assert!(panel.error().is_none());
    assert_eq!(count_rows(&backend.inner, "notes").await, 0);
    assert_eq!(count_rows(&backend.inner, "objects").await, 0);
}

#[tokio::test]
async fn refused_delete_restores_list_with_server_message() {
    let backend = FlakyBackend::new().await;
    for title in ["a", "b"] {
        backend
            .inner
            .insert_note(NewNote {
                title: title.to_string(),
                file_url: format!("http://localhost:3000/notes/{}.md", title),
                file_name: format!("{}.md", title),
            })
            .await
            .unwrap();
    }

    let deleter = Arc::new(RefusingDeleter(Some(AppError::NotFound("Note is gone".to_string()))));
    let mut panel = NotesPanel::new(backend.clone(), backend.clone(), deleter);
    panel.load().await;
    let before = panel.notes().to_vec();

    panel.delete(&before[0].id, |_| true).await;
    assert_eq!(panel.notes(), before.as_slice());
    assert_eq!(panel.error(), Some("Note is gone"));

    let deleter = Arc::new(RefusingDeleter(None));
    let mut panel = NotesPanel::new(backend.clone(), backend.clone(), deleter);
    panel.load().await;
    panel.delete(&before[1].id, |_| true).await;
    assert_eq!(panel.notes(), before.as_slice());
    assert_eq!(panel.error(), Some(DELETE_FAILED));
}

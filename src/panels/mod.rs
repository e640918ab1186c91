pub mod deleter;
pub mod notes;
pub mod optimistic;
pub mod todo;
pub mod view_badge;

pub use deleter::{DirectNoteDeleter, HttpNoteDeleter, NoteDeleter};
pub use notes::{MarkdownPreview, NoteKind, NotesPanel, OpenedNote, SelectedFile};
pub use todo::TodoPanel;
pub use view_badge::{HttpViewCountSource, ViewBadge, ViewCountSource};

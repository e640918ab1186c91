pub mod note;
pub mod todo;

pub use note::{NewNote, Note};
pub use todo::{NewTodo, Todo, progress_percent};

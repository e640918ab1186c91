pub mod notes;
pub mod view_counter;

pub use notes::delete_note;
pub use view_counter::ViewCounter;

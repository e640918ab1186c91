use serde::Serialize;

use crate::models::progress_percent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DemoTodo {
    pub title: &'static str,
    pub is_complete: bool,
}

pub const DEMO_TODOS: [DemoTodo; 5] = [
    DemoTodo { title: "Review today's calendar", is_complete: true },
    DemoTodo { title: "Reply to important emails", is_complete: true },
    DemoTodo { title: "Finish the project draft", is_complete: false },
    DemoTodo { title: "Go for a 30 minute walk", is_complete: false },
    DemoTodo { title: "Read 20 pages", is_complete: false },
];

#[derive(Debug, Serialize)]
pub struct DemoPage {
    pub todos: Vec<DemoTodo>,
    pub completed: usize,
    pub total: usize,
    pub progress: u32,
}

/// Fixed sample list; nothing here is persisted.
pub fn demo_page() -> DemoPage {
    let completed = DEMO_TODOS.iter().filter(|t| t.is_complete).count();
    let total = DEMO_TODOS.len();
    DemoPage {
        todos: DEMO_TODOS.to_vec(),
        completed,
        total,
        progress: progress_percent(completed, total),
    }
}

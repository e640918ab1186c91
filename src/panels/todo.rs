use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::error;

use crate::models::{NewTodo, Todo, progress_percent};
use crate::panels::optimistic::apply_with_rollback;
use crate::supabase::TodoRepository;

pub const LOAD_FAILED: &str = "Failed to load today's tasks, please try again later.";
pub const ADD_FAILED: &str = "Failed to add the task, please try again later.";
pub const TOGGLE_FAILED: &str = "Failed to update the task, its previous state was restored.";
pub const DELETE_FAILED: &str = "Failed to delete the task, the list was restored.";

/// Today's to-do list as the page holds it.
pub struct TodoPanel {
    repo: Arc<dyn TodoRepository>,
    today: NaiveDate,
    todos: Vec<Todo>,
    input: String,
    error: Option<String>,
    is_loading: bool,
    is_submitting: bool,
}

impl TodoPanel {
    pub fn new(repo: Arc<dyn TodoRepository>, today: NaiveDate) -> Self {
        Self {
            repo,
            today,
            todos: Vec::new(),
            input: String::new(),
            error: None,
            is_loading: true,
            is_submitting: false,
        }
    }

    pub fn for_today(repo: Arc<dyn TodoRepository>) -> Self {
        Self::new(repo, Local::now().date_naive())
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, value: impl Into<String>) {
        self.input = value.into();
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn can_submit(&self) -> bool {
        !self.is_submitting && !self.input.trim().is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|t| t.is_complete).count()
    }

    pub fn total_count(&self) -> usize {
        self.todos.len()
    }

    pub fn progress(&self) -> u32 {
        progress_percent(self.completed_count(), self.total_count())
    }

    /// "completed/total", as shown next to the progress bar.
    pub fn summary(&self) -> String {
        format!("{}/{}", self.completed_count(), self.total_count())
    }

    pub async fn load(&mut self) {
        self.is_loading = true;
        self.error = None;

        match self.repo.list_todos_for_day(self.today).await {
            Ok(todos) => self.todos = todos,
            Err(e) => {
                error!("loading todos for {} failed: {}", self.today, e);
                self.error = Some(LOAD_FAILED.to_string());
            }
        }

        self.is_loading = false;
    }

    pub async fn add(&mut self) {
        let title = self.input.trim().to_string();
        if title.is_empty() {
            return;
        }

        self.is_submitting = true;
        self.error = None;

        let new_todo = NewTodo {
            title,
            is_complete: false,
            day: self.today,
        };

        match self.repo.insert_todo(new_todo).await {
            Ok(todo) => {
                self.todos.push(todo);
                self.input.clear();
            }
            Err(e) => {
                error!("adding todo failed: {}", e);
                self.error = Some(ADD_FAILED.to_string());
            }
        }

        self.is_submitting = false;
    }

    pub async fn toggle(&mut self, id: &str) {
        let Some(next) = self.todos.iter().find(|t| t.id == id).map(|t| !t.is_complete) else {
            return;
        };

        let result = apply_with_rollback(
            &mut self.todos,
            |todos| {
                if let Some(todo) = todos.iter_mut().find(|t| t.id == id) {
                    todo.is_complete = next;
                }
            },
            self.repo.set_todo_complete(id, next),
        )
        .await;

        if let Err(e) = result {
            error!("toggling todo {} failed: {}", id, e);
            self.error = Some(TOGGLE_FAILED.to_string());
        }
    }

    pub async fn delete(&mut self, id: &str) {
        let result = apply_with_rollback(
            &mut self.todos,
            |todos| todos.retain(|t| t.id != id),
            self.repo.delete_todo(id),
        )
        .await;

        if let Err(e) = result {
            error!("deleting todo {} failed: {}", id, e);
            self.error = Some(DELETE_FAILED.to_string());
        }
    }
}

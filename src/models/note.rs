use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub file_url: String,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// Creation date as shown in the list, in local time.
    pub fn created_on(&self) -> String {
        self.created_at.with_timezone(&Local).format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub file_url: String,
    pub file_name: String,
}

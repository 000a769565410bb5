use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::StatEntry;

/// Full card row. `skills` and `stats` are stored as serialized JSON text.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CardRow {
    pub id: String,
    pub name: String,
    pub title: String,
    pub skills: String,
    pub stats: String,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Gallery listing entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CardSummary {
    pub id: String,
    pub name: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CardInsert {
    pub id: String,
    pub name: String,
    pub title: String,
    pub skills: Vec<String>,
    pub stats: Vec<StatEntry>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

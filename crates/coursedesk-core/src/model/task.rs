// ── Task domain types ──

use serde::{Deserialize, Serialize};

/// An assignment belonging to a subject, as returned by `/admin/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub max_score: Option<u32>,
    #[serde(default)]
    pub subject_id: Option<u64>,
    #[serde(default)]
    pub subject_name: Option<String>,
}

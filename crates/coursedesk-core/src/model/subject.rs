// ── Subject domain types ──

use serde::{Deserialize, Serialize};

/// A course subject as returned by `/admin/subjects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_by_name: Option<String>,
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub workspace_id: String,
    pub user_id: Option<String>,
    pub action: String,
    pub target: Option<String>,
    pub created_at: String,
}

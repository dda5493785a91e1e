use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct AuditQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub ok: bool,
    /// Whether an override existed before the reset.
    pub removed: bool,
}

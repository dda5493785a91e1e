use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};

use workmind_auth::error::AuthError;
use workmind_auth::{AuditEntry, AuthUser, WorkspaceAccess};
use workmind_core::catalog::WORKSPACE_VIEW_SETTINGS;

use crate::models::AuditQuery;
use crate::state::AppState;

pub async fn list_audit(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntry>>, AuthError> {
    let access =
        WorkspaceAccess::load(state.store.as_ref(), &workspace_id, &auth_user.user_id).await?;
    access.require(WORKSPACE_VIEW_SETTINGS)?;

    let limit = query.limit.unwrap_or(50).min(500);
    let offset = query.offset.unwrap_or(0);

    Ok(Json(
        state.store.list_audit(&workspace_id, limit, offset).await?,
    ))
}

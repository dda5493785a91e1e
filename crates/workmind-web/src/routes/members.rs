use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};

use workmind_auth::error::AuthError;
use workmind_auth::{AuthUser, WorkspaceAccess};
use workmind_core::catalog::{MEMBER_INVITE, MEMBER_REMOVE, MEMBER_UPDATE_ROLE, MEMBER_VIEW};
use workmind_core::{AddMemberRequest, Role, UpdateRoleRequest, WorkspaceMember};

use crate::state::AppState;

pub async fn list_members(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
) -> Result<Json<Vec<WorkspaceMember>>, AuthError> {
    let access =
        WorkspaceAccess::load(state.store.as_ref(), &workspace_id, &auth_user.user_id).await?;
    access.require(MEMBER_VIEW)?;

    Ok(Json(state.store.list_members(&workspace_id).await?))
}

pub async fn add_member(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<WorkspaceMember>, AuthError> {
    let access =
        WorkspaceAccess::load(state.store.as_ref(), &workspace_id, &auth_user.user_id).await?;
    access.require(MEMBER_INVITE)?;

    if req.user_id.is_empty() || req.email.is_empty() {
        return Err(AuthError::InvalidInput("user_id and email required".into()));
    }
    let role: Role = req.role_name.parse()?;
    access.require_assign(role)?;

    let member = state
        .store
        .add_member(
            &workspace_id,
            &req.user_id,
            &req.email,
            req.full_name.as_deref(),
            role,
        )
        .await?;

    super::record(
        &state,
        &workspace_id,
        &auth_user.user_id,
        "member.add",
        Some(&format!("{}:{role}", member.id)),
    )
    .await;

    Ok(Json(member))
}

pub async fn update_member_role(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path((workspace_id, member_id)): Path<(String, String)>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<WorkspaceMember>, AuthError> {
    let access =
        WorkspaceAccess::load(state.store.as_ref(), &workspace_id, &auth_user.user_id).await?;
    access.require(MEMBER_UPDATE_ROLE)?;

    let role: Role = req.role_name.parse()?;
    let target = state.store.get_member(&workspace_id, &member_id).await?;
    access.require_not_self(&target)?;
    access.require_edit(&target)?;
    access.require_assign(role)?;

    let member = state
        .store
        .update_member_role(&workspace_id, &member_id, role)
        .await?;

    super::record(
        &state,
        &workspace_id,
        &auth_user.user_id,
        "member.role",
        Some(&format!("{member_id}:{}->{role}", target.workspace_role)),
    )
    .await;

    Ok(Json(member))
}

pub async fn remove_member(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path((workspace_id, member_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AuthError> {
    let access =
        WorkspaceAccess::load(state.store.as_ref(), &workspace_id, &auth_user.user_id).await?;
    access.require(MEMBER_REMOVE)?;

    let target = state.store.get_member(&workspace_id, &member_id).await?;
    access.require_remove(&target)?;

    state.store.remove_member(&workspace_id, &member_id).await?;

    super::record(
        &state,
        &workspace_id,
        &auth_user.user_id,
        "member.remove",
        Some(&target.email),
    )
    .await;

    Ok(Json(serde_json::json!({"ok": true})))
}

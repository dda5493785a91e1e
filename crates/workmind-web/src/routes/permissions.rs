use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};

use workmind_auth::error::AuthError;
use workmind_auth::{AuthUser, WorkspaceAccess};
use workmind_core::catalog::{self, CategoryGroup, MEMBER_UPDATE_ROLE, MEMBER_VIEW};
use workmind_core::resolver;
use workmind_core::{EffectivePermission, UpdatePermissionRequest, UserPermissionsResponse};

use crate::models::ResetResponse;
use crate::state::AppState;

pub async fn get_catalog(_auth_user: AuthUser) -> Json<Vec<CategoryGroup>> {
    Json(catalog::catalog())
}

pub async fn get_user_permissions(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
) -> Result<Json<UserPermissionsResponse>, AuthError> {
    let access =
        WorkspaceAccess::load(state.store.as_ref(), &workspace_id, &auth_user.user_id).await?;
    Ok(Json(UserPermissionsResponse {
        permissions: access.permissions,
    }))
}

pub async fn get_member_permissions(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path((workspace_id, member_id)): Path<(String, String)>,
) -> Result<Json<Vec<EffectivePermission>>, AuthError> {
    let access =
        WorkspaceAccess::load(state.store.as_ref(), &workspace_id, &auth_user.user_id).await?;
    // Members may always inspect themselves.
    if access.member.id != member_id {
        access.require(MEMBER_VIEW)?;
    }

    let target = state.store.get_member(&workspace_id, &member_id).await?;
    let overrides = state.store.list_overrides(&target.id).await?;
    Ok(Json(resolver::resolve(target.workspace_role, &overrides)))
}

pub async fn update_member_permission(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path((workspace_id, member_id)): Path<(String, String)>,
    Json(req): Json<UpdatePermissionRequest>,
) -> Result<Json<EffectivePermission>, AuthError> {
    let access =
        WorkspaceAccess::load(state.store.as_ref(), &workspace_id, &auth_user.user_id).await?;
    access.require(MEMBER_UPDATE_ROLE)?;

    if !catalog::is_known(&req.permission_name) {
        return Err(AuthError::InvalidInput(format!(
            "unknown permission: {}",
            req.permission_name
        )));
    }

    let target = state.store.get_member(&workspace_id, &member_id).await?;
    access.require_not_self(&target)?;
    access.require_edit(&target)?;
    access.require_grantable(&req.permission_name, req.action)?;

    state
        .store
        .set_override(&target.id, &req.permission_name, req.action)
        .await?;
    tracing::info!(
        "{} {} {} for member {}",
        auth_user.user_id,
        req.action,
        req.permission_name,
        target.id
    );

    super::record(
        &state,
        &workspace_id,
        &auth_user.user_id,
        &format!("permission.{}", req.action),
        Some(&format!("{}:{}", target.id, req.permission_name)),
    )
    .await;

    Ok(Json(EffectivePermission::from_override(
        &req.permission_name,
        req.action,
    )))
}

pub async fn reset_member_permission(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path((workspace_id, member_id, permission)): Path<(String, String, String)>,
) -> Result<Json<ResetResponse>, AuthError> {
    let access =
        WorkspaceAccess::load(state.store.as_ref(), &workspace_id, &auth_user.user_id).await?;
    access.require(MEMBER_UPDATE_ROLE)?;

    let target = state.store.get_member(&workspace_id, &member_id).await?;
    access.require_not_self(&target)?;
    access.require_edit(&target)?;

    let removed = state.store.clear_override(&target.id, &permission).await?;
    if removed {
        super::record(
            &state,
            &workspace_id,
            &auth_user.user_id,
            "permission.reset",
            Some(&format!("{}:{permission}", target.id)),
        )
        .await;
    }

    Ok(Json(ResetResponse { ok: true, removed }))
}

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};

use workmind_auth::error::AuthError;
use workmind_auth::{AuthUser, WorkspaceAccess};
use workmind_core::catalog::{WORKSPACE_DELETE, WORKSPACE_UPDATE};
use workmind_core::{CreateWorkspaceRequest, UpdateWorkspaceRequest, WorkspaceSummary};

use crate::state::AppState;

pub async fn list_workspaces(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<WorkspaceSummary>>, AuthError> {
    let workspaces = state.store.list_user_workspaces(&auth_user.user_id).await?;
    let mut result = Vec::with_capacity(workspaces.len());
    for workspace in workspaces {
        let member = state
            .store
            .find_member_by_user(&workspace.id, &auth_user.user_id)
            .await?;
        result.push(WorkspaceSummary {
            workspace,
            user_role: member.workspace_role,
        });
    }
    Ok(Json(result))
}

pub async fn get_workspace(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
) -> Result<Json<WorkspaceSummary>, AuthError> {
    let access =
        WorkspaceAccess::load(state.store.as_ref(), &workspace_id, &auth_user.user_id).await?;
    let workspace = state.store.get_workspace(&workspace_id).await?;
    Ok(Json(WorkspaceSummary {
        workspace,
        user_role: access.role(),
    }))
}

pub async fn create_workspace(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateWorkspaceRequest>,
) -> Result<Json<WorkspaceSummary>, AuthError> {
    if req.name.trim().is_empty() {
        return Err(AuthError::InvalidInput("workspace name required".into()));
    }

    let workspace = state
        .store
        .create_workspace(
            req.name.trim(),
            req.description.as_deref(),
            &auth_user.user_id,
            &auth_user.email,
        )
        .await?;

    super::record(
        &state,
        &workspace.id,
        &auth_user.user_id,
        "workspace.create",
        Some(&workspace.name),
    )
    .await;

    Ok(Json(WorkspaceSummary {
        workspace,
        user_role: workmind_core::Role::Owner,
    }))
}

pub async fn update_workspace(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    Json(req): Json<UpdateWorkspaceRequest>,
) -> Result<Json<WorkspaceSummary>, AuthError> {
    let access =
        WorkspaceAccess::load(state.store.as_ref(), &workspace_id, &auth_user.user_id).await?;
    access.require(WORKSPACE_UPDATE)?;

    let name = req.name.as_deref().map(str::trim);
    if name.is_some_and(str::is_empty) {
        return Err(AuthError::InvalidInput("workspace name required".into()));
    }

    let workspace = state
        .store
        .update_workspace(&workspace_id, name, req.description.as_deref())
        .await?;

    super::record(
        &state,
        &workspace_id,
        &auth_user.user_id,
        "workspace.update",
        Some(&workspace.name),
    )
    .await;

    Ok(Json(WorkspaceSummary {
        workspace,
        user_role: access.role(),
    }))
}

pub async fn delete_workspace(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
) -> Result<Json<serde_json::Value>, AuthError> {
    let access =
        WorkspaceAccess::load(state.store.as_ref(), &workspace_id, &auth_user.user_id).await?;
    access.require(WORKSPACE_DELETE)?;

    state.store.delete_workspace(&workspace_id).await?;
    tracing::info!("{} deleted workspace {workspace_id}", auth_user.user_id);

    super::record(&state, &workspace_id, &auth_user.user_id, "workspace.delete", None).await;

    Ok(Json(serde_json::json!({"ok": true})))
}

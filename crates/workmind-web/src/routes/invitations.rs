use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};

use workmind_auth::error::AuthError;
use workmind_auth::{AuthUser, WorkspaceAccess};
use workmind_core::catalog::{MEMBER_INVITE, MEMBER_REMOVE, MEMBER_VIEW};
use workmind_core::{
    AcceptInvitationRequest, AcceptInvitationResponse, Invitation, InviteMemberRequest, Role,
};

use crate::state::AppState;

pub async fn invite_member(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    Json(req): Json<InviteMemberRequest>,
) -> Result<Json<Invitation>, AuthError> {
    let access =
        WorkspaceAccess::load(state.store.as_ref(), &workspace_id, &auth_user.user_id).await?;
    access.require(MEMBER_INVITE)?;

    if !req.email.contains('@') {
        return Err(AuthError::InvalidInput("a valid email is required".into()));
    }
    let role: Role = req.role_name.parse()?;
    access.require_assign(role)?;

    let invitation = state
        .store
        .create_invitation(&workspace_id, &req.email, role, &auth_user.user_id)
        .await?;

    super::record(
        &state,
        &workspace_id,
        &auth_user.user_id,
        "member.invite",
        Some(&format!("{}:{role}", invitation.email)),
    )
    .await;

    Ok(Json(invitation))
}

pub async fn list_invitations(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
) -> Result<Json<Vec<Invitation>>, AuthError> {
    let access =
        WorkspaceAccess::load(state.store.as_ref(), &workspace_id, &auth_user.user_id).await?;
    access.require(MEMBER_VIEW)?;

    Ok(Json(state.store.list_pending_invitations(&workspace_id).await?))
}

pub async fn resend_invitation(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path((workspace_id, invitation_id)): Path<(String, String)>,
) -> Result<Json<Invitation>, AuthError> {
    let access =
        WorkspaceAccess::load(state.store.as_ref(), &workspace_id, &auth_user.user_id).await?;
    access.require(MEMBER_INVITE)?;

    let invitation = state
        .store
        .renew_invitation(&workspace_id, &invitation_id)
        .await?;

    super::record(
        &state,
        &workspace_id,
        &auth_user.user_id,
        "member.invite_resend",
        Some(&invitation.email),
    )
    .await;

    Ok(Json(invitation))
}

pub async fn cancel_invitation(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path((workspace_id, invitation_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AuthError> {
    let access =
        WorkspaceAccess::load(state.store.as_ref(), &workspace_id, &auth_user.user_id).await?;
    access.require(MEMBER_REMOVE)?;

    let invitation = state
        .store
        .get_invitation(&workspace_id, &invitation_id)
        .await?;
    state
        .store
        .delete_invitation(&workspace_id, &invitation_id)
        .await?;

    super::record(
        &state,
        &workspace_id,
        &auth_user.user_id,
        "member.invite_cancel",
        Some(&invitation.email),
    )
    .await;

    Ok(Json(serde_json::json!({"ok": true})))
}

/// Joins the workspace named by the invitation token. The signed-in email
/// must match the invited address.
pub async fn accept_invitation(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AcceptInvitationRequest>,
) -> Result<Json<AcceptInvitationResponse>, AuthError> {
    if req.token.trim().is_empty() {
        return Err(AuthError::InvalidInput("invitation token required".into()));
    }
    let invitation = state.store.find_invitation_by_token(req.token.trim()).await?;
    if !invitation.email.eq_ignore_ascii_case(auth_user.email.trim()) {
        return Err(AuthError::Forbidden(
            "this invitation was sent to a different email address".into(),
        ));
    }

    let member = state
        .store
        .accept_invitation(&invitation.id, &auth_user.user_id, &auth_user.email)
        .await?;
    let workspace = state.store.get_workspace(&invitation.workspace_id).await?;
    tracing::info!(
        "{} joined workspace {} as {}",
        auth_user.user_id,
        workspace.id,
        member.workspace_role
    );

    super::record(
        &state,
        &workspace.id,
        &auth_user.user_id,
        "member.join",
        Some(&member.id),
    )
    .await;

    Ok(Json(AcceptInvitationResponse {
        message: format!("Joined {}", workspace.name),
        role: member.workspace_role,
        workspace,
        member,
    }))
}

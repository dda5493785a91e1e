pub mod audit;
pub mod invitations;
pub mod members;
pub mod permissions;
pub mod workspaces;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};

use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    // Every route authenticates through the AuthUser extractor.
    let permission_routes = Router::new()
        .route(
            "/workspace-permissions/catalog",
            get(permissions::get_catalog),
        )
        .route(
            "/workspace-permissions/workspaces/{workspace_id}/user",
            get(permissions::get_user_permissions),
        )
        .route(
            "/workspace-permissions/workspaces/{workspace_id}/members/{member_id}",
            get(permissions::get_member_permissions).patch(permissions::update_member_permission),
        )
        .route(
            "/workspace-permissions/workspaces/{workspace_id}/members/{member_id}/permissions/{permission}",
            delete(permissions::reset_member_permission),
        );

    let workspace_routes = Router::new()
        .route(
            "/workspaces",
            get(workspaces::list_workspaces).post(workspaces::create_workspace),
        )
        .route(
            "/workspaces/{workspace_id}",
            get(workspaces::get_workspace)
                .patch(workspaces::update_workspace)
                .delete(workspaces::delete_workspace),
        )
        .route(
            "/workspaces/{workspace_id}/members",
            get(members::list_members).post(members::add_member),
        )
        .route(
            "/workspaces/{workspace_id}/members/{member_id}",
            patch(members::update_member_role).delete(members::remove_member),
        )
        .route(
            "/workspaces/{workspace_id}/members/invite",
            post(invitations::invite_member),
        )
        .route("/workspaces/{workspace_id}/audit", get(audit::list_audit));

    let invitation_routes = Router::new()
        .route(
            "/workspace-invitations/accept",
            post(invitations::accept_invitation),
        )
        .route(
            "/workspace-invitations/workspaces/{workspace_id}",
            get(invitations::list_invitations),
        )
        .route(
            "/workspace-invitations/workspaces/{workspace_id}/{invitation_id}",
            delete(invitations::cancel_invitation),
        )
        .route(
            "/workspace-invitations/workspaces/{workspace_id}/{invitation_id}/resend",
            post(invitations::resend_invitation),
        );

    Router::new()
        .merge(permission_routes)
        .merge(workspace_routes)
        .merge(invitation_routes)
        .with_state(state)
}

/// Records an audit entry. A failed write is logged and never fails the
/// request that triggered it.
pub(crate) async fn record(
    state: &AppState,
    workspace_id: &str,
    user_id: &str,
    action: &str,
    target: Option<&str>,
) {
    if let Err(e) = state
        .store
        .log_audit(workspace_id, Some(user_id), action, target)
        .await
    {
        tracing::warn!("audit write for {action} in {workspace_id} failed: {e}");
    }
}

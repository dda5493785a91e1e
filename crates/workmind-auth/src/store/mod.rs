pub mod sqlite;

pub use sqlite::SqliteStore;

use std::collections::HashMap;

use async_trait::async_trait;
use workmind_core::{GrantType, Invitation, Role, Workspace, WorkspaceMember};

use crate::error::AuthError;
use crate::types::AuditEntry;

#[async_trait]
pub trait PermissionStore: Send + Sync {
    // Workspaces
    /// Creates the workspace and its Owner membership together.
    async fn create_workspace(
        &self,
        name: &str,
        description: Option<&str>,
        owner_user_id: &str,
        owner_email: &str,
    ) -> Result<Workspace, AuthError>;
    async fn get_workspace(&self, id: &str) -> Result<Workspace, AuthError>;
    async fn list_user_workspaces(&self, user_id: &str) -> Result<Vec<Workspace>, AuthError>;
    /// `None` fields keep their current value.
    async fn update_workspace(
        &self,
        id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Workspace, AuthError>;
    /// Drops members, overrides and invitations with it.
    async fn delete_workspace(&self, id: &str) -> Result<(), AuthError>;

    // Members
    async fn add_member(
        &self,
        workspace_id: &str,
        user_id: &str,
        email: &str,
        full_name: Option<&str>,
        role: Role,
    ) -> Result<WorkspaceMember, AuthError>;
    /// Fails with `NotFound` when the member belongs to another workspace.
    async fn get_member(
        &self,
        workspace_id: &str,
        member_id: &str,
    ) -> Result<WorkspaceMember, AuthError>;
    async fn find_member_by_user(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<WorkspaceMember, AuthError>;
    async fn list_members(&self, workspace_id: &str) -> Result<Vec<WorkspaceMember>, AuthError>;
    async fn update_member_role(
        &self,
        workspace_id: &str,
        member_id: &str,
        role: Role,
    ) -> Result<WorkspaceMember, AuthError>;
    async fn remove_member(&self, workspace_id: &str, member_id: &str) -> Result<(), AuthError>;

    // Invitations
    /// Fails with `Duplicate` while a pending invitation for `email` exists.
    async fn create_invitation(
        &self,
        workspace_id: &str,
        email: &str,
        role: Role,
        invited_by: &str,
    ) -> Result<Invitation, AuthError>;
    async fn list_pending_invitations(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<Invitation>, AuthError>;
    async fn get_invitation(
        &self,
        workspace_id: &str,
        invitation_id: &str,
    ) -> Result<Invitation, AuthError>;
    async fn find_invitation_by_token(&self, token: &str) -> Result<Invitation, AuthError>;
    /// New token and expiry for a pending invitation.
    async fn renew_invitation(
        &self,
        workspace_id: &str,
        invitation_id: &str,
    ) -> Result<Invitation, AuthError>;
    async fn delete_invitation(
        &self,
        workspace_id: &str,
        invitation_id: &str,
    ) -> Result<(), AuthError>;
    /// Adds the member and marks the invitation accepted in one transaction.
    /// Accepted or expired invitations are rejected.
    async fn accept_invitation(
        &self,
        invitation_id: &str,
        user_id: &str,
        email: &str,
    ) -> Result<WorkspaceMember, AuthError>;

    // Overrides
    /// Upserts the override: a later grant/revoke replaces an earlier one.
    async fn set_override(
        &self,
        member_id: &str,
        permission: &str,
        grant: GrantType,
    ) -> Result<(), AuthError>;
    /// Returns whether an override existed.
    async fn clear_override(&self, member_id: &str, permission: &str) -> Result<bool, AuthError>;
    async fn list_overrides(&self, member_id: &str)
    -> Result<HashMap<String, GrantType>, AuthError>;

    // Audit
    async fn log_audit(
        &self,
        workspace_id: &str,
        user_id: Option<&str>,
        action: &str,
        target: Option<&str>,
    ) -> Result<(), AuthError>;
    async fn list_audit(
        &self,
        workspace_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AuditEntry>, AuthError>;

    // Lifecycle
    async fn migrate(&self) -> Result<(), AuthError>;
}

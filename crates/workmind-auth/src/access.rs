//! Server-side authorization: what the acting user may do inside one
//! workspace, derived from their membership, role and overrides.

use workmind_core::resolver;
use workmind_core::rules;
use workmind_core::{GrantType, Role, WorkspaceMember};

use crate::error::AuthError;
use crate::store::PermissionStore;

#[derive(Debug, Clone)]
pub struct WorkspaceAccess {
    pub member: WorkspaceMember,
    pub permissions: Vec<String>,
}

impl WorkspaceAccess {
    /// Resolves the acting user's membership and effective permissions.
    /// Non-members are forbidden, unknown workspaces are not found.
    pub async fn load(
        store: &dyn PermissionStore,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<Self, AuthError> {
        store.get_workspace(workspace_id).await?;
        let member = match store.find_member_by_user(workspace_id, user_id).await {
            Ok(m) => m,
            Err(AuthError::NotFound(_)) => {
                return Err(AuthError::Forbidden("not a member of this workspace".into()));
            }
            Err(e) => return Err(e),
        };
        let overrides = store.list_overrides(&member.id).await?;
        let permissions = resolver::allowed_names(member.workspace_role, &overrides);
        Ok(Self {
            member,
            permissions,
        })
    }

    pub fn role(&self) -> Role {
        self.member.workspace_role
    }

    pub fn has(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn require(&self, permission: &str) -> Result<(), AuthError> {
        if self.has(permission) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(format!(
                "missing permission: {permission}"
            )))
        }
    }

    /// Role rules for editing `target` (role change or permission override).
    pub fn require_edit(&self, target: &WorkspaceMember) -> Result<(), AuthError> {
        if !rules::role_allows_edit(self.role(), target.workspace_role) {
            return Err(AuthError::Forbidden(format!(
                "{} cannot modify a member with role {}",
                self.role(),
                target.workspace_role
            )));
        }
        Ok(())
    }

    /// Members never change their own role or overrides.
    pub fn require_not_self(&self, target: &WorkspaceMember) -> Result<(), AuthError> {
        if self.member.id == target.id {
            return Err(AuthError::Forbidden(
                "you cannot change your own role or permissions".into(),
            ));
        }
        Ok(())
    }

    /// A grant may only hand out what the actor holds and what the actor's
    /// role carries by default. Revokes only narrow access.
    pub fn require_grantable(&self, permission: &str, action: GrantType) -> Result<(), AuthError> {
        if action == GrantType::Revoke {
            return Ok(());
        }
        if !self.has(permission) || !self.role().grants_by_default(permission) {
            return Err(AuthError::Forbidden(format!(
                "{} cannot grant {permission}",
                self.role()
            )));
        }
        Ok(())
    }

    pub fn require_remove(&self, target: &WorkspaceMember) -> Result<(), AuthError> {
        if !rules::role_allows_remove(target.workspace_role) {
            return Err(AuthError::Forbidden("the workspace owner cannot be removed".into()));
        }
        Ok(())
    }

    pub fn require_assign(&self, role: Role) -> Result<(), AuthError> {
        if !rules::role_may_assign(self.role(), role) {
            return Err(AuthError::Forbidden(format!(
                "{} cannot assign the {role} role",
                self.role()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use workmind_core::catalog::{DOCUMENT_DELETE, DOCUMENT_UPLOAD, MEMBER_UPDATE_ROLE, WORKSPACE_DELETE};

    fn member(id: &str, role: Role) -> WorkspaceMember {
        WorkspaceMember {
            id: id.to_string(),
            workspace_id: "w1".to_string(),
            user_id: format!("user-{id}"),
            email: format!("{id}@example.test"),
            full_name: None,
            workspace_role: role,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn access(id: &str, role: Role, overrides: &[(&str, GrantType)]) -> WorkspaceAccess {
        let overrides: HashMap<String, GrantType> = overrides
            .iter()
            .map(|(p, g)| (p.to_string(), *g))
            .collect();
        WorkspaceAccess {
            member: member(id, role),
            permissions: resolver::allowed_names(role, &overrides),
        }
    }

    #[test]
    fn own_membership_is_off_limits() {
        let actor = access("m1", Role::Admin, &[]);
        assert!(matches!(
            actor.require_not_self(&member("m1", Role::Admin)),
            Err(AuthError::Forbidden(_))
        ));
        assert!(actor.require_not_self(&member("m2", Role::Editor)).is_ok());
    }

    #[test]
    fn viewer_with_update_role_cannot_hand_out_more_than_a_viewer() {
        let actor = access("m1", Role::Viewer, &[(MEMBER_UPDATE_ROLE, GrantType::Grant)]);
        assert!(actor.require_grantable(WORKSPACE_DELETE, GrantType::Grant).is_err());
        assert!(actor.require_grantable(DOCUMENT_UPLOAD, GrantType::Grant).is_err());
        // Revokes are always within reach.
        assert!(actor.require_grantable(DOCUMENT_UPLOAD, GrantType::Revoke).is_ok());
    }

    #[test]
    fn admin_grants_within_role_but_not_workspace_delete() {
        let actor = access("m1", Role::Admin, &[(WORKSPACE_DELETE, GrantType::Grant)]);
        assert!(actor.require_grantable(DOCUMENT_DELETE, GrantType::Grant).is_ok());
        assert!(actor.require_grantable(WORKSPACE_DELETE, GrantType::Grant).is_err());

        let owner = access("m0", Role::Owner, &[]);
        assert!(owner.require_grantable(WORKSPACE_DELETE, GrantType::Grant).is_ok());
    }

    #[test]
    fn revoked_default_cannot_be_granted_onward() {
        let actor = access("m1", Role::Admin, &[(DOCUMENT_DELETE, GrantType::Revoke)]);
        assert!(actor.require_grantable(DOCUMENT_DELETE, GrantType::Grant).is_err());
    }
}

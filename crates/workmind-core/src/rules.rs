//! Member-management rules layered on top of the permission flags.
//!
//! An Owner is never edited or removed. Only an Owner may touch an Admin,
//! and only an Owner may hand out the Admin role. Owner is never assignable.

use crate::catalog::{MEMBER_INVITE, MEMBER_REMOVE, MEMBER_UPDATE_ROLE};
use crate::gate::WorkspacePermissionSet;
use crate::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemberActions {
    pub can_edit: bool,
    pub can_remove: bool,
}

impl MemberActions {
    pub fn any(&self) -> bool {
        self.can_edit || self.can_remove
    }
}

/// Role rules alone, without looking at permission flags.
pub fn role_allows_edit(actor: Role, target: Role) -> bool {
    match (actor, target) {
        (_, Role::Owner) => false,
        (Role::Admin, Role::Admin) => false,
        _ => true,
    }
}

pub fn role_allows_remove(target: Role) -> bool {
    target != Role::Owner
}

pub fn role_may_assign(actor: Role, role: Role) -> bool {
    match role {
        Role::Owner => false,
        Role::Admin => actor == Role::Owner,
        Role::Editor | Role::Viewer => true,
    }
}

pub fn can_edit(gate: &WorkspacePermissionSet, actor: Role, target: Role) -> bool {
    gate.has_permission(MEMBER_UPDATE_ROLE) && role_allows_edit(actor, target)
}

pub fn can_remove(gate: &WorkspacePermissionSet, target: Role) -> bool {
    gate.has_permission(MEMBER_REMOVE) && role_allows_remove(target)
}

pub fn member_actions(gate: &WorkspacePermissionSet, actor: Role, target: Role) -> MemberActions {
    MemberActions {
        can_edit: can_edit(gate, actor, target),
        can_remove: can_remove(gate, target),
    }
}

/// Pending invitations: resending needs `member.invite`, cancelling needs
/// `member.remove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InvitationActions {
    pub can_resend: bool,
    pub can_cancel: bool,
}

pub fn invitation_actions(gate: &WorkspacePermissionSet) -> InvitationActions {
    InvitationActions {
        can_resend: gate.has_permission(MEMBER_INVITE),
        can_cancel: gate.has_permission(MEMBER_REMOVE),
    }
}

/// Roles offered in invite and change-role pickers for `actor`.
pub fn assignable_roles(actor: Role) -> Vec<Role> {
    Role::ALL
        .into_iter()
        .filter(|r| role_may_assign(actor, *r))
        .collect()
}

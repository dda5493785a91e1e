use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{self, *};
use crate::error::WorkmindError;

/// Workspace role tiers. The set is fixed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Admin,
    Editor,
    Viewer,
}

const EDITOR_PERMISSIONS: &[&str] = &[
    WORKSPACE_VIEW_SETTINGS,
    MEMBER_VIEW,
    CHATBOT_VIEW,
    CHATBOT_CREATE,
    CHATBOT_UPDATE,
    CHATBOT_CHAT,
    CHATBOT_VIEW_LOGS,
    DOCUMENT_VIEW,
    DOCUMENT_UPLOAD,
    DOCUMENT_UPDATE,
];

const VIEWER_PERMISSIONS: &[&str] = &[MEMBER_VIEW, CHATBOT_VIEW, CHATBOT_CHAT, DOCUMENT_VIEW];

impl Role {
    pub const ALL: [Role; 4] = [Role::Owner, Role::Admin, Role::Editor, Role::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::Admin => "Admin",
            Role::Editor => "Editor",
            Role::Viewer => "Viewer",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Owner => "Full control, including deleting the workspace",
            Role::Admin => "Everything except deleting the workspace",
            Role::Editor => "Manage chatbots and documents",
            Role::Viewer => "Read-only access",
        }
    }

    /// Whether this role grants `permission` when no override applies.
    pub fn grants_by_default(&self, permission: &str) -> bool {
        match self {
            Role::Owner => catalog::is_known(permission),
            Role::Admin => catalog::is_known(permission) && permission != WORKSPACE_DELETE,
            Role::Editor => EDITOR_PERMISSIONS.contains(&permission),
            Role::Viewer => VIEWER_PERMISSIONS.contains(&permission),
        }
    }

    /// Default grants in catalog order.
    pub fn default_permissions(&self) -> Vec<&'static str> {
        catalog::names().filter(|p| self.grants_by_default(p)).collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = WorkmindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "viewer" => Ok(Role::Viewer),
            _ => Err(WorkmindError::UnknownRole(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse() {
        assert_eq!("Owner".parse::<Role>().unwrap(), Role::Owner);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("EDITOR".parse::<Role>().unwrap(), Role::Editor);
        assert!("Guest".parse::<Role>().is_err());
    }

    #[test]
    fn role_display_matches_wire_name() {
        for role in Role::ALL {
            assert_eq!(serde_json::to_string(&role).unwrap(), format!("\"{role}\""));
        }
    }

    #[test]
    fn owner_grants_whole_catalog() {
        assert_eq!(Role::Owner.default_permissions().len(), catalog::PERMISSIONS.len());
        assert!(!Role::Owner.grants_by_default("calendar.create"));
    }

    #[test]
    fn admin_cannot_delete_workspace_by_default() {
        assert!(Role::Admin.grants_by_default(MEMBER_UPDATE_ROLE));
        assert!(!Role::Admin.grants_by_default(WORKSPACE_DELETE));
    }

    #[test]
    fn editor_manages_content_but_not_deletes() {
        assert!(Role::Editor.grants_by_default(CHATBOT_UPDATE));
        assert!(!Role::Editor.grants_by_default(DOCUMENT_DELETE));
        assert!(!Role::Editor.grants_by_default(MEMBER_INVITE));
    }

    #[test]
    fn tiers_are_nested() {
        for p in Role::Viewer.default_permissions() {
            assert!(Role::Editor.grants_by_default(p), "{p}");
        }
        for p in Role::Editor.default_permissions() {
            assert!(Role::Admin.grants_by_default(p), "{p}");
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WorkmindError;
use crate::role::Role;

/// Where an effective decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionSource {
    Role,
    Custom,
    None,
}

impl fmt::Display for PermissionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionSource::Role => write!(f, "ROLE"),
            PermissionSource::Custom => write!(f, "CUSTOM"),
            PermissionSource::None => write!(f, "NONE"),
        }
    }
}

/// Kind of per-member override. Doubles as the requested action on the
/// update endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantType {
    Grant,
    Revoke,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::Grant => "grant",
            GrantType::Revoke => "revoke",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GrantType {
    type Err = WorkmindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grant" => Ok(GrantType::Grant),
            "revoke" => Ok(GrantType::Revoke),
            _ => Err(WorkmindError::UnknownAction(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermission {
    pub permission_name: String,
    pub is_allowed: bool,
    pub source: PermissionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_grant_type: Option<GrantType>,
}

impl EffectivePermission {
    pub fn from_role(name: &str, allowed: bool) -> Self {
        Self {
            permission_name: name.to_string(),
            is_allowed: allowed,
            source: if allowed {
                PermissionSource::Role
            } else {
                PermissionSource::None
            },
            custom_grant_type: None,
        }
    }

    pub fn from_override(name: &str, grant: GrantType) -> Self {
        Self {
            permission_name: name.to_string(),
            is_allowed: grant == GrantType::Grant,
            source: PermissionSource::Custom,
            custom_grant_type: Some(grant),
        }
    }

    /// Denied view used for names the backend did not report.
    pub fn absent(name: &str) -> Self {
        Self::from_role(name, false)
    }

    /// Checks the override consistency rules.
    pub fn validate(&self) -> Result<(), WorkmindError> {
        let invalid = |reason: &str| WorkmindError::InvalidRecord {
            name: self.permission_name.clone(),
            reason: reason.to_string(),
        };
        if self.permission_name.is_empty() {
            return Err(invalid("empty permission name"));
        }
        match (self.source, self.custom_grant_type) {
            (PermissionSource::Custom, Some(grant)) => {
                if self.is_allowed != (grant == GrantType::Grant) {
                    return Err(invalid("is_allowed disagrees with custom_grant_type"));
                }
            }
            (PermissionSource::Custom, None) => {
                return Err(invalid("CUSTOM source without custom_grant_type"));
            }
            (_, Some(_)) => return Err(invalid("custom_grant_type on a non-CUSTOM source")),
            (PermissionSource::None, None) if self.is_allowed => {
                return Err(invalid("NONE source cannot allow"));
            }
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPermissionsResponse {
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePermissionRequest {
    pub permission_name: String,
    pub action: GrantType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A workspace as listed for one user, with that user's role in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    #[serde(flatten)]
    pub workspace: Workspace,
    pub user_role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceMember {
    pub id: String,
    pub workspace_id: String,
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(rename = "workspaceRole")]
    pub workspace_role: Role,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    pub role_name: String,
}

/// Partial update; absent fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateWorkspaceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
        }
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvitationStatus {
    type Err = WorkmindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvitationStatus::Pending),
            "accepted" => Ok(InvitationStatus::Accepted),
            _ => Err(WorkmindError::UnknownInvitationStatus(s.to_string())),
        }
    }
}

/// An invitation to join a workspace with a given role. The token is what
/// the invitee presents to accept it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: String,
    pub workspace_id: String,
    pub email: String,
    #[serde(rename = "workspaceRole")]
    pub role: Role,
    pub invited_by: String,
    pub token: String,
    pub expires_at: String,
    pub status: InvitationStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteMemberRequest {
    pub email: String,
    pub role_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptInvitationRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptInvitationResponse {
    pub message: String,
    pub workspace: Workspace,
    pub role: Role,
    pub member: WorkspaceMember,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_permission_wire_format() {
        let json = r#"{"permission_name":"chatbot.update","is_allowed":true,"source":"ROLE"}"#;
        let p: EffectivePermission = serde_json::from_str(json).unwrap();
        assert_eq!(p.source, PermissionSource::Role);
        assert!(p.custom_grant_type.is_none());
        p.validate().unwrap();

        let custom = EffectivePermission::from_override("document.delete", GrantType::Revoke);
        let out = serde_json::to_value(&custom).unwrap();
        assert_eq!(out["source"], "CUSTOM");
        assert_eq!(out["custom_grant_type"], "revoke");
        assert_eq!(out["is_allowed"], false);
    }

    #[test]
    fn override_constructors_satisfy_invariant() {
        for grant in [GrantType::Grant, GrantType::Revoke] {
            let p = EffectivePermission::from_override("member.view", grant);
            p.validate().unwrap();
            assert_eq!(p.is_allowed, grant == GrantType::Grant);
        }
        EffectivePermission::from_role("member.view", true).validate().unwrap();
        EffectivePermission::from_role("member.view", false).validate().unwrap();
    }

    #[test]
    fn inconsistent_records_rejected() {
        let mut p = EffectivePermission::from_override("chatbot.delete", GrantType::Grant);
        p.is_allowed = false;
        assert!(p.validate().is_err());

        let mut p = EffectivePermission::from_role("chatbot.delete", true);
        p.custom_grant_type = Some(GrantType::Grant);
        assert!(p.validate().is_err());

        let mut p = EffectivePermission::from_override("chatbot.delete", GrantType::Grant);
        p.custom_grant_type = None;
        assert!(p.validate().is_err());

        let mut p = EffectivePermission::absent("chatbot.delete");
        p.is_allowed = true;
        assert!(p.validate().is_err());
    }

    #[test]
    fn grant_type_parse() {
        assert_eq!("grant".parse::<GrantType>().unwrap(), GrantType::Grant);
        assert_eq!("Revoke".parse::<GrantType>().unwrap(), GrantType::Revoke);
        assert!("reset".parse::<GrantType>().is_err());
    }

    #[test]
    fn member_role_uses_camel_case_key() {
        let json = r#"{"id":"m1","workspace_id":"w1","user_id":"u1","email":"a@b.c",
            "workspaceRole":"Editor","created_at":"t","updated_at":"t"}"#;
        let m: WorkspaceMember = serde_json::from_str(json).unwrap();
        assert_eq!(m.workspace_role, Role::Editor);
        assert!(m.full_name.is_none());
    }

    #[test]
    fn invitation_wire_format() {
        let json = r#"{"id":"i1","workspace_id":"w1","email":"a@b.c","workspaceRole":"Viewer",
            "invited_by":"u1","token":"t","expires_at":"2026-01-08 00:00:00","status":"pending",
            "created_at":"t","updated_at":"t"}"#;
        let inv: Invitation = serde_json::from_str(json).unwrap();
        assert_eq!(inv.role, Role::Viewer);
        assert_eq!(inv.status, InvitationStatus::Pending);
        assert_eq!("accepted".parse::<InvitationStatus>().unwrap(), InvitationStatus::Accepted);
        assert!("expired".parse::<InvitationStatus>().is_err());
    }

    #[test]
    fn workspace_update_omits_unset_fields() {
        let req = UpdateWorkspaceRequest {
            name: Some("Renamed".into()),
            description: None,
        };
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"name":"Renamed"}"#);
    }
}

//! Permission catalog: every permission identifier the workspace UI knows
//! about, grouped by resource category with display metadata.
//!
//! The catalog is presentational. Whether a name is valid for a given
//! member is decided by what the resolver returns, not by this list.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const WORKSPACE_UPDATE: &str = "workspace.update";
pub const WORKSPACE_VIEW_SETTINGS: &str = "workspace.view_settings";
pub const WORKSPACE_DELETE: &str = "workspace.delete";
pub const MEMBER_VIEW: &str = "member.view";
pub const MEMBER_INVITE: &str = "member.invite";
pub const MEMBER_UPDATE_ROLE: &str = "member.update_role";
pub const MEMBER_REMOVE: &str = "member.remove";
pub const CHATBOT_VIEW: &str = "chatbot.view";
pub const CHATBOT_CREATE: &str = "chatbot.create";
pub const CHATBOT_UPDATE: &str = "chatbot.update";
pub const CHATBOT_CHAT: &str = "chatbot.chat";
pub const CHATBOT_VIEW_LOGS: &str = "chatbot.view_logs";
pub const CHATBOT_DELETE: &str = "chatbot.delete";
pub const DOCUMENT_VIEW: &str = "document.view";
pub const DOCUMENT_UPLOAD: &str = "document.upload";
pub const DOCUMENT_UPDATE: &str = "document.update";
pub const DOCUMENT_DELETE: &str = "document.delete";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionCategory {
    Workspace,
    Member,
    Chatbot,
    Document,
}

impl PermissionCategory {
    /// Display order.
    pub const ALL: [PermissionCategory; 4] = [
        PermissionCategory::Workspace,
        PermissionCategory::Member,
        PermissionCategory::Chatbot,
        PermissionCategory::Document,
    ];
}

impl fmt::Display for PermissionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionCategory::Workspace => write!(f, "Workspace"),
            PermissionCategory::Member => write!(f, "Member"),
            PermissionCategory::Chatbot => write!(f, "Chatbot"),
            PermissionCategory::Document => write!(f, "Document"),
        }
    }
}

/// (category, name, label, description)
pub const PERMISSIONS: &[(PermissionCategory, &str, &str, &str)] = &[
    (PermissionCategory::Workspace, WORKSPACE_UPDATE, "Update Workspace", "Edit name, description, settings"),
    (PermissionCategory::Workspace, WORKSPACE_VIEW_SETTINGS, "View Settings", "Access workspace settings page"),
    (PermissionCategory::Workspace, WORKSPACE_DELETE, "Delete Workspace", "Permanently delete workspace"),
    (PermissionCategory::Member, MEMBER_VIEW, "View Members", "See member list"),
    (PermissionCategory::Member, MEMBER_INVITE, "Invite Members", "Invite new users"),
    (PermissionCategory::Member, MEMBER_UPDATE_ROLE, "Update Role", "Change member roles"),
    (PermissionCategory::Member, MEMBER_REMOVE, "Remove Members", "Remove users from workspace"),
    (PermissionCategory::Chatbot, CHATBOT_VIEW, "View Chatbots", "See list of chatbots"),
    (PermissionCategory::Chatbot, CHATBOT_CREATE, "Create Chatbot", "Create new bots"),
    (PermissionCategory::Chatbot, CHATBOT_UPDATE, "Update Chatbot", "Edit bot configurations"),
    (PermissionCategory::Chatbot, CHATBOT_CHAT, "Chat with Bot", "Send messages to bot"),
    (PermissionCategory::Chatbot, CHATBOT_VIEW_LOGS, "View Logs", "Access conversation history"),
    (PermissionCategory::Chatbot, CHATBOT_DELETE, "Delete Chatbot", "Remove bots"),
    (PermissionCategory::Document, DOCUMENT_VIEW, "View Documents", "See knowledge base"),
    (PermissionCategory::Document, DOCUMENT_UPLOAD, "Upload Documents", "Add new files/urls"),
    (PermissionCategory::Document, DOCUMENT_UPDATE, "Update Documents", "Re-train or edit docs"),
    (PermissionCategory::Document, DOCUMENT_DELETE, "Delete Documents", "Remove documents"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionInfo {
    pub name: String,
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: PermissionCategory,
    pub permissions: Vec<PermissionInfo>,
}

/// The full catalog, categories in display order, items in declaration order.
pub fn catalog() -> Vec<CategoryGroup> {
    PermissionCategory::ALL
        .iter()
        .map(|category| CategoryGroup {
            category: *category,
            permissions: PERMISSIONS
                .iter()
                .filter(|(c, ..)| c == category)
                .map(|(_, name, label, description)| PermissionInfo {
                    name: name.to_string(),
                    label: label.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        })
        .collect()
}

pub fn lookup(name: &str) -> Option<PermissionInfo> {
    PERMISSIONS
        .iter()
        .find(|(_, n, ..)| *n == name)
        .map(|(_, name, label, description)| PermissionInfo {
            name: name.to_string(),
            label: label.to_string(),
            description: description.to_string(),
        })
}

pub fn category_of(name: &str) -> Option<PermissionCategory> {
    PERMISSIONS
        .iter()
        .find(|(_, n, ..)| *n == name)
        .map(|(c, ..)| *c)
}

pub fn is_known(name: &str) -> bool {
    PERMISSIONS.iter().any(|(_, n, ..)| *n == name)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    PERMISSIONS.iter().map(|(_, name, ..)| *name)
}

//! Permission gate over the current user's flat permission list.
//!
//! Every predicate answers `false` until a load has completed successfully.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    Failed,
}

/// Permissions of the current user in the selected workspace.
#[derive(Debug, Clone, Default)]
pub struct WorkspacePermissionSet {
    workspace_id: Option<String>,
    state: LoadState,
    permissions: HashSet<String>,
}

impl WorkspacePermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was held with an empty set awaiting `workspace_id`.
    pub fn begin_loading(&mut self, workspace_id: &str) {
        self.workspace_id = Some(workspace_id.to_string());
        self.state = LoadState::Loading;
        self.permissions.clear();
    }

    pub fn finish_loading(&mut self, permissions: Vec<String>) {
        self.permissions = permissions.into_iter().collect();
        self.state = LoadState::Loaded;
    }

    pub fn fail_loading(&mut self) {
        self.permissions.clear();
        self.state = LoadState::Failed;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    pub fn workspace_id(&self) -> Option<&str> {
        self.workspace_id.as_deref()
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.is_loaded() && self.permissions.contains(name)
    }

    pub fn has_any_permission(&self, names: &[&str]) -> bool {
        self.is_loaded() && names.iter().any(|n| self.permissions.contains(*n))
    }

    pub fn has_all_permissions(&self, names: &[&str]) -> bool {
        self.is_loaded() && names.iter().all(|n| self.permissions.contains(*n))
    }

    /// Sorted copy of the granted names.
    pub fn permissions(&self) -> Vec<String> {
        let mut list: Vec<String> = self.permissions.iter().cloned().collect();
        list.sort();
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{self, *};

    fn loaded(perms: &[&str]) -> WorkspacePermissionSet {
        let mut set = WorkspacePermissionSet::new();
        set.begin_loading("w1");
        set.finish_loading(perms.iter().map(|p| p.to_string()).collect());
        set
    }

    #[test]
    fn fail_closed_before_load() {
        let mut set = WorkspacePermissionSet::new();
        for name in catalog::names() {
            assert!(!set.has_permission(name));
        }
        set.begin_loading("w1");
        assert!(set.is_loading());
        assert!(!set.has_any_permission(&[CHATBOT_VIEW]));
        assert!(!set.has_all_permissions(&[]));
    }

    #[test]
    fn fail_closed_after_failed_load() {
        let mut set = loaded(&[CHATBOT_VIEW]);
        set.begin_loading("w2");
        set.fail_loading();
        assert_eq!(set.state(), LoadState::Failed);
        assert_eq!(set.workspace_id(), Some("w2"));
        for name in catalog::names() {
            assert!(!set.has_permission(name));
        }
    }

    #[test]
    fn predicates_over_loaded_set() {
        let set = loaded(&[CHATBOT_VIEW, DOCUMENT_VIEW]);
        assert!(set.has_permission(CHATBOT_VIEW));
        assert!(!set.has_permission(CHATBOT_DELETE));
        assert!(set.has_any_permission(&[CHATBOT_DELETE, DOCUMENT_VIEW]));
        assert!(!set.has_any_permission(&[CHATBOT_DELETE, MEMBER_REMOVE]));
        assert!(set.has_all_permissions(&[CHATBOT_VIEW, DOCUMENT_VIEW]));
        assert!(!set.has_all_permissions(&[CHATBOT_VIEW, MEMBER_REMOVE]));
        assert!(set.has_all_permissions(&[]));
        assert!(!set.has_any_permission(&[]));
    }

    #[test]
    fn switching_workspace_replaces_set() {
        let mut set = loaded(&[CHATBOT_VIEW, MEMBER_INVITE]);
        set.begin_loading("w2");
        set.finish_loading(vec![DOCUMENT_VIEW.to_string()]);
        assert!(!set.has_permission(CHATBOT_VIEW));
        assert!(set.has_permission(DOCUMENT_VIEW));
        assert_eq!(set.permissions(), vec![DOCUMENT_VIEW.to_string()]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut set = loaded(&[CHATBOT_VIEW]);
        set.clear();
        assert_eq!(set.state(), LoadState::NotLoaded);
        assert!(set.workspace_id().is_none());
        assert!(!set.has_permission(CHATBOT_VIEW));
    }
}

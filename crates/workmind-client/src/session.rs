//! Application state for one logged-in user: the selected workspace and
//! the gate over that user's permissions in it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};
use workmind_core::config::ClientSettings;
use workmind_core::rules::{self, InvitationActions, MemberActions};
use workmind_core::{LoadState, Role, WorkspacePermissionSet};

use crate::api::{ApiClient, PermissionsApi};
use crate::error::Result;
use crate::notify::{Notice, Notifier};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedWorkspace {
    pub workspace_id: String,
    pub role: Role,
}

#[derive(Debug, Default)]
struct SessionState {
    selected: Option<SelectedWorkspace>,
    permissions: WorkspacePermissionSet,
    generation: u64,
}

pub struct Session {
    api: Arc<dyn PermissionsApi>,
    notifier: Arc<dyn Notifier>,
    next_generation: AtomicU64,
    state: RwLock<SessionState>,
}

impl Session {
    /// Starts a session against the configured server with `token`.
    pub fn login(
        settings: &ClientSettings,
        token: &str,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let api = ApiClient::from_settings(settings, token)?;
        Ok(Self::with_api(Arc::new(api), notifier))
    }

    pub fn with_api(api: Arc<dyn PermissionsApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            next_generation: AtomicU64::new(0),
            state: RwLock::new(SessionState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Switches to `workspace_id` and loads the user's permissions there.
    /// The previous workspace's set is dropped before the fetch starts.
    pub async fn select_workspace(&self, workspace_id: &str, role: Role) -> bool {
        {
            let mut state = self.write();
            state.selected = Some(SelectedWorkspace {
                workspace_id: workspace_id.to_string(),
                role,
            });
        }
        info!("Selected workspace {workspace_id} as {role}");
        self.reload_permissions().await
    }

    /// Fetches the flat permission list for the selected workspace. Returns
    /// whether the response was applied.
    pub async fn reload_permissions(&self) -> bool {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let workspace_id = {
            let mut state = self.write();
            let Some(workspace_id) = state.selected.as_ref().map(|s| s.workspace_id.clone())
            else {
                return false;
            };
            state.generation = generation;
            state.permissions.begin_loading(&workspace_id);
            workspace_id
        };

        let result = self.api.fetch_user_permissions(&workspace_id).await;

        let mut state = self.write();
        if state.generation != generation {
            debug!("Discarding permissions for {workspace_id} (superseded)");
            return false;
        }
        match result {
            Ok(permissions) => {
                debug!(
                    "Loaded {} permissions for workspace {workspace_id}",
                    permissions.len()
                );
                state.permissions.finish_loading(permissions);
                true
            }
            Err(e) => {
                state.permissions.fail_loading();
                drop(state);
                self.notifier
                    .notify(Notice::error(format!("Failed to load permissions: {e}")));
                false
            }
        }
    }

    /// Clears the selection and permissions; in-flight loads are discarded.
    pub fn logout(&self) {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.write();
        state.selected = None;
        state.permissions.clear();
        state.generation = generation;
        info!("Session cleared");
    }

    pub fn selected_workspace(&self) -> Option<SelectedWorkspace> {
        self.read().selected.clone()
    }

    pub fn load_state(&self) -> LoadState {
        self.read().permissions.state()
    }

    pub fn is_loading(&self) -> bool {
        self.read().permissions.is_loading()
    }

    pub fn permissions(&self) -> Vec<String> {
        self.read().permissions.permissions()
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.read().permissions.has_permission(name)
    }

    pub fn has_any_permission(&self, names: &[&str]) -> bool {
        self.read().permissions.has_any_permission(names)
    }

    pub fn has_all_permissions(&self, names: &[&str]) -> bool {
        self.read().permissions.has_all_permissions(names)
    }

    /// What the current user may do to a member holding `target`.
    pub fn member_actions(&self, target: Role) -> MemberActions {
        let state = self.read();
        match &state.selected {
            Some(selected) => rules::member_actions(&state.permissions, selected.role, target),
            None => MemberActions::default(),
        }
    }

    /// What the current user may do to pending invitations.
    pub fn invitation_actions(&self) -> InvitationActions {
        rules::invitation_actions(&self.read().permissions)
    }

    pub fn assignable_roles(&self) -> Vec<Role> {
        match &self.read().selected {
            Some(selected) => rules::assignable_roles(selected.role),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::notify::CollectingNotifier;
    use crate::testing::FakeApi;
    use workmind_core::catalog::*;

    fn session(api: &Arc<FakeApi>) -> (Arc<Session>, Arc<CollectingNotifier>) {
        let notifier = Arc::new(CollectingNotifier::new());
        (
            Arc::new(Session::with_api(api.clone(), notifier.clone())),
            notifier,
        )
    }

    #[tokio::test]
    async fn test_gate_false_before_selection() {
        let api = Arc::new(FakeApi::new());
        let (session, _) = session(&api);
        assert_eq!(session.load_state(), LoadState::NotLoaded);
        assert!(!session.has_permission(CHATBOT_VIEW));
        assert!(!session.has_all_permissions(&[]));
        assert!(session.assignable_roles().is_empty());
    }

    #[tokio::test]
    async fn test_select_workspace_loads_gate() {
        let api = Arc::new(FakeApi::new());
        api.set_user_permissions("w1", &[CHATBOT_VIEW, MEMBER_VIEW, MEMBER_UPDATE_ROLE]);
        let (session, _) = session(&api);

        assert!(session.select_workspace("w1", Role::Admin).await);
        assert!(session.has_permission(CHATBOT_VIEW));
        assert!(session.has_any_permission(&[CHATBOT_DELETE, MEMBER_VIEW]));
        assert!(!session.has_all_permissions(&[CHATBOT_VIEW, CHATBOT_DELETE]));
        assert!(session.has_all_permissions(&[]));

        let invitations = session.invitation_actions();
        assert!(!invitations.can_resend);
        assert!(!invitations.can_cancel);

        let editor = session.member_actions(Role::Editor);
        assert!(editor.can_edit);
        assert!(!editor.can_remove);
        assert!(!session.member_actions(Role::Admin).can_edit);
        assert_eq!(
            session.assignable_roles(),
            vec![Role::Editor, Role::Viewer]
        );
    }

    #[tokio::test]
    async fn test_invitation_actions_follow_loaded_gate() {
        let api = Arc::new(FakeApi::new());
        api.set_user_permissions("w1", &[MEMBER_VIEW, MEMBER_INVITE]);
        let (session, _) = session(&api);

        assert!(session.select_workspace("w1", Role::Editor).await);
        let actions = session.invitation_actions();
        assert!(actions.can_resend);
        assert!(!actions.can_cancel);
    }

    #[tokio::test]
    async fn test_transport_failure_fails_closed() {
        let api = Arc::new(FakeApi::new());
        api.set_user_permissions("w1", &[CHATBOT_VIEW]);
        api.set_user_permissions("w2", &[CHATBOT_VIEW]);
        let (session, notifier) = session(&api);
        session.select_workspace("w1", Role::Viewer).await;
        assert!(session.has_permission(CHATBOT_VIEW));

        api.fail_next(ClientError::Transport("connection refused".into()));
        assert!(!session.select_workspace("w2", Role::Viewer).await);
        assert_eq!(session.load_state(), LoadState::Failed);
        for name in names() {
            assert!(!session.has_permission(name));
        }
        assert!(!session.has_any_permission(&[CHATBOT_VIEW]));
        assert_eq!(notifier.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_slow_load_for_previous_workspace_is_discarded() {
        let api = Arc::new(FakeApi::new());
        api.set_user_permissions("w2", &[MEMBER_VIEW]);
        let (session, _) = session(&api);

        let held = api.hold_next_user_fetch();
        let slow = {
            let session = session.clone();
            tokio::spawn(async move { session.select_workspace("w1", Role::Owner).await })
        };
        api.wait_for_held().await;
        assert!(session.is_loading());

        assert!(session.select_workspace("w2", Role::Viewer).await);
        held.release(vec![WORKSPACE_DELETE.to_string()]);
        assert!(!slow.await.unwrap());

        assert_eq!(
            session.selected_workspace().map(|s| s.workspace_id),
            Some("w2".to_string())
        );
        assert!(session.has_permission(MEMBER_VIEW));
        assert!(!session.has_permission(WORKSPACE_DELETE));
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let api = Arc::new(FakeApi::new());
        api.set_user_permissions("w1", &[CHATBOT_VIEW]);
        let (session, _) = session(&api);
        session.select_workspace("w1", Role::Editor).await;

        session.logout();
        assert!(session.selected_workspace().is_none());
        assert_eq!(session.load_state(), LoadState::NotLoaded);
        assert!(!session.has_permission(CHATBOT_VIEW));
        assert!(!session.reload_permissions().await);
    }
}

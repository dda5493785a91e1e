//! In-memory `PermissionsApi` for unit tests, resolving through the same
//! core resolver the server uses.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::{Notify, oneshot};
use workmind_core::{EffectivePermission, GrantType, Role, catalog, resolver};

use crate::api::PermissionsApi;
use crate::error::{ClientError, Result};

#[derive(Default)]
struct FakeState {
    members: HashMap<String, (String, Role)>,
    overrides: HashMap<String, HashMap<String, GrantType>>,
    user_permissions: HashMap<String, Vec<String>>,
    fail_next: Option<ClientError>,
    respond_next: Option<Vec<EffectivePermission>>,
    held_effective: Option<oneshot::Receiver<Vec<EffectivePermission>>>,
    held_user: Option<oneshot::Receiver<Vec<String>>>,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
    requests: AtomicUsize,
    mutations: AtomicUsize,
    held: Notify,
}

/// A fetch parked until `release` supplies its response.
pub(crate) struct Held<T> {
    tx: oneshot::Sender<T>,
}

impl<T> Held<T> {
    pub fn release(self, value: T) {
        let _ = self.tx.send(value);
    }
}

impl Held<Vec<EffectivePermission>> {
    /// Releases with the Viewer role defaults and no overrides.
    pub fn release_with_role_defaults(self) {
        self.release(resolver::resolve(Role::Viewer, &HashMap::new()));
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn add_member(&self, workspace_id: &str, member_id: &str, role: Role) {
        self.state()
            .members
            .insert(member_id.to_string(), (workspace_id.to_string(), role));
    }

    pub fn set_override(&self, member_id: &str, permission: &str, grant: GrantType) {
        self.state()
            .overrides
            .entry(member_id.to_string())
            .or_default()
            .insert(permission.to_string(), grant);
    }

    pub fn has_override(&self, member_id: &str, permission: &str) -> bool {
        self.state()
            .overrides
            .get(member_id)
            .is_some_and(|m| m.contains_key(permission))
    }

    pub fn set_user_permissions(&self, workspace_id: &str, permissions: &[&str]) {
        self.state().user_permissions.insert(
            workspace_id.to_string(),
            permissions.iter().map(|p| p.to_string()).collect(),
        );
    }

    pub fn fail_next(&self, error: ClientError) {
        self.state().fail_next = Some(error);
    }

    pub fn respond_next_with(&self, records: Vec<EffectivePermission>) {
        self.state().respond_next = Some(records);
    }

    pub fn hold_next_fetch(&self) -> Held<Vec<EffectivePermission>> {
        let (tx, rx) = oneshot::channel();
        self.state().held_effective = Some(rx);
        Held { tx }
    }

    pub fn hold_next_user_fetch(&self) -> Held<Vec<String>> {
        let (tx, rx) = oneshot::channel();
        self.state().held_user = Some(rx);
        Held { tx }
    }

    /// Resolves once a fetch has parked on a hold.
    pub async fn wait_for_held(&self) {
        self.held.notified().await;
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn member_role(&self, workspace_id: &str, member_id: &str) -> Result<Role> {
        match self.state().members.get(member_id) {
            Some((ws, role)) if ws == workspace_id => Ok(*role),
            _ => Err(ClientError::NotFound(format!("member {member_id}"))),
        }
    }
}

#[async_trait]
impl PermissionsApi for FakeApi {
    async fn fetch_user_permissions(&self, workspace_id: &str) -> Result<Vec<String>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let held = {
            let mut state = self.state();
            if let Some(e) = state.fail_next.take() {
                return Err(e);
            }
            state.held_user.take()
        };
        if let Some(rx) = held {
            self.held.notify_one();
            return rx
                .await
                .map_err(|_| ClientError::Transport("held fetch dropped".into()));
        }
        self.state()
            .user_permissions
            .get(workspace_id)
            .cloned()
            .ok_or_else(|| ClientError::Forbidden("not a member of this workspace".into()))
    }

    async fn fetch_effective_permissions(
        &self,
        workspace_id: &str,
        member_id: &str,
    ) -> Result<Vec<EffectivePermission>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let held = {
            let mut state = self.state();
            if let Some(e) = state.fail_next.take() {
                return Err(e);
            }
            if let Some(records) = state.respond_next.take() {
                return Ok(records);
            }
            state.held_effective.take()
        };
        if let Some(rx) = held {
            self.held.notify_one();
            return rx
                .await
                .map_err(|_| ClientError::Transport("held fetch dropped".into()));
        }

        let role = self.member_role(workspace_id, member_id)?;
        let overrides = self
            .state()
            .overrides
            .get(member_id)
            .cloned()
            .unwrap_or_default();
        Ok(resolver::resolve(role, &overrides))
    }

    async fn update_member_permission(
        &self,
        workspace_id: &str,
        member_id: &str,
        permission_name: &str,
        action: GrantType,
    ) -> Result<EffectivePermission> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.state().fail_next.take() {
            return Err(e);
        }
        self.member_role(workspace_id, member_id)?;
        if !catalog::is_known(permission_name) {
            return Err(ClientError::Validation(format!(
                "unknown permission: {permission_name}"
            )));
        }
        self.set_override(member_id, permission_name, action);
        Ok(EffectivePermission::from_override(permission_name, action))
    }

    async fn reset_member_permission(
        &self,
        workspace_id: &str,
        member_id: &str,
        permission_name: &str,
    ) -> Result<()> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.state().fail_next.take() {
            return Err(e);
        }
        self.member_role(workspace_id, member_id)?;
        if let Some(map) = self.state().overrides.get_mut(member_id) {
            map.remove(permission_name);
        }
        Ok(())
    }
}

//! Client-side view of one member's effective permissions.
//!
//! Fetches are tagged with a generation number; a response older than the
//! last applied one, or for a member no longer selected, is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;
use workmind_core::{EffectivePermission, EffectivePermissionMap, PermissionSource};

use crate::api::PermissionsApi;
use crate::error::ClientError;
use crate::notify::{Notice, Notifier};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    workspace_id: String,
    member_id: String,
}

#[derive(Debug, Default)]
struct ResolverState {
    target: Option<Target>,
    map: EffectivePermissionMap,
    loaded: bool,
    applied_generation: u64,
    in_flight: usize,
}

pub struct MemberPermissionResolver {
    api: Arc<dyn PermissionsApi>,
    notifier: Arc<dyn Notifier>,
    next_generation: AtomicU64,
    state: Mutex<ResolverState>,
}

impl MemberPermissionResolver {
    pub fn new(api: Arc<dyn PermissionsApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            next_generation: AtomicU64::new(0),
            state: Mutex::new(ResolverState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ResolverState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Fetches and indexes the member's permissions. Returns whether this
    /// response was applied. Errors become notices; the previous map stays.
    pub async fn load(&self, workspace_id: &str, member_id: &str) -> bool {
        if workspace_id.trim().is_empty() || member_id.trim().is_empty() {
            self.notifier.notify(Notice::error(
                "workspace id and member id are required to load permissions",
            ));
            return false;
        }

        let target = Target {
            workspace_id: workspace_id.to_string(),
            member_id: member_id.to_string(),
        };
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state();
            if state.target.as_ref() != Some(&target) {
                // Another member's data must never show under this one.
                state.target = Some(target.clone());
                state.map = EffectivePermissionMap::default();
                state.loaded = false;
            }
            state.in_flight += 1;
        }

        let result = self
            .api
            .fetch_effective_permissions(workspace_id, member_id)
            .await
            .and_then(|records| {
                EffectivePermissionMap::from_records(records).map_err(ClientError::from)
            });

        let mut state = self.state();
        state.in_flight = state.in_flight.saturating_sub(1);

        if generation <= state.applied_generation || state.target.as_ref() != Some(&target) {
            debug!("Discarding stale permissions response (generation {generation})");
            return false;
        }

        match result {
            Ok(map) => {
                debug!(
                    "Loaded {} permissions for member {member_id} in {workspace_id}",
                    map.len()
                );
                state.map = map;
                state.loaded = true;
                state.applied_generation = generation;
                true
            }
            Err(e) => {
                drop(state);
                self.notifier
                    .notify(Notice::error(format!("Failed to load permissions: {e}")));
                false
            }
        }
    }

    /// Reloads the current member, if any.
    pub async fn refresh(&self) -> bool {
        let target = self.state().target.clone();
        match target {
            Some(t) => self.load(&t.workspace_id, &t.member_id).await,
            None => false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state().in_flight > 0
    }

    /// Whether a map has been applied for the current member.
    pub fn is_loaded(&self) -> bool {
        self.state().loaded
    }

    /// Whether the loaded map belongs to this workspace and member.
    pub fn is_loaded_for(&self, workspace_id: &str, member_id: &str) -> bool {
        let state = self.state();
        state.loaded
            && state
                .target
                .as_ref()
                .is_some_and(|t| t.workspace_id == workspace_id && t.member_id == member_id)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state().map.contains(name)
    }

    /// Record for `name`; a name missing from the map is a denied `NONE` view.
    pub fn effective(&self, name: &str) -> EffectivePermission {
        self.state().map.effective(name)
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        self.state().map.is_allowed(name)
    }

    pub fn source(&self, name: &str) -> PermissionSource {
        self.state().map.source(name)
    }

    pub fn snapshot(&self) -> EffectivePermissionMap {
        self.state().map.clone()
    }

    pub fn clear(&self) {
        // Bumping the generation drops every in-flight response.
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state();
        state.target = None;
        state.map = EffectivePermissionMap::default();
        state.loaded = false;
        state.applied_generation = generation;
    }
}

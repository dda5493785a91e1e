//! Grant, revoke or reset a member's override, then reload that member.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::info;
use workmind_core::GrantType;

use crate::api::PermissionsApi;
use crate::error::{ClientError, Result};
use crate::notify::{Notice, Notifier};
use crate::resolver::MemberPermissionResolver;

pub struct OverrideFlow {
    api: Arc<dyn PermissionsApi>,
    notifier: Arc<dyn Notifier>,
    resolver: Arc<MemberPermissionResolver>,
    in_flight: AtomicUsize,
}

/// Decrements the in-flight count however the mutation ends.
struct Submitting<'a>(&'a AtomicUsize);

impl<'a> Submitting<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Submitting<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl OverrideFlow {
    pub fn new(
        api: Arc<dyn PermissionsApi>,
        notifier: Arc<dyn Notifier>,
        resolver: Arc<MemberPermissionResolver>,
    ) -> Self {
        Self {
            api,
            notifier,
            resolver,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn resolver(&self) -> &Arc<MemberPermissionResolver> {
        &self.resolver
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn grant(&self, workspace_id: &str, member_id: &str, permission: &str) -> bool {
        self.apply(workspace_id, member_id, permission, GrantType::Grant)
            .await
    }

    pub async fn revoke(&self, workspace_id: &str, member_id: &str, permission: &str) -> bool {
        self.apply(workspace_id, member_id, permission, GrantType::Revoke)
            .await
    }

    /// Sends the override and, on success, reloads the member so the
    /// resolver reflects the server's view. Returns whether it succeeded.
    pub async fn apply(
        &self,
        workspace_id: &str,
        member_id: &str,
        permission: &str,
        action: GrantType,
    ) -> bool {
        let _submitting = Submitting::start(&self.in_flight);

        let sent = match self.check(workspace_id, member_id, permission, true) {
            Ok(()) => {
                self.api
                    .update_member_permission(workspace_id, member_id, permission, action)
                    .await
            }
            Err(e) => Err(e),
        };

        match sent {
            Ok(record) => {
                info!(
                    "{action} {permission} for member {member_id} (allowed: {})",
                    record.is_allowed
                );
                let verb = match action {
                    GrantType::Grant => "granted",
                    GrantType::Revoke => "revoked",
                };
                self.notifier
                    .notify(Notice::success(format!("Permission {verb}: {permission}")));
                self.resolver.load(workspace_id, member_id).await;
                true
            }
            Err(e) => {
                self.notifier
                    .notify(Notice::error(format!("Failed to update permission: {e}")));
                false
            }
        }
    }

    /// Removes the override so the role default applies again. Resetting a
    /// permission without an override succeeds and changes nothing. Names
    /// missing from the loaded map are still sent, so overrides the server
    /// no longer reports can be cleared.
    pub async fn reset(&self, workspace_id: &str, member_id: &str, permission: &str) -> bool {
        let _submitting = Submitting::start(&self.in_flight);

        let sent = match self.check(workspace_id, member_id, permission, false) {
            Ok(()) => {
                self.api
                    .reset_member_permission(workspace_id, member_id, permission)
                    .await
            }
            Err(e) => Err(e),
        };

        match sent {
            Ok(()) => {
                info!("reset {permission} for member {member_id}");
                self.notifier
                    .notify(Notice::success(format!("Permission reset: {permission}")));
                self.resolver.load(workspace_id, member_id).await;
                true
            }
            Err(e) => {
                self.notifier
                    .notify(Notice::error(format!("Failed to reset permission: {e}")));
                false
            }
        }
    }

    fn check(
        &self,
        workspace_id: &str,
        member_id: &str,
        permission: &str,
        known_only: bool,
    ) -> Result<()> {
        if workspace_id.trim().is_empty() || member_id.trim().is_empty() {
            return Err(ClientError::Validation(
                "workspace id and member id are required".into(),
            ));
        }
        if permission.trim().is_empty() {
            return Err(ClientError::Validation("permission name required".into()));
        }
        // Names are only checkable against a map loaded for this member.
        if known_only
            && self.resolver.is_loaded_for(workspace_id, member_id)
            && !self.resolver.contains(permission)
        {
            return Err(ClientError::Validation(format!(
                "unknown permission: {permission}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{CollectingNotifier, NoticeLevel};
    use crate::testing::FakeApi;
    use workmind_core::{PermissionSource, Role};

    struct Fixture {
        api: Arc<FakeApi>,
        notifier: Arc<CollectingNotifier>,
        flow: OverrideFlow,
    }

    async fn fixture(role: Role) -> Fixture {
        let api = Arc::new(FakeApi::new());
        api.add_member("w1", "m1", role);
        let notifier = Arc::new(CollectingNotifier::new());
        let resolver = Arc::new(MemberPermissionResolver::new(
            api.clone(),
            notifier.clone(),
        ));
        resolver.load("w1", "m1").await;
        let flow = OverrideFlow::new(api.clone(), notifier.clone(), resolver);
        Fixture {
            api,
            notifier,
            flow,
        }
    }

    #[tokio::test]
    async fn test_grant_is_visible_after_refetch() {
        let f = fixture(Role::Editor).await;
        assert!(!f.flow.resolver().is_allowed("document.delete"));

        assert!(f.flow.grant("w1", "m1", "document.delete").await);
        let record = f.flow.resolver().effective("document.delete");
        assert!(record.is_allowed);
        assert_eq!(record.source, PermissionSource::Custom);
        assert_eq!(record.custom_grant_type, Some(GrantType::Grant));
        assert!(!f.flow.is_submitting());

        let notices = f.notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Success);
    }

    #[tokio::test]
    async fn test_regrant_is_idempotent() {
        let f = fixture(Role::Viewer).await;
        f.flow.grant("w1", "m1", "chatbot.create").await;
        let once = f.flow.resolver().snapshot();
        f.flow.grant("w1", "m1", "chatbot.create").await;
        assert_eq!(f.flow.resolver().snapshot(), once);
    }

    #[tokio::test]
    async fn test_grant_then_revoke_denies_regardless_of_role() {
        let f = fixture(Role::Editor).await;
        // chatbot.view is an Editor default.
        f.flow.grant("w1", "m1", "chatbot.view").await;
        f.flow.revoke("w1", "m1", "chatbot.view").await;

        let record = f.flow.resolver().effective("chatbot.view");
        assert!(!record.is_allowed);
        assert_eq!(record.source, PermissionSource::Custom);
        assert_eq!(record.custom_grant_type, Some(GrantType::Revoke));
    }

    #[tokio::test]
    async fn test_reset_restores_role_default() {
        let f = fixture(Role::Editor).await;
        f.flow.revoke("w1", "m1", "chatbot.chat").await;
        assert!(!f.flow.resolver().is_allowed("chatbot.chat"));

        assert!(f.flow.reset("w1", "m1", "chatbot.chat").await);
        let record = f.flow.resolver().effective("chatbot.chat");
        assert!(record.is_allowed);
        assert_eq!(record.source, PermissionSource::Role);

        // Nothing left to remove; still a success.
        assert!(f.flow.reset("w1", "m1", "chatbot.chat").await);
    }

    #[tokio::test]
    async fn test_unknown_name_is_refused_locally() {
        let f = fixture(Role::Owner).await;
        assert!(!f.flow.grant("w1", "m1", "chatbot.teleport").await);
        assert_eq!(f.api.mutation_count(), 0);
        assert_eq!(f.notifier.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_leaves_state_untouched() {
        let f = fixture(Role::Viewer).await;
        let before = f.flow.resolver().snapshot();
        let requests = f.api.request_count();

        f.api.fail_next(ClientError::Forbidden("missing permission".into()));
        assert!(!f.flow.grant("w1", "m1", "document.upload").await);
        assert_eq!(f.flow.resolver().snapshot(), before);
        // No refetch after a failed mutation.
        assert_eq!(f.api.request_count(), requests);
        assert!(f.notifier.errors()[0].message.contains("missing permission"));
    }

    #[tokio::test]
    async fn test_reset_clears_override_missing_from_map() {
        let f = fixture(Role::Editor).await;
        f.api.set_override("m1", "chatbot.legacy", GrantType::Grant);
        f.flow.resolver().load("w1", "m1").await;
        assert!(!f.flow.resolver().contains("chatbot.legacy"));

        assert!(f.flow.reset("w1", "m1", "chatbot.legacy").await);
        assert_eq!(f.api.mutation_count(), 1);
        assert!(!f.api.has_override("m1", "chatbot.legacy"));
        assert!(f.notifier.errors().is_empty());
    }
}

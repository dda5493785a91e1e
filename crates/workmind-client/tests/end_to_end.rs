use std::sync::Arc;

use workmind_auth::{PermissionStore, SqliteStore, create_jwt};
use workmind_client::{
    ApiClient, ClientError, CollectingNotifier, MemberPermissionResolver, OverrideFlow,
    PermissionsApi, Session,
};
use workmind_core::catalog::*;
use workmind_core::config::ClientSettings;
use workmind_core::{GrantType, LoadState, PermissionSource, Role};

const SECRET: &str = "e2e-secret";

async fn spawn_server() -> String {
    let store = SqliteStore::open_in_memory().unwrap();
    store.migrate().await.unwrap();
    let store: Arc<dyn PermissionStore> = Arc::new(store);
    let app = workmind_web::build_app(store, SECRET);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base: &str, user: &str) -> ApiClient {
    let token = create_jwt(user, &format!("{user}@example.com"), SECRET).unwrap();
    ApiClient::new(base, &token).unwrap()
}

struct World {
    base: String,
    workspace_id: String,
    editor_member_id: String,
}

/// Alice owns W1; Bob is an Editor (M1); Carol is an Admin.
async fn world() -> World {
    let base = spawn_server().await;
    let alice = client(&base, "alice");
    let ws = alice.create_workspace("W1", None).await.unwrap();
    let bob = alice
        .add_member(&ws.workspace.id, "bob", "bob@example.com", Some("Bob"), Role::Editor)
        .await
        .unwrap();
    alice
        .add_member(&ws.workspace.id, "carol", "carol@example.com", None, Role::Admin)
        .await
        .unwrap();
    World {
        base,
        workspace_id: ws.workspace.id,
        editor_member_id: bob.id,
    }
}

#[tokio::test]
async fn test_editor_defaults_resolve_from_role() {
    let w = world().await;
    let notifier = Arc::new(CollectingNotifier::new());
    let resolver =
        MemberPermissionResolver::new(Arc::new(client(&w.base, "carol")), notifier.clone());

    assert!(resolver.load(&w.workspace_id, &w.editor_member_id).await);
    let update = resolver.effective(CHATBOT_UPDATE);
    assert!(update.is_allowed);
    assert_eq!(update.source, PermissionSource::Role);
    let delete = resolver.effective(DOCUMENT_DELETE);
    assert!(!delete.is_allowed);
    assert_eq!(delete.source, PermissionSource::None);
    assert_eq!(resolver.snapshot().len(), 17);
    assert!(notifier.errors().is_empty());
}

#[tokio::test]
async fn test_admin_grant_shows_as_custom_after_refetch() {
    let w = world().await;
    let api: Arc<dyn PermissionsApi> = Arc::new(client(&w.base, "carol"));
    let notifier = Arc::new(CollectingNotifier::new());
    let resolver = Arc::new(MemberPermissionResolver::new(api.clone(), notifier.clone()));
    resolver.load(&w.workspace_id, &w.editor_member_id).await;
    let flow = OverrideFlow::new(api, notifier.clone(), resolver.clone());

    assert!(
        flow.grant(&w.workspace_id, &w.editor_member_id, DOCUMENT_DELETE)
            .await
    );
    let record = resolver.effective(DOCUMENT_DELETE);
    assert!(record.is_allowed);
    assert_eq!(record.source, PermissionSource::Custom);
    assert_eq!(record.custom_grant_type, Some(GrantType::Grant));

    // Bob's own gate now includes it.
    let session = Session::with_api(Arc::new(client(&w.base, "bob")), notifier.clone());
    assert!(session.select_workspace(&w.workspace_id, Role::Editor).await);
    assert!(session.has_permission(DOCUMENT_DELETE));

    // Reset goes back to the Editor default.
    assert!(
        flow.reset(&w.workspace_id, &w.editor_member_id, DOCUMENT_DELETE)
            .await
    );
    assert_eq!(
        resolver.effective(DOCUMENT_DELETE).source,
        PermissionSource::None
    );
}

#[tokio::test]
async fn test_server_refuses_admin_editing_admin() {
    let w = world().await;
    let carol = client(&w.base, "carol");
    let members = carol.list_members(&w.workspace_id).await.unwrap();
    let carol_member = members.iter().find(|m| m.user_id == "carol").unwrap();

    let alice = client(&w.base, "alice");
    let dave = alice
        .add_member(&w.workspace_id, "dave", "dave@example.com", None, Role::Admin)
        .await
        .unwrap();

    let err = carol
        .update_member_permission(&w.workspace_id, &dave.id, CHATBOT_DELETE, GrantType::Revoke)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Forbidden(_)));

    // Owner may edit an Admin.
    alice
        .update_member_permission(
            &w.workspace_id,
            &carol_member.id,
            CHATBOT_DELETE,
            GrantType::Revoke,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unreachable_server_fails_closed() {
    // Reserve a port, then free it so connections are refused.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let settings = ClientSettings {
        base_url: format!("http://{addr}"),
        timeout_secs: 2,
        ..ClientSettings::default()
    };
    let notifier = Arc::new(CollectingNotifier::new());
    let session = Session::login(&settings, "any-token", notifier.clone()).unwrap();

    assert!(!session.select_workspace("w2", Role::Admin).await);
    assert_eq!(session.load_state(), LoadState::Failed);
    for name in names() {
        assert!(!session.has_permission(name));
    }
    assert!(!session.member_actions(Role::Viewer).any());
    assert_eq!(notifier.errors().len(), 1);
}

#[tokio::test]
async fn test_catalog_and_workspace_listing() {
    let w = world().await;
    let bob = client(&w.base, "bob");

    let catalog = bob.fetch_catalog().await.unwrap();
    assert_eq!(catalog.len(), 4);

    let workspaces = bob.list_workspaces().await.unwrap();
    assert_eq!(workspaces.len(), 1);
    assert_eq!(workspaces[0].user_role, Role::Editor);
}

mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Extension, Router};
use tower_http::trace::TraceLayer;
use workmind_auth::{AuthState, PermissionStore, SqliteStore};
use workmind_core::config::ServerSettings;

use state::AppState;

/// Builds the full router around an already-migrated store.
pub fn build_app(store: Arc<dyn PermissionStore>, jwt_secret: &str) -> Router {
    let auth_state = AuthState {
        jwt_secret: jwt_secret.to_string(),
        store: store.clone(),
    };
    let state = Arc::new(AppState { store });

    routes::build_router(state)
        .layer(Extension(auth_state))
        .layer(TraceLayer::new_for_http())
}

/// Start the permission server. Opens (and migrates) the SQLite file named in settings.
pub async fn start_web_server(settings: &ServerSettings) -> anyhow::Result<()> {
    let store = SqliteStore::open(&settings.db_path)?;
    store.migrate().await?;
    let store: Arc<dyn PermissionStore> = Arc::new(store);

    let app = build_app(store, &settings.jwt_secret);

    let addr: SocketAddr = settings.listen_addr.parse()?;
    tracing::info!("Starting permission server on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use std::sync::Arc;

use workmind_auth::PermissionStore;

pub struct AppState {
    pub store: Arc<dyn PermissionStore>,
}

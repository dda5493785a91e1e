pub mod access;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod store;
pub mod types;

pub use access::WorkspaceAccess;
pub use error::AuthError;
pub use jwt::{AuthClaims, create_jwt, verify_jwt};
pub use middleware::{AuthState, AuthUser};
pub use store::{PermissionStore, SqliteStore};
pub use types::*;

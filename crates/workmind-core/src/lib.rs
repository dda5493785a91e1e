pub mod catalog;
pub mod config;
pub mod error;
pub mod gate;
pub mod resolver;
pub mod role;
pub mod rules;
pub mod types;

pub use error::{Result, WorkmindError};
pub use gate::{LoadState, WorkspacePermissionSet};
pub use resolver::EffectivePermissionMap;
pub use role::Role;
pub use types::*;

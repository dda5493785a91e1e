pub mod api;
pub mod error;
pub mod notify;
pub mod overrides;
pub mod progress;
pub mod resolver;
pub mod session;
pub mod status;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, PermissionsApi};
pub use error::{ClientError, Result};
pub use notify::{CollectingNotifier, Notice, NoticeLevel, Notifier, TracingNotifier};
pub use overrides::OverrideFlow;
pub use progress::{ProgressEvent, ProgressSubscription};
pub use resolver::MemberPermissionResolver;
pub use session::{SelectedWorkspace, Session};
pub use status::{Document, DocumentStatus, KnowledgeBase, StatusSubscription, Subscription};

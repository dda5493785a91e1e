pub mod catalog;
pub mod config;
pub mod init;
pub mod inspect;
pub mod invitations;
pub mod members;
pub mod overrides;
pub mod perms;
pub mod serve;
pub mod token;
pub mod watch;
pub mod workspaces;

use anyhow::{Context as _, Result, bail};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use workmind_client::{ApiClient, Notice, NoticeLevel, Notifier, Session};
use workmind_core::Role;
use workmind_core::config::WorkmindConfig;

/// Everything a command needs: loaded config plus the global flags.
pub struct Context {
    pub config_path: PathBuf,
    pub config: WorkmindConfig,
    token: Option<String>,
    workspace: Option<String>,
}

impl Context {
    pub fn load(base_dir: &Path, token: Option<String>, workspace: Option<String>) -> Result<Self> {
        let config_path = WorkmindConfig::default_path(base_dir);
        let config = WorkmindConfig::load_or_default(&config_path)?;
        Ok(Self {
            config_path,
            config,
            token,
            workspace,
        })
    }

    pub fn api(&self) -> Result<ApiClient> {
        let Some(token) = self.token.as_deref() else {
            bail!("no token: pass --token or set WORKMIND_TOKEN (see `workmind token`)");
        };
        Ok(ApiClient::from_settings(&self.config.client, token)?)
    }

    pub fn workspace_id(&self) -> Result<String> {
        self.workspace
            .clone()
            .or_else(|| self.config.client.default_workspace.clone())
            .context("no workspace: pass --workspace or set client.default_workspace")
    }

    /// Session with the selected workspace's permissions loaded.
    pub async fn session(&self, api: &ApiClient) -> Result<Session> {
        let workspace_id = self.workspace_id()?;
        let role = current_role(api, &workspace_id).await?;
        let session = Session::with_api(Arc::new(api.clone()), Arc::new(PrintNotifier));
        if !session.select_workspace(&workspace_id, role).await {
            bail!("could not load permissions for workspace {workspace_id}");
        }
        Ok(session)
    }
}

/// The caller's role in `workspace_id`, from their workspace list.
pub async fn current_role(api: &ApiClient, workspace_id: &str) -> Result<Role> {
    api.list_workspaces()
        .await?
        .into_iter()
        .find(|w| w.workspace.id == workspace_id)
        .map(|w| w.user_role)
        .with_context(|| format!("not a member of workspace {workspace_id}"))
}

/// Prints notices: successes to stdout, errors to stderr.
pub struct PrintNotifier;

impl Notifier for PrintNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => println!("{}", notice.message),
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
        }
    }
}

//! HTTP client for the workspace permission API.
//!
//! Every call carries the bearer token and shares one `reqwest::Client`
//! with a request timeout (30 s unless configured otherwise). Event streams
//! use a second client that only bounds the connect.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use workmind_core::catalog::CategoryGroup;
use workmind_core::config::ClientSettings;
use workmind_core::{
    AcceptInvitationRequest, AcceptInvitationResponse, AddMemberRequest, CreateWorkspaceRequest,
    EffectivePermission, GrantType, Invitation, InviteMemberRequest, Role,
    UpdatePermissionRequest, UpdateRoleRequest, UpdateWorkspaceRequest, UserPermissionsResponse,
    WorkspaceMember, WorkspaceSummary,
};

use crate::error::{ClientError, Result};
use crate::status::KnowledgeBase;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The permission calls the resolver, override flow and session depend on.
#[async_trait]
pub trait PermissionsApi: Send + Sync {
    /// Flat list of names the current user holds in `workspace_id`.
    async fn fetch_user_permissions(&self, workspace_id: &str) -> Result<Vec<String>>;

    async fn fetch_effective_permissions(
        &self,
        workspace_id: &str,
        member_id: &str,
    ) -> Result<Vec<EffectivePermission>>;

    async fn update_member_permission(
        &self,
        workspace_id: &str,
        member_id: &str,
        permission_name: &str,
        action: GrantType,
    ) -> Result<EffectivePermission>;

    /// Drops the override so the role default applies again.
    async fn reset_member_permission(
        &self,
        workspace_id: &str,
        member_id: &str,
        permission_name: &str,
    ) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    streaming: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        Self::with_timeout(base_url, token, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        let streaming = Client::builder().connect_timeout(timeout).build()?;
        Ok(Self {
            http,
            streaming,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn from_settings(settings: &ClientSettings, token: &str) -> Result<Self> {
        Self::with_timeout(
            &settings.base_url,
            token,
            Duration::from_secs(settings.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn checked(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.bearer_auth(&self.token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("permission API error: {status} - {body}");
            return Err(ClientError::from_status(status, &body));
        }
        Ok(response)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        Ok(self.checked(request).await?.json().await?)
    }

    /// Opens a `text/event-stream` response; the body is read by the caller.
    pub(crate) async fn open_event_stream(&self, path: &str) -> Result<Response> {
        let request = self
            .streaming
            .get(self.url(path))
            .header(ACCEPT, "text/event-stream");
        self.checked(request).await
    }

    pub async fn fetch_catalog(&self) -> Result<Vec<CategoryGroup>> {
        let url = self.url("/workspace-permissions/catalog");
        debug!("Fetching permission catalog from: {url}");
        self.send(self.http.get(url)).await
    }

    pub async fn list_workspaces(&self) -> Result<Vec<WorkspaceSummary>> {
        self.send(self.http.get(self.url("/workspaces"))).await
    }

    pub async fn create_workspace(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<WorkspaceSummary> {
        if name.trim().is_empty() {
            return Err(ClientError::Validation("workspace name required".into()));
        }
        let body = CreateWorkspaceRequest {
            name: name.to_string(),
            description: description.map(String::from),
        };
        self.send(self.http.post(self.url("/workspaces")).json(&body))
            .await
    }

    pub async fn update_workspace(
        &self,
        workspace_id: &str,
        update: &UpdateWorkspaceRequest,
    ) -> Result<WorkspaceSummary> {
        require_id("workspace id", workspace_id)?;
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ClientError::Validation("workspace name required".into()));
        }
        let url = self.url(&format!("/workspaces/{workspace_id}"));
        self.send(self.http.patch(url).json(update)).await
    }

    pub async fn delete_workspace(&self, workspace_id: &str) -> Result<()> {
        require_id("workspace id", workspace_id)?;
        let url = self.url(&format!("/workspaces/{workspace_id}"));
        let _: serde_json::Value = self.send(self.http.delete(url)).await?;
        Ok(())
    }

    pub async fn list_members(&self, workspace_id: &str) -> Result<Vec<WorkspaceMember>> {
        require_id("workspace id", workspace_id)?;
        let url = self.url(&format!("/workspaces/{workspace_id}/members"));
        self.send(self.http.get(url)).await
    }

    pub async fn add_member(
        &self,
        workspace_id: &str,
        user_id: &str,
        email: &str,
        full_name: Option<&str>,
        role: Role,
    ) -> Result<WorkspaceMember> {
        require_id("workspace id", workspace_id)?;
        require_id("user id", user_id)?;
        let body = AddMemberRequest {
            user_id: user_id.to_string(),
            email: email.to_string(),
            full_name: full_name.map(String::from),
            role_name: role.to_string(),
        };
        let url = self.url(&format!("/workspaces/{workspace_id}/members"));
        self.send(self.http.post(url).json(&body)).await
    }

    pub async fn update_member_role(
        &self,
        workspace_id: &str,
        member_id: &str,
        role: Role,
    ) -> Result<WorkspaceMember> {
        require_id("workspace id", workspace_id)?;
        require_id("member id", member_id)?;
        let body = UpdateRoleRequest {
            role_name: role.to_string(),
        };
        let url = self.url(&format!("/workspaces/{workspace_id}/members/{member_id}"));
        self.send(self.http.patch(url).json(&body)).await
    }

    pub async fn remove_member(&self, workspace_id: &str, member_id: &str) -> Result<()> {
        require_id("workspace id", workspace_id)?;
        require_id("member id", member_id)?;
        let url = self.url(&format!("/workspaces/{workspace_id}/members/{member_id}"));
        let _: serde_json::Value = self.send(self.http.delete(url)).await?;
        Ok(())
    }

    pub async fn invite_member(
        &self,
        workspace_id: &str,
        email: &str,
        role: Role,
    ) -> Result<Invitation> {
        require_id("workspace id", workspace_id)?;
        if !email.contains('@') {
            return Err(ClientError::Validation(format!("not an email address: {email}")));
        }
        let body = InviteMemberRequest {
            email: email.trim().to_string(),
            role_name: role.to_string(),
        };
        let url = self.url(&format!("/workspaces/{workspace_id}/members/invite"));
        self.send(self.http.post(url).json(&body)).await
    }

    /// Pending invitations for the workspace.
    pub async fn list_invitations(&self, workspace_id: &str) -> Result<Vec<Invitation>> {
        require_id("workspace id", workspace_id)?;
        let url = self.url(&format!("/workspace-invitations/workspaces/{workspace_id}"));
        self.send(self.http.get(url)).await
    }

    pub async fn resend_invitation(
        &self,
        workspace_id: &str,
        invitation_id: &str,
    ) -> Result<Invitation> {
        require_id("workspace id", workspace_id)?;
        require_id("invitation id", invitation_id)?;
        let url = self.url(&format!(
            "/workspace-invitations/workspaces/{workspace_id}/{invitation_id}/resend"
        ));
        self.send(self.http.post(url)).await
    }

    pub async fn cancel_invitation(&self, workspace_id: &str, invitation_id: &str) -> Result<()> {
        require_id("workspace id", workspace_id)?;
        require_id("invitation id", invitation_id)?;
        let url = self.url(&format!(
            "/workspace-invitations/workspaces/{workspace_id}/{invitation_id}"
        ));
        let _: serde_json::Value = self.send(self.http.delete(url)).await?;
        Ok(())
    }

    pub async fn accept_invitation(&self, token: &str) -> Result<AcceptInvitationResponse> {
        require_id("invitation token", token)?;
        let body = AcceptInvitationRequest {
            token: token.trim().to_string(),
        };
        let url = self.url("/workspace-invitations/accept");
        self.send(self.http.post(url).json(&body)).await
    }

    pub async fn get_knowledge(
        &self,
        workspace_id: &str,
        knowledge_id: &str,
    ) -> Result<KnowledgeBase> {
        require_id("workspace id", workspace_id)?;
        require_id("knowledge id", knowledge_id)?;
        let url = self.url(&format!("/workspaces/{workspace_id}/knowledge/{knowledge_id}"));
        self.send(self.http.get(url)).await
    }
}

#[async_trait]
impl PermissionsApi for ApiClient {
    async fn fetch_user_permissions(&self, workspace_id: &str) -> Result<Vec<String>> {
        require_id("workspace id", workspace_id)?;
        let url = self.url(&format!(
            "/workspace-permissions/workspaces/{workspace_id}/user"
        ));
        let body: UserPermissionsResponse = self.send(self.http.get(url)).await?;
        debug!(
            "Fetched {} permissions for workspace {workspace_id}",
            body.permissions.len()
        );
        Ok(body.permissions)
    }

    async fn fetch_effective_permissions(
        &self,
        workspace_id: &str,
        member_id: &str,
    ) -> Result<Vec<EffectivePermission>> {
        require_id("workspace id", workspace_id)?;
        require_id("member id", member_id)?;
        let url = self.url(&format!(
            "/workspace-permissions/workspaces/{workspace_id}/members/{member_id}"
        ));
        self.send(self.http.get(url)).await
    }

    async fn update_member_permission(
        &self,
        workspace_id: &str,
        member_id: &str,
        permission_name: &str,
        action: GrantType,
    ) -> Result<EffectivePermission> {
        require_id("workspace id", workspace_id)?;
        require_id("member id", member_id)?;
        require_id("permission name", permission_name)?;
        let body = UpdatePermissionRequest {
            permission_name: permission_name.to_string(),
            action,
        };
        let url = self.url(&format!(
            "/workspace-permissions/workspaces/{workspace_id}/members/{member_id}"
        ));
        let record: EffectivePermission = self.send(self.http.patch(url).json(&body)).await?;
        record.validate()?;
        Ok(record)
    }

    async fn reset_member_permission(
        &self,
        workspace_id: &str,
        member_id: &str,
        permission_name: &str,
    ) -> Result<()> {
        require_id("workspace id", workspace_id)?;
        require_id("member id", member_id)?;
        require_id("permission name", permission_name)?;
        let url = self.url(&format!(
            "/workspace-permissions/workspaces/{workspace_id}/members/{member_id}/permissions/{permission_name}"
        ));
        let _: serde_json::Value = self.send(self.http.delete(url)).await?;
        Ok(())
    }
}

fn require_id(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClientError::Validation(format!("{what} must not be empty")));
    }
    Ok(())
}

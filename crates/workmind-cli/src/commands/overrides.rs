use anyhow::{Result, bail};
use std::sync::Arc;

use workmind_client::{MemberPermissionResolver, OverrideFlow, PermissionsApi};
use workmind_core::GrantType;

use super::{Context, PrintNotifier};

async fn flow(ctx: &Context, workspace_id: &str, member_id: &str) -> Result<OverrideFlow> {
    let api: Arc<dyn PermissionsApi> = Arc::new(ctx.api()?);
    let notifier = Arc::new(PrintNotifier);
    let resolver = Arc::new(MemberPermissionResolver::new(api.clone(), notifier.clone()));
    // A loaded map lets unknown names be refused before any request.
    resolver.load(workspace_id, member_id).await;
    Ok(OverrideFlow::new(api, notifier, resolver))
}

async fn apply(ctx: &Context, member_id: &str, permission: &str, action: GrantType) -> Result<()> {
    let workspace_id = ctx.workspace_id()?;
    let flow = flow(ctx, &workspace_id, member_id).await?;
    if !flow.apply(&workspace_id, member_id, permission, action).await {
        bail!("{action} failed");
    }
    print_state(&flow, permission);
    Ok(())
}

pub async fn grant(ctx: &Context, member_id: &str, permission: &str) -> Result<()> {
    apply(ctx, member_id, permission, GrantType::Grant).await
}

pub async fn revoke(ctx: &Context, member_id: &str, permission: &str) -> Result<()> {
    apply(ctx, member_id, permission, GrantType::Revoke).await
}

pub async fn reset(ctx: &Context, member_id: &str, permission: &str) -> Result<()> {
    let workspace_id = ctx.workspace_id()?;
    let flow = flow(ctx, &workspace_id, member_id).await?;
    if !flow.reset(&workspace_id, member_id, permission).await {
        bail!("reset failed");
    }
    print_state(&flow, permission);
    Ok(())
}

fn print_state(flow: &OverrideFlow, permission: &str) {
    let record = flow.resolver().effective(permission);
    println!(
        "  {} -> {} ({})",
        record.permission_name,
        if record.is_allowed { "allowed" } else { "denied" },
        record.source
    );
}

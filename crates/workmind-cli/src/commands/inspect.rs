use anyhow::{Result, bail};
use std::sync::Arc;

use workmind_client::MemberPermissionResolver;

use super::{Context, PrintNotifier};

pub async fn run(ctx: &Context, member_id: &str) -> Result<()> {
    let workspace_id = ctx.workspace_id()?;
    let resolver = MemberPermissionResolver::new(Arc::new(ctx.api()?), Arc::new(PrintNotifier));
    if !resolver.load(&workspace_id, member_id).await {
        bail!("could not load permissions for member {member_id}");
    }

    println!("{:<26} {:<8} {:<8} {}", "PERMISSION", "ALLOWED", "SOURCE", "OVERRIDE");
    println!("{}", "-".repeat(56));
    for p in resolver.snapshot().iter() {
        println!(
            "{:<26} {:<8} {:<8} {}",
            p.permission_name,
            if p.is_allowed { "yes" } else { "no" },
            p.source,
            p.custom_grant_type
                .map(|g| g.to_string())
                .unwrap_or_else(|| "-".into()),
        );
    }

    Ok(())
}

use anyhow::{Result, bail};

use workmind_core::UpdateWorkspaceRequest;
use workmind_core::catalog::{WORKSPACE_DELETE, WORKSPACE_UPDATE};

use super::Context;

pub async fn list(ctx: &Context) -> Result<()> {
    let workspaces = ctx.api()?.list_workspaces().await?;

    if workspaces.is_empty() {
        println!("No workspaces found.");
        return Ok(());
    }

    println!("{:<38} {:<8} {}", "ID", "ROLE", "NAME");
    println!("{}", "-".repeat(70));
    for w in &workspaces {
        println!("{:<38} {:<8} {}", w.workspace.id, w.user_role, w.workspace.name);
    }

    Ok(())
}

pub async fn create(ctx: &Context, name: &str, description: Option<&str>) -> Result<()> {
    let created = ctx.api()?.create_workspace(name, description).await?;
    println!("Created workspace {} ({})", created.workspace.name, created.workspace.id);
    Ok(())
}

pub async fn update(ctx: &Context, name: Option<&str>, description: Option<&str>) -> Result<()> {
    if name.is_none() && description.is_none() {
        bail!("nothing to change: pass --name and/or --description");
    }
    let api = ctx.api()?;
    let session = ctx.session(&api).await?;
    if !session.has_permission(WORKSPACE_UPDATE) {
        bail!("you cannot change this workspace's settings");
    }

    let update = UpdateWorkspaceRequest {
        name: name.map(String::from),
        description: description.map(String::from),
    };
    let updated = api.update_workspace(&ctx.workspace_id()?, &update).await?;
    println!("Updated workspace {} ({})", updated.workspace.name, updated.workspace.id);
    Ok(())
}

pub async fn delete(ctx: &Context, confirmed: bool) -> Result<()> {
    let api = ctx.api()?;
    let session = ctx.session(&api).await?;
    if !session.has_permission(WORKSPACE_DELETE) {
        bail!("only members holding {WORKSPACE_DELETE} can delete this workspace");
    }
    let workspace_id = ctx.workspace_id()?;
    if !confirmed {
        bail!("deleting {workspace_id} removes all of its members; rerun with --yes");
    }

    api.delete_workspace(&workspace_id).await?;
    println!("Deleted workspace {workspace_id}");
    Ok(())
}

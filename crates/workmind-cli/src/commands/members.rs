use anyhow::{Result, bail};

use futures::future::join_all;
use workmind_client::PermissionsApi;
use workmind_core::{PermissionSource, Role};

use super::Context;

pub async fn list(ctx: &Context, with_overrides: bool) -> Result<()> {
    let api = ctx.api()?;
    let session = ctx.session(&api).await?;
    let workspace_id = ctx.workspace_id()?;
    let members = api.list_members(&workspace_id).await?;

    // One request per member, issued together.
    let override_counts: Vec<Option<usize>> = if with_overrides {
        join_all(
            members
                .iter()
                .map(|m| api.fetch_effective_permissions(&workspace_id, &m.id)),
        )
        .await
        .into_iter()
        .map(|r| {
            r.ok().map(|perms| {
                perms
                    .iter()
                    .filter(|p| p.source == PermissionSource::Custom)
                    .count()
            })
        })
        .collect()
    } else {
        vec![None; members.len()]
    };

    println!(
        "{:<38} {:<8} {:<28} {:<10} {}",
        "ID", "ROLE", "EMAIL", "ACTIONS", "OVERRIDES"
    );
    println!("{}", "-".repeat(96));
    for (m, count) in members.iter().zip(override_counts) {
        let actions = session.member_actions(m.workspace_role);
        let actions = match (actions.can_edit, actions.can_remove) {
            (true, true) => "edit,rm",
            (true, false) => "edit",
            (false, true) => "rm",
            (false, false) => "-",
        };
        let count = count.map(|c| c.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:<38} {:<8} {:<28} {:<10} {}",
            m.id, m.workspace_role, m.email, actions, count
        );
    }

    Ok(())
}

pub async fn add(
    ctx: &Context,
    user_id: &str,
    email: &str,
    name: Option<&str>,
    role: &str,
) -> Result<()> {
    let role: Role = role.parse()?;
    let api = ctx.api()?;
    let session = ctx.session(&api).await?;
    if !session.assignable_roles().contains(&role) {
        bail!("you cannot assign the {role} role");
    }

    let workspace_id = ctx.workspace_id()?;
    let member = api
        .add_member(&workspace_id, user_id, email, name, role)
        .await?;
    println!("Added {} as {} ({})", member.email, member.workspace_role, member.id);
    Ok(())
}

pub async fn set_role(ctx: &Context, member_id: &str, role: &str) -> Result<()> {
    let role: Role = role.parse()?;
    let api = ctx.api()?;
    let session = ctx.session(&api).await?;
    let workspace_id = ctx.workspace_id()?;

    let members = api.list_members(&workspace_id).await?;
    let Some(target) = members.iter().find(|m| m.id == member_id) else {
        bail!("member {member_id} not found");
    };
    if !session.member_actions(target.workspace_role).can_edit {
        bail!("you cannot change the role of a {} member", target.workspace_role);
    }
    if !session.assignable_roles().contains(&role) {
        bail!("you cannot assign the {role} role");
    }

    let member = api.update_member_role(&workspace_id, member_id, role).await?;
    println!("{} is now {}", member.email, member.workspace_role);
    Ok(())
}

pub async fn remove(ctx: &Context, member_id: &str) -> Result<()> {
    let api = ctx.api()?;
    let session = ctx.session(&api).await?;
    let workspace_id = ctx.workspace_id()?;

    let members = api.list_members(&workspace_id).await?;
    let Some(target) = members.iter().find(|m| m.id == member_id) else {
        bail!("member {member_id} not found");
    };
    if !session.member_actions(target.workspace_role).can_remove {
        bail!("you cannot remove a {} member", target.workspace_role);
    }

    api.remove_member(&workspace_id, member_id).await?;
    println!("Removed {}", target.email);
    Ok(())
}

use anyhow::{Result, bail};

use workmind_core::Role;
use workmind_core::catalog::MEMBER_INVITE;

use super::Context;

pub async fn invite(ctx: &Context, email: &str, role: &str) -> Result<()> {
    let role: Role = role.parse()?;
    let api = ctx.api()?;
    let session = ctx.session(&api).await?;
    if !session.has_permission(MEMBER_INVITE) {
        bail!("you cannot invite members to this workspace");
    }
    if !session.assignable_roles().contains(&role) {
        bail!("you cannot assign the {role} role");
    }

    let workspace_id = ctx.workspace_id()?;
    let invitation = api.invite_member(&workspace_id, email, role).await?;
    println!(
        "Invited {} as {} (expires {})",
        invitation.email, invitation.role, invitation.expires_at
    );
    println!("Token: {}", invitation.token);
    Ok(())
}

pub async fn list(ctx: &Context) -> Result<()> {
    let api = ctx.api()?;
    let session = ctx.session(&api).await?;
    let workspace_id = ctx.workspace_id()?;
    let invitations = api.list_invitations(&workspace_id).await?;

    if invitations.is_empty() {
        println!("No pending invitations.");
        return Ok(());
    }

    let actions = session.invitation_actions();
    let actions = match (actions.can_resend, actions.can_cancel) {
        (true, true) => "resend,cancel",
        (true, false) => "resend",
        (false, true) => "cancel",
        (false, false) => "-",
    };
    println!(
        "{:<38} {:<28} {:<8} {:<20} {}",
        "ID", "EMAIL", "ROLE", "EXPIRES", "ACTIONS"
    );
    println!("{}", "-".repeat(106));
    for inv in &invitations {
        println!(
            "{:<38} {:<28} {:<8} {:<20} {}",
            inv.id, inv.email, inv.role, inv.expires_at, actions
        );
    }
    Ok(())
}

pub async fn resend(ctx: &Context, invitation_id: &str) -> Result<()> {
    let api = ctx.api()?;
    let session = ctx.session(&api).await?;
    if !session.invitation_actions().can_resend {
        bail!("you cannot resend invitations in this workspace");
    }
    let invitation = api
        .resend_invitation(&ctx.workspace_id()?, invitation_id)
        .await?;
    println!(
        "Resent invitation to {} (expires {})",
        invitation.email, invitation.expires_at
    );
    println!("Token: {}", invitation.token);
    Ok(())
}

pub async fn cancel(ctx: &Context, invitation_id: &str) -> Result<()> {
    let api = ctx.api()?;
    let session = ctx.session(&api).await?;
    if !session.invitation_actions().can_cancel {
        bail!("you cannot cancel invitations in this workspace");
    }
    api.cancel_invitation(&ctx.workspace_id()?, invitation_id)
        .await?;
    println!("Cancelled invitation {invitation_id}");
    Ok(())
}

pub async fn accept(ctx: &Context, token: &str) -> Result<()> {
    let accepted = ctx.api()?.accept_invitation(token).await?;
    println!(
        "{}: you are now {} in {} ({})",
        accepted.message, accepted.role, accepted.workspace.name, accepted.workspace.id
    );
    Ok(())
}

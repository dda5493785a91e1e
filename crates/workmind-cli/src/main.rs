mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::Context;

#[derive(Parser)]
#[command(name = "workmind")]
#[command(about = "Workspace roles and permission overrides")]
#[command(version)]
struct Cli {
    /// Path to the WorkMind config directory (default: ~/.workmind)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Bearer token for the permission server (or set WORKMIND_TOKEN env var)
    #[arg(long, global = true, env = "WORKMIND_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Workspace to act on (defaults to `default_workspace` in the config)
    #[arg(long, short = 'w', global = true, env = "WORKMIND_WORKSPACE")]
    workspace: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,

    /// Show current configuration
    Config,

    /// Run the permission server
    Serve,

    /// Issue a bearer token signed with the server secret
    Token {
        /// User id placed in the token subject
        user_id: String,
        email: String,
    },

    /// Show the permission catalog
    Catalog {
        /// Fetch the server's catalog instead of the built-in one
        #[arg(long)]
        remote: bool,
    },

    /// List the workspaces you belong to
    Workspaces,

    /// Create a workspace (you become its Owner)
    CreateWorkspace {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Rename or re-describe the workspace
    UpdateWorkspace {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete the workspace and all of its memberships
    DeleteWorkspace {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show your own permissions in the workspace
    Perms,

    /// Show a member's effective permissions and where each comes from
    Inspect { member_id: String },

    /// Grant a permission to a member, overriding the role default
    Grant {
        member_id: String,
        permission: String,
    },

    /// Revoke a permission from a member, overriding the role default
    Revoke {
        member_id: String,
        permission: String,
    },

    /// Drop a member's override so the role default applies again
    Reset {
        member_id: String,
        permission: String,
    },

    /// List workspace members
    Members {
        /// Also count each member's custom overrides
        #[arg(long)]
        overrides: bool,
    },

    /// Add a member to the workspace
    AddMember {
        user_id: String,
        email: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "Viewer")]
        role: String,
    },

    /// Change a member's role
    SetRole { member_id: String, role: String },

    /// Remove a member from the workspace
    RemoveMember { member_id: String },

    /// Invite someone to the workspace by email
    Invite {
        email: String,
        #[arg(long, default_value = "Viewer")]
        role: String,
    },

    /// List pending invitations
    Invitations,

    /// Resend a pending invitation with a fresh token
    ResendInvite { invitation_id: String },

    /// Cancel a pending invitation
    CancelInvite { invitation_id: String },

    /// Join a workspace with an invitation token
    AcceptInvite { token: String },

    /// Follow document processing in a knowledge base until it settles
    Watch { knowledge_id: String },

    /// Stream live processing progress for one document
    Progress { document_id: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("workmind=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let base_dir = match cli.config_dir {
        Some(ref dir) => dir.clone(),
        None => workmind_core::config::WorkmindConfig::default_base_dir()?,
    };

    if let Commands::Init = cli.command {
        return commands::init::run(&base_dir);
    }

    let ctx = Context::load(&base_dir, cli.token, cli.workspace)?;
    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Init => Ok(()),
        Commands::Config => commands::config::run(&ctx),
        Commands::Serve => rt.block_on(commands::serve::run(&ctx)),
        Commands::Token {
            ref user_id,
            ref email,
        } => commands::token::run(&ctx, user_id, email),
        Commands::Catalog { remote } => rt.block_on(commands::catalog::run(&ctx, remote)),
        Commands::Workspaces => rt.block_on(commands::workspaces::list(&ctx)),
        Commands::CreateWorkspace {
            ref name,
            ref description,
        } => rt.block_on(commands::workspaces::create(
            &ctx,
            name,
            description.as_deref(),
        )),
        Commands::UpdateWorkspace {
            ref name,
            ref description,
        } => rt.block_on(commands::workspaces::update(
            &ctx,
            name.as_deref(),
            description.as_deref(),
        )),
        Commands::DeleteWorkspace { yes } => rt.block_on(commands::workspaces::delete(&ctx, yes)),
        Commands::Perms => rt.block_on(commands::perms::run(&ctx)),
        Commands::Inspect { ref member_id } => {
            rt.block_on(commands::inspect::run(&ctx, member_id))
        }
        Commands::Grant {
            ref member_id,
            ref permission,
        } => rt.block_on(commands::overrides::grant(&ctx, member_id, permission)),
        Commands::Revoke {
            ref member_id,
            ref permission,
        } => rt.block_on(commands::overrides::revoke(&ctx, member_id, permission)),
        Commands::Reset {
            ref member_id,
            ref permission,
        } => rt.block_on(commands::overrides::reset(&ctx, member_id, permission)),
        Commands::Members { overrides } => {
            rt.block_on(commands::members::list(&ctx, overrides))
        }
        Commands::AddMember {
            ref user_id,
            ref email,
            ref name,
            ref role,
        } => rt.block_on(commands::members::add(
            &ctx,
            user_id,
            email,
            name.as_deref(),
            role,
        )),
        Commands::SetRole {
            ref member_id,
            ref role,
        } => rt.block_on(commands::members::set_role(&ctx, member_id, role)),
        Commands::RemoveMember { ref member_id } => {
            rt.block_on(commands::members::remove(&ctx, member_id))
        }
        Commands::Invite {
            ref email,
            ref role,
        } => rt.block_on(commands::invitations::invite(&ctx, email, role)),
        Commands::Invitations => rt.block_on(commands::invitations::list(&ctx)),
        Commands::ResendInvite { ref invitation_id } => {
            rt.block_on(commands::invitations::resend(&ctx, invitation_id))
        }
        Commands::CancelInvite { ref invitation_id } => {
            rt.block_on(commands::invitations::cancel(&ctx, invitation_id))
        }
        Commands::AcceptInvite { ref token } => {
            rt.block_on(commands::invitations::accept(&ctx, token))
        }
        Commands::Watch { ref knowledge_id } => {
            rt.block_on(commands::watch::run(&ctx, knowledge_id))
        }
        Commands::Progress { ref document_id } => {
            rt.block_on(commands::watch::document(&ctx, document_id))
        }
    }
}

use anyhow::Result;

use workmind_core::catalog;
use workmind_core::rules;

use super::Context;

pub async fn run(ctx: &Context) -> Result<()> {
    let api = ctx.api()?;
    let session = ctx.session(&api).await?;
    let Some(selected) = session.selected_workspace() else {
        return Ok(());
    };

    println!("Workspace {} as {}", selected.workspace_id, selected.role);
    println!();
    for group in catalog::catalog() {
        println!("{}", group.category);
        for p in &group.permissions {
            let mark = if session.has_permission(&p.name) { "yes" } else { "-" };
            println!("  {:<26} {mark}", p.name);
        }
    }

    let assignable: Vec<String> = rules::assignable_roles(selected.role)
        .iter()
        .map(|r| r.to_string())
        .collect();
    println!();
    println!("Assignable roles: {}", assignable.join(", "));

    Ok(())
}

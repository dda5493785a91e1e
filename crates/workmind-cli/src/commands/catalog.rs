use anyhow::Result;

use workmind_core::catalog::{self, CategoryGroup};

use super::Context;

pub async fn run(ctx: &Context, remote: bool) -> Result<()> {
    let groups = if remote {
        ctx.api()?.fetch_catalog().await?
    } else {
        catalog::catalog()
    };
    print_groups(&groups);
    Ok(())
}

fn print_groups(groups: &[CategoryGroup]) {
    for group in groups {
        println!("{}", group.category);
        for p in &group.permissions {
            println!("  {:<26} {:<22} {}", p.name, p.label, p.description);
        }
        println!();
    }
}

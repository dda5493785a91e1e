use anyhow::Result;

use super::Context;

pub fn run(ctx: &Context) -> Result<()> {
    let config = &ctx.config;
    let exists = ctx.config_path.exists();

    println!(
        "Config: {}{}",
        ctx.config_path.display(),
        if exists { "" } else { " (not found, showing defaults)" }
    );
    println!();
    println!("  [client]");
    println!("  Base URL:          {}", config.client.base_url);
    println!("  Timeout:           {}s", config.client.timeout_secs);
    println!("  Poll interval:     {}ms", config.client.poll_interval_ms);
    println!(
        "  Default workspace: {}",
        config.client.default_workspace.as_deref().unwrap_or("-")
    );
    println!();
    println!("  [server]");
    println!("  Listen address:    {}", config.server.listen_addr);
    println!("  DB path:           {}", config.server.db_path);
    println!("  JWT secret:        {}", mask(&config.server.jwt_secret));

    Ok(())
}

fn mask(secret: &str) -> String {
    let shown: String = secret.chars().take(4).collect();
    format!("{shown}{}", "*".repeat(secret.chars().count().saturating_sub(4)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_keeps_prefix() {
        assert_eq!(mask("abcdefgh"), "abcd****");
        assert_eq!(mask("ab"), "ab");
    }
}

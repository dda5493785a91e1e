use anyhow::Result;
use std::path::Path;

use workmind_core::config::WorkmindConfig;

pub fn run(base_dir: &Path) -> Result<()> {
    println!("Initializing WorkMind in {}", base_dir.display());

    std::fs::create_dir_all(base_dir)?;

    let config_path = WorkmindConfig::default_path(base_dir);
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
    } else {
        let config = WorkmindConfig::default_config(base_dir);
        config.save(&config_path)?;
        println!("Created config: {}", config_path.display());
    }

    println!("\nWorkMind initialized. Next steps:");
    println!("  1. Change server.jwt_secret in {}", config_path.display());
    println!("  2. Run `workmind serve` to start the permission server");
    println!("  3. Run `workmind token <user-id> <email>` and export WORKMIND_TOKEN");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("wm");
        run(&base).unwrap();

        let path = WorkmindConfig::default_path(&base);
        let mut config = WorkmindConfig::load(&path).unwrap();
        assert!(config.server.db_path.ends_with("workmind.db"));

        // A second init keeps the edited file.
        config.client.default_workspace = Some("w1".into());
        config.save(&path).unwrap();
        run(&base).unwrap();
        let reloaded = WorkmindConfig::load(&path).unwrap();
        assert_eq!(reloaded.client.default_workspace.as_deref(), Some("w1"));
    }
}

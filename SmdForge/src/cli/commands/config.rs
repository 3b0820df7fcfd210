//! CLI interface for settings

use crate::config::Config;

pub fn show() -> anyhow::Result<()> {
    let config = Config::load();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub fn path() -> anyhow::Result<()> {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => anyhow::bail!("No config directory on this platform"),
    }
    Ok(())
}

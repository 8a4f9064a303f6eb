//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up b4s CLI defaults.

use crate::config::Config;
use anyhow::{Context, Result};
use b4s::Platform;

/// Handle the configure command
///
/// # Arguments
/// * `user_id` - Optional user ID to set as default
/// * `platform` - Optional platform to set as default
/// * `show` - If true, show current configuration
pub fn handle(user_id: Option<String>, platform: Option<Platform>, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if user_id.is_none() && platform.is_none() {
        show_usage();
        return Ok(());
    }

    apply(&mut config, user_id, platform)?;
    config.save()?;

    if let Some(id) = config.get_user_id() {
        println!("User ID configured: {}", id);
    }
    if let Some(platform) = config.platform {
        println!("Platform configured: {}", platform);
    }
    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

/// Merge new defaults into the config, validating the user ID first
fn apply(config: &mut Config, user_id: Option<String>, platform: Option<Platform>) -> Result<()> {
    if let Some(id) = user_id {
        let id = id.trim().to_string();
        b4s::validate_user_id(&id).with_context(|| format!("Invalid user ID '{}'", id))?;
        config.set_user_id(id);
    }
    if platform.is_some() {
        config.platform = platform;
    }
    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) {
    print!("{}", describe(config));
    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

fn describe(config: &Config) -> String {
    let user_id = match config.get_user_id() {
        Some(id) => format!("User ID: {}", id),
        None => "No user ID configured".to_string(),
    };
    let platform = match config.platform {
        Some(platform) => format!("Platform: {}", platform),
        None => "Platform: inferred from user ID".to_string(),
    };
    format!("{}\n{}\n", user_id, platform)
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: b4s configure --user-id YOUR_ID [--platform epic|steam]");
    println!("   or: b4s configure --show");
    println!();
    println!("Note: Borderlands 4 encrypts saves with your Steam ID (17 digits)");
    println!("      or your Epic account ID (32 hex characters).");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(&Config::default()),
            "No user ID configured\nPlatform: inferred from user ID\n"
        );

        let config = Config {
            user_id: Some("76561197960521364".to_string()),
            platform: Some(Platform::Steam),
        };
        assert_eq!(
            describe(&config),
            "User ID: 76561197960521364\nPlatform: steam\n"
        );
    }

    #[test]
    fn test_apply_sets_fields() {
        let mut config = Config::default();
        apply(
            &mut config,
            Some(" 76561197960521364 ".to_string()),
            Some(Platform::Steam),
        )
        .unwrap();
        assert_eq!(config.get_user_id(), Some("76561197960521364"));
        assert_eq!(config.platform, Some(Platform::Steam));

        apply(&mut config, None, None).unwrap();
        assert_eq!(config.platform, Some(Platform::Steam));
    }

    #[test]
    fn test_apply_rejects_bad_id() {
        let mut config = Config::default();
        assert!(apply(&mut config, Some("not an id!".to_string()), None).is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_path_exists() {
        assert!(Config::config_path().is_ok());
    }
}

//! Save file command handlers

use anyhow::{Context, Result};
use b4s::serial::SERIAL_PREFIX;
use b4s::{BlockSequence, ItemEntry, ItemSerial, Platform, SaveFile};
use std::path::Path;

use crate::config::Config;
use crate::file_io::{read_save, read_yaml, write_save, write_yaml};

/// Get user ID from argument or config
pub fn get_user_id(provided: Option<String>) -> Result<String> {
    if let Some(id) = provided {
        return Ok(id);
    }

    let config = Config::load()?;
    let id = config.get_user_id().map(String::from).context(
        "User ID not provided. Run 'b4s configure --user-id YOUR_ID' or set B4S_USER_ID.",
    )?;
    tracing::debug!("using configured user ID");
    Ok(id)
}

/// Pick the encryption platform: argument, then config, then the user ID's shape
fn resolve_platform(provided: Option<Platform>, user_id: &str) -> Result<Platform> {
    if let Some(platform) = provided {
        return Ok(platform);
    }
    if let Some(platform) = Config::load()?.platform {
        tracing::debug!(%platform, "using configured platform");
        return Ok(platform);
    }
    let platform =
        b4s::validate_user_id(user_id).context("Could not infer platform from user ID")?;
    tracing::debug!(%platform, "platform inferred from user ID");
    Ok(platform)
}

/// Handle `save decrypt` command
pub fn decrypt(input: &Path, output: Option<&Path>, user_id: Option<String>) -> Result<()> {
    let user_id = get_user_id(user_id)?;
    let save = read_save(input, &user_id)?;
    write_yaml(output, &save.text)
}

/// Handle `save encrypt` command
pub fn encrypt(
    sav_path: &Path,
    yaml_input: Option<&Path>,
    user_id: Option<String>,
    platform: Option<Platform>,
) -> Result<()> {
    let user_id = get_user_id(user_id)?;
    let platform = resolve_platform(platform, &user_id)?;
    let yaml_data = read_yaml(yaml_input)?;

    write_save(sav_path, &yaml_data, &user_id, platform)?;
    eprintln!("Encrypted {} save to {}", platform, sav_path.display());
    Ok(())
}

/// Handle `save items` command
pub fn items(input: &Path, user_id: Option<String>) -> Result<()> {
    let user_id = get_user_id(user_id)?;
    let decrypted = read_save(input, &user_id)?;
    let save = SaveFile::from_yaml(&decrypted.text).context("Failed to parse save YAML")?;

    let items = save.items();
    print!("{}", format_items(&items));
    eprintln!("{} items", items.len());
    Ok(())
}

/// Handle `save add` command
///
/// The save is re-encrypted for the platform it was decrypted with and
/// written to `output`, or back to `input`.
pub fn add(
    input: &Path,
    item: &str,
    state_flags: u32,
    output: Option<&Path>,
    user_id: Option<String>,
) -> Result<()> {
    let serial = item_serial(item)?;
    let user_id = get_user_id(user_id)?;
    let decrypted = read_save(input, &user_id)?;

    let mut save = SaveFile::from_yaml(&decrypted.text).context("Failed to parse save YAML")?;
    let path = save
        .add_item(&serial, state_flags)
        .context("Failed to add item to backpack")?;
    let yaml = save.to_yaml().context("Failed to serialize save YAML")?;

    let target = output.unwrap_or(input);
    write_save(target, &yaml, &user_id, decrypted.platform)?;
    println!("{} {}", path, serial);
    Ok(())
}

/// Accept either an `@U` serial (checked by decoding it) or block text
fn item_serial(item: &str) -> Result<String> {
    let item = item.trim();
    if item.starts_with(SERIAL_PREFIX) {
        ItemSerial::decode(item).with_context(|| format!("Invalid item serial {}", item))?;
        return Ok(item.to_string());
    }

    let blocks: BlockSequence = item.parse().context("Failed to parse block text")?;
    b4s::encode_serial(&blocks).context("Failed to encode serial")
}

fn format_items(items: &[ItemEntry]) -> String {
    items
        .iter()
        .map(|item| {
            let decoded = match item.decode() {
                Ok(serial) => serial.to_string(),
                Err(e) => format!("<error: {}>", e),
            };
            format!("{}\n  {}\n  {}\n", item.path, item.serial, decoded)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const STEAM_ID: &str = "76561197960521364";

    const SAVE_YAML: &str = r#"state:
  inventory:
    items:
      backpack:
        slot_0:
          serial: '@Ugr$ZCm/&tH!t{KgK/Shxu>k'
        slot_1:
          serial: '@U/NsC0'
"#;

    #[test]
    fn test_format_items() {
        let save = SaveFile::from_yaml(SAVE_YAML.as_bytes()).unwrap();
        let text = format_items(&save.items());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "state.inventory.items.backpack.slot_0");
        assert_eq!(lines[1], "  @Ugr$ZCm/&tH!t{KgK/Shxu>k");
        assert_eq!(lines[2], "  269, 0, 1, 33| 2, 1949|| {1} {7} {243:104}|");
        assert_eq!(lines[3], "state.inventory.items.backpack.slot_1");
        assert!(lines[5].starts_with("  <error: "));
    }

    #[test]
    fn test_resolve_platform_prefers_argument() {
        assert_eq!(
            resolve_platform(Some(Platform::Epic), STEAM_ID).unwrap(),
            Platform::Epic
        );
    }

    #[test]
    fn test_encrypt_then_decrypt_files() {
        let dir = tempfile::tempdir().unwrap();
        let yaml_path = dir.path().join("in.yaml");
        let sav_path = dir.path().join("1.sav");
        let out_path = dir.path().join("out.yaml");
        fs::write(&yaml_path, SAVE_YAML).unwrap();

        encrypt(
            &sav_path,
            Some(&yaml_path),
            Some(STEAM_ID.to_string()),
            Some(Platform::Steam),
        )
        .unwrap();
        decrypt(&sav_path, Some(&out_path), Some(STEAM_ID.to_string())).unwrap();

        assert_eq!(fs::read_to_string(&out_path).unwrap(), SAVE_YAML);
    }

    #[test]
    fn test_item_serial_accepts_both_forms() {
        assert_eq!(item_serial(" @Ugd6/ ").unwrap(), "@Ugd6/");
        assert_eq!(item_serial("{53} {2}|").unwrap(), "@Ugw~-70R");
        assert!(item_serial("@U/NsC0").is_err());
        assert!(item_serial("{53").is_err());
    }

    #[test]
    fn test_add_to_save_file() {
        let dir = tempfile::tempdir().unwrap();
        let sav_path = dir.path().join("1.sav");
        let out_path = dir.path().join("2.sav");
        write_save(&sav_path, SAVE_YAML.as_bytes(), STEAM_ID, Platform::Steam).unwrap();

        add(
            &sav_path,
            "7|",
            17,
            Some(&out_path),
            Some(STEAM_ID.to_string()),
        )
        .unwrap();

        let save = read_save(&out_path, STEAM_ID).unwrap();
        assert_eq!(save.platform, Platform::Steam);
        let items = SaveFile::from_yaml(&save.text).unwrap().items();
        assert_eq!(items[2].path, "state.inventory.items.backpack.slot_2");
        assert_eq!(items[2].serial, "@Ugd6/");

        // Input is untouched when an output path is given
        let original = read_save(&sav_path, STEAM_ID).unwrap();
        assert_eq!(original.text, SAVE_YAML.as_bytes());
    }

    #[test]
    fn test_decrypt_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = decrypt(
            &dir.path().join("missing.sav"),
            None,
            Some(STEAM_ID.to_string()),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }
}

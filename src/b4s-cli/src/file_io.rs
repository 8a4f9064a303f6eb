//! Save and YAML file handling
//!
//! Encrypted saves always live in files. YAML can also come from stdin or go
//! to stdout so it can be piped through other tools.

use anyhow::{Context, Result};
use b4s::{DecryptedSave, Platform};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

/// Read and decrypt a .sav file
///
/// The detected platform and any checksum mismatch are reported on stderr.
pub fn read_save(path: &Path, user_id: &str) -> Result<DecryptedSave> {
    let encrypted = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = encrypted.len(), "read save");

    let save = b4s::decrypt_save(&encrypted, user_id)
        .with_context(|| format!("Failed to decrypt {}", path.display()))?;

    eprintln!("Decrypted {} save", save.platform);
    if !save.checksum_ok {
        eprintln!("Warning: checksum mismatch in {}", path.display());
    }
    Ok(save)
}

/// Encrypt YAML text and write it as a .sav file
pub fn write_save(path: &Path, yaml: &[u8], user_id: &str, platform: Platform) -> Result<()> {
    let encrypted =
        b4s::encrypt_save(yaml, user_id, platform).context("Failed to encrypt YAML data")?;
    fs::write(path, &encrypted).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = encrypted.len(), %platform, "wrote save");
    Ok(())
}

/// Read YAML from a file path or stdin if path is None
pub fn read_yaml(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(p) => fs::read(p).with_context(|| format!("Failed to read {}", p.display())),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read YAML from stdin")?;
            Ok(buf)
        }
    }
}

/// Write YAML to a file path or stdout if path is None
pub fn write_yaml(path: Option<&Path>, yaml: &[u8]) -> Result<()> {
    match path {
        Some(p) => fs::write(p, yaml).with_context(|| format!("Failed to write {}", p.display())),
        None => io::stdout()
            .write_all(yaml)
            .context("Failed to write YAML to stdout"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEAM_ID: &str = "76561197960521364";

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.sav");

        write_save(&path, b"state: {}\n", STEAM_ID, Platform::Steam).unwrap();
        let save = read_save(&path, STEAM_ID).unwrap();
        assert_eq!(save.text, b"state: {}\n");
        assert_eq!(save.platform, Platform::Steam);
        assert!(save.checksum_ok);
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.yaml");

        write_yaml(Some(&path), b"state: {}\n").unwrap();
        assert_eq!(read_yaml(Some(&path)).unwrap(), b"state: {}\n");
    }

    #[test]
    fn test_missing_save_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_save(&dir.path().join("missing.sav"), STEAM_ID).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }

    #[test]
    fn test_wrong_user_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.sav");

        write_save(&path, b"state: {}\n", STEAM_ID, Platform::Steam).unwrap();
        let err = read_save(&path, "76561197960521365").unwrap_err();
        assert!(err.to_string().starts_with("Failed to decrypt"));
    }
}

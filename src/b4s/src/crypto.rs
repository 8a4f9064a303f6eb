//! Save container encryption and decryption
//!
//! A save file is `AES-256-ECB(PKCS7(zlib(text) ++ trailer))` where the
//! 8-byte trailer holds the Adler-32 of the plain text and its length. The
//! key is a public base key XORed with the owner's user ID, encoded
//! differently for Epic and Steam accounts.

#[allow(deprecated)]
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

/// Base encryption key shared by every save file
const BASE_KEY: [u8; 32] = [
    0x35, 0xEC, 0x33, 0x77, 0xF3, 0x5D, 0xB0, 0xEA, 0xBE, 0x6B, 0x83, 0x11, 0x54, 0x03, 0xEB, 0xFB,
    0x27, 0x25, 0x64, 0x2E, 0xD5, 0x49, 0x06, 0x29, 0x05, 0x78, 0xBD, 0x60, 0xBA, 0x4A, 0xA7, 0x87,
];

const BLOCK_SIZE: usize = 16;
const TRAILER_LEN: usize = 8;
const COMPRESSION_LEVEL: u32 = 9;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Cannot derive key: {0}")]
    KeyDerivation(String),

    #[error("Save data size {0} is not a positive multiple of 16 bytes")]
    InvalidSize(usize),

    #[error("Invalid padding in decrypted data")]
    InvalidPadding,

    #[error("Decrypted payload is {0} bytes, too short for the 8-byte trailer")]
    TooShort(usize),

    #[error("Failed to decompress save data: {0}")]
    Decompress(String),

    #[error("Decompressed length {actual} does not match trailer length {expected}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("Unknown platform: {0} (expected epic or steam)")]
    UnknownPlatform(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decryption failed for every platform (epic: {epic}; steam: {steam})")]
    AllPlatformsFailed {
        epic: Box<CryptoError>,
        steam: Box<CryptoError>,
    },
}

/// Store the save belongs to; selects key derivation and trailer layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Epic,
    Steam,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Epic, Platform::Steam];

    pub fn name(&self) -> &'static str {
        match self {
            Platform::Epic => "epic",
            Platform::Steam => "steam",
        }
    }

    fn checksum_bytes(&self, checksum: u32) -> [u8; 4] {
        match self {
            Platform::Epic => checksum.to_be_bytes(),
            Platform::Steam => checksum.to_le_bytes(),
        }
    }

    fn checksum_from(&self, bytes: [u8; 4]) -> u32 {
        match self {
            Platform::Epic => u32::from_be_bytes(bytes),
            Platform::Steam => u32::from_le_bytes(bytes),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "epic" => Ok(Platform::Epic),
            "steam" => Ok(Platform::Steam),
            _ => Err(CryptoError::UnknownPlatform(s.to_string())),
        }
    }
}

/// Check that `user_id` looks like a Steam or Epic account ID
///
/// Returns the platform the ID format points to. Steam IDs are 10 to 20
/// digits; Epic IDs are 10 to 50 characters that are alphanumeric apart
/// from `-` and `_` (the separators count towards the length).
pub fn validate_user_id(user_id: &str) -> Result<Platform, CryptoError> {
    let id = user_id.trim();
    if id.is_empty() {
        return Err(CryptoError::KeyDerivation("user ID is empty".to_string()));
    }

    if id.chars().all(|c| c.is_ascii_digit()) {
        if !(10..=20).contains(&id.len()) {
            return Err(CryptoError::KeyDerivation(format!(
                "Steam ID must be 10-20 digits, got {}",
                id.len()
            )));
        }
        return Ok(Platform::Steam);
    }

    let mut stripped = id.chars().filter(|&c| c != '-' && c != '_').peekable();
    if stripped.peek().is_none() || !stripped.all(|c| c.is_ascii_alphanumeric()) {
        return Err(CryptoError::KeyDerivation(format!(
            "user ID {:?} contains invalid characters",
            id
        )));
    }
    if !(10..=50).contains(&id.len()) {
        return Err(CryptoError::KeyDerivation(format!(
            "Epic ID must be 10-50 characters, got {}",
            id.len()
        )));
    }

    Ok(Platform::Epic)
}

/// Per-user AES-256 key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveKey([u8; 32]);

impl SaveKey {
    pub fn derive(platform: Platform, user_id: &str) -> Result<Self, CryptoError> {
        match platform {
            Platform::Epic => Ok(Self::epic(user_id)),
            Platform::Steam => Self::steam(user_id),
        }
    }

    /// XOR the UTF-16LE encoding of the ID over the base key
    pub fn epic(user_id: &str) -> Self {
        let mut key = BASE_KEY;
        let id_bytes = user_id.trim().encode_utf16().flat_map(u16::to_le_bytes);
        for (k, b) in key.iter_mut().zip(id_bytes) {
            *k ^= b;
        }
        Self(key)
    }

    /// XOR the ID, read as a little-endian u64, over the first 8 key bytes
    ///
    /// Non-digit characters are ignored; no digits at all means 0.
    pub fn steam(user_id: &str) -> Result<Self, CryptoError> {
        let digits: String = user_id.chars().filter(|c| c.is_ascii_digit()).collect();
        let steam_id_num = if digits.is_empty() {
            0
        } else {
            digits.parse::<u64>().map_err(|_| {
                CryptoError::KeyDerivation(format!("Steam ID {} does not fit in 64 bits", digits))
            })?
        };

        let mut key = BASE_KEY;
        for (k, b) in key.iter_mut().zip(steam_id_num.to_le_bytes()) {
            *k ^= b;
        }
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Result of a successful decryption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedSave {
    pub platform: Platform,
    /// Plain YAML text
    pub text: Vec<u8>,
    /// Whether the trailer's Adler-32 matched the text (a mismatch is tolerated)
    pub checksum_ok: bool,
}

/// Cipher bound to one platform and user
#[derive(Debug, Clone)]
pub struct SaveCipher {
    platform: Platform,
    key: SaveKey,
}

impl SaveCipher {
    pub fn new(platform: Platform, user_id: &str) -> Result<Self, CryptoError> {
        validate_user_id(user_id)?;
        Ok(Self {
            platform,
            key: SaveKey::derive(platform, user_id)?,
        })
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn key(&self) -> &SaveKey {
        &self.key
    }

    fn aes(&self) -> Aes256 {
        #[allow(deprecated)]
        Aes256::new(GenericArray::from_slice(self.key.as_bytes()))
    }

    /// Decrypt a save container
    ///
    /// # Format
    /// - Input: AES-256-ECB encrypted, PKCS7 padded
    /// - After decryption: zlib stream followed by checksum and length
    pub fn decrypt(&self, encrypted_data: &[u8]) -> Result<DecryptedSave, CryptoError> {
        if encrypted_data.is_empty() || encrypted_data.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::InvalidSize(encrypted_data.len()));
        }

        let cipher = self.aes();
        let mut decrypted = encrypted_data.to_vec();
        for chunk in decrypted.chunks_exact_mut(BLOCK_SIZE) {
            #[allow(deprecated)]
            cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
        }

        // Malformed padding is left in place rather than rejected
        let unpadded = strip_pkcs7(&decrypted);
        if unpadded.len() < TRAILER_LEN {
            return Err(CryptoError::TooShort(unpadded.len()));
        }

        let (body, trailer) = unpadded.split_at(unpadded.len() - TRAILER_LEN);
        let checksum = self
            .platform
            .checksum_from([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let expected_len = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);

        let text = match inflate(unpadded) {
            Ok(text) => text,
            Err(first) => {
                tracing::debug!(error = %first, "inflate failed, retrying without trailer");
                inflate(body)?
            }
        };

        if text.len() != expected_len as usize {
            return Err(CryptoError::LengthMismatch {
                expected: expected_len,
                actual: text.len(),
            });
        }

        let actual = adler::adler32_slice(&text);
        let checksum_ok = actual == checksum;
        if !checksum_ok {
            tracing::warn!(
                platform = %self.platform,
                expected = format_args!("{:#010x}", checksum),
                actual = format_args!("{:#010x}", actual),
                "save checksum mismatch"
            );
        }

        Ok(DecryptedSave {
            platform: self.platform,
            text,
            checksum_ok,
        })
    }

    /// Encrypt YAML text into a save container
    ///
    /// # Format
    /// - Compresses with zlib (level 9)
    /// - Appends checksum and length
    /// - Pads with PKCS7 to 16-byte blocks
    /// - Encrypts with AES-256-ECB
    pub fn encrypt(&self, text: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let text_len = u32::try_from(text.len()).map_err(|_| CryptoError::InvalidSize(text.len()))?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(COMPRESSION_LEVEL));
        encoder.write_all(text)?;
        let mut payload = encoder.finish()?;

        let checksum = adler::adler32_slice(text);
        payload.extend_from_slice(&self.platform.checksum_bytes(checksum));
        payload.extend_from_slice(&text_len.to_le_bytes());

        let mut encrypted = pkcs7_pad(&payload, BLOCK_SIZE);
        let cipher = self.aes();
        for chunk in encrypted.chunks_exact_mut(BLOCK_SIZE) {
            #[allow(deprecated)]
            cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
        }

        Ok(encrypted)
    }
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CryptoError::Decompress(e.to_string()))?;
    Ok(out)
}

/// Decrypt a save without knowing its platform: Epic first, then Steam
pub fn decrypt_save(encrypted_data: &[u8], user_id: &str) -> Result<DecryptedSave, CryptoError> {
    validate_user_id(user_id)?;

    let epic = match SaveCipher::new(Platform::Epic, user_id)?.decrypt(encrypted_data) {
        Ok(save) => return Ok(save),
        Err(e) => e,
    };
    tracing::debug!(error = %epic, "epic decryption failed, trying steam");

    let steam = match SaveCipher::new(Platform::Steam, user_id)
        .and_then(|cipher| cipher.decrypt(encrypted_data))
    {
        Ok(save) => return Ok(save),
        Err(e) => e,
    };

    Err(CryptoError::AllPlatformsFailed {
        epic: Box::new(epic),
        steam: Box::new(steam),
    })
}

/// Encrypt YAML text for the given platform and user
pub fn encrypt_save(
    text: &[u8],
    user_id: &str,
    platform: Platform,
) -> Result<Vec<u8>, CryptoError> {
    SaveCipher::new(platform, user_id)?.encrypt(text)
}

/// Apply PKCS7 padding (always adds 1..=block_size bytes)
pub fn pkcs7_pad(data: &[u8], block_size: usize) -> Vec<u8> {
    let padding_len = block_size - (data.len() % block_size);
    let mut padded = Vec::with_capacity(data.len() + padding_len);
    padded.extend_from_slice(data);
    padded.resize(data.len() + padding_len, padding_len as u8);
    padded
}

/// Remove PKCS7 padding, rejecting anything malformed
pub fn pkcs7_unpad(data: &[u8]) -> Result<&[u8], CryptoError> {
    let Some(&last) = data.last() else {
        return Err(CryptoError::InvalidPadding);
    };
    let padding_len = last as usize;

    if padding_len == 0 || padding_len > BLOCK_SIZE || padding_len > data.len() {
        return Err(CryptoError::InvalidPadding);
    }

    // Verify all padding bytes are correct
    let (body, padding) = data.split_at(data.len() - padding_len);
    if padding.iter().any(|&byte| byte != last) {
        return Err(CryptoError::InvalidPadding);
    }

    Ok(body)
}

/// Remove PKCS7 padding when it is well formed, otherwise return `data` as is
pub fn strip_pkcs7(data: &[u8]) -> &[u8] {
    pkcs7_unpad(data).unwrap_or(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEAM_ID: &str = "76561197960521364";
    const EPIC_ID: &str = "0123456789abcdef0123456789abcdef";
    const YAML: &[u8] = b"state:\n  inventory:\n    slot_0:\n      serial: '@Ugr$ZCm/&tH!t{KgK/Shxu>k'\n";

    /// Container with an arbitrary trailer, for corrupt-save tests
    fn build_container(cipher: &SaveCipher, text: &[u8], checksum: u32, len: u32) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(COMPRESSION_LEVEL));
        encoder.write_all(text).unwrap();
        let mut payload = encoder.finish().unwrap();
        payload.extend_from_slice(&cipher.platform.checksum_bytes(checksum));
        payload.extend_from_slice(&len.to_le_bytes());

        let mut data = pkcs7_pad(&payload, BLOCK_SIZE);
        let aes = cipher.aes();
        for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
            #[allow(deprecated)]
            aes.encrypt_block(GenericArray::from_mut_slice(chunk));
        }
        data
    }

    #[test]
    fn test_steam_key() {
        let key = SaveKey::steam(STEAM_ID).unwrap();
        let id_bytes = 76561197960521364u64.to_le_bytes();

        for i in 0..8 {
            assert_eq!(key.as_bytes()[i], BASE_KEY[i] ^ id_bytes[i]);
        }
        // Remaining bytes should be unchanged
        assert_eq!(key.as_bytes()[8..], BASE_KEY[8..]);
    }

    #[test]
    fn test_steam_key_edge_cases() {
        assert_eq!(SaveKey::steam("no digits").unwrap().as_bytes(), &BASE_KEY);
        assert_eq!(
            SaveKey::steam(" 7656-1197960521364 ").unwrap(),
            SaveKey::steam(STEAM_ID).unwrap()
        );
        assert!(matches!(
            SaveKey::steam("99999999999999999999"),
            Err(CryptoError::KeyDerivation(_))
        ));
    }

    #[test]
    fn test_epic_key() {
        let key = SaveKey::epic("ab");
        // UTF-16LE: 61 00 62 00
        assert_eq!(key.as_bytes()[0], BASE_KEY[0] ^ 0x61);
        assert_eq!(key.as_bytes()[1], BASE_KEY[1]);
        assert_eq!(key.as_bytes()[2], BASE_KEY[2] ^ 0x62);
        assert_eq!(key.as_bytes()[4..], BASE_KEY[4..]);

        // Only the first 16 characters fit in the key
        let long = SaveKey::epic(&"x".repeat(40));
        let short = SaveKey::epic(&"x".repeat(16));
        assert_eq!(long, short);
        assert_eq!(SaveKey::epic("  ab "), key);
    }

    #[test]
    fn test_validate_user_id() {
        assert_eq!(validate_user_id(STEAM_ID).unwrap(), Platform::Steam);
        assert_eq!(validate_user_id(EPIC_ID).unwrap(), Platform::Epic);
        assert_eq!(
            validate_user_id("abc-def_ghi-jkl").unwrap(),
            Platform::Epic
        );
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("1").is_err());
        assert!(validate_user_id(&"1".repeat(21)).is_err());
        assert!(validate_user_id("short").is_err());
        assert!(validate_user_id("has spaces in the id").is_err());
        assert!(validate_user_id(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_epic_id_length_counts_separators() {
        assert_eq!(validate_user_id("abc-def-gh").unwrap(), Platform::Epic);
        assert_eq!(validate_user_id("ab_cd_ef_g").unwrap(), Platform::Epic);
        assert!(validate_user_id("abc-def-g").is_err());
        assert!(validate_user_id("----------").is_err());
        assert!(validate_user_id(&format!("{}-", "a".repeat(50))).is_err());
    }

    #[test]
    fn test_roundtrip_both_platforms() {
        for (platform, id) in [(Platform::Steam, STEAM_ID), (Platform::Epic, EPIC_ID)] {
            let encrypted = encrypt_save(YAML, id, platform).unwrap();
            assert_eq!(encrypted.len() % 16, 0);

            let save = SaveCipher::new(platform, id).unwrap().decrypt(&encrypted).unwrap();
            assert_eq!(save.text, YAML);
            assert_eq!(save.platform, platform);
            assert!(save.checksum_ok);
        }
    }

    #[test]
    fn test_decrypt_save_detects_platform() {
        let epic = encrypt_save(YAML, EPIC_ID, Platform::Epic).unwrap();
        assert_eq!(decrypt_save(&epic, EPIC_ID).unwrap().platform, Platform::Epic);

        let steam = encrypt_save(YAML, STEAM_ID, Platform::Steam).unwrap();
        let save = decrypt_save(&steam, STEAM_ID).unwrap();
        assert_eq!(save.platform, Platform::Steam);
        assert_eq!(save.text, YAML);
    }

    #[test]
    fn test_wrong_user_fails_everywhere() {
        let steam = encrypt_save(YAML, STEAM_ID, Platform::Steam).unwrap();
        assert!(matches!(
            decrypt_save(&steam, "76561197960521365"),
            Err(CryptoError::AllPlatformsFailed { .. })
        ));
    }

    #[test]
    fn test_short_id_rejected_before_decryption() {
        // Data size is invalid too; the ID check must win
        assert!(matches!(
            decrypt_save(&[0u8; 5], "1"),
            Err(CryptoError::KeyDerivation(_))
        ));
    }

    #[test]
    fn test_invalid_size() {
        let cipher = SaveCipher::new(Platform::Steam, STEAM_ID).unwrap();
        assert!(matches!(cipher.decrypt(&[]), Err(CryptoError::InvalidSize(0))));
        assert!(matches!(
            cipher.decrypt(&[0u8; 17]),
            Err(CryptoError::InvalidSize(17))
        ));
    }

    #[test]
    fn test_checksum_mismatch_is_tolerated() {
        let cipher = SaveCipher::new(Platform::Epic, EPIC_ID).unwrap();
        let data = build_container(&cipher, YAML, 0xDEAD_BEEF, YAML.len() as u32);

        let save = cipher.decrypt(&data).unwrap();
        assert_eq!(save.text, YAML);
        assert!(!save.checksum_ok);
    }

    #[test]
    fn test_length_mismatch_is_fatal() {
        let cipher = SaveCipher::new(Platform::Steam, STEAM_ID).unwrap();
        let checksum = adler::adler32_slice(YAML);
        let data = build_container(&cipher, YAML, checksum, YAML.len() as u32 + 1);

        assert!(matches!(
            cipher.decrypt(&data),
            Err(CryptoError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_trailer_endianness() {
        let cipher = SaveCipher::new(Platform::Epic, EPIC_ID).unwrap();
        let checksum = adler::adler32_slice(YAML);
        // Epic expects big-endian; a little-endian checksum reads as a mismatch
        let data = build_container(&cipher, YAML, checksum.swap_bytes(), YAML.len() as u32);
        assert!(!cipher.decrypt(&data).unwrap().checksum_ok);
    }

    #[test]
    fn test_pkcs7() {
        assert_eq!(pkcs7_pad(b"", 16), vec![16u8; 16]);
        let padded = pkcs7_pad(b"hello", 16);
        assert_eq!(padded.len(), 16);
        assert_eq!(pkcs7_unpad(&padded).unwrap(), b"hello");

        assert!(matches!(pkcs7_unpad(&[]), Err(CryptoError::InvalidPadding)));
        assert!(matches!(pkcs7_unpad(&[1, 2, 0]), Err(CryptoError::InvalidPadding)));
        assert!(matches!(pkcs7_unpad(&[1, 3, 2]), Err(CryptoError::InvalidPadding)));
        assert!(matches!(pkcs7_unpad(&[17; 17]), Err(CryptoError::InvalidPadding)));

        assert_eq!(strip_pkcs7(&[1, 3, 2]), &[1, 3, 2]);
        assert_eq!(strip_pkcs7(&[1, 2, 2]), &[1]);
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("Epic".parse::<Platform>().unwrap(), Platform::Epic);
        assert_eq!(" steam ".parse::<Platform>().unwrap(), Platform::Steam);
        assert!("xbox".parse::<Platform>().is_err());
        assert_eq!(Platform::Steam.to_string(), "steam");
    }
}

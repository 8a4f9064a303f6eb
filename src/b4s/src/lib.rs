//! # b4s
//!
//! Borderlands 4 item serial codec and save container encryption.
//!
//! This library provides functionality to:
//! - Decode item serials into editable blocks and encode them back bit-exactly
//! - Decrypt and encrypt Epic and Steam save containers
//! - Locate and replace item serials inside decrypted YAML saves
//!
//! ## Example
//!
//! ```no_run
//! use std::fs;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let encrypted = fs::read("1.sav")?;
//! let user_id = "76561197960521364";
//!
//! // Decrypt and parse save file
//! let decrypted = b4s::decrypt_save(&encrypted, user_id)?;
//! let mut save = b4s::SaveFile::from_yaml(&decrypted.text)?;
//!
//! // Swap the first item's part 1 for part 2
//! let items = save.items();
//! let item = &items[0];
//! let text = item.decode()?.to_string().replacen("{1}", "{2}", 1);
//! let blocks: b4s::BlockSequence = text.parse()?;
//! save.set_serial(&item.path, &b4s::encode_serial(&blocks)?)?;
//!
//! // Re-encrypt and save
//! let encrypted = b4s::encrypt_save(&save.to_yaml()?, user_id, decrypted.platform)?;
//! fs::write("1.sav", encrypted)?;
//! # Ok(())
//! # }
//! ```

pub mod crypto;
pub mod save;
pub mod serial;

// Re-export commonly used items
#[doc(inline)]
pub use crypto::{
    decrypt_save, encrypt_save, validate_user_id, CryptoError, DecryptedSave, Platform,
    SaveCipher, SaveKey,
};
#[doc(inline)]
pub use save::{ItemEntry, SaveError, SaveFile};
#[doc(inline)]
pub use serial::{
    decode_serial, encode_serial, Block, BlockSequence, ItemSerial, Part, PartPayload,
    SerialError,
};

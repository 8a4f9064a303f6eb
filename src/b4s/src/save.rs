//! Decrypted save parsing, querying, and serial replacement.
//!
//! A decrypted save is a YAML document. Items appear as mappings with a
//! `serial` field holding an `@U` serial; [`SaveFile::items`] finds them,
//! [`SaveFile::set_serial`] swaps one for an edited serial and
//! [`SaveFile::add_item`] puts a new one in the backpack.

use serde_yaml::{Mapping, Value};
use std::fmt;
use thiserror::Error;

use crate::serial::{ItemSerial, SerialError, SERIAL_PREFIX};

/// Key whose subtree is never scanned for items
const UNKNOWN_ITEMS_KEY: &str = "unknown_items";
const SERIAL_KEY: &str = "serial";
const STATE_FLAGS_KEY: &str = "state_flags";
const BACKPACK_KEY: &str = "backpack";
const SLOT_PREFIX: &str = "slot_";

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Array index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    #[error("Invalid array index: {0}")]
    InvalidIndex(String),

    #[error("No item serial at {0}")]
    NotAnItem(String),

    #[error("Expected a mapping at {0}")]
    NotAMapping(String),
}

/// One item found in a save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEntry {
    /// Path of the mapping that owns the serial, usable with [`SaveFile::get`]
    pub path: String,
    pub serial: String,
}

impl ItemEntry {
    pub fn decode(&self) -> Result<ItemSerial, SerialError> {
        ItemSerial::decode(&self.serial)
    }
}

/// Represents a loaded save file with query/modify capabilities
pub struct SaveFile {
    data: Value,
}

impl SaveFile {
    /// Parse a save file from decrypted YAML data
    pub fn from_yaml(yaml_data: &[u8]) -> Result<Self, SaveError> {
        let data = serde_yaml::from_slice(yaml_data)?;
        Ok(SaveFile { data })
    }

    /// Serialize the save file back to YAML
    pub fn to_yaml(&self) -> Result<Vec<u8>, SaveError> {
        let yaml_string = serde_yaml::to_string(&self.data)?;
        Ok(yaml_string.into_bytes())
    }

    /// Query a value at a YAML path (e.g. "state.currencies.cash" or "state.experience\[0\].level")
    pub fn get(&self, path: &str) -> Result<&Value, SaveError> {
        let mut current = &self.data;
        for segment in parse_path(path)? {
            current = step(current, &segment).ok_or_else(|| segment.not_found())?;
        }
        Ok(current)
    }

    /// Replace the value at an existing YAML path
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), SaveError> {
        *self.get_mut(path)? = value;
        Ok(())
    }

    fn get_mut(&mut self, path: &str) -> Result<&mut Value, SaveError> {
        let mut current = &mut self.data;
        for segment in parse_path(path)? {
            current = step_mut(current, &segment).ok_or_else(|| segment.not_found())?;
        }
        Ok(current)
    }

    /// Every item serial in the document, in document order
    ///
    /// Entries under `unknown_items` are skipped, and a mapping that carries a
    /// serial is not searched any deeper.
    pub fn items(&self) -> Vec<ItemEntry> {
        let mut items = Vec::new();
        collect_items(&self.data, String::new(), &mut items);
        items
    }

    /// Replace the serial of the item at `path`
    pub fn set_serial(&mut self, path: &str, serial: &str) -> Result<(), SaveError> {
        let item = self.get_mut(path)?;
        let mapping = untag_mut(item)
            .as_mapping_mut()
            .filter(|m| serial_of(m).is_some())
            .ok_or_else(|| SaveError::NotAnItem(path.to_string()))?;
        mapping.insert(
            Value::String(SERIAL_KEY.to_string()),
            Value::String(serial.to_string()),
        );
        Ok(())
    }

    /// Add an item to the backpack in the slot after the highest `slot_N`
    ///
    /// The backpack is the first `backpack` key in document order. Returns the
    /// path of the new item.
    pub fn add_item(&mut self, serial: &str, state_flags: u32) -> Result<String, SaveError> {
        let backpack_path = find_key(&self.data, BACKPACK_KEY, String::new())
            .ok_or_else(|| SaveError::KeyNotFound(BACKPACK_KEY.to_string()))?;

        let backpack = untag_mut(self.get_mut(&backpack_path)?);
        if backpack.is_null() {
            *backpack = Value::Mapping(Mapping::new());
        }
        let mapping = backpack
            .as_mapping_mut()
            .ok_or_else(|| SaveError::NotAMapping(backpack_path.clone()))?;

        let next_slot = mapping
            .iter()
            .filter_map(|(key, _)| key.as_str())
            .filter_map(slot_number)
            .fold(-1, i64::max)
            + 1;
        let slot_key = format!("{}{}", SLOT_PREFIX, next_slot);

        let mut item = Mapping::new();
        item.insert(
            Value::String(SERIAL_KEY.to_string()),
            Value::String(serial.to_string()),
        );
        item.insert(
            Value::String(STATE_FLAGS_KEY.to_string()),
            Value::from(state_flags),
        );
        mapping.insert(Value::String(slot_key.clone()), Value::Mapping(item));

        Ok(format!("{}.{}", backpack_path, slot_key))
    }
}

impl fmt::Debug for SaveFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveFile")
            .field("items", &self.items().len())
            .finish()
    }
}

// Internal helper functions

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    fn not_found(&self) -> SaveError {
        match self {
            Segment::Key(key) => SaveError::KeyNotFound(key.clone()),
            Segment::Index(index) => SaveError::IndexOutOfBounds(*index),
        }
    }
}

/// Split `a.b[0][1].c` into segments; an empty path is the document root
fn parse_path(path: &str) -> Result<Vec<Segment>, SaveError> {
    let mut segments = Vec::new();

    for part in path.split('.').filter(|p| !p.is_empty()) {
        let (key, mut rest) = match part.find('[') {
            Some(pos) => part.split_at(pos),
            None => (part, ""),
        };
        if !key.is_empty() {
            segments.push(Segment::Key(key.to_string()));
        }

        while !rest.is_empty() {
            let close = rest
                .find(']')
                .filter(|_| rest.starts_with('['))
                .ok_or_else(|| SaveError::InvalidIndex(rest.to_string()))?;
            let index_str = &rest[1..close];
            let index: usize = index_str
                .parse()
                .map_err(|_| SaveError::InvalidIndex(index_str.to_string()))?;
            segments.push(Segment::Index(index));
            rest = &rest[close + 1..];
        }
    }

    Ok(segments)
}

/// Look through YAML tags (`!tag value`) to the tagged value
fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn untag_mut(value: &mut Value) -> &mut Value {
    match value {
        Value::Tagged(tagged) => untag_mut(&mut tagged.value),
        other => other,
    }
}

/// Path form of a scalar mapping key
fn key_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn step<'a>(value: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match (untag(value), segment) {
        (Value::Mapping(mapping), Segment::Key(key)) => mapping
            .iter()
            .find(|(k, _)| key_string(k).as_deref() == Some(key.as_str()))
            .map(|(_, v)| v),
        (Value::Sequence(seq), Segment::Index(index)) => seq.get(*index),
        _ => None,
    }
}

fn step_mut<'a>(value: &'a mut Value, segment: &Segment) -> Option<&'a mut Value> {
    match (untag_mut(value), segment) {
        (Value::Mapping(mapping), Segment::Key(key)) => mapping
            .iter_mut()
            .find(|(k, _)| key_string(k).as_deref() == Some(key.as_str()))
            .map(|(_, v)| v),
        (Value::Sequence(seq), Segment::Index(index)) => seq.get_mut(*index),
        _ => None,
    }
}

fn serial_of(mapping: &Mapping) -> Option<&str> {
    mapping
        .get(SERIAL_KEY)
        .and_then(Value::as_str)
        .filter(|s| s.starts_with(SERIAL_PREFIX))
}

/// `slot_12` -> 12; digits stop at the next `_`
fn slot_number(key: &str) -> Option<i64> {
    key.strip_prefix(SLOT_PREFIX)?.split('_').next()?.parse().ok()
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// Depth-first search for the first mapping key named `target`
fn find_key(value: &Value, target: &str, path: String) -> Option<String> {
    match untag(value) {
        Value::Mapping(mapping) => mapping.iter().find_map(|(key, child)| {
            let key = key_string(key)?;
            let child_path = join_key(&path, &key);
            if key == target {
                Some(child_path)
            } else {
                find_key(child, target, child_path)
            }
        }),
        Value::Sequence(seq) => seq
            .iter()
            .enumerate()
            .find_map(|(i, child)| find_key(child, target, format!("{}[{}]", path, i))),
        _ => None,
    }
}

fn collect_items(value: &Value, path: String, items: &mut Vec<ItemEntry>) {
    match untag(value) {
        Value::Mapping(mapping) => {
            if let Some(serial) = serial_of(mapping) {
                items.push(ItemEntry {
                    path,
                    serial: serial.to_string(),
                });
                return;
            }
            for (key, child) in mapping {
                let Some(key) = key_string(key) else {
                    continue;
                };
                if key == UNKNOWN_ITEMS_KEY {
                    continue;
                }
                collect_items(child, join_key(&path, &key), items);
            }
        }
        Value::Sequence(seq) => {
            for (i, child) in seq.iter().enumerate() {
                collect_items(child, format!("{}[{}]", path, i), items);
            }
        }
        _ => {}
    }
}

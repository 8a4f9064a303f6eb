//! Item serial codec
//!
//! Item serials use a custom Base85 encoding with bit-packed data.
//!
//! Format:
//! 1. Serials start with `@U` prefix
//! 2. Encoded with custom Base85 alphabet
//! 3. Decoded bytes have mirrored bits
//! 4. Data is a 7-bit magic header followed by prefix-coded blocks
//!
//! ```
//! use b4s::serial::{decode_serial, encode_serial};
//!
//! let blocks = decode_serial("@Ugr$ZCm/&tH!t{KgK/Shxu>k").unwrap();
//! assert_eq!(blocks.to_string(), "269, 0, 1, 33| 2, 1949|| {1} {7} {243:104}|");
//! assert_eq!(encode_serial(&blocks).unwrap(), "@Ugr$ZCm/&tH!t{KgK/Shxu>k");
//! ```

use std::fmt;

pub mod b4string;
pub mod base85;
pub mod bitstream;
pub mod block;
pub mod mirror;
pub mod part;
pub mod text;
pub mod tokenizer;
pub mod varbit;
pub mod varint;

pub use base85::{decode_base85, encode_base85, SERIAL_PREFIX};
pub use bitstream::{BitReader, BitWriter};
pub use block::{bit_trace, deserialize, serialize, Block, BlockSequence};
pub use part::{Part, PartPayload, PartSubType};
pub use tokenizer::{Token, Tokenizer};

/// Errors that can occur while decoding or encoding serials
#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("Unexpected end of bitstream")]
    EndOfStream,

    #[error("Cannot read {0} bits at once (1..=32)")]
    InvalidBitCount(usize),

    #[error("Cannot rewind {requested} bits from position {position}")]
    RewindPastStart { requested: usize, position: usize },

    #[error("Bit position {position} is outside a {len}-bit buffer")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("Truncated VarInt")]
    TruncatedVarInt,

    #[error("Truncated VarBit")]
    TruncatedVarBit,

    #[error("Truncated string")]
    TruncatedString,

    #[error("Truncated part")]
    TruncatedPart,

    #[error("String payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("Invalid token code {code:03b} at bit {position}")]
    InvalidToken { code: u8, position: usize },

    #[error("Unexpected token in {context}: {found}")]
    UnexpectedToken {
        context: &'static str,
        found: String,
    },

    #[error("Unknown part flag {0:02b}")]
    UnknownPartFlag(u8),

    #[error("Part value is not followed by a 000 terminator")]
    MalformedPartTerminator,

    #[error("Bad magic header (expected 0010000)")]
    BadMagicHeader,

    #[error("Not a valid serial (missing @U prefix)")]
    NotAValidSerial,

    #[error("Invalid character {ch:?} at position {position}")]
    InvalidCharacter { ch: char, position: usize },

    #[error("Unmatched {delimiter:?} at position {position}")]
    UnmatchedDelimiter { delimiter: char, position: usize },

    #[error("Invalid part: {0}")]
    InvalidPart(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Value {value} exceeds the encodable maximum {max}")]
    ValueOutOfRange { value: u32, max: u32 },

    #[error("Cannot encode string: {0}")]
    UnencodableString(String),
}

/// Decode a serial string into blocks
pub fn decode_serial(serial: &str) -> Result<BlockSequence, SerialError> {
    let bytes = decode_base85(serial.trim())?;
    deserialize(&bytes)
}

/// Encode blocks into a serial string
pub fn encode_serial(blocks: &BlockSequence) -> Result<String, SerialError> {
    Ok(encode_base85(&serialize(blocks)?))
}

/// Decoded item serial information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSerial {
    /// Base85 serial as given (or as produced by [`ItemSerial::from_blocks`])
    pub original: String,

    /// Decoded bytes, mirrored and ready for bit-level reading
    pub raw_bytes: Vec<u8>,

    /// Parsed blocks from the bitstream
    pub blocks: BlockSequence,
}

impl ItemSerial {
    /// Decode an item serial
    ///
    /// Example: `@Ugr$ZCm/&tH!t{KgK/Shxu>k`
    pub fn decode(serial: &str) -> Result<Self, SerialError> {
        let serial = serial.trim();
        let raw_bytes = decode_base85(serial)?;
        let blocks = deserialize(&raw_bytes)?;

        Ok(ItemSerial {
            original: serial.to_string(),
            raw_bytes,
            blocks,
        })
    }

    /// Build a serial from edited blocks
    pub fn from_blocks(blocks: BlockSequence) -> Result<Self, SerialError> {
        let raw_bytes = serialize(&blocks)?;
        Ok(ItemSerial {
            original: encode_base85(&raw_bytes),
            raw_bytes,
            blocks,
        })
    }

    /// Encode the current blocks back to a serial string
    ///
    /// Blocks are re-serialized, so edits made through the public field are
    /// picked up.
    pub fn encode(&self) -> Result<String, SerialError> {
        encode_serial(&self.blocks)
    }

    /// Bit dump of `raw_bytes` split at token boundaries
    pub fn bit_trace(&self) -> String {
        bit_trace(&self.raw_bytes)
    }
}

impl fmt::Display for ItemSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.blocks)
    }
}

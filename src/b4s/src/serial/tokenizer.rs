//! Prefix-code tokenizer over the serial bitstream.
//!
//! Every block starts with a 2- or 3-bit prefix:
//!
//! | Prefix | Token  |
//! |--------|--------|
//! | `00`   | Sep1   |
//! | `01`   | Sep2   |
//! | `100`  | VarInt |
//! | `101`  | Part   |
//! | `110`  | VarBit |
//! | `111`  | String |

use std::fmt;

use serde::{Deserialize, Serialize};

use super::bitstream::BitReader;
use super::SerialError;

/// Block kind announced by a prefix code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    Sep1,
    Sep2,
    VarInt,
    Part,
    VarBit,
    String,
}

impl Token {
    /// Prefix bits as written on the wire
    pub fn prefix(self) -> &'static [u8] {
        match self {
            Token::Sep1 => &[0, 0],
            Token::Sep2 => &[0, 1],
            Token::VarInt => &[1, 0, 0],
            Token::Part => &[1, 0, 1],
            Token::VarBit => &[1, 1, 0],
            Token::String => &[1, 1, 1],
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Token::Sep1 => "Sep1",
            Token::Sep2 => "Sep2",
            Token::VarInt => "VarInt",
            Token::Part => "Part",
            Token::VarBit => "VarBit",
            Token::String => "String",
        };
        f.write_str(name)
    }
}

/// Reads prefix codes and remembers where each token started
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    reader: BitReader<'a>,
    split_positions: Vec<usize>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            reader: BitReader::new(bytes),
            split_positions: Vec::new(),
        }
    }

    /// Next token, or `None` once the stream runs out mid-prefix
    pub fn next_token(&mut self) -> Result<Option<Token>, SerialError> {
        let start = self.reader.position();

        let prefix = match self.reader.read_bits(2) {
            Ok(bits) => bits,
            Err(SerialError::EndOfStream) => return Ok(None),
            Err(e) => return Err(e),
        };

        let token = match prefix {
            0b00 => Token::Sep1,
            0b01 => Token::Sep2,
            _ => {
                let bit = match self.reader.read_bit() {
                    Ok(bit) => bit,
                    Err(SerialError::EndOfStream) => return Ok(None),
                    Err(e) => return Err(e),
                };
                match (prefix << 1) | u32::from(bit) {
                    0b100 => Token::VarInt,
                    0b101 => Token::Part,
                    0b110 => Token::VarBit,
                    0b111 => Token::String,
                    code => {
                        self.reader.rewind(3)?;
                        return Err(SerialError::InvalidToken {
                            code: code as u8,
                            position: start,
                        });
                    }
                }
            }
        };

        self.split_positions.push(start);
        Ok(Some(token))
    }

    /// Consume `bits` exactly, failing with `err` on any mismatch or short read
    pub fn expect(&mut self, bits: &[u8], err: SerialError) -> Result<(), SerialError> {
        for &expected in bits {
            match self.reader.read_bit() {
                Ok(bit) if bit == expected => {}
                _ => return Err(err),
            }
        }
        Ok(())
    }

    pub fn reader_mut(&mut self) -> &mut BitReader<'a> {
        &mut self.reader
    }

    pub fn position(&self) -> usize {
        self.reader.position()
    }

    /// Bit offsets at which tokens started, in visiting order
    pub fn split_positions(&self) -> &[usize] {
        &self.split_positions
    }

    /// Whole buffer as '0'/'1' with a double space before every visited token
    pub fn annotated_bits(&self) -> String {
        let bits = self.reader.to_bit_string();
        let mut splits = self.split_positions.clone();
        splits.sort_unstable();
        splits.dedup();

        let mut out = String::with_capacity(bits.len() + splits.len() * 2);
        let mut last = 0;
        for &split in splits.iter().filter(|&&s| s > 0 && s < bits.len()) {
            out.push_str(&bits[last..split]);
            out.push_str("  ");
            last = split;
        }
        out.push_str(&bits[last..]);
        out
    }
}

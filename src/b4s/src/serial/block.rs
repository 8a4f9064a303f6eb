//! Typed blocks and the block-sequence serializer.
//!
//! A serialized sequence is the 7-bit magic header `0010000` followed by one
//! prefix-coded block after another, zero-padded to a byte boundary.

use serde::{Deserialize, Serialize};

use super::bitstream::BitWriter;
use super::part::Part;
use super::tokenizer::{Token, Tokenizer};
use super::{b4string, varbit, varint, SerialError};

/// Magic header that opens every serialized sequence
pub const MAGIC_HEADER: [u8; 7] = [0, 0, 1, 0, 0, 0, 0];

/// One decoded unit of a serial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Block {
    /// Hard separator (`|`)
    Sep1,
    /// Soft separator (`,`)
    Sep2,
    VarInt(u32),
    VarBit(u32),
    Part(Part),
    String(String),
}

impl Block {
    /// Integer block using whichever codec yields fewer bits
    ///
    /// Ties go to VarInt. Values VarInt cannot hold always use VarBit.
    pub fn int(value: u32) -> Self {
        if value <= varint::MAX_VALUE && varint::encoded_bits(value) <= varbit::encoded_bits(value)
        {
            Block::VarInt(value)
        } else {
            Block::VarBit(value)
        }
    }

    pub fn token(&self) -> Token {
        match self {
            Block::Sep1 => Token::Sep1,
            Block::Sep2 => Token::Sep2,
            Block::VarInt(_) => Token::VarInt,
            Block::VarBit(_) => Token::VarBit,
            Block::Part(_) => Token::Part,
            Block::String(_) => Token::String,
        }
    }

    /// Integer payload of a VarInt or VarBit block
    pub fn as_int(&self) -> Option<u32> {
        match self {
            Block::VarInt(v) | Block::VarBit(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Block::Sep1 | Block::Sep2)
    }

    /// Decode the payload that follows `token`
    pub fn read(token: Token, tokenizer: &mut Tokenizer<'_>) -> Result<Self, SerialError> {
        Ok(match token {
            Token::Sep1 => Block::Sep1,
            Token::Sep2 => Block::Sep2,
            Token::VarInt => Block::VarInt(varint::read(tokenizer.reader_mut())?),
            Token::VarBit => Block::VarBit(varbit::read(tokenizer.reader_mut())?),
            Token::Part => Block::Part(Part::read(tokenizer)?),
            Token::String => Block::String(b4string::read(tokenizer.reader_mut())?),
        })
    }

    /// Write prefix and payload
    pub fn write(&self, writer: &mut BitWriter) -> Result<(), SerialError> {
        writer.write_bits(self.token().prefix());
        match self {
            Block::Sep1 | Block::Sep2 => Ok(()),
            Block::VarInt(v) => varint::write(writer, *v),
            Block::VarBit(v) => varbit::write(writer, *v),
            Block::Part(part) => part.write(writer),
            Block::String(s) => b4string::write(writer, s),
        }
    }
}

/// Ordered blocks of one serial, in wire order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockSequence(Vec<Block>);

impl BlockSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: Block) {
        self.0.push(block);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Block] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Block> {
        self.0
    }

    /// Collapse a trailing run of Sep1 blocks to a single Sep1
    ///
    /// Zero padding after the last real block decodes as extra Sep1 tokens.
    /// Returns how many blocks were dropped.
    pub fn sanitize_trailing_terminators(&mut self) -> usize {
        let run = self
            .0
            .iter()
            .rev()
            .take_while(|block| **block == Block::Sep1)
            .count();
        let dropped = run.saturating_sub(1);
        self.0.truncate(self.0.len() - dropped);
        dropped
    }

    /// Parts in sequence order
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.0.iter().filter_map(|block| match block {
            Block::Part(part) => Some(part),
            _ => None,
        })
    }
}

impl From<Vec<Block>> for BlockSequence {
    fn from(blocks: Vec<Block>) -> Self {
        Self(blocks)
    }
}

impl FromIterator<Block> for BlockSequence {
    fn from_iter<I: IntoIterator<Item = Block>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for BlockSequence {
    type Item = Block;
    type IntoIter = std::vec::IntoIter<Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a BlockSequence {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Serialize blocks to bytes (header included, zero-padded)
pub fn serialize(blocks: &BlockSequence) -> Result<Vec<u8>, SerialError> {
    let mut writer = BitWriter::new();
    writer.write_bits(&MAGIC_HEADER);
    for block in blocks {
        block.write(&mut writer)?;
    }
    Ok(writer.finish())
}

/// Deserialize bytes produced by [`serialize`] (or a real serial)
///
/// Any malformed block aborts the whole decode.
pub fn deserialize(bytes: &[u8]) -> Result<BlockSequence, SerialError> {
    let mut tokenizer = Tokenizer::new(bytes);
    decode_blocks(&mut tokenizer)
}

fn decode_blocks(tokenizer: &mut Tokenizer<'_>) -> Result<BlockSequence, SerialError> {
    tokenizer.expect(&MAGIC_HEADER, SerialError::BadMagicHeader)?;

    let mut blocks = BlockSequence::new();
    while let Some(token) = tokenizer.next_token()? {
        blocks.push(Block::read(token, tokenizer)?);
    }

    let dropped = blocks.sanitize_trailing_terminators();
    tracing::debug!(
        blocks = blocks.len(),
        dropped_terminators = dropped,
        bits = tokenizer.position(),
        "decoded block sequence"
    );

    Ok(blocks)
}

/// Bits of `bytes` with a double space at every token boundary
///
/// The trace covers whatever the decoder reached, so it is useful for
/// locating the point where a malformed serial goes wrong.
pub fn bit_trace(bytes: &[u8]) -> String {
    let mut tokenizer = Tokenizer::new(bytes);
    if let Err(e) = decode_blocks(&mut tokenizer) {
        tracing::debug!(error = %e, position = tokenizer.position(), "decode stopped");
    }
    tokenizer.annotated_bits()
}

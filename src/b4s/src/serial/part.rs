//! Part blocks: an index plus an optional scalar or list payload.
//!
//! After the VarInt index come flag bits selecting the payload:
//!
//! - `1`: single VarInt value, closed by `000`
//! - `0 10`: no payload
//! - `0 01`: list of VarInt/VarBit tokens opened by Sep2 and closed by Sep1

use serde::{Deserialize, Serialize};

use super::bitstream::BitWriter;
use super::block::Block;
use super::tokenizer::{Token, Tokenizer};
use super::{varbit, varint, SerialError};

/// Payload kind of a [`Part`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartSubType {
    None,
    Int,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartPayload {
    None,
    Int(u32),
    List(Vec<u32>),
}

/// One part reference inside a serial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub index: u32,
    pub payload: PartPayload,
}

impl Part {
    pub fn none(index: u32) -> Self {
        Self {
            index,
            payload: PartPayload::None,
        }
    }

    pub fn int(index: u32, value: u32) -> Self {
        Self {
            index,
            payload: PartPayload::Int(value),
        }
    }

    pub fn list(index: u32, values: Vec<u32>) -> Self {
        Self {
            index,
            payload: PartPayload::List(values),
        }
    }

    pub fn sub_type(&self) -> PartSubType {
        match self.payload {
            PartPayload::None => PartSubType::None,
            PartPayload::Int(_) => PartSubType::Int,
            PartPayload::List(_) => PartSubType::List,
        }
    }

    /// Decode a part body; the `101` prefix has already been consumed
    pub fn read(tokenizer: &mut Tokenizer<'_>) -> Result<Self, SerialError> {
        let index = varint::read(tokenizer.reader_mut())?;

        let flag = tokenizer
            .reader_mut()
            .read_bit()
            .map_err(|_| SerialError::TruncatedPart)?;
        if flag == 1 {
            let value = varint::read(tokenizer.reader_mut())?;
            tokenizer.expect(&[0, 0, 0], SerialError::MalformedPartTerminator)?;
            return Ok(Self::int(index, value));
        }

        let sub_flag = tokenizer
            .reader_mut()
            .read_bits(2)
            .map_err(|_| SerialError::TruncatedPart)?;
        match sub_flag {
            0b10 => Ok(Self::none(index)),
            0b01 => {
                let values = read_list(tokenizer)?;
                Ok(Self::list(index, values))
            }
            other => Err(SerialError::UnknownPartFlag(other as u8)),
        }
    }

    /// Encode the part body (without the `101` prefix)
    pub fn write(&self, writer: &mut BitWriter) -> Result<(), SerialError> {
        varint::write(writer, self.index)?;

        match &self.payload {
            PartPayload::None => writer.write_bits(&[0, 1, 0]),
            PartPayload::Int(value) => {
                writer.write_bit(1);
                varint::write(writer, *value)?;
                writer.write_bits(&[0, 0, 0]);
            }
            PartPayload::List(values) => {
                writer.write_bits(&[0, 0, 1]);
                Block::Sep2.write(writer)?;
                for &value in values {
                    Block::int(value).write(writer)?;
                }
                Block::Sep1.write(writer)?;
            }
        }

        Ok(())
    }
}

fn read_list(tokenizer: &mut Tokenizer<'_>) -> Result<Vec<u32>, SerialError> {
    match tokenizer.next_token()? {
        Some(Token::Sep2) => {}
        found => {
            return Err(SerialError::UnexpectedToken {
                context: "part list start",
                found: describe(found),
            })
        }
    }

    let mut values = Vec::new();
    loop {
        match tokenizer.next_token()? {
            Some(Token::VarInt) => values.push(varint::read(tokenizer.reader_mut())?),
            Some(Token::VarBit) => values.push(varbit::read(tokenizer.reader_mut())?),
            Some(Token::Sep1) => return Ok(values),
            None => return Err(SerialError::TruncatedPart),
            Some(other) => {
                return Err(SerialError::UnexpectedToken {
                    context: "part list",
                    found: other.to_string(),
                })
            }
        }
    }
}

fn describe(token: Option<Token>) -> String {
    token.map_or_else(|| "end of stream".to_string(), |t| t.to_string())
}

//! VarInt: 4-bit nibbles, each followed by a continuation bit.
//!
//! Format: `[4-bit nibble][1-bit continuation]...`, least significant nibble
//! first, at most four nibbles. Nibble bits are stored LSB-first on the wire,
//! hence the pass through [`MIRROR_4`] after an MSB-first read.

use super::bitstream::{BitReader, BitWriter};
use super::mirror::MIRROR_4;
use super::SerialError;

pub const BITS_PER_BLOCK: usize = 4;
pub const MAX_BLOCKS: usize = 4;
pub const MAX_USABLE_BITS: u32 = 16;

/// Largest value a VarInt can carry
pub const MAX_VALUE: u32 = (1 << MAX_USABLE_BITS) - 1;

/// Significant bits of `value`, at least 1
pub(crate) fn significant_bits(value: u32) -> u32 {
    (u32::BITS - value.leading_zeros()).max(1)
}

/// Bits [`write`] emits for `value` (assuming it fits)
pub fn encoded_bits(value: u32) -> usize {
    let n_bits = significant_bits(value).min(MAX_USABLE_BITS) as usize;
    n_bits.div_ceil(BITS_PER_BLOCK) * (BITS_PER_BLOCK + 1)
}

/// Read a VarInt, stopping early on a zero continuation bit
pub fn read(reader: &mut BitReader<'_>) -> Result<u32, SerialError> {
    let mut result = 0u32;
    let mut shift = 0;

    for _ in 0..MAX_BLOCKS {
        let raw = reader
            .read_bits(BITS_PER_BLOCK)
            .map_err(|_| SerialError::TruncatedVarInt)?;
        result |= u32::from(MIRROR_4[raw as usize]) << shift;
        shift += BITS_PER_BLOCK;

        let cont = reader.read_bit().map_err(|_| SerialError::TruncatedVarInt)?;
        if cont == 0 {
            break;
        }
    }

    Ok(result)
}

/// Write a VarInt using the fewest nibbles that hold `value`
pub fn write(writer: &mut BitWriter, value: u32) -> Result<(), SerialError> {
    if value > MAX_VALUE {
        return Err(SerialError::ValueOutOfRange {
            value,
            max: MAX_VALUE,
        });
    }

    let mut remaining = value;
    let mut n_bits = significant_bits(value) as usize;

    loop {
        let nibble = (remaining & 0xF) as usize;
        remaining >>= BITS_PER_BLOCK;
        writer.write_n(u32::from(MIRROR_4[nibble]), BITS_PER_BLOCK);

        if n_bits > BITS_PER_BLOCK {
            n_bits -= BITS_PER_BLOCK;
            writer.write_bit(1); // Continuation = 1 (more)
        } else {
            writer.write_bit(0); // Continuation = 0 (stop)
            return Ok(());
        }
    }
}

//! VarBit: a 5-bit length prefix followed by that many value bits.
//!
//! Both the length and the value are stored LSB-first. A length of 0 means
//! the value is 0 (it does not stand for 32).

use super::bitstream::{BitReader, BitWriter};
use super::mirror::MIRROR_5;
use super::SerialError;

pub const LENGTH_BITS: usize = 5;
pub const MAX_USABLE_BITS: u32 = (1 << LENGTH_BITS) - 1;

/// Largest value a VarBit can carry
pub const MAX_VALUE: u32 = (1 << MAX_USABLE_BITS) - 1;

/// Number of bits needed to hold `value` (0 for 0)
fn value_bits(value: u32) -> u32 {
    u32::BITS - value.leading_zeros()
}

/// Bits [`write`] emits for `value` (assuming it fits)
pub fn encoded_bits(value: u32) -> usize {
    LENGTH_BITS + value_bits(value).min(MAX_USABLE_BITS) as usize
}

/// Read a VarBit
pub fn read(reader: &mut BitReader<'_>) -> Result<u32, SerialError> {
    let raw = reader
        .read_bits(LENGTH_BITS)
        .map_err(|_| SerialError::TruncatedVarBit)?;
    let length = MIRROR_5[raw as usize];

    let mut value = 0u32;
    for i in 0..length {
        let bit = reader.read_bit().map_err(|_| SerialError::TruncatedVarBit)?;
        value |= u32::from(bit) << i;
    }

    Ok(value)
}

/// Write a VarBit sized to the significant bits of `value`
pub fn write(writer: &mut BitWriter, value: u32) -> Result<(), SerialError> {
    if value > MAX_VALUE {
        return Err(SerialError::ValueOutOfRange {
            value,
            max: MAX_VALUE,
        });
    }

    let length = value_bits(value);
    writer.write_n(u32::from(MIRROR_5[length as usize]), LENGTH_BITS);
    for i in 0..length {
        writer.write_bit(((value >> i) & 1) as u8);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_of(value: u32) -> String {
        let mut writer = BitWriter::new();
        write(&mut writer, value).unwrap();
        let len = writer.position();
        let bytes = writer.finish();
        BitReader::new(&bytes).to_bit_string()[..len].to_string()
    }

    #[test]
    fn test_varbit_roundtrip() {
        for value in [0u32, 1, 7, 8, 31, 32, 127, 269, 1000, 100_000, MAX_VALUE] {
            let mut writer = BitWriter::new();
            write(&mut writer, value).unwrap();
            let bytes = writer.finish();

            let mut reader = BitReader::new(&bytes);
            let read_value = read(&mut reader).unwrap();
            assert_eq!(read_value, value, "VarBit roundtrip failed for {}", value);
        }
    }

    #[test]
    fn test_varbit_wire_bits() {
        assert_eq!(bits_of(0), "00000");
        assert_eq!(bits_of(1), "100001");
        assert_eq!(bits_of(5), "11000101");
        assert_eq!(bits_of(269), "10010101100001");
        assert_eq!(bits_of(100_000), "1000100000101011000011");
    }

    #[test]
    fn test_zero_length_is_zero() {
        // Length 0 followed by ones: the ones are not part of the value
        let bytes = [0b0000_0111];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(read(&mut reader).unwrap(), 0);
        assert_eq!(reader.position(), 5);
    }

    #[test]
    fn test_encoded_bits_matches_writer() {
        for value in [0u32, 1, 2, 255, 256, 65535, 65536, MAX_VALUE] {
            let mut writer = BitWriter::new();
            write(&mut writer, value).unwrap();
            assert_eq!(encoded_bits(value), writer.position(), "value {}", value);
        }
    }

    #[test]
    fn test_varbit_too_large() {
        let mut writer = BitWriter::new();
        assert!(matches!(
            write(&mut writer, 1 << 31),
            Err(SerialError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_truncated_varbit() {
        // Length 8 announced, only 3 bits follow
        let bytes = [0b0001_0101];
        let mut reader = BitReader::new(&bytes);
        assert!(matches!(read(&mut reader), Err(SerialError::TruncatedVarBit)));
    }
}

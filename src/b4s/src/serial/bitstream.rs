//! Bitstream reader and writer for variable-length token parsing.

use super::SerialError;

/// Largest field [`BitReader::read_bits`] and [`BitWriter::write_n`] handle at once
pub const MAX_FIELD_BITS: usize = 32;

/// MSB-first bit cursor over a borrowed byte buffer
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    bit_offset: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            bit_offset: 0,
        }
    }

    /// Total number of bits in the buffer
    pub fn len_bits(&self) -> usize {
        self.bytes.len() * 8
    }

    /// Returns the number of bits remaining in the stream
    pub fn remaining_bits(&self) -> usize {
        self.len_bits().saturating_sub(self.bit_offset)
    }

    /// Current absolute bit offset
    pub fn position(&self) -> usize {
        self.bit_offset
    }

    /// Move the cursor to an absolute bit offset (end of buffer allowed)
    pub fn set_position(&mut self, position: usize) -> Result<(), SerialError> {
        if position > self.len_bits() {
            return Err(SerialError::PositionOutOfRange {
                position,
                len: self.len_bits(),
            });
        }
        self.bit_offset = position;
        Ok(())
    }

    /// Move the cursor back by `count` bits
    pub fn rewind(&mut self, count: usize) -> Result<(), SerialError> {
        if count > self.bit_offset {
            return Err(SerialError::RewindPastStart {
                requested: count,
                position: self.bit_offset,
            });
        }
        self.bit_offset -= count;
        Ok(())
    }

    /// Read a single bit
    pub fn read_bit(&mut self) -> Result<u8, SerialError> {
        if self.bit_offset >= self.len_bits() {
            return Err(SerialError::EndOfStream);
        }

        let byte_idx = self.bit_offset / 8;
        let bit_idx = 7 - (self.bit_offset % 8); // Read from MSB (bit 7) down to LSB (bit 0)
        self.bit_offset += 1;

        Ok((self.bytes[byte_idx] >> bit_idx) & 1)
    }

    /// Read N bits as a u32 value (MSB-first)
    ///
    /// Bits are assembled with the first bit read as the most significant. If
    /// fewer than `count` bits remain the cursor does not move.
    pub fn read_bits(&mut self, count: usize) -> Result<u32, SerialError> {
        if count == 0 || count > MAX_FIELD_BITS {
            return Err(SerialError::InvalidBitCount(count));
        }
        if count > self.remaining_bits() {
            return Err(SerialError::EndOfStream);
        }

        let mut result = 0u32;
        for _ in 0..count {
            result = (result << 1) | u32::from(self.read_bit()?);
        }

        Ok(result)
    }

    /// Render the whole buffer as '0'/'1' characters
    pub fn to_bit_string(&self) -> String {
        let mut out = String::with_capacity(self.len_bits());
        for byte in self.bytes {
            for bit_idx in (0..8).rev() {
                out.push(if (byte >> bit_idx) & 1 == 1 { '1' } else { '0' });
            }
        }
        out
    }
}

/// Bitstream writer for encoding variable-length tokens
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_offset: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bits written so far
    pub fn position(&self) -> usize {
        self.bit_offset
    }

    /// Append one bit; only the lowest bit of `bit` is used
    pub fn write_bit(&mut self, bit: u8) {
        let byte_idx = self.bit_offset / 8;
        let bit_idx = 7 - (self.bit_offset % 8); // Write from MSB (bit 7) down to LSB (bit 0)

        // Extend bytes vector if needed
        if byte_idx >= self.bytes.len() {
            self.bytes.push(0);
        }

        if bit & 1 == 1 {
            self.bytes[byte_idx] |= 1 << bit_idx;
        }
        self.bit_offset += 1;
    }

    /// Append a literal bit pattern
    pub fn write_bits(&mut self, bits: &[u8]) {
        for &bit in bits {
            self.write_bit(bit);
        }
    }

    /// Write the low `count` bits of `value` (MSB-first)
    pub fn write_n(&mut self, value: u32, count: usize) {
        debug_assert!(count <= MAX_FIELD_BITS);
        for i in (0..count).rev() {
            self.write_bit(((value >> i) & 1) as u8);
        }
    }

    /// Get the final bytes (padded to byte boundary)
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_roundtrip() {
        let mut writer = BitWriter::new();
        writer.write_n(0b1010, 4);
        writer.write_n(0b11111111, 8);
        writer.write_n(0b101, 3);
        assert_eq!(writer.position(), 15);
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read_bits(4).unwrap(), 0b1010);
        assert_eq!(reader.read_bits(8).unwrap(), 0b11111111);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.remaining_bits(), 1);
    }

    #[test]
    fn test_writer_grows_lazily() {
        let mut writer = BitWriter::new();
        writer.write_bits(&[0, 0, 1, 0, 0, 0, 0]);
        assert_eq!(writer.clone().finish(), vec![0x20]);
        writer.write_bits(&[1, 1]);
        assert_eq!(writer.finish(), vec![0x21, 0x80]);
    }

    #[test]
    fn test_read_past_end() {
        let bytes = [0xA5];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read_bits(6).unwrap(), 0b101001);

        // Short read must not consume the remaining bits
        assert!(matches!(reader.read_bits(3), Err(SerialError::EndOfStream)));
        assert_eq!(reader.position(), 6);

        assert_eq!(reader.read_bit().unwrap(), 0);
        assert_eq!(reader.read_bit().unwrap(), 1);
        assert!(matches!(reader.read_bit(), Err(SerialError::EndOfStream)));
    }

    #[test]
    fn test_invalid_bit_count() {
        let bytes = [0u8; 8];
        let mut reader = BitReader::new(&bytes);
        assert!(matches!(
            reader.read_bits(0),
            Err(SerialError::InvalidBitCount(0))
        ));
        assert!(matches!(
            reader.read_bits(33),
            Err(SerialError::InvalidBitCount(33))
        ));
        assert_eq!(reader.read_bits(32).unwrap(), 0);
    }

    #[test]
    fn test_rewind_and_seek() {
        let bytes = [0xF0, 0x0F];
        let mut reader = BitReader::new(&bytes);
        reader.read_bits(5).unwrap();

        assert!(reader.rewind(6).is_err());
        reader.rewind(2).unwrap();
        assert_eq!(reader.position(), 3);

        reader.set_position(16).unwrap();
        assert_eq!(reader.remaining_bits(), 0);
        assert!(matches!(
            reader.set_position(17),
            Err(SerialError::PositionOutOfRange { position: 17, len: 16 })
        ));
    }

    #[test]
    fn test_bit_string() {
        let bytes = [0x21, 0x80];
        let reader = BitReader::new(&bytes);
        assert_eq!(reader.to_bit_string(), "0010000110000000");
    }
}

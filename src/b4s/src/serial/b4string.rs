//! String payloads: VarInt length followed by 7-bit characters.

use super::bitstream::{BitReader, BitWriter};
use super::mirror::MIRROR_7;
use super::{varint, SerialError};

const CHAR_BITS: usize = 7;

/// Read a length-prefixed string
pub fn read(reader: &mut BitReader<'_>) -> Result<String, SerialError> {
    let length = varint::read(reader).map_err(|_| SerialError::TruncatedString)?;

    let mut bytes = Vec::with_capacity(length as usize);
    for _ in 0..length {
        let raw = reader
            .read_bits(CHAR_BITS)
            .map_err(|_| SerialError::TruncatedString)?;
        bytes.push(MIRROR_7[raw as usize]);
    }

    String::from_utf8(bytes).map_err(|_| SerialError::InvalidUtf8)
}

/// Write a string; only ASCII text up to the VarInt length limit is encodable
pub fn write(writer: &mut BitWriter, text: &str) -> Result<(), SerialError> {
    if !text.is_ascii() {
        return Err(SerialError::UnencodableString(format!(
            "non-ASCII text {:?}",
            text
        )));
    }
    let length = u32::try_from(text.len())
        .ok()
        .filter(|&len| len <= varint::MAX_VALUE)
        .ok_or_else(|| {
            SerialError::UnencodableString(format!("{} bytes is too long", text.len()))
        })?;

    varint::write(writer, length)?;
    for byte in text.bytes() {
        writer.write_n(u32::from(MIRROR_7[byte as usize]), CHAR_BITS);
    }

    Ok(())
}

/// Bits [`write`] emits for `text`
pub fn encoded_bits(text: &str) -> usize {
    varint::encoded_bits(text.len() as u32) + text.len() * CHAR_BITS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_roundtrip() {
        for text in ["", "A", "hi \"x\"", "Hello, World!", "~{}|\\"] {
            let mut writer = BitWriter::new();
            write(&mut writer, text).unwrap();
            assert_eq!(writer.position(), encoded_bits(text));
            let bytes = writer.finish();

            let mut reader = BitReader::new(&bytes);
            assert_eq!(read(&mut reader).unwrap(), text);
        }
    }

    #[test]
    fn test_wire_layout() {
        // Length 1, then 'A' (0x41) LSB-first: 1000001
        let mut writer = BitWriter::new();
        write(&mut writer, "A").unwrap();
        let len = writer.position();
        let bytes = writer.finish();
        let bits = BitReader::new(&bytes).to_bit_string();
        assert_eq!(&bits[..len], "100001000001");
    }

    #[test]
    fn test_truncated_string() {
        // Announce 3 characters, provide one
        let mut writer = BitWriter::new();
        varint::write(&mut writer, 3).unwrap();
        writer.write_n(0x41, 7);
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        assert!(matches!(read(&mut reader), Err(SerialError::TruncatedString)));
    }

    #[test]
    fn test_non_ascii_rejected() {
        let mut writer = BitWriter::new();
        assert!(matches!(
            write(&mut writer, "caf\u{e9}"),
            Err(SerialError::UnencodableString(_))
        ));
        assert_eq!(writer.position(), 0);
    }

    #[test]
    fn test_too_long_rejected() {
        let text = "a".repeat(70_000);
        let mut writer = BitWriter::new();
        assert!(matches!(
            write(&mut writer, &text),
            Err(SerialError::UnencodableString(_))
        ));
    }
}

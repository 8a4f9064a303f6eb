//! Base85 encoding/decoding with the serial alphabet.
//!
//! Every byte is bit-mirrored on its way in and out, so the decoded buffer
//! is directly readable by the MSB-first bitstream.

use super::mirror::mirror_byte;
use super::SerialError;

/// Base85 alphabet used by item serials
pub const SERIAL_BASE85_ALPHABET: &[u8; 85] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!#$%&()*+-;<=>?@^_`{/}~";

/// Tag every serial string starts with
pub const SERIAL_PREFIX: &str = "@U";

/// Digit value used to fill a short final group (`~`)
const PAD_VALUE: u64 = 84;

const GROUP_CHARS: usize = 5;
const GROUP_BYTES: usize = 4;

const fn build_lookup() -> [u8; 256] {
    let mut lookup = [u8::MAX; 256];
    let mut i = 0;
    while i < SERIAL_BASE85_ALPHABET.len() {
        lookup[SERIAL_BASE85_ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    lookup
}

static LOOKUP: [u8; 256] = build_lookup();

/// Decode a `@U` serial into mirrored bytes
///
/// Input is read in windows of five character positions. Characters outside
/// the alphabet (shells tend to insert `\` before `!`) are skipped but still
/// occupy their position, so the window yields a short group. A window with
/// no valid characters ends the decode.
pub fn decode_base85(input: &str) -> Result<Vec<u8>, SerialError> {
    let body = input
        .strip_prefix(SERIAL_PREFIX)
        .ok_or(SerialError::NotAValidSerial)?;

    let digits: Vec<Option<u64>> = body.chars().map(digit_value).collect();

    let mut result = Vec::with_capacity(digits.len() / GROUP_CHARS * GROUP_BYTES + GROUP_BYTES);
    for window in digits.chunks(GROUP_CHARS) {
        let mut count = 0;
        let mut value = 0u64;
        for digit in window.iter().flatten() {
            value = value * 85 + digit;
            count += 1;
        }
        if count == 0 {
            break;
        }
        for _ in count..GROUP_CHARS {
            value = value * 85 + PAD_VALUE;
        }

        // A short group of n characters carries n - 1 bytes
        let num_bytes = if count == GROUP_CHARS {
            GROUP_BYTES
        } else {
            count - 1
        };
        for i in 0..num_bytes {
            let shift = 24 - 8 * i;
            result.push(mirror_byte((value >> shift) as u8));
        }
    }

    Ok(result)
}

fn digit_value(ch: char) -> Option<u64> {
    if !ch.is_ascii() {
        return None;
    }
    match LOOKUP[ch as usize] {
        u8::MAX => None,
        digit => Some(u64::from(digit)),
    }
}

/// Encode bytes as a `@U` serial, mirroring each byte first
pub fn encode_base85(bytes: &[u8]) -> String {
    let mut result = String::with_capacity(
        SERIAL_PREFIX.len() + bytes.len().div_ceil(GROUP_BYTES) * GROUP_CHARS,
    );
    result.push_str(SERIAL_PREFIX);

    // Process in chunks of 4 bytes -> 5 characters
    for chunk in bytes.chunks(GROUP_BYTES) {
        let mut value: u64 = 0;
        for &byte in chunk {
            value = (value << 8) | u64::from(mirror_byte(byte));
        }
        // Pad partial chunks with zeros (shift left to fill 4 bytes)
        value <<= (GROUP_BYTES - chunk.len()) * 8;

        let mut chars = [0u8; GROUP_CHARS];
        for slot in chars.iter_mut().rev() {
            *slot = SERIAL_BASE85_ALPHABET[(value % 85) as usize];
            value /= 85;
        }

        // Take first N+1 chars for partial chunks
        let num_chars = if chunk.len() == GROUP_BYTES {
            GROUP_CHARS
        } else {
            chunk.len() + 1
        };
        result.extend(chars[..num_chars].iter().map(|&ch| ch as char));
    }

    result
}

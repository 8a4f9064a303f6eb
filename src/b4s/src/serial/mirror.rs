//! Bit-reversal tables for the fixed-width fields of the serial bitstream.
//!
//! The wire format stores numeric fields least-significant bit first, while
//! [`BitReader`](super::bitstream::BitReader) reads most-significant bit first.
//! `MIRROR_N[i]` is the N-bit reversal of `i`, so reading N bits and looking
//! the result up yields the stored value (and vice versa when writing).

/// Build the reversal table for `bits`-wide values.
const fn mirror_table<const N: usize>(bits: u32) -> [u8; N] {
    let mut table = [0u8; N];
    let mut i = 0;
    while i < N {
        table[i] = (i as u8).reverse_bits() >> (8 - bits);
        i += 1;
    }
    table
}

/// 4-bit reversal, used for VarInt nibbles
pub const MIRROR_4: [u8; 16] = mirror_table::<16>(4);

/// 5-bit reversal, used for the VarBit length field
pub const MIRROR_5: [u8; 32] = mirror_table::<32>(5);

/// 7-bit reversal, used for string characters
pub const MIRROR_7: [u8; 128] = mirror_table::<128>(7);

/// 8-bit reversal, applied to every byte leaving or entering Base85
pub const MIRROR_8: [u8; 256] = mirror_table::<256>(8);

/// Mirror bits in a byte (reverse bit order)
/// Example: 0b10000111 -> 0b11100001
#[inline]
pub fn mirror_byte(byte: u8) -> u8 {
    MIRROR_8[byte as usize]
}

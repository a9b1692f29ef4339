//! Pure byte-level codec primitives shared by the dispatcher and the
//! outbound encoders. No side effects beyond the returned value.

use byteorder::{ByteOrder, LittleEndian};

pub fn decode_u16_le(b0: u8, b1: u8) -> u16 {
    LittleEndian::read_u16(&[b0, b1])
}

pub fn decode_i16_le(b0: u8, b1: u8) -> i16 {
    LittleEndian::read_i16(&[b0, b1])
}

pub fn decode_i32_le(b0: u8, b1: u8, b2: u8, b3: u8) -> i32 {
    LittleEndian::read_i32(&[b0, b1, b2, b3])
}

pub fn decode_u32_le(b0: u8, b1: u8, b2: u8, b3: u8) -> u32 {
    LittleEndian::read_u32(&[b0, b1, b2, b3])
}

pub fn encode_u16_le(value: u16) -> [u8; 2] {
    let mut buf = [0u8; 2];
    LittleEndian::write_u16(&mut buf, value);
    buf
}

pub fn encode_i32_le(value: i32) -> [u8; 4] {
    let mut buf = [0u8; 4];
    LittleEndian::write_i32(&mut buf, value);
    buf
}

/// Encodes a rotational speed as unsigned 32-bit fixed point (value x 100,
/// truncated toward zero), little endian.
///
/// Negative and non-finite inputs encode as all zeroes. A sensor glitch must
/// never reach the bus as a huge unsigned value through two's-complement
/// wraparound, so the floor is part of the contract rather than an error.
pub fn encode_fixed_point_speed(value: f32) -> [u8; 4] {
    if !value.is_finite() || value <= 0.0 {
        return [0u8; 4];
    }
    // `as` saturates at u32::MAX and truncates toward zero.
    let fixed = (value * 100.0) as u32;
    let mut buf = [0u8; 4];
    LittleEndian::write_u32(&mut buf, fixed);
    buf
}

/// Byte-wise equality over a declared prefix. Multi-byte acknowledgement
/// patterns are only accepted when every byte matches; a single flag byte out
/// of a partially-updated frame must not pass for a confirmation.
pub fn match_sequence(payload: &[u8], expected: &[u8]) -> bool {
    payload.len() >= expected.len() && payload[..expected.len()] == *expected
}

/// Linear range mapping, saturating at the input edges. Used in both
/// directions between percent setpoints and raw controller units.
pub fn map_range(value: i32, in_lo: i32, in_hi: i32, out_lo: i32, out_hi: i32) -> i32 {
    if in_lo == in_hi {
        return out_lo;
    }
    let clamped = value.clamp(in_lo, in_hi);
    let scaled =
        (clamped - in_lo) as i64 * (out_hi - out_lo) as i64 / (in_hi - in_lo) as i64;
    (scaled + out_lo as i64) as i32
}

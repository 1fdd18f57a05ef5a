//! Protocol encoding/decoding traits and fixed-layout field helpers.
//!
//! Every classic packet is a one-byte tag followed by fixed-width, big-endian
//! fields. Strings are always 64 bytes, padded with ASCII spaces.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::warn;

use crate::error::ProtoError;
use crate::types::Location;

/// Width of every string field on the wire.
pub const STRING_LENGTH: usize = 64;

/// Encode a value onto a buffer.
pub trait ProtoEncode {
    fn proto_encode(&self, buf: &mut impl BufMut);
}

/// Decode a value from a buffer.
pub trait ProtoDecode: Sized {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError>;
}

/// A packet with a fixed message-type tag.
pub trait Packet: ProtoEncode {
    const ID: u8;
}

/// Encode a packet into a standalone frame: tag byte followed by its fields.
pub fn encode_packet<P: Packet>(packet: &P) -> Bytes {
    let mut buf = BytesMut::with_capacity(64);
    buf.put_u8(P::ID);
    packet.proto_encode(&mut buf);
    buf.freeze()
}

/// Fail with `BufferTooShort` unless `needed` bytes are left.
pub fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), ProtoError> {
    if buf.remaining() < needed {
        return Err(ProtoError::BufferTooShort {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// Whether `s` fits a string field without truncation.
pub fn fits_string(s: &str) -> bool {
    s.len() <= STRING_LENGTH
}

/// Write a 64-byte space-padded string.
///
/// Longer strings are cut at the last UTF-8 boundary that fits and a warning
/// is logged; callers that accept user input check [`fits_string`] first.
pub fn write_string(buf: &mut impl BufMut, s: &str) {
    let mut end = s.len();
    if end > STRING_LENGTH {
        end = STRING_LENGTH;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        warn!(
            "String field truncated from {} to {end} bytes: {:?}",
            s.len(),
            &s[..end]
        );
    }
    buf.put_slice(&s.as_bytes()[..end]);
    buf.put_bytes(b' ', STRING_LENGTH - end);
}

/// Read a 64-byte string field and trim the trailing padding.
pub fn read_string(buf: &mut impl Buf) -> Result<String, ProtoError> {
    ensure_remaining(buf, STRING_LENGTH)?;
    let mut raw = [0u8; STRING_LENGTH];
    buf.copy_to_slice(&mut raw);
    let text = String::from_utf8_lossy(&raw);
    Ok(text.trim_end_matches(' ').to_string())
}

/// World units to 1/32 fixed point, truncated toward zero.
///
/// The result is wrapped to the field width by the caller's cast.
pub fn to_fixed(value: f32) -> i64 {
    (value * 32.0) as i64
}

/// 1/32 fixed point back to world units.
pub fn from_fixed(value: i32) -> f32 {
    value as f32 / 32.0
}

/// Degrees to the one-byte angle encoding: `deg * 256 / 360`, truncated, wrapped.
pub fn angle_to_byte(degrees: f32) -> u8 {
    (degrees * 256.0 / 360.0) as i64 as u8
}

/// One-byte angle back to degrees.
pub fn byte_to_angle(value: u8) -> f32 {
    value as f32 * 360.0 / 256.0
}

/// Movement delta between two coordinates as a wrapped signed byte.
pub fn delta_to_byte(current: f32, last: f32) -> u8 {
    to_fixed(current - last) as u8
}

/// Write X, Y, Z as 16-bit (classic) or 32-bit (ExtEntityPositions) fixed point.
pub fn write_position(buf: &mut impl BufMut, location: &Location, extended: bool) {
    if extended {
        buf.put_i32(to_fixed(location.x) as i32);
        buf.put_i32(to_fixed(location.y) as i32);
        buf.put_i32(to_fixed(location.z) as i32);
    } else {
        buf.put_i16(to_fixed(location.x) as i16);
        buf.put_i16(to_fixed(location.y) as i16);
        buf.put_i16(to_fixed(location.z) as i16);
    }
}

/// Write yaw and pitch as one byte each.
pub fn write_orientation(buf: &mut impl BufMut, location: &Location) {
    buf.put_u8(angle_to_byte(location.yaw));
    buf.put_u8(angle_to_byte(location.pitch));
}

/// Read X, Y, Z, yaw, pitch in the classic or extended layout.
pub fn read_location(buf: &mut impl Buf, extended: bool) -> Result<Location, ProtoError> {
    let (x, y, z) = if extended {
        ensure_remaining(buf, 14)?;
        (buf.get_i32(), buf.get_i32(), buf.get_i32())
    } else {
        ensure_remaining(buf, 8)?;
        (
            buf.get_i16() as i32,
            buf.get_i16() as i32,
            buf.get_i16() as i32,
        )
    };
    let yaw = byte_to_angle(buf.get_u8());
    let pitch = byte_to_angle(buf.get_u8());
    Ok(Location {
        x: from_fixed(x),
        y: from_fixed(y),
        z: from_fixed(z),
        yaw,
        pitch,
    })
}

/// Size in bytes of an encoded position triple.
pub const fn position_size(extended: bool) -> usize {
    if extended {
        12
    } else {
        6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_padded_with_spaces() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "Hello");
        assert_eq!(buf.len(), STRING_LENGTH);
        assert_eq!(&buf[..5], b"Hello");
        assert!(buf[5..].iter().all(|&b| b == b' '));
        assert_eq!(read_string(&mut buf.freeze()).unwrap(), "Hello");
    }

    #[test]
    fn string_keeps_leading_spaces() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "  indented");
        assert_eq!(read_string(&mut buf.freeze()).unwrap(), "  indented");
    }

    #[test]
    fn string_truncated_at_field_width() {
        let long = "x".repeat(100);
        let mut buf = BytesMut::new();
        write_string(&mut buf, &long);
        assert_eq!(buf.len(), STRING_LENGTH);
        assert_eq!(read_string(&mut buf.freeze()).unwrap(), "x".repeat(64));
        assert!(!fits_string(&long));
        assert!(fits_string(&"x".repeat(64)));
    }

    #[test]
    fn string_truncation_respects_char_boundary() {
        // 63 ASCII bytes followed by a 2-byte character that would straddle the limit.
        let s = format!("{}é", "a".repeat(63));
        let mut buf = BytesMut::new();
        write_string(&mut buf, &s);
        assert_eq!(buf.len(), STRING_LENGTH);
        assert_eq!(buf[63], b' ');
    }

    #[test]
    fn string_buffer_too_short() {
        let mut buf = Bytes::from_static(&[b'a'; 10]);
        assert!(matches!(
            read_string(&mut buf),
            Err(ProtoError::BufferTooShort { needed: 64, .. })
        ));
    }

    #[test]
    fn angle_truncates_instead_of_rounding() {
        assert_eq!(angle_to_byte(180.0), 128);
        assert_eq!(angle_to_byte(359.9), 255);
        assert_eq!(angle_to_byte(0.0), 0);
        assert_eq!(angle_to_byte(90.0), 64);
        // 1.40625 degrees is exactly one unit; just below it truncates to zero.
        assert_eq!(angle_to_byte(1.4), 0);
    }

    #[test]
    fn angle_wraps_around() {
        assert_eq!(angle_to_byte(360.0), 0);
        assert_eq!(angle_to_byte(450.0), 64);
        assert_eq!(angle_to_byte(-90.0), 192);
    }

    #[test]
    fn fixed_point_wraps_twos_complement() {
        let mut buf = BytesMut::new();
        // 1024 * 32 = 32768, one past i16::MAX.
        write_position(&mut buf, &Location::new(1024.0, -1.0, 0.5), false);
        assert_eq!(&buf[..], &[0x80, 0x00, 0xFF, 0xE0, 0x00, 0x10]);
    }

    #[test]
    fn extended_position_uses_32_bits() {
        let mut buf = BytesMut::new();
        write_position(&mut buf, &Location::new(1024.0, 1.0, -2.0), true);
        assert_eq!(buf.len(), 12);
        assert_eq!(&buf[..4], &32768i32.to_be_bytes());
        assert_eq!(&buf[4..8], &32i32.to_be_bytes());
        assert_eq!(&buf[8..], &(-64i32).to_be_bytes());
    }

    #[test]
    fn delta_is_signed_byte() {
        assert_eq!(delta_to_byte(10.5, 10.0), 16);
        assert_eq!(delta_to_byte(10.0, 10.5), 0xF0);
        assert_eq!(delta_to_byte(5.0, 5.0), 0);
    }

    #[test]
    fn read_location_classic() {
        let mut buf = BytesMut::new();
        let loc = Location {
            x: 16.5,
            y: 33.0,
            z: 2.0,
            yaw: 90.0,
            pitch: 180.0,
        };
        write_position(&mut buf, &loc, false);
        write_orientation(&mut buf, &loc);
        let decoded = read_location(&mut buf.freeze(), false).unwrap();
        assert_eq!(decoded, loc);
    }

    #[test]
    fn read_location_too_short() {
        let mut buf = Bytes::from_static(&[0u8; 7]);
        assert!(read_location(&mut buf, false).is_err());
    }
}

//! Relative movement packets (0x09, 0x0A, 0x0B) — Server → Client.
//!
//! Deltas are `(current - last) * 32` wrapped to a signed byte, so a move of
//! four or more world units on any axis must be sent as a Teleport instead.

use bytes::BufMut;

use crate::codec::{self, Packet, ProtoEncode};
use crate::packets::id;
use crate::types::Location;

/// Position delta plus absolute orientation.
#[derive(Debug, Clone, Copy)]
pub struct PositionOrientationUpdate {
    pub entity_id: u8,
    pub location: Location,
    pub last_location: Location,
}

impl ProtoEncode for PositionOrientationUpdate {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.entity_id);
        write_deltas(buf, &self.location, &self.last_location);
        codec::write_orientation(buf, &self.location);
    }
}

impl Packet for PositionOrientationUpdate {
    const ID: u8 = id::POSITION_ORIENTATION_UPDATE;
}

/// Position delta only.
#[derive(Debug, Clone, Copy)]
pub struct PositionUpdate {
    pub entity_id: u8,
    pub location: Location,
    pub last_location: Location,
}

impl ProtoEncode for PositionUpdate {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.entity_id);
        write_deltas(buf, &self.location, &self.last_location);
    }
}

impl Packet for PositionUpdate {
    const ID: u8 = id::POSITION_UPDATE;
}

/// Absolute orientation only.
#[derive(Debug, Clone, Copy)]
pub struct OrientationUpdate {
    pub entity_id: u8,
    pub location: Location,
}

impl ProtoEncode for OrientationUpdate {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.entity_id);
        codec::write_orientation(buf, &self.location);
    }
}

impl Packet for OrientationUpdate {
    const ID: u8 = id::ORIENTATION_UPDATE;
}

fn write_deltas(buf: &mut impl BufMut, current: &Location, last: &Location) {
    buf.put_u8(codec::delta_to_byte(current.x, last.x));
    buf.put_u8(codec::delta_to_byte(current.y, last.y));
    buf.put_u8(codec::delta_to_byte(current.z, last.z));
}

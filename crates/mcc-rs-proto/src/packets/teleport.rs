//! Teleport (0x08) — both directions.
//!
//! The server sends absolute entity positions; the client reports its own
//! position every tick with the same layout, where the ID byte holds the
//! held block when HeldBlock is negotiated.

use bytes::{Buf, BufMut};

use crate::codec::{self, ensure_remaining, Packet, ProtoEncode};
use crate::error::ProtoError;
use crate::packets::id;
use crate::types::{EntityRef, Location};

/// Server → Client absolute position.
#[derive(Debug, Clone, Copy)]
pub struct Teleport {
    pub entity: EntityRef,
    pub location: Location,
    pub extended_positions: bool,
}

impl ProtoEncode for Teleport {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.entity.wire_id());
        codec::write_position(buf, &self.location, self.extended_positions);
        codec::write_orientation(buf, &self.location);
    }
}

impl Packet for Teleport {
    const ID: u8 = id::TELEPORT;
}

/// Client → Server position report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientPosition {
    /// Always 0xFF for vanilla clients; the held block with HeldBlock.
    pub player_id: u8,
    pub location: Location,
}

impl ClientPosition {
    /// Decode the body; the layout depends on the ExtEntityPositions flag.
    pub fn decode(buf: &mut impl Buf, extended: bool) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 1)?;
        let player_id = buf.get_u8();
        let location = codec::read_location(buf, extended)?;
        Ok(Self {
            player_id,
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_packet;
    use bytes::BytesMut;

    #[test]
    fn teleport_classic_and_extended() {
        let mut pkt = Teleport {
            entity: EntityRef::own(5),
            location: Location::new(1.0, 2.0, 3.0),
            extended_positions: false,
        };
        let classic = encode_packet(&pkt);
        assert_eq!(classic.len(), 10);
        assert_eq!(&classic[..8], &[0x08, 0xFF, 0, 32, 0, 64, 0, 96]);

        pkt.extended_positions = true;
        let extended = encode_packet(&pkt);
        assert_eq!(extended.len(), 16);
        assert_eq!(&extended[2..6], &32i32.to_be_bytes());
    }

    #[test]
    fn decode_client_position() {
        let loc = Location::new(4.0, 5.5, -1.0).with_orientation(90.0, 45.0);
        for extended in [false, true] {
            let mut buf = BytesMut::new();
            buf.put_u8(7);
            codec::write_position(&mut buf, &loc, extended);
            codec::write_orientation(&mut buf, &loc);
            let decoded = ClientPosition::decode(&mut buf.freeze(), extended).unwrap();
            assert_eq!(decoded.player_id, 7);
            assert_eq!(decoded.location, loc);
        }
    }
}

//! TwoWayPing (0x2B) — both directions.
//!
//! Direction 0 is a client-initiated ping that the server echoes unchanged;
//! direction 1 is a server-initiated ping that the client echoes.

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, Packet, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::packets::id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingDirection {
    ClientToServer,
    ServerToClient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwoWayPing {
    pub direction: PingDirection,
    pub data: i16,
}

impl ProtoEncode for TwoWayPing {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(match self.direction {
            PingDirection::ClientToServer => 0,
            PingDirection::ServerToClient => 1,
        });
        buf.put_i16(self.data);
    }
}

impl ProtoDecode for TwoWayPing {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 3)?;
        let direction = match buf.get_u8() {
            0 => PingDirection::ClientToServer,
            _ => PingDirection::ServerToClient,
        };
        let data = buf.get_i16();
        Ok(Self { direction, data })
    }
}

impl Packet for TwoWayPing {
    const ID: u8 = id::TWO_WAY_PING;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_packet;

    #[test]
    fn echo_keeps_payload() {
        let mut body: &[u8] = &[0, 0x12, 0x34];
        let ping = TwoWayPing::proto_decode(&mut body).unwrap();
        assert_eq!(ping.direction, PingDirection::ClientToServer);
        assert_eq!(ping.data, 0x1234);
        assert_eq!(&encode_packet(&ping)[..], &[0x2B, 0, 0x12, 0x34]);
    }
}

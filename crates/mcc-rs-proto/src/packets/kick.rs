//! Kick (0x0E) — Server → Client.

use bytes::BufMut;

use crate::codec::{self, Packet, ProtoEncode};
use crate::packets::id;

/// Disconnects the client with a reason shown on its screen.
#[derive(Debug, Clone)]
pub struct Kick {
    pub reason: String,
}

impl Kick {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ProtoEncode for Kick {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        codec::write_string(buf, &self.reason);
    }
}

impl Packet for Kick {
    const ID: u8 = id::KICK;
}

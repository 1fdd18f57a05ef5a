//! Ping (0x01) — Server → Client.
//!
//! Empty keep-alive; the client never answers it.

use bytes::BufMut;

use crate::codec::{Packet, ProtoEncode};
use crate::packets::id;

#[derive(Debug, Clone, Copy, Default)]
pub struct Ping;

impl ProtoEncode for Ping {
    fn proto_encode(&self, _buf: &mut impl BufMut) {}
}

impl Packet for Ping {
    const ID: u8 = id::PING;
}

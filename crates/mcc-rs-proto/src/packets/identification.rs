//! Identification (0x00) — both directions.
//!
//! The client opens the connection with its name and verification key; the
//! server answers with its name, MOTD and the player's user type.

use bytes::{Buf, BufMut};

use crate::codec::{self, ensure_remaining, Packet, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::extensions::CPE_MAGIC;
use crate::packets::{id, PROTOCOL_VERSION};

/// User type byte for operators.
pub const USER_TYPE_OP: u8 = 0x64;

/// User type byte for regular players.
pub const USER_TYPE_NORMAL: u8 = 0x00;

/// Server → Client identification.
#[derive(Debug, Clone)]
pub struct ServerIdentification {
    pub server_name: String,
    pub motd: String,
    pub operator: bool,
}

impl ProtoEncode for ServerIdentification {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(PROTOCOL_VERSION);
        codec::write_string(buf, &self.server_name);
        codec::write_string(buf, &self.motd);
        buf.put_u8(if self.operator {
            USER_TYPE_OP
        } else {
            USER_TYPE_NORMAL
        });
    }
}

impl Packet for ServerIdentification {
    const ID: u8 = id::IDENTIFICATION;
}

/// Client → Server identification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentification {
    pub protocol_version: u8,
    pub username: String,
    pub verification_key: String,
    /// Set when the trailing byte is the CPE magic value.
    pub supports_cpe: bool,
}

impl ProtoDecode for ClientIdentification {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 1 + 64 + 64 + 1)?;
        let protocol_version = buf.get_u8();
        let username = codec::read_string(buf)?;
        let verification_key = codec::read_string(buf)?;
        let supports_cpe = buf.get_u8() == CPE_MAGIC;
        Ok(Self {
            protocol_version,
            username,
            verification_key,
            supports_cpe,
        })
    }
}

impl ProtoEncode for ClientIdentification {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.protocol_version);
        codec::write_string(buf, &self.username);
        codec::write_string(buf, &self.verification_key);
        buf.put_u8(if self.supports_cpe { CPE_MAGIC } else { 0 });
    }
}

impl Packet for ClientIdentification {
    const ID: u8 = id::IDENTIFICATION;
}

//! ExtInfo (0x10) and ExtEntry (0x11) — both directions.
//!
//! The CPE handshake: each side sends ExtInfo with its application name and
//! extension count, followed by that many ExtEntry packets.

use bytes::{Buf, BufMut};

use crate::codec::{self, ensure_remaining, Packet, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::packets::id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtInfo {
    pub app_name: String,
    pub extension_count: i16,
}

impl ProtoEncode for ExtInfo {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        codec::write_string(buf, &self.app_name);
        buf.put_i16(self.extension_count);
    }
}

impl ProtoDecode for ExtInfo {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, codec::STRING_LENGTH + 2)?;
        let app_name = codec::read_string(buf)?;
        let extension_count = buf.get_i16();
        Ok(Self {
            app_name,
            extension_count,
        })
    }
}

impl Packet for ExtInfo {
    const ID: u8 = id::EXT_INFO;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtEntryPacket {
    pub name: String,
    pub version: i32,
}

impl ProtoEncode for ExtEntryPacket {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        codec::write_string(buf, &self.name);
        buf.put_i32(self.version);
    }
}

impl ProtoDecode for ExtEntryPacket {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, codec::STRING_LENGTH + 4)?;
        let name = codec::read_string(buf)?;
        let version = buf.get_i32();
        Ok(Self { name, version })
    }
}

impl Packet for ExtEntryPacket {
    const ID: u8 = id::EXT_ENTRY;
}

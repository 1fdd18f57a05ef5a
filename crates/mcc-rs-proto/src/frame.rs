//! Framing of the classic TCP byte stream.
//!
//! Classic packets carry no length prefix; the tag byte alone determines how
//! many bytes follow. The decoder waits until a whole frame is buffered and
//! then hands it to [`ClientPacket::decode`].

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::error::ProtoError;
use crate::packets::ClientPacket;

/// Inbound decoder and outbound pass-through encoder for one connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicCodec {
    extended_positions: bool,
}

impl ClassicCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch position reports to the 32-bit layout once ExtEntityPositions
    /// has been negotiated.
    pub fn set_extended_positions(&mut self, enabled: bool) {
        self.extended_positions = enabled;
    }

    pub fn extended_positions(&self) -> bool {
        self.extended_positions
    }
}

impl Decoder for ClassicCodec {
    type Item = ClientPacket;
    type Error = ProtoError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(&tag) = src.first() else {
            return Ok(None);
        };
        let size = ClientPacket::packet_size(tag, self.extended_positions)
            .ok_or(ProtoError::UnknownPacketId(tag))?;
        if src.len() < size {
            src.reserve(size - src.len());
            return Ok(None);
        }
        let mut frame = src.split_to(size).freeze();
        let packet = ClientPacket::decode(&mut frame, self.extended_positions)?;
        trace!("Decoded packet 0x{tag:02X} ({size} bytes)");
        debug_assert!(!frame.has_remaining());
        Ok(Some(packet))
    }
}

impl Encoder<Bytes> for ClassicCodec {
    type Error = ProtoError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{self, encode_packet};
    use crate::packets::{id, Ping};
    use crate::types::Location;
    use bytes::BufMut;

    fn position_frame(extended: bool) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_u8(id::TELEPORT);
        buf.put_u8(0xFF);
        let loc = Location::new(1.0, 2.0, 3.0);
        codec::write_position(&mut buf, &loc, extended);
        codec::write_orientation(&mut buf, &loc);
        buf
    }

    #[test]
    fn waits_for_complete_frame() {
        let mut codec = ClassicCodec::new();
        let full = position_frame(false);
        let mut partial = BytesMut::from(&full[..6]);
        assert!(codec.decode(&mut partial).unwrap().is_none());
        assert_eq!(partial.len(), 6);
        partial.extend_from_slice(&full[6..]);
        let packet = codec.decode(&mut partial).unwrap().unwrap();
        assert!(matches!(packet, ClientPacket::Position(p) if p.location.z == 3.0));
        assert!(partial.is_empty());
    }

    #[test]
    fn decodes_back_to_back_frames() {
        let mut codec = ClassicCodec::new();
        let mut buf = position_frame(false);
        buf.extend_from_slice(&position_frame(false));
        assert!(codec.decode(&mut buf).unwrap().is_some());
        assert!(codec.decode(&mut buf).unwrap().is_some());
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn extended_positions_change_frame_size() {
        let mut codec = ClassicCodec::new();
        codec.set_extended_positions(true);
        let mut buf = position_frame(true);
        assert_eq!(buf.len(), 16);
        let packet = codec.decode(&mut buf).unwrap().unwrap();
        assert!(matches!(packet, ClientPacket::Position(p) if p.location.y == 2.0));
    }

    #[test]
    fn unknown_tag_fails() {
        let mut codec = ClassicCodec::new();
        let mut buf = BytesMut::from(&[0x42u8, 0, 0][..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtoError::UnknownPacketId(0x42))
        ));
    }

    #[test]
    fn encoder_passes_frames_through() {
        let mut codec = ClassicCodec::new();
        let mut dst = BytesMut::new();
        codec.encode(encode_packet(&Ping), &mut dst).unwrap();
        assert_eq!(&dst[..], &[0x01]);
    }
}

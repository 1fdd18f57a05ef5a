//! Identification and CPE negotiation.
//!
//! ```text
//! client                          server
//!   Identification (magic 0x42) ->
//!                               <- ExtInfo, ExtEntry x 18
//!   ExtInfo, ExtEntry x count   ->
//!                               <- CustomBlockSupportLevel   (if negotiated)
//!   CustomBlockSupportLevel     ->
//! ```
//!
//! Plain classic clients stop after the first packet.

use bytes::Bytes;
use futures::StreamExt;
use mcc_rs_proto::codec::encode_packet;
use mcc_rs_proto::error::ProtoError;
use mcc_rs_proto::extensions::{Extension, ExtensionSet, EXTENSIONS};
use mcc_rs_proto::frame::ClassicCodec;
use mcc_rs_proto::packets::{
    id, is_supported_version, ClientIdentification, ClientPacket, CustomBlockSupportLevel,
    ExtEntryPacket, ExtInfo, CUSTOM_BLOCKS_LEVEL, PROTOCOL_VERSION,
};
use tokio::io::AsyncRead;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::codec::FramedRead;
use tracing::debug;

use crate::error::ServerError;

/// Outcome of a finished handshake.
#[derive(Debug)]
pub struct Handshake {
    pub identification: ClientIdentification,
    pub extensions: ExtensionSet,
    pub custom_block_level: u8,
}

pub async fn perform<R>(
    reader: &mut FramedRead<R, ClassicCodec>,
    out: &UnboundedSender<Bytes>,
    app_name: &str,
) -> Result<Handshake, ServerError>
where
    R: AsyncRead + Unpin,
{
    let identification = match next_packet(reader).await? {
        ClientPacket::Identification(identification) => identification,
        other => return Err(unexpected(id::IDENTIFICATION, &other)),
    };
    if !is_supported_version(identification.protocol_version) {
        return Err(ProtoError::ProtocolVersionMismatch {
            expected: PROTOCOL_VERSION,
            got: identification.protocol_version,
        }
        .into());
    }
    if !identification.supports_cpe {
        return Ok(Handshake {
            identification,
            extensions: ExtensionSet::none(),
            custom_block_level: 0,
        });
    }

    send(out, encode_packet(&ExtInfo {
        app_name: app_name.to_string(),
        extension_count: EXTENSIONS.len() as i16,
    }))?;
    for entry in &EXTENSIONS {
        send(out, encode_packet(&ExtEntryPacket {
            name: entry.name.to_string(),
            version: entry.version,
        }))?;
    }

    let info = match next_packet(reader).await? {
        ClientPacket::ExtInfo(info) => info,
        other => return Err(unexpected(id::EXT_INFO, &other)),
    };
    let count = info.extension_count.max(0) as usize;
    let mut advertised = Vec::with_capacity(count);
    for _ in 0..count {
        match next_packet(reader).await? {
            ClientPacket::ExtEntry(entry) => advertised.push((entry.name, entry.version)),
            other => return Err(unexpected(id::EXT_ENTRY, &other)),
        }
    }
    let extensions = ExtensionSet::negotiate(
        advertised
            .iter()
            .map(|(name, version)| (name.as_str(), *version)),
    );
    debug!(
        "{} ({}) advertised {count} extensions, {} in common",
        identification.username,
        info.app_name,
        extensions.len()
    );

    let mut custom_block_level = 0;
    if extensions.supports(Extension::CustomBlocks) {
        send(out, encode_packet(&CustomBlockSupportLevel {
            level: CUSTOM_BLOCKS_LEVEL,
        }))?;
        match next_packet(reader).await? {
            ClientPacket::CustomBlockSupportLevel(reply) => {
                custom_block_level = reply.level.min(CUSTOM_BLOCKS_LEVEL);
            }
            other => return Err(unexpected(id::CUSTOM_BLOCK_SUPPORT_LEVEL, &other)),
        }
    }

    if extensions.supports(Extension::ExtEntityPositions) {
        reader.decoder_mut().set_extended_positions(true);
    }

    Ok(Handshake {
        identification,
        extensions,
        custom_block_level,
    })
}

async fn next_packet<R>(reader: &mut FramedRead<R, ClassicCodec>) -> Result<ClientPacket, ServerError>
where
    R: AsyncRead + Unpin,
{
    match reader.next().await {
        Some(Ok(packet)) => Ok(packet),
        Some(Err(e)) => Err(e.into()),
        None => Err(ServerError::ConnectionClosed),
    }
}

fn send(out: &UnboundedSender<Bytes>, frame: Bytes) -> Result<(), ServerError> {
    out.send(frame).map_err(|_| ServerError::ConnectionClosed)
}

fn unexpected(expected: u8, got: &ClientPacket) -> ServerError {
    ProtoError::UnexpectedPacketId {
        expected,
        got: got.tag(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};
    use mcc_rs_proto::codec::Packet;
    use mcc_rs_proto::extensions::CPE_MAGIC;
    use tokio::io::{duplex, AsyncWriteExt, DuplexStream};
    use tokio::sync::mpsc;

    fn frame<P: Packet>(packet: &P) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_u8(P::ID);
        packet.proto_encode(&mut buf);
        buf
    }

    fn identification(version: u8, cpe: bool) -> BytesMut {
        frame(&ClientIdentification {
            protocol_version: version,
            username: "alice".into(),
            verification_key: "-".into(),
            supports_cpe: cpe,
        })
    }

    async fn run(input: Vec<BytesMut>) -> (Result<Handshake, ServerError>, Vec<Bytes>, bool) {
        let (mut client, server): (DuplexStream, DuplexStream) = duplex(64 * 1024);
        for chunk in input {
            client.write_all(&chunk).await.unwrap();
        }
        drop(client);
        let mut reader = FramedRead::new(server, ClassicCodec::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let result = perform(&mut reader, &tx, "test").await;
        let mut sent = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            sent.push(frame);
        }
        let extended = reader.decoder().extended_positions();
        (result, sent, extended)
    }

    #[tokio::test]
    async fn plain_client_skips_negotiation() {
        let (result, sent, extended) = run(vec![identification(7, false)]).await;
        let handshake = result.unwrap();
        assert_eq!(handshake.identification.username, "alice");
        assert!(handshake.extensions.is_empty());
        assert!(sent.is_empty());
        assert!(!extended);
    }

    #[tokio::test]
    async fn wrong_version_is_rejected() {
        let (result, _, _) = run(vec![identification(6, false)]).await;
        assert!(matches!(
            result,
            Err(ServerError::Proto(ProtoError::ProtocolVersionMismatch { got: 6, .. }))
        ));
    }

    #[tokio::test]
    async fn cpe_client_negotiates() {
        let mut input = vec![
            identification(7, true),
            frame(&ExtInfo {
                app_name: "client".into(),
                extension_count: 3,
            }),
        ];
        for (name, version) in [("ExtEntityPositions", 1), ("CustomBlocks", 1), ("EnvColors", 1)] {
            input.push(frame(&ExtEntryPacket {
                name: name.into(),
                version,
            }));
        }
        input.push(frame(&CustomBlockSupportLevel { level: 1 }));

        let (result, sent, extended) = run(input).await;
        let handshake = result.unwrap();
        assert_eq!(handshake.identification.protocol_version, 7);
        assert_eq!(handshake.extensions.len(), 2);
        assert_eq!(handshake.custom_block_level, 1);
        assert!(extended);

        // ExtInfo, 18 ExtEntry, CustomBlockSupportLevel
        assert_eq!(sent.len(), 20);
        assert_eq!(sent[0][0], id::EXT_INFO);
        assert!(sent[1..19].iter().all(|f| f[0] == id::EXT_ENTRY));
        assert_eq!(&sent[19][..], &[id::CUSTOM_BLOCK_SUPPORT_LEVEL, 1]);
        assert_eq!(identification(7, true)[130], CPE_MAGIC);
    }

    #[tokio::test]
    async fn wrong_packet_during_negotiation() {
        let input = vec![identification(7, true), identification(7, true)];
        let (result, _, _) = run(input).await;
        assert!(matches!(
            result,
            Err(ServerError::Proto(ProtoError::UnexpectedPacketId {
                expected: id::EXT_INFO,
                got: id::IDENTIFICATION
            }))
        ));
    }

    #[tokio::test]
    async fn eof_closes_handshake() {
        let (result, _, _) = run(vec![]).await;
        assert!(matches!(result, Err(ServerError::ConnectionClosed)));
    }
}

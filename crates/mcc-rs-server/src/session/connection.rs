//! Per-connection tasks: one reader driving the session, one writer
//! draining its outbound queue.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use mcc_rs_command::args;
use mcc_rs_proto::codec::encode_packet;
use mcc_rs_proto::extensions::Extension;
use mcc_rs_proto::frame::ClassicCodec;
use mcc_rs_proto::packets::{ClientPacket, Kick, PingDirection, TwoWayPing};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, trace};

use super::handshake;
use super::{Session, SessionInfo, MAX_NAME_LENGTH};
use crate::error::ServerError;
use crate::server::Server;

/// Serve one client until it disconnects or is kicked.
pub async fn handle_connection(server: Arc<Server>, stream: TcpStream, addr: SocketAddr) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY for {addr}: {e}");
    }
    let (read_half, write_half) = stream.into_split();
    let mut reader = FramedRead::new(read_half, ClassicCodec::new());
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(write_frames(FramedWrite::new(write_half, ClassicCodec::new()), rx));

    match serve(&server, &mut reader, tx, addr).await {
        Ok(()) => debug!("Connection {addr} closed"),
        Err(e) => info!("Connection {addr} closed: {e}"),
    }
}

async fn write_frames(
    mut sink: FramedWrite<OwnedWriteHalf, ClassicCodec>,
    mut rx: UnboundedReceiver<Bytes>,
) {
    while let Some(frame) = rx.recv().await {
        if let Err(e) = sink.feed(frame).await {
            debug!("Write failed: {e}");
            return;
        }
        while let Ok(frame) = rx.try_recv() {
            if let Err(e) = sink.feed(frame).await {
                debug!("Write failed: {e}");
                return;
            }
        }
        if let Err(e) = sink.flush().await {
            debug!("Flush failed: {e}");
            return;
        }
    }
}

async fn serve(
    server: &Arc<Server>,
    reader: &mut FramedRead<OwnedReadHalf, ClassicCodec>,
    tx: UnboundedSender<Bytes>,
    addr: SocketAddr,
) -> Result<(), ServerError> {
    let timeout = Duration::from_secs(server.config().network.handshake_timeout);
    let handshake = tokio::time::timeout(timeout, handshake::perform(reader, &tx, server.software()))
        .await
        .unwrap_or(Err(ServerError::HandshakeTimeout))
        .inspect_err(|e| reject(&tx, e))?;

    let name = handshake.identification.username;
    if !args::is_valid_name(&name, MAX_NAME_LENGTH) {
        let e = ServerError::InvalidName(name);
        reject(&tx, &e);
        return Err(e);
    }
    let info = SessionInfo {
        name,
        addr,
        extensions: handshake.extensions,
        custom_block_level: handshake.custom_block_level,
    };
    let session = server.register(info, &tx).inspect_err(|e| reject(&tx, e))?;
    drop(tx);

    let result = match server.login(&session) {
        Ok(()) => read_loop(server, &session, reader).await,
        Err(e) => {
            session.kick(&e.to_string());
            Err(e)
        }
    };
    server.remove_session(&session);
    result
}

fn reject(tx: &UnboundedSender<Bytes>, error: &ServerError) {
    let _ = tx.send(encode_packet(&Kick::new(error.to_string())));
}

async fn read_loop(
    server: &Arc<Server>,
    session: &Arc<Session>,
    reader: &mut FramedRead<OwnedReadHalf, ClassicCodec>,
) -> Result<(), ServerError> {
    loop {
        tokio::select! {
            frame = reader.next() => match frame {
                Some(Ok(packet)) => dispatch(server, session, packet).await,
                Some(Err(e)) => {
                    session.kick(&e.to_string());
                    return Err(e.into());
                }
                None => return Ok(()),
            },
            _ = session.closed() => return Ok(()),
        }
    }
}

/// Handle one packet from a logged-in client. Chat lines may run commands
/// and are handled on the blocking pool.
async fn dispatch(server: &Arc<Server>, session: &Arc<Session>, packet: ClientPacket) {
    match packet {
        ClientPacket::SetBlock(change) => server.player_set_block(session, &change),
        ClientPacket::Position(report) => session.update_position(&report),
        ClientPacket::Message(message) => {
            if let Some(text) = session.accumulate_message(&message) {
                server.handle_chat(session, text).await;
            }
        }
        ClientPacket::TwoWayPing(ping) => {
            if ping.direction == PingDirection::ClientToServer
                && session.supports(Extension::TwoWayPing)
            {
                session.send_packet(&TwoWayPing {
                    direction: PingDirection::ClientToServer,
                    data: ping.data,
                });
            }
        }
        ClientPacket::PlayerClicked(click) => {
            trace!("{} clicked {:?} {:?}", session.name(), click.button, click.action);
        }
        other => debug!(
            "Ignoring packet 0x{:02X} from {} after login",
            other.tag(),
            session.name()
        ),
    }
}

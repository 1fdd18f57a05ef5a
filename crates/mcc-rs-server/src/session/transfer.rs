//! Level transfer: LevelInitialize, compressed chunks, LevelFinalize.
//!
//! Compression runs on the blocking pool over a snapshot of the blocks, so
//! the level itself is never locked while a client downloads it.

use std::sync::Arc;

use mcc_rs_proto::codec::encode_packet;
use mcc_rs_proto::extensions::Extension;
use mcc_rs_proto::level_stream::LevelStream;
use mcc_rs_proto::packets::{LevelDataChunk, LevelFinalize, LevelInitialize};
use mcc_rs_world::block::BlockId;
use mcc_rs_world::serializer::{self, LevelEncoding};
use mcc_rs_world::Level;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::Session;

/// Copy of everything a transfer needs from the level.
pub struct LevelSnapshot {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub length: usize,
    pub blocks: Vec<BlockId>,
}

impl LevelSnapshot {
    pub fn of(level: &Level) -> Self {
        Self {
            name: level.name().to_string(),
            width: level.width(),
            height: level.height(),
            length: level.length(),
            blocks: level.blocks().to_vec(),
        }
    }
}

/// Stream `snapshot` to `session` on the blocking pool. The session must
/// already be in transfer mode; it leaves it when the stream ends.
pub fn spawn_transfer(session: Arc<Session>, snapshot: LevelSnapshot) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        send_level(&session, &snapshot);
        session.end_transfer();
    })
}

fn send_level(session: &Session, snapshot: &LevelSnapshot) {
    if session.is_closed() {
        debug!("Skipping transfer of {} to closed session", snapshot.name);
        return;
    }
    let encoding = LevelEncoding {
        fast_map: session.supports(Extension::FastMap),
        custom_block_level: session.custom_block_level(),
    };
    let initialize = if encoding.fast_map {
        LevelInitialize::fast_map(snapshot.blocks.len() as u32)
    } else {
        LevelInitialize::classic()
    };
    session.send_direct(encode_packet(&initialize));

    let mut chunks = 0usize;
    let mut stream = LevelStream::new(|chunk: LevelDataChunk| {
        session.send_direct(encode_packet(&chunk));
        chunks += 1;
    });
    if let Err(e) = serializer::write_level(&snapshot.blocks, encoding, &mut stream) {
        warn!("Failed to send level {} to {}: {e}", snapshot.name, session.name());
        session.kick("Failed to send level");
        return;
    }
    stream.finish();

    session.send_direct(encode_packet(&LevelFinalize {
        width: snapshot.width,
        height: snapshot.height,
        length: snapshot.length,
    }));
    debug!(
        "Sent level {} to {} in {chunks} chunks",
        snapshot.name,
        session.name()
    );
}

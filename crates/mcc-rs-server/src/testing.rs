//! Helpers shared by the unit tests: in-memory storage, detached sessions
//! and a small test server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use mcc_rs_proto::extensions::{Extension, ExtensionSet};
use mcc_rs_world::storage::LevelStorage;
use mcc_rs_world::{Level, WorldError};
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::config::ServerConfig;
use crate::server::{LevelHandle, Server};
use crate::session::{Session, SessionInfo};

#[derive(Default)]
pub struct MemoryStorage {
    levels: Mutex<HashMap<String, Level>>,
}

impl LevelStorage for MemoryStorage {
    fn load(&self, name: &str) -> Result<Level, WorldError> {
        self.levels
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| WorldError::NotFound(name.to_string()))
    }

    fn save(&self, level: &Level) -> Result<(), WorldError> {
        let mut copy = level.clone();
        copy.mark_clean();
        self.levels.lock().insert(level.name().to_string(), copy);
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.levels.lock().contains_key(name)
    }
}

fn info(name: &str, extensions: ExtensionSet) -> SessionInfo {
    let custom_block_level = u8::from(extensions.supports(Extension::CustomBlocks));
    SessionInfo {
        name: name.to_string(),
        addr: "127.0.0.1:0".parse().unwrap(),
        extensions,
        custom_block_level,
    }
}

/// A session that belongs to no server.
pub fn detached(
    name: &str,
    id: u8,
    extensions: ExtensionSet,
) -> (Arc<Session>, UnboundedReceiver<Bytes>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Session::new(info(name, extensions), id, tx), rx)
}

/// Server with a 16x16x16 flat main level and in-memory storage.
pub fn test_server() -> Arc<Server> {
    let mut config = ServerConfig::with_name("Test");
    config.world.width = 16;
    config.world.height = 16;
    config.world.length = 16;
    Server::new(config, Box::new(MemoryStorage::default())).unwrap()
}

/// Register a session with `server` without a socket.
pub fn connect(
    server: &Server,
    name: &str,
    extensions: ExtensionSet,
) -> (Arc<Session>, UnboundedReceiver<Bytes>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = server.register(info(name, extensions), &tx).unwrap();
    (session, rx)
}

/// Join `level` and wait until the level has been sent.
pub async fn join(server: &Server, session: &Arc<Session>, level: &LevelHandle) {
    server.join_level(session, level).unwrap().await.unwrap();
}

/// Wait for a transfer started elsewhere to finish.
pub async fn settle(session: &Session) {
    while session.is_loading() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

pub fn drain(rx: &mut UnboundedReceiver<Bytes>) -> Vec<Bytes> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}

/// Packet tags of `frames`, in order.
pub fn tags(frames: &[Bytes]) -> Vec<u8> {
    frames.iter().map(|f| f[0]).collect()
}

//! Fan-out of one packet to many sessions.
//!
//! Recipients differ only in a few capability bits, so each packet is encoded
//! at most once per [`Variant`] and the same `Bytes` is pushed to every
//! session that shares it.

use std::sync::Arc;

use bytes::Bytes;
use mcc_rs_proto::codec::encode_packet;
use mcc_rs_proto::extensions::Extension;
use mcc_rs_proto::packets::{EnvSetWeatherType, SetBlock};
use mcc_rs_proto::types::BlockPos;
use mcc_rs_world::block::{self, BlockId};
use mcc_rs_world::{Level, LevelListener, Weather};

use crate::session::Session;

/// The capability bits that change how a packet is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Variant {
    /// 32-bit positions (ExtEntityPositions).
    pub extended_positions: bool,
    /// CustomBlocks level 1 or higher; otherwise blocks fall back.
    pub custom_blocks: bool,
    /// ExtPlayerList: spawn with ExtAddEntity2.
    pub player_list: bool,
    /// The packet describes the recipient's own entity.
    pub self_ref: bool,
}

const VARIANT_COUNT: usize = 16;

impl Variant {
    fn slot(self) -> usize {
        self.extended_positions as usize
            | (self.custom_blocks as usize) << 1
            | (self.player_list as usize) << 2
            | (self.self_ref as usize) << 3
    }

    /// Block as a session of this variant may see it.
    pub fn block(self, block: BlockId) -> BlockId {
        if self.custom_blocks {
            block
        } else {
            block::fallback(block, 0)
        }
    }
}

/// Lazily encodes one packet per variant.
pub struct VariantCache<F> {
    build: F,
    slots: [Option<Bytes>; VARIANT_COUNT],
    encoded: usize,
}

impl<F: FnMut(Variant) -> Bytes> VariantCache<F> {
    pub fn new(build: F) -> Self {
        Self {
            build,
            slots: Default::default(),
            encoded: 0,
        }
    }

    pub fn get(&mut self, variant: Variant) -> Bytes {
        let slot = &mut self.slots[variant.slot()];
        if let Some(bytes) = slot {
            return bytes.clone();
        }
        let bytes = (self.build)(variant);
        self.encoded += 1;
        *slot = Some(bytes.clone());
        bytes
    }

    /// How many encodings were actually built.
    pub fn encoded(&self) -> usize {
        self.encoded
    }
}

/// Send a packet built by `build` to every session in `sessions`. The
/// session whose entity ID equals `self_id` gets the self-referencing
/// variant. Returns the number of distinct encodings.
pub fn fan_out<'a, I, F>(sessions: I, self_id: Option<u8>, build: F) -> usize
where
    I: IntoIterator<Item = &'a Arc<Session>>,
    F: FnMut(Variant) -> Bytes,
{
    let mut cache = VariantCache::new(build);
    for session in sessions {
        let variant = session.variant(self_id == Some(session.entity_id()));
        session.send(cache.get(variant));
    }
    cache.encoded()
}

/// Forwards level mutations to the sessions on that level.
pub struct LevelBroadcaster<'a> {
    sessions: &'a [Arc<Session>],
}

impl<'a> LevelBroadcaster<'a> {
    pub fn new(sessions: &'a [Arc<Session>]) -> Self {
        Self { sessions }
    }
}

impl LevelListener for LevelBroadcaster<'_> {
    fn block_changed(&self, _level: &Level, x: usize, y: usize, z: usize, block: BlockId) {
        let pos = BlockPos::new(x as u16, y as u16, z as u16);
        fan_out(self.sessions, None, |variant| {
            encode_packet(&SetBlock {
                pos,
                block: variant.block(block),
            })
        });
    }

    fn weather_changed(&self, _level: &Level, weather: Weather) {
        let packet = encode_packet(&EnvSetWeatherType {
            weather: weather as u8,
        });
        for session in self
            .sessions
            .iter()
            .filter(|s| s.supports(Extension::EnvWeatherType))
        {
            session.send(packet.clone());
        }
    }
}

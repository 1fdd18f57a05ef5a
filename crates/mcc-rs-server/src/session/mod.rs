//! Connected players.
//!
//! A [`Session`] is created once the handshake has finished, so its
//! negotiated extensions never change. Everything else about the player
//! (entity, level, held block...) lives in [`PlayerState`] behind a mutex.
//!
//! Lock order across the server: level lock, then the session registry,
//! then a session's state.

mod connection;
mod handshake;
mod outbound;
mod transfer;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use bytes::Bytes;
use mcc_rs_command::CommandSender;
use mcc_rs_proto::codec::{encode_packet, Packet, STRING_LENGTH};
use mcc_rs_proto::extensions::{Extension, ExtensionSet};
use mcc_rs_proto::packets::{
    ClientMessage, ClientPosition, EnvProperty, EnvSetWeatherType, HackControl, HoldThis, Kick,
    MakeSelection, Message, MessageType, RemoveSelection, SetClickDistance, SetMapEnvProperty,
    SetMapEnvUrl, SetPermission, Teleport,
};
use mcc_rs_proto::types::{EntityRef, Location};
use mcc_rs_world::block::{self, BlockId};
use mcc_rs_world::Level;
use parking_lot::{Mutex, MutexGuard, RwLock};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Notify;
use tracing::info;

use crate::broadcast::Variant;
use crate::entity::Entity;

pub use connection::handle_connection;
pub(crate) use transfer::{spawn_transfer, LevelSnapshot};

use outbound::Outbound;

/// Longest accepted player name.
pub const MAX_NAME_LENGTH: usize = 16;

/// Upper bound on a message assembled from LongerMessages parts.
const MAX_MESSAGE_LENGTH: usize = 4096;

/// Prefix of wrapped continuation lines.
const CONTINUATION: &str = ">";

/// Default reach in blocks.
pub const DEFAULT_CLICK_DISTANCE: f32 = 5.0;

/// What the handshake established about a client.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub name: String,
    pub addr: SocketAddr,
    pub extensions: ExtensionSet,
    /// CustomBlocks support level the client reported, 0 without the extension.
    pub custom_block_level: u8,
}

#[derive(Debug)]
pub struct PlayerState {
    pub entity: Entity,
    level: Weak<RwLock<Level>>,
    pub operator: bool,
    pub click_distance: f32,
    pub held_block: BlockId,
    pub held_block_locked: bool,
    pub hacks: HackControl,
    /// Whether the player's ExtPlayerList entries have been sent.
    pub(crate) listed: bool,
    partial_message: String,
}

#[derive(Debug)]
pub struct Session {
    me: Weak<Session>,
    info: SessionInfo,
    entity_id: u8,
    outbound: Outbound,
    state: Mutex<PlayerState>,
    closed: AtomicBool,
    close_notify: Notify,
    transferring: AtomicBool,
}

impl Session {
    pub(crate) fn new(info: SessionInfo, entity_id: u8, tx: UnboundedSender<Bytes>) -> Arc<Self> {
        let entity = Entity::new(entity_id, &info.name);
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            info,
            entity_id,
            outbound: Outbound::new(tx),
            state: Mutex::new(PlayerState {
                entity,
                level: Weak::new(),
                operator: false,
                click_distance: DEFAULT_CLICK_DISTANCE,
                held_block: block::AIR,
                held_block_locked: false,
                hacks: HackControl::default(),
                listed: false,
                partial_message: String::new(),
            }),
            closed: AtomicBool::new(false),
            close_notify: Notify::new(),
            transferring: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn addr(&self) -> SocketAddr {
        self.info.addr
    }

    pub fn entity_id(&self) -> u8 {
        self.entity_id
    }

    pub fn extensions(&self) -> &ExtensionSet {
        &self.info.extensions
    }

    pub fn supports(&self, ext: Extension) -> bool {
        self.info.extensions.supports(ext)
    }

    pub fn custom_block_level(&self) -> u8 {
        self.info.custom_block_level
    }

    /// How packets for this session must be encoded.
    pub fn variant(&self, self_ref: bool) -> Variant {
        Variant {
            extended_positions: self.supports(Extension::ExtEntityPositions),
            custom_blocks: self.info.custom_block_level >= 1,
            player_list: self.supports(Extension::ExtPlayerList),
            self_ref,
        }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, PlayerState> {
        self.state.lock()
    }

    /// Copy of the player's entity.
    pub fn entity(&self) -> Entity {
        self.state.lock().entity.clone()
    }

    pub fn location(&self) -> Location {
        self.state.lock().entity.location
    }

    pub fn is_operator(&self) -> bool {
        self.state.lock().operator
    }

    pub fn held_block(&self) -> BlockId {
        self.state.lock().held_block
    }

    /// The level the player is on, if it is still loaded.
    pub fn level(&self) -> Option<Arc<RwLock<Level>>> {
        self.state.lock().level.upgrade()
    }

    pub fn is_on(&self, level: &Arc<RwLock<Level>>) -> bool {
        std::ptr::eq(self.state.lock().level.as_ptr(), Arc::as_ptr(level))
    }

    pub(crate) fn set_level(state: &mut PlayerState, level: Option<&Arc<RwLock<Level>>>) {
        state.level = level.map(Arc::downgrade).unwrap_or_default();
    }

    pub fn send(&self, frame: Bytes) {
        self.outbound.send(frame);
    }

    pub fn send_packet<P: Packet>(&self, packet: &P) {
        self.send(encode_packet(packet));
    }

    pub(crate) fn send_direct(&self, frame: Bytes) {
        self.outbound.send_direct(frame);
    }

    /// Chat message, wrapped to the 64-byte line width.
    pub fn send_message(&self, text: &str) {
        self.send_typed_message(MessageType::Chat, text);
    }

    /// Message for a specific screen area. Clients without MessageTypes get
    /// it as chat.
    pub fn send_typed_message(&self, message_type: MessageType, text: &str) {
        let message_type = if self.supports(Extension::MessageTypes) {
            message_type
        } else {
            MessageType::Chat
        };
        for line in wrap_message(text) {
            self.send_packet(&Message {
                message_type,
                text: line,
            });
        }
    }

    /// Disconnect the player with a reason. Only the first call has an effect.
    pub fn kick(&self, reason: &str) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Kicking {}: {reason}", self.info.name);
        self.outbound.send_direct(encode_packet(&Kick::new(reason)));
        self.close_notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.outbound.is_closed()
    }

    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.close_notify.notify_one();
    }

    /// Resolves once the session has been kicked.
    pub(crate) async fn closed(&self) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        self.close_notify.notified().await;
    }

    /// Start a level transfer: hold ordinary traffic until it finishes.
    /// Returns `false` if a transfer is already running.
    pub(crate) fn begin_transfer(&self) -> bool {
        if self.transferring.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.outbound.hold();
        true
    }

    pub(crate) fn end_transfer(&self) {
        self.outbound.release();
        self.transferring.store(false, Ordering::SeqCst);
    }

    /// Whether a level is still being sent to the client.
    pub fn is_loading(&self) -> bool {
        self.transferring.load(Ordering::SeqCst)
    }

    /// Move the player. The client is told immediately; peers see the move
    /// on the next tick.
    pub fn teleport(&self, location: Location) {
        self.state.lock().entity.location = location;
        self.send_packet(&Teleport {
            entity: EntityRef::own(self.entity_id),
            location,
            extended_positions: self.supports(Extension::ExtEntityPositions),
        });
    }

    /// Make the current location the client's respawn point by spawning
    /// its own entity there again.
    pub fn set_spawn(&self) {
        let entity = self.entity();
        self.send(entity.spawn_packet(self.variant(true)));
    }

    pub fn set_operator(&self, operator: bool) {
        self.state.lock().operator = operator;
        self.send_packet(&SetPermission { operator });
    }

    pub fn set_click_distance(&self, distance: f32) {
        self.state.lock().click_distance = distance;
        if self.supports(Extension::ClickDistance) {
            self.send_packet(&SetClickDistance { distance });
        }
    }

    /// Put a block in the player's hand, optionally locking the selection.
    pub fn set_held_block(&self, block: BlockId, locked: bool) {
        {
            let mut state = self.state.lock();
            state.held_block = block;
            state.held_block_locked = locked;
        }
        if self.supports(Extension::HeldBlock) {
            self.send_packet(&HoldThis {
                block: self.variant(false).block(block),
                prevent_change: locked,
            });
        }
    }

    pub fn set_hack_control(&self, hacks: HackControl) {
        self.state.lock().hacks = hacks;
        if self.supports(Extension::HackControl) {
            self.send_packet(&hacks);
        }
    }

    /// Show a selection cuboid. Returns `false` if the client cannot.
    pub fn make_selection(&self, selection: &MakeSelection) -> bool {
        if !self.supports(Extension::SelectionCuboid) {
            return false;
        }
        self.send_packet(selection);
        true
    }

    pub fn remove_selection(&self, selection_id: u8) {
        if self.supports(Extension::SelectionCuboid) {
            self.send_packet(&RemoveSelection { selection_id });
        }
    }

    /// Texture, side/edge and weather settings of `level`, for the
    /// extensions the client has.
    pub(crate) fn send_environment(&self, level: &Level) {
        if self.supports(Extension::EnvMapAspect) {
            let appearance = &level.appearance;
            let variant = self.variant(false);
            self.send_packet(&SetMapEnvUrl {
                url: appearance.texture_pack_url.clone(),
            });
            let properties = [
                (EnvProperty::SideBlock, variant.block(appearance.side_block) as i32),
                (EnvProperty::EdgeBlock, variant.block(appearance.edge_block) as i32),
                (EnvProperty::EdgeHeight, appearance.side_level as i32),
                (EnvProperty::CloudHeight, appearance.cloud_level as i32),
                (EnvProperty::MaxViewDistance, appearance.max_view_distance as i32),
            ];
            for (property, value) in properties {
                self.send_packet(&SetMapEnvProperty { property, value });
            }
        }
        if self.supports(Extension::EnvWeatherType) {
            self.send_packet(&EnvSetWeatherType {
                weather: level.weather() as u8,
            });
        }
    }

    /// Apply a position report. Reports that arrive while a level is
    /// loading still describe the old level and are dropped.
    pub(crate) fn update_position(&self, report: &ClientPosition) {
        if self.is_loading() {
            return;
        }
        let mut state = self.state.lock();
        state.entity.location = report.location;
        if self.supports(Extension::HeldBlock) && !state.held_block_locked {
            state.held_block = report.player_id;
        }
    }

    /// Collect LongerMessages parts. Returns the full text once the last
    /// part has arrived.
    pub(crate) fn accumulate_message(&self, message: &ClientMessage) -> Option<String> {
        let partial = message.is_partial(self.supports(Extension::LongerMessages));
        let mut state = self.state.lock();
        state.partial_message.push_str(&message.text);
        if partial && state.partial_message.len() < MAX_MESSAGE_LENGTH {
            // A partial part fills the whole field; restore the trailing
            // spaces the string decoder trimmed.
            let missing = STRING_LENGTH.saturating_sub(message.text.len());
            state.partial_message.extend(std::iter::repeat(' ').take(missing));
            return None;
        }
        Some(std::mem::take(&mut state.partial_message))
    }
}

impl CommandSender for Session {
    type Player = Arc<Session>;

    fn name(&self) -> String {
        self.info.name.clone()
    }

    fn send_message(&self, message: &str) {
        Session::send_message(self, message);
    }

    fn as_player(&self) -> Option<Arc<Session>> {
        self.me.upgrade()
    }
}

/// Split text into lines that fit a string field. Breaks at spaces where
/// possible; continuation lines start with `>`.
pub fn wrap_message(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for mut word in text.split(' ') {
        loop {
            let sep = usize::from(!line.is_empty());
            if line.len() + sep + word.len() <= STRING_LENGTH {
                if sep == 1 {
                    line.push(' ');
                }
                line.push_str(word);
                break;
            }
            if line.len() > CONTINUATION.len() && word.len() + 1 + CONTINUATION.len() <= STRING_LENGTH {
                lines.push(std::mem::replace(&mut line, CONTINUATION.to_string()));
                continue;
            }
            let room = STRING_LENGTH.saturating_sub(line.len() + sep);
            let cut = floor_char_boundary(word, room);
            if cut == 0 {
                lines.push(std::mem::replace(&mut line, CONTINUATION.to_string()));
                continue;
            }
            if sep == 1 {
                line.push(' ');
            }
            line.push_str(&word[..cut]);
            word = &word[cut..];
            lines.push(std::mem::replace(&mut line, CONTINUATION.to_string()));
            if word.is_empty() {
                break;
            }
        }
    }
    if line != CONTINUATION || lines.is_empty() {
        lines.push(line);
    }
    lines
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{detached, drain};
    use bytes::{BufMut, BytesMut};
    use mcc_rs_proto::codec::{write_string, ProtoDecode};
    use mcc_rs_proto::packets::id;

    #[test]
    fn short_message_is_one_line() {
        assert_eq!(wrap_message("hello world"), vec!["hello world"]);
        assert_eq!(wrap_message(""), vec![""]);
    }

    #[test]
    fn long_message_wraps_at_spaces() {
        let text = format!("{} {}", "a".repeat(40), "b".repeat(40));
        let lines = wrap_message(&text);
        assert_eq!(lines, vec!["a".repeat(40), format!("> {}", "b".repeat(40))]);
        assert!(lines.iter().all(|l| l.len() <= STRING_LENGTH));
    }

    #[test]
    fn long_word_is_split() {
        let lines = wrap_message(&"x".repeat(130));
        assert!(lines.len() >= 3);
        assert!(lines.iter().all(|l| l.len() <= STRING_LENGTH));
        let joined: String = lines
            .iter()
            .map(|l| l.trim_start_matches("> "))
            .collect();
        assert_eq!(joined, "x".repeat(130));
    }

    #[test]
    fn message_type_needs_extension() {
        let (plain, mut rx_plain) = detached("plain", 0, ExtensionSet::none());
        let (cpe, mut rx_cpe) = detached("cpe", 1, ExtensionSet::all());
        plain.send_typed_message(MessageType::Announcement, "hi");
        cpe.send_typed_message(MessageType::Announcement, "hi");
        assert_eq!(drain(&mut rx_plain)[0][1], MessageType::Chat as u8);
        assert_eq!(drain(&mut rx_cpe)[0][1], MessageType::Announcement as u8);
    }

    #[test]
    fn gated_setters_skip_plain_clients() {
        let (plain, mut rx) = detached("plain", 0, ExtensionSet::none());
        plain.set_click_distance(10.0);
        plain.set_held_block(block::STONE, true);
        plain.set_hack_control(HackControl::default());
        plain.remove_selection(1);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(plain.state().click_distance, 10.0);
        assert!(plain.state().held_block_locked);

        plain.set_operator(true);
        let frames = drain(&mut rx);
        assert_eq!(&frames[0][..], &[id::SET_PERMISSION, 0x64]);
        assert!(plain.is_operator());
    }

    #[test]
    fn gated_setters_reach_cpe_clients() {
        let (cpe, mut rx) = detached("cpe", 0, ExtensionSet::all());
        cpe.set_click_distance(10.0);
        cpe.set_held_block(block::STONE, false);
        cpe.set_hack_control(HackControl::default());
        let tags: Vec<u8> = drain(&mut rx).iter().map(|f| f[0]).collect();
        assert_eq!(tags, vec![id::SET_CLICK_DISTANCE, id::HOLD_THIS, id::HACK_CONTROL]);
    }

    #[test]
    fn teleport_uses_self_sentinel() {
        let (s, mut rx) = detached("me", 12, ExtensionSet::none());
        s.teleport(Location::new(1.0, 2.0, 3.0));
        let frames = drain(&mut rx);
        assert_eq!(frames[0][0], id::TELEPORT);
        assert_eq!(frames[0][1], 0xFF);
        assert_eq!(s.location(), Location::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn extended_positions_only_when_negotiated() {
        let (plain, mut rx_plain) = detached("plain", 0, ExtensionSet::none());
        let (ext, mut rx_ext) = detached(
            "ext",
            1,
            ExtensionSet::negotiate([("ExtEntityPositions", 1)]),
        );
        let target = Location::new(2000.0, 64.0, 2000.0);
        plain.teleport(target);
        ext.teleport(target);
        assert_eq!(drain(&mut rx_plain)[0].len(), 10);
        let frame = &drain(&mut rx_ext)[0];
        assert_eq!(frame.len(), 16);
        assert_eq!(&frame[2..6], &64000i32.to_be_bytes());
    }

    #[test]
    fn held_block_follows_position_reports() {
        let (s, _rx) = detached("me", 0, ExtensionSet::all());
        let report = ClientPosition {
            player_id: block::GLASS,
            location: Location::new(5.0, 5.0, 5.0),
        };
        s.update_position(&report);
        assert_eq!(s.held_block(), block::GLASS);
        assert_eq!(s.location(), report.location);

        let (plain, _rx) = detached("plain", 1, ExtensionSet::none());
        plain.update_position(&report);
        assert_eq!(plain.held_block(), block::AIR);
    }

    fn wire_message(flag: u8, text: &str) -> ClientMessage {
        let mut buf = BytesMut::new();
        buf.put_u8(flag);
        write_string(&mut buf, text);
        ClientMessage::proto_decode(&mut buf.freeze()).unwrap()
    }

    #[test]
    fn longer_messages_keep_space_at_part_boundary() {
        let (s, _rx) = detached("me", 0, ExtensionSet::all());
        let first = format!("{} ", "a".repeat(63));
        assert_eq!(s.accumulate_message(&wire_message(1, &first)), None);
        assert_eq!(
            s.accumulate_message(&wire_message(0, "world")),
            Some(format!("{} world", "a".repeat(63)))
        );
    }

    #[test]
    fn longer_messages_join_full_parts() {
        let (s, _rx) = detached("me", 0, ExtensionSet::all());
        let first = "b".repeat(64);
        assert_eq!(s.accumulate_message(&wire_message(1, &first)), None);
        assert_eq!(
            s.accumulate_message(&wire_message(0, "cd")),
            Some(format!("{first}cd"))
        );

        let (plain, _rx) = detached("plain", 1, ExtensionSet::none());
        assert_eq!(
            plain.accumulate_message(&wire_message(1, "whole")).as_deref(),
            Some("whole")
        );
    }

    #[test]
    fn kick_sends_once() {
        let (s, mut rx) = detached("me", 0, ExtensionSet::none());
        s.kick("bye");
        s.kick("again");
        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0][0], id::KICK);
        assert!(s.is_closed());
    }

    #[test]
    fn command_sender_resolves_player() {
        let (s, _rx) = detached("me", 0, ExtensionSet::none());
        let sender: &dyn CommandSender<Player = Arc<Session>> = &*s;
        assert_eq!(sender.name(), "me");
        assert!(Arc::ptr_eq(&sender.as_player().unwrap(), &s));
    }
}

//! The server context: loaded levels, connected sessions and every operation
//! that touches both.
//!
//! Lock order is level → session registry → per-session state. Mutations
//! that clients must observe take the level write lock and fan out while
//! holding it; a joining session snapshots the level and registers itself
//! under the read lock, so it sees each mutation exactly once.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use mcc_rs_command::{CommandRegistry, CommandResult, CommandSender};
use mcc_rs_proto::codec::encode_packet;
use mcc_rs_proto::extensions::Extension;
use mcc_rs_proto::packets::{
    BulkBlockUpdate, EntityPropertyType, Ping, ServerIdentification, SetBlock, SetBlockClient,
};
use mcc_rs_proto::types::{BlockPos, Location, MAX_ENTITY_ID};
use mcc_rs_world::block::{self, BlockId};
use mcc_rs_world::generator::generator;
use mcc_rs_world::storage::LevelStorage;
use mcc_rs_world::{Level, Weather, WorldError};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use tokio::sync::{mpsc::UnboundedSender, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::broadcast::{fan_out, LevelBroadcaster};
use crate::commands;
use crate::config::ServerConfig;
use crate::entity::DEFAULT_MODEL;
use crate::error::ServerError;
use crate::session::{spawn_transfer, LevelSnapshot, Session, SessionInfo};

pub type LevelHandle = Arc<RwLock<Level>>;

/// Blocks only operators may place: bedrock and the four liquids.
const RESTRICTED_BLOCKS: [BlockId; 5] = [
    block::BEDROCK,
    block::ACTIVE_WATER,
    block::WATER,
    block::ACTIVE_LAVA,
    block::LAVA,
];

pub struct Server {
    config: ServerConfig,
    storage: Box<dyn LevelStorage>,
    levels: RwLock<BTreeMap<String, LevelHandle>>,
    main_level: RwLock<LevelHandle>,
    sessions: RwLock<BTreeMap<u8, Arc<Session>>>,
    commands: CommandRegistry<Server, Arc<Session>>,
    tick: AtomicU64,
    shutdown: watch::Sender<bool>,
}

impl Server {
    /// Build the server, loading the main level from storage or generating it.
    pub fn new(config: ServerConfig, storage: Box<dyn LevelStorage>) -> Result<Arc<Self>, ServerError> {
        let world = &config.world;
        let main = if storage.exists(&world.main_level) {
            let level = storage.load(&world.main_level)?;
            info!(
                "Loaded main level {} ({}x{}x{})",
                level.name(),
                level.width(),
                level.height(),
                level.length()
            );
            level
        } else {
            let mut level = Level::new(&world.main_level, world.width, world.height, world.length)?;
            generator(&world.generator, &[])?.generate(&mut level);
            info!(
                "Generated main level {} ({}x{}x{}, {})",
                level.name(),
                level.width(),
                level.height(),
                level.length(),
                world.generator
            );
            level
        };

        let name = main.name().to_string();
        let main: LevelHandle = Arc::new(RwLock::new(main));
        let mut levels = BTreeMap::new();
        levels.insert(name, main.clone());

        let mut registry = CommandRegistry::new();
        commands::register(&mut registry);
        let (shutdown, _) = watch::channel(false);

        Ok(Arc::new(Self {
            config,
            storage,
            levels: RwLock::new(levels),
            main_level: RwLock::new(main),
            sessions: RwLock::new(BTreeMap::new()),
            commands: registry,
            tick: AtomicU64::new(0),
            shutdown,
        }))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Software name announced during the CPE handshake.
    pub fn software(&self) -> &'static str {
        concat!("mcc-rs ", env!("CARGO_PKG_VERSION"))
    }

    pub fn commands(&self) -> &CommandRegistry<Server, Arc<Session>> {
        &self.commands
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn current_tick(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }

    // -----------------------------------------------------------------------
    // Levels
    // -----------------------------------------------------------------------

    pub fn find_level(&self, name: &str) -> Option<LevelHandle> {
        self.levels.read().get(name).cloned()
    }

    pub fn level_names(&self) -> Vec<String> {
        self.levels.read().keys().cloned().collect()
    }

    /// Run `f` on every loaded level. The level map is not locked while
    /// `f` runs.
    pub fn for_each_level(&self, mut f: impl FnMut(&LevelHandle)) {
        let levels: Vec<LevelHandle> = self.levels.read().values().cloned().collect();
        for level in &levels {
            f(level);
        }
    }

    /// Whether a level of that name is loaded or stored.
    pub fn level_exists(&self, name: &str) -> bool {
        self.find_level(name).is_some() || self.storage.exists(name)
    }

    pub fn add_level(&self, level: Level) -> Result<LevelHandle, ServerError> {
        let name = level.name().to_string();
        let mut levels = self.levels.write();
        if levels.contains_key(&name) {
            return Err(ServerError::LevelExists(name));
        }
        let handle = Arc::new(RwLock::new(level));
        levels.insert(name.clone(), handle.clone());
        info!("Level {name} added");
        Ok(handle)
    }

    pub fn load_level(&self, name: &str) -> Result<LevelHandle, ServerError> {
        if self.find_level(name).is_some() {
            return Err(ServerError::LevelExists(name.to_string()));
        }
        let level = self.storage.load(name).map_err(|e| match e {
            WorldError::NotFound(name) => ServerError::LevelNotFound(name),
            other => other.into(),
        })?;
        self.add_level(level)
    }

    /// Write a level to storage. Mutators wait for the save; readers don't.
    pub fn save_level(&self, handle: &LevelHandle) -> Result<(), ServerError> {
        let level = handle.upgradable_read();
        self.storage.save(&level)?;
        RwLockUpgradableReadGuard::upgrade(level).mark_clean();
        Ok(())
    }

    /// Save every level with unsaved changes. Returns how many were written.
    pub fn save_all(&self) -> usize {
        let mut saved = 0;
        self.for_each_level(|handle| {
            if !handle.read().is_dirty() {
                return;
            }
            match self.save_level(handle) {
                Ok(()) => saved += 1,
                Err(e) => warn!("Failed to save level {}: {e}", handle.read().name()),
            }
        });
        if saved > 0 {
            info!("Saved {saved} level(s)");
        }
        saved
    }

    /// Unload a level, moving its players to the main level and saving it
    /// first if it changed.
    pub fn unload_level(&self, name: &str) -> Result<(), ServerError> {
        let handle = self
            .find_level(name)
            .ok_or_else(|| ServerError::LevelNotFound(name.to_string()))?;
        if self.is_main_level(&handle) {
            return Err(ServerError::MainLevel(name.to_string()));
        }
        if let Some(loading) = self.sessions_on(&handle).iter().find(|s| s.is_loading()) {
            return Err(ServerError::StillLoading(loading.name().to_string()));
        }
        let main = self.main_level();

        self.levels.write().remove(name);
        for session in self.sessions_on(&handle) {
            session.send_message(&format!("Level {name} is being unloaded"));
            if let Err(e) = self.teleport_level(&session, &main) {
                // Started loading after the check above; it cannot stay behind.
                warn!("Could not move {} off {name}: {e}", session.name());
                self.leave_level(&session);
                session.kick(&format!("Level {name} was unloaded"));
            }
        }

        if handle.read().is_dirty() {
            if let Err(e) = self.save_level(&handle) {
                self.levels.write().insert(name.to_string(), handle);
                return Err(e);
            }
        }
        info!("Level {name} unloaded");
        Ok(())
    }

    pub fn main_level(&self) -> LevelHandle {
        self.main_level.read().clone()
    }

    pub fn is_main_level(&self, handle: &LevelHandle) -> bool {
        Arc::ptr_eq(handle, &self.main_level.read())
    }

    pub fn set_main_level(&self, name: &str) -> Result<LevelHandle, ServerError> {
        let handle = self
            .find_level(name)
            .ok_or_else(|| ServerError::LevelNotFound(name.to_string()))?;
        *self.main_level.write() = handle.clone();
        info!("Main level is now {name}");
        Ok(handle)
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Admit a client that finished the handshake and give it the lowest
    /// free entity ID.
    pub fn register(
        &self,
        info: SessionInfo,
        tx: &UnboundedSender<Bytes>,
    ) -> Result<Arc<Session>, ServerError> {
        let mut sessions = self.sessions.write();
        if sessions
            .values()
            .any(|s| s.name().eq_ignore_ascii_case(&info.name))
        {
            return Err(ServerError::DuplicatePlayer(info.name));
        }
        if sessions.len() >= self.config.server.max_players as usize {
            return Err(ServerError::ServerFull);
        }
        let id = (0..=MAX_ENTITY_ID)
            .find(|id| !sessions.contains_key(id))
            .ok_or(ServerError::ServerFull)?;
        let session = Session::new(info, id, tx.clone());
        sessions.insert(id, session.clone());
        debug!("{} registered as entity {id}", session.name());
        Ok(session)
    }

    /// Greet a registered session and send it to the main level.
    pub fn login(&self, session: &Arc<Session>) -> Result<(), ServerError> {
        session.send_packet(&ServerIdentification {
            server_name: self.config.server.name.clone(),
            motd: self.config.server.motd.clone(),
            operator: session.is_operator(),
        });
        let main = self.main_level();
        let _transfer = self.join_level(session, &main)?;
        info!(
            "{} [{}] logged in with entity ID {} ({} extensions, {} online)",
            session.name(),
            session.addr(),
            session.entity_id(),
            session.extensions().len(),
            self.player_count()
        );
        self.broadcast_message(&format!("&e{} joined the game", session.name()));
        Ok(())
    }

    /// Forget a session: despawn it, drop it from the tab lists and announce
    /// the departure. Safe to call more than once.
    pub fn remove_session(&self, session: &Arc<Session>) {
        session.mark_closed();
        self.leave_level(session);

        let removed = {
            let mut sessions = self.sessions.write();
            match sessions.get(&session.entity_id()) {
                Some(s) if Arc::ptr_eq(s, session) => sessions.remove(&session.entity_id()),
                _ => None,
            }
        };
        if removed.is_none() {
            return;
        }

        let entry = session.entity().list_remove_packet();
        for other in self.players() {
            if other.supports(Extension::ExtPlayerList) {
                other.send(entry.clone());
            }
        }
        info!("{} disconnected", session.name());
        self.broadcast_message(&format!("&e{} left the game", session.name()));
    }

    pub fn find_player(&self, name: &str) -> Option<Arc<Session>> {
        self.sessions
            .read()
            .values()
            .find(|s| s.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn players(&self) -> Vec<Arc<Session>> {
        self.sessions.read().values().cloned().collect()
    }

    pub fn player_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Snapshot of the sessions affiliated with `level`.
    pub fn sessions_on(&self, level: &LevelHandle) -> Vec<Arc<Session>> {
        self.sessions
            .read()
            .values()
            .filter(|s| s.is_on(level))
            .cloned()
            .collect()
    }

    pub fn broadcast_message(&self, text: &str) {
        for session in self.players() {
            session.send_message(text);
        }
    }

    // -----------------------------------------------------------------------
    // Level membership
    // -----------------------------------------------------------------------

    /// Affiliate `session` with `handle` and start streaming the level.
    ///
    /// Everything queued for the session from here until the transfer
    /// finishes is held back and delivered right after LevelFinalize.
    pub fn join_level(
        &self,
        session: &Arc<Session>,
        handle: &LevelHandle,
    ) -> Result<JoinHandle<()>, ServerError> {
        if !session.begin_transfer() {
            return Err(ServerError::TransferInProgress);
        }

        let level = handle.read();
        let snapshot = LevelSnapshot::of(&level);
        session.send_environment(&level);

        let sessions = self.sessions.write();
        let peers: Vec<Arc<Session>> = sessions
            .values()
            .filter(|s| s.is_on(handle))
            .cloned()
            .collect();

        let (entity, first_listing) = {
            let mut state = session.state();
            Session::set_level(&mut state, Some(handle));
            state.entity.place(level.spawn);
            state.entity.group_name = level.name().to_string();
            let first = !std::mem::replace(&mut state.listed, true);
            (state.entity.clone(), first)
        };

        let own = session.variant(false);
        session.send(entity.spawn_packet(session.variant(true)));
        for peer in &peers {
            let peer_entity = peer.entity();
            session.send(peer_entity.spawn_packet(own));
            if session.supports(Extension::ChangeModel) && peer_entity.model != DEFAULT_MODEL {
                session.send(peer_entity.model_packet(own));
            }
            if session.supports(Extension::EntityProperty) {
                for property in peer_entity.changed_properties() {
                    session.send(peer_entity.property_packet(own, property));
                }
            }
        }

        fan_out(&peers, None, |v| entity.spawn_packet(v));
        if entity.model != DEFAULT_MODEL {
            let watchers = peers
                .iter()
                .chain(std::iter::once(session))
                .filter(|s| s.supports(Extension::ChangeModel));
            fan_out(watchers, Some(entity.id), |v| entity.model_packet(v));
        }

        let listers = sessions
            .values()
            .filter(|s| s.supports(Extension::ExtPlayerList));
        fan_out(listers, Some(entity.id), |v| entity.list_add_packet(v));
        if first_listing && session.supports(Extension::ExtPlayerList) {
            for other in sessions.values().filter(|s| s.entity_id() != entity.id) {
                session.send(other.entity().list_add_packet(own));
            }
        }

        drop(sessions);
        drop(level);
        debug!(
            "{} joined level {} with {} peer(s)",
            session.name(),
            snapshot.name,
            peers.len()
        );
        Ok(spawn_transfer(session.clone(), snapshot))
    }

    /// Detach `session` from its level and despawn it on both sides.
    pub fn leave_level(&self, session: &Arc<Session>) {
        let Some(handle) = session.level() else {
            return;
        };
        let _level = handle.write();
        let peers: Vec<Arc<Session>> = self
            .sessions_on(&handle)
            .into_iter()
            .filter(|s| s.entity_id() != session.entity_id())
            .collect();
        let entity = {
            let mut state = session.state();
            Session::set_level(&mut state, None);
            state.entity.clone()
        };
        let despawn = entity.despawn_packet();
        for peer in &peers {
            peer.send(despawn.clone());
            session.send(peer.entity().despawn_packet());
        }
    }

    /// Move a session to another level.
    pub fn teleport_level(
        &self,
        session: &Arc<Session>,
        handle: &LevelHandle,
    ) -> Result<JoinHandle<()>, ServerError> {
        if session.is_loading() {
            return Err(ServerError::TransferInProgress);
        }
        self.leave_level(session);
        self.join_level(session, handle)
    }

    // -----------------------------------------------------------------------
    // Ticking
    // -----------------------------------------------------------------------

    /// One server tick: movement fan-out on every level and the keep-alive.
    pub fn tick(&self) {
        let tick = self.tick.fetch_add(1, Ordering::Relaxed) + 1;
        self.for_each_level(|handle| self.sync_movement(handle));
        if tick % self.config.network.ping_ticks() == 0 {
            let ping = encode_packet(&Ping);
            for session in self.players() {
                session.send(ping.clone());
            }
        }
    }

    fn sync_movement(&self, handle: &LevelHandle) {
        let _level = handle.write();
        let sessions = self.sessions_on(handle);
        for mover in &sessions {
            let Some(update) = mover.state().entity.take_movement() else {
                continue;
            };
            let watchers = sessions
                .iter()
                .filter(|s| s.entity_id() != update.entity_id);
            fan_out(watchers, None, |v| update.packet(v.extended_positions));
        }
    }

    // -----------------------------------------------------------------------
    // World changes
    // -----------------------------------------------------------------------

    /// Apply a block change requested by a player, or undo it on their
    /// client if they may not make it.
    pub fn player_set_block(&self, session: &Arc<Session>, change: &SetBlockClient) {
        if session.is_loading() {
            return;
        }
        let Some(handle) = session.level() else {
            return;
        };
        let (x, y, z) = (
            change.pos.x as usize,
            change.pos.y as usize,
            change.pos.z as usize,
        );
        let block = change.resulting_block();

        let mut level = handle.write();
        if !level.contains(x, y, z) {
            return;
        }
        let current = level.get_block(x, y, z);
        if !may_place(session, current, block) {
            debug!("{} may not place {block} at {x},{y},{z}", session.name());
            session.send_packet(&SetBlock {
                pos: change.pos,
                block: session.variant(false).block(current),
            });
            return;
        }
        let sessions = self.sessions_on(&handle);
        level.set_block_and_notify(x, y, z, block, &LevelBroadcaster::new(&sessions));
    }

    /// Apply many block changes at once. Sessions with BulkBlockUpdate get
    /// batches of up to 256 changes, the rest one SetBlock per change.
    /// Returns the number of changes applied.
    pub fn set_blocks(&self, handle: &LevelHandle, changes: &[(usize, usize, usize, BlockId)]) -> usize {
        let mut level = handle.write();
        let applied: Vec<(usize, usize, usize, BlockId)> = changes
            .iter()
            .copied()
            .filter(|&(x, y, z, block)| level.set_block(x, y, z, block))
            .collect();
        if applied.is_empty() {
            return 0;
        }

        let sessions = self.sessions_on(handle);
        let (bulk, single): (Vec<_>, Vec<_>) = sessions
            .iter()
            .partition(|s| s.supports(Extension::BulkBlockUpdate));

        if !bulk.is_empty() {
            for custom in [false, true] {
                let receivers: Vec<&Arc<Session>> = bulk
                    .iter()
                    .copied()
                    .filter(|s| s.variant(false).custom_blocks == custom)
                    .collect();
                if receivers.is_empty() {
                    continue;
                }
                let variant = receivers[0].variant(false);
                let indexed: Vec<(i32, u8)> = applied
                    .iter()
                    .map(|&(x, y, z, b)| (level.index(x, y, z) as i32, variant.block(b)))
                    .collect();
                for batch in BulkBlockUpdate::batches(&indexed) {
                    let frame = encode_packet(&batch);
                    for session in &receivers {
                        session.send(frame.clone());
                    }
                }
            }
        }

        for &(x, y, z, b) in &applied {
            let pos = BlockPos::new(x as u16, y as u16, z as u16);
            fan_out(single.iter().copied(), None, |v| {
                encode_packet(&SetBlock {
                    pos,
                    block: v.block(b),
                })
            });
        }
        applied.len()
    }

    /// Change a level's weather. Returns `false` if it was already set.
    pub fn set_weather(&self, handle: &LevelHandle, weather: Weather) -> bool {
        let mut level = handle.write();
        let sessions = self.sessions_on(handle);
        let changed = level.set_weather(weather, &LevelBroadcaster::new(&sessions));
        if changed {
            info!("Weather on {} is now {weather:?}", level.name());
        }
        changed
    }

    pub fn set_spawn(&self, handle: &LevelHandle, spawn: Location) {
        let mut level = handle.write();
        level.set_spawn(spawn);
        debug!(
            "Spawn of {} set to {:.1},{:.1},{:.1}",
            level.name(),
            spawn.x,
            spawn.y,
            spawn.z
        );
    }

    /// Change a player's model and show it to everyone who can see it.
    pub fn set_model(&self, session: &Arc<Session>, model: &str) {
        let Some(handle) = session.level() else {
            session.state().entity.model = model.to_string();
            return;
        };
        let _level = handle.write();
        let entity = {
            let mut state = session.state();
            state.entity.model = model.to_string();
            state.entity.clone()
        };
        let watchers = self.sessions_on(&handle);
        let watchers = watchers
            .iter()
            .filter(|s| s.supports(Extension::ChangeModel));
        fan_out(watchers, Some(entity.id), |v| entity.model_packet(v));
    }

    /// Rotate a player's model about one axis (EntityProperty).
    pub fn set_entity_property(
        &self,
        session: &Arc<Session>,
        property: EntityPropertyType,
        value: i32,
    ) {
        let Some(handle) = session.level() else {
            session.state().entity.rotation[property as usize] = value;
            return;
        };
        let _level = handle.write();
        let entity = {
            let mut state = session.state();
            state.entity.rotation[property as usize] = value;
            state.entity.clone()
        };
        let watchers = self.sessions_on(&handle);
        let watchers = watchers
            .iter()
            .filter(|s| s.supports(Extension::EntityProperty));
        fan_out(watchers, Some(entity.id), |v| entity.property_packet(v, property));
    }

    // -----------------------------------------------------------------------
    // Chat and commands
    // -----------------------------------------------------------------------

    /// Handle a complete chat line from a player.
    pub fn player_message(&self, session: &Arc<Session>, text: &str) {
        if let Some(line) = text.strip_prefix('/') {
            info!("{} issued command: /{line}", session.name());
            self.execute_command(session.as_ref(), line);
            return;
        }
        info!("<{}> {text}", session.name());
        self.broadcast_message(&format!("<{}> {text}", session.name()));
    }

    /// [`player_message`](Self::player_message) on the blocking pool.
    /// Resolves once the line has been handled, so one player's lines stay
    /// in order.
    pub async fn handle_chat(self: &Arc<Self>, session: &Arc<Session>, text: String) {
        let server = Arc::clone(self);
        let session = Arc::clone(session);
        let task = tokio::task::spawn_blocking(move || server.player_message(&session, &text));
        if let Err(e) = task.await {
            warn!("Chat handler failed: {e}");
        }
    }

    /// Run a console line on the blocking pool.
    pub async fn run_console_line(self: &Arc<Self>, line: String) {
        let server = Arc::clone(self);
        let task = tokio::task::spawn_blocking(move || {
            server.execute_command(&commands::Console, &line);
        });
        if let Err(e) = task.await {
            warn!("Console command failed: {e}");
        }
    }

    /// Run a command line for `sender` and deliver its output.
    pub fn execute_command(
        &self,
        sender: &dyn CommandSender<Player = Arc<Session>>,
        line: &str,
    ) -> CommandResult {
        let result = self.commands.dispatch(self, sender, line);
        for message in &result.messages {
            sender.send_message(message);
        }
        if let Some(text) = &result.broadcast {
            self.broadcast_message(text);
        }
        if result.should_stop {
            self.request_shutdown();
        }
        result
    }
}

fn may_place(session: &Session, current: BlockId, block: BlockId) -> bool {
    let max = if session.custom_block_level() >= 1 {
        block::MAX_CUSTOM_BLOCK
    } else {
        block::MAX_CLASSIC_BLOCK
    };
    if !block::is_valid(block) || block > max {
        return false;
    }
    if session.is_operator() {
        return true;
    }
    !RESTRICTED_BLOCKS.contains(&block) && current != block::BEDROCK
}

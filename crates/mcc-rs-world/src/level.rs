//! A loaded level: block grid, spawn point, appearance and weather.

use mcc_rs_proto::types::Location;

use crate::block::{self, BlockId};
use crate::error::WorldError;

/// Largest dimension the LevelFinalize packet can describe.
pub const MAX_DIMENSION: usize = i16::MAX as usize;

/// Largest block count the `i32` length prefix of a level transfer can
/// describe.
pub const MAX_VOLUME: usize = i32::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Weather {
    #[default]
    Sunny = 0,
    Raining = 1,
    Snowing = 2,
}

impl Weather {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Sunny),
            1 => Some(Self::Raining),
            2 => Some(Self::Snowing),
            _ => None,
        }
    }
}

/// Environment settings sent to EnvMapAspect clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelAppearance {
    /// Empty means the client's default textures.
    pub texture_pack_url: String,
    pub side_block: BlockId,
    pub edge_block: BlockId,
    pub side_level: usize,
    pub cloud_level: usize,
    /// 0 means no limit.
    pub max_view_distance: usize,
}

impl LevelAppearance {
    /// Defaults for a level of the given height: bedrock sides, water edges
    /// at half height, clouds just above the top.
    pub fn for_height(height: usize) -> Self {
        Self {
            texture_pack_url: String::new(),
            side_block: block::BEDROCK,
            edge_block: block::ACTIVE_WATER,
            side_level: height / 2,
            cloud_level: height + 2,
            max_view_distance: 0,
        }
    }
}

/// Observer for level mutations that clients must see.
///
/// Callbacks run while the level is still exclusively borrowed, so
/// observers see mutations in the order they are applied.
pub trait LevelListener {
    /// Called after the block at `(x, y, z)` has been set.
    fn block_changed(&self, level: &Level, x: usize, y: usize, z: usize, block: BlockId);

    /// Called before `level.weather()` switches to `weather`.
    fn weather_changed(&self, level: &Level, weather: Weather);
}

#[derive(Debug, Clone)]
pub struct Level {
    name: String,
    width: usize,
    height: usize,
    length: usize,
    blocks: Vec<BlockId>,
    pub spawn: Location,
    pub appearance: LevelAppearance,
    weather: Weather,
    dirty: bool,
}

impl Level {
    /// Create an all-air level. New levels count as unsaved.
    pub fn new(name: &str, width: usize, height: usize, length: usize) -> Result<Self, WorldError> {
        Self::validate(name, width, height, length)?;
        Ok(Self {
            name: name.to_string(),
            width,
            height,
            length,
            blocks: vec![block::AIR; width * height * length],
            spawn: Location::new(
                width as f32 / 2.0,
                height as f32 * 3.0 / 4.0,
                length as f32 / 2.0,
            ),
            appearance: LevelAppearance::for_height(height),
            weather: Weather::Sunny,
            dirty: true,
        })
    }

    /// Rebuild a level from stored blocks, which must hold exactly
    /// `width * height * length` entries.
    pub fn from_blocks(
        name: &str,
        width: usize,
        height: usize,
        length: usize,
        blocks: Vec<BlockId>,
    ) -> Result<Self, WorldError> {
        let mut level = Self::new(name, width, height, length)?;
        if blocks.len() != level.volume() {
            return Err(WorldError::BadFormat(format!(
                "expected {} blocks, found {}",
                level.volume(),
                blocks.len()
            )));
        }
        level.blocks = blocks;
        Ok(level)
    }

    fn validate(name: &str, width: usize, height: usize, length: usize) -> Result<(), WorldError> {
        if name.is_empty() {
            return Err(WorldError::EmptyName);
        }
        let in_range = |d: usize| (1..=MAX_DIMENSION).contains(&d);
        let volume = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(length));
        let fits = volume.is_some_and(|v| v <= MAX_VOLUME);
        if !(in_range(width) && in_range(height) && in_range(length) && fits) {
            return Err(WorldError::InvalidDimensions {
                width,
                height,
                length,
            });
        }
        Ok(())
    }

    /// Copy this level under a new name. The copy shares nothing with the
    /// original and starts out dirty so it gets saved.
    pub fn clone_named(&self, name: &str) -> Result<Self, WorldError> {
        if name.is_empty() {
            return Err(WorldError::EmptyName);
        }
        Ok(Self {
            name: name.to_string(),
            width: self.width,
            height: self.height,
            length: self.length,
            blocks: self.blocks.clone(),
            spawn: self.spawn,
            appearance: self.appearance.clone(),
            weather: self.weather,
            dirty: true,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn volume(&self) -> usize {
        self.width * self.height * self.length
    }

    /// Offset of `(x, y, z)` in the block array.
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.width * (z + self.length * y)
    }

    /// Inverse of [`Level::index`].
    pub fn position(&self, index: usize) -> (usize, usize, usize) {
        let x = index % self.width;
        let z = (index / self.width) % self.length;
        let y = index / (self.width * self.length);
        (x, y, z)
    }

    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.width && y < self.height && z < self.length
    }

    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Block at `(x, y, z)`, or air outside the level.
    pub fn get_block(&self, x: usize, y: usize, z: usize) -> BlockId {
        if self.contains(x, y, z) {
            self.blocks[self.index(x, y, z)]
        } else {
            block::AIR
        }
    }

    /// Set a block without notifying anyone. Returns `false` if the position
    /// is outside the level, in which case nothing changes.
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, block: BlockId) -> bool {
        if !self.contains(x, y, z) {
            return false;
        }
        let index = self.index(x, y, z);
        self.blocks[index] = block;
        self.dirty = true;
        true
    }

    /// Set a block and report the change to `listener`.
    pub fn set_block_and_notify(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        block: BlockId,
        listener: &dyn LevelListener,
    ) -> bool {
        if !self.set_block(x, y, z, block) {
            return false;
        }
        listener.block_changed(self, x, y, z, block);
        true
    }

    pub fn weather(&self) -> Weather {
        self.weather
    }

    /// Change the weather. The listener is told before the new value is
    /// stored, so nobody can observe the new weather before the
    /// notification has been queued. Returns `false` if unchanged.
    pub fn set_weather(&mut self, weather: Weather, listener: &dyn LevelListener) -> bool {
        if weather == self.weather {
            return false;
        }
        listener.weather_changed(self, weather);
        self.weather = weather;
        self.dirty = true;
        true
    }

    /// Restore stored weather without notifying anyone.
    pub fn set_weather_silently(&mut self, weather: Weather) {
        self.weather = weather;
    }

    pub fn set_spawn(&mut self, spawn: Location) {
        self.spawn = spawn;
        self.dirty = true;
    }

    /// Whether the level changed since it was last saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

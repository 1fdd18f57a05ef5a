//! Level generators, looked up by theme name.

use tracing::debug;

use crate::block;
use crate::error::WorldError;
use crate::level::Level;

/// Fills a freshly created level.
pub trait Generator: Send + Sync {
    fn generate(&self, level: &mut Level);
}

/// Names accepted by [`generator`].
pub const GENERATORS: &[&str] = &["flat", "empty"];

/// Build the generator registered under `name`. `args` are the extra words
/// the player typed after the theme.
pub fn generator(name: &str, args: &[&str]) -> Result<Box<dyn Generator>, WorldError> {
    match name.to_ascii_lowercase().as_str() {
        "flat" => Ok(Box::new(FlatGenerator::from_args(args)?)),
        "empty" => Ok(Box::new(EmptyGenerator)),
        _ => Err(WorldError::UnknownGenerator(name.to_string())),
    }
}

/// Grass surface over dirt with a bedrock floor.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatGenerator {
    /// Number of solid layers; defaults to half the level height.
    pub ground: Option<usize>,
}

impl FlatGenerator {
    fn from_args(args: &[&str]) -> Result<Self, WorldError> {
        let ground = match args.first() {
            Some(arg) => Some(arg.parse::<usize>().map_err(|_| {
                WorldError::UnknownGenerator(format!("flat {arg}: ground height must be a number"))
            })?),
            None => None,
        };
        Ok(Self { ground })
    }
}

impl Generator for FlatGenerator {
    fn generate(&self, level: &mut Level) {
        let ground = self.ground.unwrap_or(level.height() / 2).min(level.height());
        for y in 0..ground {
            let layer = if y == 0 {
                block::BEDROCK
            } else if y + 1 == ground {
                block::GRASS
            } else {
                block::DIRT
            };
            for z in 0..level.length() {
                for x in 0..level.width() {
                    level.set_block(x, y, z, layer);
                }
            }
        }
        let mut spawn = level.spawn;
        spawn.y = ground as f32 + 2.0;
        level.set_spawn(spawn);
        debug!("Generated flat level {} with {ground} layers", level.name());
    }
}

/// Leaves the level as air.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyGenerator;

impl Generator for EmptyGenerator {
    fn generate(&self, _level: &mut Level) {}
}

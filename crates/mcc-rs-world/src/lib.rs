//! Level storage, generation and the block catalog.

pub mod block;
pub mod error;
pub mod generator;
pub mod level;
pub mod serializer;
pub mod storage;

pub use error::WorldError;
pub use level::{Level, LevelAppearance, LevelListener, Weather};

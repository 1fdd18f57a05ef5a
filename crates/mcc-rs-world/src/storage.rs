//! Level persistence.
//!
//! [`FileLevelStorage`] keeps one gzip-compressed `.lvl` file per level:
//!
//! ```text
//! magic "MCCL" | version u8
//! width u16 | height u16 | length u16
//! spawn x, y, z, yaw, pitch (f32)
//! side block u8 | edge block u8 | side level u16 | cloud level u16
//! max view distance u16 | weather u8
//! texture URL (u16 length + UTF-8)
//! blocks (width * height * length bytes)
//! ```
//!
//! All integers are big-endian.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use bytes::{Buf, BufMut};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use mcc_rs_proto::types::Location;
use tracing::{debug, info};

use crate::error::WorldError;
use crate::level::{Level, LevelAppearance, Weather};

const MAGIC: &[u8; 4] = b"MCCL";
const FORMAT_VERSION: u8 = 1;
const EXTENSION: &str = "lvl";
const HEADER_SIZE: usize = 4 + 1 + 6 + 20 + 9;

/// Where levels are loaded from and saved to.
pub trait LevelStorage: Send + Sync {
    fn load(&self, name: &str) -> Result<Level, WorldError>;
    fn save(&self, level: &Level) -> Result<(), WorldError>;
    fn exists(&self, name: &str) -> bool;
}

/// Directory of `<name>.lvl` files.
#[derive(Debug, Clone)]
pub struct FileLevelStorage {
    directory: PathBuf,
}

impl FileLevelStorage {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path(&self, name: &str) -> Result<PathBuf, WorldError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !name.starts_with('.');
        if !valid {
            return Err(WorldError::InvalidName(name.to_string()));
        }
        Ok(self.directory.join(format!("{name}.{EXTENSION}")))
    }
}

impl LevelStorage for FileLevelStorage {
    fn load(&self, name: &str) -> Result<Level, WorldError> {
        let path = self.path(name)?;
        if !path.is_file() {
            return Err(WorldError::NotFound(name.to_string()));
        }
        let mut data = Vec::new();
        GzDecoder::new(BufReader::new(File::open(&path)?)).read_to_end(&mut data)?;
        let level = decode_level(name, &data)?;
        info!(
            "Loaded level {name} ({}x{}x{}) from {}",
            level.width(),
            level.height(),
            level.length(),
            path.display()
        );
        Ok(level)
    }

    fn save(&self, level: &Level) -> Result<(), WorldError> {
        let path = self.path(level.name())?;
        fs::create_dir_all(&self.directory)?;

        // Write next to the target and rename, so a crash never leaves a
        // truncated level behind.
        let tmp = path.with_extension("lvl.tmp");
        {
            let file = BufWriter::new(File::create(&tmp)?);
            let mut encoder = GzEncoder::new(file, Compression::default());
            encoder.write_all(&encode_header(level))?;
            encoder.write_all(level.blocks())?;
            encoder.finish()?.flush()?;
        }
        fs::rename(&tmp, &path)?;
        debug!("Saved level {} to {}", level.name(), path.display());
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.path(name).map(|p| p.is_file()).unwrap_or(false)
    }
}

fn encode_header(level: &Level) -> Vec<u8> {
    let url = level.appearance.texture_pack_url.as_bytes();
    let mut buf = Vec::with_capacity(HEADER_SIZE + 2 + url.len());
    buf.put_slice(MAGIC);
    buf.put_u8(FORMAT_VERSION);
    buf.put_u16(level.width() as u16);
    buf.put_u16(level.height() as u16);
    buf.put_u16(level.length() as u16);

    let spawn = &level.spawn;
    for v in [spawn.x, spawn.y, spawn.z, spawn.yaw, spawn.pitch] {
        buf.put_f32(v);
    }

    let appearance = &level.appearance;
    buf.put_u8(appearance.side_block);
    buf.put_u8(appearance.edge_block);
    buf.put_u16(appearance.side_level as u16);
    buf.put_u16(appearance.cloud_level as u16);
    buf.put_u16(appearance.max_view_distance as u16);
    buf.put_u8(level.weather() as u8);

    buf.put_u16(url.len() as u16);
    buf.put_slice(url);
    buf
}

fn decode_level(name: &str, mut data: &[u8]) -> Result<Level, WorldError> {
    let bad = |msg: &str| WorldError::BadFormat(format!("{name}: {msg}"));

    if data.remaining() < HEADER_SIZE + 2 {
        return Err(bad("truncated header"));
    }
    if &data[..4] != MAGIC {
        return Err(bad("missing magic"));
    }
    data.advance(4);
    let version = data.get_u8();
    if version != FORMAT_VERSION {
        return Err(bad(&format!("unsupported version {version}")));
    }

    let width = data.get_u16() as usize;
    let height = data.get_u16() as usize;
    let length = data.get_u16() as usize;

    let spawn = Location {
        x: data.get_f32(),
        y: data.get_f32(),
        z: data.get_f32(),
        yaw: data.get_f32(),
        pitch: data.get_f32(),
    };

    let side_block = data.get_u8();
    let edge_block = data.get_u8();
    let side_level = data.get_u16() as usize;
    let cloud_level = data.get_u16() as usize;
    let max_view_distance = data.get_u16() as usize;
    let weather = Weather::from_u8(data.get_u8()).ok_or_else(|| bad("unknown weather"))?;

    let url_len = data.get_u16() as usize;
    if data.remaining() < url_len {
        return Err(bad("truncated texture URL"));
    }
    let texture_pack_url = String::from_utf8_lossy(&data[..url_len]).into_owned();
    data.advance(url_len);

    let mut level = Level::from_blocks(name, width, height, length, data.to_vec())?;
    level.spawn = spawn;
    level.appearance = LevelAppearance {
        texture_pack_url,
        side_block,
        edge_block,
        side_level,
        cloud_level,
        max_view_distance,
    };
    level.set_weather_silently(weather);
    level.mark_clean();
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage(tag: &str) -> FileLevelStorage {
        let dir = std::env::temp_dir().join(format!("mcc-rs-storage-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        FileLevelStorage::new(dir)
    }

    #[test]
    fn save_and_load_preserve_level() {
        let storage = temp_storage("roundtrip");
        let mut level = Level::new("castle", 8, 4, 6).unwrap();
        level.set_block(1, 2, 3, 49);
        level.set_spawn(Location::new(1.5, 3.0, 2.5).with_orientation(90.0, 10.0));
        level.appearance.texture_pack_url = "http://example.com/pack.zip".into();
        level.appearance.max_view_distance = 64;
        level.set_weather_silently(Weather::Snowing);

        storage.save(&level).unwrap();
        assert!(storage.exists("castle"));

        let loaded = storage.load("castle").unwrap();
        assert_eq!(loaded.name(), "castle");
        assert_eq!((loaded.width(), loaded.height(), loaded.length()), (8, 4, 6));
        assert_eq!(loaded.blocks(), level.blocks());
        assert_eq!(loaded.spawn, level.spawn);
        assert_eq!(loaded.appearance, level.appearance);
        assert_eq!(loaded.weather(), Weather::Snowing);
        assert!(!loaded.is_dirty());

        let _ = fs::remove_dir_all(storage.directory());
    }

    #[test]
    fn missing_level_is_not_found() {
        let storage = temp_storage("missing");
        assert!(!storage.exists("nowhere"));
        assert!(matches!(
            storage.load("nowhere"),
            Err(WorldError::NotFound(_))
        ));
    }

    #[test]
    fn rejects_path_like_names() {
        let storage = temp_storage("names");
        assert!(matches!(
            storage.load("../etc"),
            Err(WorldError::InvalidName(_))
        ));
        assert!(storage.load("a/b").is_err());
        assert!(!storage.exists(".hidden"));
    }

    #[test]
    fn corrupt_data_is_rejected() {
        assert!(matches!(
            decode_level("x", b"nope"),
            Err(WorldError::BadFormat(_))
        ));
        let level = Level::new("x", 2, 2, 2).unwrap();
        let mut data = encode_header(&level);
        data.extend_from_slice(&[0; 7]);
        assert!(decode_level("x", &data).is_err());
        data.push(0);
        assert!(decode_level("x", &data).is_ok());
    }
}

//! Level data as sent to clients.
//!
//! Classic clients expect gzip of the big-endian block count followed by the
//! blocks. FastMap clients take a raw deflate stream of the blocks alone.
//! Blocks the client cannot render are swapped for their fallback first.

use std::io::{self, Write};

use flate2::write::{DeflateEncoder, GzEncoder};
use flate2::Compression;
use mcc_rs_proto::level_stream::{ChunkSink, LevelStream};

use crate::block::{self, BlockId};

/// Blocks written per progress update.
const SLICE: usize = 4096;

/// How a session wants its level data encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelEncoding {
    pub fast_map: bool,
    /// CustomBlocks support level reported by the client.
    pub custom_block_level: u8,
}

/// Compress `blocks` into `stream`, updating its progress as it goes. The
/// caller still has to [`LevelStream::finish`] the stream.
pub fn write_level<S: ChunkSink>(
    blocks: &[BlockId],
    encoding: LevelEncoding,
    stream: &mut LevelStream<S>,
) -> io::Result<()> {
    if encoding.fast_map {
        let mut encoder = DeflateEncoder::new(&mut *stream, Compression::default());
        write_blocks(blocks, encoding, &mut encoder, |e, p| e.get_mut().set_percent(p))?;
        encoder.finish()?;
    } else {
        let mut encoder = GzEncoder::new(&mut *stream, Compression::default());
        encoder.write_all(&(blocks.len() as i32).to_be_bytes())?;
        write_blocks(blocks, encoding, &mut encoder, |e, p| e.get_mut().set_percent(p))?;
        encoder.finish()?;
    }
    Ok(())
}

fn write_blocks<W: Write>(
    blocks: &[BlockId],
    encoding: LevelEncoding,
    out: &mut W,
    mut progress: impl FnMut(&mut W, u8),
) -> io::Result<()> {
    let total = blocks.len().max(1);
    let mut converted = Vec::with_capacity(SLICE.min(blocks.len()));
    for (i, slice) in blocks.chunks(SLICE).enumerate() {
        progress(out, (i * SLICE * 100 / total) as u8);
        if encoding.custom_block_level >= 1 {
            out.write_all(slice)?;
        } else {
            converted.clear();
            converted.extend(
                slice
                    .iter()
                    .map(|&b| block::fallback(b, encoding.custom_block_level)),
            );
            out.write_all(&converted)?;
        }
    }
    progress(out, 100);
    Ok(())
}

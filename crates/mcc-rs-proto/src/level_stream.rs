//! Chunked level transmission.
//!
//! [`LevelStream`] buffers compressed level data and emits a
//! [`LevelDataChunk`] every time 1024 bytes have accumulated. It implements
//! [`std::io::Write`] so a compressor can write straight into it.

use std::io;

use bytes::Bytes;

use crate::packets::{LevelDataChunk, CHUNK_SIZE};

/// Receives finished chunks, in order.
pub trait ChunkSink {
    fn send_chunk(&mut self, chunk: LevelDataChunk);
}

impl<F: FnMut(LevelDataChunk)> ChunkSink for F {
    fn send_chunk(&mut self, chunk: LevelDataChunk) {
        self(chunk)
    }
}

pub struct LevelStream<S: ChunkSink> {
    sink: S,
    buf: [u8; CHUNK_SIZE],
    len: usize,
    percent: u8,
    chunks_sent: usize,
}

impl<S: ChunkSink> LevelStream<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            buf: [0; CHUNK_SIZE],
            len: 0,
            percent: 0,
            chunks_sent: 0,
        }
    }

    /// Progress attached to every chunk flushed from now on (clamped to 100).
    pub fn set_percent(&mut self, percent: u8) {
        self.percent = percent.min(100);
    }

    pub fn chunks_sent(&self) -> usize {
        self.chunks_sent
    }

    /// Append bytes, flushing each time the buffer fills.
    pub fn write_bytes(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let take = (CHUNK_SIZE - self.len).min(data.len());
            self.buf[self.len..self.len + take].copy_from_slice(&data[..take]);
            self.len += take;
            data = &data[take..];
            if self.len == CHUNK_SIZE {
                self.flush_chunk();
            }
        }
    }

    /// Flush any partial remainder and return the sink. An empty remainder
    /// produces no chunk.
    pub fn finish(mut self) -> S {
        if self.len > 0 {
            self.flush_chunk();
        }
        self.sink
    }

    fn flush_chunk(&mut self) {
        let chunk = LevelDataChunk {
            data: Bytes::copy_from_slice(&self.buf[..self.len]),
            percent: self.percent,
        };
        self.sink.send_chunk(chunk);
        self.len = 0;
        self.chunks_sent += 1;
    }
}

impl<S: ChunkSink> io::Write for LevelStream<S> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.write_bytes(data);
        Ok(data.len())
    }

    /// Partial chunks only leave through [`LevelStream::finish`].
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_packet;
    use std::io::Write;

    #[test]
    fn reconstructs_input_with_one_partial_chunk() {
        let input: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
        let mut chunks = Vec::new();
        let mut stream = LevelStream::new(|c: LevelDataChunk| chunks.push(c));
        stream.write_all(&input[..1000]).unwrap();
        stream.set_percent(50);
        stream.write_all(&input[1000..]).unwrap();
        assert_eq!(stream.chunks_sent(), 2);
        stream.finish();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].percent, 50);
        assert_eq!(chunks[2].data.len(), 2500 - 2048);
        let joined: Vec<u8> = chunks.iter().flat_map(|c| c.data.iter().copied()).collect();
        assert_eq!(joined, input);

        // Only the last chunk is padded on the wire.
        let last = encode_packet(&chunks[2]);
        assert_eq!(last.len(), 1028);
        assert!(last[3 + 452..1027].iter().all(|&b| b == 0));
    }

    #[test]
    fn exact_multiple_sends_no_empty_chunk() {
        let mut count = 0;
        let mut stream = LevelStream::new(|_: LevelDataChunk| count += 1);
        stream.write_all(&[1u8; 2048]).unwrap();
        stream.finish();
        assert_eq!(count, 2);
    }

    #[test]
    fn empty_stream_sends_nothing() {
        let mut count = 0;
        LevelStream::new(|_: LevelDataChunk| count += 1).finish();
        assert_eq!(count, 0);
    }

    #[test]
    fn percent_is_clamped() {
        let mut chunks = Vec::new();
        let mut stream = LevelStream::new(|c: LevelDataChunk| chunks.push(c));
        stream.set_percent(250);
        stream.write_bytes(&[1]);
        stream.finish();
        assert_eq!(chunks[0].percent, 100);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fixed-capacity PCM chunks (§3.2) and the arena they are allocated from
//! (§3.3).

use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use player_plugin_api::{AudioFormat, Tag};

/// Budget for a chunk's audio payload: 4 KiB.
pub const CHUNK_CAPACITY: usize = 4096;

/// A fixed-capacity PCM buffer carrying one chunk's worth of frames plus the
/// metadata the player and outputs need to interpret them (§3.2).
pub struct MusicChunk {
    data: Box<[u8; CHUNK_CAPACITY]>,
    pub length: usize,
    pub timestamp: Duration,
    pub bit_rate: Option<u32>,
    pub tag: Option<Tag>,
    pub replay_gain_serial: u64,
    pub audio_format: AudioFormat,
}

impl MusicChunk {
    fn empty(format: AudioFormat) -> Self {
        Self {
            data: Box::new([0u8; CHUNK_CAPACITY]),
            length: 0,
            timestamp: Duration::ZERO,
            bit_rate: None,
            tag: None,
            replay_gain_serial: 0,
            audio_format: format,
        }
    }

    /// Remaining free bytes, rounded down to a whole frame.
    pub fn space(&self) -> usize {
        let frame = self.audio_format.frame_size().max(1) as usize;
        (CHUNK_CAPACITY - self.length) / frame * frame
    }

    pub fn is_full(&self) -> bool {
        self.space() == 0
    }

    /// Append PCM bytes; caller must ensure `bytes.len() <= space()` and that
    /// `bytes.len()` is frame-aligned (§3.2 invariant: length is a multiple of
    /// `frame_size`).
    pub fn append(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= self.space());
        debug_assert_eq!(bytes.len() % self.audio_format.frame_size().max(1) as usize, 0);
        let end = self.length + bytes.len();
        self.data[self.length..end].copy_from_slice(bytes);
        self.length = end;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.length]
    }

    /// Copy this chunk's content and metadata into a freshly allocated chunk.
    /// Used to fan a single decoded chunk out to several output pipes, since
    /// a `MusicPipe` is single-producer/single-consumer (§3.4) and each
    /// output owns its own pipe.
    pub fn duplicate(&self, buffer: &MusicBuffer) -> Box<MusicChunk> {
        let mut copy = buffer.allocate_blocking(self.audio_format);
        copy.append(self.as_bytes());
        copy.timestamp = self.timestamp;
        copy.bit_rate = self.bit_rate;
        copy.tag = self.tag.clone();
        copy.replay_gain_serial = self.replay_gain_serial;
        copy
    }

    /// Drop the first `n` bytes (used when a seek lands mid-chunk).
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.length);
        self.data.copy_within(n..self.length, 0);
        self.length -= n;
    }

    fn reset(&mut self, format: AudioFormat) {
        self.length = 0;
        self.timestamp = Duration::ZERO;
        self.bit_rate = None;
        self.tag = None;
        self.replay_gain_serial = 0;
        self.audio_format = format;
    }
}

/// A chunk arena with fixed capacity, sized in KiB at construction (§3.3).
/// `allocate`/`return_chunk` are the only operations; this type is not
/// internally synchronized beyond what's needed to satisfy the
/// `music_buffer_mutex` contract from §5 — callers external to this module
/// still serialize access via the owning pipe's lock for the pipe-level
/// invariants, but the free list itself is always safe to touch concurrently.
pub struct MusicBuffer {
    inner: Mutex<Vec<Box<MusicChunk>>>,
    available: Condvar,
    capacity: usize,
}

impl MusicBuffer {
    /// `size_kib` KiB of arena, i.e. `size_kib * 1024 / CHUNK_CAPACITY` chunks.
    pub fn new(size_kib: u32, format: AudioFormat) -> Self {
        let capacity = ((size_kib as usize * 1024) / CHUNK_CAPACITY).max(1);
        let free = (0..capacity)
            .map(|_| Box::new(MusicChunk::empty(format)))
            .collect();
        Self {
            inner: Mutex::new(free),
            available: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn outstanding(&self) -> usize {
        self.capacity - self.inner.lock().len()
    }

    /// Returns `None` iff every chunk is currently outstanding (§3.3).
    pub fn allocate(&self, format: AudioFormat) -> Option<Box<MusicChunk>> {
        let mut free = self.inner.lock();
        free.pop().map(|mut c| {
            c.reset(format);
            c
        })
    }

    /// Blocking variant: parks on the arena's condition until a chunk is
    /// returned (§4.2: "the decoder parks by waiting on a condition owned by
    /// the pipe" — here the buffer owns it directly, which is equivalent
    /// since the buffer is always reached through the pipe's allocation path).
    pub fn allocate_blocking(&self, format: AudioFormat) -> Box<MusicChunk> {
        let mut free = self.inner.lock();
        loop {
            if let Some(mut c) = free.pop() {
                c.reset(format);
                return c;
            }
            self.available.wait(&mut free);
        }
    }

    pub fn return_chunk(&self, chunk: Box<MusicChunk>) {
        let mut free = self.inner.lock();
        free.push(chunk);
        self.available.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use player_plugin_api::SampleFormat;

    fn fmt() -> AudioFormat {
        AudioFormat::new(44_100, SampleFormat::S16, 2)
    }

    #[test]
    fn allocate_exhausts_then_returns_none() {
        let buf = MusicBuffer::new(4096 / 1024, fmt()); // 4 chunks
        let mut held = Vec::new();
        for _ in 0..4 {
            held.push(buf.allocate(fmt()).expect("should allocate"));
        }
        assert!(buf.allocate(fmt()).is_none());
        buf.return_chunk(held.pop().unwrap());
        assert!(buf.allocate(fmt()).is_some());
    }

    #[test]
    fn append_tracks_length_and_space() {
        let buf = MusicBuffer::new(4, fmt());
        let mut chunk = buf.allocate(fmt()).unwrap();
        let frame = fmt().frame_size() as usize;
        assert_eq!(chunk.space() % frame, 0);
        let payload = vec![1u8; frame * 4];
        chunk.append(&payload);
        assert_eq!(chunk.length, frame * 4);
        assert_eq!(chunk.as_bytes().len(), frame * 4);
    }

    #[test]
    fn consume_shifts_remaining_bytes_to_front() {
        let buf = MusicBuffer::new(4, fmt());
        let mut chunk = buf.allocate(fmt()).unwrap();
        chunk.append(&[1, 2, 3, 4, 5, 6, 7, 8]);
        chunk.consume(4);
        assert_eq!(chunk.as_bytes(), &[5, 6, 7, 8]);
    }
}

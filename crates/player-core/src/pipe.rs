// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The FIFO of chunks connecting a decoder to the player, and the player to
//! each output (§3.4).

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};
use player_plugin_api::AudioFormat;

use crate::chunk::MusicChunk;

struct Inner {
    chunks: VecDeque<Box<MusicChunk>>,
    /// Format of the most recently pushed chunk; `None` until the first push.
    current_format: Option<AudioFormat>,
    /// Set when a push changes `current_format`; cleared by
    /// `take_format_changed`. The player must observe this before forwarding
    /// chunks to an output (§3.4 invariant).
    format_changed: bool,
    /// Bumped on every `clear()`; lets a producer mid-transfer discover its
    /// push landed in a pipe that was cleared out from under it (§4.2:
    /// "the pipe must observe a generation counter that invalidates in-flight
    /// pushes").
    generation: u64,
}

/// Single-producer/single-consumer FIFO of [`MusicChunk`]s. Thread-safety is
/// provided by an internal mutex + condition variable so a consumer can park
/// until data (or a generation bump) is available; the single-producer/
/// single-consumer discipline itself is the caller's responsibility, not
/// enforced here.
pub struct MusicPipe {
    inner: Mutex<Inner>,
    client_cond: Condvar,
}

impl Default for MusicPipe {
    fn default() -> Self {
        Self::new()
    }
}

impl MusicPipe {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                chunks: VecDeque::new(),
                current_format: None,
                format_changed: false,
                generation: 0,
            }),
            client_cond: Condvar::new(),
        }
    }

    /// Append a chunk; never blocks (back-pressure happens upstream via
    /// `MusicBuffer` exhaustion). Returns the pipe generation observed at push
    /// time, for producers that need to detect a concurrent `clear()`.
    pub fn push(&self, chunk: Box<MusicChunk>) -> u64 {
        let mut inner = self.inner.lock();
        let format = chunk.audio_format;
        if inner.current_format != Some(format) {
            inner.format_changed = true;
            inner.current_format = Some(format);
        }
        inner.chunks.push_back(chunk);
        let gen = inner.generation;
        drop(inner);
        self.client_cond.notify_one();
        gen
    }

    pub fn with_head<R>(&self, f: impl FnOnce(&MusicChunk) -> R) -> Option<R> {
        let inner = self.inner.lock();
        inner.chunks.front().map(|c| f(c.as_ref()))
    }

    pub fn shift(&self) -> Option<Box<MusicChunk>> {
        self.inner.lock().chunks.pop_front()
    }

    /// Drain every chunk back into `buffer`, bumping the generation so any
    /// in-flight producer push targeting the pre-clear generation can be
    /// recognized as stale by comparing its own `push` return value.
    pub fn clear(&self, buffer: &crate::chunk::MusicBuffer) {
        let mut inner = self.inner.lock();
        while let Some(chunk) = inner.chunks.pop_front() {
            buffer.return_chunk(chunk);
        }
        inner.current_format = None;
        inner.format_changed = false;
        inner.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    pub fn size(&self) -> usize {
        self.inner.lock().chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().chunks.is_empty()
    }

    pub fn current_format(&self) -> Option<AudioFormat> {
        self.inner.lock().current_format
    }

    /// Observe-and-clear the format-changed flag; the player must call this
    /// before forwarding chunks to an output so a format transition is never
    /// missed (§3.4).
    pub fn take_format_changed(&self) -> bool {
        let mut inner = self.inner.lock();
        std::mem::replace(&mut inner.format_changed, false)
    }

    /// Park the calling thread until a chunk is pushed, `timeout` elapses, or
    /// this returns spuriously (callers must re-check `is_empty`).
    pub fn wait_timeout(&self, timeout: Duration) {
        let mut inner = self.inner.lock();
        if !inner.chunks.is_empty() {
            return;
        }
        let _: MutexGuard<'_, Inner> = self.client_cond.wait_for(&mut inner, timeout).0;
    }

    pub fn notify(&self) {
        self.client_cond.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::MusicBuffer;
    use player_plugin_api::SampleFormat;

    fn fmt() -> AudioFormat {
        AudioFormat::new(44_100, SampleFormat::S16, 2)
    }

    #[test]
    fn fifo_ordering() {
        let buf = MusicBuffer::new(16, fmt());
        let pipe = MusicPipe::new();
        let mut a = buf.allocate(fmt()).unwrap();
        a.append(&[1, 2, 3, 4]);
        let mut b = buf.allocate(fmt()).unwrap();
        b.append(&[5, 6, 7, 8]);
        pipe.push(a);
        pipe.push(b);
        assert_eq!(pipe.size(), 2);
        let head = pipe.shift().unwrap();
        assert_eq!(head.as_bytes(), &[1, 2, 3, 4]);
        let second = pipe.shift().unwrap();
        assert_eq!(second.as_bytes(), &[5, 6, 7, 8]);
        assert!(pipe.is_empty());
    }

    #[test]
    fn format_change_flag_latches_until_observed() {
        let buf = MusicBuffer::new(16, fmt());
        let pipe = MusicPipe::new();
        pipe.push(buf.allocate(fmt()).unwrap());
        assert!(pipe.take_format_changed());
        assert!(!pipe.take_format_changed());
        let other = AudioFormat::new(48_000, SampleFormat::S16, 2);
        pipe.push(buf.allocate(other).unwrap());
        assert!(pipe.take_format_changed());
    }

    #[test]
    fn clear_returns_all_chunks_and_bumps_generation() {
        let buf = MusicBuffer::new(16, fmt());
        let pipe = MusicPipe::new();
        pipe.push(buf.allocate(fmt()).unwrap());
        pipe.push(buf.allocate(fmt()).unwrap());
        assert_eq!(buf.outstanding(), 2);
        let gen_before = pipe.generation();
        pipe.clear(&buf);
        assert_eq!(buf.outstanding(), 0);
        assert!(pipe.is_empty());
        assert_eq!(pipe.generation(), gen_before + 1);
    }
}

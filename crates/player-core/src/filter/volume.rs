// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Software volume: the last stage of the chain, and the scalar a hardware
//! mixer (when configured) shares with it (§4.4 "Concurrency with mixer").

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use player_plugin_api::AudioFormat;

use super::samples::{read_sample, write_sample};
use super::Filter;
use crate::error::OutputError;

/// A volume scalar in `[0, 100]` shared between the `VolumeFilter` running on
/// an output thread and whatever reads/writes it from the control surface.
/// The source's COM-apartment-style dedicated worker is a platform detail
/// this spec puts out of scope (§1); a plain atomic is the full contract here
/// — reads and writes are already wait-free and need no apartment thread.
#[derive(Clone)]
pub struct SharedVolume(Arc<AtomicU8>);

impl SharedVolume {
    pub fn new(initial: u8) -> Self {
        Self(Arc::new(AtomicU8::new(initial.min(100))))
    }

    pub fn get(&self) -> u8 {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, value: u8) {
        self.0.store(value.min(100), Ordering::Release);
    }
}

impl Default for SharedVolume {
    fn default() -> Self {
        Self::new(100)
    }
}

pub struct VolumeFilter {
    volume: SharedVolume,
    format: AudioFormat,
}

impl VolumeFilter {
    pub fn new(volume: SharedVolume) -> Self {
        Self {
            volume,
            format: AudioFormat::new(44_100, player_plugin_api::SampleFormat::S16, 2),
        }
    }
}

impl Filter for VolumeFilter {
    fn configure(&mut self, input: AudioFormat) -> Result<AudioFormat, OutputError> {
        self.format = input;
        Ok(input)
    }

    fn process(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), OutputError> {
        let level = self.volume.get();
        if level == 100 {
            out.extend_from_slice(input);
            return Ok(());
        }
        let gain = level as f32 / 100.0;
        let sample_size = self.format.format.sample_size() as usize;
        let mut buf = input.to_vec();
        let mut i = 0;
        while i + sample_size <= buf.len() {
            let s = read_sample(&buf, i, self.format.format) * gain;
            write_sample(&mut buf, i, self.format.format, s);
            i += sample_size;
        }
        out.extend_from_slice(&buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use player_plugin_api::SampleFormat;

    #[test]
    fn full_volume_is_passthrough() {
        let mut filter = VolumeFilter::new(SharedVolume::new(100));
        let fmt = AudioFormat::new(44_100, SampleFormat::S16, 1);
        filter.configure(fmt).unwrap();
        let input = [0x00, 0x40];
        let mut out = Vec::new();
        filter.process(&input, &mut out).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn half_volume_attenuates() {
        let volume = SharedVolume::new(50);
        let mut filter = VolumeFilter::new(volume);
        let fmt = AudioFormat::new(44_100, SampleFormat::S16, 1);
        filter.configure(fmt).unwrap();
        let mut input = [0u8; 2];
        write_sample(&mut input, 0, SampleFormat::S16, 1.0);
        let mut out = Vec::new();
        filter.process(&input, &mut out).unwrap();
        let result = read_sample(&out, 0, SampleFormat::S16);
        assert!((result - 0.5).abs() < 0.01);
    }
}

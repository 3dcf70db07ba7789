// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sample-rate and sample-format conversion. Channel count is left untouched
//! here; [`super::ChannelRemapFilter`] owns that axis.

use player_plugin_api::{AudioFormat, SampleFormat};

use super::samples::{read_sample, write_sample};
use super::Filter;
use crate::error::OutputError;

pub struct ConvertFilter {
    target_rate: u32,
    target_format: SampleFormat,
    input: AudioFormat,
    output: AudioFormat,
    /// Fractional source-frame position of the next output frame, carried
    /// across `process` calls so a resample boundary never glitches.
    phase: f64,
    /// Last frame of the previous `process` call, one sample per channel, used
    /// as the left-hand interpolation anchor for the first frame of this call.
    carry: Vec<f32>,
}

impl ConvertFilter {
    pub fn new(target_rate: u32, target_format: SampleFormat) -> Self {
        Self {
            target_rate,
            target_format,
            input: AudioFormat::new(target_rate, target_format, 2),
            output: AudioFormat::new(target_rate, target_format, 2),
            phase: 0.0,
            carry: Vec::new(),
        }
    }

    fn ratio(&self) -> f64 {
        self.input.sample_rate as f64 / self.output.sample_rate as f64
    }
}

impl Filter for ConvertFilter {
    fn configure(&mut self, input: AudioFormat) -> Result<AudioFormat, OutputError> {
        self.input = input;
        self.output = AudioFormat::new(self.target_rate, self.target_format, input.channels);
        self.carry = vec![0.0; input.channels as usize];
        self.phase = 0.0;
        Ok(self.output)
    }

    fn process(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), OutputError> {
        let channels = self.input.channels as usize;
        let in_sample_size = self.input.format.sample_size() as usize;
        let in_frame_size = in_sample_size * channels;
        if in_frame_size == 0 || input.is_empty() {
            return Ok(());
        }
        let frame_count = input.len() / in_frame_size;

        let frame_at = |idx: i64, carry: &[f32]| -> Vec<f32> {
            if idx < 0 {
                return carry.to_vec();
            }
            let idx = idx as usize;
            if idx >= frame_count {
                return (0..channels)
                    .map(|ch| {
                        read_sample(
                            input,
                            (frame_count - 1) * in_frame_size + ch * in_sample_size,
                            self.input.format,
                        )
                    })
                    .collect();
            }
            (0..channels)
                .map(|ch| read_sample(input, idx * in_frame_size + ch * in_sample_size, self.input.format))
                .collect()
        };

        if self.input.sample_rate == self.output.sample_rate
            && self.input.format == self.output.format
        {
            out.extend_from_slice(input);
            if frame_count > 0 {
                self.carry = frame_at((frame_count - 1) as i64, &self.carry);
            }
            return Ok(());
        }

        let ratio = self.ratio();
        let out_sample_size = self.output.format.sample_size() as usize;
        let out_frame_size = out_sample_size * channels;
        let mut pos = self.phase;
        let mut produced = Vec::new();
        while (pos as i64) < frame_count as i64 {
            let base = pos.floor() as i64;
            let frac = (pos - pos.floor()) as f32;
            let left = frame_at(base - 1, &self.carry);
            let right = frame_at(base, &self.carry);
            let mut frame_bytes = vec![0u8; out_frame_size];
            for ch in 0..channels {
                let v = left[ch] + (right[ch] - left[ch]) * frac;
                write_sample(&mut frame_bytes, ch * out_sample_size, self.output.format, v);
            }
            produced.extend_from_slice(&frame_bytes);
            pos += ratio;
        }
        self.phase = pos - frame_count as f64;
        if frame_count > 0 {
            self.carry = frame_at((frame_count - 1) as i64, &self.carry);
        }
        out.extend_from_slice(&produced);
        Ok(())
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.carry = vec![0.0; self.input.channels as usize];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_when_formats_already_match() {
        let mut filter = ConvertFilter::new(44_100, SampleFormat::S16);
        let fmt = AudioFormat::new(44_100, SampleFormat::S16, 2);
        assert_eq!(filter.configure(fmt).unwrap(), fmt);
        let input = [1, 2, 3, 4];
        let mut out = Vec::new();
        filter.process(&input, &mut out).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn upsampling_produces_more_frames() {
        let mut filter = ConvertFilter::new(88_200, SampleFormat::S16);
        let fmt = AudioFormat::new(44_100, SampleFormat::S16, 1);
        filter.configure(fmt).unwrap();
        let frame = 2usize;
        let input = vec![0u8; frame * 100];
        let mut out = Vec::new();
        filter.process(&input, &mut out).unwrap();
        assert!(out.len() >= input.len() * 2 - frame * 4);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Channel count adaptation: mono↔stereo and simple fan-out/averaging for
//! other counts.

use player_plugin_api::{AudioFormat, SampleFormat};

use super::samples::{read_sample, write_sample};
use super::Filter;
use crate::error::OutputError;

pub struct ChannelRemapFilter {
    target_channels: u8,
    input: AudioFormat,
}

impl ChannelRemapFilter {
    pub fn new(target_channels: u8) -> Self {
        Self {
            target_channels,
            input: AudioFormat::new(44_100, SampleFormat::S16, target_channels),
        }
    }
}

impl Filter for ChannelRemapFilter {
    fn configure(&mut self, input: AudioFormat) -> Result<AudioFormat, OutputError> {
        self.input = input;
        Ok(AudioFormat::new(input.sample_rate, input.format, self.target_channels))
    }

    fn process(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), OutputError> {
        let in_ch = self.input.channels as usize;
        let out_ch = self.target_channels as usize;
        if in_ch == out_ch {
            out.extend_from_slice(input);
            return Ok(());
        }
        let sample_size = self.input.format.sample_size() as usize;
        let in_frame = sample_size * in_ch;
        if in_frame == 0 {
            return Ok(());
        }
        let frame_count = input.len() / in_frame;
        let mut produced = vec![0u8; frame_count * sample_size * out_ch];

        for frame in 0..frame_count {
            let src = &input[frame * in_frame..frame * in_frame + in_frame];
            let samples: Vec<f32> = (0..in_ch)
                .map(|ch| read_sample(src, ch * sample_size, self.input.format))
                .collect();
            let dst_base = frame * sample_size * out_ch;
            match (in_ch, out_ch) {
                (1, n) => {
                    for ch in 0..n {
                        write_sample(
                            &mut produced,
                            dst_base + ch * sample_size,
                            self.input.format,
                            samples[0],
                        );
                    }
                }
                (m, 1) => {
                    let avg = samples.iter().sum::<f32>() / m as f32;
                    write_sample(&mut produced, dst_base, self.input.format, avg);
                }
                (_, n) => {
                    for ch in 0..n {
                        let v = samples[ch % samples.len()];
                        write_sample(&mut produced, dst_base + ch * sample_size, self.input.format, v);
                    }
                }
            }
        }
        out.extend_from_slice(&produced);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_to_stereo_duplicates_samples() {
        let mut filter = ChannelRemapFilter::new(2);
        let fmt = AudioFormat::new(44_100, SampleFormat::S16, 1);
        filter.configure(fmt).unwrap();
        let mut input = [0u8; 2];
        write_sample(&mut input, 0, SampleFormat::S16, 0.5);
        let mut out = Vec::new();
        filter.process(&input, &mut out).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(&out[0..2], &out[2..4]);
    }

    #[test]
    fn stereo_to_mono_averages() {
        let mut filter = ChannelRemapFilter::new(1);
        let fmt = AudioFormat::new(44_100, SampleFormat::S16, 2);
        filter.configure(fmt).unwrap();
        let mut input = [0u8; 4];
        write_sample(&mut input, 0, SampleFormat::S16, 1.0);
        write_sample(&mut input, 2, SampleFormat::S16, -1.0);
        let mut out = Vec::new();
        filter.process(&input, &mut out).unwrap();
        let avg = read_sample(&out, 0, SampleFormat::S16);
        assert!(avg.abs() < 0.01);
    }
}

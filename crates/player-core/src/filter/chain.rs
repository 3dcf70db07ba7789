// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Assembles the per-output filter chain (§4.4 step 1):
//! `ReplayGain → Convert → AutoConvert → ChannelRemap → Volume`.
//!
//! Cross-fade mixing happens earlier, in the player thread, directly on raw
//! decoder-bridge PCM (`player::thread::forward_mixed`) before either song's
//! bytes ever reach an output's chain — so this chain only ever sees one
//! already-combined stream per output and applies the *current* song's
//! replay-gain to it. Per-stream gain-normalization of the "other" song ahead
//! of the mix is tracked as a known limitation (see DESIGN.md).

use player_plugin_api::AudioFormat;

use super::replaygain::ReplayGainConfig;
use super::{AutoConvertFilter, ChannelRemapFilter, ConvertFilter, Filter, ReplayGainFilter, SharedVolume, VolumeFilter};
use crate::error::OutputError;

pub struct FilterChain {
    replaygain: ReplayGainFilter,
    convert: ConvertFilter,
    autoconvert: AutoConvertFilter,
    remap: ChannelRemapFilter,
    volume: VolumeFilter,
    output_format: AudioFormat,
}

impl FilterChain {
    /// Build and configure a chain converting from `input` to the negotiated
    /// `output` format.
    pub fn build(
        input: AudioFormat,
        output: AudioFormat,
        rg_config: ReplayGainConfig,
        volume: SharedVolume,
    ) -> Result<Self, OutputError> {
        let mut replaygain = ReplayGainFilter::new(rg_config);
        let mut convert = ConvertFilter::new(output.sample_rate, output.format);
        let mut autoconvert = AutoConvertFilter::new(output);
        let mut remap = ChannelRemapFilter::new(output.channels);
        let mut volume_filter = VolumeFilter::new(volume);

        let f1 = replaygain.configure(input)?;
        let f2 = convert.configure(f1)?;
        let f3 = autoconvert.configure(f2)?;
        let f4 = remap.configure(f3)?;
        let f5 = volume_filter.configure(f4)?;

        Ok(Self {
            replaygain,
            convert,
            autoconvert,
            remap,
            volume: volume_filter,
            output_format: f5,
        })
    }

    pub fn output_format(&self) -> AudioFormat {
        self.output_format
    }

    pub fn update_replay_gain(&mut self, serial: u64, info: Option<player_plugin_api::ReplayGainInfo>) {
        self.replaygain.update(serial, info);
    }

    /// Run `input` (primary stream, already frame-aligned to the chain's
    /// configured input format) through the whole chain.
    pub fn process(&mut self, input: &[u8]) -> Result<Vec<u8>, OutputError> {
        let mut stage = Vec::new();
        self.replaygain.process(input, &mut stage)?;
        let stage1 = std::mem::take(&mut stage);
        self.convert.process(&stage1, &mut stage)?;
        let stage2 = std::mem::take(&mut stage);
        self.autoconvert.process(&stage2, &mut stage)?;
        let stage3 = std::mem::take(&mut stage);
        self.remap.process(&stage3, &mut stage)?;
        let stage4 = std::mem::take(&mut stage);
        self.volume.process(&stage4, &mut stage)?;
        Ok(stage)
    }

    pub fn flush(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        self.convert.flush(&mut out);
        self.autoconvert.flush(&mut out);
        out
    }

    pub fn reset(&mut self) {
        self.convert.reset();
        self.autoconvert.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use player_plugin_api::SampleFormat;

    #[test]
    fn chain_builds_and_passes_samples_through_unity_gain() {
        let input = AudioFormat::new(44_100, SampleFormat::S16, 2);
        let output = AudioFormat::new(44_100, SampleFormat::S16, 2);
        let mut chain = FilterChain::build(
            input,
            output,
            ReplayGainConfig::default(),
            SharedVolume::new(100),
        )
        .unwrap();
        assert_eq!(chain.output_format(), output);
        let data = vec![0x10, 0x20, 0x30, 0x40];
        let out = chain.process(&data).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn chain_remaps_channels_when_output_is_mono() {
        let input = AudioFormat::new(44_100, SampleFormat::S16, 2);
        let output = AudioFormat::new(44_100, SampleFormat::S16, 1);
        let mut chain = FilterChain::build(
            input,
            output,
            ReplayGainConfig::default(),
            SharedVolume::new(100),
        )
        .unwrap();
        assert_eq!(chain.output_format().channels, 1);
        let data = vec![0u8; 8]; // two stereo frames
        let out = chain.process(&data).unwrap();
        assert_eq!(out.len(), 4); // two mono frames
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The PCM filter chain applied on the output thread (§4.4).

mod autoconvert;
mod chain;
mod convert;
mod remap;
mod replaygain;
pub(crate) mod samples;
mod volume;

pub use autoconvert::AutoConvertFilter;
pub use chain::FilterChain;
pub use convert::ConvertFilter;
pub use remap::ChannelRemapFilter;
pub use replaygain::{ReplayGainConfig, ReplayGainFilter, ReplayGainMode};
pub use volume::{SharedVolume, VolumeFilter};

use player_plugin_api::AudioFormat;

use crate::error::OutputError;

/// One stage of the output filter chain. Stages are configured once when the
/// chain is (re)built for an output, then process chunk-sized byte slices for
/// the rest of the song (or until a format change forces a rebuild).
pub trait Filter: Send {
    /// Fix this stage's input format and return the format it will emit.
    /// Called once per chain build (§4.4 step 3: "configure each filter's
    /// input/output formats coherently").
    fn configure(&mut self, input: AudioFormat) -> Result<AudioFormat, OutputError>;

    /// Transform `input` (always frame-aligned for this stage's configured
    /// input format) and append the result to `out`.
    fn process(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), OutputError>;

    /// Flush any residue held inside the stage (e.g. a resampler's tail) into
    /// `out`. Called when the output is drained (§4.4 DRAIN).
    fn flush(&mut self, _out: &mut Vec<u8>) {}

    /// Drop any held residue without flushing it (§4.4 CANCEL).
    fn reset(&mut self) {}
}

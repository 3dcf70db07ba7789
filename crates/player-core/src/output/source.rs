// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Builds and drives the per-output filter chain (§4.4 "Output Source").

use std::sync::Arc;

use player_plugin_api::{AudioFormat, AudioOutput, ReplayGainInfo};

use crate::chunk::MusicBuffer;
use crate::error::OutputError;
use crate::filter::{FilterChain, ReplayGainConfig, SharedVolume};
use crate::pipe::MusicPipe;

/// Looks up the `ReplayGainInfo` current as of a chunk's `replay_gain_serial`
/// (§3.2: the serial, not the info itself, travels with the chunk).
pub type ReplayGainLookup = Arc<dyn Fn(u64) -> Option<ReplayGainInfo> + Send + Sync>;

pub struct OutputSource {
    chain: FilterChain,
    pipe: Arc<MusicPipe>,
    buffer: Arc<MusicBuffer>,
    replay_gain_lookup: ReplayGainLookup,
    residual: Vec<u8>,
}

impl OutputSource {
    /// Negotiate `output`'s actual format (it may clamp sample rate / format
    /// / channels, §4.4 step 2), then build and configure the filter chain
    /// against it (steps 1 and 3).
    pub fn open(
        pipe: Arc<MusicPipe>,
        buffer: Arc<MusicBuffer>,
        input_format: AudioFormat,
        output: &mut dyn AudioOutput,
        rg_config: ReplayGainConfig,
        volume: SharedVolume,
        replay_gain_lookup: ReplayGainLookup,
    ) -> Result<Self, OutputError> {
        let mut negotiated = input_format;
        output
            .open(&mut negotiated)
            .map_err(|e| OutputError::Io(e.to_string()))?;
        let chain = FilterChain::build(input_format, negotiated, rg_config, volume)?;
        Ok(Self {
            chain,
            pipe,
            buffer,
            replay_gain_lookup,
            residual: Vec::new(),
        })
    }

    pub fn output_format(&self) -> AudioFormat {
        self.chain.output_format()
    }

    pub fn has_pending(&self) -> bool {
        !self.residual.is_empty()
    }

    /// Pull the next chunk (if any) from the pipe through the filter chain
    /// into `residual`. Returns `false` when the pipe was empty and nothing
    /// new was produced.
    pub fn fill(&mut self) -> Result<bool, OutputError> {
        if !self.residual.is_empty() {
            return Ok(true);
        }
        let chunk = match self.pipe.shift() {
            Some(c) => c,
            None => return Ok(false),
        };
        let info = (self.replay_gain_lookup)(chunk.replay_gain_serial);
        self.chain.update_replay_gain(chunk.replay_gain_serial, info);
        let filtered = self.chain.process(chunk.as_bytes())?;
        self.residual = filtered;
        self.buffer.return_chunk(chunk);
        Ok(!self.residual.is_empty())
    }

    pub fn pending_bytes(&self) -> &[u8] {
        &self.residual
    }

    pub fn consume(&mut self, n: usize) {
        self.residual.drain(..n.min(self.residual.len()));
    }

    /// DRAIN: flush any filter-chain residue, appended after whatever is
    /// already pending.
    pub fn drain_residue(&mut self) {
        let flushed = self.chain.flush();
        self.residual.extend_from_slice(&flushed);
    }

    /// CANCEL: drop queued frames in the filter chain and the pipe, returning
    /// pipe chunks to the buffer.
    pub fn cancel(&mut self) {
        self.residual.clear();
        self.chain.reset();
        self.pipe.clear(&self.buffer);
    }

    pub fn pipe(&self) -> &Arc<MusicPipe> {
        &self.pipe
    }
}

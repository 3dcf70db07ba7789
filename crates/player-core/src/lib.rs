// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The player core: decoder bridges, the fixed-capacity chunk pipeline,
//! per-output filter chains, and the player thread that ties them together
//! into gapless and cross-fade playback.
//!
//! This crate owns no I/O of its own — opening files, network streams, and
//! audio devices is the embedding daemon's job, handed in through the
//! `player_plugin_api` traits. What lives here is the concurrency and state
//! machine around those plugins: command arbitration, buffer backpressure,
//! and the playback loop.

pub mod chunk;
pub mod decoder;
pub mod error;
pub mod filter;
pub mod output;
pub mod pipe;
pub mod player;

pub use chunk::{MusicBuffer, MusicChunk, CHUNK_CAPACITY};
pub use decoder::{DecoderBridge, DecoderControl, DecoderRegistry, DecoderState};
pub use error::{DecoderError, OutputError, PlayerError};
pub use filter::{FilterChain, ReplayGainConfig, ReplayGainMode, SharedVolume};
pub use output::{Output, OutputControl, ReplayGainLookup, DEFAULT_FAIL_TIMER};
pub use pipe::MusicPipe;
pub use player::{spawn, PlayerConfig, PlayerControl, StreamOpener};

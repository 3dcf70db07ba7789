// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Plugin ABI for the player core: the `AudioFormat` data model, the decoder
//! and output plugin vtables, and the `InputStream` interface they share.
//!
//! Plugins here are plain trait objects registered by name in a central table
//! at daemon startup (see `player-daemon::plugins`), not dynamically loaded
//! cdylibs — there is exactly one binary and every plugin ships inside it.

pub mod decoder;
pub mod error;
pub mod format;
pub mod input_stream;
pub mod output;
pub mod tag;

pub use decoder::{ConfigBlock, DecoderClient, DecoderCommand, DecoderPlugin, SubSong};
pub use error::{PluginApiError, PluginApiResult};
pub use format::{AudioFormat, SampleFormat, MAX_CHANNELS, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
pub use input_stream::InputStream;
pub use output::{AudioOutput, OutputPlugin};
pub use tag::{MixRampInfo, ReplayGainInfo, Tag, TagKind};

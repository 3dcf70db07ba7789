// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The decoder plugin vtable (§6.3) and the client callback surface the bridge
//! exposes to a running plugin (§4.1).

use std::time::Duration;

use crate::error::PluginApiResult;
use crate::format::AudioFormat;
use crate::input_stream::InputStream;
use crate::tag::{MixRampInfo, ReplayGainInfo, Tag};

/// Command word the player sets and a decoder observes at safe points (§3.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderCommand {
    None,
    Start,
    Stop,
    Seek,
}

/// A sub-track discovered inside a container file (e.g. one track of a CUE sheet).
#[derive(Debug, Clone)]
pub struct SubSong {
    pub start: Duration,
    pub end: Option<Duration>,
    pub tag: Tag,
}

/// Callbacks a decoder plugin invokes while it runs; implemented by the bridge
/// that hosts it (§4.1 "Client callbacks the plugin uses").
///
/// All methods are non-blocking from the plugin's point of view except
/// `submit_audio`, which may park the calling thread on buffer exhaustion —
/// that parking is the bridge's problem, not the plugin's.
pub trait DecoderClient: Send + Sync {
    /// First call a decode must make; locks in the format and enables submission.
    fn ready(&self, format: AudioFormat, seekable: bool, duration: Option<Duration>);

    /// Copy `data` into chunks stamped with the current timestamp; may block on
    /// buffer exhaustion. Returns the command in effect after submission.
    fn submit_audio(&self, data: &[u8], kbit_rate: Option<u32>) -> DecoderCommand;

    /// Override the timestamp that will be stamped on the next submitted chunk.
    fn submit_timestamp(&self, t: Duration);

    /// Attach a tag to the next chunk boundary.
    fn submit_tag(&self, tag: Tag) -> DecoderCommand;

    fn submit_replay_gain(&self, info: Option<ReplayGainInfo>);

    fn submit_mix_ramp(&self, info: MixRampInfo);

    fn get_command(&self) -> DecoderCommand;

    /// Acknowledge completion of a START or SEEK command.
    fn command_finished(&self);

    fn get_seek_time(&self) -> Option<Duration>;

    fn get_seek_frame(&self) -> Option<u64>;

    /// Report that a seek failed; clears SEEK without repositioning.
    fn seek_error(&self);

    /// Open a nested stream, used by container decoders.
    fn open_uri(&self, uri: &str) -> PluginApiResult<Box<dyn InputStream>>;

    /// Cooperative read that returns early (0 bytes, command observable via
    /// `get_command`) on STOP/SEEK instead of blocking to EOF.
    fn read(&self, stream: &mut dyn InputStream, dest: &mut [u8]) -> PluginApiResult<usize>;
}

/// Opaque plugin configuration; the daemon owns the TOML table this wraps.
#[derive(Debug, Clone, Default)]
pub struct ConfigBlock {
    values: std::collections::BTreeMap<String, String>,
}

impl ConfigBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// A decoder plugin: zero or more of `stream_decode`/`file_decode`/`uri_decode`,
/// plus init/finish hooks and the suffix/MIME registration data the selection
/// algorithm (§4.1) uses.
pub trait DecoderPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn init(&mut self, _config: &ConfigBlock) -> PluginApiResult<()> {
        Ok(())
    }

    fn finish(&mut self) {}

    /// Decode a remote/streamed URI already opened as an `InputStream`.
    fn stream_decode(
        &self,
        _client: &dyn DecoderClient,
        _input: &mut dyn InputStream,
    ) -> PluginApiResult<()> {
        Err(crate::error::PluginApiError::UnsupportedFormat(
            "stream_decode not implemented".into(),
        ))
    }

    /// Decode a local-filesystem-only URI, for codecs whose bindings insist on a path.
    fn file_decode(&self, _client: &dyn DecoderClient, _path: &std::path::Path) -> PluginApiResult<()> {
        Err(crate::error::PluginApiError::UnsupportedFormat(
            "file_decode not implemented".into(),
        ))
    }

    /// List the virtual sub-tracks of a multi-song container file.
    fn container_scan(&self, _path: &std::path::Path) -> PluginApiResult<Vec<SubSong>> {
        Ok(Vec::new())
    }

    /// Case-insensitive file extensions this plugin claims, without the dot.
    fn suffixes(&self) -> &[&str] {
        &[]
    }

    fn mime_types(&self) -> &[&str] {
        &[]
    }
}

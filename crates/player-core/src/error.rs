// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-subsystem error enums (§7, SPEC §6.6b). `Interrupted` and buffer
//! exhaustion are deliberately not error variants here — §7 classifies both
//! as silent, cooperative control flow, not failures.

use thiserror::Error;

use player_plugin_api::PluginApiError;

#[derive(Debug, Error)]
pub enum DecoderError {
    #[error("no plugin could decode {uri}")]
    PluginUnavailable { uri: String },

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error decoding {uri}: {source}")]
    Io {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("seek failed: {0}")]
    SeekError(String),
}

impl DecoderError {
    /// Translate a plugin-reported error into the bridge's own error kind,
    /// tagging it with the song URI the decoder was running against.
    pub fn from_plugin(uri: &str, err: PluginApiError) -> Self {
        match err {
            PluginApiError::PluginUnavailable(_) => DecoderError::PluginUnavailable {
                uri: uri.to_string(),
            },
            PluginApiError::UnsupportedFormat(msg) => DecoderError::UnsupportedFormat(msg),
            PluginApiError::Io(source) => DecoderError::Io {
                uri: uri.to_string(),
                source,
            },
            PluginApiError::SeekError(msg) => DecoderError::SeekError(msg),
            // Interrupted is cooperative cancellation (§7), never reached here:
            // callers check `is_interrupted()` before converting.
            PluginApiError::Interrupted => DecoderError::SeekError("interrupted".into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("plugin unavailable: {0}")]
    PluginUnavailable(String),

    #[error("output cannot negotiate format {0}")]
    UnsupportedFormat(String),

    #[error("device I/O error: {0}")]
    Io(String),
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("decoder error: {0}")]
    Decoder(#[from] DecoderError),

    #[error("all outputs failed")]
    AllOutputsFailed,

    #[error("queue exhausted")]
    QueueExhausted,
}

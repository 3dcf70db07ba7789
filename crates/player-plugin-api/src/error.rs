// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error kinds plugins report back across the client callback boundary.

use thiserror::Error;

/// Errors a decoder or output plugin implementation may report.
///
/// `Interrupted` is deliberately part of this enum rather than a bare `bool`
/// return so that `?` composes through plugin code, but callers must treat it
/// as a benign control-flow signal (§7: "Interrupted ... Silent; not an
/// error"), never log it as a failure.
#[derive(Debug, Error)]
pub enum PluginApiError {
    #[error("plugin unavailable: {0}")]
    PluginUnavailable(String),

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("seek failed: {0}")]
    SeekError(String),

    /// Cooperative cancellation reached a plugin upcall; not a failure.
    #[error("interrupted")]
    Interrupted,
}

impl PluginApiError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, PluginApiError::Interrupted)
    }
}

pub type PluginApiResult<T> = Result<T, PluginApiError>;

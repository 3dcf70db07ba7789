// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The snapshot struct published by the player under its mutex (§4.3
//! "Status publication") and read by clients via `PlayerControl::get_status`.

use std::time::Duration;

use player_plugin_api::AudioFormat;

use crate::command::PlayerState;
use crate::song::SongRef;

/// Per-output fragment of the snapshot; `last_error` is the §9 addition that
/// lets a client see a failed output without a second round-trip.
#[derive(Debug, Clone)]
pub struct OutputStatus {
    pub name: String,
    pub enabled: bool,
    pub really_enabled: bool,
    pub open: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Status {
    pub state: PlayerState,
    pub current_song: Option<SongRef>,
    pub elapsed: Duration,
    pub duration: Option<Duration>,
    pub bit_rate: Option<u32>,
    pub audio_format: Option<AudioFormat>,
    pub error: Option<String>,
    pub outputs: Vec<OutputStatus>,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            state: PlayerState::Stop,
            current_song: None,
            elapsed: Duration::ZERO,
            duration: None,
            bit_rate: None,
            audio_format: None,
            error: None,
            outputs: Vec::new(),
        }
    }
}

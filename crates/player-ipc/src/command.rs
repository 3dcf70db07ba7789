// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command vocabularies observed by the player thread (§3.7) and by each
//! output thread (§3.8).

use std::time::Duration;

use crate::song::SongRef;

/// Set by any client thread, observed by the player thread.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    None,
    Exit,
    Stop,
    Pause(bool),
    Seek { song: SongRef, time: Duration },
    CloseAudio,
    UpdateAudio,
    /// Become PLAY on the given song now, interrupting/replacing whatever is
    /// currently playing or queued (§6.1 `Play(SongRef)`).
    Play(SongRef),
    /// Queue a song for gap-less follow-on; starts immediately only if
    /// nothing is currently playing (§6.1 `EnqueueSong`/`Next`).
    Queue(SongRef),
    Cancel,
    /// Non-blocking: lets the player publish a fresh status snapshot.
    Refresh,
}

impl Default for PlayerCommand {
    fn default() -> Self {
        PlayerCommand::None
    }
}

/// Set by the player (or by `OutputControl` on the client's behalf), observed
/// by one output thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCommand {
    None,
    Enable,
    Disable,
    Open,
    Close,
    Pause,
    Release,
    Drain,
    Cancel,
    Kill,
}

impl Default for OutputCommand {
    fn default() -> Self {
        OutputCommand::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Stop,
    Pause,
    Play,
}

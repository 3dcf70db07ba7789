// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! `PlayerControl`: the external §6.1 method surface, a thin wrapper over
//! [`PlayerSync`]'s command arbitration.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use player_ipc::{PlayerCommand, SongRef, Status};

use super::state::PlayerSync;

pub struct PlayerControl {
    sync: Arc<PlayerSync>,
    handle: Option<JoinHandle<()>>,
}

impl PlayerControl {
    pub(crate) fn new(sync: Arc<PlayerSync>, handle: JoinHandle<()>) -> Self {
        Self {
            sync,
            handle: Some(handle),
        }
    }

    pub(crate) fn sync(&self) -> &Arc<PlayerSync> {
        &self.sync
    }

    /// Become PLAY on `song`; interrupts/replaces whatever is currently
    /// playing or queued and starts `song` now. Waits until accepted.
    pub fn play(&self, song: SongRef) {
        self.sync.issue(PlayerCommand::Play(song));
    }

    /// Queue a song for gap-less follow-on.
    pub fn next(&self, song: SongRef) {
        self.sync.issue(PlayerCommand::Queue(song));
    }

    /// Alias for `next`, matching §6.1's separate `EnqueueSong` entry — both
    /// hand the player the next song; whether it starts immediately depends
    /// on the current state, decided by the player thread.
    pub fn enqueue_song(&self, song: SongRef) {
        self.next(song);
    }

    /// Become STOP; blocks until outputs drained/cancelled.
    pub fn stop(&self) {
        self.sync.issue(PlayerCommand::Stop);
    }

    pub fn pause(&self) {
        self.set_pause(true);
    }

    pub fn set_pause(&self, pause: bool) {
        self.sync.issue(PlayerCommand::Pause(pause));
    }

    pub fn seek(&self, song: SongRef, time: Duration) {
        self.sync.issue(PlayerCommand::Seek { song, time });
    }

    pub fn cancel(&self) {
        self.sync.issue(PlayerCommand::Cancel);
    }

    pub fn get_status(&self) -> Status {
        self.sync.status()
    }

    /// Tag update for the currently playing song; modeled as a non-blocking
    /// status-only mutation rather than a full command round-trip, since it
    /// never changes playback state.
    pub fn lock_set_tagged_song(&self, song: &SongRef) {
        self.sync.with_status_mut(|status| {
            if let Some(current) = &status.current_song {
                if current.is_same_song(song) {
                    status.current_song = Some(song.clone());
                }
            }
        });
    }

    pub fn exit(mut self) {
        self.sync.issue(PlayerCommand::Exit);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PlayerControl {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.sync.issue(PlayerCommand::Exit);
            let _ = handle.join();
        }
    }
}

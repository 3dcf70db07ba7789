// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! `PlayerControl`: command arbitration and status publication (§4.3,
//! §5 `player_mutex`).

use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use player_ipc::{PlayerCommand, PlayerState, Status};

/// Guards the command word and the published [`Status`] snapshot. Each
/// command acquires the mutex, sets the word, signals `wake_cond`, then waits
/// on `client_cond` until the player acks by resetting the word to `None`
/// (§4.3 "Command arbitration") — except `Refresh`, which is fire-and-forget.
pub struct PlayerSync {
    inner: Mutex<Inner>,
    client_cond: Condvar,
    wake_cond: Condvar,
}

struct Inner {
    command: PlayerCommand,
    status: Status,
}

impl Default for PlayerSync {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerSync {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                command: PlayerCommand::None,
                status: Status::default(),
            }),
            client_cond: Condvar::new(),
            wake_cond: Condvar::new(),
        }
    }

    /// Post a command and block until the player thread acknowledges it, by
    /// resetting the command word back to `None`. `Refresh` never blocks.
    pub fn issue(&self, command: PlayerCommand) {
        let non_blocking = matches!(command, PlayerCommand::Refresh);
        {
            let mut inner = self.inner.lock();
            inner.command = command;
        }
        self.wake_cond.notify_all();
        if non_blocking {
            return;
        }
        let mut inner = self.inner.lock();
        while inner.command != PlayerCommand::None {
            self.client_cond.wait(&mut inner);
        }
    }

    pub fn status(&self) -> Status {
        self.inner.lock().status.clone()
    }

    // --- player-thread side ------------------------------------------------------------

    pub fn take_command(&self) -> PlayerCommand {
        std::mem::replace(&mut self.inner.lock().command, PlayerCommand::None)
    }

    pub fn ack(&self) {
        self.client_cond.notify_all();
    }

    pub fn with_status_mut(&self, f: impl FnOnce(&mut Status)) {
        let mut inner = self.inner.lock();
        f(&mut inner.status);
        drop(inner);
        self.client_cond.notify_all();
    }

    pub fn state(&self) -> PlayerState {
        self.inner.lock().status.state
    }

    /// Park the player thread until a command arrives, `timeout` elapses, or
    /// it's woken for another reason (cross-fade window, expiry polling).
    pub fn wait_for_wake(&self, timeout: Duration) {
        let mut inner = self.inner.lock();
        if inner.command != PlayerCommand::None {
            return;
        }
        self.wake_cond.wait_for(&mut inner, timeout);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-output command/flag state (§3.8, §5 `output_mutex`).

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use player_ipc::OutputCommand;
use player_plugin_api::AudioFormat;

struct Inner {
    enabled: bool,
    really_enabled: bool,
    open: bool,
    playing: bool,
    /// Whether the output is currently permitted to deliver frames; toggled
    /// directly by the player on pause/resume rather than through the
    /// command/ack protocol, since it changes far more often than a command
    /// round-trip justifies and has no failure mode to acknowledge.
    allow_play: bool,
    command: OutputCommand,
    audio_format: Option<AudioFormat>,
    last_error: Option<String>,
    fail_at: Option<Instant>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            enabled: false,
            really_enabled: false,
            open: false,
            playing: false,
            allow_play: true,
            command: OutputCommand::None,
            audio_format: None,
            last_error: None,
            fail_at: None,
        }
    }
}

/// One output's command word and flags, shared between the player (or
/// whatever issues commands) and the output's worker thread.
///
/// Invariant enforced by construction of every state transition in this type:
/// `open ⇒ really_enabled ⇒ enabled`, `playing ⇒ open` (§3.8).
pub struct OutputControl {
    inner: Mutex<Inner>,
    wake_cond: Condvar,
    client_cond: Condvar,
}

impl Default for OutputControl {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputControl {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            wake_cond: Condvar::new(),
            client_cond: Condvar::new(),
        }
    }

    // --- client-side: post a command and wait for the ack ---------------------------

    fn post(&self, command: OutputCommand) {
        let mut inner = self.inner.lock();
        inner.command = command;
        drop(inner);
        self.wake_cond.notify_all();
    }

    pub fn wait_acked(&self) {
        let mut inner = self.inner.lock();
        while inner.command != OutputCommand::None {
            self.client_cond.wait(&mut inner);
        }
    }

    /// All commands except `Kill` block until acknowledged (§6.2).
    pub fn send(&self, command: OutputCommand) {
        self.post(command);
        if command != OutputCommand::Kill {
            self.wait_acked();
        }
    }

    pub fn enabled(&self) -> bool {
        self.inner.lock().enabled
    }

    pub fn really_enabled(&self) -> bool {
        self.inner.lock().really_enabled
    }

    pub fn open(&self) -> bool {
        self.inner.lock().open
    }

    pub fn playing(&self) -> bool {
        self.inner.lock().playing
    }

    pub fn audio_format(&self) -> Option<AudioFormat> {
        self.inner.lock().audio_format
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }

    /// Whether `fail_timer` (default 10s, §5) has elapsed and a retry ENABLE
    /// should be attempted.
    pub fn retry_due(&self) -> bool {
        self.inner
            .lock()
            .fail_at
            .map(|at| Instant::now() >= at)
            .unwrap_or(false)
    }

    // --- worker-side: observe commands, update flags, ack ----------------------------

    pub fn get_command(&self) -> OutputCommand {
        self.inner.lock().command
    }

    pub fn ack(&self) {
        let mut inner = self.inner.lock();
        inner.command = OutputCommand::None;
        drop(inner);
        self.client_cond.notify_all();
    }

    pub fn set_enabled(&self, enabled: bool) {
        let mut inner = self.inner.lock();
        inner.enabled = enabled;
        if !enabled {
            inner.really_enabled = false;
            inner.open = false;
            inner.playing = false;
        }
    }

    pub fn set_really_enabled(&self, v: bool) {
        let mut inner = self.inner.lock();
        inner.really_enabled = v;
        if !v {
            inner.open = false;
            inner.playing = false;
        }
    }

    pub fn set_open(&self, v: bool, format: Option<AudioFormat>) {
        let mut inner = self.inner.lock();
        inner.open = v;
        if v {
            inner.audio_format = format;
        } else {
            inner.playing = false;
        }
    }

    pub fn set_playing(&self, v: bool) {
        self.inner.lock().playing = v;
    }

    pub fn allow_play(&self) -> bool {
        self.inner.lock().allow_play
    }

    /// Toggle play permission directly, bypassing the command/ack protocol
    /// (real-time pause/resume, not a discrete worker transition).
    pub fn set_allow_play(&self, v: bool) {
        let mut inner = self.inner.lock();
        inner.allow_play = v;
        drop(inner);
        self.wake_cond.notify_all();
    }

    pub fn report_failure(&self, message: String, retry_after: Duration) {
        let mut inner = self.inner.lock();
        inner.last_error = Some(message);
        inner.open = false;
        inner.playing = false;
        inner.really_enabled = false;
        inner.fail_at = Some(Instant::now() + retry_after);
    }

    pub fn clear_failure(&self) {
        let mut inner = self.inner.lock();
        inner.last_error = None;
        inner.fail_at = None;
    }

    pub fn wait_for_command(&self, timeout: Duration) {
        let mut inner = self.inner.lock();
        if inner.command != OutputCommand::None {
            return;
        }
        self.wake_cond.wait_for(&mut inner, timeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_open_implies_really_enabled() {
        let ctl = OutputControl::new();
        ctl.set_enabled(true);
        ctl.set_really_enabled(true);
        ctl.set_open(true, None);
        assert!(ctl.open());
        assert!(ctl.really_enabled());
        assert!(ctl.enabled());
    }

    #[test]
    fn disabling_cascades_to_open_and_playing() {
        let ctl = OutputControl::new();
        ctl.set_enabled(true);
        ctl.set_really_enabled(true);
        ctl.set_open(true, None);
        ctl.set_playing(true);
        ctl.set_enabled(false);
        assert!(!ctl.open());
        assert!(!ctl.playing());
        assert!(!ctl.really_enabled());
    }
}

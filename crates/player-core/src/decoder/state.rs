// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Shared state between the player thread and a decoder bridge thread
//! (§3.6, §5 `decoder_mutex`).

use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use player_plugin_api::{AudioFormat, DecoderCommand, MixRampInfo, ReplayGainInfo, Tag};

use crate::error::DecoderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Stop,
    Start,
    Decode,
}

#[derive(Default)]
struct Inner {
    state_is_decode: bool,
    state_is_start: bool,
    command: DecoderCommand,
    seek_time: Option<Duration>,
    audio_format: Option<AudioFormat>,
    seekable: bool,
    duration: Option<Duration>,
    tag: Option<Tag>,
    replay_gain: Option<ReplayGainInfo>,
    replay_gain_serial: u64,
    mix_ramp: Option<MixRampInfo>,
    error: Option<String>,
}

/// Guards a `DecoderBridge`'s command/state and the buffer-full condition
/// (§5). `wake_cond` carries player → decoder signals (SEEK/STOP); `client_cond`
/// carries decoder → player signals (Ready, data available, command acked).
pub struct DecoderControl {
    inner: Mutex<Inner>,
    wake_cond: Condvar,
    client_cond: Condvar,
}

impl Default for DecoderControl {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderControl {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            wake_cond: Condvar::new(),
            client_cond: Condvar::new(),
        }
    }

    pub fn state(&self) -> DecoderState {
        let inner = self.inner.lock();
        if inner.state_is_decode {
            DecoderState::Decode
        } else if inner.state_is_start {
            DecoderState::Start
        } else {
            DecoderState::Stop
        }
    }

    // --- player-side: issue commands -------------------------------------------------

    pub fn request_start(&self) {
        let mut inner = self.inner.lock();
        inner.state_is_start = true;
        inner.state_is_decode = false;
        inner.command = DecoderCommand::Start;
        self.wake_cond.notify_all();
    }

    pub fn request_stop(&self) {
        let mut inner = self.inner.lock();
        inner.command = DecoderCommand::Stop;
        self.wake_cond.notify_all();
    }

    pub fn request_seek(&self, time: Duration) {
        let mut inner = self.inner.lock();
        inner.seek_time = Some(time);
        inner.command = DecoderCommand::Seek;
        self.wake_cond.notify_all();
    }

    /// Block until the current command returns to `None` (acknowledged).
    pub fn wait_command_finished(&self) {
        let mut inner = self.inner.lock();
        while inner.command != DecoderCommand::None {
            self.client_cond.wait(&mut inner);
        }
    }

    pub fn wait_ready(&self, timeout: Duration) -> bool {
        let mut inner = self.inner.lock();
        if inner.state_is_decode || inner.error.is_some() {
            return true;
        }
        !self.client_cond.wait_for(&mut inner, timeout).timed_out()
    }

    // --- bridge-side: observe/ack commands, publish facts ----------------------------

    pub fn get_command(&self) -> DecoderCommand {
        self.inner.lock().command
    }

    pub fn command_finished(&self) {
        let mut inner = self.inner.lock();
        inner.command = DecoderCommand::None;
        inner.state_is_start = false;
        inner.seek_time = None;
        drop(inner);
        self.client_cond.notify_all();
    }

    /// Peek the pending seek target without consuming it; cleared by
    /// `command_finished`/`seek_error`.
    pub fn seek_time(&self) -> Option<Duration> {
        self.inner.lock().seek_time
    }

    pub fn seek_frame(&self) -> Option<u64> {
        let inner = self.inner.lock();
        let time = inner.seek_time?;
        let rate = inner.audio_format?.sample_rate as f64;
        Some((time.as_secs_f64() * rate) as u64)
    }

    pub fn seek_error(&self) {
        let mut inner = self.inner.lock();
        inner.command = DecoderCommand::None;
        inner.seek_time = None;
        drop(inner);
        self.client_cond.notify_all();
    }

    pub fn set_ready(&self, format: AudioFormat, seekable: bool, duration: Option<Duration>) {
        let mut inner = self.inner.lock();
        inner.state_is_decode = true;
        inner.state_is_start = false;
        inner.audio_format = Some(format);
        inner.seekable = seekable;
        inner.duration = duration;
        drop(inner);
        self.client_cond.notify_all();
    }

    pub fn set_tag(&self, tag: Tag) {
        self.inner.lock().tag = Some(tag);
    }

    pub fn take_tag(&self) -> Option<Tag> {
        self.inner.lock().tag.take()
    }

    pub fn set_replay_gain(&self, info: Option<ReplayGainInfo>) {
        let mut inner = self.inner.lock();
        inner.replay_gain = info;
        inner.replay_gain_serial += 1;
    }

    pub fn replay_gain(&self) -> (u64, Option<ReplayGainInfo>) {
        let inner = self.inner.lock();
        (inner.replay_gain_serial, inner.replay_gain)
    }

    pub fn set_mix_ramp(&self, info: MixRampInfo) {
        self.inner.lock().mix_ramp = Some(info);
    }

    pub fn mix_ramp(&self) -> Option<MixRampInfo> {
        self.inner.lock().mix_ramp.clone()
    }

    pub fn audio_format(&self) -> Option<AudioFormat> {
        self.inner.lock().audio_format
    }

    pub fn duration(&self) -> Option<Duration> {
        self.inner.lock().duration
    }

    pub fn seekable(&self) -> bool {
        self.inner.lock().seekable
    }

    pub fn set_finished(&self) {
        let mut inner = self.inner.lock();
        inner.state_is_decode = false;
        inner.state_is_start = false;
        drop(inner);
        self.client_cond.notify_all();
    }

    pub fn set_error(&self, err: &DecoderError) {
        let mut inner = self.inner.lock();
        inner.error = Some(err.to_string());
        inner.state_is_decode = false;
        inner.state_is_start = false;
        drop(inner);
        self.client_cond.notify_all();
    }

    pub fn take_error(&self) -> Option<String> {
        self.inner.lock().error.take()
    }

    /// Park the bridge thread on `wake_cond` until the player sets a command
    /// or `timeout` elapses.
    pub fn wait_for_command(&self, timeout: Duration) {
        let mut inner = self.inner.lock();
        if inner.command != DecoderCommand::None {
            return;
        }
        self.wake_cond.wait_for(&mut inner, timeout);
    }
}

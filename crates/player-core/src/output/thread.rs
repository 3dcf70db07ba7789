// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The output worker: one thread per configured output, running the §4.4
//! playback loop and command table.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use player_ipc::OutputCommand;
use player_plugin_api::{AudioFormat, AudioOutput};
use tracing::{debug, error, warn};

use crate::chunk::MusicBuffer;
use crate::error::OutputError;
use crate::filter::{ReplayGainConfig, SharedVolume};
use crate::pipe::MusicPipe;

use super::source::{OutputSource, ReplayGainLookup};
use super::state::OutputControl;

/// Default `fail_timer` before a re-ENABLE is attempted after device loss
/// (§4.4, §5).
pub const DEFAULT_FAIL_TIMER: Duration = Duration::from_secs(10);

struct PendingOpen {
    pipe: Arc<MusicPipe>,
    buffer: Arc<MusicBuffer>,
    input_format: AudioFormat,
    rg_config: ReplayGainConfig,
    volume: SharedVolume,
    replay_gain_lookup: ReplayGainLookup,
}

/// One configured output: its plugin-backed driver, its command/flag state,
/// and the worker thread driving both.
pub struct Output {
    name: String,
    control: Arc<OutputControl>,
    pending_open: Arc<Mutex<Option<PendingOpen>>>,
    handle: Option<JoinHandle<()>>,
}

impl Output {
    pub fn spawn(name: impl Into<String>, mut driver: Box<dyn AudioOutput>) -> Self {
        let name = name.into();
        let control = Arc::new(OutputControl::new());
        let pending_open: Arc<Mutex<Option<PendingOpen>>> = Arc::new(Mutex::new(None));

        let thread_control = control.clone();
        let thread_pending = pending_open.clone();
        let thread_name = name.clone();

        let handle = thread::Builder::new()
            .name(format!("output:{name}"))
            .spawn(move || run(thread_name, driver.as_mut(), thread_control, thread_pending))
            .expect("failed to spawn output thread");

        Self {
            name,
            control,
            pending_open,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn control(&self) -> &Arc<OutputControl> {
        &self.control
    }

    pub fn enable(&self) {
        self.control.send(OutputCommand::Enable);
    }

    pub fn disable(&self) {
        self.control.send(OutputCommand::Disable);
    }

    pub fn open(
        &self,
        pipe: Arc<MusicPipe>,
        buffer: Arc<MusicBuffer>,
        input_format: AudioFormat,
        rg_config: ReplayGainConfig,
        volume: SharedVolume,
        replay_gain_lookup: ReplayGainLookup,
    ) {
        *self.pending_open.lock() = Some(PendingOpen {
            pipe,
            buffer,
            input_format,
            rg_config,
            volume,
            replay_gain_lookup,
        });
        self.control.send(OutputCommand::Open);
    }

    pub fn close(&self) {
        self.control.send(OutputCommand::Close);
    }

    /// Enter paused state: blocks until the worker acknowledges that it has
    /// switched to silence-maintenance. Resuming is not a command (§6.2 lists
    /// no explicit unpause) — it's the `allow_play` flag the player toggles
    /// directly via [`resume`](Self::resume), matching how often pause state
    /// actually changes versus how a command round-trip is costed.
    pub fn pause(&self) {
        self.control.set_allow_play(false);
        self.control.send(OutputCommand::Pause);
    }

    /// Resume playback after `pause()`; does not block on a worker ack since
    /// there is no failure mode to report.
    pub fn resume(&self) {
        self.control.set_allow_play(true);
    }

    pub fn release(&self) {
        self.control.send(OutputCommand::Release);
    }

    pub fn drain(&self) {
        self.control.send(OutputCommand::Drain);
    }

    pub fn cancel(&self) {
        self.control.send(OutputCommand::Cancel);
    }

    /// Fire-and-forget-then-join (§6.2).
    pub fn kill(mut self) {
        self.control.send(OutputCommand::Kill);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn last_error(&self) -> Option<String> {
        self.control.last_error()
    }

    pub fn audio_format(&self) -> Option<AudioFormat> {
        self.control.audio_format()
    }
}

fn run(
    name: String,
    driver: &mut dyn AudioOutput,
    control: Arc<OutputControl>,
    pending_open: Arc<Mutex<Option<PendingOpen>>>,
) {
    let mut source: Option<OutputSource> = None;

    loop {
        let cmd = control.get_command();
        if cmd == OutputCommand::None {
            let playable = control.open() && control.allow_play() && source.is_some();
            if !playable {
                control.wait_for_command(Duration::from_millis(200));
                if control.open() && !control.allow_play() {
                    if !driver.pause() {
                        control.report_failure("pause failed".into(), DEFAULT_FAIL_TIMER);
                    }
                } else if control.enabled() && !control.really_enabled() && control.retry_due() {
                    control.send_self_enable(driver);
                }
                continue;
            }
            if !play_one_iteration(driver, source.as_mut().unwrap(), &control, &name) {
                // Source drained; nothing to write this iteration.
                continue;
            }
            continue;
        }

        match cmd {
            OutputCommand::None => unreachable!(),
            OutputCommand::Enable => {
                match driver.enable() {
                    Ok(()) => {
                        control.set_enabled(true);
                        control.set_really_enabled(true);
                        control.clear_failure();
                        debug!(output = name, "enabled");
                    }
                    Err(e) => {
                        warn!(output = name, error = %e, "enable failed, will retry");
                        control.report_failure(e.to_string(), DEFAULT_FAIL_TIMER);
                    }
                }
                control.ack();
            }
            OutputCommand::Disable => {
                if source.is_some() {
                    driver.close();
                    source = None;
                }
                driver.disable();
                control.set_really_enabled(false);
                control.set_enabled(false);
                control.ack();
            }
            OutputCommand::Open => {
                let opened = pending_open.lock().take();
                match opened {
                    Some(p) => match OutputSource::open(
                        p.pipe,
                        p.buffer,
                        p.input_format,
                        driver,
                        p.rg_config,
                        p.volume,
                        p.replay_gain_lookup,
                    ) {
                        Ok(src) => {
                            control.set_open(true, Some(src.output_format()));
                            control.set_allow_play(true);
                            source = Some(src);
                            control.clear_failure();
                        }
                        Err(e) => {
                            error!(output = name, error = %e, "open failed");
                            control.report_failure(e.to_string(), DEFAULT_FAIL_TIMER);
                        }
                    },
                    None => warn!(output = name, "OPEN with no pending configuration"),
                }
                control.ack();
            }
            OutputCommand::Close => {
                driver.close();
                source = None;
                control.set_open(false, None);
                control.ack();
            }
            OutputCommand::Pause => {
                // `allow_play` is already false (set by the client before
                // posting this command); device-activity maintenance happens
                // generically in the idle branch above. This just
                // acknowledges the transition.
                control.ack();
            }
            OutputCommand::Release => {
                driver.close();
                source = None;
                control.set_open(false, None);
                control.ack();
            }
            OutputCommand::Drain => {
                if let Some(src) = source.as_mut() {
                    src.drain_residue();
                    while src.has_pending() {
                        let bytes = src.pending_bytes();
                        match driver.play(bytes) {
                            Ok(n) if n > 0 => src.consume(n),
                            _ => break,
                        }
                    }
                }
                if let Err(e) = driver.drain() {
                    warn!(output = name, error = %e, "drain failed");
                }
                control.ack();
            }
            OutputCommand::Cancel => {
                if let Some(src) = source.as_mut() {
                    src.cancel();
                }
                driver.cancel();
                control.ack();
            }
            OutputCommand::Kill => {
                driver.disable();
                control.ack();
                return;
            }
        }
    }
}

/// One pass of the §4.4 playback loop body: fill from the pipe if needed,
/// hand bytes to `Play()`, and honor `Delay()` back-pressure.
fn play_one_iteration(
    driver: &mut dyn AudioOutput,
    src: &mut OutputSource,
    control: &OutputControl,
    name: &str,
) -> bool {
    match src.fill() {
        Ok(false) => false,
        Ok(true) => {
            let bytes = src.pending_bytes();
            if bytes.is_empty() {
                return false;
            }
            match driver.play(bytes) {
                Ok(n) => {
                    src.consume(n);
                    control.set_playing(true);
                    let delay = driver.delay();
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    true
                }
                Err(e) if e.is_interrupted() => false,
                Err(e) => {
                    error!(output = name, error = %e, "play failed, output disabled");
                    control.report_failure(e.to_string(), DEFAULT_FAIL_TIMER);
                    false
                }
            }
        }
        Err(e) => {
            error!(output = name, error = %e, "filter chain failed");
            control.report_failure(e.to_string(), DEFAULT_FAIL_TIMER);
            false
        }
    }
}

impl OutputControl {
    /// Internal retry hook used by the idle branch of the playback loop: not
    /// part of the §6.2 client surface, just the worker re-attempting ENABLE
    /// after `fail_timer` elapses.
    fn send_self_enable(&self, driver: &mut dyn AudioOutput) {
        match driver.enable() {
            Ok(()) => {
                self.set_enabled(true);
                self.set_really_enabled(true);
                self.clear_failure();
            }
            Err(e) => {
                self.report_failure(e.to_string(), DEFAULT_FAIL_TIMER);
            }
        }
    }
}

impl Drop for Output {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.control.send(OutputCommand::Kill);
            let _ = handle.join();
        }
    }
}

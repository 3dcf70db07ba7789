// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The player thread: command handling, decoder bridge lifecycle, gapless and
//! cross-fade song transitions, and status publication (§4.3).

use std::cell::Cell;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use player_ipc::{OutputStatus, PlayerCommand, PlayerState, SongRef};
use player_plugin_api::{AudioFormat, InputStream};
use tracing::warn;

use crate::chunk::MusicBuffer;
use crate::decoder::{DecoderBridge, DecoderRegistry, DecoderState};
use crate::error::DecoderError;
use crate::filter::{ReplayGainConfig, SharedVolume};
use crate::output::{Output, ReplayGainLookup};
use crate::pipe::MusicPipe;

use super::control::PlayerControl;
use super::crossfade;
use super::state::PlayerSync;

/// Opens a non-local URI into a readable stream; local files go straight to
/// `DecoderPlugin::file_decode` and never need this. External I/O is the
/// daemon's concern (§1), so the player thread only holds a handle to it.
pub type StreamOpener =
    Arc<dyn Fn(&str) -> Result<Box<dyn InputStream>, DecoderError> + Send + Sync>;

#[derive(Clone)]
pub struct PlayerConfig {
    pub crossfade: Duration,
    pub replaygain: ReplayGainConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            crossfade: Duration::ZERO,
            replaygain: ReplayGainConfig::default(),
        }
    }
}

/// How long a freshly spawned decoder bridge gets to call `Ready` before its
/// plugin is judged a dud and the next §4.1 candidate is tried.
const DECODE_READY_TIMEOUT: Duration = Duration::from_secs(2);

struct ActiveSong {
    song: SongRef,
    bridge: DecoderBridge,
    /// Timestamp of the most recently forwarded chunk; used to derive how
    /// much of the song is left to play (§4.3 cross-fade/pre-start
    /// triggers), since the decoder→player pipe itself is drained on almost
    /// every tick and its byte count says nothing about time remaining.
    last_timestamp: Cell<Duration>,
}

struct OutputSlot {
    output: Arc<Output>,
    pipe: Arc<MusicPipe>,
}

fn is_local(uri: &str) -> bool {
    !uri.contains("://") || uri.starts_with("file://")
}

/// §4.1 step 2: try every plugin that claims this URI, in order, spawning a
/// bridge and waiting for it to call `Ready`; fall through to the next
/// candidate if it doesn't (or reports an error) before committing to it.
fn start_song(
    registry: &DecoderRegistry,
    opener: &StreamOpener,
    buffer: &Arc<MusicBuffer>,
    song: SongRef,
) -> Result<ActiveSong, DecoderError> {
    let uri = song.uri().to_string();
    let candidates = registry.candidates(&uri, None);
    if candidates.is_empty() {
        return Err(DecoderError::PluginUnavailable { uri: uri.clone() });
    }
    let input = if is_local(&uri) {
        None
    } else {
        Some(opener(&uri)?)
    };
    // Only the first candidate gets the pre-opened stream; a stream isn't
    // `Clone`, and remote-URI decode selection is resolved by MIME before the
    // first candidate is ever tried (§4.1), so a fallback past candidate #1
    // only matters for the local, stream-free path in practice.
    let mut input = input;

    for (i, plugin) in candidates.iter().enumerate() {
        let mut bridge = DecoderBridge::spawn(song.clone(), plugin.clone(), input.take(), buffer.clone());
        if bridge.control().wait_ready(DECODE_READY_TIMEOUT) && bridge.control().take_error().is_none() {
            return Ok(ActiveSong {
                song,
                bridge,
                last_timestamp: Cell::new(Duration::ZERO),
            });
        }
        warn!(
            uri,
            plugin = plugin.name(),
            attempt = i + 1,
            "decoder plugin failed to produce audio, trying next candidate"
        );
        bridge.stop();
    }
    Err(DecoderError::PluginUnavailable { uri })
}

/// Spawn the player thread and return the client-facing handle.
pub fn spawn(
    registry: Arc<DecoderRegistry>,
    opener: StreamOpener,
    buffer: Arc<MusicBuffer>,
    outputs: Vec<Arc<Output>>,
    volume: SharedVolume,
    config: PlayerConfig,
) -> PlayerControl {
    let sync = Arc::new(PlayerSync::new());
    let thread_sync = sync.clone();
    let handle = thread::Builder::new()
        .name("player".into())
        .spawn(move || run(thread_sync, registry, opener, buffer, outputs, volume, config))
        .expect("failed to spawn player thread");
    PlayerControl::new(sync, handle)
}

/// How much of the current song is left to play, derived from the decoder's
/// reported total duration minus the timestamp of the last chunk actually
/// forwarded — *not* from how many bytes currently sit in the decoder→player
/// pipe, which `forward_chunks` drains to empty on almost every 50 ms tick
/// and so says nothing about time remaining. Unknown-duration songs never
/// trigger cross-fade/pre-start, matching the prior unknown-format fallback.
fn remaining_time(active: &ActiveSong) -> Duration {
    match active.bridge.control().duration() {
        Some(total) => total.saturating_sub(active.last_timestamp.get()),
        None => Duration::MAX,
    }
}

fn make_lookup(active: &ActiveSong) -> ReplayGainLookup {
    let control = active.bridge.control().clone();
    Arc::new(move |_serial| control.replay_gain().1)
}

fn open_outputs(
    outputs: &[Arc<Output>],
    slots: &mut Vec<OutputSlot>,
    buffer: &Arc<MusicBuffer>,
    format: AudioFormat,
    rg_config: ReplayGainConfig,
    volume: &SharedVolume,
    lookup: ReplayGainLookup,
) {
    slots.clear();
    for output in outputs {
        let pipe = Arc::new(MusicPipe::new());
        output.enable();
        output.open(
            pipe.clone(),
            buffer.clone(),
            format,
            rg_config,
            volume.clone(),
            lookup.clone(),
        );
        slots.push(OutputSlot {
            output: output.clone(),
            pipe,
        });
    }
}

/// Resolve `ReplayGainMode::Auto` against the current and (if already known)
/// next song's album tags before an output's `ReplayGainConfig` is built;
/// every other mode passes through unchanged.
fn resolve_replaygain_config(
    config: &PlayerConfig,
    current_album: Option<&str>,
    next_album: Option<&str>,
) -> ReplayGainConfig {
    let mut rg = config.replaygain;
    rg.mode = rg.mode.resolve_auto(current_album, next_album);
    rg
}

/// Drain ready chunks from the decoder's pipe, duplicating each one into
/// every output's own pipe (outputs never share a pipe, §3.4).
fn forward_chunks(active: &ActiveSong, slots: &[OutputSlot], buffer: &Arc<MusicBuffer>) {
    let pipe = active.bridge.pipe();
    while let Some(chunk) = pipe.shift() {
        active.last_timestamp.set(chunk.timestamp);
        for slot in slots {
            slot.pipe.push(chunk.duplicate(buffer));
        }
        buffer.return_chunk(chunk);
    }
}

/// One step of the cross-fade window: mix one chunk off each song's pipe and
/// push the mixed result to every output. Falls back to forwarding the
/// current song's chunk unmixed when the next song has nothing ready yet.
/// Returns `false` once the current song's pipe has nothing left this pass.
///
/// `crossfade_frames` is the count of overlap frames already mixed since the
/// cross-fade window began; it must be threaded across every call for one
/// song transition so the mix weight ramps once over the whole window
/// (§8 scenario 2), rather than restarting at each ~4 KiB chunk boundary.
fn forward_mixed(
    current: &ActiveSong,
    next: &ActiveSong,
    slots: &[OutputSlot],
    buffer: &Arc<MusicBuffer>,
    crossfade_frames: &mut u64,
    total_frames: u64,
) -> bool {
    let format = match current.bridge.control().audio_format() {
        Some(f) => f,
        None => return false,
    };
    let chunk_a = match current.bridge.pipe().shift() {
        Some(c) => c,
        None => return false,
    };
    current.last_timestamp.set(chunk_a.timestamp);
    let chunk_b = match next.bridge.pipe().shift() {
        Some(c) => c,
        None => {
            for slot in slots {
                slot.pipe.push(chunk_a.duplicate(buffer));
            }
            buffer.return_chunk(chunk_a);
            return true;
        }
    };

    let len = chunk_a.as_bytes().len().min(chunk_b.as_bytes().len());
    let frame_size = format.frame_size().max(1) as usize;
    let mixramp_a = current.bridge.control().mix_ramp();
    let mixramp_b = next.bridge.control().mix_ramp();
    let mixed = crossfade::mix_with_mixramp(
        &chunk_a.as_bytes()[..len],
        &chunk_b.as_bytes()[..len],
        format,
        mixramp_a.as_ref(),
        mixramp_b.as_ref(),
        *crossfade_frames,
        total_frames,
    );
    *crossfade_frames += (len / frame_size) as u64;
    for slot in slots {
        let mut dup = buffer.allocate_blocking(format);
        dup.append(&mixed);
        dup.timestamp = chunk_a.timestamp;
        dup.replay_gain_serial = chunk_a.replay_gain_serial;
        slot.pipe.push(dup);
    }
    // Whichever side is longer still has frames past the overlap; push them
    // unmixed rather than drop them.
    if chunk_a.as_bytes().len() > len {
        let tail = chunk_a.as_bytes()[len..].to_vec();
        for slot in slots {
            let mut dup = buffer.allocate_blocking(format);
            dup.append(&tail);
            dup.timestamp = chunk_a.timestamp;
            slot.pipe.push(dup);
        }
    }
    if chunk_b.as_bytes().len() > len {
        let tail = chunk_b.as_bytes()[len..].to_vec();
        for slot in slots {
            let mut dup = buffer.allocate_blocking(format);
            dup.append(&tail);
            dup.timestamp = chunk_b.timestamp;
            slot.pipe.push(dup);
        }
    }
    buffer.return_chunk(chunk_a);
    buffer.return_chunk(chunk_b);
    true
}

/// Start decoding the queued next song early once the current song's
/// remaining time shrinks to the cross-fade (or gapless zero-length) window.
fn maybe_prestart_next(
    active: &ActiveSong,
    queued_next: &mut Option<SongRef>,
    next_bridge: &mut Option<ActiveSong>,
    registry: &DecoderRegistry,
    opener: &StreamOpener,
    buffer: &Arc<MusicBuffer>,
    crossfade: Duration,
) {
    if next_bridge.is_some() {
        return;
    }
    let Some(song) = queued_next.clone() else {
        return;
    };
    if remaining_time(active) > crossfade {
        return;
    }
    match start_song(registry, opener, buffer, song) {
        Ok(started) => {
            *next_bridge = Some(started);
            *queued_next = None;
        }
        Err(e) => warn!(error = %e, "failed to pre-start next song"),
    }
}

fn advance(
    current: &mut Option<ActiveSong>,
    queued_next: &mut Option<SongRef>,
    next_bridge: &mut Option<ActiveSong>,
    registry: &DecoderRegistry,
    opener: &StreamOpener,
    buffer: &Arc<MusicBuffer>,
) {
    if let Some(started) = next_bridge.take() {
        *current = Some(started);
        return;
    }
    if let Some(song) = queued_next.take() {
        match start_song(registry, opener, buffer, song) {
            Ok(started) => *current = Some(started),
            Err(e) => warn!(error = %e, "failed to start next song"),
        }
    }
}

fn update_status(sync: &PlayerSync, active: &ActiveSong) {
    let control = active.bridge.control();
    let (elapsed, bit_rate) = active
        .bridge
        .pipe()
        .with_head(|c| (c.timestamp, c.bit_rate))
        .unwrap_or((Duration::ZERO, None));
    let duration = control.duration();
    let format = control.audio_format();
    sync.with_status_mut(|s| {
        s.elapsed = elapsed;
        s.duration = duration;
        s.audio_format = format;
        if bit_rate.is_some() {
            s.bit_rate = bit_rate;
        }
    });
}

fn update_output_status(sync: &PlayerSync, slots: &[OutputSlot]) {
    let statuses: Vec<OutputStatus> = slots
        .iter()
        .map(|slot| OutputStatus {
            name: slot.output.name().to_string(),
            enabled: slot.output.control().enabled(),
            really_enabled: slot.output.control().really_enabled(),
            open: slot.output.control().open(),
            last_error: slot.output.last_error(),
        })
        .collect();
    sync.with_status_mut(|s| s.outputs = statuses);
}

fn close_all_outputs(slots: &mut Vec<OutputSlot>) {
    for slot in slots.drain(..) {
        slot.output.close();
    }
}

fn run(
    sync: Arc<PlayerSync>,
    registry: Arc<DecoderRegistry>,
    opener: StreamOpener,
    buffer: Arc<MusicBuffer>,
    outputs: Vec<Arc<Output>>,
    volume: SharedVolume,
    config: PlayerConfig,
) {
    let mut current: Option<ActiveSong> = None;
    let mut queued_next: Option<SongRef> = None;
    let mut next_bridge: Option<ActiveSong> = None;
    let mut slots: Vec<OutputSlot> = Vec::new();
    let mut opened = false;
    // Overlap frames mixed so far in the current cross-fade window, and the
    // window's total length; reset whenever a fresh pre-start begins (§8
    // scenario 2 needs one continuous ramp per transition, not per chunk).
    let mut crossfade_frames: u64 = 0;
    let mut crossfade_total_frames: u64 = 0;

    loop {
        sync.wait_for_wake(Duration::from_millis(50));
        let cmd = sync.take_command();

        match cmd {
            PlayerCommand::None | PlayerCommand::Refresh => {}
            PlayerCommand::Exit => {
                current = None;
                next_bridge = None;
                close_all_outputs(&mut slots);
                sync.ack();
                return;
            }
            PlayerCommand::Stop => {
                current = None;
                next_bridge = None;
                queued_next = None;
                close_all_outputs(&mut slots);
                opened = false;
                sync.with_status_mut(|s| {
                    s.state = PlayerState::Stop;
                    s.current_song = None;
                    s.elapsed = Duration::ZERO;
                });
                sync.ack();
            }
            PlayerCommand::Cancel => {
                current = None;
                next_bridge = None;
                queued_next = None;
                for slot in &slots {
                    slot.output.cancel();
                }
                sync.with_status_mut(|s| {
                    s.state = PlayerState::Stop;
                    s.current_song = None;
                    s.elapsed = Duration::ZERO;
                });
                sync.ack();
            }
            PlayerCommand::Pause(pause) => {
                for slot in &slots {
                    if pause {
                        slot.output.pause();
                    } else {
                        slot.output.resume();
                    }
                }
                if current.is_some() {
                    sync.with_status_mut(|s| {
                        s.state = if pause { PlayerState::Pause } else { PlayerState::Play };
                    });
                }
                sync.ack();
            }
            PlayerCommand::Queue(song) => {
                if current.is_none() {
                    match start_song(&registry, &opener, &buffer, song.clone()) {
                        Ok(started) => {
                            current = Some(started);
                            sync.with_status_mut(|s| {
                                s.state = PlayerState::Play;
                                s.current_song = Some(song);
                                s.elapsed = Duration::ZERO;
                                s.error = None;
                            });
                        }
                        Err(e) => {
                            warn!(error = %e, "failed to start song");
                            sync.with_status_mut(|s| s.error = Some(e.to_string()));
                        }
                    }
                } else {
                    queued_next = Some(song);
                }
                sync.ack();
            }
            PlayerCommand::Play(song) => {
                // §6.1: PLAY on the given song now, interrupting/replacing
                // whatever is currently playing or queued — unlike `Queue`,
                // which only ever schedules a gap-less follow-on.
                current = None;
                next_bridge = None;
                queued_next = None;
                for slot in &slots {
                    slot.output.cancel();
                }
                opened = false;
                crossfade_frames = 0;
                match start_song(&registry, &opener, &buffer, song.clone()) {
                    Ok(started) => {
                        current = Some(started);
                        sync.with_status_mut(|s| {
                            s.state = PlayerState::Play;
                            s.current_song = Some(song);
                            s.elapsed = Duration::ZERO;
                            s.error = None;
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to start song");
                        sync.with_status_mut(|s| s.error = Some(e.to_string()));
                    }
                }
                sync.ack();
            }
            PlayerCommand::Seek { song, time } => {
                if let Some(active) = &current {
                    if active.song.is_same_song(&song) {
                        active.bridge.seek(time);
                        for slot in &slots {
                            slot.output.cancel();
                        }
                        next_bridge = None;
                    }
                }
                sync.ack();
            }
            PlayerCommand::CloseAudio => {
                close_all_outputs(&mut slots);
                opened = false;
                sync.ack();
            }
            PlayerCommand::UpdateAudio => {
                opened = false;
                sync.ack();
            }
        }

        update_output_status(&sync, &slots);

        let Some(active) = current.as_ref() else {
            continue;
        };
        if sync.state() != PlayerState::Play {
            continue;
        }

        if !opened {
            if let Some(format) = active.bridge.control().audio_format() {
                let lookup = make_lookup(active);
                let next_album = queued_next.as_ref().map(|s| s.tag().album()).unwrap_or(None);
                let rg_config =
                    resolve_replaygain_config(&config, active.song.tag().album(), next_album);
                open_outputs(&outputs, &mut slots, &buffer, format, rg_config, &volume, lookup);
                opened = true;
            } else {
                continue;
            }
        }

        let had_next_bridge = next_bridge.is_some();
        maybe_prestart_next(
            active,
            &mut queued_next,
            &mut next_bridge,
            &registry,
            &opener,
            &buffer,
            config.crossfade,
        );
        if !had_next_bridge && next_bridge.is_some() {
            crossfade_frames = 0;
            let sample_rate = active
                .bridge
                .control()
                .audio_format()
                .map(|f| f.sample_rate)
                .unwrap_or(44_100);
            crossfade_total_frames = (config.crossfade.as_secs_f64() * sample_rate as f64) as u64;
        }

        let mixing = next_bridge
            .as_ref()
            .map(|nb| nb.bridge.state() == DecoderState::Decode)
            .unwrap_or(false)
            && remaining_time(active) <= config.crossfade;

        if mixing {
            let next_active = next_bridge.as_ref().unwrap();
            while forward_mixed(
                active,
                next_active,
                &slots,
                &buffer,
                &mut crossfade_frames,
                crossfade_total_frames,
            ) {}
        } else {
            forward_chunks(active, &slots, &buffer);
        }
        update_status(&sync, active);

        let current_finished = active.bridge.state() == DecoderState::Stop
            && active.bridge.is_finished()
            && active.bridge.pipe().is_empty();
        if current_finished {
            if let Some(err) = active.bridge.control().take_error() {
                warn!(error = err, "song failed, advancing to next");
            }
            current = None;
            advance(
                &mut current,
                &mut queued_next,
                &mut next_bridge,
                &registry,
                &opener,
                &buffer,
            );
            match &current {
                Some(started) => {
                    let song = started.song.clone();
                    opened = false;
                    sync.with_status_mut(|s| {
                        s.current_song = Some(song);
                        s.elapsed = Duration::ZERO;
                    });
                }
                None => {
                    close_all_outputs(&mut slots);
                    opened = false;
                    sync.with_status_mut(|s| {
                        s.state = PlayerState::Stop;
                        s.current_song = None;
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_uri_detection() {
        assert!(is_local("file:///music/song.wav"));
        assert!(is_local("/music/song.wav"));
        assert!(!is_local("http://host/stream.mp3"));
    }
}

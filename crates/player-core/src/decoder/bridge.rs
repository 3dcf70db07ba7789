// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Hosts one decoder plugin instance for the lifetime of one song (§4.1).

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use player_plugin_api::{DecoderPlugin, InputStream};
use player_ipc::SongRef;
use tracing::{debug, warn};

use crate::chunk::MusicBuffer;
use crate::error::DecoderError;
use crate::pipe::MusicPipe;

use super::client::BridgeClient;
use super::state::{DecoderControl, DecoderState};

/// Runs one decoder plugin on its own thread, translating its upcalls into
/// chunks on `pipe` and obeying commands posted through `control` (§5: "one
/// decoder thread per live decoder").
pub struct DecoderBridge {
    control: Arc<DecoderControl>,
    pipe: Arc<MusicPipe>,
    handle: Option<JoinHandle<()>>,
}

impl DecoderBridge {
    /// Spawn the bridge thread for `song`, already bound to the plugin that
    /// won the §4.1 selection algorithm. `input` is `Some` for
    /// `stream_decode`, `None` to fall back to `file_decode` against the
    /// song's URI interpreted as a local path.
    pub fn spawn(
        song: SongRef,
        plugin: Arc<dyn DecoderPlugin>,
        input: Option<Box<dyn InputStream>>,
        buffer: Arc<MusicBuffer>,
    ) -> Self {
        let control = Arc::new(DecoderControl::new());
        let pipe = Arc::new(MusicPipe::new());
        control.request_start();

        let thread_control = control.clone();
        let thread_pipe = pipe.clone();
        let uri = song.uri().to_string();
        let start_time = song.start_time().unwrap_or_default();

        let handle = thread::Builder::new()
            .name(format!("decoder:{uri}"))
            .spawn(move || {
                let client = BridgeClient::new(
                    thread_control.clone(),
                    thread_pipe.clone(),
                    buffer,
                    start_time,
                );
                let result = match input {
                    Some(mut stream) => plugin.stream_decode(&client, stream.as_mut()),
                    None => {
                        let path = PathBuf::from(uri.trim_start_matches("file://"));
                        plugin.file_decode(&client, &path)
                    }
                };
                match result {
                    Ok(()) => {
                        debug!(uri, "decoder finished song");
                        thread_control.set_finished();
                    }
                    Err(e) if e.is_interrupted() => {
                        debug!(uri, "decoder interrupted (STOP/SEEK)");
                        thread_control.set_finished();
                    }
                    Err(e) => {
                        let err = DecoderError::from_plugin(&uri, e);
                        warn!(uri, error = %err, "decoder plugin failed, skipping song");
                        thread_control.set_error(&err);
                    }
                }
            })
            .expect("failed to spawn decoder thread");

        Self {
            control,
            pipe,
            handle: Some(handle),
        }
    }

    pub fn control(&self) -> &Arc<DecoderControl> {
        &self.control
    }

    pub fn pipe(&self) -> &Arc<MusicPipe> {
        &self.pipe
    }

    pub fn state(&self) -> DecoderState {
        self.control.state()
    }

    /// §4.1 Seek: discard buffered-but-unpushed PCM is the caller's job
    /// (clearing the pipe); this just drives the plugin's seek path and waits
    /// for `CommandFinished`/`SeekError`.
    pub fn seek(&self, time: Duration) {
        self.control.request_seek(time);
        self.control.wait_command_finished();
    }

    /// §4.1 Stop: unblocks a decoder parked inside a plugin read/submit and
    /// waits for the thread to unwind.
    pub fn stop(&mut self) {
        self.control.request_stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }

    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DecoderBridge {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.control.request_stop();
            self.join();
        }
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The bridge's implementation of [`DecoderClient`], handed to a running
//! plugin (§4.1 "Client callbacks the plugin uses").

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use player_plugin_api::{
    AudioFormat, DecoderClient, DecoderCommand, InputStream, MixRampInfo, PluginApiError,
    PluginApiResult, ReplayGainInfo, Tag,
};

use crate::chunk::MusicBuffer;
use crate::pipe::MusicPipe;

use super::state::DecoderControl;

pub struct BridgeClient {
    control: Arc<DecoderControl>,
    pipe: Arc<MusicPipe>,
    buffer: Arc<MusicBuffer>,
    next_timestamp: Mutex<Duration>,
}

impl BridgeClient {
    pub fn new(
        control: Arc<DecoderControl>,
        pipe: Arc<MusicPipe>,
        buffer: Arc<MusicBuffer>,
        start_time: Duration,
    ) -> Self {
        Self {
            control,
            pipe,
            buffer,
            next_timestamp: Mutex::new(start_time),
        }
    }
}

impl DecoderClient for BridgeClient {
    fn ready(&self, format: AudioFormat, seekable: bool, duration: Option<Duration>) {
        self.control.set_ready(format, seekable, duration);
    }

    fn submit_audio(&self, data: &[u8], kbit_rate: Option<u32>) -> DecoderCommand {
        let format = match self.control.audio_format() {
            Some(f) => f,
            None => return self.control.get_command(),
        };
        let frame_size = format.frame_size().max(1) as usize;
        let mut offset = 0;
        while offset < data.len() {
            let mut chunk = self.buffer.allocate_blocking(format);
            let avail = chunk.space().min(data.len() - offset);
            let take = avail - (avail % frame_size);
            if take == 0 {
                // Chunk too small to hold even one frame (shouldn't happen at
                // the documented 4 KiB budget); return it unused and bail.
                self.buffer.return_chunk(chunk);
                break;
            }
            chunk.append(&data[offset..offset + take]);
            chunk.timestamp = *self.next_timestamp.lock();
            chunk.bit_rate = kbit_rate;
            if let Some(tag) = self.control.take_tag() {
                chunk.tag = Some(tag);
            }
            let (serial, _) = self.control.replay_gain();
            chunk.replay_gain_serial = serial;
            *self.next_timestamp.lock() += format.bytes_to_duration(take as u32);
            self.pipe.push(chunk);
            offset += take;

            let cmd = self.control.get_command();
            if cmd != DecoderCommand::None {
                return cmd;
            }
        }
        self.control.get_command()
    }

    fn submit_timestamp(&self, t: Duration) {
        *self.next_timestamp.lock() = t;
    }

    fn submit_tag(&self, tag: Tag) -> DecoderCommand {
        self.control.set_tag(tag);
        self.control.get_command()
    }

    fn submit_replay_gain(&self, info: Option<ReplayGainInfo>) {
        self.control.set_replay_gain(info);
    }

    fn submit_mix_ramp(&self, info: MixRampInfo) {
        self.control.set_mix_ramp(info);
    }

    fn get_command(&self) -> DecoderCommand {
        self.control.get_command()
    }

    fn command_finished(&self) {
        self.control.command_finished();
    }

    fn get_seek_time(&self) -> Option<Duration> {
        self.control.seek_time()
    }

    fn get_seek_frame(&self) -> Option<u64> {
        self.control.seek_frame()
    }

    fn seek_error(&self) {
        self.control.seek_error();
    }

    fn open_uri(&self, _uri: &str) -> PluginApiResult<Box<dyn InputStream>> {
        Err(PluginApiError::UnsupportedFormat(
            "nested stream opening requires an external input-stream factory".into(),
        ))
    }

    fn read(&self, stream: &mut dyn InputStream, dest: &mut [u8]) -> PluginApiResult<usize> {
        if self.control.get_command() != DecoderCommand::None {
            return Err(PluginApiError::Interrupted);
        }
        stream.read(dest)
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A decoder/output pair doing no real I/O: silence in, the bit bucket out.
//! Exercises the plugin vtables without an audio stack or decodable media.

use std::path::Path;
use std::time::Duration;

use player_plugin_api::{
    AudioFormat, AudioOutput, ConfigBlock, DecoderClient, DecoderCommand, DecoderPlugin,
    InputStream, PluginApiResult, SampleFormat,
};

const SILENCE_FRAMES: usize = 1024;

pub struct NullDecoderPlugin;

impl DecoderPlugin for NullDecoderPlugin {
    fn name(&self) -> &str {
        "null"
    }

    fn file_decode(&self, client: &dyn DecoderClient, _path: &Path) -> PluginApiResult<()> {
        run_silence(client)
    }

    fn stream_decode(
        &self,
        client: &dyn DecoderClient,
        _input: &mut dyn InputStream,
    ) -> PluginApiResult<()> {
        run_silence(client)
    }

    fn suffixes(&self) -> &[&str] {
        &["null"]
    }

    fn mime_types(&self) -> &[&str] {
        &["audio/x-null"]
    }
}

/// Streams silence forever, observing `get_command` between chunks the same
/// way a real decode loop would between reads of its input.
fn run_silence(client: &dyn DecoderClient) -> PluginApiResult<()> {
    let format = AudioFormat::new(44_100, SampleFormat::S16, 2);
    client.ready(format, false, None);
    let chunk = vec![0u8; SILENCE_FRAMES * format.frame_size() as usize];
    loop {
        match client.submit_audio(&chunk, None) {
            DecoderCommand::Stop => {
                client.command_finished();
                return Ok(());
            }
            DecoderCommand::Seek => {
                // nothing to seek to; report the seek as satisfied at time zero.
                client.command_finished();
            }
            DecoderCommand::Start | DecoderCommand::None => {}
        }
    }
}

pub struct NullOutputPlugin;

impl player_plugin_api::OutputPlugin for NullOutputPlugin {
    fn name(&self) -> &str {
        "null"
    }

    fn create(&self, _config: &ConfigBlock) -> PluginApiResult<Box<dyn AudioOutput>> {
        Ok(Box::new(NullOutput { open: false }))
    }
}

struct NullOutput {
    open: bool,
}

impl AudioOutput for NullOutput {
    fn enable(&mut self) -> PluginApiResult<()> {
        Ok(())
    }

    fn disable(&mut self) {}

    fn open(&mut self, _format: &mut AudioFormat) -> PluginApiResult<()> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn delay(&self) -> Duration {
        Duration::ZERO
    }

    fn play(&mut self, bytes: &[u8]) -> PluginApiResult<usize> {
        Ok(bytes.len())
    }

    fn drain(&mut self) -> PluginApiResult<()> {
        Ok(())
    }

    fn cancel(&mut self) {}

    fn pause(&mut self) -> bool {
        true
    }

    fn interrupt(&self) {}
}

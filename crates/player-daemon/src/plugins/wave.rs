// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A WAV decoder and a WAV-recorder output, both built on `hound`. The output
//! plugin stands in for a real sound-card driver on hosts with no audio
//! hardware: it writes whatever reaches it to the path given by its `device`
//! config key.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

use hound::{SampleFormat as HoundSampleFormat, WavReader, WavSpec, WavWriter};
use player_plugin_api::{
    AudioFormat, AudioOutput, ConfigBlock, DecoderClient, DecoderCommand, DecoderPlugin,
    PluginApiError, PluginApiResult, SampleFormat,
};

pub struct WaveDecoderPlugin;

impl DecoderPlugin for WaveDecoderPlugin {
    fn name(&self) -> &str {
        "wave"
    }

    fn file_decode(&self, client: &dyn DecoderClient, path: &Path) -> PluginApiResult<()> {
        let mut reader = WavReader::open(path)
            .map_err(|e| PluginApiError::UnsupportedFormat(e.to_string()))?;
        let spec = reader.spec();
        let format = to_audio_format(&spec)
            .ok_or_else(|| PluginApiError::UnsupportedFormat(format!("{spec:?}")))?;
        let frame_count = reader.duration() as u64;
        let duration = if spec.sample_rate > 0 {
            Some(Duration::from_secs_f64(
                frame_count as f64 / spec.sample_rate as f64,
            ))
        } else {
            None
        };
        client.ready(format, true, duration);

        let bytes_per_sample = spec.bits_per_sample as usize / 8;
        const CHUNK_FRAMES: usize = 1024;
        let chunk_samples = CHUNK_FRAMES * spec.channels as usize;
        let mut buf = Vec::with_capacity(chunk_samples * bytes_per_sample);
        let mut samples = reader.samples::<i32>();

        loop {
            buf.clear();
            let mut produced = 0;
            for _ in 0..chunk_samples {
                match samples.next() {
                    Some(Ok(sample)) => {
                        push_sample(&mut buf, sample, bytes_per_sample);
                        produced += 1;
                    }
                    Some(Err(e)) => {
                        return Err(PluginApiError::Io(std::io::Error::new(
                            std::io::ErrorKind::InvalidData,
                            e.to_string(),
                        )))
                    }
                    None => break,
                }
            }
            if produced == 0 {
                client.command_finished();
                return Ok(());
            }
            match client.submit_audio(&buf, None) {
                DecoderCommand::Stop => {
                    client.command_finished();
                    return Ok(());
                }
                DecoderCommand::Seek => {
                    if let Some(frame) = client.get_seek_frame() {
                        match reader.seek(frame as u32) {
                            Ok(()) => {
                                samples = reader.samples::<i32>();
                                client.command_finished();
                            }
                            Err(_) => client.seek_error(),
                        }
                    } else {
                        client.seek_error();
                    }
                }
                DecoderCommand::Start | DecoderCommand::None => {}
            }
        }
    }

    fn suffixes(&self) -> &[&str] {
        &["wav", "wave"]
    }

    fn mime_types(&self) -> &[&str] {
        &["audio/x-wav", "audio/wav"]
    }
}

fn push_sample(buf: &mut Vec<u8>, sample: i32, bytes_per_sample: usize) {
    match bytes_per_sample {
        1 => buf.push(sample as i8 as u8),
        2 => buf.extend_from_slice(&(sample as i16).to_le_bytes()),
        4 => buf.extend_from_slice(&sample.to_le_bytes()),
        _ => buf.extend_from_slice(&(sample as i16).to_le_bytes()),
    }
}

fn to_audio_format(spec: &WavSpec) -> Option<AudioFormat> {
    let format = match (spec.bits_per_sample, spec.sample_format) {
        (8, HoundSampleFormat::Int) => SampleFormat::S8,
        (16, HoundSampleFormat::Int) => SampleFormat::S16,
        (32, HoundSampleFormat::Int) => SampleFormat::S32,
        (32, HoundSampleFormat::Float) => SampleFormat::Float,
        _ => return None,
    };
    Some(AudioFormat::new(
        spec.sample_rate,
        format,
        spec.channels as u8,
    ))
}

fn to_wav_spec(format: &AudioFormat) -> WavSpec {
    let (bits_per_sample, sample_format) = match format.format {
        SampleFormat::S8 => (8, HoundSampleFormat::Int),
        SampleFormat::S16 => (16, HoundSampleFormat::Int),
        SampleFormat::S24P32 | SampleFormat::S32 => (32, HoundSampleFormat::Int),
        SampleFormat::Float => (32, HoundSampleFormat::Float),
        SampleFormat::Dsd => (8, HoundSampleFormat::Int),
    };
    WavSpec {
        channels: format.channels as u16,
        sample_rate: format.sample_rate,
        bits_per_sample,
        sample_format,
    }
}

pub struct WaveOutputPlugin;

impl player_plugin_api::OutputPlugin for WaveOutputPlugin {
    fn name(&self) -> &str {
        "wave"
    }

    fn create(&self, config: &ConfigBlock) -> PluginApiResult<Box<dyn AudioOutput>> {
        let path = config
            .get("device")
            .ok_or_else(|| PluginApiError::PluginUnavailable("wave output needs device".into()))?
            .to_string();
        Ok(Box::new(WaveOutput {
            path,
            writer: None,
            format: AudioFormat::new(44_100, SampleFormat::S16, 2),
        }))
    }
}

/// Records whatever it's fed to a WAV file at `device`; opened fresh on every
/// `open()` call since a driver's format can change between songs.
struct WaveOutput {
    path: String,
    writer: Option<WavWriter<BufWriter<File>>>,
    format: AudioFormat,
}

impl AudioOutput for WaveOutput {
    fn enable(&mut self) -> PluginApiResult<()> {
        Ok(())
    }

    fn disable(&mut self) {
        self.writer = None;
    }

    fn open(&mut self, format: &mut AudioFormat) -> PluginApiResult<()> {
        let spec = to_wav_spec(format);
        let writer =
            WavWriter::create(&self.path, spec).map_err(|e| PluginApiError::Io(
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            ))?;
        self.format = *format;
        self.writer = Some(writer);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(writer) = self.writer.take() {
            let _ = writer.finalize();
        }
    }

    fn delay(&self) -> Duration {
        Duration::ZERO
    }

    fn play(&mut self, bytes: &[u8]) -> PluginApiResult<usize> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| PluginApiError::PluginUnavailable("output not open".into()))?;
        let frame_size = self.format.frame_size().max(1) as usize;
        let usable = bytes.len() - (bytes.len() % frame_size);
        write_samples(writer, &bytes[..usable], self.format.format)
            .map_err(|e| PluginApiError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
        Ok(usable)
    }

    fn drain(&mut self) -> PluginApiResult<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer
                .flush()
                .map_err(|e| PluginApiError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
        }
        Ok(())
    }

    fn cancel(&mut self) {}

    fn pause(&mut self) -> bool {
        true
    }

    fn interrupt(&self) {}
}

fn write_samples(
    writer: &mut WavWriter<BufWriter<File>>,
    bytes: &[u8],
    format: SampleFormat,
) -> Result<(), hound::Error> {
    match format {
        SampleFormat::S8 => {
            for b in bytes {
                writer.write_sample(*b as i8 as i32)?;
            }
        }
        SampleFormat::S16 => {
            for chunk in bytes.chunks_exact(2) {
                let s = i16::from_le_bytes([chunk[0], chunk[1]]);
                writer.write_sample(s as i32)?;
            }
        }
        SampleFormat::S24P32 | SampleFormat::S32 => {
            for chunk in bytes.chunks_exact(4) {
                let s = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                writer.write_sample(s)?;
            }
        }
        SampleFormat::Float => {
            for chunk in bytes.chunks_exact(4) {
                let s = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                writer.write_sample(s)?;
            }
        }
        SampleFormat::Dsd => {
            for b in bytes {
                writer.write_sample(*b as i8 as i32)?;
            }
        }
    }
    Ok(())
}

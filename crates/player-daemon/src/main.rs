// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reference daemon binary: loads config, wires up the built-in plugins, and
//! drives the player core's decoder/output/player threads. No network
//! protocol is implemented here — that belongs to whatever client library
//! embeds `player-ipc`'s types over its own transport.

mod config;
mod plugins;

use std::sync::Arc;

use player_core::{
    DecoderError, DecoderRegistry, MusicBuffer, Output, PlayerConfig as CorePlayerConfig,
    ReplayGainConfig, ReplayGainMode, SharedVolume, StreamOpener,
};
use player_plugin_api::{AudioFormat, ConfigBlock, InputStream, SampleFormat};
use tracing::{error, info, warn};

use config::{ConfigManager, PlayerConfig as DaemonConfig};

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("player_daemon=debug".parse().unwrap())
                .add_directive("player_core=debug".parse().unwrap()),
        )
        .init();
}

fn replay_gain_config(config: &DaemonConfig) -> ReplayGainConfig {
    let mode = match config.replaygain {
        config::ReplayGainMode::Off => ReplayGainMode::Off,
        config::ReplayGainMode::Track => ReplayGainMode::Track,
        config::ReplayGainMode::Album => ReplayGainMode::Album,
        config::ReplayGainMode::Auto => ReplayGainMode::Auto,
    };
    ReplayGainConfig {
        mode,
        preamp_db: config.replaygain_preamp,
        missing_preamp_db: config.replaygain_missing_preamp,
        limit: config.replaygain_limit,
    }
}

fn build_outputs(config: &DaemonConfig) -> Vec<Arc<Output>> {
    let mut outputs = Vec::new();
    for spec in &config.audio_output {
        let plugin = match plugins::output_plugin(&spec.plugin_type) {
            Some(p) => p,
            None => {
                warn!(plugin = %spec.plugin_type, "unknown output plugin, skipping");
                continue;
            }
        };
        let mut block = ConfigBlock::new();
        if let Some(device) = &spec.device {
            block.insert("device", device.clone());
        }
        let driver = match plugin.create(&block) {
            Ok(d) => d,
            Err(e) => {
                error!(name = %spec.name, error = %e, "failed to create output driver");
                continue;
            }
        };
        let output = Arc::new(Output::spawn(spec.name.clone(), driver));
        if spec.always_on {
            output.enable();
        }
        outputs.push(output);
    }
    outputs
}

/// A `StreamOpener` good enough for local files and `file://` URIs; a daemon
/// that serves remote streams would plug in an HTTP client here instead.
fn make_opener() -> StreamOpener {
    Arc::new(|uri: &str| -> Result<Box<dyn InputStream>, DecoderError> {
        Err(DecoderError::UnsupportedFormat(format!(
            "no stream opener configured for {uri}"
        )))
    })
}

fn main() {
    init_logging();
    info!("player daemon starting");

    let config_manager = match ConfigManager::new() {
        Ok(m) => m,
        Err(e) => {
            error!(error = %e, "failed to resolve config directory");
            std::process::exit(1);
        }
    };
    let config = config_manager.load().unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        DaemonConfig::default()
    });

    let mut registry = DecoderRegistry::new();
    plugins::register_decoders(&mut registry);
    let registry = Arc::new(registry);

    let outputs = build_outputs(&config);
    if outputs.is_empty() {
        warn!("no outputs configured; playback will produce no sound");
    }

    let default_format = AudioFormat::new(44_100, SampleFormat::S16, 2);
    let buffer = Arc::new(MusicBuffer::new(config.audio_buffer_size, default_format));
    let volume = SharedVolume::new(100);

    let player_config = CorePlayerConfig {
        crossfade: std::time::Duration::from_secs_f32(config.crossfade_seconds.max(0.0)),
        replaygain: replay_gain_config(&config),
    };

    let control = player_core::spawn(
        registry,
        make_opener(),
        buffer,
        outputs,
        volume,
        player_config,
    );

    info!("player core running; waiting for shutdown signal");
    if let Err(e) = wait_for_shutdown() {
        warn!(error = %e, "shutdown signal wait failed, exiting anyway");
    }

    info!("player daemon shutting down");
    control.exit();
}

/// Blocks until stdin is closed (Ctrl+D, or the parent process closing our
/// pipe), used as the process lifetime in place of a real service manager
/// integration. A packaged build would wait on SIGINT/SIGTERM instead.
fn wait_for_shutdown() -> std::io::Result<()> {
    use std::io::Read;

    let mut sink = [0u8; 64];
    let mut stdin = std::io::stdin();
    loop {
        match stdin.read(&mut sink)? {
            0 => return Ok(()),
            _ => continue,
        }
    }
}

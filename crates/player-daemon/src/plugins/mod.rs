// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The plugins this binary ships, registered into the core's tables at
//! startup. Real deployments add codec and sound-card bindings here; these
//! two are enough to run the player core on a host with no audio hardware.

mod null;
mod wave;

use std::sync::Arc;

use player_core::DecoderRegistry;
use player_plugin_api::{DecoderPlugin, OutputPlugin};

pub use null::{NullDecoderPlugin, NullOutputPlugin};
pub use wave::{WaveDecoderPlugin, WaveOutputPlugin};

pub fn register_decoders(registry: &mut DecoderRegistry) {
    registry.register(Arc::new(WaveDecoderPlugin) as Arc<dyn DecoderPlugin>);
    registry.register(Arc::new(NullDecoderPlugin) as Arc<dyn DecoderPlugin>);
}

/// Resolve an output plugin by its configured `type` name (§6.6 `audio_output.type`).
pub fn output_plugin(name: &str) -> Option<Box<dyn OutputPlugin>> {
    match name {
        "wave" => Some(Box::new(WaveOutputPlugin)),
        "null" => Some(Box::new(NullOutputPlugin)),
        _ => None,
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The decoder subsystem: hosts a plugin instance per song and bridges its
//! upcalls onto a `MusicPipe` (§4.1).

mod bridge;
mod client;
mod registry;
mod state;

pub use bridge::DecoderBridge;
pub use client::BridgeClient;
pub use registry::DecoderRegistry;
pub use state::{DecoderControl, DecoderState};

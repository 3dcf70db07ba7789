// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The output plugin vtable (§6.4): a factory plus the per-device driver handle
//! it produces.

use std::time::Duration;

use crate::decoder::ConfigBlock;
use crate::error::PluginApiResult;
use crate::format::AudioFormat;
use crate::tag::Tag;

/// A device driver backing one configured output. One instance per `audio_output {}`
/// config block, created once by its plugin's `create()` and driven by one output
/// thread for the process lifetime.
pub trait AudioOutput: Send {
    fn enable(&mut self) -> PluginApiResult<()>;

    fn disable(&mut self);

    /// Open the driver at (close to) the given format; the plugin may clamp
    /// sample rate / sample format / channel count and must write back what it
    /// actually opened.
    fn open(&mut self, format: &mut AudioFormat) -> PluginApiResult<()>;

    /// Close without draining queued frames.
    fn close(&mut self);

    /// How long the caller should sleep before the next `play()` — the
    /// hard-gate back-pressure mechanism for drivers that cannot block on
    /// write (§4.4, §9 resolves the "hint vs hard gate" ambiguity as hard gate).
    fn delay(&self) -> Duration;

    /// Optional in-band tag delivery (e.g. Icecast/shoutcast source metadata).
    fn send_tag(&mut self, _tag: &Tag) {}

    /// Write as much of `bytes` as the driver accepts in one call. Must accept
    /// at least one frame-aligned frame, or return `Err` / the interrupted
    /// sentinel on device loss or cancellation — it must never silently return
    /// 0 forever.
    fn play(&mut self, bytes: &[u8]) -> PluginApiResult<usize>;

    /// Block until all queued frames have been delivered to hardware.
    fn drain(&mut self) -> PluginApiResult<()>;

    /// Drop queued frames without waiting for hardware to consume them.
    fn cancel(&mut self);

    /// Enter/maintain an idle state that keeps the device alive without
    /// delivering new audio. Returns `false` on failure.
    fn pause(&mut self) -> bool;

    /// Asynchronously unblock a thread currently inside `play`/`drain`/`pause`.
    fn interrupt(&self);
}

/// A plugin's entry point: probing and instantiation. Unlike `AudioOutput`,
/// plugins are stateless factories, registered once in the central plugin table
/// (§9: "an interface declared once; each plugin is a concrete implementation
/// registered at startup... No runtime code generation").
pub trait OutputPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Best-effort probe for whether a default device is present, used by
    /// config validation at boot; not required to be perfectly accurate.
    fn test_default_device(&self) -> bool {
        true
    }

    fn create(&self, config: &ConfigBlock) -> PluginApiResult<Box<dyn AudioOutput>>;
}

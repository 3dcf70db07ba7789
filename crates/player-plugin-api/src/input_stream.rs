// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The stream interface decoders read from; implemented by external collaborators
//! (local file, HTTP client, archive member, CD audio) and consumed by the core.

use crate::error::PluginApiResult;

/// A seekable or non-seekable byte source behind a URI.
///
/// Implementations are expected to release any shared mutex across blocking
/// syscalls (§6.5) — that discipline lives in the implementor, not in this
/// trait's signature, since the core calls through `&mut dyn InputStream`
/// without holding a lock of its own.
pub trait InputStream: Send {
    /// Total size, if known in advance (absent for chunked HTTP streams, live radio).
    fn size(&self) -> Option<u64>;

    /// Current read offset.
    fn offset(&self) -> u64;

    fn is_eof(&self) -> bool;

    fn seekable(&self) -> bool;

    /// Blocking read; returns the number of bytes placed into `dest`, `0` at EOF.
    fn read(&mut self, dest: &mut [u8]) -> PluginApiResult<usize>;

    fn seek(&mut self, offset: u64) -> PluginApiResult<()>;

    fn mime_type(&self) -> Option<&str>;

    /// Non-blocking; used for shoutcast-style in-band metadata.
    fn read_tag(&mut self) -> Option<crate::tag::Tag>;

    /// Rethrow any pending error recorded by a previous async operation.
    fn check(&self) -> PluginApiResult<()>;

    /// Unblock a thread currently parked inside `read()`.
    fn interrupt(&self);
}

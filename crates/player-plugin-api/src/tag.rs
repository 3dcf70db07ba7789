// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tag and replay-gain/mix-ramp snapshots that cross the decoder/player boundary.
//!
//! The core treats these as opaque payloads; it never interprets tag values.

use std::collections::BTreeMap;

/// Well-known tag keys. Anything else is carried under [`Tag::extra`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TagKind {
    Artist,
    Album,
    Title,
    Track,
    Genre,
    Date,
    AlbumArtist,
}

/// A tag snapshot attached to a song or to a chunk boundary when the decoder
/// reports a change (e.g. an Icecast stream's in-band metadata).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tag {
    fields: BTreeMap<TagKind, String>,
    pub duration: Option<std::time::Duration>,
}

impl Tag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, kind: TagKind, value: impl Into<String>) -> &mut Self {
        self.fields.insert(kind, value.into());
        self
    }

    pub fn get(&self, kind: TagKind) -> Option<&str> {
        self.fields.get(&kind).map(String::as_str)
    }

    pub fn album(&self) -> Option<&str> {
        self.get(TagKind::Album)
    }
}

/// Per-track/per-album gain in dB, as read from a song's tags.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReplayGainInfo {
    pub track_gain_db: Option<f32>,
    pub track_peak: Option<f32>,
    pub album_gain_db: Option<f32>,
    pub album_peak: Option<f32>,
}

impl ReplayGainInfo {
    pub fn is_empty(&self) -> bool {
        *self == ReplayGainInfo::default()
    }
}

/// Per-song amplitude envelope used as an alternative to scalar cross-fade
/// (GLOSSARY: "alternative to scalar cross-fade, defined by per-song amplitude
/// envelope points").
#[derive(Debug, Clone, PartialEq)]
pub struct MixRampInfo {
    /// `(offset_from_start, dB)` points describing the ramp in.
    pub start: Vec<(std::time::Duration, f32)>,
    /// `(offset_from_end, dB)` points describing the ramp out.
    pub end: Vec<(std::time::Duration, f32)>,
}

impl MixRampInfo {
    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.end.is_empty()
    }
}

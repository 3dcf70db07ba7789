// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The minimum song shape the core reads (§3.5). Everything else about a song
//! — its place in a queue, its row in a database — is the external queue
//! component's concern.

use std::sync::Arc;
use std::time::Duration;

use player_plugin_api::{ReplayGainInfo, Tag};

/// Opaque to the core beyond these fields; the core never mutates a `SongRef`,
/// it only holds shared references to one (cheap to clone, `Arc`-backed).
#[derive(Debug, Clone)]
pub struct SongRef(Arc<SongRefInner>);

#[derive(Debug)]
struct SongRefInner {
    uri: String,
    start_time: Option<Duration>,
    end_time: Option<Duration>,
    tag: Tag,
    replay_gain: Option<ReplayGainInfo>,
}

impl SongRef {
    pub fn new(uri: impl Into<String>, tag: Tag) -> Self {
        Self(Arc::new(SongRefInner {
            uri: uri.into(),
            start_time: None,
            end_time: None,
            tag,
            replay_gain: None,
        }))
    }

    pub fn with_trim(mut self, start: Option<Duration>, end: Option<Duration>) -> Self {
        let inner = Arc::make_mut(&mut self.0);
        inner.start_time = start;
        inner.end_time = end;
        self
    }

    pub fn with_replay_gain(mut self, rg: ReplayGainInfo) -> Self {
        Arc::make_mut(&mut self.0).replay_gain = Some(rg);
        self
    }

    pub fn uri(&self) -> &str {
        &self.0.uri
    }

    pub fn start_time(&self) -> Option<Duration> {
        self.0.start_time
    }

    pub fn end_time(&self) -> Option<Duration> {
        self.0.end_time
    }

    pub fn tag(&self) -> &Tag {
        &self.0.tag
    }

    pub fn replay_gain(&self) -> Option<ReplayGainInfo> {
        self.0.replay_gain
    }

    /// Identity comparison: two `SongRef`s queued separately are never equal
    /// even if they name the same URI, matching the source's pointer-identity
    /// song semantics.
    pub fn is_same_song(&self, other: &SongRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Same pointer-identity rule as [`SongRef::is_same_song`]; kept as a real
/// `PartialEq` impl so `SongRef` can sit inside other `#[derive(PartialEq)]`
/// types (e.g. `PlayerCommand`) without inventing a separate value-equality
/// notion.
impl PartialEq for SongRef {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_song(other)
    }
}

impl Clone for SongRefInner {
    fn clone(&self) -> Self {
        Self {
            uri: self.uri.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            tag: self.tag.clone(),
            replay_gain: self.replay_gain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_not_value_equality() {
        let a = SongRef::new("file:///a.flac", Tag::new());
        let b = SongRef::new("file:///a.flac", Tag::new());
        assert!(!a.is_same_song(&b));
        assert!(a.is_same_song(&a.clone()));
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The decoder plugin selection algorithm (§4.1) and the table plugins
//! register into (§9: "a central table" replacing macro-generated vtables).

use std::sync::Arc;

use player_plugin_api::DecoderPlugin;

/// Case-insensitive suffix, without the leading dot, extracted from a URI's
/// path component.
fn suffix_of(uri: &str) -> Option<String> {
    let path = uri.rsplit('/').next().unwrap_or(uri);
    path.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

/// Immutable after startup registration; every decoder plugin the daemon
/// knows about lives here, looked up by suffix or MIME type.
#[derive(Default)]
pub struct DecoderRegistry {
    plugins: Vec<Arc<dyn DecoderPlugin>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Arc<dyn DecoderPlugin>) {
        self.plugins.push(plugin);
    }

    pub fn by_mime(&self, mime: &str) -> Option<Arc<dyn DecoderPlugin>> {
        self.plugins
            .iter()
            .find(|p| p.mime_types().iter().any(|m| m.eq_ignore_ascii_case(mime)))
            .cloned()
    }

    pub fn by_suffix(&self, suffix: &str) -> Option<Arc<dyn DecoderPlugin>> {
        self.plugins
            .iter()
            .find(|p| p.suffixes().iter().any(|s| s.eq_ignore_ascii_case(suffix)))
            .cloned()
    }

    /// §4.1 selection algorithm: remote URIs are matched by the MIME type of
    /// the opened stream; local URIs by suffix; when both are available, MIME
    /// wins and suffix is the fallback. Returns the first match only; callers
    /// that need the full fallback chain (§4.1 step 2: "try candidates in
    /// registration order, stopping at the first one whose decode produced at
    /// least one chunk") should use [`Self::candidates`] instead.
    pub fn select(&self, uri: &str, stream_mime: Option<&str>) -> Option<Arc<dyn DecoderPlugin>> {
        self.candidates(uri, stream_mime).into_iter().next()
    }

    /// Every registered plugin that claims `uri` (by MIME, then by suffix),
    /// in registration order, MIME matches before suffix matches, with
    /// duplicates removed. The player thread walks this list trying each
    /// plugin in turn until one calls `Ready` (§4.1 step 2).
    pub fn candidates(&self, uri: &str, stream_mime: Option<&str>) -> Vec<Arc<dyn DecoderPlugin>> {
        let mut out: Vec<Arc<dyn DecoderPlugin>> = Vec::new();
        let mut push_unique = |p: Arc<dyn DecoderPlugin>| {
            if !out.iter().any(|existing| Arc::ptr_eq(existing, &p)) {
                out.push(p);
            }
        };

        if let Some(mime) = stream_mime {
            self.plugins
                .iter()
                .filter(|p| p.mime_types().iter().any(|m| m.eq_ignore_ascii_case(mime)))
                .cloned()
                .for_each(&mut push_unique);
        }
        if let Some(suffix) = suffix_of(uri) {
            self.plugins
                .iter()
                .filter(|p| p.suffixes().iter().any(|s| s.eq_ignore_ascii_case(&suffix)))
                .cloned()
                .for_each(&mut push_unique);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubPlugin {
        name: &'static str,
        suffixes: Vec<&'static str>,
        mimes: Vec<&'static str>,
    }

    impl DecoderPlugin for StubPlugin {
        fn name(&self) -> &str {
            self.name
        }
        fn suffixes(&self) -> &[&str] {
            &self.suffixes
        }
        fn mime_types(&self) -> &[&str] {
            &self.mimes
        }
    }

    fn registry() -> DecoderRegistry {
        let mut r = DecoderRegistry::new();
        r.register(Arc::new(StubPlugin {
            name: "wave",
            suffixes: vec!["wav"],
            mimes: vec!["audio/x-wav"],
        }));
        r.register(Arc::new(StubPlugin {
            name: "null",
            suffixes: vec!["null"],
            mimes: vec![],
        }));
        r
    }

    #[test]
    fn local_uri_matches_by_suffix() {
        let r = registry();
        let p = r.select("file:///music/song.wav", None).unwrap();
        assert_eq!(p.name(), "wave");
    }

    #[test]
    fn mime_wins_over_suffix_when_they_disagree() {
        let mut r = registry();
        r.register(Arc::new(StubPlugin {
            name: "mystery",
            suffixes: vec!["wav"],
            mimes: vec!["audio/mpeg"],
        }));
        // both "wave" and "mystery" claim .wav; MIME audio/mpeg should pick
        // the plugin that declares it, not the first suffix match.
        let p = r.select("http://host/stream.wav", Some("audio/mpeg")).unwrap();
        assert_eq!(p.name(), "mystery");
    }

    #[test]
    fn unknown_suffix_returns_none() {
        let r = registry();
        assert!(r.select("file:///music/song.xyz", None).is_none());
    }

    #[test]
    fn candidates_falls_through_to_every_suffix_match_in_order() {
        let mut r = registry();
        r.register(Arc::new(StubPlugin {
            name: "wave-alt",
            suffixes: vec!["wav"],
            mimes: vec![],
        }));
        let names: Vec<&str> = r
            .candidates("file:///music/song.wav", None)
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["wave", "wave-alt"]);
    }

    #[test]
    fn candidates_dedupes_a_plugin_matching_both_mime_and_suffix() {
        let r = registry();
        let names: Vec<&str> = r
            .candidates("http://host/stream.wav", Some("audio/x-wav"))
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["wave"]);
    }
}

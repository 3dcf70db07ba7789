// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Linear cross-fade mixing between the tail of the current song and the
//! head of the next (§4.3, §8 scenario 2), with MixRamp envelopes as the
//! alternative shape when both songs carry one (GLOSSARY, §9's resolution of
//! the `crossfade_seconds` vs. mix-ramp open question).

use std::time::Duration;

use player_plugin_api::{AudioFormat, MixRampInfo};

use crate::filter::samples::{db_to_linear, read_sample, write_sample};

/// Plain linear cross-fade: mix two equal-length, frame-aligned buffers of
/// the same `AudioFormat`, with song A's weight falling from 1 to ~0 and
/// song B's rising from ~0 to 1 across the *whole cross-fade window*, not
/// just this one buffer (§8 scenario 2's formula: `weight = i / 44100` for
/// frame `i` of the overlap, not `i` of whatever chunk happens to carry it).
/// `frame_offset` is how many overlap frames have already been mixed before
/// this call; `total_frames` is the overlap's full length.
pub fn mix_linear(
    a: &[u8],
    b: &[u8],
    format: AudioFormat,
    frame_offset: u64,
    total_frames: u64,
) -> Vec<u8> {
    debug_assert_eq!(a.len(), b.len());
    let frame_size = format.frame_size().max(1) as usize;
    let channels = format.channels as usize;
    let sample_size = format.format.sample_size() as usize;
    let total_frames = total_frames.max(1);
    let mut out = vec![0u8; a.len()];
    for i in 0..(a.len() / frame_size) {
        let weight_b = ((frame_offset + i as u64) as f32 / total_frames as f32).min(1.0);
        let weight_a = 1.0 - weight_b;
        for ch in 0..channels {
            let off = i * frame_size + ch * sample_size;
            let sa = read_sample(a, off, format.format);
            let sb = read_sample(b, off, format.format);
            write_sample(&mut out, off, format.format, sa * weight_a + sb * weight_b);
        }
    }
    out
}

fn interpolate_db(points: &[(Duration, f32)], t: Duration) -> Option<f32> {
    if points.is_empty() {
        return None;
    }
    if points.len() == 1 {
        return Some(points[0].1);
    }
    if t <= points[0].0 {
        return Some(points[0].1);
    }
    if t >= points[points.len() - 1].0 {
        return Some(points[points.len() - 1].1);
    }
    for window in points.windows(2) {
        let (t0, db0) = window[0];
        let (t1, db1) = window[1];
        if t >= t0 && t <= t1 {
            let span = (t1 - t0).as_secs_f32();
            if span <= 0.0 {
                return Some(db0);
            }
            let frac = (t - t0).as_secs_f32() / span;
            return Some(db0 + (db1 - db0) * frac);
        }
    }
    None
}

/// Mix using MixRamp envelopes when both songs declare one; falls back to
/// [`mix_linear`]'s plain shape otherwise (§9: "mix-ramp, when present on
/// both songs, overrides the scalar crossfade duration; when present on only
/// one song, is ignored"). `frame_offset`/`total_frames` carry the same
/// whole-window position `mix_linear` needs, since the ramp's own time axis
/// (`t`) must also run across the full overlap rather than restart every
/// buffer.
pub fn mix_with_mixramp(
    a: &[u8],
    b: &[u8],
    format: AudioFormat,
    mixramp_a: Option<&MixRampInfo>,
    mixramp_b: Option<&MixRampInfo>,
    frame_offset: u64,
    total_frames: u64,
) -> Vec<u8> {
    let (Some(ra), Some(rb)) = (mixramp_a, mixramp_b) else {
        return mix_linear(a, b, format, frame_offset, total_frames);
    };
    if ra.end.is_empty() || rb.start.is_empty() {
        return mix_linear(a, b, format, frame_offset, total_frames);
    }

    let frame_size = format.frame_size().max(1) as usize;
    let channels = format.channels as usize;
    let sample_size = format.format.sample_size() as usize;
    let frame_count = a.len() / frame_size;
    let mut out = vec![0u8; a.len()];

    for i in 0..frame_count {
        let t = Duration::from_secs_f64((frame_offset + i as u64) as f64 / format.sample_rate as f64);
        let gain_a = interpolate_db(&ra.end, t).map(db_to_linear).unwrap_or(1.0);
        let gain_b = interpolate_db(&rb.start, t).map(db_to_linear).unwrap_or(1.0);
        for ch in 0..channels {
            let off = i * frame_size + ch * sample_size;
            let sa = read_sample(a, off, format.format) * gain_a;
            let sb = read_sample(b, off, format.format) * gain_b;
            write_sample(&mut out, off, format.format, sa + sb);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use player_plugin_api::SampleFormat;

    fn fmt() -> AudioFormat {
        AudioFormat::new(4, SampleFormat::S16, 1)
    }

    #[test]
    fn mix_linear_first_frame_is_mostly_a() {
        let f = fmt();
        let mut a = vec![0u8; 8]; // 4 frames, 1 channel, s16
        let mut b = vec![0u8; 8];
        for i in 0..4 {
            write_sample(&mut a, i * 2, f.format, 1.0);
            write_sample(&mut b, i * 2, f.format, -1.0);
        }
        let out = mix_linear(&a, &b, f, 0, 4);
        let first = read_sample(&out, 0, f.format);
        let last = read_sample(&out, 6, f.format);
        assert!(first > 0.9);
        assert!(last < -0.6);
    }

    #[test]
    fn mixramp_absent_on_one_song_falls_back_to_linear() {
        let f = fmt();
        let a = vec![0u8; 8];
        let b = vec![0u8; 8];
        let ramp = MixRampInfo {
            start: vec![(Duration::ZERO, -6.0)],
            end: vec![(Duration::ZERO, -6.0)],
        };
        let out_a = mix_with_mixramp(&a, &b, f, Some(&ramp), None, 0, 4);
        let out_b = mix_linear(&a, &b, f, 0, 4);
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn weight_reaches_full_song_b_at_window_end() {
        let f = fmt();
        let mut a = vec![0u8; 8];
        let mut b = vec![0u8; 8];
        for i in 0..4 {
            write_sample(&mut a, i * 2, f.format, 1.0);
            write_sample(&mut b, i * 2, f.format, -1.0);
        }
        // Last chunk of an 8-frame window: frame_offset=4, this buffer holds
        // frames 4..8, so weight_b should approach 1.0 by the final frame.
        let out = mix_linear(&a, &b, f, 4, 8);
        let last = read_sample(&out, 6, f.format);
        assert!(last < -0.8, "expected near-full song B weight, got {last}");
    }
}

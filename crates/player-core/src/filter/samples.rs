// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sample-format-agnostic conversion to/from `f32` in `[-1.0, 1.0]`, shared by
//! every filter that needs to scale or mix PCM (ReplayGain, Volume, cross-fade
//! mixing, format conversion).

use player_plugin_api::SampleFormat;

/// Decode one sample at byte offset `i` of `format` into `[-1.0, 1.0]`.
pub fn read_sample(data: &[u8], i: usize, format: SampleFormat) -> f32 {
    match format {
        SampleFormat::S8 => (data[i] as i8) as f32 / i8::MAX as f32,
        SampleFormat::S16 => {
            let v = i16::from_le_bytes([data[i], data[i + 1]]);
            v as f32 / i16::MAX as f32
        }
        SampleFormat::S24P32 | SampleFormat::S32 => {
            let v = i32::from_le_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
            v as f32 / i32::MAX as f32
        }
        SampleFormat::Float => f32::from_le_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]),
        // DSD is a 1-bit density stream; treat each byte as 8 pulse-density
        // bits averaged into one crude amplitude sample. Not bit-exact, but
        // DSD never flows through the mixing-sensitive filters (ReplayGain,
        // Volume, cross-fade) in practice — they are disabled upstream.
        SampleFormat::Dsd => {
            let bits = data[i].count_ones();
            (bits as f32 / 4.0) - 1.0
        }
    }
}

pub fn write_sample(data: &mut [u8], i: usize, format: SampleFormat, value: f32) {
    let clamped = value.clamp(-1.0, 1.0);
    match format {
        SampleFormat::S8 => {
            data[i] = (clamped * i8::MAX as f32) as i8 as u8;
        }
        SampleFormat::S16 => {
            let v = (clamped * i16::MAX as f32) as i16;
            data[i..i + 2].copy_from_slice(&v.to_le_bytes());
        }
        SampleFormat::S24P32 | SampleFormat::S32 => {
            let v = (clamped * i32::MAX as f32) as i32;
            data[i..i + 4].copy_from_slice(&v.to_le_bytes());
        }
        SampleFormat::Float => {
            data[i..i + 4].copy_from_slice(&clamped.to_le_bytes());
        }
        SampleFormat::Dsd => {
            let bits = ((clamped + 1.0) * 4.0).round().clamp(0.0, 8.0) as u32;
            data[i] = (0xFFu32 >> (8 - bits)) as u8;
        }
    }
}

pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s16_round_trips_within_one_lsb() {
        let mut buf = [0u8; 2];
        write_sample(&mut buf, 0, SampleFormat::S16, 0.5);
        let back = read_sample(&buf, 0, SampleFormat::S16);
        assert!((back - 0.5).abs() < 0.001);
    }

    #[test]
    fn float_round_trips_exactly() {
        let mut buf = [0u8; 4];
        write_sample(&mut buf, 0, SampleFormat::Float, -0.25);
        assert_eq!(read_sample(&buf, 0, SampleFormat::Float), -0.25);
    }

    #[test]
    fn db_to_linear_unity_at_zero() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
    }
}

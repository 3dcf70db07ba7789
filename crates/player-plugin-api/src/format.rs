// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The `AudioFormat` triple and the sample formats the core understands.

use std::fmt;

/// One of the PCM sample encodings a decoder or output plugin may produce/accept.
///
/// Order matters for nothing; this is not a priority list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    S8,
    S16,
    /// 24-bit samples packed into 32-bit words, low byte zero.
    S24P32,
    S32,
    Float,
    Dsd,
}

impl SampleFormat {
    /// Size in bytes of one sample in this format.
    pub fn sample_size(self) -> u32 {
        match self {
            SampleFormat::S8 => 1,
            SampleFormat::S16 => 2,
            SampleFormat::S24P32 => 4,
            SampleFormat::S32 => 4,
            SampleFormat::Float => 4,
            SampleFormat::Dsd => 1,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SampleFormat::S8 => "8bit",
            SampleFormat::S16 => "16bit",
            SampleFormat::S24P32 => "24bit",
            SampleFormat::S32 => "32bit",
            SampleFormat::Float => "floating",
            SampleFormat::Dsd => "dsd",
        };
        f.write_str(s)
    }
}

pub const MIN_SAMPLE_RATE: u32 = 8_000;
pub const MAX_SAMPLE_RATE: u32 = 768_000;
pub const MAX_CHANNELS: u8 = 8;

/// `(sample_rate, format, channels)` — immutable once a chunk carrying it is enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub format: SampleFormat,
    pub channels: u8,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, format: SampleFormat, channels: u8) -> Self {
        Self {
            sample_rate,
            format,
            channels,
        }
    }

    /// All three fields within range; the `Undefined` format-mask state is not
    /// representable by this type (masks live in the plugin layer, not here).
    pub fn is_valid(&self) -> bool {
        (MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate)
            && (1..=MAX_CHANNELS).contains(&self.channels)
    }

    /// Bytes per frame: one sample per channel.
    pub fn frame_size(&self) -> u32 {
        self.format.sample_size() * self.channels as u32
    }

    /// Bytes per second at this format, used to convert a byte offset into a chunk
    /// timestamp delta.
    pub fn bytes_to_duration(&self, bytes: u32) -> std::time::Duration {
        let frames = bytes / self.frame_size().max(1);
        std::time::Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.sample_rate, self.format, self.channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_format_round_trip() {
        let fmt = AudioFormat::new(44_100, SampleFormat::S16, 2);
        assert!(fmt.is_valid());
        assert_eq!(fmt.frame_size(), 4);
        assert_eq!(fmt.to_string(), "44100:16bit:2");
    }

    #[test]
    fn sample_rate_out_of_range_is_invalid() {
        assert!(!AudioFormat::new(1, SampleFormat::S16, 2).is_valid());
        assert!(!AudioFormat::new(800_001, SampleFormat::S16, 2).is_valid());
    }

    #[test]
    fn channel_count_out_of_range_is_invalid() {
        assert!(!AudioFormat::new(44_100, SampleFormat::S16, 0).is_valid());
        assert!(!AudioFormat::new(44_100, SampleFormat::S16, 9).is_valid());
    }

    #[test]
    fn bytes_to_duration_is_exact_for_one_second() {
        let fmt = AudioFormat::new(44_100, SampleFormat::S16, 2);
        let one_second = fmt.frame_size() * 44_100;
        assert_eq!(fmt.bytes_to_duration(one_second).as_secs(), 1);
    }
}

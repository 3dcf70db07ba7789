// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Final adaptation to whatever format the output actually negotiated
//! (§4.4: "Negotiate the output's actual AudioFormat (plugin may clamp sample
//! rate / format / channels)"). Distinct from [`super::ConvertFilter`]:
//! that stage normalizes upstream of ReplayGain/Volume math; this one only
//! engages when the negotiated hardware format differs from what arrives.

use player_plugin_api::AudioFormat;

use super::convert::ConvertFilter;
use super::Filter;
use crate::error::OutputError;

pub struct AutoConvertFilter {
    target: AudioFormat,
    inner: Option<ConvertFilter>,
}

impl AutoConvertFilter {
    pub fn new(target: AudioFormat) -> Self {
        Self {
            target,
            inner: None,
        }
    }
}

impl Filter for AutoConvertFilter {
    fn configure(&mut self, input: AudioFormat) -> Result<AudioFormat, OutputError> {
        if input == self.target {
            self.inner = None;
            return Ok(input);
        }
        let mut conv = ConvertFilter::new(self.target.sample_rate, self.target.format);
        let out = conv.configure(input)?;
        self.inner = Some(conv);
        Ok(out)
    }

    fn process(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), OutputError> {
        match &mut self.inner {
            Some(conv) => conv.process(input, out),
            None => {
                out.extend_from_slice(input);
                Ok(())
            }
        }
    }

    fn flush(&mut self, out: &mut Vec<u8>) {
        if let Some(conv) = &mut self.inner {
            conv.flush(out);
        }
    }

    fn reset(&mut self) {
        if let Some(conv) = &mut self.inner {
            conv.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use player_plugin_api::SampleFormat;

    #[test]
    fn matching_format_skips_inner_converter() {
        let fmt = AudioFormat::new(44_100, SampleFormat::S16, 2);
        let mut filter = AutoConvertFilter::new(fmt);
        filter.configure(fmt).unwrap();
        assert!(filter.inner.is_none());
    }

    #[test]
    fn mismatched_rate_builds_inner_converter() {
        let target = AudioFormat::new(48_000, SampleFormat::S16, 2);
        let mut filter = AutoConvertFilter::new(target);
        let input = AudioFormat::new(44_100, SampleFormat::S16, 2);
        filter.configure(input).unwrap();
        assert!(filter.inner.is_some());
    }
}

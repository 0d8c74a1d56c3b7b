use crate::error::{Error, Result};

/// Decoded recording handed over by the capture side: planar `f32` channels
/// at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl DecodedAudioBuffer {
    /// Builds a buffer from planar channel data.
    ///
    /// Fails when there are no channels, the sample rate is zero, or the
    /// channels differ in length. A buffer with zero samples per channel is
    /// valid.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if channels.is_empty() {
            return Err(Error::InvalidInput("channel count must be > 0".to_string()));
        }

        if channels.len() > u16::MAX as usize {
            return Err(Error::InvalidInput(format!(
                "channel count {} exceeds {}",
                channels.len(),
                u16::MAX
            )));
        }

        if sample_rate == 0 {
            return Err(Error::InvalidInput("sample_rate must be > 0".to_string()));
        }

        let expected = channels[0].len();
        if let Some((idx, ch)) = channels
            .iter()
            .enumerate()
            .find(|(_, ch)| ch.len() != expected)
        {
            return Err(Error::InvalidInput(format!(
                "channel {} has {} samples, channel 0 has {}",
                idx,
                ch.len(),
                expected
            )));
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Samples per channel.
    pub fn sample_count(&self) -> usize {
        self.channels[0].len()
    }

    pub fn channel(&self, idx: usize) -> Option<&[f32]> {
        self.channels.get(idx).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn duration_secs(&self) -> f64 {
        self.sample_count() as f64 / self.sample_rate as f64
    }
}

//! Test utilities for transcoding tests
//! Provides synthetic signal generators and level measurement helpers

use crate::audio_types::DecodedAudioBuffer;
use std::f32::consts::PI;

/// Level summary of interleaved 16-bit samples
pub struct SignalStats {
    pub sample_count: usize,
    pub sample_rate: u32,
    pub channels: u16,
    pub rms: f64,
    pub peak: i16,
}

impl SignalStats {
    pub fn new(samples: &[i16], sample_rate: u32, channels: u16) -> Self {
        let sample_count = samples.len();

        let mut sum_of_squares = 0.0f64;
        for &sample in samples {
            let normalized = sample as f64 / 32768.0;
            sum_of_squares += normalized * normalized;
        }
        let rms = if sample_count > 0 {
            (sum_of_squares / sample_count as f64).sqrt()
        } else {
            0.0
        };

        let peak = samples
            .iter()
            .map(|&s| s.saturating_abs())
            .max()
            .unwrap_or(0);

        Self {
            sample_count,
            sample_rate,
            channels,
            rms,
            peak,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.sample_count as f64 / self.channels as f64 / self.sample_rate as f64
    }

    pub fn rms_db(&self) -> f64 {
        if self.rms > 0.0 {
            20.0 * self.rms.log10()
        } else {
            -96.0
        }
    }
}

/// One channel of a sine tone
pub fn sine(frequency: f32, amplitude: f32, sample_rate: u32, frames: usize) -> Vec<f32> {
    (0..frames)
        .map(|i| amplitude * (2.0 * PI * frequency * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// A buffer with every channel set to zero
pub fn silent_buffer(sample_rate: u32, channels: usize, frames: usize) -> DecodedAudioBuffer {
    DecodedAudioBuffer::new(sample_rate, vec![vec![0.0; frames]; channels])
        .expect("valid silent buffer")
}

/// A buffer with the same tone on every channel
pub fn tone_buffer(
    frequency: f32,
    sample_rate: u32,
    channels: usize,
    frames: usize,
) -> DecodedAudioBuffer {
    let tone = sine(frequency, 0.5, sample_rate, frames);
    DecodedAudioBuffer::new(sample_rate, vec![tone; channels]).expect("valid tone buffer")
}

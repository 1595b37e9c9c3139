//! Audio Buffer Management
//!
//! Provides the core audio buffer type shared by the synthesizers, the
//! acquisition policy and the compositor. Duration is always derived from the
//! sample count and sample rate; it is never stored.

// ============================================================================
// Constants
// ============================================================================

/// Baseline sample rate for synthesis and mixing (44.1kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Calculate the linear RMS level over every channel of a buffer
///
/// Returns 0.0 for empty buffers.
pub fn calculate_rms(buffer: &AudioBuffer) -> f32 {
    let total_samples = buffer.channels() * buffer.len();
    if total_samples == 0 {
        return 0.0;
    }

    let sum_squares: f64 = buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| (s as f64) * (s as f64))
        .sum();

    (sum_squares / total_samples as f64).sqrt() as f32
}

/// Calculate the absolute peak of a buffer (linear)
pub fn calculate_peak(buffer: &AudioBuffer) -> f32 {
    buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| s.abs())
        .fold(0.0_f32, f32::max)
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    #[default]
    Mono,
    /// Two channels (stereo: left, right)
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Core audio buffer type
///
/// Stores audio as non-interleaved 32-bit floating point samples, one
/// `Vec<f32>` per channel.
///
/// # Example
/// ```
/// use somnus::engine::buffer::{AudioBuffer, ChannelLayout, DEFAULT_SAMPLE_RATE};
///
/// let buffer = AudioBuffer::new(DEFAULT_SAMPLE_RATE as usize, ChannelLayout::Stereo);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 44100);
/// assert_eq!(buffer.duration_secs(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer at the default sample rate
    pub fn new(num_samples: usize, layout: ChannelLayout) -> Self {
        Self::silent(num_samples, layout, DEFAULT_SAMPLE_RATE)
    }

    /// Create a silent buffer at an explicit sample rate
    pub fn silent(num_samples: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; layout.num_channels()],
            sample_rate,
        }
    }

    /// Wrap a single channel of samples as a mono buffer
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: vec![samples],
            sample_rate,
        }
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ...)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_channels = self.channels();
        let num_samples = self.len();

        let mut interleaved = Vec::with_capacity(num_channels * num_samples);
        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds, derived from sample count and rate
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get the channel layout
    pub fn channel_layout(&self) -> Option<ChannelLayout> {
        ChannelLayout::from_count(self.channels())
    }

    /// Immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Check that every sample lies in [-1.0, 1.0]
    pub fn is_within_unit_range(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| (-1.0..=1.0).contains(s))
    }

    /// Clamp all samples to the valid range [-1.0, 1.0]
    ///
    /// NaN samples become silence so they can never wrap at export.
    pub fn clamp(&mut self) {
        for channel in &mut self.samples {
            for sample in channel.iter_mut() {
                *sample = if sample.is_nan() {
                    0.0
                } else {
                    sample.clamp(-1.0, 1.0)
                };
            }
        }
    }

    /// Multiply every sample by a linear gain
    pub fn scale(&mut self, gain: f32) {
        for channel in &mut self.samples {
            for sample in channel.iter_mut() {
                *sample *= gain;
            }
        }
    }

    /// Shorten the buffer to at most `num_samples` per channel
    ///
    /// Never pads: a buffer already shorter is left untouched.
    pub fn truncate(&mut self, num_samples: usize) {
        for channel in &mut self.samples {
            channel.truncate(num_samples);
        }
    }

    /// Convert to the requested channel layout
    ///
    /// Mono is duplicated into both stereo channels; stereo is averaged down
    /// to mono.
    pub fn into_layout(self, layout: ChannelLayout) -> Self {
        let sample_rate = self.sample_rate;
        match (self.channel_layout(), layout) {
            (Some(current), target) if current == target => self,
            (Some(ChannelLayout::Mono), ChannelLayout::Stereo) => {
                let mono = self.samples.into_iter().next().unwrap_or_default();
                Self {
                    samples: vec![mono.clone(), mono],
                    sample_rate,
                }
            }
            _ => {
                let channels = self.channels().max(1) as f32;
                let len = self.len();
                let mut mixed = vec![0.0_f32; len];
                for channel in &self.samples {
                    for (out, &s) in mixed.iter_mut().zip(channel.iter()) {
                        *out += s / channels;
                    }
                }
                let base = Self::from_mono(mixed, sample_rate);
                if layout == ChannelLayout::Stereo {
                    base.into_layout(ChannelLayout::Stereo)
                } else {
                    base
                }
            }
        }
    }
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::new(0, ChannelLayout::Mono)
    }
}

// ============================================================================
// Tests
// ============================================================================

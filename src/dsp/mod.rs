//! Signal Primitives
//!
//! Stateless numeric building blocks for the soundscape layers: Gaussian
//! noise, a zero-phase Butterworth low-pass, linear fades, and the clamp +
//! 16-bit quantization used at every export boundary.

mod filter;
mod primitives;

pub use filter::{filtfilt, BiquadCoeffs};
pub(crate) use primitives::sine;
pub use primitives::{fade, lowpass, normalize_and_quantize, white_noise, DEFAULT_FADE_SECS};

//! Single-tone power estimation via the Goertzel recurrence.
//!
//! One resonator evaluates one DFT frequency point over an N-sample window
//! in O(N), independent of the other candidate tones. Only relative powers
//! matter for hard-decision demodulation, so no normalization is applied.

use std::f64::consts::PI;

/// A fixed-frequency Goertzel resonator. The entire per-tone configuration
/// reduces to one coefficient, `2 * cos(omega)`.
#[derive(Debug, Clone, Copy)]
pub struct Goertzel {
    coeff: f32,
}

impl Goertzel {
    /// Resonator for an arbitrary tone: `omega = 2*pi*freq / sample_rate`.
    pub fn for_frequency(freq: f64, sample_rate: u32) -> Self {
        let omega = 2.0 * PI * freq / sample_rate as f64;
        Self {
            coeff: (2.0 * omega.cos()) as f32,
        }
    }

    /// Resonator pinned to integer DFT bin `k` of an n-point window:
    /// `omega = 2*pi*k / n`. Exact-bin tones are orthogonal over the window.
    pub fn for_bin(bin: u32, n: usize) -> Self {
        let omega = 2.0 * PI * bin as f64 / n as f64;
        Self {
            coeff: (2.0 * omega.cos()) as f32,
        }
    }

    /// Relative power of the target tone in `window`. Scaling (and even
    /// sign, in degenerate cases) is arbitrary; only comparisons between
    /// resonators over the same window are meaningful.
    pub fn power(&self, window: &[i16]) -> f32 {
        let mut s_prev = 0.0f32;
        let mut s_prev2 = 0.0f32;
        for &x in window {
            let s = x as f32 + self.coeff * s_prev - s_prev2;
            s_prev2 = s_prev;
            s_prev = s;
        }
        s_prev * s_prev + s_prev2 * s_prev2 - self.coeff * s_prev * s_prev2
    }
}

//! 16-FSK modulation: four bits per symbol, one sinusoid per symbol value.

use std::f64::consts::PI;

use crate::config::{ModemConfig, ToneMap};
use crate::error::Result;
use crate::goertzel::Goertzel;
use crate::{BITS_PER_SYMBOL, NUM_TONES};

/// Preamble symbol value at position `i`: alternating 0, 15, 0, 15, ...
pub fn sync_symbol(i: usize) -> usize {
    if i % 2 == 0 {
        0
    } else {
        15
    }
}

/// Pack coded bits into 4-bit symbol values, b3 first.
/// The caller guarantees `bits.len()` is a multiple of four (the
/// convolutional encoder's output always is).
pub fn bits_to_symbols(bits: &[u8]) -> Vec<u8> {
    debug_assert_eq!(bits.len() % BITS_PER_SYMBOL, 0);
    bits.chunks_exact(BITS_PER_SYMBOL)
        .map(|chunk| chunk.iter().fold(0u8, |sym, &b| (sym << 1) | (b & 1)))
        .collect()
}

/// Unpack a symbol value into its four coded bits, b3 first.
pub fn symbol_to_bits(symbol: u8) -> [u8; 4] {
    [
        (symbol >> 3) & 1,
        (symbol >> 2) & 1,
        (symbol >> 1) & 1,
        symbol & 1,
    ]
}

/// Modulator: one pre-tabulated waveform per symbol value.
pub struct FskModulator {
    waves: Vec<Vec<i16>>,
    samples_per_symbol: usize,
}

impl FskModulator {
    /// Build the 16-entry waveform LUT. Each buffer holds
    /// `amplitude * sin(2*pi*f_i*n / sample_rate)` for one symbol window,
    /// rounded to the nearest integer sample.
    pub fn new(config: &ModemConfig) -> Result<Self> {
        let n = config.samples_per_symbol()?;
        let freqs = config.tones.frequencies(config.sample_rate, n)?;

        let mut waves = Vec::with_capacity(NUM_TONES);
        for &freq in freqs.iter() {
            let mut wave = Vec::with_capacity(n);
            for i in 0..n {
                let t = i as f64 / config.sample_rate as f64;
                let v = config.amplitude as f64 * (2.0 * PI * freq * t).sin();
                wave.push(v.round() as i16);
            }
            waves.push(wave);
        }

        Ok(Self {
            waves,
            samples_per_symbol: n,
        })
    }

    pub fn samples_per_symbol(&self) -> usize {
        self.samples_per_symbol
    }

    /// Waveform for one symbol value 0..15.
    pub fn symbol_wave(&self, symbol: usize) -> &[i16] {
        &self.waves[symbol & 0xF]
    }
}

/// Demodulator: Goertzel power at each candidate tone, hard argmax.
pub struct FskDemodulator {
    detectors: [Goertzel; NUM_TONES],
    samples_per_symbol: usize,
    windowed: bool,
}

impl FskDemodulator {
    pub fn new(config: &ModemConfig) -> Result<Self> {
        let n = config.samples_per_symbol()?;
        config.tones.validate(n)?;

        let detectors = match config.tones {
            ToneMap::FreeFreq(freqs) => freqs.map(|f| Goertzel::for_frequency(f, config.sample_rate)),
            ToneMap::DftBin(bins) => bins.map(|k| Goertzel::for_bin(k, n)),
        };

        Ok(Self {
            detectors,
            samples_per_symbol: n,
            // Window conditioning pays off only when tones sit on exact
            // bins; free-running tones leak across bins regardless.
            windowed: config.tones.is_dft_aligned(),
        })
    }

    pub fn samples_per_symbol(&self) -> usize {
        self.samples_per_symbol
    }

    /// Hard symbol decision for one window: argmax of tone power.
    /// Ties keep the lower symbol index.
    pub fn detect_symbol(&self, window: &[i16]) -> u8 {
        let conditioned;
        let window = if self.windowed {
            conditioned = condition_window(window);
            conditioned.as_slice()
        } else {
            window
        };

        let mut best = 0u8;
        let mut best_power = f32::NEG_INFINITY;
        for (i, detector) in self.detectors.iter().enumerate() {
            let power = detector.power(window);
            if power > best_power {
                best_power = power;
                best = i as u8;
            }
        }
        best
    }
}

/// Mean removal plus Hann taper, clamped and requantized to 16 bits.
/// Suppresses DC and edge-discontinuity leakage across single-bin spacing.
fn condition_window(window: &[i16]) -> Vec<i16> {
    let n = window.len();
    let mean = window.iter().map(|&x| x as f64).sum::<f64>() / n as f64;
    let denom = n.saturating_sub(1).max(1) as f64;
    window
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let w = 0.5 - 0.5 * (2.0 * PI * i as f64 / denom).cos();
            let v = ((x as f64 - mean) * w).round();
            v.clamp(i16::MIN as f64, i16::MAX as f64) as i16
        })
        .collect()
}

use crate::error::{ModemError, Result};
use crate::{
    DEFAULT_AMPLITUDE, DEFAULT_BINS, DEFAULT_SAMPLE_RATE, DEFAULT_SYMBOL_DURATION,
    DEFAULT_SYNC_SYMBOLS, NUM_TONES,
};

/// Mapping from the 16 symbol values to transmit tones.
///
/// Both ends of a link must use the same map; a mismatch is not detectable
/// on the wire and produces garbage symbol decisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToneMap {
    /// Sixteen caller-specified tones in Hz with no relation to the symbol
    /// window length. Kept for compatibility with fixed tone plans.
    FreeFreq([f64; NUM_TONES]),
    /// Sixteen DFT bin indices: tone i sits exactly at bin `k_i` of an
    /// N-point DFT of the symbol window, i.e. `f_i = k_i * sample_rate / N`.
    /// Bin-aligned tones are orthogonal over one window, which is why this
    /// is the preferred mode. Requires `0 < k < N/2` for every bin.
    DftBin([u32; NUM_TONES]),
}

impl Default for ToneMap {
    fn default() -> Self {
        ToneMap::DftBin(DEFAULT_BINS)
    }
}

impl ToneMap {
    /// Whether the tones are pinned to DFT bins of the symbol window.
    /// The demodulator couples its window conditioning to this.
    pub fn is_dft_aligned(&self) -> bool {
        matches!(self, ToneMap::DftBin(_))
    }

    /// Check the bin constraint `0 < k < n/2` for an n-sample window.
    pub fn validate(&self, n: usize) -> Result<()> {
        if let ToneMap::DftBin(bins) = self {
            for &k in bins {
                if k == 0 || 2 * k as usize >= n {
                    return Err(ModemError::InvalidConfig(format!(
                        "DFT bin {k} outside (0, {n}/2)"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolve the 16 tone frequencies in Hz for an n-sample window.
    pub fn frequencies(&self, sample_rate: u32, n: usize) -> Result<[f64; NUM_TONES]> {
        self.validate(n)?;
        match *self {
            ToneMap::FreeFreq(freqs) => Ok(freqs),
            ToneMap::DftBin(bins) => {
                let mut freqs = [0.0; NUM_TONES];
                for (f, &k) in freqs.iter_mut().zip(bins.iter()) {
                    *f = k as f64 * sample_rate as f64 / n as f64;
                }
                Ok(freqs)
            }
        }
    }
}

/// Modem parameters, shared by encoder and decoder. Everything is passed
/// explicitly; there is no global state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModemConfig {
    /// PCM sample rate in Hz.
    pub sample_rate: u32,
    /// Duration of one FSK symbol in seconds.
    pub symbol_duration: f64,
    /// Number of alternating 0/15 preamble symbols before the data.
    pub sync_symbols: usize,
    /// Peak amplitude of the generated sinusoids (encode side only).
    pub amplitude: i16,
    /// Symbol value to tone assignment.
    pub tones: ToneMap,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            symbol_duration: DEFAULT_SYMBOL_DURATION,
            sync_symbols: DEFAULT_SYNC_SYMBOLS,
            amplitude: DEFAULT_AMPLITUDE,
            tones: ToneMap::default(),
        }
    }
}

impl ModemConfig {
    /// Samples per symbol window, `N = floor(sample_rate * symbol_duration)`.
    pub fn samples_per_symbol(&self) -> Result<usize> {
        let n = (self.sample_rate as f64 * self.symbol_duration) as usize;
        if n == 0 {
            return Err(ModemError::InvalidConfig(format!(
                "symbol duration {} s too short for sample rate {} Hz",
                self.symbol_duration, self.sample_rate
            )));
        }
        Ok(n)
    }
}

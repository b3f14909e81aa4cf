use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::debug;

use crate::config::ModemConfig;
use crate::error::{ModemError, Result};
use crate::fec::{bytes_to_bits, conv_encode};
use crate::framing::build_frame;
use crate::fsk::{bits_to_symbols, sync_symbol, FskModulator};
use crate::wav::WavHeader;

/// Transmit pipeline: frame -> bit stream -> convolutional code -> 16-FSK
/// symbols, prefixed by the sync preamble.
pub struct Encoder {
    config: ModemConfig,
    modulator: FskModulator,
}

impl Encoder {
    pub fn new(config: ModemConfig) -> Result<Self> {
        let modulator = FskModulator::new(&config)?;
        Ok(Self { config, modulator })
    }

    /// Modulate one payload into mono 16-bit samples.
    pub fn encode(&self, payload: &[u8], seq: u8) -> Result<Vec<i16>> {
        let symbols = self.coded_symbols(payload, seq)?;
        // Checked up front so an oversized result fails before modulation
        let header = self.wav_header(symbols.len())?;

        let mut samples = Vec::with_capacity(header.num_samples() as usize);
        for i in 0..self.config.sync_symbols {
            samples.extend_from_slice(self.modulator.symbol_wave(sync_symbol(i)));
        }
        for &symbol in &symbols {
            samples.extend_from_slice(self.modulator.symbol_wave(symbol as usize));
        }
        Ok(samples)
    }

    /// Encode straight into a WAV stream. The header goes out first with
    /// pre-computed sizes; the samples follow sequentially, so the writer
    /// never needs to seek.
    pub fn encode_to_writer<W: Write>(&self, payload: &[u8], seq: u8, writer: &mut W) -> Result<()> {
        let symbols = self.coded_symbols(payload, seq)?;
        let header = self.wav_header(symbols.len())?;
        header.write_to(writer)?;

        for i in 0..self.config.sync_symbols {
            write_wave(writer, self.modulator.symbol_wave(sync_symbol(i)))?;
        }
        for &symbol in &symbols {
            write_wave(writer, self.modulator.symbol_wave(symbol as usize))?;
        }

        debug!(
            sync_symbols = self.config.sync_symbols,
            data_symbols = symbols.len(),
            total_samples = header.num_samples(),
            "WAV stream written"
        );
        Ok(())
    }

    /// Frame, serialize and code the payload down to 4-bit symbol values.
    fn coded_symbols(&self, payload: &[u8], seq: u8) -> Result<Vec<u8>> {
        if payload.is_empty() {
            return Err(ModemError::InputEmpty);
        }

        let frame = build_frame(payload, seq)?;
        let bits = bytes_to_bits(&frame);
        let coded = conv_encode(&bits);
        debug!(
            payload_bytes = payload.len(),
            frame_bytes = frame.len(),
            coded_bits = coded.len(),
            "payload framed and coded"
        );
        Ok(bits_to_symbols(&coded))
    }

    fn wav_header(&self, data_symbols: usize) -> Result<WavHeader> {
        let total_symbols = self.config.sync_symbols as u64 + data_symbols as u64;
        let total_samples = total_symbols * self.modulator.samples_per_symbol() as u64;
        WavHeader::for_samples(self.config.sample_rate, total_samples)
    }
}

fn write_wave<W: Write>(writer: &mut W, wave: &[i16]) -> Result<()> {
    for &sample in wave {
        writer.write_i16::<LittleEndian>(sample)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BITS_PER_SYMBOL;

    #[test]
    fn test_empty_payload_rejected() {
        let encoder = Encoder::new(ModemConfig::default()).unwrap();
        assert!(matches!(encoder.encode(&[], 0), Err(ModemError::InputEmpty)));
    }

    #[test]
    fn test_sample_count() {
        let config = ModemConfig::default();
        let encoder = Encoder::new(config).unwrap();
        let samples = encoder.encode(&[0x42], 0).unwrap();

        // 1-byte payload -> 8-byte frame -> 64 bits -> 2*(64+2) coded bits
        let coded_bits = 2 * (8 * 8 + 2);
        let n = config.samples_per_symbol().unwrap();
        let expected = (config.sync_symbols + coded_bits / BITS_PER_SYMBOL) * n;
        assert_eq!(samples.len(), expected);
    }

    #[test]
    fn test_preamble_alternates() {
        let config = ModemConfig::default();
        let encoder = Encoder::new(config).unwrap();
        let modulator = FskModulator::new(&config).unwrap();
        let n = config.samples_per_symbol().unwrap();

        let samples = encoder.encode(&[0xFF], 0).unwrap();
        assert_eq!(&samples[..n], modulator.symbol_wave(0));
        assert_eq!(&samples[n..2 * n], modulator.symbol_wave(15));
        assert_eq!(&samples[2 * n..3 * n], modulator.symbol_wave(0));
    }

    #[test]
    fn test_writer_output_matches_encode() {
        let config = ModemConfig::default();
        let encoder = Encoder::new(config).unwrap();
        let payload = b"writer parity";

        let samples = encoder.encode(payload, 5).unwrap();
        let mut streamed = Vec::new();
        encoder.encode_to_writer(payload, 5, &mut streamed).unwrap();

        let mut buffered = Vec::new();
        crate::wav::write_wav_mono16(&mut buffered, &samples, config.sample_rate).unwrap();
        assert_eq!(streamed, buffered);
    }

    #[test]
    fn test_deterministic() {
        let encoder = Encoder::new(ModemConfig::default()).unwrap();
        let a = encoder.encode(b"determinism", 1).unwrap();
        let b = encoder.encode(b"determinism", 1).unwrap();
        assert_eq!(a, b);
    }
}

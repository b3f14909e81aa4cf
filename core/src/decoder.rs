use std::io::{ErrorKind, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::debug;

use crate::config::ModemConfig;
use crate::error::{ModemError, Result};
use crate::fec::{bits_to_bytes, viterbi_decode};
use crate::framing::parse_frame;
use crate::fsk::{symbol_to_bits, FskDemodulator};
use crate::wav::WavHeader;
use crate::BITS_PER_SYMBOL;

/// Receive pipeline: symbol windows -> coded bits -> Viterbi -> frame.
///
/// Symbol timing is open-loop: the first `sync_symbols` windows are
/// discarded and every following window is sliced at a fixed multiple of
/// the symbol length. The sample clock must match the encoder's.
pub struct Decoder {
    config: ModemConfig,
    demodulator: FskDemodulator,
}

impl Decoder {
    pub fn new(config: ModemConfig) -> Result<Self> {
        let demodulator = FskDemodulator::new(&config)?;
        Ok(Self {
            config,
            demodulator,
        })
    }

    /// Decode a sample stream produced by [`Encoder::encode`]. Returns the
    /// payload and the frame sequence number.
    pub fn decode(&self, samples: &[i16]) -> Result<(Vec<u8>, u8)> {
        let n = self.demodulator.samples_per_symbol();
        let total_symbols = samples.len() / n;
        let sync = self.config.sync_symbols;
        if total_symbols <= sync {
            return Err(ModemError::NotEnoughSymbols {
                total: total_symbols as u64,
                sync: sync as u64,
            });
        }

        let mut coded = Vec::with_capacity((total_symbols - sync) * BITS_PER_SYMBOL);
        for index in sync..total_symbols {
            let window = &samples[index * n..(index + 1) * n];
            let symbol = self.demodulator.detect_symbol(window);
            coded.extend_from_slice(&symbol_to_bits(symbol));
        }
        self.decode_coded_bits(&coded)
    }

    /// Decode a WAV stream: validate the header against the configured
    /// sample rate, then consume one symbol window at a time.
    pub fn decode_from_reader<R: Read>(&self, reader: &mut R) -> Result<(Vec<u8>, u8)> {
        let header = WavHeader::read_from(reader)?;
        if header.sample_rate != self.config.sample_rate {
            return Err(ModemError::WavFormatInvalid(format!(
                "sample rate {} Hz, decoder configured for {} Hz",
                header.sample_rate, self.config.sample_rate
            )));
        }

        let n = self.demodulator.samples_per_symbol();
        let total_symbols = header.num_samples() / n as u64;
        let sync = self.config.sync_symbols as u64;
        if total_symbols <= sync {
            return Err(ModemError::NotEnoughSymbols {
                total: total_symbols,
                sync,
            });
        }

        let mut window = vec![0i16; n];
        let mut coded = Vec::with_capacity(((total_symbols - sync) as usize) * BITS_PER_SYMBOL);
        for index in 0..total_symbols {
            if let Err(e) = reader.read_i16_into::<LittleEndian>(&mut window) {
                return Err(if e.kind() == ErrorKind::UnexpectedEof {
                    ModemError::WavTruncated {
                        expected: header.num_samples(),
                        actual: index * n as u64,
                    }
                } else {
                    ModemError::Io(e)
                });
            }
            if index < sync {
                continue;
            }
            let symbol = self.demodulator.detect_symbol(&window);
            coded.extend_from_slice(&symbol_to_bits(symbol));
        }
        self.decode_coded_bits(&coded)
    }

    fn decode_coded_bits(&self, coded: &[u8]) -> Result<(Vec<u8>, u8)> {
        let bits = viterbi_decode(coded)?;
        let frame = bits_to_bytes(&bits);
        let (payload, seq) = parse_frame(&frame)?;
        debug!(
            coded_bits = coded.len(),
            payload_bytes = payload.len(),
            seq,
            "frame recovered"
        );
        Ok((payload, seq))
    }
}

//! Canonical 44-byte RIFF/WAVE header handling for PCM mono 16-bit.
//!
//! Only the minimal RIFF/WAVE/"fmt "/"data" layout is supported; files with
//! extra chunks between "fmt " and "data" are rejected. All numeric fields
//! are little-endian.

use std::io::{ErrorKind, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{ModemError, Result};

/// Size of the canonical header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

const BYTES_PER_SAMPLE: u32 = 2;
const PCM_FORMAT: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// The variable part of a canonical mono 16-bit PCM header. Everything
/// else (tags, format, channel count, bit depth) is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub sample_rate: u32,
    pub data_bytes: u32,
}

impl WavHeader {
    /// Header describing `total_samples` mono 16-bit samples. Fails with
    /// `WavTooLarge` when the data chunk overflows the 32-bit size field.
    pub fn for_samples(sample_rate: u32, total_samples: u64) -> Result<Self> {
        let data_bytes = total_samples * BYTES_PER_SAMPLE as u64;
        if data_bytes > u32::MAX as u64 {
            return Err(ModemError::WavTooLarge { bytes: data_bytes });
        }
        Ok(Self {
            sample_rate,
            data_bytes: data_bytes as u32,
        })
    }

    /// Number of samples the data chunk holds.
    pub fn num_samples(&self) -> u64 {
        (self.data_bytes / BYTES_PER_SAMPLE) as u64
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(b"RIFF")?;
        writer.write_u32::<LittleEndian>(36 + self.data_bytes)?;
        writer.write_all(b"WAVE")?;

        writer.write_all(b"fmt ")?;
        writer.write_u32::<LittleEndian>(16)?;
        writer.write_u16::<LittleEndian>(PCM_FORMAT)?;
        writer.write_u16::<LittleEndian>(1)?; // mono
        writer.write_u32::<LittleEndian>(self.sample_rate)?;
        writer.write_u32::<LittleEndian>(self.sample_rate * BYTES_PER_SAMPLE)?;
        writer.write_u16::<LittleEndian>(BYTES_PER_SAMPLE as u16)?;
        writer.write_u16::<LittleEndian>(BITS_PER_SAMPLE)?;

        writer.write_all(b"data")?;
        writer.write_u32::<LittleEndian>(self.data_bytes)?;
        Ok(())
    }

    /// Read and validate a canonical header. Any deviation from PCM mono
    /// 16-bit in the minimal layout is `WavFormatInvalid`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        expect_tag(reader, b"RIFF")?;
        let _chunk_size = reader.read_u32::<LittleEndian>()?;
        expect_tag(reader, b"WAVE")?;

        expect_tag(reader, b"fmt ")?;
        let fmt_size = reader.read_u32::<LittleEndian>()?;
        if fmt_size != 16 {
            return Err(ModemError::WavFormatInvalid(format!(
                "fmt chunk size {fmt_size}, expected 16"
            )));
        }
        let format = reader.read_u16::<LittleEndian>()?;
        if format != PCM_FORMAT {
            return Err(ModemError::WavFormatInvalid(format!(
                "audio format {format}, expected PCM (1)"
            )));
        }
        let channels = reader.read_u16::<LittleEndian>()?;
        if channels != 1 {
            return Err(ModemError::WavFormatInvalid(format!(
                "{channels} channels, expected mono"
            )));
        }
        let sample_rate = reader.read_u32::<LittleEndian>()?;
        let _byte_rate = reader.read_u32::<LittleEndian>()?;
        let _block_align = reader.read_u16::<LittleEndian>()?;
        let bits = reader.read_u16::<LittleEndian>()?;
        if bits != BITS_PER_SAMPLE {
            return Err(ModemError::WavFormatInvalid(format!(
                "{bits} bits per sample, expected 16"
            )));
        }

        expect_tag(reader, b"data")?;
        let data_bytes = reader.read_u32::<LittleEndian>()?;

        Ok(Self {
            sample_rate,
            data_bytes,
        })
    }
}

fn expect_tag<R: Read>(reader: &mut R, tag: &[u8; 4]) -> Result<()> {
    let mut found = [0u8; 4];
    reader.read_exact(&mut found).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            ModemError::WavFormatInvalid("header truncated".to_string())
        } else {
            ModemError::Io(e)
        }
    })?;
    if &found != tag {
        return Err(ModemError::WavFormatInvalid(format!(
            "missing {:?} tag, found {:02X?}",
            String::from_utf8_lossy(tag),
            found
        )));
    }
    Ok(())
}

/// Write a complete mono 16-bit WAV: header followed by all samples.
pub fn write_wav_mono16<W: Write>(writer: &mut W, samples: &[i16], sample_rate: u32) -> Result<()> {
    let header = WavHeader::for_samples(sample_rate, samples.len() as u64)?;
    header.write_to(writer)?;
    for &sample in samples {
        writer.write_i16::<LittleEndian>(sample)?;
    }
    Ok(())
}

/// Read a complete mono 16-bit WAV. Fails with `WavTruncated` when the
/// stream holds fewer samples than the header claims.
pub fn read_wav_mono16<R: Read>(reader: &mut R) -> Result<(WavHeader, Vec<i16>)> {
    let header = WavHeader::read_from(reader)?;
    let expected = header.num_samples();

    let mut data = vec![0u8; (expected * BYTES_PER_SAMPLE as u64) as usize];
    let mut filled = 0usize;
    while filled < data.len() {
        match reader.read(&mut data[filled..]) {
            Ok(0) => {
                return Err(ModemError::WavTruncated {
                    expected,
                    actual: (filled / BYTES_PER_SAMPLE as usize) as u64,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    let samples = data
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Ok((header, samples))
}

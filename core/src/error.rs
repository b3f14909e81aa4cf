use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModemError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("input payload is empty")]
    InputEmpty,

    #[error("payload too large: {len} bytes, limit is 65535")]
    PayloadTooLarge { len: usize },

    #[error("WAV data too large: {bytes} bytes exceeds the 32-bit size field")]
    WavTooLarge { bytes: u64 },

    #[error("invalid WAV format: {0}")]
    WavFormatInvalid(String),

    #[error("WAV data truncated: header implies {expected} samples, got {actual}")]
    WavTruncated { expected: u64, actual: u64 },

    #[error("not enough symbols: {total} in data chunk, {sync} needed for sync alone")]
    NotEnoughSymbols { total: u64, sync: u64 },

    #[error("Viterbi decode infeasible")]
    DecodeInfeasible,

    #[error("frame too short: {len} bytes")]
    FrameTooShort { len: usize },

    #[error("frame marker mismatch: found {found:02X?}")]
    MarkerMismatch { found: [u8; 2] },

    #[error("frame length mismatch: need {needed} bytes, have {actual}")]
    LengthMismatch { needed: usize, actual: usize },

    #[error("frame CRC mismatch: expected {expected:#06x}, got {actual:#06x}")]
    CrcMismatch { expected: u16, actual: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ModemError>;

//! Configuration errors.
//!
//! These indicate a setup mistake rather than bad input data and abort a walk
//! before any output is produced.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Entropy byte length outside {16, 20, 24, 28, 32}
    InvalidLength(usize),
    /// Mnemonic word count outside {12, 15, 18, 21, 24}
    InvalidWordCount(usize),
    /// Seed range with start after end
    EmptyRange { start: u64, end: u64 },
    /// Seed outside the 32-bit seed space
    SeedOutOfRange(u64),
    /// Date that cannot be parsed or converted to a seed
    InvalidDate(String),
    /// Word list that is not a usable 2048-word dictionary
    InvalidDictionary(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidLength(len) => {
                write!(f, "invalid entropy length: {} bytes (expected 16, 20, 24, 28 or 32)", len)
            }
            ConfigError::InvalidWordCount(n) => {
                write!(f, "invalid word count: {} (expected 12, 15, 18, 21 or 24)", n)
            }
            ConfigError::EmptyRange { start, end } => {
                write!(f, "empty seed range: start {} is after end {}", start, end)
            }
            ConfigError::SeedOutOfRange(seed) => {
                write!(f, "seed {} does not fit in 32 bits", seed)
            }
            ConfigError::InvalidDate(msg) => write!(f, "invalid date: {}", msg),
            ConfigError::InvalidDictionary(msg) => write!(f, "invalid dictionary: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

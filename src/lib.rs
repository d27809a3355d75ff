//! mtwalk - reproduce wallets created from a weakly seeded MT19937.
//!
//! Several wallet generators drew BIP39 entropy from a 32-bit Mersenne Twister
//! seeded with the current time. Every wallet they produced is therefore one
//! of 2^32 candidates. This crate rebuilds those candidates (seed, entropy,
//! mnemonic) and canonicalizes the target addresses they are checked against.

pub mod address;
pub mod benchmark;
pub mod entropy;
pub mod error;
pub mod hash;
pub mod mnemonic;
pub mod output;
pub mod target;
pub mod walker;

pub use address::{AddressKind, DecodeError, Fingerprint};
pub use entropy::{EntropyLength, Extraction};
pub use error::ConfigError;
pub use mnemonic::{Dictionary, Language, Mnemonic};
pub use target::{ParseError, Target, TargetSet};
pub use walker::{Record, SeedRange, WalkConfig, Walker};

/// Default progress bar style for CLI operations.
pub fn default_progress_style() -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, eta {eta})")
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
        .progress_chars("#>-")
}

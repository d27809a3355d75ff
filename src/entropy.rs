//! MT19937 entropy reproduction.
//!
//! Vulnerable wallet generators reseeded a 32-bit Mersenne Twister from a
//! guessable value (usually the current Unix time) and then drew one value in
//! `[0, 255]` per entropy byte. Reproducing the entropy for a seed requires the
//! exact same state expansion, tempering and byte sampling; any deviation gives
//! a stream that never matches, with no error to show for it.
//!
//! Supported byte extraction rules:
//! - `libstdcxx`: Libbitcoin Explorer `bx seed` (Milk Sad, CVE-2023-39910),
//!   `std::uniform_int_distribution<uint16_t>(0, 255)` over `std::mt19937` as
//!   implemented by libstdc++ from GCC 11 on
//! - `libstdcxx-legacy`: the same call built against an older libstdc++,
//!   which downscales by division instead (about 1 seed in 4000 differs)
//! - `low-byte`: Trust Wallet browser extension (CVE-2023-31290), least
//!   significant byte of each 32-bit output

use rand_mt::Mt;
use std::fmt;

use crate::error::ConfigError;

/// Allowed entropy sizes, with their BIP39 word counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum EntropyLength {
    Bits128,
    Bits160,
    Bits192,
    Bits224,
    #[default]
    Bits256,
}

impl EntropyLength {
    pub const ALL: [EntropyLength; 5] = [
        EntropyLength::Bits128,
        EntropyLength::Bits160,
        EntropyLength::Bits192,
        EntropyLength::Bits224,
        EntropyLength::Bits256,
    ];

    pub fn from_bytes(len: usize) -> Result<Self, ConfigError> {
        Self::ALL
            .into_iter()
            .find(|l| l.byte_len() == len)
            .ok_or(ConfigError::InvalidLength(len))
    }

    pub fn from_bits(bits: usize) -> Result<Self, ConfigError> {
        if bits % 8 != 0 {
            return Err(ConfigError::InvalidLength(bits / 8));
        }
        Self::from_bytes(bits / 8)
    }

    pub fn from_words(words: usize) -> Result<Self, ConfigError> {
        Self::ALL
            .into_iter()
            .find(|l| l.word_count() == words)
            .ok_or(ConfigError::InvalidWordCount(words))
    }

    pub fn byte_len(&self) -> usize {
        match self {
            EntropyLength::Bits128 => 16,
            EntropyLength::Bits160 => 20,
            EntropyLength::Bits192 => 24,
            EntropyLength::Bits224 => 28,
            EntropyLength::Bits256 => 32,
        }
    }

    pub fn bits(&self) -> usize {
        self.byte_len() * 8
    }

    pub fn checksum_bits(&self) -> usize {
        self.bits() / 32
    }

    pub fn word_count(&self) -> usize {
        (self.bits() + self.checksum_bits()) / 11
    }
}

impl fmt::Display for EntropyLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bits / {} words", self.bits(), self.word_count())
    }
}

/// How one 32-bit generator output becomes one entropy byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Extraction {
    /// libstdc++ uniform_int_distribution(0, 255), as used by `bx seed`
    #[default]
    Libstdcxx,
    /// Pre-GCC 11 libstdc++ uniform_int_distribution(0, 255)
    LibstdcxxLegacy,
    /// Low 8 bits of each output, as used by the Trust Wallet extension
    LowByte,
}

impl Extraction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Extraction::Libstdcxx => "libstdcxx",
            Extraction::LibstdcxxLegacy => "libstdcxx-legacy",
            Extraction::LowByte => "low-byte",
        }
    }

    #[inline]
    fn draw(&self, rng: &mut Mt) -> u8 {
        match self {
            Extraction::Libstdcxx => uniform_below(rng, 256) as u8,
            Extraction::LibstdcxxLegacy => downscale_below(rng, 256) as u8,
            Extraction::LowByte => (rng.next_u32() & 0xff) as u8,
        }
    }
}

/// Bounded draw in `[0, range)` from a full-width 32-bit URNG, matching
/// libstdc++'s `uniform_int_distribution` (Lemire's nearly divisionless
/// method, GCC 11 and later).
///
/// For `range == 256` the rejection threshold is zero, so the result is the
/// top byte of a single output.
#[inline]
pub fn uniform_below(rng: &mut Mt, range: u32) -> u32 {
    debug_assert!(range > 0);
    let mut product = rng.next_u32() as u64 * range as u64;
    let mut low = product as u32;
    if low < range {
        let threshold = range.wrapping_neg() % range;
        while low < threshold {
            product = rng.next_u32() as u64 * range as u64;
            low = product as u32;
        }
    }
    (product >> 32) as u32
}

/// Bounded draw in `[0, range)` as libstdc++ did before GCC 11: divide by
/// `u32::MAX / range`, redrawing outputs at or above `range * scaling`.
#[inline]
pub fn downscale_below(rng: &mut Mt, range: u32) -> u32 {
    debug_assert!(range > 0);
    let scaling = u32::MAX / range;
    let past = range * scaling;
    loop {
        let x = rng.next_u32();
        if x < past {
            return x / scaling;
        }
    }
}

/// Reproduce the `bx seed` entropy for `seed`.
pub fn generate(seed: u32, length: EntropyLength) -> Vec<u8> {
    generate_with(seed, length, Extraction::Libstdcxx)
}

/// Reproduce the entropy for `seed` with the given extraction rule.
pub fn generate_with(seed: u32, length: EntropyLength, extraction: Extraction) -> Vec<u8> {
    let mut entropy = vec![0u8; length.byte_len()];
    generate_into(seed, extraction, &mut entropy);
    entropy
}

/// Fill `out` with one draw per byte from a generator freshly seeded with `seed`.
pub fn generate_into(seed: u32, extraction: Extraction, out: &mut [u8]) {
    let mut rng = Mt::new(seed);
    for byte in out.iter_mut() {
        *byte = extraction.draw(&mut rng);
    }
}

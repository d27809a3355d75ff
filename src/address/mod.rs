//! Address canonicalization - decode wallet addresses to their 20-byte hash160.
//!
//! Only decoding is supported. Two encodings are handled:
//! - Base58Check (P2PKH `1...`, P2SH `3...`) with a version byte and a
//!   double-SHA256 checksum
//! - Bech32 v0 witness programs (P2WPKH `bc1q...`) with a BCH checksum

mod base58;
mod bech32;

pub use base58::decode_base58check;
pub use bech32::decode_bech32;

use std::fmt;

/// Base58Check version byte of mainnet P2PKH addresses.
pub const P2PKH_VERSION: u8 = 0x00;
/// Base58Check version byte of mainnet P2SH addresses.
pub const P2SH_VERSION: u8 = 0x05;

/// 20-byte hash160 identifying a wallet's signing key (or script).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 20]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; 20]> for Fingerprint {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Address encoding, together with the marker that must be embedded in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// Base58Check with the given version byte.
    Base58Check { version: u8 },
    /// Bech32 (`bc1`) witness v0, 20-byte program.
    Bech32,
}

impl AddressKind {
    pub const P2PKH: AddressKind = AddressKind::Base58Check { version: P2PKH_VERSION };
    pub const P2SH: AddressKind = AddressKind::Base58Check { version: P2SH_VERSION };

    /// Guess the kind from the address's leading characters.
    pub fn detect(address: &str) -> Option<Self> {
        if address.get(..3).is_some_and(|hrp| hrp.eq_ignore_ascii_case("bc1")) {
            return Some(AddressKind::Bech32);
        }

        match address.as_bytes().first() {
            Some(b'1') => Some(AddressKind::P2PKH),
            Some(b'3') => Some(AddressKind::P2SH),
            _ => None,
        }
    }

    /// Whether the address starts with the characters this kind produces.
    pub fn matches_prefix(&self, address: &str) -> bool {
        match self {
            AddressKind::Base58Check { version: P2PKH_VERSION } => address.starts_with('1'),
            AddressKind::Base58Check { version: P2SH_VERSION } => address.starts_with('3'),
            // Other versions have no single leading character.
            AddressKind::Base58Check { .. } => true,
            AddressKind::Bech32 => address.starts_with("bc1") || address.starts_with("BC1"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::Base58Check { version: P2PKH_VERSION } => "p2pkh",
            AddressKind::Base58Check { version: P2SH_VERSION } => "p2sh",
            AddressKind::Base58Check { .. } => "base58check",
            AddressKind::Bech32 => "p2wpkh",
        }
    }
}

/// Decode `address` as `expected` and return its fingerprint.
pub fn decode(address: &str, expected: AddressKind) -> Result<Fingerprint, DecodeError> {
    match expected {
        AddressKind::Base58Check { version } => decode_base58check(address, version),
        AddressKind::Bech32 => decode_bech32(address),
    }
}

/// Reasons an address cannot be canonicalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Missing or wrong human-readable prefix
    InvalidPrefix,
    /// Character outside the encoding's alphabet
    InvalidCharacter { ch: char, position: usize },
    /// Checksum does not verify
    InvalidChecksum,
    /// Version byte or witness version differs from the expected one
    InvalidVersion { expected: u8, found: u8 },
    /// Decoded payload has the wrong size
    InvalidLength { expected: usize, found: usize },
    /// Base58 value too large for the given number of bytes
    Overflow { max_bytes: usize },
    /// Non-zero or overlong padding in the 5-to-8 bit conversion
    InvalidPadding,
    /// Bech32 string mixes upper and lower case
    MixedCase,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidPrefix => write!(f, "invalid address prefix"),
            DecodeError::InvalidCharacter { ch, position } => {
                write!(f, "invalid character {:?} at position {}", ch, position)
            }
            DecodeError::InvalidChecksum => write!(f, "checksum mismatch"),
            DecodeError::InvalidVersion { expected, found } => {
                write!(f, "invalid version 0x{:02x} (expected 0x{:02x})", found, expected)
            }
            DecodeError::InvalidLength { expected, found } => {
                write!(f, "invalid decoded length {} (expected {})", found, expected)
            }
            DecodeError::Overflow { max_bytes } => {
                write!(f, "decoded value does not fit in {} bytes", max_bytes)
            }
            DecodeError::InvalidPadding => write!(f, "invalid padding"),
            DecodeError::MixedCase => write!(f, "mixed-case bech32 string"),
        }
    }
}

impl std::error::Error for DecodeError {}

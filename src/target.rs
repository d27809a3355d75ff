//! Target lines - wallet addresses tagged with the generator that produced them.
//!
//! Two line formats are accepted:
//!
//! ```text
//! $trustwallet$<purpose>$<timestamp>$<address>
//! $cakewallet$<address>
//! ```
//!
//! A Trust Wallet line carries the BIP32 purpose the address was derived with
//! and the Unix time the wallet was created at. Only the window in which the
//! vulnerable extension shipped is accepted. Cake Wallet lines have no
//! timestamp and are always Bech32.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

use crate::address::{self, AddressKind, DecodeError, Fingerprint};

pub const TRUST_WALLET_SIGNATURE: &str = "$trustwallet$";
pub const CAKE_WALLET_SIGNATURE: &str = "$cakewallet$";

/// First Unix time (2022-11-14 00:00:00 UTC) accepted for Trust Wallet lines.
pub const TRUST_WALLET_START: u64 = 1668384000;
/// Last Unix time (2022-11-23 23:59:59 UTC) accepted for Trust Wallet lines.
pub const TRUST_WALLET_END: u64 = 1669247999;

const PURPOSE_DIGITS: usize = 2;
const TIMESTAMP_DIGITS: usize = 10;
const TRUST_WALLET_ADDRESS_LEN: (usize, usize) = (25, 62);
const CAKE_WALLET_ADDRESS_LEN: (usize, usize) = (42, 62);

/// BIP32 derivation purpose, and the address encoding it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    /// BIP44, legacy P2PKH (`1...`)
    Bip44,
    /// BIP49, P2SH-wrapped segwit (`3...`)
    Bip49,
    /// BIP84, native segwit P2WPKH (`bc1...`)
    Bip84,
}

impl Purpose {
    pub const ALL: [Purpose; 3] = [Purpose::Bip44, Purpose::Bip49, Purpose::Bip84];

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == code)
    }

    pub fn code(&self) -> u32 {
        match self {
            Purpose::Bip44 => 44,
            Purpose::Bip49 => 49,
            Purpose::Bip84 => 84,
        }
    }

    pub fn kind(&self) -> AddressKind {
        match self {
            Purpose::Bip44 => AddressKind::P2PKH,
            Purpose::Bip49 => AddressKind::P2SH,
            Purpose::Bip84 => AddressKind::Bech32,
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Wallet software a target line names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wallet {
    TrustWallet { purpose: Purpose, timestamp: u32 },
    CakeWallet,
}

impl Wallet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Wallet::TrustWallet { .. } => "trustwallet",
            Wallet::CakeWallet => "cakewallet",
        }
    }
}

/// A parsed target line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub fingerprint: Fingerprint,
    pub kind: AddressKind,
    pub wallet: Wallet,
    pub address: String,
}

/// Why a target line was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Unknown signature, wrong field count or field length
    Format(String),
    /// Timestamp outside the accepted window
    Range { timestamp: u64 },
    /// Address does not decode as the kind the line names
    Encoding(DecodeError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Format(msg) => write!(f, "malformed line: {}", msg),
            ParseError::Range { timestamp } => write!(
                f,
                "timestamp {} outside [{}, {}]",
                timestamp, TRUST_WALLET_START, TRUST_WALLET_END
            ),
            ParseError::Encoding(err) => write!(f, "bad address: {}", err),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Encoding(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DecodeError> for ParseError {
    fn from(err: DecodeError) -> Self {
        ParseError::Encoding(err)
    }
}

fn format_error(msg: impl Into<String>) -> ParseError {
    ParseError::Format(msg.into())
}

fn check_address_len(address: &str, (min, max): (usize, usize)) -> Result<(), ParseError> {
    if address.len() < min || address.len() > max {
        return Err(format_error(format!(
            "address length {} outside {}..={}",
            address.len(),
            min,
            max
        )));
    }
    Ok(())
}

/// Parse one target line.
pub fn parse_line(line: &str) -> Result<Target, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);

    if let Some(rest) = line.strip_prefix(TRUST_WALLET_SIGNATURE) {
        parse_trust_wallet(rest)
    } else if let Some(rest) = line.strip_prefix(CAKE_WALLET_SIGNATURE) {
        parse_cake_wallet(rest)
    } else {
        Err(format_error("unknown signature"))
    }
}

fn parse_trust_wallet(fields: &str) -> Result<Target, ParseError> {
    let fields: Vec<&str> = fields.split('$').collect();
    let [purpose, timestamp, address] = fields[..] else {
        return Err(format_error(format!("expected 3 fields, got {}", fields.len())));
    };

    if purpose.len() != PURPOSE_DIGITS || !purpose.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format_error(format!("purpose {:?} is not two digits", purpose)));
    }
    let purpose = purpose
        .parse()
        .ok()
        .and_then(Purpose::from_code)
        .ok_or_else(|| format_error(format!("unsupported purpose {}", purpose)))?;

    if timestamp.len() != TIMESTAMP_DIGITS || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format_error(format!("timestamp {:?} is not ten digits", timestamp)));
    }
    let timestamp: u64 = timestamp
        .parse()
        .map_err(|_| format_error(format!("timestamp {:?} is not a number", timestamp)))?;
    if !(TRUST_WALLET_START..=TRUST_WALLET_END).contains(&timestamp) {
        return Err(ParseError::Range { timestamp });
    }

    check_address_len(address, TRUST_WALLET_ADDRESS_LEN)?;

    let kind = purpose.kind();
    if !kind.matches_prefix(address) {
        return Err(ParseError::Encoding(DecodeError::InvalidPrefix));
    }
    let fingerprint = address::decode(address, kind)?;

    Ok(Target {
        fingerprint,
        kind,
        wallet: Wallet::TrustWallet {
            purpose,
            // The window lies well inside u32.
            timestamp: timestamp as u32,
        },
        address: address.to_string(),
    })
}

fn parse_cake_wallet(address: &str) -> Result<Target, ParseError> {
    if address.contains('$') {
        return Err(format_error("expected 1 field"));
    }
    check_address_len(address, CAKE_WALLET_ADDRESS_LEN)?;

    if !AddressKind::Bech32.matches_prefix(address) {
        return Err(ParseError::Encoding(DecodeError::InvalidPrefix));
    }
    let fingerprint = address::decode_bech32(address)?;

    Ok(Target {
        fingerprint,
        kind: AddressKind::Bech32,
        wallet: Wallet::CakeWallet,
        address: address.to_string(),
    })
}

/// A line that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    /// 1-based line number
    pub line_number: usize,
    pub line: String,
    pub error: ParseError,
}

/// Targets loaded from a file, indexed by fingerprint.
#[derive(Debug, Default)]
pub struct TargetSet {
    targets: Vec<Target>,
    index: HashMap<Fingerprint, usize>,
    rejected: Vec<Rejected>,
}

impl TargetSet {
    /// Load targets from file (one line per target, `#` comments allowed).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open targets file {}", path.display()))?;
        let set = load(BufReader::new(file))
            .with_context(|| format!("Failed to read targets file {}", path.display()))?;
        Ok(set)
    }

    /// Parse every line, keeping rejections alongside the accepted targets.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();

        for (i, line) in lines.into_iter().enumerate() {
            let line = line.as_ref().trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_line(line) {
                Ok(target) => set.insert(target),
                Err(error) => {
                    warn!(line = i + 1, %error, "rejected target line");
                    set.rejected.push(Rejected {
                        line_number: i + 1,
                        line: line.to_string(),
                        error,
                    });
                }
            }
        }

        debug!(
            accepted = set.targets.len(),
            rejected = set.rejected.len(),
            "loaded targets"
        );
        set
    }

    fn insert(&mut self, target: Target) {
        if self.index.contains_key(&target.fingerprint) {
            debug!(address = %target.address, "duplicate target fingerprint");
        } else {
            self.index.insert(target.fingerprint, self.targets.len());
        }
        self.targets.push(target);
    }

    /// First target with this fingerprint.
    pub fn find(&self, fingerprint: &Fingerprint) -> Option<&Target> {
        self.index.get(fingerprint).map(|&i| &self.targets[i])
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.index.contains_key(fingerprint)
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn rejected(&self) -> &[Rejected] {
        &self.rejected
    }

    /// Number of accepted targets.
    pub fn count(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Read target lines from `reader`. Only I/O failures are errors.
pub fn load<R: BufRead>(reader: R) -> io::Result<TargetSet> {
    let lines = reader.lines().collect::<io::Result<Vec<_>>>()?;
    Ok(TargetSet::from_lines(lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const P2SH: &str = "3JvL6Ymt8MVWiCNHC7oWU6nLeHNJKLZGLN";
    const P2PKH: &str = "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2";
    const P2WPKH: &str = "bc1q34aq5drpuwy3wgl9lhup9892qp6svr8ldzyy7c";

    fn trust(purpose: u32, timestamp: u64, address: &str) -> String {
        format!("$trustwallet${}${}${}", purpose, timestamp, address)
    }

    #[test]
    fn test_purpose_table() {
        assert_eq!(Purpose::from_code(44), Some(Purpose::Bip44));
        assert_eq!(Purpose::from_code(49).map(|p| p.kind()), Some(AddressKind::P2SH));
        assert_eq!(Purpose::from_code(84).map(|p| p.kind()), Some(AddressKind::Bech32));
        assert_eq!(Purpose::from_code(86), None);
        for purpose in Purpose::ALL {
            assert_eq!(Purpose::from_code(purpose.code()), Some(purpose));
        }
    }

    #[test]
    fn test_trust_wallet_p2sh() {
        let target = parse_line(&trust(49, 1668384000, P2SH)).unwrap();
        assert_eq!(target.fingerprint.to_hex(), "bcfeb728b584253d5f3f70bcb780e9ef218a68f4");
        assert_eq!(target.kind, AddressKind::P2SH);
        assert_eq!(
            target.wallet,
            Wallet::TrustWallet { purpose: Purpose::Bip49, timestamp: 1668384000 }
        );
    }

    #[test]
    fn test_trust_wallet_all_purposes() {
        let p2pkh = parse_line(&trust(44, 1669000000, P2PKH)).unwrap();
        assert_eq!(p2pkh.fingerprint.to_hex(), "77bff20c60e522dfaa3350c39b030a5d004e839a");

        let p2wpkh = parse_line(&trust(84, TRUST_WALLET_END, P2WPKH)).unwrap();
        assert_eq!(p2wpkh.fingerprint.to_hex(), "8d7a0a3461e3891723e5fdf8129caa0075060cff");
    }

    #[test]
    fn test_timestamp_window() {
        assert_eq!(
            parse_line(&trust(49, 1668383999, P2SH)),
            Err(ParseError::Range { timestamp: 1668383999 })
        );
        assert_eq!(
            parse_line(&trust(49, 1669248000, P2SH)),
            Err(ParseError::Range { timestamp: 1669248000 })
        );
        // Ten digits but past u32
        assert_eq!(
            parse_line(&trust(49, 9999999999, P2SH)),
            Err(ParseError::Range { timestamp: 9999999999 })
        );
    }

    #[test]
    fn test_purpose_prefix_mismatch() {
        assert_eq!(
            parse_line(&trust(44, 1668384000, P2SH)),
            Err(ParseError::Encoding(DecodeError::InvalidPrefix))
        );
        assert_eq!(
            parse_line(&trust(84, 1668384000, P2PKH)),
            Err(ParseError::Encoding(DecodeError::InvalidPrefix))
        );
    }

    #[test]
    fn test_bad_checksum_is_encoding_error() {
        let corrupted = "3JvL6Ymt8MVWiCNHC7oWU6nLeHNJKLZGLM";
        assert!(matches!(
            parse_line(&trust(49, 1668384000, corrupted)),
            Err(ParseError::Encoding(_))
        ));
    }

    #[test]
    fn test_format_errors() {
        let cases = [
            "".to_string(),
            "3JvL6Ymt8MVWiCNHC7oWU6nLeHNJKLZGLN".to_string(),
            "$electrum$49$1668384000$3JvL6Ymt8MVWiCNHC7oWU6nLeHNJKLZGLN".to_string(),
            "$trustwallet$49$1668384000".to_string(),
            format!("$trustwallet$49$1668384000${}$extra", P2SH),
            format!("$trustwallet$4$1668384000${}", P2SH),
            format!("$trustwallet$4x$1668384000${}", P2SH),
            format!("$trustwallet$50$1668384000${}", P2SH),
            format!("$trustwallet$49$166838400${}", P2SH),
            format!("$trustwallet$49$16683840x0${}", P2SH),
            "$trustwallet$44$1668384000$1BvBMSEYstWetqTFn5Au4m4".to_string(),
            "$cakewallet$bc1q34aq5drpuwy3wgl9lhup".to_string(),
            format!("$cakewallet${}$1668384000", P2WPKH),
        ];
        for line in &cases {
            assert!(
                matches!(parse_line(line), Err(ParseError::Format(_))),
                "{:?} -> {:?}",
                line,
                parse_line(line)
            );
        }
    }

    #[test]
    fn test_cake_wallet_equals_bare_decode() {
        let target = parse_line(&format!("$cakewallet${}", P2WPKH)).unwrap();
        assert_eq!(target.fingerprint, address::decode_bech32(P2WPKH).unwrap());
        assert_eq!(target.wallet, Wallet::CakeWallet);
        assert_eq!(target.fingerprint.to_hex(), "8d7a0a3461e3891723e5fdf8129caa0075060cff");
    }

    #[test]
    fn test_cake_wallet_rejects_base58() {
        // Long enough to pass the length check
        let line = "$cakewallet$1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2abcdefgh";
        assert_eq!(
            parse_line(line),
            Err(ParseError::Encoding(DecodeError::InvalidPrefix))
        );
    }

    #[test]
    fn test_trailing_newline() {
        let line = format!("$cakewallet${}\r\n", P2WPKH);
        assert!(parse_line(&line).is_ok());
    }

    #[test]
    fn test_load_collects_rejections() {
        let input = format!(
            "# targets\n{}\n\n$trustwallet$49$1668383999${}\ngarbage\n$cakewallet${}\n",
            trust(44, 1668384000, P2PKH),
            P2SH,
            P2WPKH
        );
        let set = load(Cursor::new(input)).unwrap();

        assert_eq!(set.count(), 2);
        assert_eq!(set.rejected().len(), 2);
        assert_eq!(set.rejected()[0].line_number, 4);
        assert!(matches!(set.rejected()[0].error, ParseError::Range { .. }));
        assert_eq!(set.rejected()[1].line_number, 5);
        assert_eq!(set.rejected()[1].line, "garbage");

        let fp = address::decode_bech32(P2WPKH).unwrap();
        assert!(set.contains(&fp));
        assert_eq!(set.find(&fp).map(|t| t.wallet), Some(Wallet::CakeWallet));
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let set = TargetSet::from_lines([
            trust(84, 1668384000, P2WPKH),
            format!("$cakewallet${}", P2WPKH),
        ]);
        assert_eq!(set.count(), 2);
        let fp = address::decode_bech32(P2WPKH).unwrap();
        assert!(matches!(
            set.find(&fp).map(|t| t.wallet),
            Some(Wallet::TrustWallet { .. })
        ));
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", trust(49, 1668384000, P2SH)).unwrap();
        writeln!(file, "#comment").unwrap();

        let set = TargetSet::load(file.path()).unwrap();
        assert_eq!(set.count(), 1);
        assert!(set.rejected().is_empty());
        assert!(!set.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(TargetSet::load("/nonexistent/targets.txt").is_err());
    }

    #[test]
    fn test_error_display() {
        let err = ParseError::Range { timestamp: 1 };
        assert_eq!(err.to_string(), "timestamp 1 outside [1668384000, 1669247999]");
        let err = ParseError::from(DecodeError::InvalidChecksum);
        assert_eq!(err.to_string(), "bad address: checksum mismatch");
    }
}

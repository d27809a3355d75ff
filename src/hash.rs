//! SHA-256 helpers shared by the address codec and the mnemonic encoder.

use sha2::{Digest, Sha256};

/// SHA256(input).
pub fn sha256(input: &[u8]) -> [u8; 32] {
    Sha256::digest(input).into()
}

/// SHA256(SHA256(input)), the Base58Check checksum hash.
pub fn double_sha256(input: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(input);
    Sha256::digest(first).into()
}

/// First four bytes of the double hash.
pub fn checksum4(input: &[u8]) -> [u8; 4] {
    let hash = double_sha256(input);
    [hash[0], hash[1], hash[2], hash[3]]
}

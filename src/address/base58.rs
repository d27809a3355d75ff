//! Base58Check decoding into a fixed 25-byte buffer.

use super::{DecodeError, Fingerprint};
use crate::hash::checksum4;

const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// version (1) + hash160 (20) + checksum (4)
const DECODED_LEN: usize = 25;

const INVALID: u8 = 0xff;

/// Reverse lookup table: ASCII byte -> digit value, `INVALID` otherwise.
const DIGITS: [u8; 128] = {
    let mut table = [INVALID; 128];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

fn digit(ch: char) -> Option<u8> {
    if !ch.is_ascii() {
        return None;
    }
    match DIGITS[ch as usize] {
        INVALID => None,
        d => Some(d),
    }
}

/// Decode a Base58Check address whose version byte must be `expected_version`.
pub fn decode_base58check(address: &str, expected_version: u8) -> Result<Fingerprint, DecodeError> {
    if address.is_empty() {
        return Err(DecodeError::InvalidLength { expected: DECODED_LEN, found: 0 });
    }

    let mut decoded = [0u8; DECODED_LEN];

    for (position, ch) in address.chars().enumerate() {
        let digit = digit(ch).ok_or(DecodeError::InvalidCharacter { ch, position })?;

        // decoded = decoded * 58 + digit, least significant byte last
        let mut carry = digit as u32;
        for byte in decoded.iter_mut().rev() {
            carry += 58 * (*byte as u32);
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }

        if carry != 0 {
            return Err(DecodeError::Overflow { max_bytes: DECODED_LEN });
        }
    }

    if decoded[0] != expected_version {
        return Err(DecodeError::InvalidVersion {
            expected: expected_version,
            found: decoded[0],
        });
    }

    if checksum4(&decoded[..21]) != decoded[21..] {
        return Err(DecodeError::InvalidChecksum);
    }

    let mut hash160 = [0u8; 20];
    hash160.copy_from_slice(&decoded[1..21]);
    Ok(Fingerprint::from(hash160))
}

//! Bech32 (BIP173) decoding of mainnet P2WPKH addresses.

use super::{DecodeError, Fingerprint};

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

const GENERATOR: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];

const HRP: &[u8] = b"bc";

const CHECKSUM_LEN: usize = 6;

const PROGRAM_LEN: usize = 20;

const INVALID: u8 = 0xff;

/// Reverse lookup: lowercase ASCII byte -> 5-bit value.
const VALUES: [u8; 128] = {
    let mut table = [INVALID; 128];
    let mut i = 0;
    while i < CHARSET.len() {
        table[CHARSET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

#[inline]
fn polymod_step(chk: u32, value: u8) -> u32 {
    let top = chk >> 25;
    let mut chk = ((chk & 0x01ff_ffff) << 5) ^ value as u32;
    for (i, g) in GENERATOR.iter().enumerate() {
        if (top >> i) & 1 == 1 {
            chk ^= g;
        }
    }
    chk
}

/// Checksum over HRP high bits, a zero separator, HRP low bits, then data.
fn verify_checksum(hrp: &[u8], data: &[u8]) -> bool {
    let mut chk = 1u32;
    for &c in hrp {
        chk = polymod_step(chk, c >> 5);
    }
    chk = polymod_step(chk, 0);
    for &c in hrp {
        chk = polymod_step(chk, c & 0x1f);
    }
    for &v in data {
        chk = polymod_step(chk, v);
    }
    chk == 1
}

/// Regroup 5-bit values into bytes, MSB first, rejecting any padding.
fn from_base32(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut acc = 0u32;
    let mut bits = 0u32;
    let mut out = Vec::with_capacity(data.len() * 5 / 8);

    for &value in data {
        acc = ((acc << 5) | value as u32) & 0xfff;
        bits += 5;
        while bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
        }
    }

    if bits >= 5 || (acc << (8 - bits)) & 0xff != 0 {
        return Err(DecodeError::InvalidPadding);
    }

    Ok(out)
}

/// Decode a `bc1` witness v0 address into its 20-byte program.
pub fn decode_bech32(address: &str) -> Result<Fingerprint, DecodeError> {
    if !address.get(..3).is_some_and(|prefix| prefix.eq_ignore_ascii_case("bc1")) {
        return Err(DecodeError::InvalidPrefix);
    }

    let has_lower = address.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = address.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(DecodeError::MixedCase);
    }

    // Separator is the last '1'; the prefix check guarantees one at index 2.
    let separator = match address.rfind('1') {
        Some(pos) => pos,
        None => return Err(DecodeError::InvalidPrefix),
    };
    // Only "bc" may precede the separator.
    if separator != HRP.len() {
        return Err(DecodeError::InvalidPrefix);
    }

    let mut data = Vec::with_capacity(address.len() - separator - 1);
    for (offset, ch) in address[separator + 1..].chars().enumerate() {
        let position = separator + 1 + offset;
        let value = if ch.is_ascii() {
            VALUES[ch.to_ascii_lowercase() as usize]
        } else {
            INVALID
        };
        if value == INVALID {
            return Err(DecodeError::InvalidCharacter { ch, position });
        }
        data.push(value);
    }

    if data.len() <= CHECKSUM_LEN {
        return Err(DecodeError::InvalidLength {
            expected: CHECKSUM_LEN + 1,
            found: data.len(),
        });
    }

    if !verify_checksum(HRP, &data) {
        return Err(DecodeError::InvalidChecksum);
    }

    let payload = &data[..data.len() - CHECKSUM_LEN];
    let version = payload[0];
    if version != 0 {
        return Err(DecodeError::InvalidVersion { expected: 0, found: version });
    }

    let program = from_base32(&payload[1..])?;
    if program.len() != PROGRAM_LEN {
        return Err(DecodeError::InvalidLength {
            expected: PROGRAM_LEN,
            found: program.len(),
        });
    }

    let mut hash160 = [0u8; 20];
    hash160.copy_from_slice(&program);
    Ok(Fingerprint::from(hash160))
}

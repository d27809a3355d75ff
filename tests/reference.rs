//! Cross-checks against the `bitcoin` crate's address handling.

use std::str::FromStr;

use bitcoin::hashes::Hash;
use bitcoin::{Address, Network, PubkeyHash, ScriptBuf, ScriptHash, WPubkeyHash};

use mtwalk::address::{decode, AddressKind, DecodeError};
use mtwalk::entropy::{generate, EntropyLength};
use mtwalk::target::{parse_line, Wallet};
use mtwalk::walker::walk;

/// Pseudo-random 20-byte payloads, taken from walked entropy.
fn payloads(count: u32) -> Vec<[u8; 20]> {
    (0..count)
        .map(|seed| {
            let entropy = generate(seed, EntropyLength::Bits256);
            let mut payload = [0u8; 20];
            payload.copy_from_slice(&entropy[..20]);
            payload
        })
        .collect()
}

fn encode(script: &ScriptBuf) -> String {
    Address::from_script(script, Network::Bitcoin).unwrap().to_string()
}

#[test]
fn test_decode_matches_bitcoin_encoder() {
    for payload in payloads(64) {
        let p2pkh = encode(&ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(payload)));
        let p2sh = encode(&ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(payload)));
        let p2wpkh = encode(&ScriptBuf::new_p2wpkh(&WPubkeyHash::from_byte_array(payload)));

        assert_eq!(decode(&p2pkh, AddressKind::P2PKH).unwrap().as_bytes(), &payload);
        assert_eq!(decode(&p2sh, AddressKind::P2SH).unwrap().as_bytes(), &payload);
        assert_eq!(decode(&p2wpkh, AddressKind::Bech32).unwrap().as_bytes(), &payload);

        assert_eq!(AddressKind::detect(&p2pkh), Some(AddressKind::P2PKH));
        assert_eq!(AddressKind::detect(&p2sh), Some(AddressKind::P2SH));
        assert_eq!(AddressKind::detect(&p2wpkh), Some(AddressKind::Bech32));
    }
}

#[test]
fn test_known_addresses_match_script_pubkey() {
    let cases = [
        ("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", AddressKind::P2PKH, 3..23),
        ("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", AddressKind::P2PKH, 3..23),
        ("3JvL6Ymt8MVWiCNHC7oWU6nLeHNJKLZGLN", AddressKind::P2SH, 2..22),
        ("bc1q34aq5drpuwy3wgl9lhup9892qp6svr8ldzyy7c", AddressKind::Bech32, 2..22),
        ("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", AddressKind::Bech32, 2..22),
    ];

    for (address, kind, program) in cases {
        let script = Address::from_str(address)
            .unwrap()
            .assume_checked()
            .script_pubkey();
        let fingerprint = decode(address, kind).unwrap();
        assert_eq!(&script.as_bytes()[program], fingerprint.as_bytes(), "{}", address);
    }
}

#[test]
fn test_rejections_agree_with_bitcoin() {
    let invalid = [
        "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNb",
        "3JvL6Ymt8MVWiCNHC7oWU6nLeHNJKLZGLM",
        "bc1q34aq5drpuwy3wgl9lhup9892qp6svr8ldzyy7d",
        "bc1Q34aq5drpuwy3wgl9lhup9892qp6svr8ldzyy7c",
    ];

    for address in invalid {
        assert!(Address::from_str(address).is_err(), "{}", address);
        let kind = AddressKind::detect(address).unwrap();
        assert!(decode(address, kind).is_err(), "{}", address);
    }

    assert_eq!(
        decode("bc1Q34aq5drpuwy3wgl9lhup9892qp6svr8ldzyy7c", AddressKind::Bech32),
        Err(DecodeError::MixedCase)
    );
}

#[test]
fn test_target_line_to_walk() {
    let target = parse_line("$trustwallet$84$1668384000$bc1q34aq5drpuwy3wgl9lhup9892qp6svr8ldzyy7c").unwrap();
    let Wallet::TrustWallet { timestamp, .. } = target.wallet else {
        panic!("expected a Trust Wallet target");
    };

    let first = walk(timestamp as u64, timestamp as u64 + 9, 16).unwrap().next().unwrap();
    assert_eq!(first.seed, 1668384000);
    assert_eq!(hex::encode(&first.entropy), "6fd95d6033dea319e665892f1e219755");
}

//! BIP39 mnemonic encoding.
//!
//! entropy || first (len * 8 / 32) bits of SHA256(entropy), read MSB first and
//! split into 11-bit dictionary indices.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use crate::entropy::EntropyLength;
use crate::error::ConfigError;
use crate::hash::sha256;

pub const DICTIONARY_SIZE: usize = 2048;

const BITS_PER_WORD: u32 = 11;

/// BIP39 English wordlist (2048 words), loaded at compile time.
static ENGLISH: LazyLock<Dictionary> = LazyLock::new(|| Dictionary {
    words: include_str!("data/bip39_english.txt")
        .lines()
        .map(str::to_string)
        .collect(),
});

/// Bundled dictionaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Language {
    #[default]
    English,
}

/// Ordered 2048-word list indexed by 11-bit values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    words: Vec<String>,
}

impl Dictionary {
    pub fn english() -> &'static Dictionary {
        &ENGLISH
    }

    pub fn for_language(language: Language) -> &'static Dictionary {
        match language {
            Language::English => Self::english(),
        }
    }

    /// Build a dictionary from exactly 2048 unique, non-empty words.
    pub fn from_words<I, S>(words: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words.into_iter().map(Into::into).collect();

        if words.len() != DICTIONARY_SIZE {
            return Err(ConfigError::InvalidDictionary(format!(
                "expected {} words, got {}",
                DICTIONARY_SIZE,
                words.len()
            )));
        }

        let mut seen = HashSet::with_capacity(DICTIONARY_SIZE);
        for (index, word) in words.iter().enumerate() {
            if word.is_empty() || word.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidDictionary(format!(
                    "invalid word at index {}: {:?}",
                    index, word
                )));
            }
            if !seen.insert(word.as_str()) {
                return Err(ConfigError::InvalidDictionary(format!(
                    "duplicate word at index {}: {}",
                    index, word
                )));
            }
        }

        Ok(Self { words })
    }

    /// Load a one-word-per-line list (blank lines ignored).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read wordlist {}", path.display()))?;

        let words = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty());

        Ok(Self::from_words(words)?)
    }

    pub fn word(&self, index: u16) -> &str {
        &self.words[index as usize]
    }

    pub fn index_of(&self, word: &str) -> Option<u16> {
        self.words.iter().position(|w| w == word).map(|i| i as u16)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Ordered word sequence; repeated words are expected.
#[derive(Clone)]
pub struct Mnemonic<'d> {
    dictionary: &'d Dictionary,
    indices: Vec<u16>,
}

impl<'d> Mnemonic<'d> {
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn words(&self) -> impl Iterator<Item = &'d str> + '_ {
        self.indices.iter().map(|&i| self.dictionary.word(i))
    }

    pub fn word_count(&self) -> usize {
        self.indices.len()
    }
}

impl PartialEq for Mnemonic<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.indices == other.indices
            && (std::ptr::eq(self.dictionary, other.dictionary) || self.dictionary == other.dictionary)
    }
}

impl Eq for Mnemonic<'_> {}

impl fmt::Debug for Mnemonic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.words()).finish()
    }
}

impl fmt::Display for Mnemonic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.words().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(word)?;
        }
        Ok(())
    }
}

/// 11-bit word indices for `entropy` (checksum included).
pub fn indices(entropy: &[u8]) -> Result<Vec<u16>, ConfigError> {
    let length = EntropyLength::from_bytes(entropy.len())?;
    Ok(pack(entropy, length.word_count()))
}

/// Encode `entropy` as a mnemonic over `dictionary`.
pub fn encode<'d>(entropy: &[u8], dictionary: &'d Dictionary) -> Result<Mnemonic<'d>, ConfigError> {
    Ok(Mnemonic {
        dictionary,
        indices: indices(entropy)?,
    })
}

/// Encode entropy whose length was validated when the walk was configured.
pub(crate) fn encode_valid<'d>(
    entropy: &[u8],
    length: EntropyLength,
    dictionary: &'d Dictionary,
) -> Mnemonic<'d> {
    debug_assert_eq!(entropy.len(), length.byte_len());
    Mnemonic {
        dictionary,
        indices: pack(entropy, length.word_count()),
    }
}

fn pack(entropy: &[u8], word_count: usize) -> Vec<u16> {
    // At most 8 checksum bits, so the first hash byte is enough.
    let checksum = sha256(entropy)[0];

    let mut indices = Vec::with_capacity(word_count);
    let mut acc = 0u32;
    let mut bits = 0u32;

    for &byte in entropy.iter().chain(std::iter::once(&checksum)) {
        acc = (acc << 8) | byte as u32;
        bits += 8;
        if bits >= BITS_PER_WORD {
            bits -= BITS_PER_WORD;
            indices.push(((acc >> bits) & 0x7ff) as u16);
            acc &= (1 << bits) - 1;
        }
        if indices.len() == word_count {
            break;
        }
    }

    debug_assert_eq!(indices.len(), word_count);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::generate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn phrase(entropy: &[u8]) -> String {
        encode(entropy, Dictionary::english()).unwrap().to_string()
    }

    #[test]
    fn test_english_dictionary() {
        let dict = Dictionary::english();
        assert_eq!(dict.len(), DICTIONARY_SIZE);
        assert_eq!(dict.word(0), "abandon");
        assert_eq!(dict.word(1124), "milk");
        assert_eq!(dict.word(2047), "zoo");
        assert_eq!(dict.index_of("sad"), Some(1517));
        assert_eq!(dict.index_of("notaword"), None);
    }

    #[test]
    fn test_bip39_reference_vectors() {
        assert_eq!(
            phrase(&[0u8; 16]),
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about"
        );
        assert_eq!(
            phrase(&[0x7fu8; 16]),
            "legal winner thank year wave sausage worth useful legal winner thank yellow"
        );
        assert_eq!(
            phrase(&[0xffu8; 32]),
            "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo vote"
        );
    }

    #[test]
    fn test_milksad_phrase() {
        let entropy = generate(0, EntropyLength::Bits256);
        assert_eq!(
            phrase(&entropy),
            "milk sad wage cup reward umbrella raven visa give list decorate bulb \
             gold raise twenty fly manual stand float super gentle climb fold park"
        );
    }

    #[test]
    fn test_intermediate_lengths() {
        let cases = [
            (
                EntropyLength::Bits160,
                "garlic garbage slight jealous kangaroo slot oven eager boil inhale jar private myself food ocean",
            ),
            (
                EntropyLength::Bits192,
                "garlic garbage slight jealous kangaroo slot oven eager boil inhale jar private \
                 myself food object peace weather shiver",
            ),
            (
                EntropyLength::Bits224,
                "garlic garbage slight jealous kangaroo slot oven eager boil inhale jar private \
                 myself food object peace weather shop lab hire abuse",
            ),
        ];
        for (length, expected) in cases {
            assert_eq!(phrase(&generate(42, length)), expected);
        }
    }

    #[test]
    fn test_word_counts() {
        for length in EntropyLength::ALL {
            for seed in [0u32, 7, 1668384000] {
                let mnemonic = encode(&generate(seed, length), Dictionary::english()).unwrap();
                assert_eq!(mnemonic.word_count(), length.word_count());
                assert!(mnemonic.indices().iter().all(|&i| (i as usize) < DICTIONARY_SIZE));
            }
        }
        assert_eq!(indices(&generate(5, EntropyLength::Bits256)).unwrap().len(), 24);
        assert_eq!(indices(&generate(5, EntropyLength::Bits128)).unwrap().len(), 12);
    }

    #[test]
    fn test_invalid_length() {
        assert_eq!(indices(&[0u8; 15]), Err(ConfigError::InvalidLength(15)));
        assert_eq!(indices(&[]), Err(ConfigError::InvalidLength(0)));
        assert!(encode(&[0u8; 64], Dictionary::english()).is_err());
    }

    #[test]
    fn test_repeated_words_kept() {
        let mnemonic = encode(&[0u8; 16], Dictionary::english()).unwrap();
        assert_eq!(mnemonic.words().filter(|w| *w == "abandon").count(), 11);
    }

    #[test]
    fn test_from_words_validation() {
        let too_short = vec!["a"; 10];
        assert!(matches!(
            Dictionary::from_words(too_short),
            Err(ConfigError::InvalidDictionary(_))
        ));

        let duplicates: Vec<String> = (0..DICTIONARY_SIZE).map(|i| format!("w{}", i % 2047)).collect();
        assert!(Dictionary::from_words(duplicates).is_err());

        let unique: Vec<String> = (0..DICTIONARY_SIZE).map(|i| format!("w{}", i)).collect();
        let dict = Dictionary::from_words(unique).unwrap();
        assert_eq!(dict.word(2047), "w2047");
    }

    #[test]
    fn test_from_file_custom_language() {
        let mut file = NamedTempFile::new().unwrap();
        for i in 0..DICTIONARY_SIZE {
            writeln!(file, "palabra{}", i).unwrap();
        }
        writeln!(file).unwrap();

        let dict = Dictionary::from_file(file.path()).unwrap();
        let mnemonic = encode(&[0u8; 16], &dict).unwrap();
        assert_eq!(mnemonic.words().next(), Some("palabra0"));
        assert_eq!(mnemonic.words().last(), Some("palabra3"));
    }

    #[test]
    fn test_from_file_missing() {
        assert!(Dictionary::from_file("/nonexistent/wordlist.txt").is_err());
    }
}

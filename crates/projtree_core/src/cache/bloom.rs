//! Fixed-size Bloom filter with SHA-256 double hashing.

use super::{CacheError, CacheResult};
use sha2::{Digest, Sha256};

const MAGIC: &[u8; 4] = b"PTBF";
const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1 + 4 + 8;
const MIN_BITS: u64 = 64;
const MAX_HASHES: u32 = 32;

/// Bit-array membership set. Never yields false negatives for inserted keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomFilter {
    words: Vec<u64>,
    num_bits: u64,
    num_hashes: u32,
}

impl BloomFilter {
    /// Sizes a filter for `expected_items` at `false_positive_rate`.
    ///
    /// Uses `m = ceil(-n ln p / ln^2 2)` bits and `k = round(m/n ln 2)` hashes.
    pub fn with_rate(expected_items: usize, false_positive_rate: f64) -> CacheResult<Self> {
        let valid_rate = false_positive_rate.is_finite()
            && false_positive_rate > 0.0
            && false_positive_rate < 1.0;
        if expected_items == 0 || !valid_rate {
            return Err(CacheError::InvalidSizing {
                expected_items,
                false_positive_rate,
            });
        }

        let n = expected_items as f64;
        let ln2 = std::f64::consts::LN_2;
        let num_bits = ((-n * false_positive_rate.ln()) / (ln2 * ln2)).ceil() as u64;
        let num_bits = num_bits.max(MIN_BITS);
        let num_hashes = ((num_bits as f64 / n) * ln2).round() as u32;

        Ok(Self::with_params(num_bits, num_hashes.clamp(1, MAX_HASHES)))
    }

    fn with_params(num_bits: u64, num_hashes: u32) -> Self {
        let word_count = num_bits.div_ceil(64) as usize;
        Self {
            words: vec![0; word_count],
            num_bits,
            num_hashes,
        }
    }

    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Inserts a key. Returns `true` when at least one bit flipped, i.e. the
    /// key was definitely not present before.
    pub fn insert(&mut self, key: &str) -> bool {
        let mut changed = false;
        for index in self.bit_indexes(key) {
            let (word, mask) = locate(index);
            if self.words[word] & mask == 0 {
                self.words[word] |= mask;
                changed = true;
            }
        }
        changed
    }

    pub fn contains(&self, key: &str) -> bool {
        self.bit_indexes(key).all(|index| {
            let (word, mask) = locate(index);
            self.words[word] & mask != 0
        })
    }

    /// Whether `other` has the same geometry and can be merged.
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.num_bits == other.num_bits && self.num_hashes == other.num_hashes
    }

    /// Bitwise-OR merge of a compatible filter. Returns `false` (and leaves
    /// `self` untouched) when geometries differ.
    pub fn union(&mut self, other: &Self) -> bool {
        if !self.is_compatible(other) {
            return false;
        }
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            *mine |= *theirs;
        }
        true
    }

    /// Serializes as `magic | version | k (u32 le) | m (u64 le) | words (u64 le)`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.words.len() * 8);
        bytes.extend_from_slice(MAGIC);
        bytes.push(FORMAT_VERSION);
        bytes.extend_from_slice(&self.num_hashes.to_le_bytes());
        bytes.extend_from_slice(&self.num_bits.to_le_bytes());
        for word in &self.words {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> CacheResult<Self> {
        if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
            return Err(CacheError::Corrupt("missing filter header".to_string()));
        }
        let version = bytes[MAGIC.len()];
        if version != FORMAT_VERSION {
            return Err(CacheError::Corrupt(format!(
                "unsupported filter format version {version}"
            )));
        }

        let mut hashes = [0_u8; 4];
        hashes.copy_from_slice(&bytes[5..9]);
        let num_hashes = u32::from_le_bytes(hashes);
        let mut bits = [0_u8; 8];
        bits.copy_from_slice(&bytes[9..HEADER_LEN]);
        let num_bits = u64::from_le_bytes(bits);

        if num_bits == 0 || num_hashes == 0 || num_hashes > MAX_HASHES {
            return Err(CacheError::Corrupt(format!(
                "invalid geometry m={num_bits} k={num_hashes}"
            )));
        }

        let body = &bytes[HEADER_LEN..];
        let expected_words = num_bits.div_ceil(64) as usize;
        if body.len() != expected_words * 8 {
            return Err(CacheError::Corrupt(format!(
                "expected {} body bytes, got {}",
                expected_words * 8,
                body.len()
            )));
        }

        let words = body
            .chunks_exact(8)
            .map(|chunk| {
                let mut word = [0_u8; 8];
                word.copy_from_slice(chunk);
                u64::from_le_bytes(word)
            })
            .collect();

        Ok(Self {
            words,
            num_bits,
            num_hashes,
        })
    }

    fn bit_indexes(&self, key: &str) -> impl Iterator<Item = u64> {
        let digest = Sha256::digest(key.as_bytes());
        let mut first = [0_u8; 8];
        let mut second = [0_u8; 8];
        first.copy_from_slice(&digest[..8]);
        second.copy_from_slice(&digest[8..16]);
        let h1 = u64::from_le_bytes(first);
        // Odd step keeps bit positions distinct when m is a power of two.
        let h2 = u64::from_le_bytes(second) | 1;
        let num_bits = self.num_bits;

        (0..u64::from(self.num_hashes))
            .map(move |round| h1.wrapping_add(round.wrapping_mul(h2)) % num_bits)
    }
}

fn locate(index: u64) -> (usize, u64) {
    ((index / 64) as usize, 1_u64 << (index % 64))
}

//! Algorand 25-word mnemonics.
//!
//! The first 24 words carry the 32-byte ed25519 seed as little-endian 11-bit
//! groups; the 25th word is a checksum taken from the SHA-512/256 digest of
//! the seed.

use crate::error::{ClaimSdkError, Result};
use crate::utils;
use bip39::Language;

pub const MNEMONIC_WORDS: usize = 25;
const KEY_WORDS: usize = 24;
const SEED_LEN: usize = 32;
const BITS_PER_WORD: u32 = 11;
const WORD_MASK: u32 = (1 << BITS_PER_WORD) - 1;

/// Decode a 25-word mnemonic into the 32-byte ed25519 seed
pub fn seed_from_mnemonic(phrase: &str) -> Result<[u8; 32]> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if words.len() != MNEMONIC_WORDS {
        return Err(ClaimSdkError::InvalidMnemonic(format!(
            "expected {} words, got {}",
            MNEMONIC_WORDS,
            words.len()
        )));
    }

    let mut indices = Vec::with_capacity(KEY_WORDS);
    for (position, word) in words[..KEY_WORDS].iter().enumerate() {
        let index = Language::English.find_word(&word.to_lowercase()).ok_or_else(|| {
            ClaimSdkError::InvalidMnemonic(format!("unknown word at position {}", position + 1))
        })?;
        indices.push(index);
    }

    let bytes = unpack_words(&indices);
    // 24 words hold 264 bits; the trailing byte must be padding
    if bytes.len() != SEED_LEN + 1 || bytes[SEED_LEN] != 0 {
        return Err(ClaimSdkError::InvalidMnemonic("malformed key words".to_string()));
    }

    let mut seed = [0u8; SEED_LEN];
    seed.copy_from_slice(&bytes[..SEED_LEN]);

    let expected = checksum_word(&seed);
    if !words[KEY_WORDS].eq_ignore_ascii_case(expected) {
        return Err(ClaimSdkError::InvalidMnemonic("checksum mismatch".to_string()));
    }

    Ok(seed)
}

/// Encode a 32-byte seed as a 25-word mnemonic
pub fn mnemonic_from_seed(seed: &[u8; 32]) -> String {
    let word_list = Language::English.word_list();
    let mut words: Vec<&str> = pack_words(seed)
        .into_iter()
        .map(|index| word_list[index as usize])
        .collect();
    words.push(checksum_word(seed));
    words.join(" ")
}

fn checksum_word(seed: &[u8; 32]) -> &'static str {
    let digest = utils::sha512_256(seed);
    let index = (u32::from(digest[0]) | u32::from(digest[1]) << 8) & WORD_MASK;
    Language::English.word_list()[index as usize]
}

/// Regroup 11-bit word indices into bytes, least significant bits first
fn unpack_words(indices: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(indices.len() * BITS_PER_WORD as usize / 8 + 1);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;

    for &index in indices {
        acc |= u32::from(index) << bits;
        bits += BITS_PER_WORD;
        while bits >= 8 {
            out.push((acc & 0xff) as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        out.push(acc as u8);
    }
    out
}

/// Regroup bytes into 11-bit word indices, least significant bits first
fn pack_words(bytes: &[u8]) -> Vec<u16> {
    let mut out = Vec::with_capacity(bytes.len() * 8 / BITS_PER_WORD as usize + 1);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in bytes {
        acc |= u32::from(byte) << bits;
        bits += 8;
        if bits >= BITS_PER_WORD {
            out.push((acc & WORD_MASK) as u16);
            acc >>= BITS_PER_WORD;
            bits -= BITS_PER_WORD;
        }
    }
    if bits > 0 {
        out.push(acc as u16);
    }
    out
}

//! Peer identifier generation.
//!
//! Identifiers are short random strings drawn from a 36-symbol alphabet
//! (lowercase alphanumeric). At 10 symbols the birthday-bound collision
//! probability stays negligible for any population a single hub process
//! could plausibly hold in memory, but `Registry::insert` still rejects a
//! collision and the caller retries — belt and suspenders, since entropy
//! sources can theoretically repeat.

use rand::Rng;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ID_LEN: usize = 10;

/// A peer identifier. Opaque to everything except equality/hashing.
pub type PeerId = String;

/// Generate one candidate id. Does not check the registry — callers retry
/// on collision via [`crate::registry::Registry::insert`]'s result.
pub fn generate() -> PeerId {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

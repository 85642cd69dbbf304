//! Hashing primitives
//!
//! Selector and topic derivation only needs a pure `bytes -> [u8; 32]`
//! digest, so the hash sits behind [`Hasher256`] and Keccak-256 is the
//! default implementation.

use tiny_keccak::{Hasher, Keccak};

/// Fixed 256-bit hash function
pub trait Hasher256 {
    fn digest(&self, data: &[u8]) -> [u8; 32];
}

/// Keccak-256 (the pre-standard SHA-3 variant used by Ethereum)
#[derive(Debug, Clone, Copy, Default)]
pub struct Keccak256;

impl Hasher256 for Keccak256 {
    fn digest(&self, data: &[u8]) -> [u8; 32] {
        keccak256(data)
    }
}

/// Keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

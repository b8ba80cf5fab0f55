//! Stable fingerprints of genus symbols.
//!
//! Symbols are serialized to a canonical byte layout (fixed-width
//! little-endian integers, length-prefixed sequences) and hashed with
//! SHA-256 under a domain tag, so equal values hash equally across builds
//! and platforms, and hashes of different kinds of value never collide by
//! construction.
//!
//! # Citations
//! - SHA-256: NIST FIPS 180-4 (2015)
//! - Domain separation & length prefixing: Bernstein et al., "How to hash into elliptic curves" (2009)

use crate::symbol::{DyadicBlock, JordanBlocks, OddBlock};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Domain tag of local symbol fingerprints.
pub const DOMAIN_LOCAL_SYMBOL_V0: &[u8] = b"LOCAL_SYMBOL_V0";

/// Domain tag of global genus fingerprints.
pub const DOMAIN_GENUS_V0: &[u8] = b"GENUS_V0";

/// A 256-bit hash value.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashValue(pub [u8; 32]);

impl HashValue {
    /// Creates a zero hash (all zeros).
    #[inline]
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Returns the raw byte array.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Computes SHA-256 of `data` with domain separation.
    ///
    /// The hashed message is `b"GENUS:" || domain || b":v1" || len(data) || data`,
    /// with the length as a 64-bit little-endian count of bytes.
    pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"GENUS:");
        hasher.update(domain);
        hasher.update(b":v1");
        hasher.update((data.len() as u64).to_le_bytes());
        hasher.update(data);
        Self(hasher.finalize().into())
    }
}

impl std::fmt::Display for HashValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First 4 bytes are enough to tell symbols apart in logs.
        write!(
            f,
            "HashValue({:02x}{:02x}{:02x}{:02x}…)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// Values with a canonical byte serialization.
pub trait Canonicalizable {
    /// Serialize to canonical byte representation.
    fn to_canonical_bytes(&self) -> Vec<u8>;

    /// Compute domain-separated hash of canonical bytes.
    fn fingerprint(&self, domain: &[u8]) -> HashValue {
        HashValue::hash_with_domain(domain, &self.to_canonical_bytes())
    }
}

impl Canonicalizable for OddBlock {
    fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(17);
        out.extend_from_slice(&self.scale.to_le_bytes());
        out.extend_from_slice(&(self.rank as u64).to_le_bytes());
        out.extend_from_slice(&self.det.to_le_bytes());
        out
    }
}

impl Canonicalizable for DyadicBlock {
    fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(19);
        out.extend_from_slice(&self.scale.to_le_bytes());
        out.extend_from_slice(&(self.rank as u64).to_le_bytes());
        out.extend_from_slice(&self.det.to_le_bytes());
        out.push(self.parity.as_flag() as u8);
        out.push(self.oddity);
        out
    }
}

impl Canonicalizable for JordanBlocks {
    fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            JordanBlocks::Odd(blocks) => {
                out.push(3);
                out.extend_from_slice(&(blocks.len() as u64).to_le_bytes());
                blocks
                    .iter()
                    .for_each(|b| out.extend_from_slice(&b.to_canonical_bytes()));
            }
            JordanBlocks::Dyadic(blocks) => {
                out.push(5);
                out.extend_from_slice(&(blocks.len() as u64).to_le_bytes());
                blocks
                    .iter()
                    .for_each(|b| out.extend_from_slice(&b.to_canonical_bytes()));
            }
        }
        out
    }
}

/// Fingerprint of the blocks of a local symbol at `prime`.
pub fn local_symbol_fingerprint(prime: u64, blocks: &JordanBlocks) -> HashValue {
    let mut data = Vec::new();
    data.extend_from_slice(&prime.to_le_bytes());
    data.extend_from_slice(&blocks.to_canonical_bytes());
    HashValue::hash_with_domain(DOMAIN_LOCAL_SYMBOL_V0, &data)
}

/// Fingerprint of a signature pair and the fingerprints of the local
/// symbols, in prime order.
pub fn genus_fingerprint(signature: (usize, usize), locals: &[HashValue]) -> HashValue {
    let mut data = Vec::with_capacity(24 + 32 * locals.len());
    data.extend_from_slice(&(signature.0 as u64).to_le_bytes());
    data.extend_from_slice(&(signature.1 as u64).to_le_bytes());
    data.extend_from_slice(&(locals.len() as u64).to_le_bytes());
    for fp in locals {
        data.extend_from_slice(fp.as_bytes());
    }
    HashValue::hash_with_domain(DOMAIN_GENUS_V0, &data)
}

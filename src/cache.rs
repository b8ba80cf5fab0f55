//! Memo table of canonical 2-adic reductions.
//!
//! Classifying many forms recomputes the same canonical reductions over and
//! over. [`CanonicalCache`] keys each reduction by the fingerprint of the
//! raw symbol it came from, so lookups depend only on the value of the
//! symbol and never on the identity of the object holding it.
//!
//! # References
//! - *Deterministic cache keys*: [Stable Hashing for Incremental Computation, PLDI 2021]

use crate::canonical::canonical_2_adic_reduction;
use crate::error::{GenusError, Result};
use crate::fingerprint::{local_symbol_fingerprint, HashValue};
use crate::local::LocalGenusSymbol;
use crate::symbol::{DyadicBlock, JordanBlocks};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical 2-adic reductions indexed by raw-symbol fingerprint.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CanonicalCache {
    entries: BTreeMap<HashValue, Vec<DyadicBlock>>,
    #[serde(skip)]
    hits: u64,
    #[serde(skip)]
    misses: u64,
}

impl CanonicalCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical reduction of a raw 2-adic symbol, computed at most once.
    pub fn canonical_2_adic(&mut self, raw: &[DyadicBlock]) -> Vec<DyadicBlock> {
        let key = local_symbol_fingerprint(2, &JordanBlocks::Dyadic(raw.to_vec()));
        if let Some(hit) = self.entries.get(&key) {
            self.hits += 1;
            return hit.clone();
        }
        self.misses += 1;
        let canonical = canonical_2_adic_reduction(raw);
        self.entries.insert(key, canonical.clone());
        canonical
    }

    /// Canonical form of a local symbol. Odd primes bypass the table.
    pub fn canonical_symbol(&mut self, symbol: &LocalGenusSymbol) -> JordanBlocks {
        match symbol.blocks() {
            JordanBlocks::Dyadic(raw) => JordanBlocks::Dyadic(self.canonical_2_adic(raw)),
            odd => odd.clone(),
        }
    }

    /// Number of cached reductions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no reductions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups answered from the table since creation or decoding.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that had to compute a reduction.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drops every entry and resets the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Serializes the table to CBOR bytes. Counters are not persisted.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        serde_cbor::to_vec(self).map_err(|e| GenusError::Serialization(e.to_string()))
    }

    /// Deserializes a table from CBOR bytes.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        serde_cbor::from_slice(bytes).map_err(|e| GenusError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::IntMatrix;

    fn hessian_symbol() -> LocalGenusSymbol {
        LocalGenusSymbol::from_matrix(&IntMatrix::diagonal(&[2, 4, 6, 8]), 2).unwrap()
    }

    #[test]
    fn second_lookup_hits() {
        let mut cache = CanonicalCache::new();
        let g = hessian_symbol();
        let first = cache.canonical_symbol(&g);
        let second = cache.canonical_symbol(&g);
        assert_eq!(first, second);
        assert_eq!(first, g.canonical_symbol());
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn odd_primes_bypass_table() {
        let mut cache = CanonicalCache::new();
        let g = LocalGenusSymbol::from_matrix(&IntMatrix::diagonal(&[2, 4, 6, 8]), 3).unwrap();
        assert_eq!(cache.canonical_symbol(&g), g.canonical_symbol());
        assert!(cache.is_empty());
        assert_eq!(cache.misses(), 0);
    }

    #[test]
    fn cbor_roundtrip_keeps_entries() {
        let mut cache = CanonicalCache::new();
        let g = hessian_symbol();
        let expected = cache.canonical_symbol(&g);
        let bytes = cache.to_cbor().expect("serialization should succeed");
        let mut decoded = CanonicalCache::from_cbor(&bytes).expect("deserialization should succeed");
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.hits(), 0);
        assert_eq!(decoded.canonical_symbol(&g), expected);
        assert_eq!(decoded.hits(), 1);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            CanonicalCache::from_cbor(&[0xff, 0x00, 0x13]),
            Err(GenusError::Serialization(_))
        ));
    }

    #[test]
    fn clear_resets() {
        let mut cache = CanonicalCache::new();
        cache.canonical_symbol(&hessian_symbol());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!((cache.hits(), cache.misses()), (0, 0));
    }
}

//! Local genus symbols.
//!
//! A [`LocalGenusSymbol`] is the Jordan decomposition of a form over the
//! `p`-adic integers, recorded as invariants only. Two local symbols are
//! equal when they describe the same `p`-adic form, which for `p = 2`
//! means their canonical reductions agree.
//!
//! # Citations
//! - Conway & Sloane, "Sphere Packings, Lattices and Groups", 3rd ed. (1999), Ch. 15 §7

use crate::arith;
use crate::canonical::{
    canonical_2_adic_compartments, canonical_2_adic_reduction, canonical_2_adic_trains,
    is_2_adic_genus,
};
use crate::config::GenusConfig;
use crate::error::{GenusError, Result};
use crate::fingerprint::{local_symbol_fingerprint, HashValue};
use crate::gram::{gram_from_dyadic_block, gram_from_odd_block};
use crate::jordan::{det_valuation, p_adic_symbol_with};
use crate::matrix::IntMatrix;
use crate::symbol::{DyadicBlock, JordanBlocks, OddBlock};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Genus symbol of a form at one prime.
///
/// Holds the raw Jordan blocks; decoding goes through
/// [`LocalGenusSymbol::new`], so a deserialized symbol is validated too.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "LocalSymbolRecord")]
pub struct LocalGenusSymbol {
    prime: u64,
    blocks: JordanBlocks,
    #[serde(skip)]
    det_exponent: u32,
}

/// Wire form of a [`LocalGenusSymbol`].
#[derive(Deserialize)]
struct LocalSymbolRecord {
    prime: u64,
    blocks: JordanBlocks,
}

impl TryFrom<LocalSymbolRecord> for LocalGenusSymbol {
    type Error = GenusError;

    fn try_from(record: LocalSymbolRecord) -> Result<Self> {
        Self::new(record.prime, record.blocks)
    }
}

/// `Σ m·n` over the blocks, the exponent of `p` in the determinant.
fn det_exponent(blocks: &JordanBlocks) -> Result<u32> {
    let overflow = || GenusError::InvalidBlock("determinant exponent overflows".into());
    let total = blocks
        .scales()
        .iter()
        .zip(blocks.ranks())
        .try_fold(0u64, |acc, (&m, n)| {
            u64::try_from(n)
                .ok()
                .and_then(|n| u64::from(m).checked_mul(n))
                .and_then(|e| acc.checked_add(e))
        })
        .ok_or_else(overflow)?;
    u32::try_from(total).map_err(|_| overflow())
}

/// Re-runs the block constructors, which public fields may have bypassed.
fn validate_blocks(blocks: &JordanBlocks) -> Result<()> {
    match blocks {
        JordanBlocks::Odd(b) => b
            .iter()
            .try_for_each(|b| OddBlock::new(b.scale, b.rank, b.det).map(drop)),
        JordanBlocks::Dyadic(b) => b.iter().enumerate().try_for_each(|(i, b)| {
            DyadicBlock::new(b.scale, b.rank, b.det, b.parity, b.oddity)?;
            if b.det == -1 {
                return Err(GenusError::InvalidBlock(format!(
                    "block {i} has a canonical determinant; raw 2-adic blocks carry det mod 8"
                )));
            }
            Ok(())
        }),
    }
}

impl LocalGenusSymbol {
    /// Creates a symbol from its Jordan blocks.
    ///
    /// # Errors
    /// [`GenusError::NotPrime`], [`GenusError::PrimeShapeMismatch`] when the
    /// block shape does not suit the prime, [`GenusError::EmptyBlock`],
    /// [`GenusError::InvalidBlock`] for out-of-range entries (including a
    /// canonical `det = -1` at `p = 2`) and [`GenusError::UnorderedScales`].
    pub fn new(prime: u64, blocks: JordanBlocks) -> Result<Self> {
        if !arith::is_prime(prime) {
            return Err(GenusError::NotPrime(prime));
        }
        if !blocks.matches_prime(prime) {
            return Err(GenusError::PrimeShapeMismatch(prime));
        }
        if let Some(i) = blocks.ranks().iter().position(|&n| n == 0) {
            return Err(GenusError::EmptyBlock(i));
        }
        validate_blocks(&blocks)?;
        if let Some(i) = blocks.scales().windows(2).position(|w| w[0] >= w[1]) {
            return Err(GenusError::UnorderedScales(i + 1));
        }
        let det_exponent = det_exponent(&blocks)?;
        Ok(Self {
            prime,
            blocks,
            det_exponent,
        })
    }

    /// Parses plain integer records, triples for odd `p` and quintuples for `p = 2`.
    ///
    /// ```
    /// use genus_symbol::LocalGenusSymbol;
    ///
    /// let g = LocalGenusSymbol::from_tuples(2, &[[0, 2, 1, 1, 2]]).unwrap();
    /// assert_eq!(g.to_string(), "Genus symbol at 2:    [1^2]_2");
    /// assert!(LocalGenusSymbol::from_tuples(3, &[[0, 2, 1, 1, 2]]).is_err());
    /// ```
    pub fn from_tuples<R: AsRef<[i64]>>(prime: u64, records: &[R]) -> Result<Self> {
        Self::new(prime, JordanBlocks::from_tuples(prime, records)?)
    }

    /// Local symbol of the form with Gram matrix `a` at `p`.
    pub fn from_matrix(a: &IntMatrix, p: u64) -> Result<Self> {
        Self::from_matrix_with(a, p, &GenusConfig::default())
    }

    /// [`LocalGenusSymbol::from_matrix`] with an explicit configuration.
    pub fn from_matrix_with(a: &IntMatrix, p: u64, config: &GenusConfig) -> Result<Self> {
        a.require_symmetric()?;
        let val = det_valuation(a, p)?;
        Self::new(p, p_adic_symbol_with(a, p, val, config)?)
    }

    /// The prime.
    #[inline]
    pub fn prime(&self) -> u64 {
        self.prime
    }

    /// The raw Jordan blocks.
    #[inline]
    pub fn blocks(&self) -> &JordanBlocks {
        &self.blocks
    }

    /// The raw blocks as integer records.
    pub fn symbol_tuple_list(&self) -> Vec<Vec<i64>> {
        self.blocks.to_tuples()
    }

    /// Canonical form: the 2-adic reduction for `p = 2`, the blocks themselves otherwise.
    pub fn canonical_symbol(&self) -> JordanBlocks {
        match &self.blocks {
            JordanBlocks::Dyadic(b) => JordanBlocks::Dyadic(canonical_2_adic_reduction(b)),
            odd => odd.clone(),
        }
    }

    /// Number of Jordan blocks.
    pub fn number_of_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Absolute determinant `∏ p^(m·n)`.
    pub fn determinant(&self) -> BigInt {
        arith::pow(self.prime, self.det_exponent)
    }

    /// `Σ m·n`, the valuation of the determinant at the prime.
    pub fn determinant_exponent(&self) -> u32 {
        self.det_exponent
    }

    /// Total rank.
    pub fn rank(&self) -> usize {
        self.blocks.ranks().iter().sum()
    }

    /// Same as [`LocalGenusSymbol::rank`].
    pub fn dimension(&self) -> usize {
        self.rank()
    }

    /// The `p`-excess, or for `p = 2` the oddity, modulo 8.
    ///
    /// ```
    /// use genus_symbol::{IntMatrix, LocalGenusSymbol};
    ///
    /// let a = IntMatrix::diagonal(&[2, 4, 6, 8]);
    /// let excess = |p| LocalGenusSymbol::from_matrix(&a, p).unwrap().excess();
    /// assert_eq!(excess(2), 2);
    /// assert_eq!(excess(3), 6);
    /// ```
    pub fn excess(&self) -> u8 {
        let total = match &self.blocks {
            JordanBlocks::Dyadic(blocks) => blocks
                .iter()
                .map(|b| {
                    let sign_term = if b.scale % 2 == 1 && b.det_sign() == -1 { 4 } else { 0 };
                    i64::from(b.oddity) + sign_term
                })
                .sum::<i64>(),
            JordanBlocks::Odd(blocks) => blocks
                .iter()
                .map(|b| {
                    let n = b.rank as i64 % 8;
                    let q = arith::pow_mod8(self.prime, b.scale);
                    let sign_term = if b.scale % 2 == 1 && b.det == -1 { 4 } else { 0 };
                    n * (q - 1) + sign_term
                })
                .sum::<i64>(),
        };
        total.rem_euclid(8) as u8
    }

    /// Trains of the canonical symbol.
    ///
    /// # Errors
    /// [`GenusError::NotDyadic`] for odd `p`.
    pub fn trains(&self) -> Result<Vec<Vec<usize>>> {
        match &self.blocks {
            JordanBlocks::Dyadic(b) => Ok(canonical_2_adic_trains(b)),
            JordanBlocks::Odd(_) => Err(GenusError::NotDyadic(self.prime)),
        }
    }

    /// Compartments of the canonical symbol.
    ///
    /// # Errors
    /// [`GenusError::NotDyadic`] for odd `p`.
    pub fn compartments(&self) -> Result<Vec<Vec<usize>>> {
        match &self.blocks {
            JordanBlocks::Dyadic(b) => Ok(canonical_2_adic_compartments(b)),
            JordanBlocks::Odd(_) => Err(GenusError::NotDyadic(self.prime)),
        }
    }

    /// Whether the raw symbol satisfies the existence conditions of a
    /// 2-adic form. Always true at odd primes.
    pub fn is_realizable(&self) -> bool {
        match &self.blocks {
            JordanBlocks::Dyadic(b) => is_2_adic_genus(b),
            JordanBlocks::Odd(_) => true,
        }
    }

    /// Whether both symbols describe the same `p`-adic form.
    pub fn equivalent(&self, other: &Self) -> bool {
        self.prime == other.prime && self.canonical_symbol() == other.canonical_symbol()
    }

    /// Fingerprint of the canonical form; equal for equivalent symbols.
    pub fn fingerprint(&self) -> HashValue {
        local_symbol_fingerprint(self.prime, &self.canonical_symbol())
    }

    /// Fingerprint of the raw blocks.
    pub fn raw_fingerprint(&self) -> HashValue {
        local_symbol_fingerprint(self.prime, &self.blocks)
    }

    /// A Gram matrix of a representative, checked against this symbol.
    ///
    /// ```
    /// use genus_symbol::{IntMatrix, LocalGenusSymbol};
    ///
    /// let a = IntMatrix::diagonal(&[2, 4, 6, 8]);
    /// let g2 = LocalGenusSymbol::from_matrix(&a, 2).unwrap();
    /// assert_eq!(g2.gram_matrix().unwrap(), IntMatrix::diagonal(&[2, 6, 4, 8]));
    /// ```
    pub fn gram_matrix(&self) -> Result<IntMatrix> {
        self.gram_matrix_with(&GenusConfig::default())
    }

    /// [`LocalGenusSymbol::gram_matrix`] with an explicit configuration.
    ///
    /// # Errors
    /// [`GenusError::InvalidBlock`] for a block with no normal form, and
    /// [`GenusError::ReconstructionMismatch`] when verification is enabled
    /// and the matrix has a different symbol.
    pub fn gram_matrix_with(&self, config: &GenusConfig) -> Result<IntMatrix> {
        config.validate()?;
        let parts = match &self.blocks {
            JordanBlocks::Odd(blocks) => blocks
                .iter()
                .map(|b| gram_from_odd_block(self.prime, b))
                .collect::<Vec<_>>(),
            JordanBlocks::Dyadic(blocks) => blocks
                .iter()
                .map(gram_from_dyadic_block)
                .collect::<Result<Vec<_>>>()?,
        };
        let gram = IntMatrix::block_diagonal(&parts);
        if config.verify_reconstruction && !self.blocks.is_empty() {
            let val = self.blocks.scales().last().copied().unwrap_or(0);
            let found = Self::new(self.prime, p_adic_symbol_with(&gram, self.prime, val, config)?)?;
            if !found.equivalent(self) {
                debug!(prime = self.prime, "reconstructed gram matrix has a different symbol");
                return Err(GenusError::ReconstructionMismatch {
                    expected: format!("{:?}", self.canonical_symbol().to_tuples()),
                    found: format!("{:?}", found.canonical_symbol().to_tuples()),
                });
            }
        }
        Ok(gram)
    }

    fn symbol_string(&self) -> String {
        let p = self.prime;
        let power = |m: u32, d: i8, n: usize| format!("{}^{}", arith::pow(p, m), i64::from(d) * n as i64);
        match self.canonical_symbol() {
            JordanBlocks::Odd(blocks) => blocks
                .iter()
                .map(|b| format!(" {}", power(b.scale, b.det, b.rank)))
                .collect(),
            JordanBlocks::Dyadic(canonical) => {
                let compartments = canonical_2_adic_compartments(&canonical);
                let trains = canonical_2_adic_trains(&canonical);
                let mut trains_out = Vec::with_capacity(trains.len());
                for train in trains {
                    let mut out = String::new();
                    for i in train {
                        let b = &canonical[i];
                        let compartment = compartments.iter().find(|c| c.contains(&i));
                        if compartment.is_some_and(|c| c[0] == i) {
                            out.push('[');
                        }
                        out.push_str(&power(b.scale, b.det, b.rank));
                        if let Some(c) = compartment.filter(|c| c.last() == Some(&i)) {
                            out.push_str(&format!("]_{}", canonical[c[0]].oddity));
                        }
                        out.push(' ');
                    }
                    trains_out.push(out.trim_end().to_string());
                }
                trains_out.join(" :")
            }
        }
    }
}

impl PartialEq for LocalGenusSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.equivalent(other)
    }
}

impl Eq for LocalGenusSymbol {}

impl fmt::Display for LocalGenusSymbol {
    /// `Genus symbol at p:    <symbol>`, with trains separated by ` :` and
    /// compartments written `[...]_oddity` at `p = 2`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Genus symbol at {}:    {}", self.prime, self.symbol_string())
    }
}

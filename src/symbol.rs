//! Jordan block records of local genus symbols.
//!
//! A `p`-adic form splits as an orthogonal sum `⊕ p^m·f_m` of scaled
//! unimodular constituents. Each constituent is summarized by a record:
//!
//! - odd `p`: `(m, n, d)` with `d = ±1` the Legendre symbol of `det f_m`,
//! - `p = 2`: `(m, n, d, s, o)` with `d` the determinant modulo 8, `s` the
//!   type (even/odd) and `o` the oddity.
//!
//! The two shapes are distinct types, and [`JordanBlocks`] ties a list of
//! them to the kind of prime it belongs to.
//!
//! # Citations
//! - Conway & Sloane, "Sphere Packings, Lattices and Groups", 3rd ed. (1999), Ch. 15 §7

use crate::error::{GenusError, Result};
use serde::{Deserialize, Serialize};

/// Type of a 2-adic Jordan constituent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Parity {
    /// Type II: every diagonal entry is even.
    Even,
    /// Type I: some diagonal entry is odd.
    Odd,
}

impl Parity {
    /// The `s` entry of a quintuple (0 for even, 1 for odd).
    #[inline]
    pub const fn as_flag(self) -> i64 {
        match self {
            Parity::Even => 0,
            Parity::Odd => 1,
        }
    }

    fn from_flag(flag: i64) -> Option<Self> {
        match flag {
            0 => Some(Parity::Even),
            1 => Some(Parity::Odd),
            _ => None,
        }
    }
}

/// Jordan constituent `p^scale · f` for an odd prime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OddBlock {
    /// Exponent `m` of the scale `p^m`.
    pub scale: u32,
    /// Rank `n` of `f`.
    pub rank: usize,
    /// Legendre symbol of `det f`, `±1`.
    pub det: i8,
}

impl OddBlock {
    /// Creates a block, checking that `det` is `±1` and `rank > 0`.
    pub fn new(scale: u32, rank: usize, det: i8) -> Result<Self> {
        if rank == 0 {
            return Err(GenusError::InvalidBlock("rank must be positive".into()));
        }
        if det != 1 && det != -1 {
            return Err(GenusError::InvalidBlock(format!(
                "determinant class {det} is not ±1"
            )));
        }
        Ok(Self { scale, rank, det })
    }

    /// The `(m, n, d)` triple.
    pub fn to_tuple(&self) -> Vec<i64> {
        vec![self.scale as i64, self.rank as i64, self.det as i64]
    }
}

/// Jordan constituent `2^scale · f` at the prime 2.
///
/// Raw symbols carry `det ∈ {1, 3, 5, 7}`; canonical symbols carry
/// `det ∈ {1, -1}` (the class of `det f` modulo squares of units up to sign).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DyadicBlock {
    /// Exponent `m` of the scale `2^m`.
    pub scale: u32,
    /// Rank `n` of `f`.
    pub rank: usize,
    /// Determinant of `f` modulo 8, or its canonical sign.
    pub det: i8,
    /// Even (type II) or odd (type I).
    pub parity: Parity,
    /// Trace of a diagonalization of `f` modulo 8; zero for even blocks.
    pub oddity: u8,
}

impl DyadicBlock {
    /// Creates a block, checking the ranges of every entry.
    pub fn new(scale: u32, rank: usize, det: i8, parity: Parity, oddity: u8) -> Result<Self> {
        if rank == 0 {
            return Err(GenusError::InvalidBlock("rank must be positive".into()));
        }
        if !matches!(det, -1 | 1 | 3 | 5 | 7) {
            return Err(GenusError::InvalidBlock(format!(
                "2-adic determinant {det} is not in {{1, 3, 5, 7}} or ±1"
            )));
        }
        if oddity >= 8 {
            return Err(GenusError::InvalidBlock(format!(
                "oddity {oddity} is not reduced modulo 8"
            )));
        }
        Ok(Self {
            scale,
            rank,
            det,
            parity,
            oddity,
        })
    }

    /// Whether the constituent is of type I.
    #[inline]
    pub fn is_odd(&self) -> bool {
        self.parity == Parity::Odd
    }

    /// Sign class of the determinant: `+1` for `det ∈ {1, 7}`, `-1` otherwise.
    #[inline]
    pub fn det_sign(&self) -> i8 {
        match self.det {
            1 | 7 => 1,
            _ => -1,
        }
    }

    /// The `(m, n, d, s, o)` quintuple.
    pub fn to_tuple(&self) -> Vec<i64> {
        vec![
            self.scale as i64,
            self.rank as i64,
            self.det as i64,
            self.parity.as_flag(),
            self.oddity as i64,
        ]
    }
}

/// The ordered Jordan constituents of a local symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JordanBlocks {
    /// Triples, for an odd prime.
    Odd(Vec<OddBlock>),
    /// Quintuples, for the prime 2.
    Dyadic(Vec<DyadicBlock>),
}

impl JordanBlocks {
    /// Number of constituents.
    pub fn len(&self) -> usize {
        match self {
            JordanBlocks::Odd(b) => b.len(),
            JordanBlocks::Dyadic(b) => b.len(),
        }
    }

    /// Whether there are no constituents (the zero-dimensional form).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scale exponents in order.
    pub fn scales(&self) -> Vec<u32> {
        match self {
            JordanBlocks::Odd(b) => b.iter().map(|s| s.scale).collect(),
            JordanBlocks::Dyadic(b) => b.iter().map(|s| s.scale).collect(),
        }
    }

    /// Ranks in order.
    pub fn ranks(&self) -> Vec<usize> {
        match self {
            JordanBlocks::Odd(b) => b.iter().map(|s| s.rank).collect(),
            JordanBlocks::Dyadic(b) => b.iter().map(|s| s.rank).collect(),
        }
    }

    /// Determinant entries in order.
    pub fn dets(&self) -> Vec<i8> {
        match self {
            JordanBlocks::Odd(b) => b.iter().map(|s| s.det).collect(),
            JordanBlocks::Dyadic(b) => b.iter().map(|s| s.det).collect(),
        }
    }

    /// Whether the shape suits the prime (`Dyadic` iff `p = 2`).
    pub fn matches_prime(&self, prime: u64) -> bool {
        matches!(
            (self, prime == 2),
            (JordanBlocks::Dyadic(_), true) | (JordanBlocks::Odd(_), false)
        )
    }

    /// Plain integer records, triples or quintuples.
    pub fn to_tuples(&self) -> Vec<Vec<i64>> {
        match self {
            JordanBlocks::Odd(b) => b.iter().map(OddBlock::to_tuple).collect(),
            JordanBlocks::Dyadic(b) => b.iter().map(DyadicBlock::to_tuple).collect(),
        }
    }

    /// Parses plain integer records for the given prime.
    ///
    /// Every record must be a triple for odd `p` and a quintuple for `p = 2`.
    pub fn from_tuples<R: AsRef<[i64]>>(prime: u64, records: &[R]) -> Result<Self> {
        let expected = if prime == 2 { 5 } else { 3 };
        for (index, r) in records.iter().enumerate() {
            let found = r.as_ref().len();
            if found != expected {
                return Err(GenusError::SymbolArity {
                    prime,
                    index,
                    expected,
                    found,
                });
            }
        }
        if prime == 2 {
            let blocks = records
                .iter()
                .enumerate()
                .map(|(i, r)| parse_dyadic(i, r.as_ref()))
                .collect::<Result<Vec<_>>>()?;
            Ok(JordanBlocks::Dyadic(blocks))
        } else {
            let blocks = records
                .iter()
                .enumerate()
                .map(|(i, r)| parse_odd(i, r.as_ref()))
                .collect::<Result<Vec<_>>>()?;
            Ok(JordanBlocks::Odd(blocks))
        }
    }
}

fn field<T: TryFrom<i64>>(index: usize, name: &str, value: i64) -> Result<T> {
    T::try_from(value).map_err(|_| {
        GenusError::InvalidBlock(format!("record {index}: {name} = {value} out of range"))
    })
}

fn parse_odd(index: usize, r: &[i64]) -> Result<OddBlock> {
    let rank: usize = field(index, "rank", r[1])?;
    if rank == 0 {
        return Err(GenusError::EmptyBlock(index));
    }
    OddBlock::new(field(index, "scale", r[0])?, rank, field(index, "det", r[2])?)
}

fn parse_dyadic(index: usize, r: &[i64]) -> Result<DyadicBlock> {
    let rank: usize = field(index, "rank", r[1])?;
    if rank == 0 {
        return Err(GenusError::EmptyBlock(index));
    }
    let parity = Parity::from_flag(r[3]).ok_or_else(|| {
        GenusError::InvalidBlock(format!("record {index}: type flag {} is not 0 or 1", r[3]))
    })?;
    DyadicBlock::new(
        field(index, "scale", r[0])?,
        rank,
        field(index, "det", r[2])?,
        parity,
        field(index, "oddity", r[4])?,
    )
}

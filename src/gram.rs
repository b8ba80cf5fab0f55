//! Representative Gram matrices of Jordan blocks.
//!
//! Every local genus symbol is realized by a block-diagonal matrix built
//! from a small set of normal forms:
//!
//! - odd `p`: `p^m · I_n`, with the first diagonal entry replaced by the
//!   least quadratic non-residue when the determinant class is `-1`;
//! - `p = 2`: hyperbolic planes `U = [[0,1],[1,0]]`, the anisotropic plane
//!   `V = [[2,1],[1,2]]` and scalars `[t]`, chosen from the determinant,
//!   rank parity and oddity of the block, then scaled by `2^m`.
//!
//! # Citations
//! - Conway & Sloane, "Sphere Packings, Lattices and Groups", 3rd ed. (1999), Ch. 15 §7.4 (Tables 15.4–15.5)

use crate::arith;
use crate::error::{GenusError, Result};
use crate::matrix::IntMatrix;
use crate::symbol::{DyadicBlock, OddBlock};
use num_bigint::BigInt;

fn plane(diagonal: i64) -> IntMatrix {
    let mut q = IntMatrix::diagonal(&[diagonal, diagonal]);
    q.set(0, 1, BigInt::from(1));
    q.set(1, 0, BigInt::from(1));
    q
}

/// `U`, the hyperbolic plane.
fn hyperbolic() -> IntMatrix {
    plane(0)
}

/// `V`, the even anisotropic plane.
fn anisotropic() -> IntMatrix {
    plane(2)
}

fn scalar(t: i64) -> IntMatrix {
    IntMatrix::diagonal(&[t])
}

/// Gram matrix of an odd-prime Jordan block `(m, n, d)`.
///
/// ```
/// use genus_symbol::gram::gram_from_odd_block;
/// use genus_symbol::symbol::OddBlock;
/// use genus_symbol::IntMatrix;
///
/// let g = gram_from_odd_block(5, &OddBlock::new(1, 3, 1).unwrap());
/// assert_eq!(g, IntMatrix::diagonal(&[5, 5, 5]));
/// ```
pub fn gram_from_odd_block(p: u64, block: &OddBlock) -> IntMatrix {
    let mut q = IntMatrix::identity(block.rank);
    if block.det != 1 && block.rank > 0 {
        q.set(0, 0, BigInt::from(arith::min_nonsquare(p)));
    }
    q.scaled(&arith::pow(p, block.scale))
}

/// Gram matrix of a 2-adic Jordan block `(m, n, d, s, o)`.
///
/// Accepts raw (`d ∈ {1,3,5,7}`) and canonical (`d = ±1`) determinants.
///
/// # Errors
/// [`GenusError::InvalidBlock`] when no normal form matches, i.e. the
/// block fails the existence conditions of a 2-adic form.
///
/// ```
/// use genus_symbol::gram::gram_from_dyadic_block;
/// use genus_symbol::symbol::{DyadicBlock, Parity};
/// use genus_symbol::IntMatrix;
///
/// let block = DyadicBlock::new(1, 4, 7, Parity::Odd, 2).unwrap();
/// let g = gram_from_dyadic_block(&block).unwrap();
/// let expected = IntMatrix::from_rows(&[[0, 2, 0, 0], [2, 0, 0, 0], [0, 0, 2, 0], [0, 0, 0, 2]]).unwrap();
/// assert_eq!(g, expected);
/// ```
pub fn gram_from_dyadic_block(block: &DyadicBlock) -> Result<IntMatrix> {
    let rank = block.rank;
    let det = i64::from(block.det);
    let t = i64::from(block.oddity);
    let mut parts: Vec<IntMatrix> = Vec::new();

    if rank == 0 {
        return Err(GenusError::InvalidBlock("rank must be positive".into()));
    }
    if !block.is_odd() {
        if rank % 2 == 1 {
            return Err(GenusError::InvalidBlock(format!(
                "even 2-adic block of odd rank {rank}"
            )));
        }
        if matches!(det, 1 | 7) {
            parts.extend(std::iter::repeat_with(hyperbolic).take(rank / 2));
        } else {
            parts.extend(std::iter::repeat_with(hyperbolic).take(rank / 2 - 1));
            parts.push(anisotropic());
        }
    } else if rank % 2 == 1 {
        parts.extend(std::iter::repeat_with(hyperbolic).take(rank.saturating_sub(3) / 2));
        if matches!((t * det).rem_euclid(8), 3 | 5) {
            parts.push(anisotropic());
        } else if rank >= 3 {
            parts.push(hyperbolic());
        }
        parts.push(scalar(t));
    } else {
        let sign = if matches!(det, 3 | 5 | -1) { -1 } else { 1 };
        parts.extend(std::iter::repeat_with(hyperbolic).take(rank.saturating_sub(4) / 2));
        let (head, a, b) = match (sign, t) {
            (1, 0) => (hyperbolic(), 1, 7),
            (1, 2) => (hyperbolic(), 1, 1),
            (1, 4) => (anisotropic(), 1, 3),
            (1, 6) => (hyperbolic(), 7, 7),
            (-1, 0) => (anisotropic(), 1, 7),
            (-1, 2) => (hyperbolic(), 3, 7),
            (-1, 4) => (hyperbolic(), 1, 3),
            (-1, 6) => (hyperbolic(), 1, 5),
            _ => {
                return Err(GenusError::InvalidBlock(format!(
                    "no normal form for an odd block of even rank with determinant {det} and oddity {t}"
                )))
            }
        };
        if rank > 2 {
            parts.push(head);
        }
        parts.push(scalar(a));
        parts.push(scalar(b));
    }
    Ok(IntMatrix::block_diagonal(&parts).scaled(&arith::pow(2, block.scale)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Parity;

    fn dyadic(scale: u32, rank: usize, det: i8, odd: bool, oddity: u8) -> DyadicBlock {
        let parity = if odd { Parity::Odd } else { Parity::Even };
        DyadicBlock::new(scale, rank, det, parity, oddity).unwrap()
    }

    fn m(rows: &[&[i64]]) -> IntMatrix {
        IntMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn odd_prime_nonresidue_block() {
        let g = gram_from_odd_block(3, &OddBlock::new(2, 2, -1).unwrap());
        assert_eq!(g, IntMatrix::diagonal(&[18, 9]));
        let g = gram_from_odd_block(7, &OddBlock::new(0, 1, -1).unwrap());
        assert_eq!(g, IntMatrix::diagonal(&[3]));
    }

    #[test]
    fn even_blocks() {
        assert_eq!(
            gram_from_dyadic_block(&dyadic(0, 2, 7, false, 0)).unwrap(),
            m(&[&[0, 1], &[1, 0]])
        );
        assert_eq!(
            gram_from_dyadic_block(&dyadic(1, 2, 3, false, 0)).unwrap(),
            m(&[&[4, 2], &[2, 4]])
        );
        assert_eq!(
            gram_from_dyadic_block(&dyadic(0, 4, -1, false, 0)).unwrap(),
            m(&[&[0, 1, 0, 0], &[1, 0, 0, 0], &[0, 0, 2, 1], &[0, 0, 1, 2]])
        );
    }

    #[test]
    fn odd_rank_blocks() {
        assert_eq!(
            gram_from_dyadic_block(&dyadic(0, 1, 3, true, 3)).unwrap(),
            IntMatrix::diagonal(&[3])
        );
        assert_eq!(
            gram_from_dyadic_block(&dyadic(2, 1, 5, true, 5)).unwrap(),
            IntMatrix::diagonal(&[20])
        );
        // t·det = 1·3 ≡ 3: anisotropic plane then the scalar.
        assert_eq!(
            gram_from_dyadic_block(&dyadic(0, 3, 3, true, 1)).unwrap(),
            m(&[&[2, 1, 0], &[1, 2, 0], &[0, 0, 1]])
        );
        assert_eq!(
            gram_from_dyadic_block(&dyadic(0, 3, 1, true, 1)).unwrap(),
            m(&[&[0, 1, 0], &[1, 0, 0], &[0, 0, 1]])
        );
    }

    /// Raw 2^1 block of the Hessian of diag(1,2,3,4).
    #[test]
    fn even_rank_odd_block() {
        assert_eq!(
            gram_from_dyadic_block(&dyadic(1, 2, 3, true, 4)).unwrap(),
            IntMatrix::diagonal(&[2, 6])
        );
        assert_eq!(
            gram_from_dyadic_block(&dyadic(0, 2, 1, true, 2)).unwrap(),
            IntMatrix::diagonal(&[1, 1])
        );
    }

    #[test]
    fn impossible_blocks_rejected() {
        assert!(gram_from_dyadic_block(&dyadic(0, 2, 1, true, 3)).is_err());
        assert!(gram_from_dyadic_block(&dyadic(0, 3, 1, false, 0)).is_err());
        let empty = DyadicBlock { rank: 0, ..dyadic(0, 2, 3, false, 0) };
        assert!(gram_from_dyadic_block(&empty).is_err());
        let empty = OddBlock { scale: 1, rank: 0, det: -1 };
        assert_eq!(gram_from_odd_block(3, &empty).nrows(), 0);
    }
}

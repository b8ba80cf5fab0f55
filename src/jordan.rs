//! p-adic Jordan decomposition of integral symmetric matrices.
//!
//! A nonsingular symmetric matrix `A` over `Z_p` splits as an orthogonal sum
//! of scaled unimodular blocks. The splitting is computed one scale at a
//! time: after dividing out `p^m` (the minimal valuation of an entry),
//! reduction modulo `p` separates a unimodular part (a complement of the
//! left kernel) from the rest, and the rest is projected to the orthogonal
//! complement through the inverse of the unimodular part lifted to
//! `Z/p^(val + margin)`. Only the invariants of each block are kept.
//!
//! At `p = 2` the oddity of an odd block is the trace of a diagonalization
//! modulo 8, found by repeatedly splitting off a `1×1` odd constituent
//! ([`split_odd`]).
//!
//! # Citations
//! - Conway & Sloane, "Sphere Packings, Lattices and Groups", 3rd ed. (1999), Ch. 15 §7.3–7.5
//! - Cassels, "Rational Quadratic Forms" (1978), Ch. 8 – Jordan splittings over `Z_p`

use crate::arith;
use crate::config::GenusConfig;
use crate::error::{GenusError, Result};
use crate::matrix::IntMatrix;
use crate::modular::{basis_complement, inverse_mod_prime_power, kernel_mod_p};
use crate::symbol::{DyadicBlock, JordanBlocks, OddBlock, Parity};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};
use tracing::{debug, trace};

/// Jordan decomposition of `a` at the prime `p`, with the default precision margin.
///
/// `val` must be at least the `p`-adic valuation of the largest elementary
/// divisor of `a`; the valuation of `det a` always works.
///
/// # Errors
/// [`GenusError::NotPrime`] for composite `p`, a shape error for a
/// non-symmetric `a`, and [`GenusError::Singular`] for `det a = 0`.
///
/// # Examples
/// ```
/// use genus_symbol::{jordan::p_adic_symbol, IntMatrix};
///
/// let a = IntMatrix::diagonal(&[1, 2, 3, 4]);
/// let blocks = p_adic_symbol(&a, 3, 1).unwrap();
/// assert_eq!(blocks.to_tuples(), vec![vec![0, 3, -1], vec![1, 1, 1]]);
/// ```
pub fn p_adic_symbol(a: &IntMatrix, p: u64, val: u32) -> Result<JordanBlocks> {
    p_adic_symbol_with(a, p, val, &GenusConfig::default())
}

/// [`p_adic_symbol`] with an explicit configuration.
pub fn p_adic_symbol_with(
    a: &IntMatrix,
    p: u64,
    val: u32,
    config: &GenusConfig,
) -> Result<JordanBlocks> {
    config.validate()?;
    if !arith::is_prime(p) {
        return Err(GenusError::NotPrime(p));
    }
    a.require_symmetric()?;
    if a.determinant()?.is_zero() {
        return Err(GenusError::Singular);
    }
    let modulus = arith::pow(p, val + config.precision_margin);
    debug!(prime = p, rank = a.nrows(), val, "jordan decomposition");
    if p == 2 {
        Ok(JordanBlocks::Dyadic(dyadic_blocks(a, &modulus)?))
    } else {
        Ok(JordanBlocks::Odd(odd_blocks(a, p, &modulus)?))
    }
}

/// Jordan decomposition at `p = 2` as quintuples with raw determinants.
///
/// ```
/// use genus_symbol::{jordan::two_adic_symbol, IntMatrix};
///
/// let a = IntMatrix::diagonal(&[1, 2, 3, 4]);
/// let blocks = two_adic_symbol(&a, 2).unwrap();
/// let tuples: Vec<_> = blocks.iter().map(|b| b.to_tuple()).collect();
/// assert_eq!(tuples, vec![vec![0, 2, 3, 1, 4], vec![1, 1, 1, 1, 1], vec![2, 1, 1, 1, 1]]);
/// ```
pub fn two_adic_symbol(a: &IntMatrix, val: u32) -> Result<Vec<DyadicBlock>> {
    match p_adic_symbol(a, 2, val)? {
        JordanBlocks::Dyadic(blocks) => Ok(blocks),
        JordanBlocks::Odd(_) => Err(GenusError::PrimeShapeMismatch(2)),
    }
}

fn divide_out_scale(a: &IntMatrix, p: u64) -> Result<(u32, IntMatrix)> {
    let m0 = a.min_valuation(p).ok_or(GenusError::Singular)?;
    let q = arith::pow(p, m0);
    Ok((m0, a.map(|c| c / &q)))
}

/// Projects `a` onto the orthogonal complement of the unimodular part
/// spanned by the rows of `c`, then expresses it in the kernel basis `b`.
fn split_residual(
    a: &IntMatrix,
    b: &IntMatrix,
    c: &IntMatrix,
    p: u64,
    modulus: &BigInt,
) -> Result<IntMatrix> {
    let f = a.congruence(c)?;
    let u = inverse_mod_prime_power(&f, p, modulus)?;
    let x = c.mul(a)?;
    let correction = x.transpose().mul(&u)?.mul(&x)?;
    a.sub(&correction)?.congruence(b)
}

fn odd_blocks(a: &IntMatrix, p: u64, modulus: &BigInt) -> Result<Vec<OddBlock>> {
    let n = a.nrows();
    if n == 0 {
        return Ok(Vec::new());
    }
    let (m0, a) = divide_out_scale(a, p)?;
    let kernel = kernel_mod_p(&a, p);
    if kernel.nrows() == 0 {
        let det = arith::kronecker(&a.determinant()?, p);
        trace!(prime = p, scale = m0, rank = n, det, "final block");
        return Ok(vec![OddBlock::new(m0, n, det).map_err(|_| GenusError::DegenerateBlock)?]);
    }
    let c = basis_complement(&kernel);
    let det = arith::kronecker(&a.congruence(&c)?.determinant()?, p);
    let head = OddBlock::new(m0, c.nrows(), det).map_err(|_| GenusError::DegenerateBlock)?;
    trace!(prime = p, scale = m0, rank = head.rank, det, "split block");
    let residual = split_residual(&a, &kernel, &c, p, modulus)?;
    let mut blocks = vec![head];
    blocks.extend(odd_blocks(&residual, p, modulus)?.into_iter().map(|mut b| {
        b.scale += m0;
        b
    }));
    Ok(blocks)
}

fn dyadic_blocks(a: &IntMatrix, modulus: &BigInt) -> Result<Vec<DyadicBlock>> {
    let n = a.nrows();
    if n == 0 {
        return Ok(Vec::new());
    }
    let (m0, a) = divide_out_scale(a, 2)?;
    let kernel = kernel_mod_p(&a, 2);
    if kernel.nrows() == 0 {
        return Ok(vec![unimodular_dyadic_block(m0, &a)?]);
    }
    let c = basis_complement(&kernel);
    let head = unimodular_dyadic_block(m0, &a.congruence(&c)?)?;
    let residual = split_residual(&a, &kernel, &c, 2, modulus)?;
    let mut blocks = vec![head];
    blocks.extend(dyadic_blocks(&residual, modulus)?.into_iter().map(|mut b| {
        b.scale += m0;
        b
    }));
    Ok(blocks)
}

/// Invariants of a block `f` that is unimodular at 2.
fn unimodular_dyadic_block(scale: u32, f: &IntMatrix) -> Result<DyadicBlock> {
    let det = arith::residue(&f.determinant()?, 8);
    if det % 2 == 0 {
        return Err(GenusError::DegenerateBlock);
    }
    let (parity, oddity) = match is_even_matrix(f) {
        None => (Parity::Even, 0),
        Some(_) => (Parity::Odd, trace_diag_mod_8(f)?),
    };
    trace!(scale, rank = f.nrows(), det, ?parity, oddity, "dyadic block");
    DyadicBlock::new(scale, f.nrows(), det as i8, parity, oddity)
}

/// Index of the first odd diagonal entry, or `None` if the matrix is even.
///
/// ```
/// use genus_symbol::{jordan::is_even_matrix, IntMatrix};
///
/// assert_eq!(is_even_matrix(&IntMatrix::from_rows(&[[2, 1], [1, 2]]).unwrap()), None);
/// assert_eq!(is_even_matrix(&IntMatrix::from_rows(&[[2, 1], [1, 3]]).unwrap()), Some(1));
/// ```
pub fn is_even_matrix(a: &IntMatrix) -> Option<usize> {
    (0..a.nrows().min(a.ncols())).find(|&i| a.get(i, i).is_odd())
}

/// Splits an odd unimodular `a` as `[u] ⊕ B` with `B` odd, returning `(u, B)`.
///
/// Works over `Z` with the congruences of a diagonalization modulo 8, so
/// only `u mod 8` and `B mod 8` carry meaning. A `1×1` input returns its
/// entry and the empty matrix.
///
/// # Errors
/// [`GenusError::NoOddSplitting`] when `a` is even, or when every choice of
/// odd vector leaves an even complement.
///
/// ```
/// use genus_symbol::{jordan::split_odd, IntMatrix};
/// use num_bigint::BigInt;
///
/// let a = IntMatrix::from_rows(&[[1, 2], [2, 3]]).unwrap();
/// let (u, b) = split_odd(&a).unwrap();
/// assert_eq!(u, BigInt::from(1));
/// assert_eq!(b, IntMatrix::from_rows(&[[-1]]).unwrap());
/// ```
pub fn split_odd(a: &IntMatrix) -> Result<(BigInt, IntMatrix)> {
    a.require_square()?;
    let n = a.nrows();
    let mut i = is_even_matrix(a).ok_or(GenusError::NoOddSplitting)?;
    let u = a.get(i, i).clone();
    if n == 1 {
        return Ok((u, IntMatrix::zeros(0, 0)));
    }
    let b = complement_of_odd_vector(a, i, &u)?;
    if is_even_matrix(&b).is_some() {
        return Ok((u, b));
    }

    // The complement of e_i is even: move to another odd vector.
    let mut t = IntMatrix::identity(n);
    if i == 0 {
        t.set(1, 0, BigInt::one() - a.get(1, 0) * &u);
        i = 1;
    } else {
        t.set(0, i, BigInt::one() - a.get(0, i) * &u);
        i = 0;
    }
    let a = a.congruence(&t)?;
    let u = a.get(i, i).clone();
    let b = complement_of_odd_vector(&a, i, &u)?;
    if is_even_matrix(&b).is_none() {
        return Err(GenusError::NoOddSplitting);
    }
    Ok((u, b))
}

/// Gram matrix of the complement of `e_i`, using `u⁻¹ ≡ u (mod 8)`.
fn complement_of_odd_vector(a: &IntMatrix, i: usize, u: &BigInt) -> Result<IntMatrix> {
    let n = a.nrows();
    let mut c = IntMatrix::zeros(n - 1, n);
    for j in 0..n - 1 {
        let src = if j < i { j } else { j + 1 };
        c.set(j, src, BigInt::one());
        c.set(j, i, -(a.get(src, i) * u));
    }
    a.congruence(&c)
}

/// Trace of a diagonalization of an odd unimodular `a` modulo 8.
///
/// ```
/// use genus_symbol::{jordan::trace_diag_mod_8, IntMatrix};
///
/// let a = IntMatrix::from_rows(&[[1, 2], [2, 5]]).unwrap();
/// assert_eq!(trace_diag_mod_8(&a).unwrap(), 2);
/// ```
pub fn trace_diag_mod_8(a: &IntMatrix) -> Result<u8> {
    let eight = BigInt::from(8);
    let mut a = a.mod_floor(&eight);
    let mut trace = BigInt::zero();
    while a.nrows() > 0 {
        let (u, b) = split_odd(&a)?;
        trace += u;
        a = b.mod_floor(&eight);
    }
    Ok(arith::residue(&trace, 8) as u8)
}

/// Valuation bound used when none is supplied: `v_p(det a)`.
pub(crate) fn det_valuation(a: &IntMatrix, p: u64) -> Result<u32> {
    arith::valuation(&a.determinant()?, p).ok_or(GenusError::Singular)
}

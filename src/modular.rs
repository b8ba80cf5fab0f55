//! Linear algebra over `F_p` and `Z/p^k`.
//!
//! Jordan splitting needs three things from a matrix reduced modulo a prime:
//! an echelonized basis of its left kernel, a complement to that basis made of
//! standard unit vectors, and the inverse of a unimodular block lifted to
//! `Z/p^k`.

use crate::arith;
use crate::error::{GenusError, Result};
use crate::matrix::IntMatrix;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};

/// Reduced row echelon form over `F_p`.
///
/// Returns the nonzero rows and their pivot columns.
pub fn echelonize_mod_p(mut rows: Vec<Vec<u64>>, ncols: usize, p: u64) -> (Vec<Vec<u64>>, Vec<usize>) {
    let mut pivots = Vec::new();
    let mut r = 0;
    for c in 0..ncols {
        let Some(pr) = (r..rows.len()).find(|&i| rows[i][c] % p != 0) else {
            continue;
        };
        rows.swap(r, pr);
        let inv = arith::pow_mod(rows[r][c], p - 2, p);
        for x in rows[r].iter_mut() {
            *x = mul_mod(*x, inv, p);
        }
        for i in 0..rows.len() {
            if i == r {
                continue;
            }
            let factor = rows[i][c] % p;
            if factor == 0 {
                continue;
            }
            for j in 0..ncols {
                let sub = mul_mod(factor, rows[r][j], p);
                rows[i][j] = (rows[i][j] + p - sub) % p;
            }
        }
        pivots.push(c);
        r += 1;
        if r == rows.len() {
            break;
        }
    }
    rows.truncate(r);
    (rows, pivots)
}

fn mul_mod(a: u64, b: u64, p: u64) -> u64 {
    ((a as u128 * b as u128) % p as u128) as u64
}

/// Residues of the entries of `a` modulo `p`, row by row.
pub fn reduce_mod_p(a: &IntMatrix, p: u64) -> Vec<Vec<u64>> {
    (0..a.nrows())
        .map(|i| a.row(i).iter().map(|x| arith::residue(x, p)).collect())
        .collect()
}

/// Echelonized basis of the left kernel `{x : x·A ≡ 0 (mod p)}`.
///
/// Rows of the result are the basis vectors with entries in `[0, p)`.
pub fn kernel_mod_p(a: &IntMatrix, p: u64) -> IntMatrix {
    let n = a.nrows();
    // Left kernel of A is the right kernel of Aᵀ.
    let (rref, pivots) = echelonize_mod_p(reduce_mod_p(&a.transpose(), p), n, p);
    let free: Vec<usize> = (0..n).filter(|c| !pivots.contains(c)).collect();
    let raw: Vec<Vec<u64>> = free
        .iter()
        .map(|&f| {
            let mut v = vec![0u64; n];
            v[f] = 1;
            for (row, &pc) in rref.iter().zip(&pivots) {
                v[pc] = (p - row[f] % p) % p;
            }
            v
        })
        .collect();
    let (basis, _) = echelonize_mod_p(raw, n, p);
    to_int_matrix(&basis, n)
}

/// Unit vectors spanning a complement of the row space of an echelonized
/// basis `b`: one `e_j` for every column that carries no leading entry.
pub fn basis_complement(b: &IntMatrix) -> IntMatrix {
    let n = b.ncols();
    let leading: Vec<usize> = (0..b.nrows())
        .filter_map(|i| (0..n).find(|&j| !b.get(i, j).is_zero()))
        .collect();
    let free: Vec<usize> = (0..n).filter(|j| !leading.contains(j)).collect();
    let mut c = IntMatrix::zeros(free.len(), n);
    for (row, &j) in free.iter().enumerate() {
        c.set(row, j, BigInt::one());
    }
    c
}

fn to_int_matrix(rows: &[Vec<u64>], ncols: usize) -> IntMatrix {
    let mut m = IntMatrix::zeros(rows.len(), ncols);
    for (i, row) in rows.iter().enumerate() {
        for (j, &x) in row.iter().enumerate() {
            m.set(i, j, BigInt::from(x));
        }
    }
    m
}

/// Inverse of a matrix that is invertible modulo `p`, lifted to `Z/modulus`
/// where `modulus` is a power of `p`. Entries land in `[0, modulus)`.
pub fn inverse_mod_prime_power(f: &IntMatrix, p: u64, modulus: &BigInt) -> Result<IntMatrix> {
    f.require_square()?;
    let n = f.nrows();
    let mut a: Vec<Vec<BigInt>> = (0..n)
        .map(|i| f.row(i).iter().map(|x| x.mod_floor(modulus)).collect())
        .collect();
    let mut inv: Vec<Vec<BigInt>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| if i == j { BigInt::one() } else { BigInt::zero() })
                .collect()
        })
        .collect();
    for c in 0..n {
        let pr = (c..n)
            .find(|&i| arith::residue(&a[i][c], p) != 0)
            .ok_or(GenusError::DegenerateBlock)?;
        a.swap(c, pr);
        inv.swap(c, pr);
        let u = arith::mod_inverse(&a[c][c], modulus).ok_or(GenusError::DegenerateBlock)?;
        for j in 0..n {
            a[c][j] = (&a[c][j] * &u).mod_floor(modulus);
            inv[c][j] = (&inv[c][j] * &u).mod_floor(modulus);
        }
        for i in 0..n {
            if i == c || a[i][c].is_zero() {
                continue;
            }
            let factor = a[i][c].clone();
            for j in 0..n {
                a[i][j] = (&a[i][j] - &factor * &a[c][j]).mod_floor(modulus);
                inv[i][j] = (&inv[i][j] - &factor * &inv[c][j]).mod_floor(modulus);
            }
        }
    }
    IntMatrix::from_big_rows(inv)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: &[&[i64]]) -> IntMatrix {
        IntMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn kernel_of_all_ones() {
        // Over F_3 the kernel of [[1,1],[1,1]] is spanned by (1, -1) = (1, 2).
        let k = kernel_mod_p(&m(&[&[1, 1], &[1, 1]]), 3);
        assert_eq!(k, m(&[&[1, 2]]));
        assert_eq!(basis_complement(&k), m(&[&[0, 1]]));
    }

    #[test]
    fn kernel_of_diagonal_mod_two() {
        let k = kernel_mod_p(&IntMatrix::diagonal(&[1, 2, 3, 4]), 2);
        assert_eq!(k, m(&[&[0, 1, 0, 0], &[0, 0, 0, 1]]));
        assert_eq!(
            basis_complement(&k),
            m(&[&[1, 0, 0, 0], &[0, 0, 1, 0]])
        );
    }

    #[test]
    fn kernel_trivial_when_unimodular() {
        let k = kernel_mod_p(&m(&[&[2, 1], &[1, 2]]), 2);
        assert_eq!(k.nrows(), 0);
        assert_eq!(basis_complement(&k), IntMatrix::identity(2));
    }

    #[test]
    fn inverse_lifts_to_prime_power() {
        let f = IntMatrix::diagonal(&[1, 3]);
        let inv = inverse_mod_prime_power(&f, 2, &BigInt::from(32)).unwrap();
        assert_eq!(inv, IntMatrix::diagonal(&[1, 11]));

        let g = m(&[&[2, 1], &[1, 2]]);
        let modulus = BigInt::from(8);
        let ginv = inverse_mod_prime_power(&g, 2, &modulus).unwrap();
        let prod = g.mul(&ginv).unwrap().mod_floor(&modulus);
        assert_eq!(prod, IntMatrix::identity(2));
    }

    #[test]
    fn inverse_rejects_degenerate() {
        let f = m(&[&[2, 0], &[0, 1]]);
        assert_eq!(
            inverse_mod_prime_power(&f, 2, &BigInt::from(8)),
            Err(GenusError::DegenerateBlock)
        );
    }
}

//! Dense integer matrices with exact arithmetic.
//!
//! Entries are arbitrary-precision integers so that Jordan splitting never
//! overflows, however large the intermediate correction terms become.
//! Storage is row-major.

use crate::arith;
use crate::error::{GenusError, Result};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dense `rows × cols` matrix over the integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntMatrix {
    rows: usize,
    cols: usize,
    data: Vec<BigInt>,
}

impl IntMatrix {
    /// Creates the zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![BigInt::zero(); rows * cols],
        }
    }

    /// Creates the `n × n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = BigInt::one();
        }
        m
    }

    /// Builds a matrix from machine-integer rows.
    ///
    /// All rows must have the same length.
    pub fn from_rows<R: AsRef<[i64]>>(rows: &[R]) -> Result<Self> {
        let big: Vec<Vec<BigInt>> = rows
            .iter()
            .map(|r| r.as_ref().iter().map(|&x| BigInt::from(x)).collect())
            .collect();
        Self::from_big_rows(big)
    }

    /// Builds a matrix from big-integer rows.
    pub fn from_big_rows(rows: Vec<Vec<BigInt>>) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(nrows * ncols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != ncols {
                return Err(GenusError::DimensionMismatch(format!(
                    "row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    ncols
                )));
            }
            data.extend(row);
        }
        Ok(Self {
            rows: nrows,
            cols: ncols,
            data,
        })
    }

    /// Diagonal matrix with the given entries.
    pub fn diagonal(entries: &[i64]) -> Self {
        let big: Vec<BigInt> = entries.iter().map(|&x| BigInt::from(x)).collect();
        Self::diagonal_big(&big)
    }

    /// Diagonal matrix with big-integer entries.
    pub fn diagonal_big(entries: &[BigInt]) -> Self {
        let n = entries.len();
        let mut m = Self::zeros(n, n);
        for (i, e) in entries.iter().enumerate() {
            m.data[i * n + i] = e.clone();
        }
        m
    }

    /// Block-diagonal matrix of square blocks.
    pub fn block_diagonal(blocks: &[IntMatrix]) -> Self {
        let n: usize = blocks.iter().map(|b| b.rows).sum();
        let m: usize = blocks.iter().map(|b| b.cols).sum();
        let mut out = Self::zeros(n, m);
        let (mut r0, mut c0) = (0, 0);
        for b in blocks {
            for i in 0..b.rows {
                for j in 0..b.cols {
                    out.data[(r0 + i) * m + c0 + j] = b.get(i, j).clone();
                }
            }
            r0 += b.rows;
            c0 += b.cols;
        }
        out
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Entry at `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> &BigInt {
        &self.data[i * self.cols + j]
    }

    /// Overwrites entry `(i, j)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: BigInt) {
        self.data[i * self.cols + j] = value;
    }

    /// Row-major view of all entries.
    pub fn entries(&self) -> &[BigInt] {
        &self.data
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> &[BigInt] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Returns an error unless the matrix is square.
    pub fn require_square(&self) -> Result<()> {
        if self.rows != self.cols {
            return Err(GenusError::NotSquare {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    /// Returns an error unless the matrix is square and symmetric.
    pub fn require_symmetric(&self) -> Result<()> {
        self.require_square()?;
        for i in 0..self.rows {
            for j in (i + 1)..self.cols {
                if self.get(i, j) != self.get(j, i) {
                    return Err(GenusError::NotSymmetric { row: i, col: j });
                }
            }
        }
        Ok(())
    }

    /// Transpose.
    pub fn transpose(&self) -> Self {
        let mut t = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t.data[j * self.rows + i] = self.get(i, j).clone();
            }
        }
        t
    }

    /// Matrix product `self · other`.
    pub fn mul(&self, other: &IntMatrix) -> Result<Self> {
        if self.cols != other.rows {
            return Err(GenusError::DimensionMismatch(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut out = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.get(i, k);
                if a.is_zero() {
                    continue;
                }
                for j in 0..other.cols {
                    let b = other.get(k, j);
                    if !b.is_zero() {
                        out.data[i * other.cols + j] += a * b;
                    }
                }
            }
        }
        Ok(out)
    }

    /// Difference `self - other`.
    pub fn sub(&self, other: &IntMatrix) -> Result<Self> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(GenusError::DimensionMismatch(format!(
                "cannot subtract {}x{} from {}x{}",
                other.rows, other.cols, self.rows, self.cols
            )));
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a - b)
            .collect();
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// Congruence transform `t · self · tᵀ`.
    pub fn congruence(&self, t: &IntMatrix) -> Result<Self> {
        t.mul(self)?.mul(&t.transpose())
    }

    /// Multiplies every entry by `k`.
    pub fn scaled(&self, k: &BigInt) -> Self {
        self.map(|x| x * k)
    }

    /// Applies `f` entrywise.
    pub fn map(&self, f: impl Fn(&BigInt) -> BigInt) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Reduces every entry into `[0, m)`.
    pub fn mod_floor(&self, m: &BigInt) -> Self {
        self.map(|x| x.mod_floor(m))
    }

    /// Minimal `p`-adic valuation over the nonzero entries.
    ///
    /// `None` for the zero matrix.
    pub fn min_valuation(&self, p: u64) -> Option<u32> {
        self.data.iter().filter_map(|c| arith::valuation(c, p)).min()
    }

    /// Whether every entry is zero.
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(Zero::is_zero)
    }

    /// Determinant by fraction-free (Bareiss) elimination.
    pub fn determinant(&self) -> Result<BigInt> {
        self.require_square()?;
        let n = self.rows;
        if n == 0 {
            return Ok(BigInt::one());
        }
        let mut m: Vec<Vec<BigInt>> = (0..n).map(|i| self.row(i).to_vec()).collect();
        let mut sign = BigInt::one();
        let mut prev = BigInt::one();
        for k in 0..n - 1 {
            if m[k][k].is_zero() {
                match ((k + 1)..n).find(|&i| !m[i][k].is_zero()) {
                    Some(i) => {
                        m.swap(i, k);
                        sign = -sign;
                    }
                    None => return Ok(BigInt::zero()),
                }
            }
            for i in (k + 1)..n {
                for j in (k + 1)..n {
                    let v = &m[i][j] * &m[k][k] - &m[i][k] * &m[k][j];
                    m[i][j] = v / &prev;
                }
            }
            prev = m[k][k].clone();
        }
        Ok(sign * &m[n - 1][n - 1])
    }
}

impl fmt::Display for IntMatrix {
    /// Renders rows as `[a b c]` with right-aligned columns.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths: Vec<usize> = (0..self.cols)
            .map(|j| {
                (0..self.rows)
                    .map(|i| self.get(i, j).to_string().len())
                    .max()
                    .unwrap_or(1)
            })
            .collect();
        for i in 0..self.rows {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[")?;
            for j in 0..self.cols {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{:>width$}", self.get(i, j).to_string(), width = widths[j])?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// Number of positive and negative eigenvalues of a symmetric matrix.
///
/// Diagonalizes by integral congruence (Sylvester's law of inertia), so no
/// rational arithmetic is needed. A zero eigenvalue is reported as
/// [`GenusError::Singular`].
///
/// # Citations
/// - Sylvester, "A demonstration of the theorem that every homogeneous quadratic polynomial is reducible..." (1852)
pub fn signature_pair_of_matrix(a: &IntMatrix) -> Result<(usize, usize)> {
    a.require_symmetric()?;
    let n = a.nrows();
    let mut m: Vec<Vec<BigInt>> = (0..n).map(|i| a.row(i).to_vec()).collect();
    let (mut pos, mut neg) = (0, 0);
    for k in 0..n {
        if m[k][k].is_zero() {
            let diagonal = ((k + 1)..n).find(|&i| !m[i][i].is_zero());
            let off_diagonal = (k..n)
                .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
                .find(|&(i, j)| !m[i][j].is_zero());
            match (diagonal, off_diagonal) {
                (Some(i), _) => swap_symmetric(&mut m, k, i),
                (None, Some((i, j))) => {
                    // e_i + e_j has norm 2·m[i][j] because both diagonals vanish.
                    add_symmetric(&mut m, i, j);
                    swap_symmetric(&mut m, k, i);
                }
                (None, None) => return Err(GenusError::Singular),
            }
        }
        let pivot = m[k][k].clone();
        if pivot.is_positive() {
            pos += 1;
        } else {
            neg += 1;
        }
        for i in (k + 1)..n {
            let b = m[i][k].clone();
            if b.is_zero() {
                continue;
            }
            // Row then column operation: e_i ↦ pivot·e_i − b·e_k.
            for j in 0..n {
                let v = &pivot * &m[i][j] - &b * &m[k][j];
                m[i][j] = v;
            }
            for j in 0..n {
                let v = &pivot * &m[j][i] - &b * &m[j][k];
                m[j][i] = v;
            }
        }
    }
    Ok((pos, neg))
}

fn swap_symmetric(m: &mut [Vec<BigInt>], a: usize, b: usize) {
    if a == b {
        return;
    }
    m.swap(a, b);
    for row in m.iter_mut() {
        row.swap(a, b);
    }
}

/// Replaces basis vector `e_i` by `e_i + e_j`.
fn add_symmetric(m: &mut [Vec<BigInt>], i: usize, j: usize) {
    let n = m.len();
    for c in 0..n {
        let v = &m[i][c] + &m[j][c];
        m[i][c] = v;
    }
    for r in 0..n {
        let v = &m[r][i] + &m[r][j];
        m[r][i] = v;
    }
}

//! Global genus symbols.
//!
//! The genus of a nondegenerate integral form is its signature together
//! with its local symbols at the primes dividing `2·det`. Not every
//! collection of local symbols comes from a global form: the product
//! formula for the Hilbert symbol couples them, which
//! [`is_global_genus`] checks through the oddity formula.
//!
//! # Citations
//! - Conway & Sloane, "Sphere Packings, Lattices and Groups", 3rd ed. (1999), Ch. 15 §7.7 – oddity formula
//! - Cassels, "Rational Quadratic Forms" (1978), Ch. 9

use crate::arith;
use crate::config::GenusConfig;
use crate::error::{GenusError, Result};
use crate::fingerprint::{genus_fingerprint, HashValue};
use crate::jordan::p_adic_symbol_with;
use crate::local::LocalGenusSymbol;
use crate::matrix::{signature_pair_of_matrix, IntMatrix};
use crate::symbol::{DyadicBlock, JordanBlocks};
use num_bigint::BigInt;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Genus of a nondegenerate integral symmetric matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "GenusRecord")]
pub struct Genus {
    representative: IntMatrix,
    signature: (usize, usize),
    local_symbols: Vec<LocalGenusSymbol>,
}

/// Wire form of a [`Genus`], checked by [`Genus::from_parts`] on decode.
#[derive(Deserialize)]
struct GenusRecord {
    representative: IntMatrix,
    signature: (usize, usize),
    local_symbols: Vec<LocalGenusSymbol>,
}

impl TryFrom<GenusRecord> for Genus {
    type Error = GenusError;

    fn try_from(record: GenusRecord) -> Result<Self> {
        Self::from_parts(record.representative, record.signature, record.local_symbols)
    }
}

impl Genus {
    /// Genus of the form with Gram matrix `a`.
    ///
    /// ```
    /// use genus_symbol::{Genus, IntMatrix};
    ///
    /// let a = IntMatrix::from_rows(&[[2, -1], [-1, 2]]).unwrap();
    /// let g = Genus::new(&a).unwrap();
    /// assert_eq!(
    ///     g.to_string(),
    ///     "Genus of\n[ 2 -1]\n[-1  2]\nGenus symbol at 2:    1^-2\nGenus symbol at 3:     1^-1 3^-1"
    /// );
    /// ```
    pub fn new(a: &IntMatrix) -> Result<Self> {
        Self::with_config(a, &GenusConfig::default())
    }

    /// [`Genus::new`] with an explicit configuration.
    ///
    /// # Errors
    /// Shape errors for a non-symmetric `a`, [`GenusError::Singular`] for
    /// `det a = 0`, and [`GenusError::FactorTooLarge`] when `2·det a` has a
    /// prime factor beyond trial division.
    pub fn with_config(a: &IntMatrix, config: &GenusConfig) -> Result<Self> {
        config.validate()?;
        a.require_symmetric()?;
        let det = a.determinant()?;
        if det.is_zero() {
            return Err(GenusError::Singular);
        }
        let twice = det * 2;
        let primes = arith::prime_factors(&twice)?;
        let signature = signature_pair_of_matrix(a)?;
        debug!(rank = a.nrows(), ?signature, ?primes, "genus");
        let local_symbols = primes
            .iter()
            .map(|&p| {
                let val = arith::valuation(&twice, p).ok_or(GenusError::Singular)?;
                LocalGenusSymbol::new(p, p_adic_symbol_with(a, p, val, config)?)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            representative: a.clone(),
            signature,
            local_symbols,
        })
    }

    /// Assembles a genus from a representative, a signature and local symbols.
    ///
    /// Nothing ties the parts together; use [`is_global_genus`] to check
    /// that they are consistent.
    pub fn from_parts(
        representative: IntMatrix,
        signature: (usize, usize),
        mut local_symbols: Vec<LocalGenusSymbol>,
    ) -> Result<Self> {
        representative.require_symmetric()?;
        local_symbols.sort_by_key(LocalGenusSymbol::prime);
        if let Some(w) = local_symbols.windows(2).find(|w| w[0].prime() == w[1].prime()) {
            return Err(GenusError::DuplicatePrime(w[0].prime()));
        }
        Ok(Self {
            representative,
            signature,
            local_symbols,
        })
    }

    /// The Gram matrix the genus was computed from.
    pub fn representative(&self) -> &IntMatrix {
        &self.representative
    }

    /// Numbers of positive and negative eigenvalues.
    pub fn signature_pair(&self) -> (usize, usize) {
        self.signature
    }

    /// Local symbols in increasing prime order.
    pub fn local_symbols(&self) -> &[LocalGenusSymbol] {
        &self.local_symbols
    }

    /// The local symbol at `p`, if `p` divides `2·det`.
    pub fn local_symbol(&self, p: u64) -> Option<&LocalGenusSymbol> {
        self.local_symbols.iter().find(|s| s.prime() == p)
    }

    /// Dimension of the form.
    pub fn dimension(&self) -> usize {
        self.signature.0 + self.signature.1
    }

    /// Determinant `(-1)^s ∏ p^(Σ m·n)` over the local symbols.
    ///
    /// ```
    /// use genus_symbol::{Genus, IntMatrix};
    /// use num_bigint::BigInt;
    ///
    /// let g = Genus::new(&IntMatrix::diagonal(&[2, -4, 6, 8])).unwrap();
    /// assert_eq!(g.determinant(), BigInt::from(-384));
    /// ```
    pub fn determinant(&self) -> BigInt {
        let magnitude = self
            .local_symbols
            .iter()
            .fold(BigInt::one(), |acc, s| acc * s.determinant());
        if self.signature.1 % 2 == 1 {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Same signature and pairwise equivalent local symbols.
    pub fn equivalent(&self, other: &Self) -> bool {
        self.signature == other.signature
            && self.local_symbols.len() == other.local_symbols.len()
            && self
                .local_symbols
                .iter()
                .zip(&other.local_symbols)
                .all(|(a, b)| a.equivalent(b))
    }

    /// Fingerprint of the signature and the canonical local symbols.
    pub fn fingerprint(&self) -> HashValue {
        let locals: Vec<HashValue> = self
            .local_symbols
            .iter()
            .map(LocalGenusSymbol::fingerprint)
            .collect();
        genus_fingerprint(self.signature, &locals)
    }
}

impl PartialEq for Genus {
    fn eq(&self, other: &Self) -> bool {
        self.equivalent(other)
    }
}

impl Eq for Genus {}

impl fmt::Display for Genus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Genus of\n{}", self.representative)?;
        for s in &self.local_symbols {
            write!(f, "\n{s}")?;
        }
        Ok(())
    }
}

/// Whether the local symbols and signature of `genus` are those of a
/// global form.
///
/// Checks the existence conditions of the 2-adic symbol, the determinant
/// compatibility at every prime, and the oddity formula
/// `signature − Σ p-excesses + oddity ≡ 0 (mod 8)`.
///
/// ```
/// use genus_symbol::{is_global_genus, Genus, IntMatrix};
///
/// let a = IntMatrix::from_rows(&[[1, 1], [1, 2]]).unwrap();
/// assert!(is_global_genus(&Genus::new(&a).unwrap()));
/// ```
pub fn is_global_genus(genus: &Genus) -> bool {
    let det = genus.determinant();
    let (r, s) = genus.signature_pair();
    let mut oddity = r as i64 - s as i64;
    for local in genus.local_symbols() {
        let p = local.prime();
        let a = &det / arith::pow(p, local.determinant_exponent());
        let excess = i64::from(local.excess());
        match local.blocks() {
            JordanBlocks::Dyadic(blocks) => {
                if !local.is_realizable() {
                    debug!(prime = p, "2-adic symbol is not realizable");
                    return false;
                }
                let sign: i8 = blocks.iter().map(DyadicBlock::det_sign).product();
                if arith::kronecker(&a, 2) != sign {
                    debug!(prime = p, "determinant class mismatch");
                    return false;
                }
                oddity -= excess;
            }
            JordanBlocks::Odd(blocks) => {
                let sign: i8 = blocks.iter().map(|b| b.det).product();
                if arith::kronecker(&a, p) != sign {
                    debug!(prime = p, "determinant class mismatch");
                    return false;
                }
                oddity += excess;
            }
        }
    }
    if oddity.rem_euclid(8) != 0 {
        debug!(oddity, "oddity formula fails");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: &[&[i64]]) -> IntMatrix {
        IntMatrix::from_rows(rows).unwrap()
    }

    fn d4() -> IntMatrix {
        m(&[
            &[2, 0, 0, -1],
            &[0, 2, 0, -1],
            &[0, 0, 2, -1],
            &[-1, -1, -1, 2],
        ])
    }

    #[test]
    fn display_of_hessian_genus() {
        let g = Genus::new(&IntMatrix::diagonal(&[2, 4, 6, 8])).unwrap();
        assert_eq!(
            g.to_string(),
            "Genus of\n[2 0 0 0]\n[0 4 0 0]\n[0 0 6 0]\n[0 0 0 8]\n\
             Genus symbol at 2:    [2^-2 4^1 8^1]_6\n\
             Genus symbol at 3:     1^3 3^-1"
        );
    }

    #[test]
    fn accessors() {
        let a = IntMatrix::diagonal(&[1, -2, 3, 4, 8, -11]);
        let g = Genus::new(&a).unwrap();
        assert_eq!(g.signature_pair(), (4, 2));
        assert_eq!(g.dimension(), 6);
        let primes: Vec<u64> = g.local_symbols().iter().map(LocalGenusSymbol::prime).collect();
        assert_eq!(primes, vec![2, 3, 11]);
        assert!(g.local_symbol(11).is_some());
        assert!(g.local_symbol(5).is_none());
        assert_eq!(g.representative(), &a);
        assert_eq!(g.determinant(), a.determinant().unwrap());
    }

    #[test]
    fn global_examples() {
        assert!(is_global_genus(&Genus::new(&m(&[&[1, 1], &[1, 2]])).unwrap()));
        assert!(is_global_genus(&Genus::new(&d4()).unwrap()));
        assert!(is_global_genus(&Genus::new(&IntMatrix::diagonal(&[2, 4, 6, 8])).unwrap()));
        assert!(is_global_genus(&Genus::new(&IntMatrix::diagonal(&[1, -2, 3, 4, 8, -11])).unwrap()));
    }

    #[test]
    fn d4_local_symbol() {
        let g = Genus::new(&d4()).unwrap();
        assert_eq!(g.local_symbols().len(), 1);
        assert_eq!(
            g.local_symbols()[0].to_string(),
            "Genus symbol at 2:    1^-2 :2^-2"
        );
    }

    /// Replacing the 2-adic symbol of diag(2,2,2,2) by an impossible one.
    #[test]
    fn tampered_symbol_is_not_global() {
        let g = Genus::new(&IntMatrix::diagonal(&[2, 2, 2, 2])).unwrap();
        assert!(is_global_genus(&g));
        let bad = LocalGenusSymbol::from_tuples(2, &[[0, 2, 3, 0, 0], [1, 2, 5, 1, 0]]).unwrap();
        let tampered =
            Genus::from_parts(g.representative().clone(), g.signature_pair(), vec![bad]).unwrap();
        assert!(!is_global_genus(&tampered));
    }

    /// The signature enters the oddity formula.
    #[test]
    fn wrong_signature_is_not_global() {
        let g = Genus::new(&m(&[&[1, 1], &[1, 2]])).unwrap();
        let flipped = Genus::from_parts(
            g.representative().clone(),
            (1, 1),
            g.local_symbols().to_vec(),
        )
        .unwrap();
        assert!(!is_global_genus(&flipped));
    }

    #[test]
    fn equivalence_and_fingerprints() {
        let a = Genus::new(&IntMatrix::diagonal(&[2, 4, 6, 8])).unwrap();
        let b = Genus::new(&IntMatrix::diagonal(&[2, 4, 6, 10])).unwrap();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());

        // [[2,1],[1,2]] and [[2,-1],[-1,2]] are the same lattice.
        let c = Genus::new(&m(&[&[2, 1], &[1, 2]])).unwrap();
        let d = Genus::new(&m(&[&[2, -1], &[-1, 2]])).unwrap();
        assert_eq!(c, d);
        assert_eq!(c.fingerprint(), d.fingerprint());
    }

    #[test]
    fn degenerate_and_malformed_rejected() {
        assert_eq!(
            Genus::new(&m(&[&[1, 1], &[1, 1]])).unwrap_err(),
            GenusError::Singular
        );
        assert!(matches!(
            Genus::new(&m(&[&[1, 2, 3], &[4, 5, 6]])),
            Err(GenusError::NotSquare { .. })
        ));
        assert!(matches!(
            Genus::with_config(
                &IntMatrix::diagonal(&[1, 2]),
                &GenusConfig::new().with_precision_margin(1)
            ),
            Err(GenusError::InvalidConfig(_))
        ));
    }

    /// Reassembling a genus from its parts keeps the global verdict,
    /// including with a different but equivalent 2-adic symbol.
    #[test]
    fn reassembled_genus_stays_global() {
        let g = Genus::new(&IntMatrix::diagonal(&[2, 4, 6, 8])).unwrap();
        let reversed: Vec<_> = g.local_symbols().iter().rev().cloned().collect();
        let rebuilt =
            Genus::from_parts(g.representative().clone(), g.signature_pair(), reversed).unwrap();
        assert_eq!(rebuilt, g);
        assert!(is_global_genus(&rebuilt));
        let g2 = g.local_symbol(2).unwrap();
        assert!(LocalGenusSymbol::new(2, g2.canonical_symbol()).is_err());

        // diag(1, 6) with the 2-adic symbol of diag(-1, -6)
        let h = Genus::new(&IntMatrix::diagonal(&[1, 6])).unwrap();
        let walked = LocalGenusSymbol::from_tuples(2, &[[0, 1, 7, 1, 7], [1, 1, 5, 1, 5]]).unwrap();
        let three = h.local_symbol(3).unwrap().clone();
        let swapped =
            Genus::from_parts(h.representative().clone(), (2, 0), vec![walked, three]).unwrap();
        assert_eq!(swapped, h);
        assert!(is_global_genus(&h));
        assert!(is_global_genus(&swapped));
    }

    #[test]
    fn cbor_decoding_goes_through_from_parts() {
        let g = Genus::new(&d4()).unwrap();
        let bytes = serde_cbor::to_vec(&g).unwrap();
        let decoded: Genus = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(decoded, g);
        assert_eq!(decoded.determinant(), g.determinant());

        #[derive(Serialize)]
        struct Wire {
            representative: IntMatrix,
            signature: (usize, usize),
            local_symbols: Vec<LocalGenusSymbol>,
        }
        let local = g.local_symbols()[0].clone();
        let twice = Wire {
            representative: g.representative().clone(),
            signature: g.signature_pair(),
            local_symbols: vec![local.clone(), local],
        };
        let bytes = serde_cbor::to_vec(&twice).unwrap();
        assert!(serde_cbor::from_slice::<Genus>(&bytes).is_err());
    }

    #[test]
    fn duplicate_primes_rejected() {
        let g = Genus::new(&IntMatrix::diagonal(&[1, 2])).unwrap();
        let mut locals = g.local_symbols().to_vec();
        locals.push(locals[0].clone());
        assert_eq!(
            Genus::from_parts(g.representative().clone(), (2, 0), locals).unwrap_err(),
            GenusError::DuplicatePrime(2)
        );
    }

    mod property_based_tests {
        use super::*;
        use proptest::prelude::*;

        fn diagonal() -> impl Strategy<Value = Vec<i64>> {
            prop::collection::vec(prop_oneof![(1i64..60), (-60i64..0)], 1..5)
        }

        proptest! {
            /// Symbols read off real matrices satisfy the oddity formula.
            #[test]
            fn genus_of_matrix_is_global(d in diagonal()) {
                let g = Genus::new(&IntMatrix::diagonal(&d)).unwrap();
                prop_assert!(is_global_genus(&g));
            }

            #[test]
            fn determinant_matches_matrix(d in diagonal()) {
                let a = IntMatrix::diagonal(&d);
                let g = Genus::new(&a).unwrap();
                prop_assert_eq!(g.determinant(), a.determinant().unwrap());
            }

            /// Reordering the diagonal does not change the genus.
            #[test]
            fn genus_ignores_basis_order(mut d in diagonal()) {
                let a = Genus::new(&IntMatrix::diagonal(&d)).unwrap();
                d.reverse();
                let b = Genus::new(&IntMatrix::diagonal(&d)).unwrap();
                prop_assert_eq!(a.fingerprint(), b.fingerprint());
            }
        }
    }
}

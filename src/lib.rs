//! genus-symbol: Conway–Sloane genus symbols of integral quadratic forms.
//!
//! Two non-degenerate integral symmetric bilinear forms lie in the same
//! genus when they are equivalent over the reals and over every p-adic ring.
//! This crate computes that invariant from a Gram matrix:
//! - p-adic Jordan decompositions and their block records.
//! - Canonical 2-adic symbols (oddity fusion and sign walking), with trains and compartments.
//! - Existence checks for local symbols and for a whole genus (oddity formula).
//! - Reconstruction of representative Gram matrices from local symbols.
//!
//! # Mathematical Foundations
//!
//! Over `Z_p` a form splits as an orthogonal sum `⊕ p^m · A_m` with every
//! `A_m` unimodular. For odd `p` the blocks are classified by rank and the
//! Legendre symbol of their determinant. At `p = 2` each block additionally
//! carries a type (even or odd) and an oddity, and distinct records can
//! describe the same form; the canonical symbol picks one record per class.
//!
//! # References
//!
//! - Conway, J.H., Sloane, N.J.A. "Sphere Packings, Lattices and Groups", 3rd ed. (1999), Ch. 15
//! - Cassels, J.W.S. "Rational Quadratic Forms" (1978), Ch. 8
//! - Watson, G.L. "Integral Quadratic Forms" (1960)
//!
//! # Example
//!
//! ```
//! use genus_symbol::prelude::*;
//!
//! let a = IntMatrix::diagonal(&[2, 4, 6, 8]);
//! let genus = Genus::new(&a).unwrap();
//! assert_eq!(genus.signature_pair(), (4, 0));
//! assert!(is_global_genus(&genus));
//!
//! let g2 = genus.local_symbol(2).unwrap();
//! assert_eq!(g2.to_string(), "Genus symbol at 2:    [2^-2 4^1 8^1]_6");
//! ```

pub mod arith;
pub mod cache;
pub mod canonical;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod genus;
pub mod gram;
pub mod jordan;
pub mod local;
pub mod matrix;
pub mod modular;
pub mod symbol;

pub use cache::CanonicalCache;
pub use canonical::{
    canonical_2_adic_compartments, canonical_2_adic_reduction, canonical_2_adic_trains,
    is_2_adic_genus,
};
pub use config::GenusConfig;
pub use error::{GenusError, Result};
pub use fingerprint::{Canonicalizable, HashValue};
pub use genus::{is_global_genus, Genus};
pub use jordan::{p_adic_symbol, p_adic_symbol_with, two_adic_symbol};
pub use local::LocalGenusSymbol;
pub use matrix::{signature_pair_of_matrix, IntMatrix};
pub use symbol::{DyadicBlock, JordanBlocks, OddBlock, Parity};

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::cache::CanonicalCache;
    pub use crate::canonical::{
        canonical_2_adic_compartments, canonical_2_adic_reduction, canonical_2_adic_trains,
        is_2_adic_genus,
    };
    pub use crate::config::GenusConfig;
    pub use crate::error::{GenusError, Result};
    pub use crate::fingerprint::{Canonicalizable, HashValue};
    pub use crate::genus::{is_global_genus, Genus};
    pub use crate::gram::{gram_from_dyadic_block, gram_from_odd_block};
    pub use crate::jordan::{p_adic_symbol, p_adic_symbol_with, two_adic_symbol};
    pub use crate::local::LocalGenusSymbol;
    pub use crate::matrix::{signature_pair_of_matrix, IntMatrix};
    pub use crate::symbol::{DyadicBlock, JordanBlocks, OddBlock, Parity};
}

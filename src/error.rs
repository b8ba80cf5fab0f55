//! Error types for genus symbol computations.
//!
//! Errors fall into three families:
//! - input shape (malformed matrices, ill-shaped symbol records),
//! - mathematical preconditions (a singular form),
//! - internal consistency (a splitting that should exist does not, or a
//!   reconstructed Gram matrix re-extracts to a different symbol).
//!
//! Everything is deterministic, so none of these is ever retried.

use thiserror::Error;

/// Result type alias for genus symbol operations.
pub type Result<T> = std::result::Result<T, GenusError>;

/// Errors raised while extracting, validating or reconstructing genus symbols.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenusError {
    /// Matrix is not square.
    #[error("matrix is not square: {rows}x{cols}")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Matrix is not symmetric.
    #[error("matrix is not symmetric at ({row}, {col})")]
    NotSymmetric {
        /// Row of the first asymmetric entry.
        row: usize,
        /// Column of the first asymmetric entry.
        col: usize,
    },

    /// Operand shapes do not agree.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The form is degenerate (zero determinant).
    #[error("given matrix is not invertible")]
    Singular,

    /// The modulus is not a prime.
    #[error("{0} is not a prime")]
    NotPrime(u64),

    /// A symbol record has the wrong number of entries for its prime.
    #[error("symbol record {index} has {found} entries, expected {expected} for p = {prime}")]
    SymbolArity {
        /// Prime of the symbol being built.
        prime: u64,
        /// Index of the offending record.
        index: usize,
        /// Arity required by the prime (3 for odd p, 5 for p = 2).
        expected: usize,
        /// Arity found.
        found: usize,
    },

    /// Odd-prime blocks supplied for p = 2, or dyadic blocks for an odd prime.
    #[error("block shape does not match the prime {0}")]
    PrimeShapeMismatch(u64),

    /// Jordan block scales are not strictly increasing.
    #[error("Jordan blocks must have strictly increasing scale (block {0})")]
    UnorderedScales(usize),

    /// A Jordan block of rank zero.
    #[error("Jordan block {0} has rank zero")]
    EmptyBlock(usize),

    /// A block whose entries are out of range.
    #[error("invalid Jordan block: {0}")]
    InvalidBlock(String),

    /// Trial division left a cofactor that does not fit a machine prime.
    #[error("cannot factor {0}: remaining cofactor exceeds 64 bits")]
    FactorTooLarge(String),

    /// Two local symbols of one genus at the same prime.
    #[error("more than one local symbol at p = {0}")]
    DuplicatePrime(u64),

    /// Operation only defined for the prime 2.
    #[error("operation only makes sense for p = 2, got p = {0}")]
    NotDyadic(u64),

    /// Encoding or decoding of persisted data failed.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Rejected configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No odd splitting `[u] + B` with `B` odd exists.
    #[error("the matrix does not admit a non-even splitting")]
    NoOddSplitting,

    /// A unimodular block whose determinant vanishes modulo 8.
    #[error("unimodular block has determinant 0 mod 8")]
    DegenerateBlock,

    /// Re-extracting the symbol of a reconstructed Gram matrix disagreed.
    #[error("reconstructed Gram matrix has genus symbol {found}, expected {expected}")]
    ReconstructionMismatch {
        /// Canonical symbol that was requested.
        expected: String,
        /// Canonical symbol of the reconstructed matrix.
        found: String,
    },
}

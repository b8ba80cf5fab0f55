//! Tunable parameters of the genus engine.
//!
//! Jordan splitting lifts the inverse of a unimodular block modulo
//! `p^(val + precision_margin)`, where `val` bounds the valuation of the
//! largest elementary divisor. The correction term `Xᵀ U X` is quadratic in
//! the truncation error, and the 2-adic invariants are read modulo 8, so the
//! margin must be at least three digits.

use crate::error::{GenusError, Result};
use serde::{Deserialize, Serialize};

/// Smallest precision margin that keeps mod-8 invariants exact.
pub const MIN_PRECISION_MARGIN: u32 = 3;

/// Parameters for symbol extraction and reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenusConfig {
    /// Extra p-adic digits kept beyond the maximal elementary divisor.
    pub precision_margin: u32,
    /// Re-extract the symbol of every reconstructed Gram matrix and compare.
    pub verify_reconstruction: bool,
}

impl Default for GenusConfig {
    fn default() -> Self {
        Self {
            precision_margin: MIN_PRECISION_MARGIN,
            verify_reconstruction: true,
        }
    }
}

impl GenusConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the precision margin.
    pub fn with_precision_margin(mut self, margin: u32) -> Self {
        self.precision_margin = margin;
        self
    }

    /// Enables or disables verification of reconstructed Gram matrices.
    pub fn with_verify_reconstruction(mut self, verify: bool) -> Self {
        self.verify_reconstruction = verify;
        self
    }

    /// Checks that the configuration can produce correct symbols.
    pub fn validate(&self) -> Result<()> {
        if self.precision_margin < MIN_PRECISION_MARGIN {
            return Err(GenusError::InvalidConfig(format!(
                "precision_margin {} is below the minimum of {}",
                self.precision_margin, MIN_PRECISION_MARGIN
            )));
        }
        Ok(())
    }

    /// Decodes a configuration from CBOR bytes, then validates it.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let config: Self = serde_cbor::from_slice(bytes)
            .map_err(|e| GenusError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Encodes the configuration as CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        serde_cbor::to_vec(self).map_err(|e| GenusError::Serialization(e.to_string()))
    }
}

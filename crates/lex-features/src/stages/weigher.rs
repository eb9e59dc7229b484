//! Fixed per-feature weighting.

use crate::error::{FeatureError, Result};
use crate::stages::ColumnTransform;
use crate::utils::map_float_values;
use polars::prelude::*;

/// Multiplies every value by a constant weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weigher {
    weight: f64,
}

impl Weigher {
    /// # Errors
    /// Returns [`FeatureError::InvalidConfig`] for a non-finite weight.
    pub fn new(weight: f64) -> Result<Self> {
        if !weight.is_finite() {
            return Err(FeatureError::InvalidConfig(format!(
                "feature weight must be finite, got {weight}"
            )));
        }
        Ok(Self { weight })
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

impl ColumnTransform for Weigher {
    fn fit(&mut self, _column: &Series) -> Result<()> {
        Ok(())
    }

    fn transform(&self, column: &Series) -> Result<Series> {
        let weight = self.weight;
        map_float_values(column, |v| v.map(|x| x * weight))
    }
}

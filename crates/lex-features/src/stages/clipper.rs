//! Value clipping.

use crate::error::{FeatureError, Result};
use crate::stages::ColumnTransform;
use crate::utils::map_float_values;
use polars::prelude::*;

/// Clamps values into `[lower, upper]`; a missing bound leaves that side open.
///
/// Missing values (null, NaN) stay missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clipper {
    lower: Option<f64>,
    upper: Option<f64>,
}

impl Clipper {
    /// # Errors
    /// Returns [`FeatureError::InvalidConfig`] if `lower > upper` or a bound is NaN.
    pub fn new(lower: Option<f64>, upper: Option<f64>) -> Result<Self> {
        if lower.is_some_and(f64::is_nan) || upper.is_some_and(f64::is_nan) {
            return Err(FeatureError::InvalidConfig(
                "clip limits must not be NaN".to_string(),
            ));
        }
        if let (Some(lo), Some(hi)) = (lower, upper)
            && lo > hi
        {
            return Err(FeatureError::InvalidConfig(format!(
                "clip lower limit {lo} is above upper limit {hi}"
            )));
        }
        Ok(Self { lower, upper })
    }

    pub fn limits(&self) -> (Option<f64>, Option<f64>) {
        (self.lower, self.upper)
    }

    #[inline]
    fn clip(&self, x: f64) -> f64 {
        // comparisons with NaN are false, so NaN passes through
        match (self.lower, self.upper) {
            (Some(lo), _) if x < lo => lo,
            (_, Some(hi)) if x > hi => hi,
            _ => x,
        }
    }
}

impl ColumnTransform for Clipper {
    fn fit(&mut self, _column: &Series) -> Result<()> {
        Ok(())
    }

    fn transform(&self, column: &Series) -> Result<Series> {
        map_float_values(column, |v| v.map(|x| self.clip(x)))
    }
}

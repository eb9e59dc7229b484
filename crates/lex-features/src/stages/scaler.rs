//! Feature scaling.

use crate::config::ScalerKind;
use crate::error::{FeatureError, Result};
use crate::stages::ColumnTransform;
use crate::utils::{
    is_missing, map_float_values, mean, median, min_max, population_std, present_values, quantile,
    to_float_values,
};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

/// Parameters learned by [`Scaler::fit`]; transform computes
/// `(x - center) / scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScalerParams {
    pub center: f64,
    pub scale: f64,
}

impl ScalerParams {
    const UNIT: Self = Self {
        center: 0.0,
        scale: 1.0,
    };

    /// A zero (or non-finite) spread would divide by zero; use 1 instead.
    fn new(center: f64, scale: f64) -> Self {
        let scale = if scale == 0.0 || !scale.is_finite() {
            1.0
        } else {
            scale
        };
        Self { center, scale }
    }

    #[inline]
    fn apply(&self, x: f64) -> f64 {
        (x - self.center) / self.scale
    }
}

/// Min-max, standard or robust scaling.
///
/// | Kind | center | scale |
/// |---|---|---|
/// | `MinMax` | min | max - min |
/// | `Standard` | mean | population std |
/// | `Robust` | median | q75 - q25 |
#[derive(Debug, Clone, PartialEq)]
pub struct Scaler {
    kind: ScalerKind,
    params: Option<ScalerParams>,
}

impl Scaler {
    pub fn new(kind: ScalerKind) -> Self {
        Self { kind, params: None }
    }

    pub fn kind(&self) -> ScalerKind {
        self.kind
    }

    /// Learned parameters, `None` before `fit`.
    pub fn params(&self) -> Option<ScalerParams> {
        self.params
    }

    fn estimate(&self, present: &[f64]) -> Option<ScalerParams> {
        let params = match self.kind {
            ScalerKind::MinMax => {
                let (lo, hi) = min_max(present)?;
                ScalerParams::new(lo, hi - lo)
            }
            ScalerKind::Standard => ScalerParams::new(mean(present)?, population_std(present)?),
            ScalerKind::Robust => {
                let iqr = quantile(present, 0.75)? - quantile(present, 0.25)?;
                ScalerParams::new(median(present)?, iqr)
            }
            ScalerKind::None => ScalerParams::UNIT,
        };
        Some(params)
    }
}

impl ColumnTransform for Scaler {
    fn fit(&mut self, column: &Series) -> Result<()> {
        let values = to_float_values(column)?;
        let params = self.estimate(&present_values(&values)).unwrap_or_else(|| {
            warn!(
                "Column '{}' has no present values; scaler will leave it unchanged",
                column.name()
            );
            ScalerParams::UNIT
        });
        debug!(
            "Scaler for '{}' learned center={} scale={}",
            column.name(),
            params.center,
            params.scale
        );
        self.params = Some(params);
        Ok(())
    }

    fn transform(&self, column: &Series) -> Result<Series> {
        let params = self
            .params
            .ok_or_else(|| FeatureError::NotFitted("Scaler".to_string()))?;
        map_float_values(column, |v| {
            if is_missing(v) { v } else { v.map(|x| params.apply(x)) }
        })
    }

    fn is_stateful(&self) -> bool {
        true
    }

    fn is_fitted(&self) -> bool {
        self.params.is_some()
    }
}

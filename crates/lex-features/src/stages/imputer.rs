//! Missing-value imputation.

use crate::config::{FillValue, ImputationStrategy};
use crate::error::{FeatureError, Result};
use crate::stages::ColumnTransform;
use crate::utils::{
    fill_string_nulls, is_missing, is_numeric_dtype, map_float_values, present_values,
    to_float_values,
};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

/// Parameters learned by [`Imputer::fit`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImputerParams {
    /// `None` when there was nothing to learn from (all values missing) or
    /// the strategy is `none`; transform then passes the column through.
    pub fill: Option<FillValue>,
}

/// Fills null and NaN values with a statistic learned at fit time or a
/// configured constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Imputer {
    strategy: ImputationStrategy,
    params: Option<ImputerParams>,
}

impl Imputer {
    pub fn new(strategy: ImputationStrategy) -> Self {
        Self {
            strategy,
            params: None,
        }
    }

    pub fn strategy(&self) -> &ImputationStrategy {
        &self.strategy
    }

    /// Learned parameters, `None` before `fit`.
    pub fn params(&self) -> Option<&ImputerParams> {
        self.params.as_ref()
    }

    fn learn_statistic(&self, column: &Series) -> Result<Option<f64>> {
        let present = Series::new(
            column.name().clone(),
            present_values(&to_float_values(column)?),
        );
        let statistic = match self.strategy {
            ImputationStrategy::Mean => present.mean(),
            ImputationStrategy::Median => present.median(),
            _ => None,
        };
        if statistic.is_none() {
            warn!(
                "Column '{}' has no present values; imputation will leave it unchanged",
                column.name()
            );
        }
        Ok(statistic)
    }
}

impl ColumnTransform for Imputer {
    fn fit(&mut self, column: &Series) -> Result<()> {
        let fill = match &self.strategy {
            ImputationStrategy::Mean | ImputationStrategy::Median => {
                self.learn_statistic(column)?.map(FillValue::Number)
            }
            ImputationStrategy::Constant(value) => Some(value.clone()),
            ImputationStrategy::None => None,
        };
        debug!(
            "Imputer for '{}' learned fill {:?}",
            column.name(),
            fill.as_ref().map(ToString::to_string)
        );
        self.params = Some(ImputerParams { fill });
        Ok(())
    }

    fn transform(&self, column: &Series) -> Result<Series> {
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| FeatureError::NotFitted("Imputer".to_string()))?;

        match &params.fill {
            None => Ok(column.clone()),
            Some(fill) if column.dtype() == &DataType::String => {
                Ok(fill_string_nulls(column, &fill.to_string())?)
            }
            Some(_) if !is_numeric_dtype(column.dtype()) => Err(FeatureError::NonNumeric {
                column: column.name().to_string(),
                dtype: column.dtype().to_string(),
            }),
            Some(FillValue::Number(n)) => fill_numeric(column, *n),
            Some(FillValue::Text(text)) => {
                let n = text.trim().parse::<f64>().map_err(|_| {
                    FeatureError::InvalidConfig(format!(
                        "constant '{}' cannot fill numeric column '{}'",
                        text,
                        column.name()
                    ))
                })?;
                fill_numeric(column, n)
            }
        }
    }

    fn is_stateful(&self) -> bool {
        true
    }

    fn is_fitted(&self) -> bool {
        self.params.is_some()
    }
}

fn fill_numeric(column: &Series, fill: f64) -> Result<Series> {
    map_float_values(column, |v| if is_missing(v) { Some(fill) } else { v })
}

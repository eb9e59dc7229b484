//! Shared utilities for feature stages.
//!
//! This module contains the numeric coercion, missing-value and statistics
//! helpers used by several stages, plus column-name normalization.

use crate::error::{FeatureError, Result};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Coerce a numeric Series into Float64 values.
///
/// Returns [`FeatureError::NonNumeric`] for any other dtype, which stages
/// treat as a recoverable failure.
pub fn to_float_values(series: &Series) -> Result<Vec<Option<f64>>> {
    if !is_numeric_dtype(series.dtype()) {
        return Err(FeatureError::NonNumeric {
            column: series.name().to_string(),
            dtype: series.dtype().to_string(),
        });
    }
    let float_series = series.cast(&DataType::Float64)?;
    let f64_chunked = float_series.f64()?;
    Ok(f64_chunked.into_iter().collect())
}

/// Apply `f` to every value of a numeric Series, producing a Float64 Series
/// with the same name.
pub fn map_float_values<F>(series: &Series, f: F) -> Result<Series>
where
    F: Fn(Option<f64>) -> Option<f64>,
{
    let values: Vec<Option<f64>> = to_float_values(series)?.into_iter().map(f).collect();
    Ok(Series::new(series.name().clone(), values))
}

// =============================================================================
// Missing Values
// =============================================================================

/// A value is missing when it is null or NaN.
#[inline]
pub fn is_missing(value: Option<f64>) -> bool {
    value.is_none_or(f64::is_nan)
}

/// Collect the non-missing values of a column.
pub fn present_values(values: &[Option<f64>]) -> Vec<f64> {
    values
        .iter()
        .copied()
        .filter(|v| !is_missing(*v))
        .flatten()
        .collect()
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let str_chunked = series.str()?;
    let result_vec: Vec<Option<String>> = str_chunked
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value).to_string()))
        .collect();

    Ok(Series::new(series.name().clone(), result_vec))
}

// =============================================================================
// Statistics
// =============================================================================

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (`ddof = 0`).
pub fn population_std(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let variance = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Linearly interpolated quantile, `q` in `[0, 1]`.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Median of the values.
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Minimum and maximum of the values.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

// =============================================================================
// Column Names
// =============================================================================

static CAMEL_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("Invalid regex: camel word"));
static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("Invalid regex: camel boundary"));

/// Convert a raw column name to snake_case.
///
/// ```rust,ignore
/// assert_eq!(to_snake_case("Blood Pressure"), "blood_pressure");
/// assert_eq!(to_snake_case("NaToK"), "na_to_k");
/// ```
pub fn to_snake_case(name: &str) -> String {
    let spaced = name.trim().replace(' ', "_");
    let spaced = CAMEL_WORD.replace_all(&spaced, "${1}_${2}");
    let mut snake = CAMEL_BOUNDARY
        .replace_all(&spaced, "${1}_${2}")
        .to_lowercase();

    while snake.contains("__") {
        snake = snake.replace("__", "_");
    }
    snake
}

/// Column names of a DataFrame as owned strings, in order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

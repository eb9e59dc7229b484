//! Re-attaching column labels to unlabeled transform output.
//!
//! Column-wise transforms may return a bare numeric array or a list of
//! columns whose names are not trustworthy. [`ColumnTableAdapter`] puts the
//! input table's column names back, in input order, and refuses any output
//! whose shape differs from the input.

use crate::error::{FeatureError, Result};
use crate::utils::{column_names, to_float_values};
use polars::prelude::*;

/// Column-major array of optional floats with no column labels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumericMatrix {
    columns: Vec<Vec<Option<f64>>>,
}

impl NumericMatrix {
    pub fn new(columns: Vec<Vec<Option<f64>>>) -> Self {
        Self { columns }
    }

    /// Read every column of a table as Float64 values, dropping the labels.
    ///
    /// # Errors
    /// Returns [`FeatureError::NonNumeric`] if any column is not numeric.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let columns = df
            .get_columns()
            .iter()
            .map(|c| to_float_values(c.as_materialized_series()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { columns })
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Row count, taken from the first column.
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn column(&self, index: usize) -> Option<&[Option<f64>]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    pub fn into_columns(self) -> Vec<Vec<Option<f64>>> {
        self.columns
    }
}

/// Output of an [`ArrayTransform`].
#[derive(Debug, Clone)]
pub enum ArrayOutput {
    /// Bare numeric array.
    Numeric(NumericMatrix),
    /// Columns in input order; their names are ignored.
    Columns(Vec<Series>),
}

impl ArrayOutput {
    pub fn n_cols(&self) -> usize {
        match self {
            Self::Numeric(matrix) => matrix.n_cols(),
            Self::Columns(columns) => columns.len(),
        }
    }
}

/// A table transform whose output carries no reliable column labels.
pub trait ArrayTransform {
    /// # Errors
    /// Implementation specific.
    fn transform_array(&self, table: &DataFrame) -> Result<ArrayOutput>;
}

/// Adapter between [`ArrayTransform`]s and labeled tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnTableAdapter;

impl ColumnTableAdapter {
    /// Run `transform` on `table` and relabel its output with the table's
    /// column names.
    ///
    /// # Errors
    /// Propagates errors from `transform`, then as [`Self::relabel`].
    pub fn adapt<T: ArrayTransform + ?Sized>(
        table: &DataFrame,
        transform: &T,
    ) -> Result<DataFrame> {
        let output = transform.transform_array(table)?;
        Self::relabel(table, output)
    }

    /// Attach `table`'s column names, in order, to `output`.
    ///
    /// Returns a new table; `table` is not modified.
    ///
    /// # Errors
    /// - [`FeatureError::ShapeMismatch`] if the column counts differ
    /// - [`FeatureError::RowCountMismatch`] if an output column has a
    ///   different length than the table
    pub fn relabel(table: &DataFrame, output: ArrayOutput) -> Result<DataFrame> {
        let expected = table.width();
        let actual = output.n_cols();
        if expected != actual {
            return Err(FeatureError::ShapeMismatch { expected, actual });
        }

        let height = table.height();
        let names = column_names(table);
        let series: Vec<Series> = match output {
            ArrayOutput::Numeric(matrix) => names
                .iter()
                .zip(matrix.into_columns())
                .map(|(name, values)| Series::new(name.as_str().into(), values))
                .collect(),
            ArrayOutput::Columns(columns) => names
                .iter()
                .zip(columns)
                .map(|(name, column)| column.with_name(name.as_str().into()))
                .collect(),
        };

        if let Some(bad) = series.iter().find(|s| s.len() != height) {
            return Err(FeatureError::RowCountMismatch {
                column: bad.name().to_string(),
                expected: height,
                actual: bad.len(),
            });
        }

        Ok(DataFrame::new(series.into_iter().map(Column::from).collect())?)
    }
}

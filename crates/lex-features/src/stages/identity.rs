//! The no-op stage.

use crate::error::Result;
use crate::stages::ColumnTransform;
use polars::prelude::*;

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Identity;

impl ColumnTransform for Identity {
    fn fit(&mut self, _column: &Series) -> Result<()> {
        Ok(())
    }

    fn transform(&self, column: &Series) -> Result<Series> {
        Ok(column.clone())
    }
}

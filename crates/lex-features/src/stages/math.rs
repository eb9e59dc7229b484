//! Element-wise mathematical transformations.

use crate::config::MathKind;
use crate::error::Result;
use crate::stages::ColumnTransform;
use crate::utils::map_float_values;
use polars::prelude::*;

/// Applies a [`MathKind`] to every value. Domain errors follow IEEE rules
/// (`log(-1)` is NaN, `log(0)` is `-inf`); missing values stay missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathTransform {
    kind: MathKind,
}

impl MathTransform {
    pub fn new(kind: MathKind) -> Self {
        Self { kind }
    }

    /// Build from a transformation name; unknown names become identity.
    pub fn from_name(name: &str) -> Self {
        Self::new(MathKind::parse(name))
    }

    pub fn kind(&self) -> MathKind {
        self.kind
    }
}

impl ColumnTransform for MathTransform {
    fn fit(&mut self, _column: &Series) -> Result<()> {
        Ok(())
    }

    fn transform(&self, column: &Series) -> Result<Series> {
        let kind = self.kind;
        map_float_values(column, |v| v.map(|x| kind.apply(x)))
    }
}

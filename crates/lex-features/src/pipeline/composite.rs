//! One depth of the pipeline: a column-wise composite of per-feature stages.

use crate::adapter::{ArrayOutput, ArrayTransform, ColumnTableAdapter};
use crate::error::{FeatureError, Result};
use crate::stages::{ColumnTransform, Stage};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
struct ColumnStage {
    feature: String,
    stage: Stage,
    /// Set when the last fit hit a recoverable failure; the column is then
    /// passed through unchanged until the next fit.
    passthrough: bool,
}

/// Applies one [`Stage`] per feature column at a single depth.
///
/// Column identity is restored through [`ColumnTableAdapter`], so the output
/// always has the input table's column names and order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompositeTransform {
    depth: usize,
    entries: Vec<ColumnStage>,
    index: HashMap<String, usize>,
}

impl CompositeTransform {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }

    /// Register the stage for `feature`.
    ///
    /// # Errors
    /// Returns [`FeatureError::DuplicateFeature`] if the feature already has a
    /// stage at this depth.
    pub fn push(&mut self, feature: impl Into<String>, stage: Stage) -> Result<()> {
        let feature = feature.into();
        if self.index.contains_key(&feature) {
            return Err(FeatureError::DuplicateFeature(feature));
        }
        self.index.insert(feature.clone(), self.entries.len());
        self.entries.push(ColumnStage {
            feature,
            stage,
            passthrough: false,
        });
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Feature names in registration order.
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.feature.as_str())
    }

    pub fn stage(&self, feature: &str) -> Option<&Stage> {
        self.index.get(feature).map(|&i| &self.entries[i].stage)
    }

    /// Whether every stage at this depth can transform.
    pub fn is_fitted(&self) -> bool {
        self.entries
            .iter()
            .all(|e| e.passthrough || e.stage.is_fitted())
    }

    /// Fit every stage on its column of `table`.
    ///
    /// Previously learned parameters are overwritten. A non-numeric failure
    /// is logged and the column is marked pass-through.
    ///
    /// # Errors
    /// Returns [`FeatureError::ColumnNotFound`] if a planned feature is not in
    /// `table`, or any fatal stage error.
    pub fn fit(&mut self, table: &DataFrame) -> Result<()> {
        let depth = self.depth;
        for entry in &mut self.entries {
            let column = table
                .column(&entry.feature)
                .map_err(|_| FeatureError::ColumnNotFound(entry.feature.clone()))?;

            entry.passthrough = false;
            match entry.stage.fit(column.as_materialized_series()) {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    warn!(
                        "{} skipped for '{}' at depth {}: {}",
                        entry.stage.name(),
                        entry.feature,
                        depth,
                        e
                    );
                    entry.passthrough = true;
                }
                Err(e) => {
                    return Err(e.with_context(format!(
                        "Fitting {} for '{}' at depth {}",
                        entry.stage.name(),
                        entry.feature,
                        depth
                    )));
                }
            }
        }
        debug!("Fitted depth {} over {} features", depth, self.entries.len());
        Ok(())
    }

    /// Transform `table` with the fitted stages.
    ///
    /// # Errors
    /// See [`ArrayTransform::transform_array`] and [`ColumnTableAdapter::relabel`].
    pub fn transform(&self, table: &DataFrame) -> Result<DataFrame> {
        ColumnTableAdapter::adapt(table, self)
    }

    pub fn fit_transform(&mut self, table: &DataFrame) -> Result<DataFrame> {
        self.fit(table)?;
        self.transform(table)
    }

    fn transform_column(&self, column: &Series) -> Result<Series> {
        let name = column.name().as_str();
        let entry = self
            .index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| FeatureError::MissingStagePlan {
                column: name.to_string(),
                depth: self.depth,
            })?;

        if entry.passthrough {
            return Ok(column.clone());
        }
        match entry.stage.transform(column) {
            Ok(out) => Ok(out),
            Err(e) if e.is_recoverable() => {
                warn!(
                    "{} skipped for '{}' at depth {}: {}",
                    entry.stage.name(),
                    name,
                    self.depth,
                    e
                );
                Ok(column.clone())
            }
            Err(e) => Err(e.with_context(format!(
                "Applying {} to '{}' at depth {}",
                entry.stage.name(),
                name,
                self.depth
            ))),
        }
    }
}

impl ArrayTransform for CompositeTransform {
    /// Transform every column of `table` in table order.
    ///
    /// # Errors
    /// Returns [`FeatureError::MissingStagePlan`] for a column without a stage
    /// at this depth, or any fatal stage error.
    fn transform_array(&self, table: &DataFrame) -> Result<ArrayOutput> {
        let columns = table
            .get_columns()
            .iter()
            .map(|c| self.transform_column(c.as_materialized_series()))
            .collect::<Result<Vec<_>>>()?;
        Ok(ArrayOutput::Columns(columns))
    }
}

//! The fit/transform pipeline executor.

use crate::config::{CanonicalRecord, ConfigExpander, FeatureConfig, PreProcessorOptions};
use crate::error::{FeatureError, Result};
use crate::pipeline::planner::{PipelinePlanner, StagePlan};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Lifecycle of a [`PreProcessor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Unfitted,
    Fitted,
}

/// Chains the per-depth composite transforms built from a feature
/// configuration into a single fit/transform object.
///
/// # Example
///
/// ```rust,ignore
/// use lex_features::{FeatureConfig, PreProcessor, StageSpec, ScalerKind};
///
/// let configs =
///     vec![FeatureConfig::new("income").with_stage(StageSpec::Scaler(ScalerKind::MinMax))];
/// let mut pre = PreProcessor::new(configs)?;
///
/// pre.fit(&train)?;
/// let train_out = pre.transform(&train)?;
/// let test_out = pre.transform(&test)?;
/// ```
#[derive(Debug, Clone)]
pub struct PreProcessor {
    configs: Vec<FeatureConfig>,
    options: PreProcessorOptions,
    records: Vec<CanonicalRecord>,
    plan: StagePlan,
    state: PipelineState,
}

// Fitted pipelines are shared read-only across threads by callers.
static_assertions::assert_impl_all!(PreProcessor: Send, Sync);

impl PreProcessor {
    /// Build an unfitted pipeline with default options.
    ///
    /// # Errors
    /// Returns [`FeatureError::DuplicateFeature`] or
    /// [`FeatureError::InvalidConfig`] if the configuration cannot be planned.
    pub fn new(configs: Vec<FeatureConfig>) -> Result<Self> {
        Self::with_options(configs, PreProcessorOptions::default())
    }

    /// Build an unfitted pipeline.
    ///
    /// # Errors
    /// See [`Self::new`].
    pub fn with_options(configs: Vec<FeatureConfig>, options: PreProcessorOptions) -> Result<Self> {
        let records = ConfigExpander::new(options.stage_order).expand(&configs)?;
        let plan = PipelinePlanner::plan(&records)?;

        info!(
            "Built pipeline: {} active of {} configured features, {} depths",
            configs.iter().filter(|c| c.active).count(),
            configs.len(),
            plan.len()
        );

        Ok(Self {
            configs,
            options,
            records,
            plan,
            state: PipelineState::Unfitted,
        })
    }

    /// Fit every depth in order, each on the previous depth's output.
    ///
    /// Refitting overwrites all learned parameters. If fitting fails the
    /// pipeline is left unfitted.
    ///
    /// # Errors
    /// Returns [`FeatureError::ColumnNotFound`] if an active feature is
    /// missing from `table`, or any fatal stage error.
    pub fn fit(&mut self, table: &DataFrame) -> Result<&mut Self> {
        self.run_fit(table)?;
        Ok(self)
    }

    /// Replay the fitted depths on `table`.
    ///
    /// The output has the active feature columns in `table`'s column order.
    ///
    /// # Errors
    /// Returns [`FeatureError::NotFitted`] before a successful `fit`, and
    /// otherwise the same errors as `fit`.
    pub fn transform(&self, table: &DataFrame) -> Result<DataFrame> {
        if self.state != PipelineState::Fitted {
            return Err(FeatureError::NotFitted("PreProcessor".to_string()));
        }

        let mut current = self.select_features(table)?;
        for composite in self.plan.iter() {
            current = composite.transform(&current)?;
        }
        debug!("Transformed {} rows", current.height());
        Ok(current)
    }

    /// `fit` then `transform` on the same table.
    ///
    /// Returns the output of the last fitted depth, which equals
    /// `transform(table)` after `fit(table)`.
    pub fn fit_transform(&mut self, table: &DataFrame) -> Result<DataFrame> {
        self.run_fit(table)
    }

    fn run_fit(&mut self, table: &DataFrame) -> Result<DataFrame> {
        self.state = PipelineState::Unfitted;
        info!(
            "Fitting pipeline on {} rows over {} depths",
            table.height(),
            self.plan.len()
        );

        let mut current = self.select_features(table)?;
        for composite in self.plan.iter_mut() {
            current = composite.fit_transform(&current)?;
        }

        self.state = PipelineState::Fitted;
        info!("Pipeline fitted");
        Ok(current)
    }

    /// Keep the active feature columns, in table order, and cast declared
    /// numeric features to Float64.
    fn select_features(&self, table: &DataFrame) -> Result<DataFrame> {
        let active: HashSet<&str> = self
            .configs
            .iter()
            .filter(|c| c.active)
            .map(|c| c.name.as_str())
            .collect();

        let mut selected = Vec::with_capacity(active.len());
        for name in table.get_column_names() {
            if active.contains(name.as_str()) {
                selected.push(name.to_string());
            } else {
                debug!("Dropping column '{}' (inactive or not configured)", name);
            }
        }

        if selected.len() != active.len() {
            let present: HashSet<&str> = selected.iter().map(String::as_str).collect();
            if let Some(missing) = self
                .configs
                .iter()
                .find(|c| c.active && !present.contains(c.name.as_str()))
            {
                return Err(FeatureError::ColumnNotFound(missing.name.clone()));
            }
        }

        let mut df = table.select(selected)?;
        if self.options.cast_declared_numeric {
            self.cast_numeric_features(&mut df)?;
        }
        Ok(df)
    }

    fn cast_numeric_features(&self, df: &mut DataFrame) -> Result<()> {
        for config in self
            .configs
            .iter()
            .filter(|c| c.active && c.feature_type.is_numeric())
        {
            let cast = {
                let series = df.column(&config.name)?.as_materialized_series();
                if series.dtype() == &DataType::Float64 {
                    continue;
                }
                series.strict_cast(&DataType::Float64)
            };
            match cast {
                Ok(series) => {
                    df.replace(&config.name, series)?;
                }
                Err(e) => warn!(
                    "Column '{}' is declared {} but could not be cast to Float64: {}",
                    config.name,
                    config.feature_type.as_str(),
                    e
                ),
            }
        }
        Ok(())
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Active feature names in configuration order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.configs
            .iter()
            .filter(|c| c.active)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn depth_count(&self) -> usize {
        self.plan.len()
    }

    /// Canonical records, sorted by `(stage_depth, feature_order)`.
    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn plan(&self) -> &StagePlan {
        &self.plan
    }

    pub fn options(&self) -> &PreProcessorOptions {
        &self.options
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn is_fitted(&self) -> bool {
        self.state == PipelineState::Fitted
    }
}

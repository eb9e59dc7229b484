//! Declarative Feature Pipelines
//!
//! Per-column feature transformation pipelines over Polars DataFrames,
//! built from a declarative configuration.
//!
//! # Overview
//!
//! Each feature (column) declares an ordered list of stages:
//!
//! - **Imputation**: fill missing values with the mean, the median or a constant
//! - **Limits**: clip values into `[lower, upper]`
//! - **Transformation**: element-wise `log`, `log10`, `log1p`, `exp`, `square`, `sqrt`
//! - **Scaler**: `min_max`, `standard` or `robust` scaling
//! - **Weight**: multiply by a fixed weight
//!
//! The configuration is expanded into canonical (feature, depth, stage)
//! records ([`ConfigExpander`]), planned into one composite transform per
//! depth ([`PipelinePlanner`]) and chained by [`PreProcessor`]. Stateful
//! stages learn their parameters once in `fit` and reuse them verbatim in
//! every `transform`.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_features::{PreProcessor, config::load_feature_configs};
//! use polars::prelude::*;
//!
//! let configs = load_feature_configs("features.yaml")?;
//! let mut pipeline = PreProcessor::new(configs)?;
//!
//! let train_out = pipeline.fit_transform(&train)?;
//! let test_out = pipeline.transform(&test)?;
//! ```
//!
//! A config file is a list of features (or a map with a `features` list):
//!
//! ```yaml
//! - name: age
//!   imputation_strategy: mean
//!   limits: [0, 120]
//! - name: income
//!   transformation: log1p
//!   scaler: robust
//!   weight: 0.5
//! - name: customer_id
//!   active: false
//! ```
//!
//! # Stage Order
//!
//! By default each feature's stages run impute, clip, transform, scale,
//! weigh regardless of how they are written ([`StageOrder::Canonical`]).
//! [`StageOrder::Declared`] runs them in document order instead. Features
//! that have fewer stages than others get identity stages at the remaining
//! depths.
//!
//! # Failure Policy
//!
//! A numeric stage applied to a non-numeric column logs a warning and
//! passes that column through unchanged. Everything else (use before `fit`,
//! missing columns, shape changes, bad configuration) is a [`FeatureError`].

pub mod adapter;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod stages;
pub mod utils;

// Re-exports for convenient access
pub use adapter::{ArrayOutput, ArrayTransform, ColumnTableAdapter, NumericMatrix};
pub use config::{
    CanonicalRecord, ConfigExpander, FeatureConfig, FeatureType, FillValue, ImputationStrategy,
    MathKind, PreProcessorOptions, ScalerKind, StageKind, StageOrder, StageSpec,
    load_feature_configs,
};
pub use error::{FeatureError, Result as FeatureResult, ResultExt};
pub use pipeline::{CompositeTransform, PipelinePlanner, PipelineState, PreProcessor, StagePlan};
pub use stages::{
    Clipper, ColumnTransform, Identity, Imputer, ImputerParams, MathTransform, Scaler,
    ScalerParams, Stage, Weigher,
};

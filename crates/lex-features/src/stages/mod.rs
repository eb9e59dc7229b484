//! Per-column stage transformers.
//!
//! Every stage implements [`ColumnTransform`] over a single column. The
//! closed [`Stage`] enum is what pipelines store; [`Stage::from_spec`] is the
//! one place where a configured [`StageSpec`] turns into a transformer.
//!
//! | Stage | Stateful | Effect |
//! |---|---|---|
//! | [`Identity`] | no | returns the column unchanged |
//! | [`Imputer`] | yes | fills missing values (mean, median, constant) |
//! | [`Clipper`] | no | clamps values into `[lower, upper]` |
//! | [`MathTransform`] | no | element-wise log, exp, sqrt, ... |
//! | [`Scaler`] | yes | min-max, standard or robust scaling |
//! | [`Weigher`] | no | multiplies by a fixed weight |

mod clipper;
mod identity;
mod imputer;
mod math;
mod scaler;
mod weigher;

pub use clipper::Clipper;
pub use identity::Identity;
pub use imputer::{Imputer, ImputerParams};
pub use math::MathTransform;
pub use scaler::{Scaler, ScalerParams};
pub use weigher::Weigher;

use crate::config::{ImputationStrategy, MathKind, ScalerKind, StageSpec};
use crate::error::Result;
use polars::prelude::*;
use tracing::warn;

/// Fit/transform contract shared by all stages.
///
/// `transform` never re-estimates anything: stateful stages reuse exactly the
/// parameters learned by the last `fit`.
pub trait ColumnTransform {
    /// Learn parameters from a column. No-op for stateless stages.
    ///
    /// # Errors
    /// Returns [`crate::FeatureError::NonNumeric`] when a numeric stage gets a
    /// column it cannot read as numbers.
    fn fit(&mut self, column: &Series) -> Result<()>;

    /// Transform a column, returning a new column of the same length and name.
    ///
    /// # Errors
    /// Returns [`crate::FeatureError::NotFitted`] for a stateful stage that has
    /// not been fitted, and [`crate::FeatureError::NonNumeric`] as for `fit`.
    fn transform(&self, column: &Series) -> Result<Series>;

    /// `fit` followed by `transform` on the same column.
    fn fit_transform(&mut self, column: &Series) -> Result<Series> {
        self.fit(column)?;
        self.transform(column)
    }

    /// Whether `fit` learns anything.
    fn is_stateful(&self) -> bool {
        false
    }

    /// Whether `transform` can be called.
    fn is_fitted(&self) -> bool {
        true
    }
}

/// A configured stage transformer.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Identity(Identity),
    Imputer(Imputer),
    Clipper(Clipper),
    Math(MathTransform),
    Scaler(Scaler),
    Weigher(Weigher),
}

impl Stage {
    /// Build the transformer for a stage specification.
    ///
    /// Specifications that request nothing (imputation `none`, scaler `none`,
    /// transformation `identity`) and unrecognized stage keys all map to
    /// [`Stage::Identity`]. Unrecognized keys are logged.
    ///
    /// # Errors
    /// Returns [`crate::FeatureError::InvalidConfig`] for limits with
    /// `lower > upper` or a non-finite weight.
    pub fn from_spec(spec: &StageSpec) -> Result<Self> {
        let stage = match spec {
            StageSpec::Imputation(ImputationStrategy::None)
            | StageSpec::Scaler(ScalerKind::None)
            | StageSpec::Transformation(MathKind::Identity) => Self::Identity(Identity),
            StageSpec::Imputation(strategy) => Self::Imputer(Imputer::new(strategy.clone())),
            StageSpec::Limits { lower, upper } => Self::Clipper(Clipper::new(*lower, *upper)?),
            StageSpec::Transformation(kind) => Self::Math(MathTransform::new(*kind)),
            StageSpec::Scaler(kind) => Self::Scaler(Scaler::new(*kind)),
            StageSpec::Weight(weight) => Self::Weigher(Weigher::new(*weight)?),
            StageSpec::Unrecognized { key } => {
                warn!("No transformer for stage '{}', using identity", key);
                Self::Identity(Identity)
            }
        };
        Ok(stage)
    }

    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identity(_) => "Identity",
            Self::Imputer(_) => "Imputer",
            Self::Clipper(_) => "Clipper",
            Self::Math(_) => "MathTransform",
            Self::Scaler(_) => "Scaler",
            Self::Weigher(_) => "Weigher",
        }
    }

    fn inner(&self) -> &dyn ColumnTransform {
        match self {
            Self::Identity(t) => t,
            Self::Imputer(t) => t,
            Self::Clipper(t) => t,
            Self::Math(t) => t,
            Self::Scaler(t) => t,
            Self::Weigher(t) => t,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ColumnTransform {
        match self {
            Self::Identity(t) => t,
            Self::Imputer(t) => t,
            Self::Clipper(t) => t,
            Self::Math(t) => t,
            Self::Scaler(t) => t,
            Self::Weigher(t) => t,
        }
    }
}

impl ColumnTransform for Stage {
    fn fit(&mut self, column: &Series) -> Result<()> {
        self.inner_mut().fit(column)
    }

    fn transform(&self, column: &Series) -> Result<Series> {
        self.inner().transform(column)
    }

    fn is_stateful(&self) -> bool {
        self.inner().is_stateful()
    }

    fn is_fitted(&self) -> bool {
        self.inner().is_fitted()
    }
}

//! Options for building a [`crate::PreProcessor`].

use crate::config::expander::StageOrder;
use serde::{Deserialize, Serialize};

/// Pipeline construction options.
///
/// Use [`PreProcessorOptions::builder()`] for a fluent setup.
///
/// # Example
///
/// ```rust,ignore
/// use lex_features::config::{PreProcessorOptions, StageOrder};
///
/// let options = PreProcessorOptions::builder()
///     .stage_order(StageOrder::Declared)
///     .cast_declared_numeric(false)
///     .build();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreProcessorOptions {
    /// How stage depth is assigned within a feature.
    /// Default: Canonical
    pub stage_order: StageOrder,

    /// Cast columns declared `float`/`int` to Float64 before the first depth.
    /// Default: true
    pub cast_declared_numeric: bool,
}

impl Default for PreProcessorOptions {
    fn default() -> Self {
        Self {
            stage_order: StageOrder::default(),
            cast_declared_numeric: true,
        }
    }
}

impl PreProcessorOptions {
    pub fn builder() -> PreProcessorOptionsBuilder {
        PreProcessorOptionsBuilder::default()
    }
}

/// Builder for [`PreProcessorOptions`].
#[derive(Debug, Default)]
pub struct PreProcessorOptionsBuilder {
    stage_order: Option<StageOrder>,
    cast_declared_numeric: Option<bool>,
}

impl PreProcessorOptionsBuilder {
    /// Set how stage depth is assigned within a feature.
    pub fn stage_order(mut self, order: StageOrder) -> Self {
        self.stage_order = Some(order);
        self
    }

    /// Enable or disable casting of declared numeric columns.
    pub fn cast_declared_numeric(mut self, cast: bool) -> Self {
        self.cast_declared_numeric = Some(cast);
        self
    }

    pub fn build(self) -> PreProcessorOptions {
        PreProcessorOptions {
            stage_order: self.stage_order.unwrap_or_default(),
            cast_declared_numeric: self.cast_declared_numeric.unwrap_or(true),
        }
    }
}

//! Feature configuration.
//!
//! - [`feature`]: the per-feature records and their stage specifications
//! - [`expander`]: expansion into canonical (feature, depth, stage) records
//! - [`loader`]: JSON/YAML loading
//! - [`options`]: pipeline construction options

pub mod expander;
pub mod feature;
pub mod loader;
pub mod options;

pub use expander::{CanonicalRecord, ConfigExpander, StageOrder};
pub use feature::{
    FeatureConfig, FeatureType, FillValue, ImputationStrategy, MathKind, ScalerKind, StageKind,
    StageSpec, ensure_unique_names,
};
pub use loader::{ConfigFormat, load_feature_configs, parse_feature_configs};
pub use options::{PreProcessorOptions, PreProcessorOptionsBuilder};

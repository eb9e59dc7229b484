//! Pipeline module.
//!
//! Canonical records are planned into one [`CompositeTransform`] per depth
//! ([`PipelinePlanner`]), which [`PreProcessor`] chains into a single
//! fit/transform object.

mod composite;
mod planner;
mod preprocessor;

pub use composite::CompositeTransform;
pub use planner::{PipelinePlanner, StagePlan};
pub use preprocessor::{PipelineState, PreProcessor};

//! Expansion of sparse feature configurations into canonical records.
//!
//! Every active feature ends up with exactly one [`CanonicalRecord`] per
//! depth, so one composite transform per depth can cover all active features.
//! Gaps are filled with identity records.

use crate::config::feature::{FeatureConfig, FeatureType, StageKind, StageSpec, ensure_unique_names};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How stage depth is assigned within one feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageOrder {
    /// Stable-sort each feature's stages as impute, clip, transform, scale,
    /// weigh before numbering them. Repeated kinds keep their declared order.
    #[default]
    Canonical,
    /// Number stages exactly in declaration order.
    Declared,
}

/// A fully expanded (feature, depth, stage) entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    /// Position of the feature in the configuration list.
    pub feature_order: usize,
    pub feature_name: String,
    pub active: bool,
    pub feature_type: FeatureType,
    pub stage_depth: usize,
    pub stage: StageSpec,
    /// True for identity records filling a depth the feature did not declare.
    pub synthesized: bool,
}

impl CanonicalRecord {
    pub fn stage_kind(&self) -> StageKind {
        self.stage.kind()
    }
}

/// Converts a list of [`FeatureConfig`] into canonical records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigExpander {
    order: StageOrder,
}

impl ConfigExpander {
    pub fn new(order: StageOrder) -> Self {
        Self { order }
    }

    /// Expand the configurations.
    ///
    /// Records come back sorted by `(stage_depth, feature_order)`. Inactive
    /// features keep their declared records but are never padded.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FeatureError::DuplicateFeature`] if a name repeats.
    pub fn expand(&self, configs: &[FeatureConfig]) -> Result<Vec<CanonicalRecord>> {
        ensure_unique_names(configs)?;

        // First pass: per-feature stage sequences and the global depth count.
        let ordered: Vec<Vec<StageSpec>> = configs.iter().map(|c| self.order_stages(c)).collect();
        let depth_count = configs
            .iter()
            .zip(&ordered)
            .filter(|(config, _)| config.active)
            .map(|(_, stages)| stages.len())
            .max()
            .unwrap_or(0);

        debug!(
            "Expanding {} features over {} depths ({:?} stage order)",
            configs.len(),
            depth_count,
            self.order
        );

        // Second pass: materialize every record at once.
        let mut records = Vec::new();
        for (feature_order, (config, stages)) in configs.iter().zip(ordered).enumerate() {
            let depths = if config.active {
                depth_count
            } else {
                stages.len()
            };
            let mut declared = stages.into_iter();
            for stage_depth in 0..depths {
                let (stage, synthesized) = match declared.next() {
                    Some(stage) => (stage, false),
                    None => (StageSpec::identity(), true),
                };
                records.push(CanonicalRecord {
                    feature_order,
                    feature_name: config.name.clone(),
                    active: config.active,
                    feature_type: config.feature_type.clone(),
                    stage_depth,
                    stage,
                    synthesized,
                });
            }
        }

        records.sort_by_key(|r| (r.stage_depth, r.feature_order));
        Ok(records)
    }

    fn order_stages(&self, config: &FeatureConfig) -> Vec<StageSpec> {
        let mut stages = config.stages.clone();
        if self.order == StageOrder::Canonical {
            // sort_by_key is stable
            stages.sort_by_key(|s| s.kind().rank());
        }
        stages
    }
}

//! Turning canonical records into per-depth composite transforms.

use crate::config::CanonicalRecord;
use crate::error::{FeatureError, Result, ResultExt};
use crate::pipeline::composite::CompositeTransform;
use crate::stages::Stage;
use std::collections::BTreeMap;
use tracing::debug;

/// Ordered per-depth composite transforms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StagePlan {
    depths: Vec<CompositeTransform>,
}

impl StagePlan {
    /// Number of depths.
    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    pub fn get(&self, depth: usize) -> Option<&CompositeTransform> {
        self.depths.get(depth)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompositeTransform> {
        self.depths.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, CompositeTransform> {
        self.depths.iter_mut()
    }

    /// Planned features in feature order; empty when there are no depths.
    pub fn feature_names(&self) -> Vec<&str> {
        self.depths
            .first()
            .map(|d| d.feature_names().collect())
            .unwrap_or_default()
    }
}

/// Builds a [`StagePlan`] from canonical records.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelinePlanner;

impl PipelinePlanner {
    /// Build one [`CompositeTransform`] per depth over the active records.
    ///
    /// Within a depth, features are registered in feature order. Inactive
    /// records are ignored.
    ///
    /// # Errors
    /// - [`FeatureError::InvalidConfig`] if a stage cannot be built, depths are
    ///   not contiguous from 0, or some depth does not cover every active
    ///   feature
    /// - [`FeatureError::DuplicateFeature`] if a feature appears twice at one
    ///   depth
    pub fn plan(records: &[CanonicalRecord]) -> Result<StagePlan> {
        let mut by_depth: BTreeMap<usize, Vec<&CanonicalRecord>> = BTreeMap::new();
        for record in records.iter().filter(|r| r.active) {
            by_depth.entry(record.stage_depth).or_default().push(record);
        }

        let mut depths = Vec::with_capacity(by_depth.len());
        for (position, (depth, mut group)) in by_depth.into_iter().enumerate() {
            if depth != position {
                return Err(FeatureError::InvalidConfig(format!(
                    "stage depths must be contiguous from 0, found depth {} at position {}",
                    depth, position
                )));
            }
            group.sort_by_key(|r| r.feature_order);

            let mut composite = CompositeTransform::new(depth);
            for record in group {
                let stage = Stage::from_spec(&record.stage)
                    .context(format!("Planning '{}' at depth {}", record.feature_name, depth))?;
                composite.push(record.feature_name.clone(), stage)?;
            }
            debug!("Planned depth {} over {} features", depth, composite.len());
            depths.push(composite);
        }

        if let Some(first) = depths.first() {
            let expected: Vec<&str> = first.feature_names().collect();
            for composite in &depths[1..] {
                let actual: Vec<&str> = composite.feature_names().collect();
                if actual != expected {
                    return Err(FeatureError::InvalidConfig(format!(
                        "depth {} covers features {:?}, expected {:?}",
                        composite.depth(),
                        actual,
                        expected
                    )));
                }
            }
        }

        Ok(StagePlan { depths })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ConfigExpander, FeatureConfig, FeatureType, ImputationStrategy, MathKind, ScalerKind,
        StageSpec,
    };
    use pretty_assertions::assert_eq;

    fn record(order: usize, name: &str, depth: usize, stage: StageSpec) -> CanonicalRecord {
        CanonicalRecord {
            feature_order: order,
            feature_name: name.to_string(),
            active: true,
            feature_type: FeatureType::Float,
            stage_depth: depth,
            stage,
            synthesized: false,
        }
    }

    #[test]
    fn test_plan_from_expanded_configs() {
        let configs = vec![
            FeatureConfig::new("age")
                .with_stage(StageSpec::Limits {
                    lower: Some(0.0),
                    upper: Some(120.0),
                })
                .with_stage(StageSpec::Imputation(ImputationStrategy::Mean)),
            FeatureConfig::new("income").with_stage(StageSpec::Scaler(ScalerKind::MinMax)),
            FeatureConfig::new("notes").inactive().with_stage(StageSpec::Weight(2.0)),
        ];
        let records = ConfigExpander::default().expand(&configs).unwrap();
        let plan = PipelinePlanner::plan(&records).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.feature_names(), vec!["age", "income"]);

        let names = |depth: usize| -> Vec<&'static str> {
            let composite = plan.get(depth).unwrap();
            composite
                .feature_names()
                .map(|f| composite.stage(f).unwrap().name())
                .collect()
        };
        assert_eq!(names(0), vec!["Imputer", "Scaler"]);
        assert_eq!(names(1), vec!["Clipper", "Identity"]);
    }

    #[test]
    fn test_features_sorted_by_order_within_depth() {
        let records = vec![
            record(1, "b", 0, StageSpec::Weight(2.0)),
            record(0, "a", 0, StageSpec::Transformation(MathKind::Log)),
        ];
        let plan = PipelinePlanner::plan(&records).unwrap();
        assert_eq!(plan.feature_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_incomplete_depth_rejected() {
        let records = vec![
            record(0, "a", 0, StageSpec::identity()),
            record(1, "b", 0, StageSpec::identity()),
            record(0, "a", 1, StageSpec::Weight(2.0)),
        ];
        let err = PipelinePlanner::plan(&records).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_depth_gap_rejected() {
        let records = vec![
            record(0, "a", 0, StageSpec::identity()),
            record(0, "a", 2, StageSpec::identity()),
        ];
        assert!(PipelinePlanner::plan(&records).is_err());
    }

    #[test]
    fn test_inverted_limits_fail_planning() {
        let records = vec![record(
            0,
            "a",
            0,
            StageSpec::Limits {
                lower: Some(5.0),
                upper: Some(1.0),
            },
        )];
        let err = PipelinePlanner::plan(&records).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
        assert!(err.to_string().contains("Planning 'a' at depth 0"));
    }

    #[test]
    fn test_empty_records_give_empty_plan() {
        let plan = PipelinePlanner::plan(&[]).unwrap();
        assert!(plan.is_empty());
        assert!(plan.feature_names().is_empty());
    }
}

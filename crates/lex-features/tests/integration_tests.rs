//! Integration tests for feature pipelines.
//!
//! These tests verify end-to-end behavior of config loading, planning and
//! fit/transform through the public API.

use lex_features::config::{ConfigFormat, parse_feature_configs};
use lex_features::{
    ArrayOutput, ArrayTransform, ColumnTableAdapter, FeatureConfig, FeatureError, FeatureType,
    FillValue, ImputationStrategy, MathKind, NumericMatrix, PreProcessor, PreProcessorOptions,
    ScalerKind, Stage, StageOrder, StageSpec, load_feature_configs,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_csv(filename: &str) -> DataFrame {
    let path = fixtures_path().join(filename);
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

fn worked_example_table() -> DataFrame {
    df!(
        "age" => [Some(25.0), None, Some(150.0)],
        "income" => [100.0, 200.0, 300.0]
    )
    .unwrap()
}

// ============================================================================
// Worked Example
// ============================================================================

#[test]
fn test_worked_example_from_json_fixture() {
    let configs = load_feature_configs(fixtures_path().join("features.json")).unwrap();
    let mut pipeline = PreProcessor::new(configs).unwrap();

    let out = pipeline.fit_transform(&worked_example_table()).unwrap();

    assert_eq!(floats(&out, "age"), vec![Some(25.0), Some(87.5), Some(120.0)]);
    assert_eq!(floats(&out, "income"), vec![Some(0.0), Some(0.5), Some(1.0)]);
}

#[test]
fn test_declared_order_clips_before_imputing() {
    let configs = load_feature_configs(fixtures_path().join("features.json")).unwrap();
    let options = PreProcessorOptions::builder()
        .stage_order(StageOrder::Declared)
        .build();
    let mut pipeline = PreProcessor::with_options(configs, options).unwrap();

    let out = pipeline.fit_transform(&worked_example_table()).unwrap();

    // clipped to [25, null, 120] first, so the mean is 72.5
    assert_eq!(floats(&out, "age"), vec![Some(25.0), Some(72.5), Some(120.0)]);
    assert_eq!(floats(&out, "income"), vec![Some(0.0), Some(0.5), Some(1.0)]);
}

#[test]
fn test_yaml_fixture_on_csv_files() {
    let configs = load_feature_configs(fixtures_path().join("features.yaml")).unwrap();
    let mut pipeline = PreProcessor::new(configs).unwrap();

    let train = pipeline.fit_transform(&load_csv("train.csv")).unwrap();
    assert_eq!(names(&train), vec!["age", "income", "city"]);
    assert_eq!(floats(&train, "age"), vec![Some(25.0), Some(87.5), Some(120.0)]);
    assert_eq!(floats(&train, "income"), vec![Some(0.0), Some(1.0), Some(2.0)]);
    assert_eq!(
        strings(&train, "city"),
        vec![
            Some("Oslo".to_string()),
            Some("unknown".to_string()),
            Some("Lima".to_string())
        ]
    );

    let test = pipeline.transform(&load_csv("test.csv")).unwrap();
    assert_eq!(names(&test), vec!["city", "age", "income"]);
    assert_eq!(floats(&test, "age"), vec![Some(87.5), Some(0.0)]);
    assert_eq!(floats(&test, "income"), vec![Some(3.0), Some(1.0)]);
    assert_eq!(
        strings(&test, "city"),
        vec![Some("unknown".to_string()), Some("Quito".to_string())]
    );
}

// ============================================================================
// Column Identity
// ============================================================================

#[test]
fn test_output_keeps_input_column_names_and_order() {
    let configs = vec![
        FeatureConfig::new("a").with_stage(StageSpec::Scaler(ScalerKind::Standard)),
        FeatureConfig::new("b").with_stage(StageSpec::Transformation(MathKind::Square)),
        FeatureConfig::new("c"),
        FeatureConfig::new("d").with_stage(StageSpec::Weight(3.0)),
    ];
    let table = df!(
        "d" => [1.0, 2.0],
        "b" => [3.0, 4.0],
        "c" => [5.0, 6.0],
        "a" => [7.0, 8.0]
    )
    .unwrap();

    let mut pipeline = PreProcessor::new(configs).unwrap();
    let out = pipeline.fit_transform(&table).unwrap();
    assert_eq!(names(&out), names(&table));

    let again = pipeline.transform(&table).unwrap();
    assert_eq!(names(&again), names(&table));
}

#[test]
fn test_inactive_and_unconfigured_columns_are_dropped() {
    let configs = vec![
        FeatureConfig::new("keep").with_stage(StageSpec::Weight(2.0)),
        FeatureConfig::new("skip").inactive(),
    ];
    let table = df!("extra" => [0.0], "skip" => [1.0], "keep" => [2.0]).unwrap();

    let mut pipeline = PreProcessor::new(configs).unwrap();
    let out = pipeline.fit_transform(&table).unwrap();
    assert_eq!(names(&out), vec!["keep"]);
    assert_eq!(floats(&out, "keep"), vec![Some(4.0)]);
}

#[test]
fn test_missing_active_column() {
    let configs = vec![FeatureConfig::new("age"), FeatureConfig::new("height")];
    let table = df!("age" => [1.0]).unwrap();

    let mut pipeline = PreProcessor::new(configs).unwrap();
    let err = pipeline.fit(&table).unwrap_err();
    assert!(matches!(err, FeatureError::ColumnNotFound(ref name) if name == "height"));
}

// ============================================================================
// Identity Gaps and Idempotence
// ============================================================================

#[test]
fn test_features_without_stage_at_depth_are_unchanged() {
    let configs = vec![
        FeatureConfig::new("deep")
            .with_stage(StageSpec::Transformation(MathKind::Square))
            .with_stage(StageSpec::Scaler(ScalerKind::MinMax))
            .with_stage(StageSpec::Weight(10.0)),
        FeatureConfig::new("shallow").with_stage(StageSpec::Weight(3.0)),
        FeatureConfig::new("plain"),
    ];
    let table = df!(
        "deep" => [1.0, 2.0, 3.0],
        "shallow" => [1.0, 2.0, 3.0],
        "plain" => [Some(0.25), None, Some(-4.0)]
    )
    .unwrap();

    let mut pipeline = PreProcessor::new(configs).unwrap();
    let out = pipeline.fit_transform(&table).unwrap();

    assert_eq!(pipeline.depth_count(), 3);
    for depth in 1..3 {
        let composite = pipeline.plan().get(depth).unwrap();
        assert!(matches!(composite.stage("shallow"), Some(Stage::Identity(_))));
        assert!(matches!(composite.stage("plain"), Some(Stage::Identity(_))));
    }

    // squares 1, 4, 9 scaled to 0, 0.375, 1 then weighted
    assert_eq!(floats(&out, "deep"), vec![Some(0.0), Some(3.75), Some(10.0)]);
    assert_eq!(floats(&out, "shallow"), vec![Some(3.0), Some(6.0), Some(9.0)]);
    assert_eq!(floats(&out, "plain"), vec![Some(0.25), None, Some(-4.0)]);
}

#[test]
fn test_identity_transform_and_unit_weight_are_idempotent() {
    let configs = vec![
        FeatureConfig::new("x")
            .with_stage(StageSpec::Transformation(MathKind::Identity))
            .with_stage(StageSpec::Weight(1.0)),
    ];
    let table = df!("x" => [Some(0.1), None, Some(-3.5), Some(1e9)]).unwrap();

    let mut pipeline = PreProcessor::new(configs).unwrap();
    let out = pipeline.fit_transform(&table).unwrap();
    assert!(out.equals_missing(&table));
}

#[test]
fn test_unknown_config_values_degrade_to_identity() {
    let configs = parse_feature_configs(
        r#"[{"name": "x", "transformation": "cube", "scaler": "quantile", "binning": 4}]"#,
        ConfigFormat::Json,
    )
    .unwrap();
    let table = df!("x" => [1.0, 8.0, 27.0]).unwrap();

    let mut pipeline = PreProcessor::new(configs).unwrap();
    let out = pipeline.fit_transform(&table).unwrap();
    assert_eq!(pipeline.depth_count(), 3);
    assert!(out.equals_missing(&table));
}

// ============================================================================
// Fitted Parameters
// ============================================================================

#[test]
fn test_min_max_maps_fit_extremes_to_unit_interval() {
    let configs = vec![FeatureConfig::new("v").with_stage(StageSpec::Scaler(ScalerKind::MinMax))];
    let table = df!("v" => [-17.3, 4.2, 250.75, 0.0]).unwrap();

    let mut pipeline = PreProcessor::new(configs).unwrap();
    let out = pipeline.fit_transform(&table).unwrap();
    assert_eq!(floats(&out, "v")[0], Some(0.0));
    assert_eq!(floats(&out, "v")[2], Some(1.0));
}

#[test]
fn test_imputer_uses_fit_table_mean() {
    let configs = vec![
        FeatureConfig::new("x").with_stage(StageSpec::Imputation(ImputationStrategy::Mean)),
    ];
    let table_a = df!("x" => [Some(2.0), Some(4.0), None]).unwrap();
    let mut pipeline = PreProcessor::new(configs).unwrap();
    pipeline.fit(&table_a).unwrap();

    let table_b = df!("x" => [None, Some(100.0), Some(200.0)]).unwrap();
    assert_eq!(
        floats(&pipeline.transform(&table_b).unwrap(), "x"),
        vec![Some(3.0), Some(100.0), Some(200.0)]
    );

    let table_b_more_missing = df!("x" => [None, None, Some(1000.0)]).unwrap();
    assert_eq!(
        floats(&pipeline.transform(&table_b_more_missing).unwrap(), "x"),
        vec![Some(3.0), Some(3.0), Some(1000.0)]
    );
}

#[test]
fn test_refit_overwrites_learned_parameters() {
    let configs = vec![FeatureConfig::new("x").with_stage(StageSpec::Scaler(ScalerKind::MinMax))];
    let mut pipeline = PreProcessor::new(configs).unwrap();

    pipeline.fit(&df!("x" => [0.0, 10.0]).unwrap()).unwrap();
    pipeline.fit(&df!("x" => [0.0, 100.0]).unwrap()).unwrap();

    let out = pipeline.transform(&df!("x" => [50.0]).unwrap()).unwrap();
    assert_eq!(floats(&out, "x"), vec![Some(0.5)]);
}

#[test]
fn test_transform_leaves_input_untouched() {
    let configs = vec![
        FeatureConfig::new("age").with_stage(StageSpec::Imputation(ImputationStrategy::Median)),
    ];
    let table = df!("age" => [Some(1.0), None, Some(5.0)]).unwrap();
    let snapshot = table.clone();

    let mut pipeline = PreProcessor::new(configs).unwrap();
    pipeline.fit(&table).unwrap();
    pipeline.transform(&table).unwrap();
    assert!(table.equals_missing(&snapshot));
}

// ============================================================================
// Error Handling
// ============================================================================

#[test]
fn test_transform_before_fit_fails() {
    let configs = load_feature_configs(fixtures_path().join("features.json")).unwrap();
    let pipeline = PreProcessor::new(configs).unwrap();

    let err = pipeline.transform(&worked_example_table()).unwrap_err();
    assert!(err.is_not_fitted());
    assert_eq!(err.error_code(), "NOT_FITTED");
}

#[test]
fn test_non_numeric_column_passes_through_stage() {
    let configs = vec![
        FeatureConfig::new("city").with_stage(StageSpec::Limits {
            lower: Some(0.0),
            upper: Some(1.0),
        }),
        FeatureConfig::new("score").with_stage(StageSpec::Limits {
            lower: Some(0.0),
            upper: Some(1.0),
        }),
    ];
    let table = df!(
        "city" => ["Oslo", "Lima", "Quito"],
        "score" => [-0.5, 0.5, 1.5]
    )
    .unwrap();

    let mut pipeline = PreProcessor::new(configs).unwrap();
    let out = pipeline.fit_transform(&table).unwrap();
    assert!(
        out.column("city")
            .unwrap()
            .as_materialized_series()
            .equals(table.column("city").unwrap().as_materialized_series())
    );
    assert_eq!(floats(&out, "score"), vec![Some(0.0), Some(0.5), Some(1.0)]);

    let out = pipeline.transform(&table).unwrap();
    assert_eq!(strings(&out, "city")[1], Some("Lima".to_string()));
}

/// Averages adjacent column pairs, halving the column count.
struct PairwiseMean;

impl ArrayTransform for PairwiseMean {
    fn transform_array(&self, table: &DataFrame) -> lex_features::FeatureResult<ArrayOutput> {
        let matrix = NumericMatrix::from_frame(table)?;
        let columns = matrix.into_columns();
        let halved = columns
            .chunks(2)
            .filter(|pair| pair.len() == 2)
            .map(|pair| {
                pair[0]
                    .iter()
                    .zip(&pair[1])
                    .map(|(a, b)| a.zip(*b).map(|(a, b)| (a + b) / 2.0))
                    .collect()
            })
            .collect();
        Ok(ArrayOutput::Numeric(NumericMatrix::new(halved)))
    }
}

#[test]
fn test_text_constant_on_boolean_column_passes_through() {
    let configs = vec![
        FeatureConfig::new("flag")
            .with_type(FeatureType::Boolean)
            .with_stage(StageSpec::Imputation(ImputationStrategy::Constant(
                FillValue::Text("unknown".to_string()),
            ))),
        FeatureConfig::new("x").with_stage(StageSpec::Weight(2.0)),
    ];
    let table = df!("flag" => [Some(true), None], "x" => [1.0, 2.0]).unwrap();

    let mut pipeline = PreProcessor::new(configs).unwrap();
    let out = pipeline.fit_transform(&table).unwrap();
    assert!(
        out.column("flag")
            .unwrap()
            .as_materialized_series()
            .equals_missing(table.column("flag").unwrap().as_materialized_series())
    );
    assert_eq!(floats(&out, "x"), vec![Some(2.0), Some(4.0)]);
}

#[test]
fn test_column_reducing_transform_is_rejected() {
    let table = df!(
        "a" => [1.0, 2.0],
        "b" => [3.0, 4.0],
        "c" => [5.0, 6.0],
        "d" => [7.0, 8.0]
    )
    .unwrap();

    let err = ColumnTableAdapter::adapt(&table, &PairwiseMean).unwrap_err();
    assert_eq!(err.error_code(), "SHAPE_MISMATCH");
    assert!(matches!(
        err,
        FeatureError::ShapeMismatch {
            expected: 4,
            actual: 2
        }
    ));
}

#[test]
fn test_invalid_configs_are_rejected_at_construction() {
    let inverted = vec![FeatureConfig::new("x").with_stage(StageSpec::Limits {
        lower: Some(2.0),
        upper: Some(1.0),
    })];
    assert_eq!(
        PreProcessor::new(inverted).unwrap_err().error_code(),
        "INVALID_CONFIG"
    );

    let duplicated = vec![FeatureConfig::new("x"), FeatureConfig::new("x")];
    assert_eq!(
        PreProcessor::new(duplicated).unwrap_err().error_code(),
        "DUPLICATE_FEATURE"
    );

    let err = parse_feature_configs("- name: x\n  limits: [1, 2, 3]\n", ConfigFormat::Yaml)
        .unwrap_err();
    assert_eq!(err.error_code(), "YAML_ERROR");
}

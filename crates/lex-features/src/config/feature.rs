//! Per-feature configuration records.
//!
//! A [`FeatureConfig`] names one input column and lists the stages to run on
//! it. The order in which stage keys appear in the source document is the
//! order in which the stages are declared, so deserialization walks the map by
//! hand instead of going through an intermediate (sorted) JSON object.

use crate::error::{FeatureError, Result};
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

// =============================================================================
// Feature Types
// =============================================================================

/// Declared value type of a feature (`type` key).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeatureType {
    #[default]
    Float,
    Integer,
    Categorical,
    Boolean,
    /// Any other tag, kept verbatim.
    Other(String),
}

impl FeatureType {
    /// Parse a type tag. Unknown tags are preserved as [`FeatureType::Other`].
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "float" | "double" | "numeric" => Self::Float,
            "int" | "integer" => Self::Integer,
            "category" | "categorical" | "string" | "str" => Self::Categorical,
            "bool" | "boolean" => Self::Boolean,
            _ => Self::Other(tag.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Float => "float",
            Self::Integer => "int",
            Self::Categorical => "category",
            Self::Boolean => "bool",
            Self::Other(tag) => tag,
        }
    }

    /// Whether columns of this type are expected to hold numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Float | Self::Integer)
    }
}

impl Serialize for FeatureType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FeatureType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::parse(&tag))
    }
}

// =============================================================================
// Stage Parameters
// =============================================================================

/// Element-wise mathematical transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MathKind {
    Log,
    Log10,
    Log1p,
    Exp,
    Square,
    Sqrt,
    Identity,
}

impl MathKind {
    /// Parse a transformation name.
    ///
    /// Unknown names fall back to [`MathKind::Identity`] so that a typo in a
    /// configuration file never fails pipeline construction. The fallback is
    /// logged as a warning.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "log" => Self::Log,
            "log10" => Self::Log10,
            "log1p" => Self::Log1p,
            "exp" => Self::Exp,
            "square" => Self::Square,
            "sqrt" => Self::Sqrt,
            "identity" | "" => Self::Identity,
            other => {
                warn!("Unknown transformation '{}', using identity", other);
                Self::Identity
            }
        }
    }

    /// Apply the transformation to one value.
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Log => x.ln(),
            Self::Log10 => x.log10(),
            Self::Log1p => x.ln_1p(),
            Self::Exp => x.exp(),
            Self::Square => x * x,
            Self::Sqrt => x.sqrt(),
            Self::Identity => x,
        }
    }
}

/// Scaling method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerKind {
    MinMax,
    Standard,
    Robust,
    /// No scaling.
    None,
}

impl ScalerKind {
    /// Parse a scaler name; unknown names fall back to [`ScalerKind::None`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "min_max" | "minmax" => Self::MinMax,
            "standard" => Self::Standard,
            "robust" => Self::Robust,
            "none" | "" => Self::None,
            other => {
                warn!("Unknown scaler '{}', leaving feature unscaled", other);
                Self::None
            }
        }
    }
}

/// Value used by constant imputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FillValue {
    Number(f64),
    Text(String),
}

impl FillValue {
    /// Numbers stay numbers; anything else is kept as text.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    fn from_json(key: &str, value: &Value) -> Result<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => n
                .as_f64()
                .map(|n| Some(Self::Number(n)))
                .ok_or_else(|| invalid(key, value)),
            Value::String(s) => Ok(Some(Self::Text(s.clone()))),
            Value::Bool(b) => Ok(Some(Self::Text(b.to_string()))),
            _ => Err(invalid(key, value)),
        }
    }
}

impl Default for FillValue {
    fn default() -> Self {
        Self::Number(0.0)
    }
}

impl fmt::Display for FillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Missing-value imputation strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationStrategy {
    Mean,
    Median,
    Constant(FillValue),
    /// No imputation.
    None,
}

impl ImputationStrategy {
    /// Parse a strategy string such as `"mean"` or `"constant:0"`.
    ///
    /// A bare `"constant"` takes its value from `param` (the
    /// `imputation_param` key), defaulting to `0`. Unknown strategies fall
    /// back to [`ImputationStrategy::None`].
    pub fn parse(spec: &str, param: Option<&FillValue>) -> Self {
        let spec = spec.trim();
        if let Some(raw) = spec.strip_prefix("constant:") {
            return Self::Constant(FillValue::parse(raw));
        }
        match spec.to_ascii_lowercase().as_str() {
            "mean" => Self::Mean,
            "median" => Self::Median,
            "constant" => Self::Constant(param.cloned().unwrap_or_default()),
            "none" | "" => Self::None,
            other => {
                warn!("Unknown imputation strategy '{}', skipping imputation", other);
                Self::None
            }
        }
    }
}

// =============================================================================
// Stage Specifications
// =============================================================================

/// Kind of a stage, in the canonical execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Imputation,
    Limits,
    Transformation,
    Scaler,
    Weight,
    Unrecognized,
}

impl StageKind {
    /// Position in the canonical order impute, clip, transform, scale, weigh.
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Configuration key that declares this kind.
    pub fn key(self) -> &'static str {
        match self {
            Self::Imputation => "imputation_strategy",
            Self::Limits => "limits",
            Self::Transformation => "transformation",
            Self::Scaler => "scaler",
            Self::Weight => "weight",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// One declared stage of a feature: its kind plus its parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageSpec {
    Imputation(ImputationStrategy),
    Limits {
        lower: Option<f64>,
        upper: Option<f64>,
    },
    Transformation(MathKind),
    Scaler(ScalerKind),
    Weight(f64),
    /// A key that names no known stage. Runs as identity.
    Unrecognized { key: String },
}

impl StageSpec {
    /// The no-op stage used to fill depth gaps.
    pub fn identity() -> Self {
        Self::Transformation(MathKind::Identity)
    }

    pub fn kind(&self) -> StageKind {
        match self {
            Self::Imputation(_) => StageKind::Imputation,
            Self::Limits { .. } => StageKind::Limits,
            Self::Transformation(_) => StageKind::Transformation,
            Self::Scaler(_) => StageKind::Scaler,
            Self::Weight(_) => StageKind::Weight,
            Self::Unrecognized { .. } => StageKind::Unrecognized,
        }
    }

    /// Build a stage from one `key: value` configuration entry.
    pub fn from_entry(
        key: &str,
        value: &Value,
        imputation_param: Option<&FillValue>,
    ) -> Result<Self> {
        match key {
            "imputation_strategy" => Ok(Self::Imputation(match value {
                Value::Null => ImputationStrategy::None,
                Value::String(s) => ImputationStrategy::parse(s, imputation_param),
                _ => return Err(invalid(key, value)),
            })),
            "limits" => {
                let (lower, upper) = parse_limits(value)?;
                Ok(Self::Limits { lower, upper })
            }
            "transformation" => Ok(Self::Transformation(match value {
                Value::Null => MathKind::Identity,
                Value::String(s) => MathKind::parse(s),
                _ => return Err(invalid(key, value)),
            })),
            "scaler" => Ok(Self::Scaler(match value {
                Value::Null => ScalerKind::None,
                Value::String(s) => ScalerKind::parse(s),
                _ => return Err(invalid(key, value)),
            })),
            "weight" => match value {
                Value::Null => Ok(Self::Weight(1.0)),
                _ => value
                    .as_f64()
                    .map(Self::Weight)
                    .ok_or_else(|| invalid(key, value)),
            },
            other => {
                warn!("Unrecognized stage key '{}', treating it as identity", other);
                Ok(Self::Unrecognized {
                    key: other.to_string(),
                })
            }
        }
    }
}

fn parse_limits(value: &Value) -> Result<(Option<f64>, Option<f64>)> {
    let bound = |v: &Value| match v {
        Value::Null => Ok(None),
        other => other.as_f64().map(Some).ok_or_else(|| invalid("limits", value)),
    };
    match value {
        Value::Null => Ok((None, None)),
        Value::Array(items) if items.len() == 2 => Ok((bound(&items[0])?, bound(&items[1])?)),
        _ => Err(invalid("limits", value)),
    }
}

fn invalid(key: &str, value: &Value) -> FeatureError {
    FeatureError::InvalidConfig(format!("unsupported value for '{key}': {value}"))
}

// =============================================================================
// Feature Configuration
// =============================================================================

/// Configuration of one input column.
///
/// # Example
///
/// ```rust,ignore
/// use lex_features::config::{FeatureConfig, ImputationStrategy, StageSpec};
///
/// let age = FeatureConfig::new("age")
///     .with_stage(StageSpec::Imputation(ImputationStrategy::Mean))
///     .with_stage(StageSpec::Limits { lower: Some(0.0), upper: Some(120.0) });
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureConfig {
    pub name: String,
    pub active: bool,
    #[serde(rename = "type")]
    pub feature_type: FeatureType,
    /// Stages in declaration order.
    pub stages: Vec<StageSpec>,
}

impl FeatureConfig {
    /// An active float feature with no stages.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            feature_type: FeatureType::default(),
            stages: Vec::new(),
        }
    }

    /// Append a stage after the ones already declared.
    pub fn with_stage(mut self, stage: StageSpec) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn with_type(mut self, feature_type: FeatureType) -> Self {
        self.feature_type = feature_type;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Mark the feature inactive; it is dropped from pipeline output.
    pub fn inactive(self) -> Self {
        self.with_active(false)
    }
}

/// Reject configurations that name the same feature twice.
pub fn ensure_unique_names(configs: &[FeatureConfig]) -> Result<()> {
    let mut seen = HashSet::new();
    for config in configs {
        if !seen.insert(config.name.as_str()) {
            return Err(FeatureError::DuplicateFeature(config.name.clone()));
        }
    }
    Ok(())
}

impl<'de> Deserialize<'de> for FeatureConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(FeatureConfigVisitor)
    }
}

struct FeatureConfigVisitor;

impl<'de> Visitor<'de> for FeatureConfigVisitor {
    type Value = FeatureConfig;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a feature configuration map with a 'name' key")
    }

    fn visit_map<A: MapAccess<'de>>(
        self,
        mut map: A,
    ) -> std::result::Result<FeatureConfig, A::Error> {
        let mut name: Option<String> = None;
        let mut active: Option<bool> = None;
        let mut feature_type: Option<FeatureType> = None;
        let mut imputation_param = Value::Null;
        // (key, value) pairs in document order
        let mut entries: Vec<(String, Value)> = Vec::new();

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "name" => name = Some(map.next_value()?),
                "active" => active = map.next_value()?,
                "type" => feature_type = map.next_value()?,
                "imputation_param" => imputation_param = map.next_value()?,
                "stages" => {
                    let stages: Vec<serde_json::Map<String, Value>> = map.next_value()?;
                    for stage in stages {
                        if stage.len() != 1 {
                            return Err(de::Error::custom(
                                "each entry of 'stages' must have exactly one key",
                            ));
                        }
                        entries.extend(stage);
                    }
                }
                _ => {
                    let value: Value = map.next_value()?;
                    entries.push((key, value));
                }
            }
        }

        let name = name.ok_or_else(|| de::Error::missing_field("name"))?;
        let fill = FillValue::from_json("imputation_param", &imputation_param)
            .map_err(de::Error::custom)?;
        let stages = entries
            .iter()
            .map(|(key, value)| StageSpec::from_entry(key, value, fill.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| de::Error::custom(format!("feature '{name}': {e}")))?;

        Ok(FeatureConfig {
            name,
            active: active.unwrap_or(true),
            feature_type: feature_type.unwrap_or_default(),
            stages,
        })
    }
}

/// A configuration document: either a bare list of features or a map with a
/// `features` list (other top-level keys are ignored).
pub(crate) struct FeatureConfigDocument(pub Vec<FeatureConfig>);

impl<'de> Deserialize<'de> for FeatureConfigDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = FeatureConfigDocument;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a list of features or a map with a 'features' list")
    }

    fn visit_seq<A: SeqAccess<'de>>(
        self,
        mut seq: A,
    ) -> std::result::Result<Self::Value, A::Error> {
        let mut features = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(feature) = seq.next_element::<FeatureConfig>()? {
            features.push(feature);
        }
        Ok(FeatureConfigDocument(features))
    }

    fn visit_map<A: MapAccess<'de>>(
        self,
        mut map: A,
    ) -> std::result::Result<Self::Value, A::Error> {
        let mut features = None;
        while let Some(key) = map.next_key::<String>()? {
            if key == "features" {
                features = Some(map.next_value::<Vec<FeatureConfig>>()?);
            } else {
                map.next_value::<de::IgnoredAny>()?;
            }
        }
        features
            .map(FeatureConfigDocument)
            .ok_or_else(|| de::Error::missing_field("features"))
    }
}

//! Loading feature configurations from JSON or YAML files.

use crate::config::feature::{FeatureConfig, FeatureConfigDocument, ensure_unique_names};
use crate::error::{FeatureError, Result, ResultExt};
use std::path::Path;
use tracing::info;

/// Serialization format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from the file extension; anything but `.yaml`/`.yml`
    /// is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

/// Parse feature configurations from a string.
///
/// The document is either a list of features or a map holding a `features`
/// list.
pub fn parse_feature_configs(text: &str, format: ConfigFormat) -> Result<Vec<FeatureConfig>> {
    let FeatureConfigDocument(configs) = match format {
        ConfigFormat::Json => serde_json::from_str::<FeatureConfigDocument>(text)?,
        ConfigFormat::Yaml => serde_yaml::from_str::<FeatureConfigDocument>(text)?,
    };
    ensure_unique_names(&configs)?;
    Ok(configs)
}

/// Read and parse a feature configuration file.
pub fn load_feature_configs(path: impl AsRef<Path>) -> Result<Vec<FeatureConfig>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(FeatureError::from)
        .context(format!("Reading feature config {}", path.display()))?;
    let configs = parse_feature_configs(&text, ConfigFormat::from_path(path))
        .context(format!("Parsing feature config {}", path.display()))?;

    info!(
        "Loaded {} feature configs ({} active) from {}",
        configs.len(),
        configs.iter().filter(|c| c.active).count(),
        path.display()
    );
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::feature::{ImputationStrategy, StageSpec};

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("f.yaml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("f.YML")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("f.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("features")), ConfigFormat::Json);
    }

    #[test]
    fn test_parse_yaml_wrapped_document() {
        let yaml = "\
data_local_path: data/drug200.csv
features:
  - name: age
    imputation_strategy: median
  - name: sex
    active: false
    type: category
";
        let configs = parse_feature_configs(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(configs.len(), 2);
        assert_eq!(
            configs[0].stages,
            vec![StageSpec::Imputation(ImputationStrategy::Median)]
        );
        assert!(!configs[1].active);
    }

    #[test]
    fn test_parse_rejects_duplicates() {
        let json = r#"[{"name": "age"}, {"name": "age"}]"#;
        let err = parse_feature_configs(json, ConfigFormat::Json).unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_FEATURE");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_feature_configs("does/not/exist.json").unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(err.to_string().contains("exist.json"));
    }
}

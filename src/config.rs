use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Application-level constants
pub const APP_NAME: &str = "emo-consolidator";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const CONFIG_FILE_NAME: &str = "config.json";

/// Accepted exam-date horizon, in years.
const HORIZON_YEARS: std::ops::RangeInclusive<u32> = 1..=100;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "emo_consolidator=info,warn"
}

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// [`default_log_filter`]. Safe to call more than once: a subscriber that
/// is already installed (by the host application or a previous call) wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter())),
        )
        .try_init();
}

/// Per-user config location: `<config_dir>/emo-consolidator/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE_NAME))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

/// Tunable knobs for validation and filtering.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Exam dates older than this many years (counted back to Jan 1) are flagged.
    pub date_horizon_years: u32,
    /// Diagnoses below this extraction confidence produce a review alert.
    pub low_confidence_threshold: f32,
    /// "Today" for date checks. `None` uses the local date at validation time.
    pub reference_date: Option<NaiveDate>,
    /// Fields whose absence across every merged source yields `dato_faltante`.
    pub required_clinical_fields: Vec<String>,
    /// Field names never eligible for completeness alerts.
    pub administrative_fields: Vec<String>,
    /// Replaces the built-in exam-name vocabulary of the recommendation filter.
    pub exam_name_terms: Option<Vec<String>>,
    /// Replaces the built-in boilerplate keyword catalog of the recommendation filter.
    pub generic_keywords: Option<Vec<String>>,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            date_horizon_years: 5,
            low_confidence_threshold: 0.7,
            reference_date: None,
            required_clinical_fields: vec!["workFitness".into(), "examDate".into()],
            administrative_fields: [
                "eps",
                "arl",
                "afiliacion",
                "empresa",
                "company",
                "area",
                "department",
                "cargo",
                "jobTitle",
                "antiguedad",
                "edad",
                "age",
                "sexo",
                "fecha_nacimiento",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            exam_name_terms: None,
            generic_keywords: None,
        }
    }
}

impl ConsolidationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Load from `path` (or [`default_config_path`]); a missing file yields defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        if !resolved.exists() {
            tracing::debug!(path = %resolved.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let config = Self::load(&resolved)?;
        tracing::info!(path = %resolved.display(), "Loaded consolidation config");
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.low_confidence_threshold) {
            return Err(ConfigError::Invalid {
                field: "low_confidence_threshold".into(),
                reason: format!("{} is outside [0, 1]", self.low_confidence_threshold),
            });
        }
        if !HORIZON_YEARS.contains(&self.date_horizon_years) {
            return Err(ConfigError::Invalid {
                field: "date_horizon_years".into(),
                reason: format!("{} is outside 1..=100", self.date_horizon_years),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn app_name_matches_package() {
        assert_eq!(APP_NAME, "emo-consolidator");
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn empty_object_yields_defaults() {
        let config = ConsolidationConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ConsolidationConfig::default());
        assert_eq!(config.date_horizon_years, 5);
        assert!(config.administrative_fields.iter().any(|f| f == "eps"));
    }

    #[test]
    fn partial_override() {
        let config = ConsolidationConfig::from_json_str(
            r#"{"date_horizon_years": 3, "reference_date": "2025-06-01"}"#,
        )
        .unwrap();
        assert_eq!(config.date_horizon_years, 3);
        assert_eq!(config.reference_date, NaiveDate::from_ymd_opt(2025, 6, 1));
        assert_eq!(config.low_confidence_threshold, 0.7);
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        let err = ConsolidationConfig::from_json_str(r#"{"low_confidence_threshold": 1.5}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn rejects_horizon_out_of_range() {
        for years in [0u64, 101, 4_294_967_295] {
            let err = ConsolidationConfig::from_json_str(&format!(r#"{{"date_horizon_years": {years}}}"#))
                .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "date_horizon_years"));
        }
        let config = ConsolidationConfig::from_json_str(r#"{"date_horizon_years": 100}"#).unwrap();
        assert_eq!(config.date_horizon_years, 100);
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = ConsolidationConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"generic_keywords": ["uso de epp"]}}"#).unwrap();
        let config = ConsolidationConfig::load(file.path()).unwrap();
        assert_eq!(config.generic_keywords, Some(vec!["uso de epp".to_string()]));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let config = ConsolidationConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config, ConsolidationConfig::default());
    }

    #[test]
    fn unreadable_path_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConsolidationConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn default_config_path_is_namespaced() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("emo-consolidator/config.json"));
        }
    }

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}

//! Reference configuration: disease list, expected services, facility-level
//! minimums, thresholds and tolerances.
//!
//! The configuration is loaded once, validated, and then passed by reference
//! into every pipeline stage. The built-in reference set is compiled from
//! `config/reference.json` at the workspace root.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

const BUILTIN_REFERENCE: &str = include_str!("../../../config/reference.json");

/// Facility tiers recognised by the Kenyan health system.
pub const FACILITY_LEVELS: std::ops::RangeInclusive<u8> = 1..=6;

/// A disease from the reference list and the treatments expected to cover it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiseaseEntry {
    pub name: String,
    pub treatments: Vec<String>,
}

/// A service the policy is expected to price, optionally at a given level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedService {
    pub name: String,
    #[serde(default)]
    pub facility_level: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionSettings {
    /// Characters of context kept either side of a match in the evidence.
    pub context_window: usize,
    /// Currency assumed when the classifier supplies an amount alone.
    pub default_currency: String,
    /// Longest line accepted as a heading when a rule has no name of its own.
    pub heading_max_chars: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            context_window: 80,
            default_currency: "KES".to_string(),
            heading_max_chars: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectionSettings {
    /// Token-sort ratio (0..=1) at which two service names are the same service.
    pub similarity_threshold: f64,
    /// Largest amount difference still treated as agreement.
    pub tariff_tolerance: u64,
    /// Largest frequency-cap difference still treated as agreement.
    pub frequency_tolerance: u32,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.75,
            tariff_tolerance: 0,
            frequency_tolerance: 0,
        }
    }
}

/// Call policy for the optional external classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierPolicy {
    pub timeout_ms: u64,
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry.
    pub backoff_base_ms: u64,
    /// Classifier answers below this confidence are ignored.
    pub min_confidence: f32,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_retries: 2,
            backoff_base_ms: 250,
            min_confidence: 0.6,
        }
    }
}

/// Complete, immutable analyzer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub diseases: Vec<DiseaseEntry>,
    #[serde(default)]
    pub expected_services: Vec<ExpectedService>,
    /// Facility level → minimum number of distinct services mapped to it.
    #[serde(default)]
    pub facility_minimums: BTreeMap<u8, usize>,
    #[serde(default)]
    pub extraction: ExtractionSettings,
    #[serde(default)]
    pub detection: DetectionSettings,
    #[serde(default)]
    pub classifier: ClassifierPolicy,
}

impl AnalyzerConfig {
    /// An empty reference set with default thresholds.
    pub fn empty() -> Self {
        Self {
            diseases: Vec::new(),
            expected_services: Vec::new(),
            facility_minimums: BTreeMap::new(),
            extraction: ExtractionSettings::default(),
            detection: DetectionSettings::default(),
            classifier: ClassifierPolicy::default(),
        }
    }

    /// The reference set shipped with the binary.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_REFERENCE)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            diseases = config.diseases.len(),
            expected_services = config.expected_services.len(),
            "loaded reference config"
        );
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.detection;
        if !(d.similarity_threshold > 0.0 && d.similarity_threshold <= 1.0) {
            return Err(invalid(format!(
                "detection.similarity_threshold must be in (0, 1], got {}",
                d.similarity_threshold
            )));
        }

        if self.extraction.context_window == 0 {
            return Err(invalid("extraction.context_window must be positive"));
        }
        if self.extraction.default_currency.trim().is_empty() {
            return Err(invalid("extraction.default_currency must not be empty"));
        }

        let c = &self.classifier;
        if c.timeout_ms == 0 {
            return Err(invalid("classifier.timeout_ms must be positive"));
        }
        if c.max_retries > 10 {
            return Err(invalid(format!(
                "classifier.max_retries must be at most 10, got {}",
                c.max_retries
            )));
        }
        if !(0.0..=1.0).contains(&c.min_confidence) {
            return Err(invalid(format!(
                "classifier.min_confidence must be in [0, 1], got {}",
                c.min_confidence
            )));
        }

        for level in self.facility_minimums.keys() {
            if !FACILITY_LEVELS.contains(level) {
                return Err(invalid(format!(
                    "facility_minimums has level {level}, expected 1 to 6"
                )));
            }
        }

        let mut seen = HashSet::new();
        for disease in &self.diseases {
            let name = disease.name.trim();
            if name.is_empty() {
                return Err(invalid("disease with empty name"));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(invalid(format!("duplicate disease {name:?}")));
            }
            if disease.treatments.is_empty()
                || disease.treatments.iter().any(|t| t.trim().is_empty())
            {
                return Err(invalid(format!(
                    "disease {name:?} needs at least one non-empty treatment keyword"
                )));
            }
        }

        for service in &self.expected_services {
            if service.name.trim().is_empty() {
                return Err(invalid("expected service with empty name"));
            }
            if let Some(level) = service.facility_level
                && !FACILITY_LEVELS.contains(&level)
            {
                return Err(invalid(format!(
                    "expected service {:?} has level {level}, expected 1 to 6",
                    service.name
                )));
            }
        }

        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

//! Analysis run configuration.
//!
//! One `AnalysisConfig` is loaded per pipeline run (YAML, JSON or TOML) and
//! passed by reference into each stage. Nothing here is global.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VarscoreError};
use crate::variant::FeatureComponent;

/// Complete configuration for one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Group name → accepted raw clinical-significance strings
    #[serde(default)]
    pub labels: BTreeMap<String, Vec<String>>,

    /// Weight overrides applied on top of the unit weight vector
    #[serde(default)]
    pub weights: WeightConfig,

    /// Which components take part in composition and how they are transformed
    #[serde(default)]
    pub composition: CompositionConfig,

    /// Positive-control handling
    #[serde(default)]
    pub controls: ControlConfig,

    /// Candidate thresholds for the sweep
    #[serde(default)]
    pub thresholds: ThresholdSweep,

    /// Exploratory analysis windows
    #[serde(default)]
    pub analysis: ExploratoryConfig,
}

// ── Weights ───────────────────────────────────────────────────────────────────

/// Per-component weight overrides. A component left out of the file keeps
/// whatever multiplier it already had.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    #[serde(rename = "AF", default, skip_serializing_if = "Option::is_none")]
    pub allele_frequency: Option<f64>,

    #[serde(rename = "PP", default, skip_serializing_if = "Option::is_none")]
    pub protein_prediction: Option<f64>,

    #[serde(rename = "CON", default, skip_serializing_if = "Option::is_none")]
    pub consequence: Option<f64>,

    #[serde(rename = "VCQF", default, skip_serializing_if = "Option::is_none")]
    pub call_quality: Option<f64>,

    #[serde(rename = "LIN", default, skip_serializing_if = "Option::is_none")]
    pub linkage: Option<f64>,

    #[serde(rename = "CLIN", default, skip_serializing_if = "Option::is_none")]
    pub clinical_significance: Option<f64>,
}

impl WeightConfig {
    /// The overrides that are actually set, in component order.
    pub fn overrides(&self) -> Vec<(FeatureComponent, f64)> {
        let slots = [
            self.allele_frequency,
            self.protein_prediction,
            self.consequence,
            self.call_quality,
            self.linkage,
            self.clinical_significance,
        ];
        FeatureComponent::ALL
            .into_iter()
            .zip(slots)
            .filter_map(|(c, w)| w.map(|w| (c, w)))
            .collect()
    }
}

// ── Composition ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionConfig {
    /// Components summed into the composite score
    #[serde(default = "default_included")]
    pub included: Vec<FeatureComponent>,

    /// Components clamped to a minimum of zero before composing
    #[serde(default)]
    pub zero_floor: Vec<FeatureComponent>,

    /// Zero a component for controls carrying a given raw annotation
    #[serde(default)]
    pub neutralise_controls: Option<ControlNeutralisation>,
}

fn default_included() -> Vec<FeatureComponent> { FeatureComponent::ALL.to_vec() }

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            included: default_included(),
            zero_floor: vec![],
            neutralise_controls: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlNeutralisation {
    pub component: FeatureComponent,
    /// Raw clinical-significance string, e.g. "Uncertain_significance"
    pub clinical_significance: String,
}

// ── Controls ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Move controls that classify as "other" into "control_uncertain"
    #[serde(default = "default_true")]
    pub relabel_uncertain: bool,
}

fn default_true() -> bool { true }

impl Default for ControlConfig {
    fn default() -> Self {
        Self { relabel_uncertain: true }
    }
}

// ── Thresholds ────────────────────────────────────────────────────────────────

/// Candidate thresholds: either an explicit list (evaluated in the given
/// order) or an inclusive ascending range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThresholdSweep {
    Explicit(Vec<f64>),
    Range { start: f64, stop: f64, step: f64 },
}

impl Default for ThresholdSweep {
    fn default() -> Self {
        ThresholdSweep::Range { start: 0.0, stop: 20.0, step: 1.0 }
    }
}

/// Upper bound on the number of thresholds a range may expand to.
pub const MAX_SWEEP_THRESHOLDS: usize = 100_000;

impl ThresholdSweep {
    /// Materialise the candidate sequence.
    pub fn expand(&self) -> Result<Vec<f64>> {
        match self {
            ThresholdSweep::Explicit(values) => Ok(values.clone()),
            ThresholdSweep::Range { start, stop, step } => {
                if !(start.is_finite() && stop.is_finite() && step.is_finite()) {
                    return Err(VarscoreError::config("threshold range must be finite"));
                }
                if *step <= 0.0 {
                    return Err(VarscoreError::config(format!(
                        "threshold step must be positive, got {step}"
                    )));
                }
                if stop < start {
                    return Err(VarscoreError::config(format!(
                        "threshold range is empty: start {start} > stop {stop}"
                    )));
                }
                // Small epsilon so that e.g. 0..=1 step 0.1 keeps its endpoint.
                let steps = ((stop - start) / step + 1e-9).floor();
                if !steps.is_finite() || steps >= MAX_SWEEP_THRESHOLDS as f64 {
                    return Err(VarscoreError::config(format!(
                        "threshold range {start}..={stop} step {step} expands to more than \
                         {MAX_SWEEP_THRESHOLDS} thresholds"
                    )));
                }
                let n = (steps as usize)
                    .checked_add(1)
                    .ok_or_else(|| VarscoreError::config("threshold count overflows"))?;
                Ok((0..n).map(|i| start + i as f64 * step).collect())
            }
        }
    }
}

// ── Exploratory windows ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploratoryConfig {
    /// Lower bound (exclusive) of the score overlap region
    #[serde(default = "default_overlap_lower")]
    pub overlap_lower: f64,

    /// Upper bound (exclusive) of the score overlap region
    #[serde(default = "default_overlap_upper")]
    pub overlap_upper: f64,

    /// Controls scoring below this are reported as low-scoring
    #[serde(default = "default_low_control")]
    pub low_control_threshold: f64,
}

fn default_overlap_lower() -> f64 { 5.0 }
fn default_overlap_upper() -> f64 { 15.0 }
fn default_low_control() -> f64 { 10.0 }

impl Default for ExploratoryConfig {
    fn default() -> Self {
        Self {
            overlap_lower: default_overlap_lower(),
            overlap_upper: default_overlap_upper(),
            low_control_threshold: default_low_control(),
        }
    }
}

// ── Helper Methods ─────────────────────────────────────────────────────────────

impl AnalysisConfig {
    /// Load from YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load from JSON file
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load from TOML file
    pub fn from_toml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load by file extension (yaml/yml, json, toml).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(path),
            Some("json") => Self::from_json(path),
            Some("toml") => Self::from_toml(path),
            other => Err(VarscoreError::config(format!(
                "unsupported config format {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Save to YAML file
    pub fn to_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Structural checks that must hold before a run starts.
    pub fn validate(&self) -> Result<()> {
        if self.labels.is_empty() || self.labels.values().all(|v| v.is_empty()) {
            return Err(VarscoreError::config("label mapping table is empty"));
        }
        if self.composition.included.is_empty() {
            return Err(VarscoreError::config("no feature components included in composition"));
        }
        if self.analysis.overlap_lower >= self.analysis.overlap_upper {
            return Err(VarscoreError::config(format!(
                "overlap window is empty: {} >= {}",
                self.analysis.overlap_lower, self.analysis.overlap_upper
            )));
        }
        self.thresholds.expand()?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const YAML: &str = r#"
labels:
  benign: [Benign, Likely_benign]
  pathogenic: [Pathogenic, Likely_pathogenic]
weights:
  CON: 1.5
  CLIN: 0.5
composition:
  zero_floor: [CLIN]
thresholds: [5.0, 10.0]
"#;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert!(config.labels.is_empty());
        assert_eq!(config.composition.included.len(), 6);
        assert!(config.controls.relabel_uncertain);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_partial_weights() {
        let config: AnalysisConfig = serde_yaml::from_str(YAML).unwrap();
        assert_eq!(
            config.weights.overrides(),
            vec![
                (FeatureComponent::Consequence, 1.5),
                (FeatureComponent::ClinicalSignificance, 0.5),
            ]
        );
        assert_eq!(config.composition.zero_floor, vec![FeatureComponent::ClinicalSignificance]);
        assert_eq!(config.composition.included.len(), 6);
        assert_eq!(config.thresholds, ThresholdSweep::Explicit(vec![5.0, 10.0]));
        config.validate().unwrap();
    }

    #[test]
    fn test_toml_range_sweep() {
        let toml_src = r#"
[labels]
benign = ["Benign"]
pathogenic = ["Pathogenic"]

[thresholds]
start = 0.0
stop = 1.0
step = 0.25
"#;
        let config: AnalysisConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(config.thresholds.expand().unwrap(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_range_keeps_endpoint_with_float_step() {
        let sweep = ThresholdSweep::Range { start: 0.0, stop: 1.0, step: 0.1 };
        let values = sweep.expand().unwrap();
        assert_eq!(values.len(), 11);
        assert!((values[10] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(ThresholdSweep::Range { start: 0.0, stop: 1.0, step: 0.0 }.expand().is_err());
        assert!(ThresholdSweep::Range { start: 2.0, stop: 1.0, step: 1.0 }.expand().is_err());
    }

    #[test]
    fn test_oversized_range_is_config_error() {
        let huge = ThresholdSweep::Range { start: 0.0, stop: 1e300, step: 1.0 };
        assert!(matches!(huge.expand(), Err(VarscoreError::Configuration(_))));

        let dense = ThresholdSweep::Range { start: 0.0, stop: 1e12, step: 1e-3 };
        assert!(matches!(dense.expand(), Err(VarscoreError::Configuration(_))));

        let wide = ThresholdSweep::Range { start: -1e308, stop: 1e308, step: 1.0 };
        assert!(matches!(wide.expand(), Err(VarscoreError::Configuration(_))));

        let mut config: AnalysisConfig = serde_yaml::from_str(YAML).unwrap();
        config.thresholds = huge;
        assert!(matches!(config.validate(), Err(VarscoreError::Configuration(_))));

        let at_cap = ThresholdSweep::Range {
            start: 0.0,
            stop: (MAX_SWEEP_THRESHOLDS - 1) as f64,
            step: 1.0,
        };
        assert_eq!(at_cap.expand().unwrap().len(), MAX_SWEEP_THRESHOLDS);
    }

    #[test]
    fn test_empty_labels_rejected() {
        let mut config: AnalysisConfig = serde_yaml::from_str(YAML).unwrap();
        config.labels.values_mut().for_each(|v| v.clear());
        assert!(matches!(config.validate(), Err(VarscoreError::Configuration(_))));
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.yaml");
        let config: AnalysisConfig = serde_yaml::from_str(YAML).unwrap();
        config.to_yaml(&path).unwrap();
        let loaded = AnalysisConfig::from_path(&path).unwrap();
        assert_eq!(loaded.labels, config.labels);
        assert_eq!(loaded.weights, config.weights);
    }
}

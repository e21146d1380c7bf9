//! Weight vector for composite rank scoring.

use serde::{Deserialize, Serialize};
use varscore_common::{FeatureComponent, WeightConfig};

/// The 6-component weight vector W.
/// Weights are multiplicative and are not required to sum to anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    /// Allele-frequency penalty
    #[serde(rename = "AF")]
    pub allele_frequency: f64,
    /// Protein-prediction score
    #[serde(rename = "PP")]
    pub protein_prediction: f64,
    /// Consequence severity
    #[serde(rename = "CON")]
    pub consequence: f64,
    /// Variant-call quality
    #[serde(rename = "VCQF")]
    pub call_quality: f64,
    /// Linkage
    #[serde(rename = "LIN")]
    pub linkage: f64,
    /// Clinical significance
    #[serde(rename = "CLIN")]
    pub clinical_significance: f64,
}

impl Default for WeightVector {
    /// Unit weights reproduce the upstream rank score.
    fn default() -> Self {
        Self {
            allele_frequency:      1.0,
            protein_prediction:    1.0,
            consequence:           1.0,
            call_quality:          1.0,
            linkage:               1.0,
            clinical_significance: 1.0,
        }
    }
}

impl WeightVector {
    pub fn get(&self, component: FeatureComponent) -> f64 {
        self.as_array()[component.index()]
    }

    pub fn set(&mut self, component: FeatureComponent, weight: f64) {
        match component {
            FeatureComponent::AlleleFrequency      => self.allele_frequency = weight,
            FeatureComponent::ProteinPrediction    => self.protein_prediction = weight,
            FeatureComponent::Consequence          => self.consequence = weight,
            FeatureComponent::CallQuality          => self.call_quality = weight,
            FeatureComponent::Linkage              => self.linkage = weight,
            FeatureComponent::ClinicalSignificance => self.clinical_significance = weight,
        }
    }

    /// Copy of this vector with the configured overrides applied. Components
    /// the config does not mention keep their current multiplier.
    pub fn with_overrides(&self, overrides: &WeightConfig) -> Self {
        let mut next = self.clone();
        for (component, weight) in overrides.overrides() {
            next.set(component, weight);
        }
        next
    }

    /// True when no weight is negative. Negative weights are allowed but
    /// usually a configuration slip.
    pub fn is_non_negative(&self) -> bool {
        self.as_array().iter().all(|w| *w >= 0.0)
    }

    /// Convert to array for iteration.
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.allele_frequency,
            self.protein_prediction,
            self.consequence,
            self.call_quality,
            self.linkage,
            self.clinical_significance,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_are_unit() {
        let w = WeightVector::default();
        assert!(w.as_array().iter().all(|x| *x == 1.0));
        assert!(w.is_non_negative());
    }

    #[test]
    fn test_overrides_keep_unmentioned() {
        let mut base = WeightVector::default();
        base.set(FeatureComponent::AlleleFrequency, 2.0);

        let overrides = WeightConfig {
            clinical_significance: Some(0.5),
            ..Default::default()
        };
        let w = base.with_overrides(&overrides);
        assert_eq!(w.get(FeatureComponent::ClinicalSignificance), 0.5);
        // AF keeps the previous multiplier, not the default
        assert_eq!(w.get(FeatureComponent::AlleleFrequency), 2.0);
        assert_eq!(w.get(FeatureComponent::Linkage), 1.0);
    }

    #[test]
    fn test_negative_weight_detected() {
        let mut w = WeightVector::default();
        w.set(FeatureComponent::Linkage, -0.1);
        assert!(!w.is_non_negative());
    }
}

//! Composite score computation.
//!
//! composite = Σ(w_i × t(n_i)) over the included components, where t is the
//! chain of configured component transforms. Every re-weighting in the
//! pipeline goes through `ScoreComposer`; there is no second formula.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use varscore_common::{AnalysisConfig, FeatureComponent, Result, VarscoreError, VariantRecord};

use crate::weights::WeightVector;

/// Named per-component transform applied at composition time. Transforms
/// never write back to the record's feature values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentTransform {
    /// Clamp the component to a minimum of zero, so a penalty component can
    /// never contribute a bonus.
    ZeroFloor(FeatureComponent),
    /// Treat the component as zero for controls whose trimmed raw annotation
    /// equals `clinical_significance`.
    NeutraliseForControls {
        component: FeatureComponent,
        clinical_significance: String,
    },
}

impl ComponentTransform {
    fn apply(&self, component: FeatureComponent, value: f64, record: &VariantRecord) -> f64 {
        match self {
            ComponentTransform::ZeroFloor(c) if *c == component => value.max(0.0),
            ComponentTransform::NeutraliseForControls { component: c, clinical_significance }
                if *c == component
                    && record.is_control
                    && record.clinical_significance.trim() == clinical_significance =>
            {
                0.0
            }
            _ => value,
        }
    }
}

/// Counts reported after a composition pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositionSummary {
    /// Records that received a composite score
    pub composed: usize,
    /// Records left without a composite because an included component was missing
    pub incomplete: usize,
}

#[derive(Debug, Clone)]
pub struct ScoreComposer {
    weights: WeightVector,
    included: BTreeSet<FeatureComponent>,
    transforms: Vec<ComponentTransform>,
}

impl Default for ScoreComposer {
    fn default() -> Self {
        Self::new(WeightVector::default())
    }
}

impl ScoreComposer {
    /// Composer over all six components with no transforms.
    pub fn new(weights: WeightVector) -> Self {
        Self {
            weights,
            included: FeatureComponent::ALL.into_iter().collect(),
            transforms: Vec::new(),
        }
    }

    /// Build from the run configuration, starting at `base` weights.
    pub fn from_config(base: &WeightVector, config: &AnalysisConfig) -> Result<Self> {
        let composition = &config.composition;
        if composition.included.is_empty() {
            return Err(VarscoreError::config("no feature components included in composition"));
        }

        let weights = base.with_overrides(&config.weights);
        if !weights.is_non_negative() {
            warn!(weights = ?weights, "Weight vector contains negative multipliers");
        }

        let mut composer = Self {
            weights,
            included: composition.included.iter().copied().collect(),
            transforms: Vec::new(),
        };
        for c in &composition.zero_floor {
            composer.transforms.push(ComponentTransform::ZeroFloor(*c));
        }
        if let Some(n) = &composition.neutralise_controls {
            composer.transforms.push(ComponentTransform::NeutraliseForControls {
                component: n.component,
                clinical_significance: n.clinical_significance.clone(),
            });
        }
        Ok(composer)
    }

    /// Drop a component from the sum (e.g. CLIN, to score without the
    /// annotation the evaluation is measured against).
    pub fn excluding(mut self, component: FeatureComponent) -> Self {
        self.included.remove(&component);
        self
    }

    pub fn with_transform(mut self, transform: ComponentTransform) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn included(&self) -> &BTreeSet<FeatureComponent> {
        &self.included
    }

    /// Composite score for one record, or `None` when an included component
    /// is missing or not finite.
    pub fn composite_for(&self, record: &VariantRecord) -> Option<f64> {
        let mut total = 0.0;
        for &component in &self.included {
            let raw = record.features.get(component).filter(|v| v.is_finite())?;
            let value = self
                .transforms
                .iter()
                .fold(raw, |v, t| t.apply(component, v, record));
            total += value * self.weights.get(component);
        }
        Some(total)
    }

    /// Overwrite `composite_score` on every record. Never accumulates, so
    /// running twice with the same composer gives the same column.
    pub fn compose(&self, records: &mut [VariantRecord]) -> CompositionSummary {
        let mut summary = CompositionSummary::default();
        for record in records.iter_mut() {
            record.set_composite(self.composite_for(record));
            if record.composite_score.is_some() {
                summary.composed += 1;
            } else {
                summary.incomplete += 1;
                debug!(
                    variant = %record.variant_id(),
                    missing = ?record.features.missing(),
                    "Composite score left empty: missing feature components"
                );
            }
        }
        if summary.incomplete > 0 {
            warn!(incomplete = summary.incomplete, "Records without a composite score");
        }
        info!(
            composed = summary.composed,
            incomplete = summary.incomplete,
            weights = ?self.weights.as_array(),
            "Composite scores recomputed"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use varscore_common::{FeatureScores, GroupLabel, WeightConfig};

    use crate::threshold::LabelledScores;

    fn record(features: FeatureScores) -> VariantRecord {
        let mut v = VariantRecord::new("1", 1000, "A", "T");
        v.features = features;
        v
    }

    #[test]
    fn test_unit_weights_sum_components() {
        let v = record(FeatureScores::complete(1.0, 2.0, 3.0, 4.0, 5.0, 6.0));
        assert_eq!(ScoreComposer::default().composite_for(&v), Some(21.0));
    }

    #[test]
    fn test_half_clin_weight() {
        let v = record(FeatureScores::complete(1.0, 2.0, 3.0, 4.0, 5.0, 6.0));
        let weights = WeightVector::default().with_overrides(&WeightConfig {
            clinical_significance: Some(0.5),
            ..Default::default()
        });
        assert_eq!(ScoreComposer::new(weights).composite_for(&v), Some(18.0));
    }

    #[test]
    fn test_excluding_clin_matches_adjusted_score() {
        let v = record(FeatureScores::complete(1.0, 2.0, 3.0, 4.0, 5.0, -4.0));
        let c = ScoreComposer::default().excluding(FeatureComponent::ClinicalSignificance);
        assert_eq!(c.composite_for(&v), Some(15.0));
    }

    #[test]
    fn test_zero_floor_only_clamps_negative() {
        let c = ScoreComposer::default()
            .with_transform(ComponentTransform::ZeroFloor(FeatureComponent::ClinicalSignificance));
        let neg = record(FeatureScores::complete(1.0, 1.0, 1.0, 1.0, 1.0, -5.0));
        let pos = record(FeatureScores::complete(1.0, 1.0, 1.0, 1.0, 1.0, 3.0));
        assert_eq!(c.composite_for(&neg), Some(5.0));
        assert_eq!(c.composite_for(&pos), Some(8.0));
        // feature values are untouched
        assert_eq!(neg.features.clinical_significance, Some(-5.0));
    }

    #[test]
    fn test_neutralise_for_controls() {
        let c = ScoreComposer::default().with_transform(ComponentTransform::NeutraliseForControls {
            component: FeatureComponent::ClinicalSignificance,
            clinical_significance: "Uncertain_significance".to_string(),
        });
        let mut v = record(FeatureScores::complete(1.0, 1.0, 1.0, 1.0, 1.0, -5.0));
        v.clinical_significance = " Uncertain_significance ".to_string();
        assert_eq!(c.composite_for(&v), Some(0.0));
        v.is_control = true;
        assert_eq!(c.composite_for(&v), Some(5.0));
    }

    #[test]
    fn test_missing_component_leaves_composite_empty() {
        let mut features = FeatureScores::complete(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        features.linkage = None;
        let mut records = vec![record(features.clone())];
        records[0].composite_score = Some(99.0);

        let summary = ScoreComposer::default().compose(&mut records);
        assert_eq!(summary, CompositionSummary { composed: 0, incomplete: 1 });
        assert_eq!(records[0].composite_score, None);

        // Excluding the missing component makes the record composable again
        let c = ScoreComposer::default().excluding(FeatureComponent::Linkage);
        assert_eq!(c.composite_for(&records[0]), Some(16.0));
    }

    #[test]
    fn test_incomplete_record_drops_out_of_evaluation() {
        let mut features = FeatureScores::complete(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        features.linkage = None;
        let mut v = record(features);
        v.rank_score = Some(50.0);
        v.group = Some(GroupLabel::Benign);
        let mut records = vec![v];

        let weights = WeightVector::default().with_overrides(&WeightConfig {
            clinical_significance: Some(0.5),
            ..Default::default()
        });
        ScoreComposer::new(weights).compose(&mut records);

        assert_eq!(records[0].composite_score, None);
        // the upstream rank score was weighted differently and must not leak back in
        assert_eq!(records[0].score(), None);
        assert!(LabelledScores::from_records(&records).is_empty());
    }

    #[test]
    fn test_compose_is_idempotent() {
        let mut records: Vec<VariantRecord> = (0..5)
            .map(|i| {
                let x = i as f64;
                record(FeatureScores::complete(x, -x, 0.5 * x, 1.0, 2.0, x - 3.0))
            })
            .collect();
        let weights = WeightVector::default().with_overrides(&WeightConfig {
            allele_frequency: Some(2.0),
            consequence: Some(0.8),
            ..Default::default()
        });
        let c = ScoreComposer::new(weights)
            .with_transform(ComponentTransform::ZeroFloor(FeatureComponent::ClinicalSignificance));

        c.compose(&mut records);
        let first: Vec<Option<f64>> = records.iter().map(|r| r.composite_score).collect();
        c.compose(&mut records);
        let second: Vec<Option<f64>> = records.iter().map(|r| r.composite_score).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_from_config_rejects_empty_inclusion() {
        let mut config = AnalysisConfig::default();
        config.composition.included.clear();
        assert!(ScoreComposer::from_config(&WeightVector::default(), &config).is_err());
    }
}

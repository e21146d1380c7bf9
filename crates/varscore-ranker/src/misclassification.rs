//! Misclassification decomposition and feature-component profiling.
//!
//! These views break records into slices (false positives, false negatives,
//! an ambiguous score window, low-scoring controls) and describe how each
//! feature component is distributed inside the slice. They are what weight
//! re-tuning is based on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;
use varscore_common::{FeatureComponent, GroupLabel, VariantRecord};

use crate::stats::Distribution;
use crate::threshold::Outcome;

/// Records in one slice with their component and score distributions.
/// Components with no finite values in the slice are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordProfile {
    pub variant_ids: Vec<String>,
    pub components: BTreeMap<FeatureComponent, Distribution>,
    pub score: Option<Distribution>,
}

impl RecordProfile {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a VariantRecord>,
    {
        let mut variant_ids = Vec::new();
        let mut columns: BTreeMap<FeatureComponent, Vec<f64>> = BTreeMap::new();
        let mut scores = Vec::new();

        for record in records {
            variant_ids.push(record.variant_id());
            for component in FeatureComponent::ALL {
                if let Some(v) = record.features.get(component) {
                    columns.entry(component).or_default().push(v);
                }
            }
            if let Some(s) = record.score() {
                scores.push(s);
            }
        }

        let components = columns
            .into_iter()
            .filter_map(|(c, values)| Distribution::describe(&values).map(|d| (c, d)))
            .collect();

        Self {
            variant_ids,
            components,
            score: Distribution::describe(&scores),
        }
    }

    pub fn len(&self) -> usize {
        self.variant_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variant_ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MisclassificationReport {
    pub threshold: f64,
    /// Predicted pathogenic, labelled benign
    pub false_positives: RecordProfile,
    /// Predicted benign, labelled pathogenic
    pub false_negatives: RecordProfile,
}

/// Split the benign/pathogenic scored records into false positives and
/// false negatives at `threshold`.
pub fn decompose(records: &[VariantRecord], threshold: f64) -> MisclassificationReport {
    let mut fps = Vec::new();
    let mut fns = Vec::new();

    for record in records {
        let (Some(truth), Some(score)) = (record.group.and_then(|g| g.ground_truth()), record.score()) else {
            continue;
        };
        match Outcome::of(truth, score >= threshold) {
            Outcome::FalsePositive => fps.push(record),
            Outcome::FalseNegative => fns.push(record),
            _ => {}
        }
    }

    info!(
        threshold,
        false_positives = fps.len(),
        false_negatives = fns.len(),
        "Misclassifications decomposed"
    );

    MisclassificationReport {
        threshold,
        false_positives: RecordProfile::from_records(fps),
        false_negatives: RecordProfile::from_records(fns),
    }
}

/// Records whose score lies strictly inside (lower, upper).
pub fn overlap_region(records: &[VariantRecord], lower: f64, upper: f64) -> RecordProfile {
    let profile = RecordProfile::from_records(
        records
            .iter()
            .filter(|r| r.score().is_some_and(|s| s > lower && s < upper)),
    );
    info!(lower, upper, variants = profile.len(), "Overlap region profiled");
    profile
}

/// Controls scoring below `threshold`.
pub fn low_scoring_controls(records: &[VariantRecord], threshold: f64) -> RecordProfile {
    let profile = RecordProfile::from_records(
        records
            .iter()
            .filter(|r| r.is_control && r.score().is_some_and(|s| s < threshold)),
    );
    info!(threshold, controls = profile.len(), "Low-scoring controls profiled");
    profile
}

/// Score distribution per group label.
pub fn group_score_statistics(records: &[VariantRecord]) -> BTreeMap<GroupLabel, Distribution> {
    let mut columns: BTreeMap<GroupLabel, Vec<f64>> = BTreeMap::new();
    for record in records {
        if let (Some(g), Some(s)) = (record.group, record.score()) {
            columns.entry(g).or_default().push(s);
        }
    }
    columns
        .into_iter()
        .filter_map(|(g, values)| Distribution::describe(&values).map(|d| (g, d)))
        .collect()
}

/// True when a component contributes nothing across the whole collection.
pub fn is_component_inert(records: &[VariantRecord], component: FeatureComponent) -> bool {
    records
        .iter()
        .filter_map(|r| r.features.get(component))
        .sum::<f64>()
        == 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use varscore_common::FeatureScores;

    fn rec(pos: u64, group: GroupLabel, score: f64, clin: f64) -> VariantRecord {
        let mut v = VariantRecord::new("2", pos, "G", "A");
        v.group = Some(group);
        v.composite_score = Some(score);
        v.features = FeatureScores::complete(1.0, 2.0, 3.0, 1.0, 0.0, clin);
        v
    }

    fn sample() -> Vec<VariantRecord> {
        vec![
            rec(1, GroupLabel::Benign, 2.0, -2.0),
            rec(2, GroupLabel::Benign, 12.0, 4.0),      // FP at 10
            rec(3, GroupLabel::Pathogenic, 8.0, -1.0),  // FN at 10
            rec(4, GroupLabel::Pathogenic, 14.0, 5.0),
            rec(5, GroupLabel::Other, 30.0, 0.0),       // ignored
            rec(6, GroupLabel::Pathogenic, 6.0, -3.0),  // FN at 10
        ]
    }

    #[test]
    fn test_decompose_partitions() {
        let report = decompose(&sample(), 10.0);
        assert_eq!(report.false_positives.variant_ids, vec!["2_2_G_A"]);
        assert_eq!(report.false_negatives.variant_ids, vec!["2_3_G_A", "2_6_G_A"]);

        let clin = &report.false_negatives.components[&FeatureComponent::ClinicalSignificance];
        assert_eq!(clin.count, 2);
        assert_eq!(clin.mean, -2.0);
        assert_eq!(report.false_negatives.score.as_ref().unwrap().max, 8.0);
    }

    #[test]
    fn test_decompose_skips_unscored() {
        let mut records = sample();
        records[1].composite_score = None;
        let report = decompose(&records, 10.0);
        assert!(report.false_positives.is_empty());
        assert!(report.false_positives.components.is_empty());
    }

    #[test]
    fn test_overlap_region_is_exclusive() {
        let profile = overlap_region(&sample(), 6.0, 14.0);
        assert_eq!(profile.variant_ids, vec!["2_2_G_A", "2_3_G_A"]);
    }

    #[test]
    fn test_low_scoring_controls() {
        let mut records = sample();
        records[0].is_control = true;
        records[3].is_control = true;
        let profile = low_scoring_controls(&records, 10.0);
        assert_eq!(profile.variant_ids, vec!["2_1_G_A"]);
    }

    #[test]
    fn test_group_score_statistics() {
        let stats = group_score_statistics(&sample());
        assert_eq!(stats[&GroupLabel::Benign].count, 2);
        assert_eq!(stats[&GroupLabel::Pathogenic].median, 8.0);
        assert!(!stats.contains_key(&GroupLabel::Uncertain));
    }

    #[test]
    fn test_inert_component() {
        let records = sample();
        assert!(is_component_inert(&records, FeatureComponent::Linkage));
        assert!(!is_component_inert(&records, FeatureComponent::Consequence));
    }
}

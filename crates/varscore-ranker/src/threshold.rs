//! Threshold sweep and binary classification metrics.
//!
//! Ground truth comes from the group label (pathogenic → 1, benign → 0);
//! all other groups take no part. A record is predicted pathogenic at
//! threshold t iff its score ≥ t.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use varscore_common::{Result, VarscoreError, VariantRecord};

use crate::stats::average_ranks;

/// Scores paired with binary ground truth, one entry per evaluable record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelledScores {
    pub ids: Vec<String>,
    pub scores: Vec<f64>,
    pub truth: Vec<bool>,
}

impl LabelledScores {
    /// Collect benign/pathogenic records that carry a finite score.
    pub fn from_records(records: &[VariantRecord]) -> Self {
        let mut out = Self::default();
        let mut unscored = 0usize;
        for record in records {
            let Some(truth) = record.group.and_then(|g| g.ground_truth()) else {
                continue;
            };
            match record.score() {
                Some(score) => {
                    out.ids.push(record.variant_id());
                    out.scores.push(score);
                    out.truth.push(truth);
                }
                None => unscored += 1,
            }
        }
        if unscored > 0 {
            warn!(unscored, "Labelled records without a score left out of evaluation");
        }
        out
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn positives(&self) -> usize {
        self.truth.iter().filter(|t| **t).count()
    }

    pub fn negatives(&self) -> usize {
        self.truth.len() - self.positives()
    }
}

/// Confusion outcome of one record at one threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    TruePositive,
    FalsePositive,
    TrueNegative,
    FalseNegative,
}

impl Outcome {
    pub fn of(truth: bool, predicted: bool) -> Self {
        match (truth, predicted) {
            (true, true)   => Outcome::TruePositive,
            (false, true)  => Outcome::FalsePositive,
            (false, false) => Outcome::TrueNegative,
            (true, false)  => Outcome::FalseNegative,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::FalsePositive | Outcome::FalseNegative)
    }
}

/// Metrics at one threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdMetric {
    pub threshold: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    #[serde(rename = "tp")]
    pub true_positives: usize,
    #[serde(rename = "fp")]
    pub false_positives: usize,
    #[serde(rename = "tn")]
    pub true_negatives: usize,
    #[serde(rename = "fn")]
    pub false_negatives: usize,
}

/// Result of a full sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdReport {
    /// One row per candidate, in the supplied order
    pub metrics: Vec<ThresholdMetric>,
    /// Index of the first row with maximal F1
    pub optimal_index: usize,
    /// ROC AUC of the score against the truth
    pub auc: f64,
    pub positives: usize,
    pub negatives: usize,
}

impl ThresholdReport {
    pub fn optimal(&self) -> &ThresholdMetric {
        &self.metrics[self.optimal_index]
    }
}

/// Confusion counts and metrics at a single threshold.
pub fn metric_at(scores: &[f64], truth: &[bool], threshold: f64) -> ThresholdMetric {
    let (mut tp, mut fp, mut tn, mut fn_) = (0usize, 0usize, 0usize, 0usize);
    for (&score, &t) in scores.iter().zip(truth) {
        match Outcome::of(t, score >= threshold) {
            Outcome::TruePositive  => tp += 1,
            Outcome::FalsePositive => fp += 1,
            Outcome::TrueNegative  => tn += 1,
            Outcome::FalseNegative => fn_ += 1,
        }
    }

    // No positive predictions → precision is 0, not undefined.
    let precision = if tp + fp == 0 { 0.0 } else { tp as f64 / (tp + fp) as f64 };
    let recall = if tp + fn_ == 0 { 0.0 } else { tp as f64 / (tp + fn_) as f64 };
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    ThresholdMetric {
        threshold,
        precision,
        recall,
        f1,
        true_positives: tp,
        false_positives: fp,
        true_negatives: tn,
        false_negatives: fn_,
    }
}

/// Area under the ROC curve via the rank-sum statistic. Ties between a
/// positive and a negative count as half. `None` for a single-class truth.
pub fn roc_auc(scores: &[f64], truth: &[bool]) -> Option<f64> {
    let positives = truth.iter().filter(|t| **t).count();
    let negatives = truth.len() - positives;
    if positives == 0 || negatives == 0 || scores.len() != truth.len() {
        return None;
    }

    let ranks = average_ranks(scores);
    let rank_sum: f64 = ranks
        .iter()
        .zip(truth)
        .filter(|(_, t)| **t)
        .map(|(r, _)| *r)
        .sum();
    let p = positives as f64;
    Some((rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64))
}

/// Checks shared by every evaluation entry point.
fn check_inputs(scores: &[f64], truth: &[bool]) -> Result<(usize, usize)> {
    if scores.len() != truth.len() {
        return Err(VarscoreError::degenerate(format!(
            "score column has {} values but ground truth has {}",
            scores.len(),
            truth.len()
        )));
    }
    let positives = truth.iter().filter(|t| **t).count();
    let negatives = truth.len() - positives;
    if positives == 0 {
        return Err(VarscoreError::degenerate("ground truth has no pathogenic examples"));
    }
    if negatives == 0 {
        return Err(VarscoreError::degenerate("ground truth has no benign examples"));
    }
    Ok((positives, negatives))
}

/// Sweep the candidate thresholds and pick the F1-optimal one.
///
/// Thresholds are evaluated in parallel; results keep the supplied order,
/// and F1 ties resolve to the earliest candidate.
pub fn evaluate_thresholds(scores: &[f64], truth: &[bool], thresholds: &[f64]) -> Result<ThresholdReport> {
    if thresholds.is_empty() {
        return Err(VarscoreError::degenerate("threshold sequence is empty"));
    }
    let (positives, negatives) = check_inputs(scores, truth)?;

    let metrics: Vec<ThresholdMetric> = thresholds
        .par_iter()
        .map(|&t| metric_at(scores, truth, t))
        .collect();

    let mut optimal_index = 0;
    for (i, m) in metrics.iter().enumerate().skip(1) {
        if m.f1 > metrics[optimal_index].f1 {
            optimal_index = i;
        }
    }

    let auc = roc_auc(scores, truth)
        .ok_or_else(|| VarscoreError::degenerate("ROC AUC undefined for single-class truth"))?;

    let best = &metrics[optimal_index];
    info!(
        thresholds = metrics.len(),
        positives,
        negatives,
        optimal_threshold = best.threshold,
        precision = best.precision,
        recall = best.recall,
        f1 = best.f1,
        auc,
        "Threshold sweep complete"
    );

    Ok(ThresholdReport { metrics, optimal_index, auc, positives, negatives })
}

/// Sweep over labelled records.
pub fn evaluate_labelled(labelled: &LabelledScores, thresholds: &[f64]) -> Result<ThresholdReport> {
    evaluate_thresholds(&labelled.scores, &labelled.truth, thresholds)
}

/// Per-record prediction at one threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub variant_id: String,
    pub score: f64,
    pub truth: bool,
    pub predicted: bool,
    pub outcome: Outcome,
}

/// Predict every labelled record at `threshold`.
pub fn predict(labelled: &LabelledScores, threshold: f64) -> Vec<Prediction> {
    labelled
        .ids
        .iter()
        .zip(&labelled.scores)
        .zip(&labelled.truth)
        .map(|((id, &score), &truth)| {
            let predicted = score >= threshold;
            Prediction {
                variant_id: id.clone(),
                score,
                truth,
                predicted,
                outcome: Outcome::of(truth, predicted),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCORES: [f64; 4] = [1.0, 5.0, 9.0, 15.0];
    const TRUTH: [bool; 4] = [false, false, true, true];

    #[test]
    fn test_two_threshold_sweep() {
        let report = evaluate_thresholds(&SCORES, &TRUTH, &[5.0, 10.0]).unwrap();

        let at5 = &report.metrics[0];
        assert_eq!((at5.true_positives, at5.false_positives), (2, 1));
        assert!((at5.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(at5.recall, 1.0);

        let at10 = &report.metrics[1];
        assert_eq!(at10.precision, 1.0);
        assert_eq!(at10.recall, 0.5);

        assert_eq!(report.optimal().threshold, 5.0);
        assert_eq!(report.auc, 1.0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let m = metric_at(&[5.0], &[true], 5.0);
        assert_eq!(m.true_positives, 1);
    }

    #[test]
    fn test_no_positive_predictions_gives_zero_precision() {
        let m = metric_at(&SCORES, &TRUTH, 100.0);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
    }

    #[test]
    fn test_tie_breaks_to_first_candidate() {
        // 6.0 and 8.0 yield identical predictions
        let report = evaluate_thresholds(&SCORES, &TRUTH, &[8.0, 6.0, 20.0]).unwrap();
        assert_eq!(report.optimal_index, 0);
        let report = evaluate_thresholds(&SCORES, &TRUTH, &[6.0, 8.0]).unwrap();
        assert_eq!(report.optimal().threshold, 6.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(matches!(
            evaluate_thresholds(&SCORES, &TRUTH, &[]),
            Err(VarscoreError::DegenerateInput(_))
        ));
        assert!(matches!(
            evaluate_thresholds(&SCORES, &[true; 4], &[5.0]),
            Err(VarscoreError::DegenerateInput(_))
        ));
        assert!(matches!(
            evaluate_thresholds(&SCORES, &[false; 4], &[5.0]),
            Err(VarscoreError::DegenerateInput(_))
        ));
        assert!(matches!(
            evaluate_thresholds(&SCORES, &TRUTH[..3], &[5.0]),
            Err(VarscoreError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_recall_monotone_and_complete_at_neg_infinity() {
        let scores = [0.3, 2.0, 2.0, 7.5, -1.0, 4.4, 9.0, 3.3, 6.1, 0.0];
        let truth = [false, true, false, true, false, false, true, true, false, true];
        let mut thresholds: Vec<f64> = (-4..=20).rev().map(|t| t as f64 * 0.5).collect();
        thresholds.push(f64::NEG_INFINITY);

        let report = evaluate_thresholds(&scores, &truth, &thresholds).unwrap();
        for pair in report.metrics.windows(2) {
            assert!(pair[1].recall >= pair[0].recall);
        }
        let last = report.metrics.last().unwrap();
        assert_eq!(last.recall, 1.0);
        assert!((last.precision - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_precision_non_increasing_on_separable_scores() {
        let scores = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let truth = [false, false, false, true, true, true];
        let thresholds: Vec<f64> = (0..=7).rev().map(f64::from).collect();
        let report = evaluate_thresholds(&scores, &truth, &thresholds).unwrap();
        // skip the leading rows without positive predictions
        let predicted: Vec<&ThresholdMetric> = report
            .metrics
            .iter()
            .filter(|m| m.true_positives + m.false_positives > 0)
            .collect();
        for pair in predicted.windows(2) {
            assert!(pair[1].precision <= pair[0].precision);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let scores: Vec<f64> = (0..200).map(|i| ((i * 37) % 101) as f64 / 7.0).collect();
        let truth: Vec<bool> = (0..200).map(|i| (i * 13) % 5 < 2).collect();
        let thresholds: Vec<f64> = (0..60).map(|t| t as f64 * 0.25).collect();

        let report = evaluate_thresholds(&scores, &truth, &thresholds).unwrap();
        let sequential: Vec<ThresholdMetric> =
            thresholds.iter().map(|&t| metric_at(&scores, &truth, t)).collect();
        assert_eq!(report.metrics, sequential);
    }

    #[test]
    fn test_auc_with_ties() {
        // one positive tied with one negative
        let auc = roc_auc(&[1.0, 2.0, 2.0, 3.0], &[false, false, true, true]).unwrap();
        assert!((auc - 0.875).abs() < 1e-12);
        assert_eq!(roc_auc(&[1.0, 2.0], &[true, true]), None);
    }

    #[test]
    fn test_predict_outcomes() {
        let labelled = LabelledScores {
            ids: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            scores: SCORES.to_vec(),
            truth: TRUTH.to_vec(),
        };
        let outcomes: Vec<Outcome> = predict(&labelled, 10.0).into_iter().map(|p| p.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                Outcome::TrueNegative,
                Outcome::TrueNegative,
                Outcome::FalseNegative,
                Outcome::TruePositive,
            ]
        );
    }
}

//! Analysis pipeline driver.
//!
//! Stage order is fixed: classify → mark controls → compose → evaluate.
//! Each stage writes its derived fields onto the records before the next
//! one reads them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use varscore_common::{AnalysisConfig, GroupLabel, Result, VariantRecord};

use crate::classifier::{mark_controls, ClassificationSummary, ControlSet, GroupClassifier};
use crate::composer::{CompositionSummary, ScoreComposer};
use crate::misclassification::{
    decompose, group_score_statistics, low_scoring_controls, overlap_region, MisclassificationReport,
    RecordProfile,
};
use crate::stats::Distribution;
use crate::threshold::{evaluate_labelled, LabelledScores, ThresholdReport};
use crate::weights::WeightVector;

/// Result of the evaluation stage. A degenerate evaluation does not fail
/// the run; it is reported as skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    Completed {
        sweep: ThresholdReport,
        misclassification: MisclassificationReport,
    },
    Skipped {
        reason: String,
    },
}

impl EvaluationOutcome {
    pub fn sweep(&self) -> Option<&ThresholdReport> {
        match self {
            EvaluationOutcome::Completed { sweep, .. } => Some(sweep),
            EvaluationOutcome::Skipped { .. } => None,
        }
    }
}

/// Everything one run produces besides the augmented records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub records: usize,
    pub classification: ClassificationSummary,
    pub controls_marked: usize,
    pub weights: WeightVector,
    pub composition: CompositionSummary,
    pub evaluation: EvaluationOutcome,
    pub group_statistics: BTreeMap<GroupLabel, Distribution>,
    pub overlap_region: RecordProfile,
    pub low_scoring_controls: RecordProfile,
}

/// One configured analysis run. Built once from the configuration; holds
/// no state between calls to `run`.
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
    classifier: GroupClassifier,
    composer: ScoreComposer,
}

impl AnalysisPipeline {
    /// Validate the configuration and build the stage components.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Self::with_base_weights(config, &WeightVector::default())
    }

    /// As `new`, with weight overrides applied on top of `base`.
    pub fn with_base_weights(config: AnalysisConfig, base: &WeightVector) -> Result<Self> {
        config.validate()?;
        let classifier = GroupClassifier::from_table(&config.labels)?;
        let composer = ScoreComposer::from_config(base, &config)?;
        Ok(Self { config, classifier, composer })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn composer(&self) -> &ScoreComposer {
        &self.composer
    }

    /// Run every stage over `records`, mutating them in place.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn run(&self, records: &mut [VariantRecord], controls: &ControlSet) -> Result<AnalysisReport> {
        let classification = self.classifier.classify(records);
        let controls_marked = mark_controls(records, controls, self.config.controls.relabel_uncertain);
        let composition = self.composer.compose(records);

        let thresholds = self.config.thresholds.expand()?;
        let labelled = LabelledScores::from_records(records);
        let evaluation = match evaluate_labelled(&labelled, &thresholds) {
            Ok(sweep) => {
                let misclassification = decompose(records, sweep.optimal().threshold);
                EvaluationOutcome::Completed { sweep, misclassification }
            }
            Err(e) if !e.is_fatal_to_run() => {
                warn!(error = %e, "Threshold evaluation skipped");
                EvaluationOutcome::Skipped { reason: e.to_string() }
            }
            Err(e) => return Err(e),
        };

        let window = &self.config.analysis;
        let report = AnalysisReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            records: records.len(),
            classification,
            controls_marked,
            weights: self.composer.weights().clone(),
            composition,
            evaluation,
            group_statistics: group_score_statistics(records),
            overlap_region: overlap_region(records, window.overlap_lower, window.overlap_upper),
            low_scoring_controls: low_scoring_controls(records, window.low_control_threshold),
        };

        info!(
            run_id = %report.run_id,
            controls = report.controls_marked,
            composed = report.composition.composed,
            evaluated = report.evaluation.sweep().is_some(),
            "Analysis run complete"
        );
        Ok(report)
    }
}

/// Convenience wrapper: build the pipeline from `config` and run it once.
pub fn run_analysis(
    records: &mut [VariantRecord],
    config: &AnalysisConfig,
    controls: &ControlSet,
) -> Result<AnalysisReport> {
    AnalysisPipeline::new(config.clone())?.run(records, controls)
}

//! varscore-ranker — Variant grouping, composite scoring and threshold evaluation.
//!
//! Stages run in a fixed order: `classifier` assigns groups and control
//! flags, `composer` recomputes the composite score, `threshold` sweeps
//! cutoffs and `misclassification` explains the errors at the optimum.
//! `pipeline` wires them together for one run.

pub mod classifier;
pub mod composer;
pub mod misclassification;
pub mod pipeline;
pub mod stats;
pub mod threshold;
pub mod weights;

pub use classifier::{ControlSet, GroupClassifier, LabelMapping};
pub use composer::{ComponentTransform, ScoreComposer};
pub use pipeline::{run_analysis, AnalysisPipeline, AnalysisReport, EvaluationOutcome};
pub use threshold::{evaluate_thresholds, ThresholdMetric, ThresholdReport};
pub use weights::WeightVector;

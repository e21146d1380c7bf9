//! Shared fixtures for varscore tests.

use std::collections::BTreeMap;
use std::sync::Once;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use varscore_common::{AnalysisConfig, FeatureScores, GroupLabel, ThresholdSweep, VariantRecord};

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per process. `RUST_LOG` controls the level.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Builder for `VariantRecord` with sensible defaults.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: VariantRecord,
}

impl RecordBuilder {
    pub fn new(chrom: &str, pos: u64) -> Self {
        Self::with_alleles(chrom, pos, "A", "G")
    }

    pub fn with_alleles(chrom: &str, pos: u64, reference: &str, alternate: &str) -> Self {
        Self {
            record: VariantRecord::new(chrom, pos, reference, alternate),
        }
    }

    pub fn gene(mut self, gene: &str) -> Self {
        self.record.gene = gene.to_string();
        self
    }

    pub fn clnsig(mut self, raw: &str) -> Self {
        self.record.clinical_significance = raw.to_string();
        self
    }

    pub fn impact(mut self, impact: &str, consequence: &str) -> Self {
        self.record.impact = impact.to_string();
        self.record.consequence = consequence.to_string();
        self
    }

    pub fn features(mut self, features: FeatureScores) -> Self {
        self.record.features = features;
        self
    }

    pub fn rank_score(mut self, score: f64) -> Self {
        self.record.rank_score = Some(score);
        self
    }

    pub fn composite(mut self, score: f64) -> Self {
        self.record.set_composite(Some(score));
        self
    }

    /// Composed but left without a composite, as when a component is missing.
    pub fn incomplete(mut self) -> Self {
        self.record.set_composite(None);
        self
    }

    pub fn group(mut self, group: GroupLabel) -> Self {
        self.record.group = Some(group);
        self
    }

    pub fn build(self) -> VariantRecord {
        self.record
    }
}

/// Label table with the benign/pathogenic/uncertain groups commonly used in tests.
pub fn default_labels() -> BTreeMap<String, Vec<String>> {
    let mut labels = BTreeMap::new();
    labels.insert(
        "benign".to_string(),
        vec!["Benign".to_string(), "Likely_benign".to_string()],
    );
    labels.insert(
        "pathogenic".to_string(),
        vec!["Pathogenic".to_string(), "Likely_pathogenic".to_string()],
    );
    labels.insert(
        "uncertain".to_string(),
        vec!["Uncertain_significance".to_string()],
    );
    labels
}

/// Default configuration with `default_labels` and an integer sweep 0..=20.
pub fn default_config() -> AnalysisConfig {
    AnalysisConfig {
        labels: default_labels(),
        thresholds: ThresholdSweep::Range { start: 0.0, stop: 20.0, step: 1.0 },
        ..AnalysisConfig::default()
    }
}

/// Five records with labels Benign, Pathogenic, Likely_benign,
/// Likely_pathogenic and not_reported.
pub fn labelled_records() -> Vec<VariantRecord> {
    ["Benign", "Pathogenic", "Likely_benign", "Likely_pathogenic", "not_reported"]
        .iter()
        .enumerate()
        .map(|(i, raw)| RecordBuilder::new("1", 1000 + i as u64).clnsig(raw).build())
        .collect()
}

/// A mixed cohort with complete features: benign records score low,
/// pathogenic ones high, with some overlap in the middle.
pub fn cohort(n_per_class: usize, seed: u64) -> Vec<VariantRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = Vec::with_capacity(n_per_class * 3);
    let mut pos = 10_000u64;

    for (raw, centre) in [("Benign", 4.0), ("Pathogenic", 14.0), ("Uncertain_significance", 9.0)] {
        for i in 0..n_per_class {
            pos += 17;
            let jitter = |rng: &mut StdRng| rng.gen_range(-1.5..1.5);
            let base = centre / 6.0;
            let features = FeatureScores::complete(
                base + jitter(&mut rng),
                base + jitter(&mut rng),
                base + jitter(&mut rng),
                base,
                0.0,
                base + jitter(&mut rng),
            );
            records.push(
                RecordBuilder::new(if i % 2 == 0 { "13" } else { "17" }, pos)
                    .gene(if i % 3 == 0 { "BRCA2" } else { "TP53" })
                    .impact("MODERATE", "missense_variant")
                    .clnsig(raw)
                    .features(features)
                    .build(),
            );
        }
    }
    records
}

/// Deterministic shuffle.
pub fn shuffled<T: Clone>(items: &[T], seed: u64) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(&mut StdRng::seed_from_u64(seed));
    out
}

//! Per-gene roll-up of variant scores.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use varscore_common::VariantRecord;

/// Aggregated impact of all variants attributed to one gene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneSummary {
    pub gene: String,
    /// Sum of scores over scored variants
    pub total_score: f64,
    /// Highest score; `None` when no variant of the gene carries a score
    pub max_score: Option<f64>,
    /// Variants that contributed to the numeric aggregates
    pub n_variants: usize,
    /// Variants skipped from the numeric aggregates (missing score)
    pub n_unscored: usize,
    pub impact_levels: BTreeSet<String>,
    pub consequences: BTreeSet<String>,
    /// Filled in by pathway mapping
    #[serde(default)]
    pub pathways: Vec<String>,
}

impl GeneSummary {
    pub fn new(gene: impl Into<String>) -> Self {
        Self {
            gene: gene.into(),
            total_score: 0.0,
            max_score: None,
            n_variants: 0,
            n_unscored: 0,
            impact_levels: BTreeSet::new(),
            consequences: BTreeSet::new(),
            pathways: Vec::new(),
        }
    }

    fn add(&mut self, record: &VariantRecord) {
        match record.score() {
            Some(score) => {
                self.total_score += score;
                self.max_score = Some(self.max_score.map_or(score, |m| m.max(score)));
                self.n_variants += 1;
            }
            None => self.n_unscored += 1,
        }
        if !record.impact.is_empty() {
            self.impact_levels.insert(record.impact.clone());
        }
        if !record.consequence.is_empty() {
            self.consequences.insert(record.consequence.clone());
        }
    }

    /// Mean score over scored variants.
    pub fn mean_score(&self) -> Option<f64> {
        (self.n_variants > 0).then(|| self.total_score / self.n_variants as f64)
    }
}

/// Group records by gene symbol.
///
/// Records without a gene symbol are left out entirely. Records without a
/// usable score still count towards the gene's impact and consequence sets
/// but not towards total, max or `n_variants`.
pub fn aggregate_by_gene(records: &[VariantRecord]) -> BTreeMap<String, GeneSummary> {
    let mut genes: BTreeMap<String, GeneSummary> = BTreeMap::new();
    let mut unattributed = 0usize;

    for record in records {
        let Some(gene) = record.gene_symbol() else {
            unattributed += 1;
            continue;
        };
        genes
            .entry(gene.to_string())
            .or_insert_with(|| GeneSummary::new(gene))
            .add(record);
    }

    if unattributed > 0 {
        debug!(unattributed, "Records without gene symbol excluded from aggregation");
    }
    let unscored: usize = genes.values().map(|g| g.n_unscored).sum();
    info!(genes = genes.len(), records = records.len(), unscored, "Gene aggregation complete");
    genes
}

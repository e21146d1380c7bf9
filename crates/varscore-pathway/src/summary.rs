//! Pathway-level roll-up of gene summaries.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregator::GeneSummary;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathwaySummary {
    /// Sum of member gene totals
    pub total_score: f64,
    pub max_score: Option<f64>,
    pub n_variants: usize,
    pub genes: BTreeSet<String>,
}

/// Roll gene summaries up into pathways using each gene's attached
/// `pathways`. A gene in several pathways contributes to each of them.
/// Genes without pathways are not represented.
pub fn summarize_pathways(genes: &BTreeMap<String, GeneSummary>) -> BTreeMap<String, PathwaySummary> {
    let mut pathways: BTreeMap<String, PathwaySummary> = BTreeMap::new();

    for summary in genes.values() {
        for pathway in &summary.pathways {
            let entry = pathways.entry(pathway.clone()).or_default();
            entry.total_score += summary.total_score;
            entry.n_variants += summary.n_variants;
            if let Some(m) = summary.max_score {
                entry.max_score = Some(entry.max_score.map_or(m, |cur| cur.max(m)));
            }
            entry.genes.insert(summary.gene.clone());
        }
    }

    info!(pathways = pathways.len(), genes = genes.len(), "Pathway summary built");
    pathways
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gene(name: &str, total: f64, max: Option<f64>, n: usize, pathways: &[&str]) -> (String, GeneSummary) {
        let mut g = GeneSummary::new(name);
        g.total_score = total;
        g.max_score = max;
        g.n_variants = n;
        g.pathways = pathways.iter().map(|p| p.to_string()).collect();
        (name.to_string(), g)
    }

    #[test]
    fn test_gene_counts_towards_each_pathway() {
        let genes: BTreeMap<_, _> = [
            gene("TP53", 17.5, Some(10.0), 2, &["apoptosis", "cell_cycle"]),
            gene("CDKN2A", 4.0, Some(4.0), 1, &["cell_cycle"]),
            gene("OR4F5", 1.0, Some(1.0), 1, &[]),
        ]
        .into_iter()
        .collect();

        let pathways = summarize_pathways(&genes);
        assert_eq!(pathways.len(), 2);

        let cell_cycle = &pathways["cell_cycle"];
        assert_eq!(cell_cycle.total_score, 21.5);
        assert_eq!(cell_cycle.max_score, Some(10.0));
        assert_eq!(cell_cycle.n_variants, 3);
        assert_eq!(
            cell_cycle.genes.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["CDKN2A", "TP53"]
        );

        assert_eq!(pathways["apoptosis"].total_score, 17.5);
    }

    #[test]
    fn test_unscored_gene_keeps_pathway_membership() {
        let genes: BTreeMap<_, _> = [gene("BRCA1", 0.0, None, 0, &["dna_repair"])].into_iter().collect();
        let dna_repair = &summarize_pathways(&genes)["dna_repair"];
        assert_eq!(dna_repair.max_score, None);
        assert!(dna_repair.genes.contains("BRCA1"));
    }
}

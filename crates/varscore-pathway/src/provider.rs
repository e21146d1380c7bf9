//! Gene → pathway lookup.
//!
//! Aggregation only needs to ask "which pathways is this gene in", so the
//! source of the mapping sits behind a trait. `PathwayMap` is the
//! file-backed table; `MockPathwayProvider` is for tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;
use varscore_common::Result;

use crate::aggregator::GeneSummary;

/// Source of gene-to-pathway membership.
pub trait PathwayProvider: Send + Sync {
    /// Pathways containing `gene`, sorted and de-duplicated.
    /// Empty when the gene is not mapped.
    fn pathways_for(&self, gene: &str) -> Vec<String>;

    /// Whether the provider knows the gene at all.
    fn has_gene(&self, gene: &str) -> bool {
        !self.pathways_for(gene).is_empty()
    }
}

/// In-memory gene → pathways table, as read from a JSON object
/// `{ "GENE": ["pathway", ...], ... }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathwayMap {
    genes: HashMap<String, BTreeSet<String>>,
}

impl PathwayMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(json)?;
        let map: Self = raw.into_iter().collect();
        debug!(genes = map.len(), "Pathway map parsed");
        Ok(map)
    }

    pub fn insert(&mut self, gene: &str, pathway: &str) {
        let gene = gene.trim();
        let pathway = pathway.trim();
        if gene.is_empty() || pathway.is_empty() {
            return;
        }
        self.genes
            .entry(gene.to_string())
            .or_default()
            .insert(pathway.to_string());
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for PathwayMap {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (gene, pathways) in iter {
            for pathway in &pathways {
                map.insert(&gene, pathway);
            }
        }
        map
    }
}

impl PathwayProvider for PathwayMap {
    fn pathways_for(&self, gene: &str) -> Vec<String> {
        self.genes
            .get(gene)
            .map(|p| p.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn has_gene(&self, gene: &str) -> bool {
        self.genes.contains_key(gene)
    }
}

// ── Mock Implementation for Testing ────────────────────────────────────────

/// Builder-style provider with hardcoded memberships.
#[derive(Debug, Default)]
pub struct MockPathwayProvider {
    data: BTreeMap<String, BTreeSet<String>>,
}

impl MockPathwayProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one gene-pathway membership.
    pub fn with(mut self, gene: &str, pathway: &str) -> Self {
        self.data
            .entry(gene.to_string())
            .or_default()
            .insert(pathway.to_string());
        self
    }
}

impl PathwayProvider for MockPathwayProvider {
    fn pathways_for(&self, gene: &str) -> Vec<String> {
        self.data
            .get(gene)
            .map(|p| p.iter().cloned().collect())
            .unwrap_or_default()
    }
}

// ── Attachment ─────────────────────────────────────────────────────────────

/// Fill `pathways` on every gene summary from `provider`. Returns the number
/// of genes that received at least one pathway.
pub fn attach_pathways(
    genes: &mut BTreeMap<String, GeneSummary>,
    provider: &dyn PathwayProvider,
) -> usize {
    let mut mapped = 0;
    for (gene, summary) in genes.iter_mut() {
        summary.pathways = provider.pathways_for(gene);
        if !summary.pathways.is_empty() {
            mapped += 1;
        }
    }
    debug!(genes = genes.len(), mapped, "Pathways attached");
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider() {
        let provider = MockPathwayProvider::new()
            .with("TP53", "apoptosis")
            .with("TP53", "cell_cycle")
            .with("KRAS", "mapk_signaling");

        assert_eq!(provider.pathways_for("TP53"), vec!["apoptosis", "cell_cycle"]);
        assert!(provider.has_gene("KRAS"));
        assert!(!provider.has_gene("MYC"));
        assert!(provider.pathways_for("MYC").is_empty());
    }

    #[test]
    fn test_map_from_json_dedups_and_sorts() {
        let map = PathwayMap::from_json_str(
            r#"{"BRCA1": ["dna_repair", "homologous_recombination", "dna_repair"], "EMPTY": []}"#,
        )
        .unwrap();
        assert_eq!(map.pathways_for("BRCA1"), vec!["dna_repair", "homologous_recombination"]);
        assert!(!map.has_gene("EMPTY"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_map_rejects_malformed_json() {
        assert!(PathwayMap::from_json_str(r#"{"BRCA1": "dna_repair"}"#).is_err());
    }

    #[test]
    fn test_attach_pathways() {
        let mut genes = BTreeMap::new();
        genes.insert("TP53".to_string(), GeneSummary::new("TP53"));
        genes.insert("OR4F5".to_string(), GeneSummary::new("OR4F5"));

        let provider = MockPathwayProvider::new().with("TP53", "apoptosis");
        assert_eq!(attach_pathways(&mut genes, &provider), 1);
        assert_eq!(genes["TP53"].pathways, vec!["apoptosis"]);
        assert!(genes["OR4F5"].pathways.is_empty());
    }
}

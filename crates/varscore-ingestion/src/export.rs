//! Writers for run outputs.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tracing::info;
use varscore_common::{Result, VariantRecord};
use varscore_pathway::{GeneSummary, PathwaySummary};
use varscore_ranker::ThresholdMetric;

use crate::variants::delimiter_for;

#[derive(Serialize)]
struct AugmentedRow<'a> {
    #[serde(rename = "CHROM")]
    chrom: &'a str,
    #[serde(rename = "POS")]
    pos: u64,
    #[serde(rename = "REF")]
    reference: &'a str,
    #[serde(rename = "ALT")]
    alternate: &'a str,
    #[serde(rename = "GENE")]
    gene: &'a str,
    #[serde(rename = "CONSEQUENCE")]
    consequence: &'a str,
    #[serde(rename = "IMPACT")]
    impact: &'a str,
    #[serde(rename = "AF")]
    af: Option<f64>,
    #[serde(rename = "PP")]
    pp: Option<f64>,
    #[serde(rename = "CON")]
    con: Option<f64>,
    #[serde(rename = "VCQF")]
    vcqf: Option<f64>,
    #[serde(rename = "LIN")]
    lin: Option<f64>,
    #[serde(rename = "CLIN")]
    clin: Option<f64>,
    #[serde(rename = "CLNSIG")]
    clnsig: &'a str,
    #[serde(rename = "RANK_SCORE")]
    rank_score: Option<f64>,
    #[serde(rename = "GROUP")]
    group: &'a str,
    #[serde(rename = "IS_CONTROL")]
    is_control: bool,
    #[serde(rename = "COMPOSITE_SCORE")]
    composite_score: Option<f64>,
}

impl<'a> From<&'a VariantRecord> for AugmentedRow<'a> {
    fn from(v: &'a VariantRecord) -> Self {
        let f = &v.features;
        Self {
            chrom: v.chrom(),
            pos: v.pos(),
            reference: v.reference(),
            alternate: v.alternate(),
            gene: &v.gene,
            consequence: &v.consequence,
            impact: &v.impact,
            af: f.allele_frequency,
            pp: f.protein_prediction,
            con: f.consequence,
            vcqf: f.call_quality,
            lin: f.linkage,
            clin: f.clinical_significance,
            clnsig: &v.clinical_significance,
            rank_score: v.rank_score,
            group: v.group.map(|g| g.as_str()).unwrap_or_default(),
            is_control: v.is_control,
            composite_score: v.composite_score,
        }
    }
}

fn create(path: &Path, what: &str) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {what}: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Write records with their derived fields. Delimiter follows the file extension.
pub fn write_variants(path: impl AsRef<Path>, records: &[VariantRecord]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter_for(path))
        .from_writer(create(path, "variant table")?);
    for record in records {
        writer.serialize(AugmentedRow::from(record))?;
    }
    writer.flush()?;
    info!(records = records.len(), path = %path.display(), "Augmented variant table written");
    Ok(())
}

/// Write the threshold sweep as CSV.
pub fn write_metrics(path: impl AsRef<Path>, metrics: &[ThresholdMetric]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_writer(create(path, "metrics table")?);
    for metric in metrics {
        writer.serialize(metric)?;
    }
    writer.flush()?;
    info!(thresholds = metrics.len(), path = %path.display(), "Threshold metrics written");
    Ok(())
}

/// Write any serializable value as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    let mut writer = create(path, "JSON output")?;
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn write_gene_summaries(path: impl AsRef<Path>, genes: &BTreeMap<String, GeneSummary>) -> Result<()> {
    write_json(&path, genes)?;
    info!(genes = genes.len(), path = %path.as_ref().display(), "Gene summaries written");
    Ok(())
}

pub fn write_pathway_summaries(
    path: impl AsRef<Path>,
    pathways: &BTreeMap<String, PathwaySummary>,
) -> Result<()> {
    write_json(&path, pathways)?;
    info!(pathways = pathways.len(), path = %path.as_ref().display(), "Pathway summaries written");
    Ok(())
}

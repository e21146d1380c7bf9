//! Variant table reader.
//!
//! Delimited text with a header row. Identity comes either from the
//! `CHROM`/`POS`/`REF`/`ALT` columns or from a single `VARIANT` column
//! (`chrom_pos_ref_alt`). Unknown columns are ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};
use varscore_common::{FeatureComponent, FeatureScores, Result, VariantRecord};

/// Chromosome may itself contain underscores (e.g. unplaced contigs), so
/// it is matched greedily and the last three fields are anchored.
const VARIANT_ID_PATTERN: &str = r"^(.+)_(\d+)_([^_]+)_([^_]+)$";

/// Cells treated as deliberately empty rather than malformed.
const MISSING_MARKERS: [&str; 4] = [".", "NA", "N/A", "-"];

#[derive(Debug, Default, Deserialize)]
struct VariantRow {
    #[serde(rename = "VARIANT", default)]
    variant: Option<String>,
    #[serde(rename = "CHROM", default)]
    chrom: Option<String>,
    #[serde(rename = "POS", default)]
    pos: Option<String>,
    #[serde(rename = "REF", default)]
    reference: Option<String>,
    #[serde(rename = "ALT", default)]
    alternate: Option<String>,
    #[serde(rename = "GENE", default)]
    gene: Option<String>,
    #[serde(rename = "CONSEQUENCE", default)]
    consequence: Option<String>,
    #[serde(rename = "IMPACT", default)]
    impact: Option<String>,
    #[serde(rename = "AF", default)]
    af: Option<String>,
    #[serde(rename = "PP", default)]
    pp: Option<String>,
    #[serde(rename = "CON", default)]
    con: Option<String>,
    #[serde(rename = "VCQF", default)]
    vcqf: Option<String>,
    #[serde(rename = "LIN", default)]
    lin: Option<String>,
    #[serde(rename = "CLIN", default)]
    clin: Option<String>,
    #[serde(rename = "CLNSIG", default)]
    clnsig: Option<String>,
    #[serde(rename = "RANK_SCORE", default)]
    rank_score: Option<String>,
}

/// Delimiter implied by a file name: comma for `.csv`, tab otherwise.
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => b'\t',
    }
}

/// Read a variant table from disk.
pub fn read_variants(path: impl AsRef<Path>) -> Result<Vec<VariantRecord>> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Loading variant table");
    let file = File::open(path).with_context(|| format!("Failed to open variant table: {}", path.display()))?;
    let records = read_variants_from_reader(file, delimiter_for(path))
        .with_context(|| format!("Failed to parse variant table: {}", path.display()))?;
    Ok(records)
}

/// Read a variant table from any reader.
pub fn read_variants_from_reader<R: Read>(reader: R, delimiter: u8) -> anyhow::Result<Vec<VariantRecord>> {
    let id_pattern = Regex::new(VARIANT_ID_PATTERN)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let has_variant_column = headers.iter().any(|h| h == "VARIANT");
    let has_identity_columns = ["CHROM", "POS"].iter().all(|c| headers.iter().any(|h| h == *c));
    if !has_variant_column && !has_identity_columns {
        return Err(anyhow!("variant table needs either a VARIANT column or CHROM and POS columns"));
    }

    let mut records = Vec::new();
    let mut malformed_cells = 0usize;

    for (i, row) in reader.deserialize::<VariantRow>().enumerate() {
        // header is line 1
        let line = i + 2;
        let row = row.with_context(|| format!("line {line}"))?;
        let mut record = identity(&row, &id_pattern).with_context(|| format!("line {line}"))?;

        record.gene = row.gene.unwrap_or_default();
        record.consequence = row.consequence.unwrap_or_default();
        record.impact = row.impact.unwrap_or_default();
        record.clinical_significance = row.clnsig.unwrap_or_default();

        let cells = [
            (FeatureComponent::AlleleFrequency, row.af),
            (FeatureComponent::ProteinPrediction, row.pp),
            (FeatureComponent::Consequence, row.con),
            (FeatureComponent::CallQuality, row.vcqf),
            (FeatureComponent::Linkage, row.lin),
            (FeatureComponent::ClinicalSignificance, row.clin),
        ];
        let mut features = FeatureScores::default();
        for (component, cell) in cells {
            let (value, malformed) = parse_numeric(cell.as_deref(), component.code(), line);
            malformed_cells += malformed as usize;
            features.set(component, value);
        }
        record.features = features;

        let (rank_score, malformed) = parse_numeric(row.rank_score.as_deref(), "RANK_SCORE", line);
        malformed_cells += malformed as usize;
        record.rank_score = rank_score;

        records.push(record);
    }

    info!(records = records.len(), malformed_cells, "Variant table loaded");
    Ok(records)
}

fn identity(row: &VariantRow, id_pattern: &Regex) -> anyhow::Result<VariantRecord> {
    if let Some(id) = row.variant.as_deref().filter(|s| !s.is_empty()) {
        let caps = id_pattern
            .captures(id)
            .ok_or_else(|| anyhow!("VARIANT '{id}' is not of the form chrom_pos_ref_alt"))?;
        let pos: u64 = caps[2].parse().with_context(|| format!("position out of range in '{id}'"))?;
        return Ok(VariantRecord::new(&caps[1], pos, &caps[3], &caps[4]));
    }

    let chrom = row
        .chrom
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("missing CHROM"))?;
    let pos_raw = row.pos.as_deref().ok_or_else(|| anyhow!("missing POS"))?;
    let pos: u64 = pos_raw
        .parse()
        .with_context(|| format!("POS '{pos_raw}' is not a position"))?;
    Ok(VariantRecord::new(
        chrom,
        pos,
        row.reference.as_deref().unwrap_or_default(),
        row.alternate.as_deref().unwrap_or_default(),
    ))
}

/// Parse one numeric cell. Returns the value and whether the cell was
/// malformed (present but not a finite number).
fn parse_numeric(cell: Option<&str>, column: &str, line: usize) -> (Option<f64>, bool) {
    let Some(raw) = cell.filter(|s| !s.is_empty() && !MISSING_MARKERS.contains(s)) else {
        return (None, false);
    };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => (Some(v), false),
        _ => {
            warn!(line, column, value = raw, "Non-numeric score cell treated as missing");
            (None, true)
        }
    }
}

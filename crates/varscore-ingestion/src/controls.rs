//! Positive-control key set reader.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};
use varscore_common::{Result, VarscoreError};
use varscore_ranker::ControlSet;

enum KeyColumns {
    Joined(usize),
    Split { chrom: usize, pos: usize },
}

/// Read a tab-separated control file with either a `chrom_pos` column or
/// separate `chrom` and `pos` columns (header names are case-insensitive).
pub fn read_controls(path: impl AsRef<Path>) -> Result<ControlSet> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Loading control set");
    let file = File::open(path).with_context(|| format!("Failed to open control file: {}", path.display()))?;
    read_controls_from_reader(file)
}

pub fn read_controls_from_reader<R: Read>(reader: R) -> Result<ControlSet> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let columns = match (find("chrom_pos"), find("chrom"), find("pos")) {
        (Some(i), _, _) => KeyColumns::Joined(i),
        (None, Some(chrom), Some(pos)) => KeyColumns::Split { chrom, pos },
        _ => {
            return Err(VarscoreError::config(
                "control file needs a chrom_pos column or chrom and pos columns",
            ))
        }
    };

    let mut keys = Vec::new();
    for row in reader.records() {
        let row = row?;
        let key = match columns {
            KeyColumns::Joined(i) => row.get(i).map(str::to_string),
            KeyColumns::Split { chrom, pos } => match (row.get(chrom), row.get(pos)) {
                (Some(c), Some(p)) if !c.is_empty() && !p.is_empty() => Some(format!("{c}_{p}")),
                _ => None,
            },
        };
        if let Some(key) = key.filter(|k| !k.is_empty()) {
            keys.push(key);
        }
    }

    let controls = ControlSet::new(keys)?;
    info!(controls = controls.len(), "Control set loaded");
    Ok(controls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_column() {
        let tsv = "gene\tchrom_pos\nTP53\t17_7579472\nBRCA1\t17_41276045\n\t\n";
        let controls = read_controls_from_reader(tsv.as_bytes()).unwrap();
        assert_eq!(controls.len(), 2);
        assert!(controls.contains("17_7579472"));
    }

    #[test]
    fn test_split_columns() {
        let tsv = "CHROM\tPOS\n13\t32914438\nX\t100\n";
        let controls = read_controls_from_reader(tsv.as_bytes()).unwrap();
        assert!(controls.contains("13_32914438"));
        assert!(controls.contains("X_100"));
    }

    #[test]
    fn test_missing_key_columns_is_config_error() {
        let err = read_controls_from_reader("gene\nTP53\n".as_bytes()).unwrap_err();
        assert!(matches!(err, VarscoreError::Configuration(_)));
    }

    #[test]
    fn test_empty_set_is_config_error() {
        let err = read_controls_from_reader("chrom_pos\n".as_bytes()).unwrap_err();
        assert!(matches!(err, VarscoreError::Configuration(_)));
    }
}

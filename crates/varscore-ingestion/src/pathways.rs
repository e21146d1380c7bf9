//! Gene-to-pathway JSON reader.

use std::path::Path;

use anyhow::Context;
use tracing::info;
use varscore_common::Result;
use varscore_pathway::PathwayMap;

/// Read a JSON object `{ "GENE": ["pathway", ...] }` into a `PathwayMap`.
pub fn read_pathway_map(path: impl AsRef<Path>) -> Result<PathwayMap> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pathway map: {}", path.display()))?;
    let map = PathwayMap::from_json_str(&content)?;
    info!(genes = map.len(), path = %path.display(), "Pathway map loaded");
    Ok(map)
}

//! varscore-ingestion — Boundary readers and writers.
//!
//! Everything that touches the filesystem lives here; the ranker and
//! pathway crates only see in-memory records and maps.

pub mod controls;
pub mod export;
pub mod pathways;
pub mod variants;

pub use controls::read_controls;
pub use export::{write_gene_summaries, write_json, write_metrics, write_pathway_summaries, write_variants};
pub use pathways::read_pathway_map;
pub use variants::read_variants;

//! varscore-pathway — Gene and pathway aggregation of scored variants.
//!
//! # Example
//!
//! ```rust
//! use varscore_common::VariantRecord;
//! use varscore_pathway::{aggregate_by_gene, attach_pathways, summarize_pathways, MockPathwayProvider};
//!
//! let mut v = VariantRecord::new("17", 7_579_472, "G", "C");
//! v.gene = "TP53".into();
//! v.rank_score = Some(10.0);
//!
//! let mut genes = aggregate_by_gene(&[v]);
//! let provider = MockPathwayProvider::new().with("TP53", "apoptosis");
//! attach_pathways(&mut genes, &provider);
//!
//! let pathways = summarize_pathways(&genes);
//! assert_eq!(pathways["apoptosis"].total_score, 10.0);
//! ```

pub mod aggregator;
pub mod provider;
pub mod summary;

pub use aggregator::{aggregate_by_gene, GeneSummary};
pub use provider::{attach_pathways, MockPathwayProvider, PathwayMap, PathwayProvider};
pub use summary::{summarize_pathways, PathwaySummary};

//! varscore-common — Shared record model, configuration and errors used across all varscore crates.

pub mod error;
pub mod variant;
pub mod analysis_config;

// Re-export commonly used types
pub use analysis_config::{AnalysisConfig, CompositionConfig, ControlNeutralisation, ThresholdSweep, WeightConfig};
pub use error::{Result, VarscoreError};
pub use variant::{FeatureComponent, FeatureScores, GroupLabel, VariantRecord};

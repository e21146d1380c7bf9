use thiserror::Error;

#[derive(Debug, Error)]
pub enum VarscoreError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VarscoreError {
    pub fn config(msg: impl Into<String>) -> Self {
        VarscoreError::Configuration(msg.into())
    }

    pub fn degenerate(msg: impl Into<String>) -> Self {
        VarscoreError::DegenerateInput(msg.into())
    }

    /// True for errors that abort the whole analysis run.
    pub fn is_fatal_to_run(&self) -> bool {
        !matches!(self, VarscoreError::DegenerateInput(_))
    }
}

pub type Result<T> = std::result::Result<T, VarscoreError>;

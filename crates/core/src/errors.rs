use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog at line {line}: {source}")]
    Parse { line: u64, source: csv::Error },
    #[error("catalog is missing the price column `{0}`")]
    MissingPriceColumn(String),
    #[error("invalid price `{value}` at line {line}")]
    InvalidPrice { line: u64, value: String },
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("could not read artifact `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse artifact `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("feature schema is empty")]
    EmptySchema,
    #[error("malformed model artifact: {0}")]
    MalformedModel(String),
    #[error("model expects {model_dim} features but the schema has {schema_len}")]
    SchemaMismatch { model_dim: usize, schema_len: usize },
}

/// Failures that abort initialization. No request is served after one of these.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl StartupError {
    /// Stable class name used in structured command output.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_validation",
            Self::Catalog(_) => "catalog_load",
            Self::Artifact(ArtifactError::SchemaMismatch { .. }) => "schema_mismatch",
            Self::Artifact(_) => "artifact_load",
        }
    }
}

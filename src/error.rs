//! Error handling for the assessment recommender

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Catalog and embedding index disagree. Never user-facing.
    #[error("Data inconsistency: {0}")]
    DataInconsistency(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

impl RecommenderError {
    /// True for failures caused by the caller's request rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RecommenderError::InvalidRequest(_) | RecommenderError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, RecommenderError>;

/// Convert anyhow errors (raised by the Model2Vec loader) to our error type,
/// keeping the full context chain
impl From<anyhow::Error> for RecommenderError {
    fn from(err: anyhow::Error) -> Self {
        RecommenderError::ModelError(format!("{:#}", err))
    }
}

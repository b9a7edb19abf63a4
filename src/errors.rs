use thiserror::Error;

/// Errors surfaced by the ingestion pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] law_parser::Error),

    #[error(transparent)]
    Chunk(#[from] law_chunker::ChunkError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid arguments: {0}")]
    Usage(String),
}

impl PipelineError {
    /// Stable machine-readable discriminator, mirroring the chunker's
    /// failure taxonomy.
    pub fn reason(&self) -> &'static str {
        match self {
            PipelineError::Io(_) => "IO",
            PipelineError::Parse(e) => e.reason(),
            PipelineError::Chunk(e) => e.reason(),
            PipelineError::Json(_) => "JSON",
            PipelineError::Usage(_) => "USAGE",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

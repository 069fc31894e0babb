use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Lead '{name}' is missing required field '{field}'")]
    InvalidLead { name: String, field: &'static str },

    #[error("Duplicate lead name '{name}' — lead names are the join key and must be unique within a run")]
    DuplicateLead { name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

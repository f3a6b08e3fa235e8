use thiserror::Error;

pub type Result<T> = std::result::Result<T, CrmError>;

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Pipeline not found: {0}")]
    PipelineNotFound(String),

    #[error("Todo not found: {0}")]
    TodoNotFound(String),

    #[error("Board not initialized")]
    BoardNotInitialized,

    #[error("Pipeline {id} still contains {cards} card(s). Move them first.")]
    PipelineNotEmpty { id: String, cards: usize },

    #[error("Invalid pipeline name: {0:?}")]
    InvalidPipelineName(String),

    #[error("Invalid color '{0}', expected #RRGGBB")]
    InvalidColor(String),

    #[error("Invalid probability {0}, expected 0..=100")]
    InvalidProbability(u8),

    #[error("Invalid ID: {0:?}")]
    InvalidId(String),

    #[error("Board invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

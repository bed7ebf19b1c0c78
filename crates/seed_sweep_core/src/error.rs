use thiserror::Error;

/// Rejection of an inbound start request before a job identifier is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failures that can occur while dispatching one job.
///
/// `UnsupportedPrng` and `QueueCreation` abort the job. The remaining variants
/// are reported and logged but never stop a dispatch that already started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unsupported prng: {0}")]
    UnsupportedPrng(String),

    #[error("failed to create queue '{queue_name}': {message}")]
    QueueCreation { queue_name: String, message: String },

    #[error("failed to publish batch {batch_index}: {message}")]
    BatchPublish { batch_index: usize, message: String },

    #[error("failed to write summary '{key}': {message}")]
    SummaryWrite { key: String, message: String },

    #[error("failed to serialize block: {0}")]
    Serialization(String),
}

impl DispatchError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedPrng(_) => "unsupported_prng",
            Self::QueueCreation { .. } => "queue_creation_failed",
            Self::BatchPublish { .. } => "batch_publish_failed",
            Self::SummaryWrite { .. } => "summary_write_failed",
            Self::Serialization(_) => "serialization_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown dedup token mode '{0}', expected 'random' or 'deterministic'")]
    UnknownTokenMode(String),
}

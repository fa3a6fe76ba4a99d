use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Error, Debug)]
pub enum DashboardError {
    /// No artifact backs the requested model size.
    #[error("no topic model with {num_topics} topics was loaded")]
    DataNotFound { num_topics: usize },

    /// The joinable tables disagree with each other.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("unknown model: {num_topics} topics")]
    UnknownModel { num_topics: usize },

    #[error("topic index {topic_index} is out of range for a {num_topics}-topic model")]
    UnknownTopic { topic_index: usize, num_topics: usize },

    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("invalid artifact {}: {message}", .path.display())]
    InvalidArtifact { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::DataNotFound { .. } | Self::UnknownModel { .. } => ExitCode::from(3),
            Self::SchemaMismatch(_) | Self::InvalidArtifact { .. } => ExitCode::from(4),
            Self::UnknownTopic { .. } | Self::InvalidEvent(_) => ExitCode::from(5),
            Self::Io(_) => ExitCode::from(7),
        }
    }
}

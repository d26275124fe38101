use crate::types::{ContainerId, SubjectId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NoDropError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Container {container:?} is unavailable")]
    ContainerUnavailable { container: ContainerId },

    #[error("Subject {subject} has no usable inventory")]
    SubjectUnavailable { subject: SubjectId },

    #[error("Stored bundle for subject {subject} is corrupt: {reason}")]
    CorruptBundle { subject: SubjectId, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type NoDropResult<T> = Result<T, NoDropError>;

/// Structural failures of a restore pass. Item-level failures never
/// surface here; they are counted as skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RestoreError {
    #[error("Restore target container {container:?} is unavailable")]
    ContainerUnavailable { container: ContainerId },
}

impl From<RestoreError> for NoDropError {
    fn from(err: RestoreError) -> Self {
        match err {
            RestoreError::ContainerUnavailable { container } => {
                NoDropError::ContainerUnavailable { container }
            }
        }
    }
}

use crate::domain::project::{Position, ProjectId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Failure taxonomy for workflow operations.
///
/// Variants are typed rather than free-form so calling layers can render
/// distinct states: `GateNotSatisfied` asks the user to supply the missing
/// evidence, `IllegalTransition` means the action should not have been
/// offered, `Conflict` is transient and safe to retry after a re-read.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("requirement not satisfied at {position}: {requirement}")]
    GateNotSatisfied {
        position: Position,
        requirement: String,
    },
    #[error("illegal transition from {from} to {to}")]
    IllegalTransition { from: Position, to: Position },
    #[error("project {0} is completed and read-only")]
    ProjectClosed(ProjectId),
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),
    #[error("concurrent update detected: expected revision {expected}, found {found}")]
    Conflict { expected: u64, found: u64 },
    #[error("unknown stage index {0}")]
    UnknownStage(u8),
    #[error("unknown sub-step {sub_step} for stage {stage}")]
    UnknownSubStep { stage: u8, sub_step: u8 },
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl WorkflowError {
    /// Whether a caller may retry the operation automatically.
    ///
    /// `Conflict` is retried after re-reading the project; `StorageUnavailable`
    /// after backoff. Everything else needs user or programmer intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WorkflowError::Conflict { .. } | WorkflowError::StorageUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        let conflict = WorkflowError::Conflict {
            expected: 1,
            found: 2,
        };
        assert!(conflict.is_retryable());

        let closed = WorkflowError::ProjectClosed(1);
        assert!(!closed.is_retryable());

        let gate = WorkflowError::GateNotSatisfied {
            position: Position {
                stage: 1,
                sub_step: 4,
            },
            requirement: "10% of quote paid".to_string(),
        };
        assert!(!gate.is_retryable());
    }
}

// Copyright 2025 Cowboy AI, LLC.

//! Error types for workflow operations

use thiserror::Error;

/// Errors that can occur while routing tasks or mutating instance state
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// Input failed shape validation before any state was touched
    #[error("Validation error: {0}")]
    Validation(String),

    /// Add/reduction signature attempted on a node without a counter-sign ratio
    #[error("{node_name} is not a counter-sign node")]
    NotCounterSignNode {
        /// Display name of the offending node
        node_name: String,
    },

    /// The record has already been submitted and is under review
    #[error("Record already submitted and under review")]
    AlreadyUnderReview,

    /// The record has already completed its approval flow
    #[error("Record already completed")]
    AlreadyCompleted,

    /// The record has been invalidated
    #[error("Record already invalidated")]
    AlreadyInvalidated,

    /// The record has been terminated
    #[error("Record already terminated")]
    AlreadyTerminated,

    /// The record has been cancelled by its submitter
    #[error("Record already cancelled")]
    AlreadyCancelled,

    /// The record has been rejected back to its submitter
    #[error("Record already rejected")]
    AlreadyRejected,

    /// A wire status string did not name a known business status
    #[error("Unknown business status: {0:?}")]
    UnknownStatus(String),

    /// Instance not found
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    /// Active task not found (completed, retired, or never created)
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Process definition not found
    #[error("Definition not found: {0}")]
    DefinitionNotFound(String),

    /// A node code does not exist in the definition
    #[error("Unknown node {node} in definition {definition}")]
    UnknownNode {
        /// Node code that was requested
        node: String,
        /// Definition the node was looked up in
        definition: String,
    },

    /// The acting actor holds no association on the task
    #[error("Actor {actor} has no permission on task {task}")]
    PermissionDenied {
        /// Actor that attempted the operation
        actor: String,
        /// Task the operation targeted
        task: String,
    },

    /// An external collaborator failed; the whole unit of work is aborted
    #[error("Collaborator failure: {service} - {message}")]
    Collaborator {
        /// Name of the failing collaborator
        service: String,
        /// Error message from the collaborator
        message: String,
    },
}

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

impl WorkflowError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        WorkflowError::Validation(msg.into())
    }

    /// Check if this is a shape-validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            WorkflowError::Validation(_) | WorkflowError::NotCounterSignNode { .. }
        )
    }

    /// Check if this is an illegal lifecycle transition
    pub fn is_illegal_transition(&self) -> bool {
        matches!(
            self,
            WorkflowError::AlreadyUnderReview
                | WorkflowError::AlreadyCompleted
                | WorkflowError::AlreadyInvalidated
                | WorkflowError::AlreadyTerminated
                | WorkflowError::AlreadyCancelled
                | WorkflowError::AlreadyRejected
                | WorkflowError::UnknownStatus(_)
        )
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WorkflowError::InstanceNotFound(_)
                | WorkflowError::TaskNotFound(_)
                | WorkflowError::DefinitionNotFound(_)
                | WorkflowError::UnknownNode { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = WorkflowError::validation("delegate requires a target actor");
        assert_eq!(
            err.to_string(),
            "Validation error: delegate requires a target actor"
        );

        let err = WorkflowError::NotCounterSignNode {
            node_name: "Finance Review".to_string(),
        };
        assert_eq!(err.to_string(), "Finance Review is not a counter-sign node");

        let err = WorkflowError::AlreadyUnderReview;
        assert_eq!(err.to_string(), "Record already submitted and under review");

        let err = WorkflowError::PermissionDenied {
            actor: "u-17".to_string(),
            task: "t-1".to_string(),
        };
        assert_eq!(err.to_string(), "Actor u-17 has no permission on task t-1");

        let err = WorkflowError::Collaborator {
            service: "skip-engine".to_string(),
            message: "definition graph unreachable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Collaborator failure: skip-engine - definition graph unreachable"
        );
    }

    #[test]
    fn test_taxonomy_helpers() {
        assert!(WorkflowError::validation("x").is_validation());
        assert!(WorkflowError::NotCounterSignNode {
            node_name: "n".to_string()
        }
        .is_validation());

        assert!(WorkflowError::AlreadyCompleted.is_illegal_transition());
        assert!(WorkflowError::UnknownStatus(String::new()).is_illegal_transition());
        assert!(!WorkflowError::AlreadyCompleted.is_validation());

        assert!(WorkflowError::TaskNotFound("t".to_string()).is_not_found());
        assert!(!WorkflowError::TaskNotFound("t".to_string()).is_illegal_transition());
    }

    #[test]
    fn test_error_clone_round_trip() {
        let original = WorkflowError::UnknownNode {
            node: "n2".to_string(),
            definition: "leave-request".to_string(),
        };
        let cloned = original.clone();
        assert_eq!(original, cloned);
        assert_eq!(original.to_string(), cloned.to_string());
    }
}

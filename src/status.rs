// Copyright 2025 Cowboy AI, LLC.

//! Business status lifecycle for process instances
//!
//! The status machine is: draft -> waiting -> {finish, back, cancel,
//! invalid, termination}, with back -> waiting and cancel -> waiting on
//! resubmission. Finish, invalid and termination are terminal. Guards
//! validate a requested transition against the current status and raise a
//! distinct error per illegal source state; they run before any
//! state-mutating operation.

use crate::errors::{WorkflowError, WorkflowResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Business status of a process instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BusinessStatus {
    /// Saved but not yet submitted
    Draft,

    /// Submitted, approvals pending
    Waiting,

    /// All approvals done
    Finish,

    /// Rejected back to the submitter, eligible for resubmission
    Back,

    /// Withdrawn by the submitter
    Cancel,

    /// Invalidated by an administrator
    Invalid,

    /// Terminated mid-flight
    Termination,
}

impl BusinessStatus {
    /// Wire form of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessStatus::Draft => "draft",
            BusinessStatus::Waiting => "waiting",
            BusinessStatus::Finish => "finish",
            BusinessStatus::Back => "back",
            BusinessStatus::Cancel => "cancel",
            BusinessStatus::Invalid => "invalid",
            BusinessStatus::Termination => "termination",
        }
    }

    /// Whether no further transitions are allowed out of this status
    ///
    /// Cancelled and rejected-back records are not terminal: both rewind to
    /// the applicant node and stay eligible for resubmission.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BusinessStatus::Finish | BusinessStatus::Invalid | BusinessStatus::Termination
        )
    }

    /// Whether completing a task from this status counts as a resubmission
    ///
    /// Draft, cancelled and rejected-back records re-enter the flow through
    /// the applicant node; the first pass out of one of these states emits a
    /// "process (re)submitted" event.
    pub fn is_resubmission(&self) -> bool {
        matches!(
            self,
            BusinessStatus::Draft | BusinessStatus::Cancel | BusinessStatus::Back
        )
    }

    /// Valid target statuses from this status
    pub fn valid_transitions(&self) -> Vec<BusinessStatus> {
        match self {
            BusinessStatus::Draft => vec![
                BusinessStatus::Waiting,
                BusinessStatus::Finish,
                BusinessStatus::Cancel,
                BusinessStatus::Invalid,
                BusinessStatus::Termination,
            ],
            BusinessStatus::Waiting => vec![
                BusinessStatus::Waiting,
                BusinessStatus::Finish,
                BusinessStatus::Back,
                BusinessStatus::Cancel,
                BusinessStatus::Invalid,
                BusinessStatus::Termination,
            ],
            BusinessStatus::Back => vec![
                BusinessStatus::Waiting,
                BusinessStatus::Finish,
                BusinessStatus::Invalid,
                BusinessStatus::Termination,
            ],
            BusinessStatus::Cancel => vec![BusinessStatus::Waiting, BusinessStatus::Finish],
            BusinessStatus::Finish
            | BusinessStatus::Invalid
            | BusinessStatus::Termination => vec![],
        }
    }

    /// Check whether a transition to `target` is allowed
    pub fn can_transition_to(&self, target: &BusinessStatus) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Guard for submitting (starting) a process over an existing record
    pub fn guard_start(&self) -> WorkflowResult<()> {
        match self {
            BusinessStatus::Waiting => Err(WorkflowError::AlreadyUnderReview),
            BusinessStatus::Finish => Err(WorkflowError::AlreadyCompleted),
            BusinessStatus::Invalid => Err(WorkflowError::AlreadyInvalidated),
            BusinessStatus::Termination => Err(WorkflowError::AlreadyTerminated),
            _ => Ok(()),
        }
    }

    /// Guard for completing a pending task of this instance
    pub fn guard_complete(&self) -> WorkflowResult<()> {
        match self {
            BusinessStatus::Finish => Err(WorkflowError::AlreadyCompleted),
            BusinessStatus::Invalid => Err(WorkflowError::AlreadyInvalidated),
            BusinessStatus::Termination => Err(WorkflowError::AlreadyTerminated),
            _ => Ok(()),
        }
    }

    /// Guard for cancelling (withdrawing) the instance
    pub fn guard_cancel(&self) -> WorkflowResult<()> {
        match self {
            BusinessStatus::Cancel => Err(WorkflowError::AlreadyCancelled),
            BusinessStatus::Finish => Err(WorkflowError::AlreadyCompleted),
            BusinessStatus::Invalid => Err(WorkflowError::AlreadyInvalidated),
            BusinessStatus::Termination => Err(WorkflowError::AlreadyTerminated),
            BusinessStatus::Back => Err(WorkflowError::AlreadyRejected),
            _ => Ok(()),
        }
    }

    /// Guard for rejecting the instance back to an earlier node
    pub fn guard_back(&self) -> WorkflowResult<()> {
        match self {
            BusinessStatus::Back => Err(WorkflowError::AlreadyRejected),
            BusinessStatus::Finish => Err(WorkflowError::AlreadyCompleted),
            BusinessStatus::Invalid => Err(WorkflowError::AlreadyInvalidated),
            BusinessStatus::Termination => Err(WorkflowError::AlreadyTerminated),
            BusinessStatus::Cancel => Err(WorkflowError::AlreadyCancelled),
            _ => Ok(()),
        }
    }

    /// Guard for invalidating or terminating the instance
    pub fn guard_terminate(&self) -> WorkflowResult<()> {
        match self {
            BusinessStatus::Finish => Err(WorkflowError::AlreadyCompleted),
            BusinessStatus::Invalid => Err(WorkflowError::AlreadyInvalidated),
            BusinessStatus::Termination => Err(WorkflowError::AlreadyTerminated),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for BusinessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BusinessStatus {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(BusinessStatus::Draft),
            "waiting" => Ok(BusinessStatus::Waiting),
            "finish" => Ok(BusinessStatus::Finish),
            "back" => Ok(BusinessStatus::Back),
            "cancel" => Ok(BusinessStatus::Cancel),
            "invalid" => Ok(BusinessStatus::Invalid),
            "termination" => Ok(BusinessStatus::Termination),
            other => Err(WorkflowError::UnknownStatus(other.to_string())),
        }
    }
}

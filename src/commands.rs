// Copyright 2025 Cowboy AI, LLC.

//! Operation inputs
//!
//! Requests to change workflow state. Shape validation happens here, before
//! any state is read or mutated; the acting actor is always an explicit
//! field, never ambient context.

use crate::context::ProcessVariables;
use crate::identifiers::{ActorId, DefinitionId, InstanceId, NodeCode, TaskId};
use crate::notify::NotifyChannel;
use crate::errors::{WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};

/// Start (or resubmit) a process over a business record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartProcess {
    /// Definition to run
    pub definition_id: DefinitionId,

    /// Correlation id of the owning business record; required
    pub business_key: String,

    /// Actor submitting the record
    pub initiator: ActorId,

    /// Initial process variables
    pub variables: ProcessVariables,
}

impl StartProcess {
    /// Reject blank business keys before touching any state
    pub fn validate(&self) -> WorkflowResult<()> {
        if self.business_key.trim().is_empty() {
            return Err(WorkflowError::validation(
                "starting a workflow requires a business key",
            ));
        }
        Ok(())
    }
}

/// Complete (approve) a pending task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteTask {
    /// Task being completed
    pub task_id: TaskId,

    /// Acting actor
    pub actor: ActorId,

    /// Approval message
    pub message: Option<String>,

    /// Variables merged into the instance bag
    pub variables: ProcessVariables,

    /// Carbon-copy recipients attached alongside the approval
    pub copy_to: Vec<ActorId>,

    /// Channels for pending-task reminders to the next approvers
    pub notify: Vec<NotifyChannel>,

    /// Reminder text; a default is derived from the flow name when empty
    pub notify_message: Option<String>,

    /// Skip the actor-association permission check (tenant admin path)
    pub ignore_permission: bool,
}

impl CompleteTask {
    /// Minimal completion request for `actor` on `task_id`
    pub fn new(task_id: TaskId, actor: ActorId) -> Self {
        Self {
            task_id,
            actor,
            message: None,
            variables: ProcessVariables::new(),
            copy_to: Vec::new(),
            notify: Vec::new(),
            notify_message: None,
            ignore_permission: false,
        }
    }

    /// Attach an approval message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach carbon-copy recipients
    pub fn with_copy_to<I>(mut self, recipients: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ActorId>,
    {
        self.copy_to = recipients.into_iter().map(Into::into).collect();
        self
    }
}

/// Reject a task back to an earlier node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectTask {
    /// Task being rejected
    pub task_id: TaskId,

    /// Acting actor
    pub actor: ActorId,

    /// Node to rewind to
    pub target_node: NodeCode,

    /// Rejection message
    pub message: Option<String>,

    /// Variables merged into the instance bag
    pub variables: ProcessVariables,

    /// Skip the actor-association permission check
    pub ignore_permission: bool,
}

impl RejectTask {
    /// Reject `task_id` back to `target_node`
    pub fn new(task_id: TaskId, actor: ActorId, target_node: NodeCode) -> Self {
        Self {
            task_id,
            actor,
            target_node,
            message: None,
            variables: ProcessVariables::new(),
            ignore_permission: false,
        }
    }
}

/// The four escalation operations on a task's actor set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum TaskOperation {
    /// Hand the task to one actor on the current actor's behalf
    Delegate {
        /// Sole new holder of the task
        target: ActorId,
    },

    /// Hand the task to one actor, audit-distinct from delegate
    Transfer {
        /// Sole new holder of the task
        target: ActorId,
    },

    /// Add co-signers to a counter-sign node
    AddSignature {
        /// Actors to add; must not be empty
        targets: Vec<ActorId>,
    },

    /// Withdraw co-signers from a counter-sign node
    ReductionSignature {
        /// Actors to remove; must not be empty
        targets: Vec<ActorId>,
    },
}

impl TaskOperation {
    /// Reject empty target lists before touching any state
    pub fn validate(&self) -> WorkflowResult<()> {
        match self {
            TaskOperation::Delegate { .. } | TaskOperation::Transfer { .. } => Ok(()),
            TaskOperation::AddSignature { targets } => {
                if targets.is_empty() {
                    Err(WorkflowError::validation(
                        "add signature requires at least one target actor",
                    ))
                } else {
                    Ok(())
                }
            }
            TaskOperation::ReductionSignature { targets } => {
                if targets.is_empty() {
                    Err(WorkflowError::validation(
                        "reduction signature requires at least one target actor",
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Whether the operation is only legal on a counter-sign node
    pub fn requires_counter_sign(&self) -> bool {
        matches!(
            self,
            TaskOperation::AddSignature { .. } | TaskOperation::ReductionSignature { .. }
        )
    }
}

/// Envelope for one escalation operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperateTask {
    /// Task being operated on
    pub task_id: TaskId,

    /// Acting actor
    pub actor: ActorId,

    /// The operation itself
    pub operation: TaskOperation,

    /// Audit message
    pub message: Option<String>,

    /// Skip the actor-association permission check
    pub ignore_permission: bool,
}

impl OperateTask {
    /// Apply `operation` to `task_id` as `actor`
    pub fn new(task_id: TaskId, actor: ActorId, operation: TaskOperation) -> Self {
        Self {
            task_id,
            actor,
            operation,
            message: None,
            ignore_permission: false,
        }
    }
}

/// Terminate the instance owning a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminateTask {
    /// Any pending task of the instance to terminate
    pub task_id: TaskId,

    /// Acting actor
    pub actor: ActorId,

    /// Termination comment
    pub message: Option<String>,
}

/// Withdraw a running instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelInstance {
    /// Instance to withdraw
    pub instance_id: InstanceId,

    /// Acting actor
    pub actor: ActorId,

    /// Withdrawal comment
    pub message: Option<String>,
}

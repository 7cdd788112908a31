// Copyright 2025 Cowboy AI, LLC.

//! Core entities: instances, active tasks, history entries, and the
//! actor associations that bind resolved actors to tasks

use crate::context::ProcessVariables;
use crate::graph::{Node, NodeType};
use crate::identifiers::{ActorId, DefinitionId, InstanceId, NodeCode, TaskId};
use crate::status::BusinessStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One running process execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Unique identifier of this run
    pub id: InstanceId,

    /// The definition the run follows
    pub definition_id: DefinitionId,

    /// Definition code, carried into event payloads
    pub flow_code: String,

    /// Correlation id of the owning business record
    pub business_key: String,

    /// Current business status
    pub status: BusinessStatus,

    /// Runtime variable bag
    pub variables: ProcessVariables,

    /// Actor that started the run
    pub initiator: ActorId,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run was last mutated
    pub updated_at: DateTime<Utc>,
}

impl Instance {
    /// Create a new draft instance
    pub fn new(
        definition_id: DefinitionId,
        flow_code: impl Into<String>,
        business_key: impl Into<String>,
        initiator: ActorId,
        mut variables: ProcessVariables,
    ) -> Self {
        let now = Utc::now();
        let business_key = business_key.into();
        variables.set_initiator(&initiator);
        variables.set_business_key(&business_key);
        Self {
            id: InstanceId::new(),
            definition_id,
            flow_code: flow_code.into(),
            business_key,
            status: BusinessStatus::Draft,
            variables,
            initiator,
            started_at: now,
            updated_at: now,
        }
    }
}

/// A pending unit of work at a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveTask {
    /// Unique identifier of this task
    pub id: TaskId,

    /// Owning instance
    pub instance_id: InstanceId,

    /// Definition the owning instance follows
    pub definition_id: DefinitionId,

    /// Node this task sits at
    pub node_code: NodeCode,

    /// Display name of the node
    pub node_name: String,

    /// Kind of node
    pub node_type: NodeType,

    /// Counter-sign ratio; zero means the first actor completes the node
    pub ratio: Decimal,

    /// Raw unresolved assignee tokens, as authored in the definition
    pub permissions: Vec<String>,

    /// When the node was entered
    pub created_at: DateTime<Utc>,
}

impl ActiveTask {
    /// Create a task for an instance entering `node`
    pub fn enter(instance: &Instance, node: &Node) -> Self {
        Self {
            id: TaskId::new(),
            instance_id: instance.id,
            definition_id: instance.definition_id,
            node_code: node.code.clone(),
            node_name: node.name.clone(),
            node_type: node.node_type,
            ratio: node.ratio,
            permissions: node.permissions.clone(),
            created_at: Utc::now(),
        }
    }

    /// Whether the node requires a fraction of assigned actors to act
    pub fn is_counter_sign(&self) -> bool {
        self.ratio > Decimal::ZERO
    }
}

/// How an actor (or the system) cooperated on a task transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooperationType {
    /// Approved and moved on
    Pass,

    /// Refused outright
    Reject,

    /// Sent back to an earlier node
    Back,

    /// Handed to another actor, audit-distinct from delegate
    Transfer,

    /// Handed to another actor on the original's behalf
    Delegate,

    /// Co-signer added to a counter-sign node
    Sign,

    /// Co-signer withdrawn from a counter-sign node
    SignOff,

    /// Carbon-copied for information only
    Copy,

    /// Withdrawn by the submitter
    Cancel,

    /// Terminated mid-flight
    Termination,
}

impl fmt::Display for CooperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CooperationType::Pass => "pass",
            CooperationType::Reject => "reject",
            CooperationType::Back => "back",
            CooperationType::Transfer => "transfer",
            CooperationType::Delegate => "delegate",
            CooperationType::Sign => "sign",
            CooperationType::SignOff => "sign_off",
            CooperationType::Copy => "copy",
            CooperationType::Cancel => "cancel",
            CooperationType::Termination => "termination",
        };
        write!(f, "{label}")
    }
}

/// Immutable record of a task transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTaskEntry {
    /// Unique identifier of this entry
    pub id: uuid::Uuid,

    /// Task the transition happened on
    pub task_id: TaskId,

    /// Owning instance
    pub instance_id: InstanceId,

    /// Node the transition left
    pub node_code: NodeCode,

    /// Display name of that node
    pub node_name: String,

    /// Node the transition targeted, when it moved the instance
    pub target_node_code: Option<NodeCode>,

    /// Display name of the target node
    pub target_node_name: Option<String>,

    /// Actor that acted; `None` for synthesized entries
    pub actor: Option<ActorId>,

    /// Kind of cooperation
    pub cooperation: CooperationType,

    /// Free-form approval message
    pub message: Option<String>,

    /// When the transition was recorded; synthesized carbon-copy entries are
    /// backdated so audit order matches causal order
    pub recorded_at: DateTime<Utc>,
}

impl HistoryTaskEntry {
    /// Record a transition on `task` by `actor`
    pub fn record(
        task: &ActiveTask,
        actor: Option<ActorId>,
        cooperation: CooperationType,
        message: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            task_id: task.id,
            instance_id: task.instance_id,
            node_code: task.node_code.clone(),
            node_name: task.node_name.clone(),
            target_node_code: None,
            target_node_name: None,
            actor,
            cooperation,
            message,
            recorded_at: Utc::now(),
        }
    }

    /// Attach the node the transition moved to
    pub fn with_target(mut self, code: NodeCode, name: impl Into<String>) -> Self {
        self.target_node_code = Some(code);
        self.target_node_name = Some(name.into());
        self
    }

    /// Override the recorded timestamp (synthesized entries only)
    pub fn backdated(mut self, at: DateTime<Utc>) -> Self {
        self.recorded_at = at;
        self
    }
}

/// Why an actor is attached to a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    /// Ordinary approver resolved from the node's tokens
    Approval,

    /// Received the task through a transfer
    Transfer,

    /// Received the task through a delegation
    Delegate,

    /// Carbon-copy recipient; cannot act
    CarbonCopy,
}

impl AssignmentType {
    /// Whether this assignment allows acting on the task
    pub fn can_act(&self) -> bool {
        !matches!(self, AssignmentType::CarbonCopy)
    }
}

/// A resolved actor attached to a task
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorAssociation {
    /// Task the actor is attached to
    pub task_id: TaskId,

    /// The concrete actor
    pub actor: ActorId,

    /// Why the actor is attached
    pub assignment: AssignmentType,
}

impl ActorAssociation {
    /// Attach `actor` to `task_id`
    pub fn new(task_id: TaskId, actor: ActorId, assignment: AssignmentType) -> Self {
        Self {
            task_id,
            actor,
            assignment,
        }
    }
}

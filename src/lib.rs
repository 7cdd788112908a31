//! # Flow Domain
//!
//! Task routing and multi-actor cooperation for business process engines.
//!
//! Given a running process instance positioned at one or more active nodes,
//! this crate resolves WHO must act, advances the instance when actors
//! complete, reconciles counter-sign/or-sign thresholds, and exposes the
//! escalation operations (delegate, transfer, add/withdraw co-signer,
//! reject-back, terminate, cancel). The building blocks:
//!
//! - **Assignee tokens**: class-prefixed actor expressions (`user:`,
//!   `role:`, `dept:`, `post:`) decoded once into a closed tagged union and
//!   expanded best-effort into deduplicated actor sets
//! - **Cooperation ledger**: actor-to-task associations, always replaced as
//!   a unit so readers never observe a half-updated actor set
//! - **Status lifecycle**: the draft/waiting/finish/back/cancel/invalid/
//!   termination machine with a named error per illegal transition
//! - **Completion protocol**: history recording, counter-sign quorum
//!   arithmetic, carbon copy, graph fan-out, and finish detection
//! - **Collaborator seams**: graph traversal, identity lookup, notification
//!   dispatch, and event publication stay outside the crate; in-memory
//!   reference implementations are provided for embedding and tests
//!
//! ## Design Principles
//!
//! 1. **Explicit actors**: every operation names its acting actor; nothing
//!    is read from ambient state
//! 2. **All-or-nothing**: each operation stages its mutations and commits
//!    them only after every fallible step succeeded
//! 3. **Events after commit**: lifecycle events are collected in an outbox
//!    and published once the unit of work is durable
//! 4. **Controlled state**: enums restrict statuses, cooperation kinds, and
//!    assignment kinds to valid options

#![warn(missing_docs)]

mod assignee;
mod commands;
mod context;
mod engine;
mod errors;
mod events;
mod graph;
mod identifiers;
mod ledger;
mod model;
mod notify;
mod resolver;
mod status;
mod store;

// Re-export core types
pub use assignee::AssigneeToken;
pub use commands::{
    CancelInstance, CompleteTask, OperateTask, RejectTask, StartProcess, TaskOperation,
    TerminateTask,
};
pub use context::{ProcessVariables, VAR_BUSINESS_KEY, VAR_INITIATOR};
pub use engine::{CompletionOutcome, RejectOutcome, StartOutcome, WorkflowEngine};
pub use errors::{WorkflowError, WorkflowResult};
pub use events::{
    Outbox, ProcessEvent, ProcessEventSink, ProcessTaskEvent, RecordingEventSink, WorkflowEvent,
};
pub use graph::{Node, NodeType, RouteTable, SkipEngine, SkipType};
pub use identifiers::{ActorId, DefinitionId, InstanceId, NodeCode, TaskId};
pub use ledger::{CooperationLedger, CooperationLedgerExt, InMemoryLedger};
pub use model::{
    ActiveTask, ActorAssociation, AssignmentType, CooperationType, HistoryTaskEntry, Instance,
};
pub use notify::{notify_best_effort, NotificationDispatcher, NotifyChannel, RecordingDispatcher};
pub use resolver::{AssigneeResolver, IdentityDirectory, InMemoryDirectory, LookupError};
pub use status::BusinessStatus;
pub use store::{InMemoryStore, WorkflowStore};

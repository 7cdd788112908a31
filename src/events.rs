// Copyright 2025 Cowboy AI, LLC.

//! Process lifecycle and task events
//!
//! Events are facts emitted for external listeners (business-table
//! synchronization, dashboards). They are collected in an outbox during a
//! unit of work and published only after the work committed, so observers
//! never see an event for a rolled-back transition. Publish failures are
//! logged and never escalated: the sink sits outside the consistency
//! boundary of the workflow state.

use crate::identifiers::{NodeCode, TaskId};
use crate::status::BusinessStatus;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Instance-level lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessEvent {
    /// Definition code of the flow
    pub flow_code: String,

    /// Correlation id of the owning business record
    pub business_key: String,

    /// Business status the instance holds after the transition
    pub status: BusinessStatus,

    /// Whether this event marks a submission or resubmission through the
    /// applicant node, as opposed to an ordinary status change
    pub submitted: bool,
}

/// Task-level event, emitted when an actor handles a pending task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessTaskEvent {
    /// Definition code of the flow
    pub flow_code: String,

    /// Node the handled task sat at
    pub node_code: NodeCode,

    /// The handled task
    pub task_id: TaskId,

    /// Correlation id of the owning business record
    pub business_key: String,
}

/// Union of everything the core publishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// Instance lifecycle change
    Process(ProcessEvent),

    /// Task handled
    Task(ProcessTaskEvent),
}

impl WorkflowEvent {
    /// Event type name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            WorkflowEvent::Process(_) => "process",
            WorkflowEvent::Task(_) => "task",
        }
    }
}

/// Event sink collaborator
pub trait ProcessEventSink: Send + Sync {
    /// Publish one event; failures are reported but not retried
    fn publish(&self, event: &WorkflowEvent) -> Result<(), String>;
}

/// Events staged during a unit of work, published after commit
#[derive(Default)]
pub struct Outbox {
    events: Vec<WorkflowEvent>,
}

impl Outbox {
    /// Create an empty outbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an event for post-commit publication
    pub fn push(&mut self, event: WorkflowEvent) {
        self.events.push(event);
    }

    /// Number of staged events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is staged
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Publish every staged event to `sink`, in staging order
    ///
    /// Sink failures are logged at `warn` and do not stop the drain; the
    /// owning operation has already committed.
    pub fn drain_into(self, sink: &dyn ProcessEventSink) {
        for event in self.events {
            debug!(event_type = event.event_type(), "publishing workflow event");
            if let Err(message) = sink.publish(&event) {
                warn!(
                    event_type = event.event_type(),
                    error = %message,
                    "event sink rejected event"
                );
            }
        }
    }
}

/// Recording sink for tests and embedding without an event bus
#[derive(Default)]
pub struct RecordingEventSink {
    published: std::sync::RwLock<Vec<WorkflowEvent>>,
}

impl RecordingEventSink {
    /// Create an empty recording sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far
    pub fn published(&self) -> Vec<WorkflowEvent> {
        self.published.read().unwrap().clone()
    }
}

impl ProcessEventSink for RecordingEventSink {
    fn publish(&self, event: &WorkflowEvent) -> Result<(), String> {
        self.published.write().unwrap().push(event.clone());
        Ok(())
    }
}

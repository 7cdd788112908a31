// Copyright 2025 Cowboy AI, LLC.

//! The workflow engine
//!
//! Orchestrates every outbound operation over the collaborator seams:
//! store, cooperation ledger, skip engine, identity directory, notification
//! dispatcher, and event sink. Each operation runs in three phases:
//!
//! 1. validate and resolve - all fallible work, zero mutation;
//! 2. commit - staged mutations applied under the store and ledger locks;
//! 3. side channel - events and reminders, best-effort, post-commit.
//!
//! Operations against the same instance are serialized with a per-instance
//! lock, so at most one completion can advance a task.

mod completion;
mod control;
mod operations;
mod reject;
mod unit_of_work;

pub use completion::CompletionOutcome;
pub use reject::RejectOutcome;

use crate::commands::StartProcess;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::events::ProcessEventSink;
use crate::graph::SkipEngine;
use crate::identifiers::{ActorId, InstanceId, TaskId};
use crate::ledger::{CooperationLedger, CooperationLedgerExt};
use crate::model::{ActiveTask, ActorAssociation, AssignmentType, Instance};
use crate::notify::NotificationDispatcher;
use crate::resolver::{AssigneeResolver, IdentityDirectory};
use crate::store::WorkflowStore;
use crate::assignee::AssigneeToken;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;

use unit_of_work::UnitOfWork;

/// Result of starting (or resuming) a process
#[derive(Debug, Clone, PartialEq)]
pub struct StartOutcome {
    /// The running instance
    pub instance_id: InstanceId,

    /// The pending applicant task
    pub task_id: TaskId,

    /// Whether an existing re-entrant instance was resumed instead of a new
    /// one created
    pub resumed: bool,
}

/// Task routing and cooperation engine
pub struct WorkflowEngine {
    store: Arc<dyn WorkflowStore>,
    ledger: Arc<dyn CooperationLedger>,
    skip: Arc<dyn SkipEngine>,
    directory: Arc<dyn IdentityDirectory>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    sink: Arc<dyn ProcessEventSink>,
    locks: Mutex<HashMap<InstanceId, Arc<Mutex<()>>>>,
}

impl WorkflowEngine {
    /// Wire an engine over its collaborators
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        ledger: Arc<dyn CooperationLedger>,
        skip: Arc<dyn SkipEngine>,
        directory: Arc<dyn IdentityDirectory>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        sink: Arc<dyn ProcessEventSink>,
    ) -> Self {
        Self {
            store,
            ledger,
            skip,
            directory,
            dispatcher,
            sink,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Start a process over a business record, or resume a re-entrant one
    pub fn start_process(&self, request: StartProcess) -> WorkflowResult<StartOutcome> {
        request.validate()?;

        if let Some(existing) = self.store.instance_by_business_key(&request.business_key) {
            existing.status.guard_start()?;
            // Draft, cancelled or rejected-back: hand the pending applicant
            // task back for resubmission.
            let tasks = self.store.tasks_for_instance(existing.id);
            let task = tasks
                .first()
                .ok_or_else(|| WorkflowError::TaskNotFound(existing.id.to_string()))?;
            return Ok(StartOutcome {
                instance_id: existing.id,
                task_id: task.id,
                resumed: true,
            });
        }

        let applicant = self.skip.applicant_node(request.definition_id)?;
        let flow_code = self.skip.definition_code(request.definition_id)?;

        let instance = Instance::new(
            request.definition_id,
            flow_code,
            request.business_key,
            request.initiator.clone(),
            request.variables,
        );
        let mut task = ActiveTask::enter(&instance, &applicant);
        // The applicant node always belongs to the initiator, whatever
        // tokens the definition authored on it.
        task.permissions = vec![AssigneeToken::User(request.initiator.as_str().to_string())
            .encode()];

        let outcome = StartOutcome {
            instance_id: instance.id,
            task_id: task.id,
            resumed: false,
        };

        info!(
            instance = %instance.id,
            business_key = %instance.business_key,
            "starting workflow instance"
        );

        let mut uow = UnitOfWork::new();
        uow.replace_actors(
            task.id,
            vec![ActorAssociation::new(
                task.id,
                request.initiator,
                AssignmentType::Approval,
            )],
        );
        uow.insert_instance(instance);
        uow.insert_task(task);
        uow.commit(self.store.as_ref(), self.ledger.as_ref())
            .drain_into(self.sink.as_ref());

        Ok(outcome)
    }

    /// Current associations of a task, for callers rendering "who can act"
    pub fn current_actors(&self, task_id: TaskId) -> Vec<ActorAssociation> {
        self.ledger.current_actors(task_id)
    }

    /// Every association across an instance's pending tasks
    pub fn actors_for_instance(&self, instance_id: InstanceId) -> Vec<ActorAssociation> {
        let task_ids: Vec<TaskId> = self
            .store
            .tasks_for_instance(instance_id)
            .iter()
            .map(|t| t.id)
            .collect();
        self.ledger.actors_for_tasks(&task_ids)
    }

    /// Serialization point for operations against one instance
    fn instance_lock(&self, instance_id: InstanceId) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .unwrap()
            .entry(instance_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn load_task(&self, task_id: TaskId) -> WorkflowResult<ActiveTask> {
        self.store
            .task(task_id)
            .ok_or_else(|| WorkflowError::TaskNotFound(task_id.to_string()))
    }

    fn load_instance(&self, instance_id: InstanceId) -> WorkflowResult<Instance> {
        self.store
            .instance(instance_id)
            .ok_or_else(|| WorkflowError::InstanceNotFound(instance_id.to_string()))
    }

    /// Permission check: the actor must hold an acting association on the
    /// task unless the superuser path set `ignore_permission`
    fn ensure_can_act(
        &self,
        task: &ActiveTask,
        actor: &ActorId,
        ignore_permission: bool,
    ) -> WorkflowResult<()> {
        if ignore_permission || self.ledger.can_act(task.id, actor) {
            Ok(())
        } else {
            Err(WorkflowError::PermissionDenied {
                actor: actor.to_string(),
                task: task.id.to_string(),
            })
        }
    }

    /// Resolve a task's raw tokens into approval associations
    fn resolved_approvals(&self, task: &ActiveTask) -> WorkflowResult<Vec<ActorAssociation>> {
        let resolver = AssigneeResolver::new(self.directory.as_ref());
        let actors = resolver.resolve_all(&task.permissions)?;
        Ok(actors
            .into_iter()
            .map(|actor| ActorAssociation::new(task.id, actor, AssignmentType::Approval))
            .collect())
    }
}

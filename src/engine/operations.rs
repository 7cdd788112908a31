// Copyright 2025 Cowboy AI, LLC.

//! Escalation operations on a task's actor set
//!
//! Delegate and transfer replace the actor set with a single target; add
//! and reduction signature grow or shrink the co-signer set of a
//! counter-sign node. Every operation validates first, then replaces the
//! actor set as a unit and records its own history entry.

use crate::commands::{OperateTask, TaskOperation};
use crate::errors::{WorkflowError, WorkflowResult};
use crate::identifiers::ActorId;
use crate::model::{ActorAssociation, AssignmentType, CooperationType, HistoryTaskEntry};
use tracing::debug;

use super::unit_of_work::UnitOfWork;
use super::WorkflowEngine;

impl WorkflowEngine {
    /// Apply one escalation operation to a pending task
    pub fn operate_task(&self, request: OperateTask) -> WorkflowResult<()> {
        request.operation.validate()?;

        let task = self.load_task(request.task_id)?;
        let lock = self.instance_lock(task.instance_id);
        let _guard = lock.lock().unwrap();

        let task = self.load_task(request.task_id)?;
        let instance = self.load_instance(task.instance_id)?;
        instance.status.guard_complete()?;
        self.ensure_can_act(&task, &request.actor, request.ignore_permission)?;

        if request.operation.requires_counter_sign() && !task.is_counter_sign() {
            return Err(WorkflowError::NotCounterSignNode {
                node_name: task.node_name.clone(),
            });
        }

        let current = self.ledger.current_actors(task.id);
        let (replacement, cooperation) = match &request.operation {
            TaskOperation::Delegate { target } => (
                vec![ActorAssociation::new(
                    task.id,
                    target.clone(),
                    AssignmentType::Delegate,
                )],
                CooperationType::Delegate,
            ),
            TaskOperation::Transfer { target } => (
                vec![ActorAssociation::new(
                    task.id,
                    target.clone(),
                    AssignmentType::Transfer,
                )],
                CooperationType::Transfer,
            ),
            TaskOperation::AddSignature { targets } => (
                add_signers(task.id, current, targets),
                CooperationType::Sign,
            ),
            TaskOperation::ReductionSignature { targets } => (
                remove_signers(current, targets),
                CooperationType::SignOff,
            ),
        };

        debug!(
            task = %task.id,
            cooperation = %cooperation,
            actors = replacement.len(),
            "replacing task actor set"
        );

        let mut uow = UnitOfWork::new();
        uow.append_history(HistoryTaskEntry::record(
            &task,
            Some(request.actor),
            cooperation,
            request.message,
        ));
        uow.replace_actors(task.id, replacement);
        uow.commit(self.store.as_ref(), self.ledger.as_ref());
        Ok(())
    }

    /// Hand `task_id` to `target` on the current holder's behalf
    pub fn delegate_task(
        &self,
        task_id: crate::identifiers::TaskId,
        actor: ActorId,
        target: ActorId,
    ) -> WorkflowResult<()> {
        self.operate_task(OperateTask::new(
            task_id,
            actor,
            TaskOperation::Delegate { target },
        ))
    }

    /// Hand `task_id` to `target`, audit-distinct from delegation
    pub fn transfer_task(
        &self,
        task_id: crate::identifiers::TaskId,
        actor: ActorId,
        target: ActorId,
    ) -> WorkflowResult<()> {
        self.operate_task(OperateTask::new(
            task_id,
            actor,
            TaskOperation::Transfer { target },
        ))
    }

    /// Add co-signers to the counter-sign node holding `task_id`
    pub fn add_signature(
        &self,
        task_id: crate::identifiers::TaskId,
        actor: ActorId,
        targets: Vec<ActorId>,
    ) -> WorkflowResult<()> {
        self.operate_task(OperateTask::new(
            task_id,
            actor,
            TaskOperation::AddSignature { targets },
        ))
    }

    /// Withdraw co-signers from the counter-sign node holding `task_id`
    pub fn reduction_signature(
        &self,
        task_id: crate::identifiers::TaskId,
        actor: ActorId,
        targets: Vec<ActorId>,
    ) -> WorkflowResult<()> {
        self.operate_task(OperateTask::new(
            task_id,
            actor,
            TaskOperation::ReductionSignature { targets },
        ))
    }
}

/// Current set plus the new co-signers, deduplicated by actor
fn add_signers(
    task_id: crate::identifiers::TaskId,
    mut current: Vec<ActorAssociation>,
    targets: &[ActorId],
) -> Vec<ActorAssociation> {
    for target in targets {
        if !current.iter().any(|a| &a.actor == target) {
            current.push(ActorAssociation::new(
                task_id,
                target.clone(),
                AssignmentType::Approval,
            ));
        }
    }
    current
}

/// Current set minus the withdrawn co-signers
///
/// Dropping below one remaining actor is not rejected here; the node's
/// ratio arithmetic deals with it at the next completion.
fn remove_signers(current: Vec<ActorAssociation>, targets: &[ActorId]) -> Vec<ActorAssociation> {
    current
        .into_iter()
        .filter(|a| !targets.contains(&a.actor))
        .collect()
}

// Copyright 2025 Cowboy AI, LLC.

//! Reject/back routing
//!
//! Rejecting rewinds an instance to an earlier node. A reject targeting the
//! applicant node (the start node's successor) is a full reject: the record
//! moves to `back` and becomes eligible for resubmission. Any other target
//! is a partial reject and the instance stays `waiting`. Before the rewind,
//! every task parallel to the rejecting one is collapsed onto the target
//! node through a work queue, so or-sign and counter-sign branches cannot
//! survive the rewind.

use crate::commands::RejectTask;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::events::{ProcessEvent, WorkflowEvent};
use crate::graph::NodeType;
use crate::identifiers::TaskId;
use crate::ledger::CooperationLedgerExt;
use crate::model::{ActiveTask, ActorAssociation, AssignmentType, CooperationType, HistoryTaskEntry};
use crate::status::BusinessStatus;
use std::collections::VecDeque;
use tracing::info;

use super::unit_of_work::UnitOfWork;
use super::WorkflowEngine;

/// What a reject request did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectOutcome {
    /// Whether the reject returned the record to its applicant (full reject)
    pub full_reject: bool,

    /// Parallel tasks retired while collapsing onto the target node
    pub retired_tasks: usize,

    /// The pending task now sitting at the target node
    pub target_task: TaskId,
}

impl WorkflowEngine {
    /// Reject a task back to an earlier node
    pub fn reject_task(&self, request: RejectTask) -> WorkflowResult<RejectOutcome> {
        let task = self.load_task(request.task_id)?;
        let lock = self.instance_lock(task.instance_id);
        let _guard = lock.lock().unwrap();

        let task = self.load_task(request.task_id)?;
        let instance = self.load_instance(task.instance_id)?;
        instance.status.guard_back()?;
        self.ensure_can_act(&task, &request.actor, request.ignore_permission)?;

        let target = self.skip.node(task.definition_id, &request.target_node)?;
        if target.node_type != NodeType::Between {
            return Err(WorkflowError::validation(
                "a reject can only target an intermediate node",
            ));
        }
        let applicant = self.skip.applicant_node(task.definition_id)?;
        let full_reject = applicant.code == target.code;

        let tasks = self.store.tasks_for_instance(instance.id);

        // Nothing to rewind when every parallel task already sits at the
        // destination.
        if let Some(existing) = tasks
            .iter()
            .find(|t| t.node_code == target.code)
            .filter(|_| tasks.iter().all(|t| t.node_code == target.code))
        {
            return Ok(RejectOutcome {
                full_reject,
                retired_tasks: 0,
                target_task: existing.id,
            });
        }

        let mut uow = UnitOfWork::new();
        uow.merge_variables(instance.id, request.variables.clone());

        // Collapse every branch not already at the target, the rejecting
        // task included. A work queue instead of recursion: each retired
        // task is gone from the snapshot, so the loop is bounded.
        let mut queue: VecDeque<ActiveTask> = tasks
            .iter()
            .filter(|t| t.node_code != target.code)
            .cloned()
            .collect();
        let mut retired = 0;
        while let Some(parallel) = queue.pop_front() {
            // Attribute the entry to the rejecting actor; co-located
            // branches are retired on behalf of their first holder.
            let actor = if parallel.id == task.id {
                Some(request.actor.clone())
            } else {
                self.ledger.acting_actors(&[parallel.id]).into_iter().next()
            };
            uow.append_history(
                HistoryTaskEntry::record(
                    &parallel,
                    actor,
                    CooperationType::Back,
                    request.message.clone(),
                )
                .with_target(target.code.clone(), target.name.clone()),
            );
            uow.remove_task(parallel.id);
            retired += 1;
        }

        // The destination task: reuse one already sitting there, otherwise
        // create and assign it.
        let target_task = match tasks.iter().find(|t| t.node_code == target.code) {
            Some(existing) => existing.id,
            None => {
                let new_task = ActiveTask::enter(&instance, &target);
                let associations = if full_reject {
                    // A full reject hands the record back to its initiator,
                    // whatever tokens the applicant node authored.
                    vec![ActorAssociation::new(
                        new_task.id,
                        instance.initiator.clone(),
                        AssignmentType::Approval,
                    )]
                } else {
                    self.resolved_approvals(&new_task)?
                };
                uow.replace_actors(new_task.id, associations);
                let id = new_task.id;
                uow.insert_task(new_task);
                id
            }
        };

        if full_reject {
            uow.set_status(instance.id, BusinessStatus::Back);
            uow.stage_event(WorkflowEvent::Process(ProcessEvent {
                flow_code: instance.flow_code.clone(),
                business_key: instance.business_key.clone(),
                status: BusinessStatus::Back,
                submitted: false,
            }));
            info!(instance = %instance.id, "record rejected back to applicant");
        } else {
            uow.set_status(instance.id, BusinessStatus::Waiting);
        }

        let outbox = uow.commit(self.store.as_ref(), self.ledger.as_ref());
        outbox.drain_into(self.sink.as_ref());

        Ok(RejectOutcome {
            full_reject,
            retired_tasks: retired,
            target_task,
        })
    }
}

// Copyright 2025 Cowboy AI, LLC.

//! Task completion protocol
//!
//! Completing a task records the pass in history, asks the skip engine for
//! the next node(s), creates and assigns the resulting tasks, and moves the
//! instance to waiting or finish. Counter-sign nodes only advance once the
//! configured fraction of distinct assigned actors has acted; below the
//! threshold the pass is recorded and the task stays pending.

use crate::commands::CompleteTask;
use crate::errors::WorkflowResult;
use crate::events::{ProcessEvent, ProcessTaskEvent, WorkflowEvent};
use crate::graph::{NodeType, SkipType};
use crate::identifiers::{ActorId, TaskId};
use crate::ledger::CooperationLedgerExt;
use crate::model::{ActiveTask, CooperationType, HistoryTaskEntry};
use crate::notify::notify_best_effort;
use crate::status::BusinessStatus;
use chrono::Duration;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, info};

use super::unit_of_work::UnitOfWork;
use super::WorkflowEngine;

/// What a completion request did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Counter-sign quorum not yet reached; the task stays pending
    Pending {
        /// Distinct actors that have acted so far
        acted: usize,
        /// Actors currently assigned
        assigned: usize,
    },

    /// The task advanced and new pending tasks were created
    Advanced {
        /// Tasks created at the next node(s)
        next_tasks: Vec<TaskId>,
    },

    /// No next node remained; the instance finished
    Finished,
}

impl WorkflowEngine {
    /// Complete (approve) a pending task
    pub fn complete_task(&self, request: CompleteTask) -> WorkflowResult<CompletionOutcome> {
        let task = self.load_task(request.task_id)?;
        let lock = self.instance_lock(task.instance_id);
        let _guard = lock.lock().unwrap();

        // Reload under the lock: a concurrent completer may have advanced
        // the task while we waited.
        let task = self.load_task(request.task_id)?;
        let instance = self.load_instance(task.instance_id)?;
        instance.status.guard_complete()?;
        self.ensure_can_act(&task, &request.actor, request.ignore_permission)?;

        let mut uow = UnitOfWork::new();

        // A first pass out of draft, cancelled or rejected-back marks a
        // (re)submission, distinguished for business-table listeners.
        if instance.status.is_resubmission() {
            uow.stage_event(WorkflowEvent::Process(ProcessEvent {
                flow_code: instance.flow_code.clone(),
                business_key: instance.business_key.clone(),
                status: instance.status,
                submitted: true,
            }));
        }
        uow.stage_event(WorkflowEvent::Task(ProcessTaskEvent {
            flow_code: instance.flow_code.clone(),
            node_code: task.node_code.clone(),
            task_id: task.id,
            business_key: instance.business_key.clone(),
        }));
        uow.merge_variables(instance.id, request.variables.clone());

        let pass_entry = HistoryTaskEntry::record(
            &task,
            Some(request.actor.clone()),
            CooperationType::Pass,
            request.message.clone(),
        );

        if task.is_counter_sign() {
            let (acted, assigned) = self.cooperation_progress(&task, &request.actor);
            if !quorum_reached(acted, assigned, task.ratio) {
                debug!(
                    task = %task.id,
                    acted,
                    assigned,
                    ratio = %task.ratio,
                    "counter-sign quorum not reached, task stays pending"
                );
                uow.append_history(pass_entry);
                uow.set_status(instance.id, BusinessStatus::Waiting);
                let outbox = uow.commit(self.store.as_ref(), self.ledger.as_ref());
                outbox.drain_into(self.sink.as_ref());
                return Ok(CompletionOutcome::Pending { acted, assigned });
            }
        }

        // Quorum reached (or a single-actor node): advance through the
        // graph. Collaborator failures before commit abort with no trace.
        let next_nodes =
            self.skip
                .compute_next(task.definition_id, &task.node_code, SkipType::Pass)?;

        if !request.copy_to.is_empty() {
            self.stage_carbon_copy(&mut uow, &task, &request, &pass_entry);
        }
        uow.append_history(pass_entry);
        uow.remove_task(task.id);

        let mut next_tasks = Vec::new();
        for node in &next_nodes {
            if node.node_type != NodeType::Between {
                continue;
            }
            let next_task = ActiveTask::enter(&instance, node);
            let approvals = self.resolved_approvals(&next_task)?;
            uow.replace_actors(next_task.id, approvals);
            next_tasks.push(next_task.id);
            uow.insert_task(next_task);
        }

        let siblings = self
            .store
            .tasks_for_instance(instance.id)
            .iter()
            .filter(|t| t.id != task.id)
            .count();

        let outcome = if next_tasks.is_empty() && siblings == 0 {
            uow.set_status(instance.id, BusinessStatus::Finish);
            uow.stage_event(WorkflowEvent::Process(ProcessEvent {
                flow_code: instance.flow_code.clone(),
                business_key: instance.business_key.clone(),
                status: BusinessStatus::Finish,
                submitted: false,
            }));
            info!(instance = %instance.id, "workflow instance finished");
            CompletionOutcome::Finished
        } else {
            uow.set_status(instance.id, BusinessStatus::Waiting);
            CompletionOutcome::Advanced { next_tasks }
        };

        let outbox = uow.commit(self.store.as_ref(), self.ledger.as_ref());
        outbox.drain_into(self.sink.as_ref());
        self.remind_pending_actors(&request, &instance.flow_code, instance.id);

        Ok(outcome)
    }

    /// Distinct actors that have passed this task so far (including the
    /// current one), and the number of assigned acting actors
    fn cooperation_progress(&self, task: &ActiveTask, actor: &ActorId) -> (usize, usize) {
        let mut acted: HashSet<ActorId> = self
            .store
            .history_for_task(task.id)
            .into_iter()
            .filter(|entry| entry.cooperation == CooperationType::Pass)
            .filter_map(|entry| entry.actor)
            .collect();
        acted.insert(actor.clone());

        let assigned = self.ledger.acting_actors(&[task.id]).len();
        (acted.len(), assigned)
    }

    /// Stage the carbon-copy bookkeeping: a synthetic non-advancing task
    /// holding the recipients, and a copy entry backdated before the pass
    /// entry so audit order matches causal order
    fn stage_carbon_copy(
        &self,
        uow: &mut UnitOfWork,
        task: &ActiveTask,
        request: &CompleteTask,
        pass_entry: &HistoryTaskEntry,
    ) {
        let copy_task_id = TaskId::new();
        let recipients = request
            .copy_to
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut copy_entry = HistoryTaskEntry::record(
            task,
            Some(request.actor.clone()),
            CooperationType::Copy,
            Some(format!("Copied to {recipients}")),
        )
        .backdated(pass_entry.recorded_at - Duration::seconds(1));
        copy_entry.task_id = copy_task_id;

        uow.append_history(copy_entry);
        uow.replace_actors(
            copy_task_id,
            request
                .copy_to
                .iter()
                .map(|actor| {
                    crate::model::ActorAssociation::new(
                        copy_task_id,
                        actor.clone(),
                        crate::model::AssignmentType::CarbonCopy,
                    )
                })
                .collect(),
        );
    }

    /// Post-commit reminder to everyone now holding a pending task
    fn remind_pending_actors(
        &self,
        request: &CompleteTask,
        flow_code: &str,
        instance_id: crate::identifiers::InstanceId,
    ) {
        if request.notify.is_empty() {
            return;
        }
        let task_ids: Vec<TaskId> = self
            .store
            .tasks_for_instance(instance_id)
            .iter()
            .map(|t| t.id)
            .collect();
        let actors = self.ledger.acting_actors(&task_ids);
        let default_message =
            format!("A new {flow_code} ticket has been submitted to you, please handle it promptly");
        let message = request.notify_message.as_deref().unwrap_or(&default_message);
        notify_best_effort(self.dispatcher.as_ref(), &actors, message, &request.notify);
    }
}

/// Quorum arithmetic for counter-sign nodes
///
/// Ratios are configured at per-cent resolution, so the acted share is
/// rounded to two decimal places before the comparison: two of three
/// actors (0.666...) reach a 0.67 ratio. A ratio of zero never gets here;
/// callers advance single-actor nodes directly. With no assigned actors
/// the node degenerates to single-actor completion.
fn quorum_reached(acted: usize, assigned: usize, ratio: Decimal) -> bool {
    if assigned == 0 {
        return true;
    }
    let share = Decimal::from(acted as u64) / Decimal::from(assigned as u64);
    share.round_dp(2) >= ratio
}

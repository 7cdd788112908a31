// Copyright 2025 Cowboy AI, LLC.

//! Terminating and withdrawing running instances
//!
//! Termination retires every pending task and ends the instance for good.
//! Withdrawal (cancel) retires every pending task too, but rewinds the
//! record to its applicant node so the initiator can resubmit.

use crate::commands::{CancelInstance, TerminateTask};
use crate::errors::WorkflowResult;
use crate::events::{ProcessEvent, WorkflowEvent};
use crate::model::{ActorAssociation, AssignmentType, ActiveTask, CooperationType, HistoryTaskEntry};
use crate::status::BusinessStatus;
use tracing::info;

use super::unit_of_work::UnitOfWork;
use super::WorkflowEngine;

impl WorkflowEngine {
    /// Terminate the instance owning `task_id`
    pub fn terminate_task(&self, request: TerminateTask) -> WorkflowResult<()> {
        let task = self.load_task(request.task_id)?;
        let lock = self.instance_lock(task.instance_id);
        let _guard = lock.lock().unwrap();

        let task = self.load_task(request.task_id)?;
        let instance = self.load_instance(task.instance_id)?;
        instance.status.guard_terminate()?;

        let mut uow = UnitOfWork::new();
        for pending in self.store.tasks_for_instance(instance.id) {
            let actor = if pending.id == task.id {
                Some(request.actor.clone())
            } else {
                None
            };
            uow.append_history(HistoryTaskEntry::record(
                &pending,
                actor,
                CooperationType::Termination,
                request.message.clone(),
            ));
            uow.remove_task(pending.id);
        }
        uow.set_status(instance.id, BusinessStatus::Termination);
        uow.stage_event(WorkflowEvent::Process(ProcessEvent {
            flow_code: instance.flow_code.clone(),
            business_key: instance.business_key.clone(),
            status: BusinessStatus::Termination,
            submitted: false,
        }));

        info!(instance = %instance.id, "workflow instance terminated");
        let outbox = uow.commit(self.store.as_ref(), self.ledger.as_ref());
        outbox.drain_into(self.sink.as_ref());
        Ok(())
    }

    /// Withdraw a running instance back to its initiator
    pub fn cancel_instance(&self, request: CancelInstance) -> WorkflowResult<()> {
        let lock = self.instance_lock(request.instance_id);
        let _guard = lock.lock().unwrap();

        let instance = self.load_instance(request.instance_id)?;
        instance.status.guard_cancel()?;

        let applicant = self.skip.applicant_node(instance.definition_id)?;

        let mut uow = UnitOfWork::new();
        for pending in self.store.tasks_for_instance(instance.id) {
            uow.append_history(HistoryTaskEntry::record(
                &pending,
                Some(request.actor.clone()),
                CooperationType::Cancel,
                request.message.clone(),
            ));
            uow.remove_task(pending.id);
        }

        // Rewind to the applicant node so the record can be resubmitted.
        let applicant_task = ActiveTask::enter(&instance, &applicant);
        uow.replace_actors(
            applicant_task.id,
            vec![ActorAssociation::new(
                applicant_task.id,
                instance.initiator.clone(),
                AssignmentType::Approval,
            )],
        );
        uow.insert_task(applicant_task);

        uow.set_status(instance.id, BusinessStatus::Cancel);
        uow.stage_event(WorkflowEvent::Process(ProcessEvent {
            flow_code: instance.flow_code.clone(),
            business_key: instance.business_key.clone(),
            status: BusinessStatus::Cancel,
            submitted: false,
        }));

        info!(instance = %instance.id, "workflow instance withdrawn");
        let outbox = uow.commit(self.store.as_ref(), self.ledger.as_ref());
        outbox.drain_into(self.sink.as_ref());
        Ok(())
    }
}

// Copyright 2025 Cowboy AI, LLC.

//! Staged mutations for one workflow operation
//!
//! Every engine operation stages its mutations and events here while the
//! fallible work (guards, token resolution, graph traversal) runs. Nothing
//! touches the store or ledger until [`UnitOfWork::commit`], so an error
//! anywhere before commit leaves no trace. Events ride along and are only
//! handed back for publication once the mutations are applied.

use crate::context::ProcessVariables;
use crate::events::{Outbox, WorkflowEvent};
use crate::identifiers::{InstanceId, TaskId};
use crate::ledger::CooperationLedger;
use crate::model::{ActiveTask, ActorAssociation, HistoryTaskEntry, Instance};
use crate::status::BusinessStatus;
use crate::store::WorkflowStore;

/// One staged state change
#[derive(Debug, Clone)]
pub(crate) enum Mutation {
    /// Create a new instance
    InsertInstance(Instance),

    /// Move an instance to a new business status
    SetStatus(InstanceId, BusinessStatus),

    /// Merge variables into an instance's bag
    MergeVariables(InstanceId, ProcessVariables),

    /// Create a pending task
    InsertTask(ActiveTask),

    /// Retire a pending task
    RemoveTask(TaskId),

    /// Append a history entry
    AppendHistory(HistoryTaskEntry),

    /// Replace a task's actor set as a unit
    ReplaceActors(TaskId, Vec<ActorAssociation>),
}

/// Mutations and events staged by one operation
#[derive(Default)]
pub(crate) struct UnitOfWork {
    mutations: Vec<Mutation>,
    outbox: Outbox,
}

impl UnitOfWork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_instance(&mut self, instance: Instance) {
        self.mutations.push(Mutation::InsertInstance(instance));
    }

    pub(crate) fn set_status(&mut self, instance_id: InstanceId, status: BusinessStatus) {
        self.mutations.push(Mutation::SetStatus(instance_id, status));
    }

    pub(crate) fn merge_variables(&mut self, instance_id: InstanceId, variables: ProcessVariables) {
        if !variables.data().is_empty() {
            self.mutations
                .push(Mutation::MergeVariables(instance_id, variables));
        }
    }

    pub(crate) fn insert_task(&mut self, task: ActiveTask) {
        self.mutations.push(Mutation::InsertTask(task));
    }

    pub(crate) fn remove_task(&mut self, task_id: TaskId) {
        self.mutations.push(Mutation::RemoveTask(task_id));
        self.mutations
            .push(Mutation::ReplaceActors(task_id, Vec::new()));
    }

    pub(crate) fn append_history(&mut self, entry: HistoryTaskEntry) {
        self.mutations.push(Mutation::AppendHistory(entry));
    }

    pub(crate) fn replace_actors(
        &mut self,
        task_id: TaskId,
        associations: Vec<ActorAssociation>,
    ) {
        self.mutations
            .push(Mutation::ReplaceActors(task_id, associations));
    }

    pub(crate) fn stage_event(&mut self, event: WorkflowEvent) {
        self.outbox.push(event);
    }

    /// Apply every staged mutation in order and hand back the outbox
    ///
    /// Must only be called once all fallible work is done; the apply loop
    /// itself cannot fail.
    pub(crate) fn commit(
        self,
        store: &dyn WorkflowStore,
        ledger: &dyn CooperationLedger,
    ) -> Outbox {
        for mutation in self.mutations {
            match mutation {
                Mutation::InsertInstance(instance) => store.insert_instance(instance),
                Mutation::SetStatus(id, status) => store.set_status(id, status),
                Mutation::MergeVariables(id, variables) => store.set_variables(id, variables),
                Mutation::InsertTask(task) => store.insert_task(task),
                Mutation::RemoveTask(id) => store.remove_task(id),
                Mutation::AppendHistory(entry) => store.append_history(entry),
                Mutation::ReplaceActors(id, associations) => {
                    ledger.replace_actors(id, associations)
                }
            }
        }
        self.outbox
    }
}

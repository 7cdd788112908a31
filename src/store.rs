// Copyright 2025 Cowboy AI, LLC.

//! Workflow state store
//!
//! Holds the logical entities of the core: instances, active tasks, and the
//! append-only task history. Mutation methods are the commit surface of a
//! unit of work and must not fail for domain reasons; every fallible check
//! happens before the first mutation. A transactional backend implements
//! the same surface inside one database transaction.

use crate::identifiers::{InstanceId, TaskId};
use crate::model::{ActiveTask, HistoryTaskEntry, Instance};
use crate::status::BusinessStatus;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

/// Persistence seam for instances, tasks, and history
pub trait WorkflowStore: Send + Sync {
    /// Insert a new instance
    fn insert_instance(&self, instance: Instance);

    /// Load an instance
    fn instance(&self, id: InstanceId) -> Option<Instance>;

    /// Load the instance owning a business record
    fn instance_by_business_key(&self, business_key: &str) -> Option<Instance>;

    /// Update an instance's business status
    fn set_status(&self, id: InstanceId, status: BusinessStatus);

    /// Merge updated variables into an instance
    fn set_variables(&self, id: InstanceId, variables: crate::context::ProcessVariables);

    /// Remove an instance, cascading to its tasks and history
    fn remove_instance(&self, id: InstanceId) -> Vec<TaskId>;

    /// Insert a pending task
    fn insert_task(&self, task: ActiveTask);

    /// Load a pending task
    fn task(&self, id: TaskId) -> Option<ActiveTask>;

    /// Retire a pending task
    fn remove_task(&self, id: TaskId);

    /// Every pending task of an instance, oldest first
    fn tasks_for_instance(&self, instance_id: InstanceId) -> Vec<ActiveTask>;

    /// Append a history entry
    fn append_history(&self, entry: HistoryTaskEntry);

    /// History of an instance in causal (timestamp) order
    fn history_for_instance(&self, instance_id: InstanceId) -> Vec<HistoryTaskEntry>;

    /// History recorded against one task id
    fn history_for_task(&self, task_id: TaskId) -> Vec<HistoryTaskEntry>;
}

/// In-memory store for embedding and tests
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    instances: HashMap<InstanceId, Instance>,
    tasks: HashMap<TaskId, ActiveTask>,
    history: Vec<HistoryTaskEntry>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkflowStore for InMemoryStore {
    fn insert_instance(&self, instance: Instance) {
        self.inner
            .write()
            .unwrap()
            .instances
            .insert(instance.id, instance);
    }

    fn instance(&self, id: InstanceId) -> Option<Instance> {
        self.inner.read().unwrap().instances.get(&id).cloned()
    }

    fn instance_by_business_key(&self, business_key: &str) -> Option<Instance> {
        self.inner
            .read()
            .unwrap()
            .instances
            .values()
            .find(|i| i.business_key == business_key)
            .cloned()
    }

    fn set_status(&self, id: InstanceId, status: BusinessStatus) {
        if let Some(instance) = self.inner.write().unwrap().instances.get_mut(&id) {
            instance.status = status;
            instance.updated_at = Utc::now();
        }
    }

    fn set_variables(&self, id: InstanceId, variables: crate::context::ProcessVariables) {
        if let Some(instance) = self.inner.write().unwrap().instances.get_mut(&id) {
            instance.variables.merge(variables);
            instance.updated_at = Utc::now();
        }
    }

    fn remove_instance(&self, id: InstanceId) -> Vec<TaskId> {
        let mut inner = self.inner.write().unwrap();
        inner.instances.remove(&id);
        let task_ids: Vec<TaskId> = inner
            .tasks
            .values()
            .filter(|t| t.instance_id == id)
            .map(|t| t.id)
            .collect();
        for task_id in &task_ids {
            inner.tasks.remove(task_id);
        }
        inner.history.retain(|h| h.instance_id != id);
        task_ids
    }

    fn insert_task(&self, task: ActiveTask) {
        self.inner.write().unwrap().tasks.insert(task.id, task);
    }

    fn task(&self, id: TaskId) -> Option<ActiveTask> {
        self.inner.read().unwrap().tasks.get(&id).cloned()
    }

    fn remove_task(&self, id: TaskId) {
        self.inner.write().unwrap().tasks.remove(&id);
    }

    fn tasks_for_instance(&self, instance_id: InstanceId) -> Vec<ActiveTask> {
        let mut tasks: Vec<ActiveTask> = self
            .inner
            .read()
            .unwrap()
            .tasks
            .values()
            .filter(|t| t.instance_id == instance_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.created_at);
        tasks
    }

    fn append_history(&self, entry: HistoryTaskEntry) {
        self.inner.write().unwrap().history.push(entry);
    }

    fn history_for_instance(&self, instance_id: InstanceId) -> Vec<HistoryTaskEntry> {
        let mut entries: Vec<HistoryTaskEntry> = self
            .inner
            .read()
            .unwrap()
            .history
            .iter()
            .filter(|h| h.instance_id == instance_id)
            .cloned()
            .collect();
        entries.sort_by_key(|h| h.recorded_at);
        entries
    }

    fn history_for_task(&self, task_id: TaskId) -> Vec<HistoryTaskEntry> {
        self.inner
            .read()
            .unwrap()
            .history
            .iter()
            .filter(|h| h.task_id == task_id)
            .cloned()
            .collect()
    }
}

// Copyright 2025 Cowboy AI, LLC.

//! Task cooperation ledger
//!
//! Tracks which resolved actors are attached to each active task. The actor
//! set of a task is always replaced as a whole - delete then insert inside
//! one write lock - so a concurrent reader can never observe a mixture of
//! old and new actors.

use crate::identifiers::{ActorId, TaskId};
use crate::model::{ActorAssociation, AssignmentType};
use std::collections::HashMap;
use std::sync::RwLock;

/// Actor-association bookkeeping per active task
pub trait CooperationLedger: Send + Sync {
    /// Atomically replace every association of `task_id` with `associations`
    fn replace_actors(&self, task_id: TaskId, associations: Vec<ActorAssociation>);

    /// Current associations of a task
    fn current_actors(&self, task_id: TaskId) -> Vec<ActorAssociation>;

    /// Associations aggregated across several tasks, in task order
    fn actors_for_tasks(&self, task_ids: &[TaskId]) -> Vec<ActorAssociation>;
}

/// Convenience queries shared by every ledger implementation
pub trait CooperationLedgerExt: CooperationLedger {
    /// Whether `actor` may act on `task_id` (carbon-copy recipients may not)
    fn can_act(&self, task_id: TaskId, actor: &ActorId) -> bool {
        self.current_actors(task_id)
            .iter()
            .any(|a| a.assignment.can_act() && &a.actor == actor)
    }

    /// Distinct actors able to act across `task_ids`, in first-seen order
    fn acting_actors(&self, task_ids: &[TaskId]) -> Vec<ActorId> {
        let mut seen = Vec::new();
        for association in self.actors_for_tasks(task_ids) {
            if association.assignment.can_act() && !seen.contains(&association.actor) {
                seen.push(association.actor);
            }
        }
        seen
    }
}

impl<L: CooperationLedger + ?Sized> CooperationLedgerExt for L {}

/// In-memory ledger guarded by a single lock
#[derive(Default)]
pub struct InMemoryLedger {
    associations: RwLock<HashMap<TaskId, Vec<ActorAssociation>>>,
}

impl InMemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Build approval associations for `task_id` from resolved actors
    pub fn approvals<I>(task_id: TaskId, actors: I) -> Vec<ActorAssociation>
    where
        I: IntoIterator<Item = ActorId>,
    {
        actors
            .into_iter()
            .map(|actor| ActorAssociation::new(task_id, actor, AssignmentType::Approval))
            .collect()
    }
}

impl CooperationLedger for InMemoryLedger {
    fn replace_actors(&self, task_id: TaskId, associations: Vec<ActorAssociation>) {
        let mut map = self.associations.write().unwrap();
        if associations.is_empty() {
            map.remove(&task_id);
        } else {
            map.insert(task_id, associations);
        }
    }

    fn current_actors(&self, task_id: TaskId) -> Vec<ActorAssociation> {
        self.associations
            .read()
            .unwrap()
            .get(&task_id)
            .cloned()
            .unwrap_or_default()
    }

    fn actors_for_tasks(&self, task_ids: &[TaskId]) -> Vec<ActorAssociation> {
        let map = self.associations.read().unwrap();
        task_ids
            .iter()
            .flat_map(|id| map.get(id).cloned().unwrap_or_default())
            .collect()
    }
}

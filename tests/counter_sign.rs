//! Counter-sign and or-sign quorum scenarios.

mod support;

use flow_domain::WorkflowStore;
use flow_domain::{
    ActorId, BusinessStatus, CompleteTask, CompletionOutcome, CooperationType, IdentityDirectory,
    LookupError, Node, ProcessVariables, StartProcess, TaskId, WorkflowError,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use support::{end_node, harness, start_node, Harness};

/// start -> apply -> review(ratio) -> end, review held by three reviewers.
fn quorum_harness(ratio: &str) -> Harness {
    let ratio: Decimal = ratio.parse().unwrap();
    let h = harness(
        "purchase-order",
        vec![
            start_node(),
            Node::between("apply", "Apply"),
            Node::between("review", "Joint Review")
                .with_ratio(ratio)
                .with_permissions(["role:reviewers"]),
            end_node(),
        ],
        vec![("start", "apply"), ("apply", "review"), ("review", "end")],
    );
    h.directory.add_role("reviewers", ["r-1", "r-2", "r-3"]);
    h
}

/// Start and move the instance onto the review node.
fn at_review(h: &Harness, business_key: &str) -> TaskId {
    let started = h
        .engine
        .start_process(StartProcess {
            definition_id: h.definition,
            business_key: business_key.to_string(),
            initiator: ActorId::from("u-1"),
            variables: ProcessVariables::new(),
        })
        .unwrap();
    match h
        .engine
        .complete_task(CompleteTask::new(started.task_id, ActorId::from("u-1")))
        .unwrap()
    {
        CompletionOutcome::Advanced { next_tasks } => next_tasks[0],
        other => panic!("expected advance, got {other:?}"),
    }
}

#[test]
fn two_of_three_quorum_advances_on_second_actor() {
    let h = quorum_harness("0.67");
    let review = at_review(&h, "PO-1");

    // First actor: recorded but pending.
    let outcome = h
        .engine
        .complete_task(CompleteTask::new(review, ActorId::from("r-1")))
        .unwrap();
    assert_eq!(
        outcome,
        CompletionOutcome::Pending {
            acted: 1,
            assigned: 3
        }
    );
    assert!(h.store.task(review).is_some());
    assert_eq!(h.store.history_for_task(review).len(), 1);

    // Second actor reaches 2/3 >= 0.67 and the node advances.
    let outcome = h
        .engine
        .complete_task(CompleteTask::new(review, ActorId::from("r-2")))
        .unwrap();
    assert_eq!(outcome, CompletionOutcome::Finished);
    assert!(h.store.task(review).is_none());

    let passes: Vec<_> = h
        .store
        .history_for_task(review)
        .into_iter()
        .filter(|e| e.cooperation == CooperationType::Pass)
        .collect();
    assert_eq!(passes.len(), 2);
}

#[test]
fn third_action_on_advanced_task_fails_cleanly() {
    let h = quorum_harness("0.67");
    let review = at_review(&h, "PO-2");

    h.engine
        .complete_task(CompleteTask::new(review, ActorId::from("r-1")))
        .unwrap();
    h.engine
        .complete_task(CompleteTask::new(review, ActorId::from("r-2")))
        .unwrap();

    let err = h
        .engine
        .complete_task(CompleteTask::new(review, ActorId::from("r-3")))
        .unwrap_err();
    assert!(matches!(err, WorkflowError::TaskNotFound(_)));
}

#[test]
fn half_quorum_of_four_needs_two_distinct_actors() {
    let h = quorum_harness("0.5");
    h.directory.add_role("reviewers", ["r-1", "r-2", "r-3", "r-4"]);
    let review = at_review(&h, "PO-3");

    assert_eq!(
        h.engine
            .complete_task(CompleteTask::new(review, ActorId::from("r-1")))
            .unwrap(),
        CompletionOutcome::Pending {
            acted: 1,
            assigned: 4
        }
    );

    // The same actor acting again does not grow the distinct count.
    assert_eq!(
        h.engine
            .complete_task(CompleteTask::new(review, ActorId::from("r-1")))
            .unwrap(),
        CompletionOutcome::Pending {
            acted: 1,
            assigned: 4
        }
    );

    assert_eq!(
        h.engine
            .complete_task(CompleteTask::new(review, ActorId::from("r-2")))
            .unwrap(),
        CompletionOutcome::Finished
    );
}

#[test]
fn or_sign_node_completes_on_first_actor() {
    let h = quorum_harness("0");
    let review = at_review(&h, "PO-4");

    let outcome = h
        .engine
        .complete_task(CompleteTask::new(review, ActorId::from("r-3")))
        .unwrap();
    assert_eq!(outcome, CompletionOutcome::Finished);

    let history = h.store.history_for_task(review);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].actor, Some(ActorId::from("r-3")));
}

#[test]
fn partial_pass_keeps_instance_waiting() {
    let h = quorum_harness("1");
    let review = at_review(&h, "PO-5");
    let instance_id = h.store.task(review).unwrap().instance_id;

    h.engine
        .complete_task(CompleteTask::new(review, ActorId::from("r-1")))
        .unwrap();
    assert_eq!(
        h.store.instance(instance_id).unwrap().status,
        BusinessStatus::Waiting
    );

    // Ratio 1 requires every reviewer.
    h.engine
        .complete_task(CompleteTask::new(review, ActorId::from("r-2")))
        .unwrap();
    let outcome = h
        .engine
        .complete_task(CompleteTask::new(review, ActorId::from("r-3")))
        .unwrap();
    assert_eq!(outcome, CompletionOutcome::Finished);
}

/// Directory that fails hard, for atomicity checks.
struct BrokenDirectory;

impl IdentityDirectory for BrokenDirectory {
    fn users_of_role(&self, _role_id: &str) -> Result<Vec<ActorId>, LookupError> {
        Err(LookupError::Backend("directory offline".to_string()))
    }

    fn users_of_dept(&self, _dept_id: &str) -> Result<Vec<ActorId>, LookupError> {
        Err(LookupError::Backend("directory offline".to_string()))
    }

    fn users_of_post(&self, _post_id: &str) -> Result<Vec<ActorId>, LookupError> {
        Err(LookupError::Backend("directory offline".to_string()))
    }
}

#[test]
fn collaborator_failure_rolls_back_whole_completion() {
    use flow_domain::{
        InMemoryLedger, InMemoryStore, RecordingDispatcher, RecordingEventSink, RouteTable,
        NodeCode, WorkflowEngine,
    };
    use std::sync::Arc;

    let store = Arc::new(InMemoryStore::new());
    let ledger = Arc::new(InMemoryLedger::new());
    let routes = Arc::new(RouteTable::new());
    let sink = Arc::new(RecordingEventSink::new());
    let definition = flow_domain::DefinitionId::new();
    routes
        .register(
            definition,
            "purchase-order",
            vec![
                start_node(),
                Node::between("apply", "Apply"),
                Node::between("review", "Joint Review").with_permissions(["role:reviewers"]),
                end_node(),
            ],
            vec![
                (NodeCode::from("start"), NodeCode::from("apply")),
                (NodeCode::from("apply"), NodeCode::from("review")),
                (NodeCode::from("review"), NodeCode::from("end")),
            ],
        )
        .unwrap();
    let engine = WorkflowEngine::new(
        store.clone(),
        ledger.clone(),
        routes,
        Arc::new(BrokenDirectory),
        Arc::new(RecordingDispatcher::new()),
        sink.clone(),
    );

    let started = engine
        .start_process(StartProcess {
            definition_id: definition,
            business_key: "PO-6".to_string(),
            initiator: ActorId::from("u-1"),
            variables: ProcessVariables::new(),
        })
        .unwrap();

    // Resolving the review node's role token hits the broken backend.
    let err = engine
        .complete_task(CompleteTask::new(started.task_id, ActorId::from("u-1")))
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Collaborator { .. }));

    // Nothing committed and nothing published: the apply task is still
    // pending, the instance still draft, the history empty.
    assert!(store.task(started.task_id).is_some());
    assert_eq!(
        store.instance(started.instance_id).unwrap().status,
        BusinessStatus::Draft
    );
    assert!(store.history_for_instance(started.instance_id).is_empty());
    assert!(sink.published().is_empty());
}

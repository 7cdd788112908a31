//! Reject/back routing over parallel branches.

mod support;

use flow_domain::WorkflowStore;
use flow_domain::{
    ActorId, BusinessStatus, CancelInstance, CompleteTask, CompletionOutcome, CooperationType,
    InstanceId, Node, NodeCode, ProcessVariables, RejectTask, StartProcess, TaskId,
    TerminateTask, WorkflowError, WorkflowEvent,
};
use pretty_assertions::assert_eq;
use support::{end_node, harness, start_node, Harness};

/// start -> apply -> screen -> (finance | legal) -> end.
fn parallel_harness() -> Harness {
    let h = harness(
        "vendor-onboarding",
        vec![
            start_node(),
            Node::between("apply", "Apply"),
            Node::between("screen", "Screening").with_permissions(["role:screeners"]),
            Node::between("finance", "Finance Review").with_permissions(["role:finance"]),
            Node::between("legal", "Legal Review").with_permissions(["role:legal"]),
            end_node(),
        ],
        vec![
            ("start", "apply"),
            ("apply", "screen"),
            ("screen", "finance"),
            ("screen", "legal"),
            ("finance", "end"),
            ("legal", "end"),
        ],
    );
    h.directory.add_role("screeners", ["sc-1"]);
    h.directory.add_role("finance", ["f-1"]);
    h.directory.add_role("legal", ["l-1"]);
    h
}

/// Run the instance onto the parallel branches; returns the two branch tasks.
fn at_branches(h: &Harness, business_key: &str) -> (InstanceId, TaskId, TaskId) {
    let started = h
        .engine
        .start_process(StartProcess {
            definition_id: h.definition,
            business_key: business_key.to_string(),
            initiator: ActorId::from("u-1"),
            variables: ProcessVariables::new(),
        })
        .unwrap();
    let screen = match h
        .engine
        .complete_task(CompleteTask::new(started.task_id, ActorId::from("u-1")))
        .unwrap()
    {
        CompletionOutcome::Advanced { next_tasks } => next_tasks[0],
        other => panic!("expected advance, got {other:?}"),
    };
    let branches = match h
        .engine
        .complete_task(CompleteTask::new(screen, ActorId::from("sc-1")))
        .unwrap()
    {
        CompletionOutcome::Advanced { next_tasks } => next_tasks,
        other => panic!("expected fan-out, got {other:?}"),
    };
    assert_eq!(branches.len(), 2, "screen fans out to finance and legal");
    (started.instance_id, branches[0], branches[1])
}

#[test]
fn partial_reject_collapses_parallel_branches() {
    let h = parallel_harness();
    let (instance_id, finance, _legal) = at_branches(&h, "VO-1");

    let outcome = h
        .engine
        .reject_task(RejectTask::new(
            finance,
            ActorId::from("f-1"),
            NodeCode::from("screen"),
        ))
        .unwrap();

    assert!(!outcome.full_reject);
    // Both parallel branches were rewound, not just the rejecting one.
    assert_eq!(outcome.retired_tasks, 2);

    let tasks = h.store.tasks_for_instance(instance_id);
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].node_code, NodeCode::from("screen"));
    assert_eq!(tasks[0].id, outcome.target_task);

    // Partial reject leaves the record under review.
    assert_eq!(
        h.store.instance(instance_id).unwrap().status,
        BusinessStatus::Waiting
    );

    // The screening node got its actors re-resolved.
    let actors = h.engine.current_actors(outcome.target_task);
    assert_eq!(actors.len(), 1);
    assert_eq!(actors[0].actor, ActorId::from("sc-1"));

    // One back entry per retired branch.
    let backs: Vec<_> = h
        .store
        .history_for_instance(instance_id)
        .into_iter()
        .filter(|e| e.cooperation == CooperationType::Back)
        .collect();
    assert_eq!(backs.len(), 2);
    assert!(backs
        .iter()
        .all(|e| e.target_node_code == Some(NodeCode::from("screen"))));
}

#[test]
fn full_reject_returns_record_to_applicant() {
    let h = parallel_harness();
    let (instance_id, finance, _legal) = at_branches(&h, "VO-2");

    let outcome = h
        .engine
        .reject_task(
            RejectTask::new(finance, ActorId::from("f-1"), NodeCode::from("apply")),
        )
        .unwrap();

    assert!(outcome.full_reject);
    assert_eq!(
        h.store.instance(instance_id).unwrap().status,
        BusinessStatus::Back
    );

    // The applicant task belongs to the initiator again.
    let actors = h.engine.current_actors(outcome.target_task);
    assert_eq!(actors.len(), 1);
    assert_eq!(actors[0].actor, ActorId::from("u-1"));

    // Only a full reject publishes a process event.
    let back_events: Vec<_> = h
        .sink
        .published()
        .into_iter()
        .filter_map(|e| match e {
            WorkflowEvent::Process(p) if p.status == BusinessStatus::Back => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(back_events.len(), 1);
    assert!(!back_events[0].submitted);
}

#[test]
fn resubmission_after_full_reject_is_flagged() {
    let h = parallel_harness();
    let (instance_id, finance, _legal) = at_branches(&h, "VO-3");

    let outcome = h
        .engine
        .reject_task(
            RejectTask::new(finance, ActorId::from("f-1"), NodeCode::from("apply")),
        )
        .unwrap();

    h.engine
        .complete_task(CompleteTask::new(outcome.target_task, ActorId::from("u-1")))
        .unwrap();

    let resubmissions: Vec<_> = h
        .sink
        .published()
        .into_iter()
        .filter_map(|e| match e {
            WorkflowEvent::Process(p) if p.submitted => Some(p),
            _ => None,
        })
        .collect();
    // Once out of draft at first submission, once out of back after the
    // reject.
    assert_eq!(resubmissions.len(), 2);
    assert_eq!(resubmissions[1].status, BusinessStatus::Back);
    assert_eq!(
        h.store.instance(instance_id).unwrap().status,
        BusinessStatus::Waiting
    );
}

#[test]
fn reject_to_current_node_is_a_no_op() {
    let h = parallel_harness();
    let started = h
        .engine
        .start_process(StartProcess {
            definition_id: h.definition,
            business_key: "VO-4".to_string(),
            initiator: ActorId::from("u-1"),
            variables: ProcessVariables::new(),
        })
        .unwrap();
    let screen = match h
        .engine
        .complete_task(CompleteTask::new(started.task_id, ActorId::from("u-1")))
        .unwrap()
    {
        CompletionOutcome::Advanced { next_tasks } => next_tasks[0],
        other => panic!("expected advance, got {other:?}"),
    };

    let before = h.store.history_for_instance(started.instance_id).len();
    let outcome = h
        .engine
        .reject_task(RejectTask::new(
            screen,
            ActorId::from("sc-1"),
            NodeCode::from("screen"),
        ))
        .unwrap();

    assert_eq!(outcome.retired_tasks, 0);
    assert_eq!(outcome.target_task, screen);
    assert_eq!(h.store.history_for_instance(started.instance_id).len(), before);
}

#[test]
fn reject_to_unknown_node_is_a_named_error() {
    let h = parallel_harness();
    let (_, finance, _) = at_branches(&h, "VO-5");

    let err = h
        .engine
        .reject_task(RejectTask::new(
            finance,
            ActorId::from("f-1"),
            NodeCode::from("ghost"),
        ))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn termination_retires_every_branch() {
    let h = parallel_harness();
    let (instance_id, finance, legal) = at_branches(&h, "VO-6");

    h.engine
        .terminate_task(TerminateTask {
            task_id: finance,
            actor: ActorId::from("admin"),
            message: None,
        })
        .unwrap();

    assert!(h.store.task(finance).is_none());
    assert!(h.store.task(legal).is_none());
    assert_eq!(
        h.store.instance(instance_id).unwrap().status,
        BusinessStatus::Termination
    );

    let terminations: Vec<_> = h
        .store
        .history_for_instance(instance_id)
        .into_iter()
        .filter(|e| e.cooperation == CooperationType::Termination)
        .collect();
    assert_eq!(terminations.len(), 2);

    // Terminal for every further operation.
    let err = h
        .engine
        .cancel_instance(CancelInstance {
            instance_id,
            actor: ActorId::from("u-1"),
            message: None,
        })
        .unwrap_err();
    assert_eq!(err, WorkflowError::AlreadyTerminated);
}

#[test]
fn cancel_rewinds_to_applicant_for_resubmission() {
    let h = parallel_harness();
    let (instance_id, _finance, _legal) = at_branches(&h, "VO-7");

    h.engine
        .cancel_instance(CancelInstance {
            instance_id,
            actor: ActorId::from("u-1"),
            message: Some("submitted by mistake".to_string()),
        })
        .unwrap();

    assert_eq!(
        h.store.instance(instance_id).unwrap().status,
        BusinessStatus::Cancel
    );
    let tasks = h.store.tasks_for_instance(instance_id);
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].node_code, NodeCode::from("apply"));

    // Rejecting a cancelled record is an illegal transition by name.
    let err = h
        .engine
        .reject_task(RejectTask::new(
            tasks[0].id,
            ActorId::from("u-1"),
            NodeCode::from("apply"),
        ))
        .unwrap_err();
    assert_eq!(err, WorkflowError::AlreadyCancelled);

    // But starting over the same business key resumes the applicant task.
    let resumed = h
        .engine
        .start_process(StartProcess {
            definition_id: h.definition,
            business_key: "VO-7".to_string(),
            initiator: ActorId::from("u-1"),
            variables: ProcessVariables::new(),
        })
        .unwrap();
    assert!(resumed.resumed);
    assert_eq!(resumed.task_id, tasks[0].id);
}

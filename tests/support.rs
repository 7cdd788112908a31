//! Shared harness for workflow scenario tests.
//! Wires an engine over the in-memory reference collaborators.

#![allow(dead_code)]

use flow_domain::{
    DefinitionId, InMemoryDirectory, InMemoryLedger, InMemoryStore, Node, NodeCode, NodeType,
    RecordingDispatcher, RecordingEventSink, RouteTable, WorkflowEngine,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Engine plus handles on every collaborator, for assertions.
pub struct Harness {
    pub engine: WorkflowEngine,
    pub store: Arc<InMemoryStore>,
    pub ledger: Arc<InMemoryLedger>,
    pub routes: Arc<RouteTable>,
    pub directory: Arc<InMemoryDirectory>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub sink: Arc<RecordingEventSink>,
    pub definition: DefinitionId,
}

/// Build a harness around one registered definition.
pub fn harness(flow_code: &str, nodes: Vec<Node>, edges: Vec<(&str, &str)>) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let ledger = Arc::new(InMemoryLedger::new());
    let routes = Arc::new(RouteTable::new());
    let directory = Arc::new(InMemoryDirectory::new());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let sink = Arc::new(RecordingEventSink::new());

    let definition = DefinitionId::new();
    routes
        .register(
            definition,
            flow_code,
            nodes,
            edges
                .into_iter()
                .map(|(from, to)| (NodeCode::from(from), NodeCode::from(to)))
                .collect(),
        )
        .unwrap();

    let engine = WorkflowEngine::new(
        store.clone(),
        ledger.clone(),
        routes.clone(),
        directory.clone(),
        dispatcher.clone(),
        sink.clone(),
    );

    Harness {
        engine,
        store,
        ledger,
        routes,
        directory,
        dispatcher,
        sink,
        definition,
    }
}

/// Start node shorthand.
pub fn start_node() -> Node {
    Node {
        code: NodeCode::from("start"),
        name: "Start".to_string(),
        node_type: NodeType::Start,
        ratio: Decimal::ZERO,
        permissions: vec![],
    }
}

/// End node shorthand.
pub fn end_node() -> Node {
    Node {
        code: NodeCode::from("end"),
        name: "End".to_string(),
        node_type: NodeType::End,
        ratio: Decimal::ZERO,
        permissions: vec![],
    }
}

/// start -> apply -> end: the sole pending task belongs to the initiator.
pub fn single_step_harness() -> Harness {
    harness(
        "leave-request",
        vec![
            start_node(),
            Node::between("apply", "Apply"),
            end_node(),
        ],
        vec![("start", "apply"), ("apply", "end")],
    )
}

/// start -> apply -> review -> end, review held by role `manager`.
pub fn linear_harness() -> Harness {
    let h = harness(
        "leave-request",
        vec![
            start_node(),
            Node::between("apply", "Apply"),
            Node::between("review", "Manager Review").with_permissions(["role:manager"]),
            end_node(),
        ],
        vec![("start", "apply"), ("apply", "review"), ("review", "end")],
    );
    h.directory.add_role("manager", ["m-1", "m-2"]);
    h
}

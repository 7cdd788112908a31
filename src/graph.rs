// Copyright 2025 Cowboy AI, LLC.

//! Graph traversal seam
//!
//! The crate does not traverse process definition graphs itself. A
//! [`SkipEngine`] collaborator computes the node(s) reachable from a current
//! node under a skip direction; [`RouteTable`] is the in-memory reference
//! implementation used for embedding and tests (a node list plus directed
//! pass edges per definition).

use crate::errors::{WorkflowError, WorkflowResult};
use crate::identifiers::{DefinitionId, NodeCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Kind of a definition node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Entry node; never carries a task
    Start,

    /// Intermediate approval node
    Between,

    /// Exit node; reaching it finishes the instance
    End,

    /// Branching node resolved by the skip engine
    Gateway,
}

/// Direction of a skip through the definition graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipType {
    /// Forward along pass edges
    Pass,

    /// Backward along reject edges
    Reject,

    /// No movement; synthesized bookkeeping entries only
    None,
}

/// A node of a process definition, as the skip engine reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Code of the node, unique within its definition
    pub code: NodeCode,

    /// Display name
    pub name: String,

    /// Kind of node
    pub node_type: NodeType,

    /// Counter-sign ratio configured on the node
    pub ratio: Decimal,

    /// Raw assignee tokens authored on the node
    pub permissions: Vec<String>,
}

impl Node {
    /// Shorthand for an intermediate node without a counter-sign ratio
    pub fn between(code: impl Into<NodeCode>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            node_type: NodeType::Between,
            ratio: Decimal::ZERO,
            permissions: Vec::new(),
        }
    }

    /// Set the counter-sign ratio
    pub fn with_ratio(mut self, ratio: Decimal) -> Self {
        self.ratio = ratio;
        self
    }

    /// Set the raw assignee tokens
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }
}

/// Black-box graph traversal over process definitions
pub trait SkipEngine: Send + Sync {
    /// Compute the node(s) reachable from `node` under `skip_type`
    ///
    /// May return zero nodes (the process ends), one node, or several
    /// (parallel fan-out).
    fn compute_next(
        &self,
        definition: DefinitionId,
        node: &NodeCode,
        skip_type: SkipType,
    ) -> WorkflowResult<Vec<Node>>;

    /// Look up a single node of a definition
    fn node(&self, definition: DefinitionId, code: &NodeCode) -> WorkflowResult<Node>;

    /// The applicant node: the start node's sole successor
    fn applicant_node(&self, definition: DefinitionId) -> WorkflowResult<Node>;

    /// The flow code a definition was registered under
    fn definition_code(&self, definition: DefinitionId) -> WorkflowResult<String>;
}

/// One registered definition: its nodes and directed pass edges
#[derive(Debug, Clone, Default)]
struct Route {
    flow_code: String,
    nodes: HashMap<NodeCode, Node>,
    pass_edges: HashMap<NodeCode, Vec<NodeCode>>,
    start: Option<NodeCode>,
}

/// In-memory [`SkipEngine`] backed by per-definition route tables
pub struct RouteTable {
    routes: RwLock<HashMap<DefinitionId, Route>>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
        }
    }

    /// Register a definition from its node list and pass edges
    ///
    /// Exactly one node must be of type [`NodeType::Start`].
    pub fn register(
        &self,
        definition: DefinitionId,
        flow_code: impl Into<String>,
        nodes: Vec<Node>,
        pass_edges: Vec<(NodeCode, NodeCode)>,
    ) -> WorkflowResult<()> {
        let start = nodes
            .iter()
            .find(|n| n.node_type == NodeType::Start)
            .map(|n| n.code.clone())
            .ok_or_else(|| {
                WorkflowError::validation("definition must contain a start node")
            })?;

        let mut route = Route {
            flow_code: flow_code.into(),
            start: Some(start),
            ..Route::default()
        };
        for node in nodes {
            route.nodes.insert(node.code.clone(), node);
        }
        for (from, to) in pass_edges {
            route.pass_edges.entry(from).or_default().push(to);
        }
        self.routes.write().unwrap().insert(definition, route);
        Ok(())
    }

    fn with_route<T>(
        &self,
        definition: DefinitionId,
        f: impl FnOnce(&Route) -> WorkflowResult<T>,
    ) -> WorkflowResult<T> {
        let routes = self.routes.read().unwrap();
        let route = routes
            .get(&definition)
            .ok_or_else(|| WorkflowError::DefinitionNotFound(definition.to_string()))?;
        f(route)
    }
}

impl SkipEngine for RouteTable {
    fn compute_next(
        &self,
        definition: DefinitionId,
        node: &NodeCode,
        skip_type: SkipType,
    ) -> WorkflowResult<Vec<Node>> {
        self.with_route(definition, |route| {
            if !route.nodes.contains_key(node) {
                return Err(WorkflowError::UnknownNode {
                    node: node.to_string(),
                    definition: definition.to_string(),
                });
            }
            match skip_type {
                SkipType::None => Ok(Vec::new()),
                // Reject targets are chosen explicitly by the caller; a bare
                // reject skip falls back to no movement.
                SkipType::Reject => Ok(Vec::new()),
                SkipType::Pass => {
                    let mut next = Vec::new();
                    for code in route.pass_edges.get(node).into_iter().flatten() {
                        let target = route.nodes.get(code).ok_or_else(|| {
                            WorkflowError::UnknownNode {
                                node: code.to_string(),
                                definition: definition.to_string(),
                            }
                        })?;
                        next.push(target.clone());
                    }
                    Ok(next)
                }
            }
        })
    }

    fn node(&self, definition: DefinitionId, code: &NodeCode) -> WorkflowResult<Node> {
        self.with_route(definition, |route| {
            route
                .nodes
                .get(code)
                .cloned()
                .ok_or_else(|| WorkflowError::UnknownNode {
                    node: code.to_string(),
                    definition: definition.to_string(),
                })
        })
    }

    fn applicant_node(&self, definition: DefinitionId) -> WorkflowResult<Node> {
        self.with_route(definition, |route| {
            let start = route.start.as_ref().ok_or_else(|| {
                WorkflowError::validation("definition has no start node")
            })?;
            let successors = route.pass_edges.get(start).cloned().unwrap_or_default();
            match successors.as_slice() {
                [only] => route
                    .nodes
                    .get(only)
                    .cloned()
                    .ok_or_else(|| WorkflowError::UnknownNode {
                        node: only.to_string(),
                        definition: definition.to_string(),
                    }),
                _ => Err(WorkflowError::validation(
                    "the start node must have exactly one successor (the applicant node)",
                )),
            }
        })
    }

    fn definition_code(&self, definition: DefinitionId) -> WorkflowResult<String> {
        self.with_route(definition, |route| Ok(route.flow_code.clone()))
    }
}

// Copyright 2025 Cowboy AI, LLC.

//! Assignee resolution
//!
//! Expands the raw tokens attached to a task into a deduplicated set of
//! concrete actor identities. Group classes (role, department, post)
//! delegate to an [`IdentityDirectory`] collaborator; user-class tokens
//! resolve locally. An unknown group is a resolution gap, not a failure:
//! it degrades to an empty subset and the expansion continues. A directory
//! backend failure aborts the whole expansion.

use crate::assignee::AssigneeToken;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::identifiers::ActorId;
use indexmap::IndexSet;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use tracing::warn;

/// Errors an identity directory can report for one group lookup
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The group id names no known group; resolution degrades to empty
    #[error("unknown group: {0}")]
    UnknownGroup(String),

    /// The directory backend failed; the whole operation aborts
    #[error("directory backend failure: {0}")]
    Backend(String),
}

/// Identity lookup collaborator, one method per actor class
#[cfg_attr(test, mockall::automock)]
pub trait IdentityDirectory: Send + Sync {
    /// All member users of a role
    fn users_of_role(&self, role_id: &str) -> Result<Vec<ActorId>, LookupError>;

    /// All member users of a department
    fn users_of_dept(&self, dept_id: &str) -> Result<Vec<ActorId>, LookupError>;

    /// All holders of a post
    fn users_of_post(&self, post_id: &str) -> Result<Vec<ActorId>, LookupError>;
}

/// Expands assignee tokens into concrete actor sets
pub struct AssigneeResolver<'a> {
    directory: &'a dyn IdentityDirectory,
}

impl<'a> AssigneeResolver<'a> {
    /// Create a resolver over `directory`
    pub fn new(directory: &'a dyn IdentityDirectory) -> Self {
        Self { directory }
    }

    /// Resolve one token into its actor set
    ///
    /// Pure given the directory's current state; nothing is cached between
    /// calls.
    pub fn resolve(&self, token: &AssigneeToken) -> WorkflowResult<IndexSet<ActorId>> {
        let members = match token {
            AssigneeToken::User(id) | AssigneeToken::RawLegacy(id) => {
                return Ok(IndexSet::from([ActorId::new(id.clone())]));
            }
            AssigneeToken::Role(id) => self.directory.users_of_role(id),
            AssigneeToken::Dept(id) => self.directory.users_of_dept(id),
            AssigneeToken::Post(id) => self.directory.users_of_post(id),
        };

        match members {
            Ok(users) => Ok(users.into_iter().collect()),
            Err(LookupError::UnknownGroup(id)) => {
                warn!(token = %token, group = %id, "assignee group not found, skipping token");
                Ok(IndexSet::new())
            }
            Err(LookupError::Backend(message)) => Err(WorkflowError::Collaborator {
                service: "identity-directory".to_string(),
                message,
            }),
        }
    }

    /// Resolve a task's raw permission entries into one deduplicated set
    ///
    /// Deduplication is by actor id across the whole expansion, even when
    /// several tokens map to overlapping members; first-seen order is kept.
    pub fn resolve_all<S: AsRef<str>>(
        &self,
        raw_tokens: &[S],
    ) -> WorkflowResult<IndexSet<ActorId>> {
        let mut actors = IndexSet::new();
        for raw in raw_tokens {
            let token = AssigneeToken::decode(raw.as_ref());
            actors.extend(self.resolve(&token)?);
        }
        Ok(actors)
    }
}

/// In-memory identity directory for embedding and tests
#[derive(Default)]
pub struct InMemoryDirectory {
    roles: RwLock<HashMap<String, Vec<ActorId>>>,
    depts: RwLock<HashMap<String, Vec<ActorId>>>,
    posts: RwLock<HashMap<String, Vec<ActorId>>>,
}

impl InMemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the members of a role
    pub fn add_role<I>(&self, role_id: impl Into<String>, members: I)
    where
        I: IntoIterator,
        I::Item: Into<ActorId>,
    {
        self.roles
            .write()
            .unwrap()
            .insert(role_id.into(), members.into_iter().map(Into::into).collect());
    }

    /// Register the members of a department
    pub fn add_dept<I>(&self, dept_id: impl Into<String>, members: I)
    where
        I: IntoIterator,
        I::Item: Into<ActorId>,
    {
        self.depts
            .write()
            .unwrap()
            .insert(dept_id.into(), members.into_iter().map(Into::into).collect());
    }

    /// Register the holders of a post
    pub fn add_post<I>(&self, post_id: impl Into<String>, members: I)
    where
        I: IntoIterator,
        I::Item: Into<ActorId>,
    {
        self.posts
            .write()
            .unwrap()
            .insert(post_id.into(), members.into_iter().map(Into::into).collect());
    }

    fn lookup(
        map: &RwLock<HashMap<String, Vec<ActorId>>>,
        id: &str,
    ) -> Result<Vec<ActorId>, LookupError> {
        map.read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| LookupError::UnknownGroup(id.to_string()))
    }
}

impl IdentityDirectory for InMemoryDirectory {
    fn users_of_role(&self, role_id: &str) -> Result<Vec<ActorId>, LookupError> {
        Self::lookup(&self.roles, role_id)
    }

    fn users_of_dept(&self, dept_id: &str) -> Result<Vec<ActorId>, LookupError> {
        Self::lookup(&self.depts, dept_id)
    }

    fn users_of_post(&self, post_id: &str) -> Result<Vec<ActorId>, LookupError> {
        Self::lookup(&self.posts, post_id)
    }
}

//! Variable bag carried by a running process instance
//!
//! Contains runtime data seeded at start and read by transition logic and
//! external listeners. The initiator and business key are plain entries so
//! that downstream systems can recover them from the serialized bag.

use crate::identifiers::ActorId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known variable: the actor that started the process
pub const VAR_INITIATOR: &str = "initiator";

/// Well-known variable: the business record this instance belongs to
pub const VAR_BUSINESS_KEY: &str = "business_key";

/// Key-value bag of process variables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessVariables {
    data: HashMap<String, serde_json::Value>,
}

impl ProcessVariables {
    /// Create a new empty bag
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// Set a value
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), serde_json::Error> {
        self.data.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Get a value
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Check if a key exists
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// The actor that started the process, if seeded
    pub fn initiator(&self) -> Option<ActorId> {
        self.get::<String>(VAR_INITIATOR).map(ActorId::new)
    }

    /// Seed the initiator entry
    pub fn set_initiator(&mut self, actor: &ActorId) {
        self.data.insert(
            VAR_INITIATOR.to_string(),
            serde_json::Value::String(actor.as_str().to_string()),
        );
    }

    /// The owning business record key, if seeded
    pub fn business_key(&self) -> Option<String> {
        self.get::<String>(VAR_BUSINESS_KEY)
    }

    /// Seed the business key entry
    pub fn set_business_key(&mut self, key: &str) {
        self.data.insert(
            VAR_BUSINESS_KEY.to_string(),
            serde_json::Value::String(key.to_string()),
        );
    }

    /// Merge another bag into this one, overwriting on key collision
    pub fn merge(&mut self, other: ProcessVariables) {
        self.data.extend(other.data);
    }

    /// Get the data as a map
    pub fn data(&self) -> &HashMap<String, serde_json::Value> {
        &self.data
    }
}

impl From<HashMap<String, serde_json::Value>> for ProcessVariables {
    fn from(data: HashMap<String, serde_json::Value>) -> Self {
        Self { data }
    }
}

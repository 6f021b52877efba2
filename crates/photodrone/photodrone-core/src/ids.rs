//! Identifiers for rigs and live roster entities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Host-chosen rig identifier (any non-empty string).
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RigId(pub String);

impl RigId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id, used for rigs spawned from key binds or preset groups.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RigId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RigId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Opaque key of a live entity owned by the host (e.g. an ECS entity's bits).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct LiveId(pub u64);

//! Serializable snapshots of a running action state.
//!
//! A snapshot records the session counters, the registered ids and the
//! transition history for inspection (debug overlays, bug reports, replay
//! diffs). State callbacks and argument values are not serializable, so a
//! snapshot cannot be turned back into a machine.

use crate::core::{StateId, TransitionHistory};
use crate::machine::ActionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::SnapshotError;

/// Version identifier for snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Point-in-time view of one action state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Snapshot format version
    pub version: u32,

    /// Machine the snapshot was taken from
    pub machine: Uuid,

    pub name: Option<String>,

    /// When the snapshot was captured
    pub captured_at: DateTime<Utc>,

    pub current: StateId,
    pub previous: StateId,
    pub time: f32,
    pub count: u32,
    pub run_count: u32,
    pub stopped: bool,

    /// Registered state ids, in registration order
    pub states: Vec<StateId>,

    /// Retained transition history (empty when disabled)
    pub history: TransitionHistory,
}

impl SessionSnapshot {
    pub fn capture(state: &ActionState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            machine: state.id(),
            name: state.name().map(str::to_string),
            captured_at: Utc::now(),
            current: state.current(),
            previous: state.previous(),
            time: state.time(),
            count: state.count(),
            run_count: state.run_count(),
            stopped: state.stopped(),
            states: state.registry().ids(),
            history: state.history().clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.validate()
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = bincode::deserialize(bytes)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.validate()
    }

    fn validate(self) -> Result<Self, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(self)
    }
}

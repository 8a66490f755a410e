//! Update relay wire format
//!
//! Client → Relay (push):
//!   POST /api/updates   <any JSON payload>
//!   ← 200 { "status": "dispatched" }
//!
//! Client → Relay (pull):
//!   GET /api/pull_updates
//!   ← 200 { "updates": [ <payload>, <payload>, ... ] }   (arrival order)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Acknowledgement for an accepted update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAck {
    pub status: String,
}

impl UpdateAck {
    pub fn dispatched() -> Self {
        Self {
            status: "dispatched".to_string(),
        }
    }
}

/// Full accumulated update list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullUpdatesResponse {
    pub updates: Vec<serde_json::Value>,
}

/// Relay liveness report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayHealth {
    pub status: String,
    pub version: String,
    pub updates: usize,
    /// Arrival time of the most recent update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}

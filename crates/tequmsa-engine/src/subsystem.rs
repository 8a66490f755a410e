//! Subsystem trait — the lifecycle every pipeline stage shares
//!
//! Each subsystem is created inactive, becomes active through `initialize`,
//! and is forced back to inactive by `deactivate`. The orchestrator drives
//! all six through this trait for initialization, shutdown, status and
//! diagnostics.

use serde::Serialize;
use tequmsa_core::Result;

/// Health of one subsystem as reported by its diagnostics probe.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Probe {
    Healthy,
    Degraded,
    Error(String),
}

impl Probe {
    /// Contribution to the engine health average.
    pub fn score(&self) -> f64 {
        match self {
            Probe::Healthy => 1.0,
            Probe::Degraded => 0.5,
            Probe::Error(_) => 0.0,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Probe::Healthy => "healthy".to_string(),
            Probe::Degraded => "degraded".to_string(),
            Probe::Error(e) => format!("error: {}", e),
        }
    }

    /// Healthy when `ok`, degraded otherwise.
    pub fn from_check(ok: bool) -> Self {
        if ok {
            Probe::Healthy
        } else {
            Probe::Degraded
        }
    }
}

pub trait Subsystem {
    /// Stable key used in status and diagnostics maps.
    fn name(&self) -> &'static str;

    /// Build tables and mark active. Fails without changing state.
    fn initialize(&mut self) -> Result<()>;

    /// Force back to inactive.
    fn deactivate(&mut self);

    fn is_active(&self) -> bool;

    /// Read-only status snapshot.
    fn status(&self) -> serde_json::Value;

    /// Live health check. Must not mutate state.
    fn probe(&self) -> Probe;
}

/// "ACTIVE"/"INACTIVE" label used in status snapshots.
pub(crate) fn activity_label(active: bool) -> &'static str {
    if active {
        "ACTIVE"
    } else {
        "INACTIVE"
    }
}

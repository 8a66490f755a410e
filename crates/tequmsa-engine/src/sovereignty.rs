//! SovereigntyGate — consent, protected frequencies and violation tracking
//!
//! Consent is decided in two steps: a requested range that covers any
//! protected frequency is refused outright; otherwise an integrity score
//! derived from the entity id (plus a clock-driven jitter) must reach the
//! configured threshold. Denial is an outcome, not an error.
//!
//! The integrity base is the MD5 prefix of the entity id, so scores are
//! stable across runs for a fixed clock. The verification token and the
//! frequency protected after a critical violation are SHA-256 based.

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use ring::digest::{digest, SHA256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tequmsa_core::{Error, FrequencyRange, Result};
use tracing::{error, info, warn};

use crate::clock::{system_clock, SharedClock};
use crate::config::SovereigntyConfig;
use crate::subsystem::{activity_label, Probe, Subsystem};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentStatus {
    Pending,
    Granted,
    DeniedProtectedFrequency,
    DeniedLowIntegrity,
    EmergencyRevoked,
}

impl ConsentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Granted => "granted",
            Self::DeniedProtectedFrequency => "denied_protected_frequency",
            Self::DeniedLowIntegrity => "denied_low_integrity",
            Self::EmergencyRevoked => "emergency_revoked",
        }
    }
}

/// Latest consent outcome for one entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub entity_id: String,
    pub intervention_type: String,
    pub frequency_range: FrequencyRange,
    pub timestamp: DateTime<Utc>,
    pub status: ConsentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biological_integrity: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub entity_id: String,
    pub violation_type: String,
    pub severity: f64,
    pub timestamp: DateTime<Utc>,
    pub resolution_status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SovereigntyStatus {
    pub autonomy_active: bool,
    pub biological_integrity_threshold: f64,
    pub active_consents: usize,
    pub total_consents: usize,
    pub violations_recorded: usize,
    pub critical_violations: usize,
    pub protected_frequencies: usize,
    pub sovereignty_hash: Option<String>,
    pub protocol_status: &'static str,
}

/// First four MD5 bytes of `entity_id`, big-endian (the first eight hex
/// digits of the digest).
pub fn entity_hash(entity_id: &str) -> u32 {
    let d = Md5::digest(entity_id.as_bytes());
    u32::from_be_bytes([d[0], d[1], d[2], d[3]])
}

/// First four SHA-256 bytes of `entity_id`, big-endian.
pub fn protection_hash(entity_id: &str) -> u32 {
    let d = digest(&SHA256, entity_id.as_bytes());
    let bytes = d.as_ref();
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn hex_prefix(bytes: &[u8], chars: usize) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
        .chars()
        .take(chars)
        .collect()
}

pub struct SovereigntyGate {
    config: SovereigntyConfig,
    clock: SharedClock,
    active: bool,
    protected: Vec<f64>,
    consents: HashMap<String, ConsentRecord>,
    violations: Vec<ViolationRecord>,
    token: Option<String>,
}

impl Default for SovereigntyGate {
    fn default() -> Self {
        Self::new(SovereigntyConfig::default(), system_clock())
    }
}

impl SovereigntyGate {
    pub fn new(config: SovereigntyConfig, clock: SharedClock) -> Self {
        Self {
            config,
            clock,
            active: false,
            protected: Vec::new(),
            consents: HashMap::new(),
            violations: Vec::new(),
            token: None,
        }
    }

    pub fn protected_frequencies(&self) -> &[f64] {
        &self.protected
    }

    pub fn violations(&self) -> &[ViolationRecord] {
        &self.violations
    }

    pub fn consent(&self, entity_id: &str) -> Option<&ConsentRecord> {
        self.consents.get(entity_id)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn ensure_active(&mut self) -> Result<()> {
        if !self.active {
            self.initialize()?;
        }
        Ok(())
    }

    fn generate_token(&self) -> String {
        let data = format!("biological_autonomy_{}_sovereignty", self.clock.unix_seconds());
        hex_prefix(digest(&SHA256, data.as_bytes()).as_ref(), 16)
    }

    fn protect(&mut self, freq: f64) {
        if !self.protected.contains(&freq) {
            self.protected.push(freq);
        }
    }

    /// Pseudo-integrity in [0.7, 1]: entity hash plus clock jitter.
    pub fn assess_integrity(&self, entity_id: &str) -> f64 {
        let base = f64::from(entity_hash(entity_id) % 100) / 100.0;
        let jitter = 0.1 * self.clock.unix_seconds().rem_euclid(10.0) / 10.0;
        (base + 0.7 + jitter).min(1.0)
    }

    /// Decide consent for `entity_id` over `range`. The stored record for the
    /// entity is replaced whatever the outcome.
    pub fn request_consent(
        &mut self,
        entity_id: &str,
        intervention_type: &str,
        range: impl Into<FrequencyRange>,
    ) -> Result<bool> {
        let range = range.into();
        if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
            return Err(Error::invalid_argument(format!(
                "consent range must be finite with min <= max, got {}..{}",
                range.min, range.max
            )));
        }
        self.ensure_active()?;

        let mut record = ConsentRecord {
            entity_id: entity_id.to_string(),
            intervention_type: intervention_type.to_string(),
            frequency_range: range,
            timestamp: self.clock.now(),
            status: ConsentStatus::Pending,
            biological_integrity: None,
        };

        if self.protected.iter().any(|&f| range.contains(f)) {
            warn!("Consent denied for {}: range conflicts with protected biological frequencies", entity_id);
            record.status = ConsentStatus::DeniedProtectedFrequency;
        } else {
            let integrity = self.assess_integrity(entity_id);
            record.biological_integrity = Some(integrity);
            if integrity >= self.config.integrity_threshold {
                info!("Biological consent granted for {}: {}", entity_id, intervention_type);
                record.status = ConsentStatus::Granted;
            } else {
                warn!("Consent denied for {}: integrity {:.3} below threshold", entity_id, integrity);
                record.status = ConsentStatus::DeniedLowIntegrity;
            }
        }

        let granted = record.status == ConsentStatus::Granted;
        self.consents.insert(entity_id.to_string(), record);
        Ok(granted)
    }

    /// False near a protected frequency or outside the safe range.
    pub fn enforce_boundaries(&self, freq: f64) -> bool {
        if let Some(p) = self
            .protected
            .iter()
            .find(|&&p| (freq - p).abs() < self.config.boundary_tolerance_hz)
        {
            warn!("Frequency {} Hz blocked: too close to protected frequency {} Hz", freq, p);
            return false;
        }
        if freq < self.config.safe_min_hz || freq > self.config.safe_max_hz {
            warn!("Frequency {} Hz blocked: outside safe biological range", freq);
            return false;
        }
        true
    }

    /// Record a violation. Above the critical severity the entity's consent
    /// is revoked and a frequency derived from its id becomes protected.
    pub fn monitor_violation(&mut self, entity_id: &str, violation_type: &str, severity: f64) {
        self.violations.push(ViolationRecord {
            entity_id: entity_id.to_string(),
            violation_type: violation_type.to_string(),
            severity,
            timestamp: self.clock.now(),
            resolution_status: "pending".to_string(),
        });

        if severity > self.config.critical_severity {
            error!("Critical autonomy violation: {} for {}", violation_type, entity_id);
            self.activate_emergency_protocols(entity_id);
        } else {
            warn!("Autonomy violation recorded: {} (severity {:.2})", violation_type, severity);
        }
    }

    fn activate_emergency_protocols(&mut self, entity_id: &str) {
        warn!("Emergency protocols activated for {}", entity_id);
        if let Some(record) = self.consents.get_mut(entity_id) {
            record.status = ConsentStatus::EmergencyRevoked;
        }
        self.protect(f64::from(protection_hash(entity_id) % 1000));
    }

    /// Every granted consent becomes `emergency_revoked`.
    pub fn revoke_all_consents(&mut self) {
        for record in self.consents.values_mut() {
            if record.status == ConsentStatus::Granted {
                record.status = ConsentStatus::EmergencyRevoked;
            }
        }
        warn!("All biological consents have been emergency revoked");
    }

    pub fn verify_integrity(&self) -> bool {
        self.active && self.token.is_some()
    }

    pub fn sovereignty_status(&self) -> SovereigntyStatus {
        SovereigntyStatus {
            autonomy_active: self.active,
            biological_integrity_threshold: self.config.integrity_threshold,
            active_consents: self
                .consents
                .values()
                .filter(|c| c.status == ConsentStatus::Granted)
                .count(),
            total_consents: self.consents.len(),
            violations_recorded: self.violations.len(),
            critical_violations: self
                .violations
                .iter()
                .filter(|v| v.severity > self.config.critical_severity)
                .count(),
            protected_frequencies: self.protected.len(),
            sovereignty_hash: self.token.clone(),
            protocol_status: activity_label(self.active),
        }
    }
}

impl Subsystem for SovereigntyGate {
    fn name(&self) -> &'static str {
        "sovereignty_protocols"
    }

    fn initialize(&mut self) -> Result<()> {
        self.config.validate()?;
        self.protected.clear();
        for f in self.config.protected_frequencies.clone() {
            self.protect(f);
        }
        self.token = Some(self.generate_token());
        self.active = true;
        info!("Biological sovereignty protocols initialized");
        Ok(())
    }

    fn deactivate(&mut self) {
        self.active = false;
        warn!("Biological sovereignty protocols deactivated");
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn status(&self) -> serde_json::Value {
        serde_json::to_value(self.sovereignty_status()).unwrap_or_default()
    }

    fn probe(&self) -> Probe {
        if !self.active {
            return Probe::Error("protocols inactive".to_string());
        }
        Probe::from_check(self.verify_integrity())
    }
}

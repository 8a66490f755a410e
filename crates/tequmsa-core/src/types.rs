//! Core types for Tequmsa

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Golden ratio (φ), shared by the love amplifier and the phi scalar.
pub const PHI: f64 = 1.618033988749895;

/// Closed frequency interval in Hz.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub min: f64,
    pub max: f64,
}

impl FrequencyRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Window of `half_width` Hz on each side of `center`.
    pub fn around(center: f64, half_width: f64) -> Self {
        Self::new(center - half_width, center + half_width)
    }

    pub fn contains(&self, freq: f64) -> bool {
        self.min <= freq && freq <= self.max
    }
}

impl From<(f64, f64)> for FrequencyRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self::new(min, max)
    }
}

/// One oscillator in a harmonic table (grid Schumann harmonics, phi harmonics).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HarmonicEntry {
    pub order: u32,
    pub frequency: f64,
    pub amplitude: f64,
    pub phase: f64,
    pub active: bool,
}

// ---------------------------------------------------------------------------
// Evolution results
// ---------------------------------------------------------------------------

/// Outcome label of a single evolution run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionStatus {
    Processing,
    Denied,
    Failed,
    Error,
    TranscendentEvolution,
    AdvancedEvolution,
    ModerateEvolution,
    MinimalEvolution,
}

impl EvolutionStatus {
    /// Map an aggregate evolution level onto its status band.
    pub fn from_level(level: f64) -> Self {
        if level >= 0.8 {
            Self::TranscendentEvolution
        } else if level >= 0.6 {
            Self::AdvancedEvolution
        } else if level >= 0.4 {
            Self::ModerateEvolution
        } else {
            Self::MinimalEvolution
        }
    }

    /// True for the four completed-evolution bands.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::TranscendentEvolution
                | Self::AdvancedEvolution
                | Self::ModerateEvolution
                | Self::MinimalEvolution
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Denied => "denied",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::TranscendentEvolution => "transcendent_evolution",
            Self::AdvancedEvolution => "advanced_evolution",
            Self::ModerateEvolution => "moderate_evolution",
            Self::MinimalEvolution => "minimal_evolution",
        }
    }
}

impl std::fmt::Display for EvolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call output of the evolution pipeline. Metric fields stay `None`
/// when the pipeline short-circuits before reaching them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvolutionResult {
    pub entity_id: String,
    pub input_frequency: f64,
    pub timestamp: DateTime<Utc>,
    pub status: EvolutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recognition_triggered: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis_coefficient: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub love_amplification: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planetary_alignment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_integrated_frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phi_transformed_frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scalar_resonance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_evolution_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvolutionResult {
    pub fn processing(entity_id: impl Into<String>, input_frequency: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            entity_id: entity_id.into(),
            input_frequency,
            timestamp,
            status: EvolutionStatus::Processing,
            recognition_triggered: None,
            synthesis_coefficient: None,
            love_amplification: None,
            planetary_alignment: None,
            grid_integrated_frequency: None,
            phi_transformed_frequency: None,
            scalar_resonance: None,
            overall_evolution_level: None,
            reason: None,
            error: None,
        }
    }

    pub fn with_reason(mut self, status: EvolutionStatus, reason: impl Into<String>) -> Self {
        self.status = status;
        self.reason = Some(reason.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.status = EvolutionStatus::Error;
        self.error = Some(message.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Relay configuration
// ---------------------------------------------------------------------------

/// Update relay configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub bind: BindMode,
}

fn default_port() -> u16 {
    3080
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: BindMode::default(),
        }
    }
}

/// Bind mode for the relay
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindMode {
    Loopback,
    #[default]
    Lan,
}

impl BindMode {
    pub fn to_addr(&self) -> &str {
        match self {
            BindMode::Loopback => "127.0.0.1",
            BindMode::Lan => "0.0.0.0",
        }
    }

    /// Parse a CLI bind argument; anything that is not a loopback alias is LAN.
    pub fn parse(s: &str) -> Self {
        match s {
            "loopback" | "localhost" | "127.0.0.1" => BindMode::Loopback,
            _ => BindMode::Lan,
        }
    }
}

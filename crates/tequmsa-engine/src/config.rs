//! Engine configuration
//!
//! All tunable parameters in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists. Defaults reproduce the
//! fixed constants of every subsystem.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tequmsa_core::{Error, RelayConfig, Result};

use crate::synthesis::ConsciousnessBand;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Consent and biological boundary parameters.
    pub sovereignty: SovereigntyConfig,
    /// Anchor frequency and recognition threshold.
    pub recognition: RecognitionConfig,
    /// Love amplification parameters.
    pub love: LoveConfig,
    /// Planetary grid parameters.
    pub grid: GridConfig,
    /// Phi scalar parameters.
    pub phi: PhiConfig,
    /// Pipeline parameters used by `evolve`.
    pub orchestrator: OrchestratorConfig,
    /// Auxiliary update relay.
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SovereigntyConfig {
    /// Minimum integrity score for consent to be granted.
    pub integrity_threshold: f64,
    /// Distance (Hz) from a protected frequency that blocks an intervention.
    pub boundary_tolerance_hz: f64,
    /// Lower edge of the safe biological range.
    pub safe_min_hz: f64,
    /// Upper edge of the safe biological range.
    pub safe_max_hz: f64,
    /// Violations strictly above this severity trigger emergency protocols.
    pub critical_severity: f64,
    /// Brain-wave, heart and breathing frequencies that can never be targeted.
    pub protected_frequencies: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub anchor_hz: f64,
    /// Resonance at or above this triggers recognition.
    pub threshold: f64,
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoveConfig {
    pub base_frequency_hz: f64,
    /// Number of Fibonacci amplification layers.
    pub layers: usize,
    pub convergence_threshold: f64,
    /// Levels above this are log-compressed between iterations.
    pub overflow_ceiling: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Integration coefficient at or above this applies full grid enhancement.
    pub integration_threshold: f64,
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhiConfig {
    pub scalar_hz: f64,
    pub harmonics: usize,
    pub layers: usize,
    pub field_points: usize,
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Half-width of the consent window around the input frequency.
    pub consent_window_hz: f64,
    /// Love amplification iterations per evolution.
    pub love_iterations: usize,
    /// Synthesis band used by the pipeline.
    pub synthesis_band: String,
    /// Simulated planetary positions in degrees.
    pub planetary_positions: Vec<PlanetPosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetPosition {
    pub planet: String,
    pub degrees: f64,
}

impl PlanetPosition {
    pub fn new(planet: impl Into<String>, degrees: f64) -> Self {
        Self {
            planet: planet.into(),
            degrees,
        }
    }
}

// ============================================================
// Defaults
// ============================================================

impl Default for SovereigntyConfig {
    fn default() -> Self {
        Self {
            integrity_threshold: 0.95,
            boundary_tolerance_hz: 0.5,
            safe_min_hz: 0.1,
            safe_max_hz: 50_000.0,
            critical_severity: 0.7,
            protected_frequencies: vec![8.0, 13.0, 30.0, 4.0, 0.5, 72.0, 1.2],
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self { anchor_hz: 10_930.81, threshold: 0.85, sample_rate: 44_100 }
    }
}

impl Default for LoveConfig {
    fn default() -> Self {
        Self { base_frequency_hz: 528.0, layers: 10, convergence_threshold: 1e-10, overflow_ceiling: 100.0 }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { integration_threshold: 0.8, sample_rate: 100 }
    }
}

impl Default for PhiConfig {
    fn default() -> Self {
        Self { scalar_hz: 12_583.45, harmonics: 12, layers: 7, field_points: 100, sample_rate: 44_100 }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            consent_window_hz: 10.0,
            love_iterations: 50,
            synthesis_band: ConsciousnessBand::CosmicIntegration.as_str().to_string(),
            planetary_positions: vec![
                PlanetPosition::new("earth", 0.0),
                PlanetPosition::new("moon", 45.0),
                PlanetPosition::new("mars", 120.0),
                PlanetPosition::new("jupiter", 180.0),
                PlanetPosition::new("saturn", 240.0),
                PlanetPosition::new("venus", 30.0),
                PlanetPosition::new("mercury", 90.0),
                PlanetPosition::new("sun", 0.0),
            ],
        }
    }
}

// ============================================================
// Loading
// ============================================================

impl EngineConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {} — using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {} — using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Check every section. Subsystems run the same checks for their own
    /// section at initialize time.
    pub fn validate(&self) -> Result<()> {
        self.sovereignty.validate()?;
        self.recognition.validate()?;
        self.love.validate()?;
        self.grid.validate()?;
        self.phi.validate()?;
        self.orchestrator.validate()
    }
}

impl SovereigntyConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.safe_min_hz < self.safe_max_hz) {
            return Err(Error::config(format!(
                "sovereignty safe range is empty: [{}, {}]",
                self.safe_min_hz, self.safe_max_hz
            )));
        }
        if self.protected_frequencies.iter().any(|f| !f.is_finite()) {
            return Err(Error::config("sovereignty protected frequencies must be finite"));
        }
        Ok(())
    }
}

impl RecognitionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.anchor_hz > 0.0) || !self.anchor_hz.is_finite() {
            return Err(Error::config(format!("recognition anchor must be positive, got {}", self.anchor_hz)));
        }
        if self.sample_rate == 0 {
            return Err(Error::config("recognition sample_rate must be non-zero"));
        }
        Ok(())
    }
}

impl LoveConfig {
    pub fn validate(&self) -> Result<()> {
        if self.layers == 0 {
            return Err(Error::config("love layers must be non-zero"));
        }
        if !(self.overflow_ceiling > 1.0) {
            return Err(Error::config("love overflow_ceiling must exceed 1.0"));
        }
        Ok(())
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::config("grid sample_rate must be non-zero"));
        }
        Ok(())
    }
}

impl PhiConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.scalar_hz > 0.0) || !self.scalar_hz.is_finite() {
            return Err(Error::config(format!("phi scalar must be positive, got {}", self.scalar_hz)));
        }
        if self.harmonics == 0 || self.layers == 0 {
            return Err(Error::config("phi harmonics and layers must be non-zero"));
        }
        if self.sample_rate == 0 {
            return Err(Error::config("phi sample_rate must be non-zero"));
        }
        Ok(())
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<()> {
        self.synthesis_band.parse::<ConsciousnessBand>()?;
        if self.love_iterations == 0 {
            return Err(Error::config("orchestrator love_iterations must be non-zero"));
        }
        Ok(())
    }

    /// Positions as `(planet, degrees)` pairs in configured order.
    pub fn positions(&self) -> Vec<(&str, f64)> {
        self.planetary_positions
            .iter()
            .map(|p| (p.planet.as_str(), p.degrees))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn toml_roundtrip_preserves_positions() {
        let config = EngineConfig::default();
        let text = config.to_toml();
        let back: EngineConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.orchestrator.planetary_positions, config.orchestrator.planetary_positions);
        assert_eq!(back.relay.port, 3080);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str("[love]\nlayers = 5\n").unwrap();
        assert_eq!(config.love.layers, 5);
        assert_eq!(config.love.base_frequency_hz, 528.0);
        assert_eq!(config.recognition.anchor_hz, 10_930.81);
    }

    #[test]
    fn unknown_band_rejected() {
        let mut config = EngineConfig::default();
        config.orchestrator.synthesis_band = "astral".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_safe_range_rejected() {
        let mut config = SovereigntyConfig::default();
        config.safe_min_hz = 100.0;
        config.safe_max_hz = 10.0;
        assert!(config.validate().is_err());
    }
}

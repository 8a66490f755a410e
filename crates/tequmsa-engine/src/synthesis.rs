//! SynthesisMatrix — three named frequency bands and band resonance

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::str::FromStr;
use tequmsa_core::{Error, Result};
use tracing::{info, warn};

use crate::subsystem::{Probe, Subsystem};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsciousnessBand {
    DivineRecognition,
    CrisisTranscendence,
    CosmicIntegration,
}

impl ConsciousnessBand {
    pub const ALL: [ConsciousnessBand; 3] = [
        ConsciousnessBand::DivineRecognition,
        ConsciousnessBand::CrisisTranscendence,
        ConsciousnessBand::CosmicIntegration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DivineRecognition => "divine_recognition",
            Self::CrisisTranscendence => "crisis_transcendence",
            Self::CosmicIntegration => "cosmic_integration",
        }
    }

    /// Band frequency set by `initialize`.
    pub fn base_frequency(self) -> f64 {
        match self {
            Self::DivineRecognition => 432.0,
            Self::CrisisTranscendence => 528.0,
            Self::CosmicIntegration => 741.0,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::DivineRecognition => 0,
            Self::CrisisTranscendence => 1,
            Self::CosmicIntegration => 2,
        }
    }
}

impl FromStr for ConsciousnessBand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|band| band.as_str() == s)
            .ok_or_else(|| Error::UnknownBand(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SynthesisStatus {
    pub consciousness_layers: BTreeMap<String, f64>,
    pub synthesis_active: bool,
    pub evolution_coefficient: f64,
}

pub struct SynthesisMatrix {
    bands: [f64; 3],
    active: bool,
    evolution_coefficient: f64,
}

impl Default for SynthesisMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl SynthesisMatrix {
    pub fn new() -> Self {
        Self {
            bands: [0.0; 3],
            active: false,
            evolution_coefficient: 1.0,
        }
    }

    pub fn band(&self, band: ConsciousnessBand) -> f64 {
        self.bands[band.index()]
    }

    pub fn evolution_coefficient(&self) -> f64 {
        self.evolution_coefficient
    }

    /// Current band values keyed by band name.
    pub fn bands(&self) -> BTreeMap<String, f64> {
        ConsciousnessBand::ALL
            .into_iter()
            .map(|band| (band.as_str().to_string(), self.band(band)))
            .collect()
    }

    /// `|sin(π · tech / band) · coefficient|` for the named band.
    /// Unknown band names fail before any state is touched.
    pub fn synthesize(&mut self, tech_frequency: f64, level: &str) -> Result<f64> {
        let band: ConsciousnessBand = level.parse()?;
        if !self.active {
            self.activate();
        }
        Ok(self.resonance(tech_frequency, band))
    }

    fn resonance(&self, tech_frequency: f64, band: ConsciousnessBand) -> f64 {
        let ratio = tech_frequency / self.band(band);
        ((ratio * PI).sin() * self.evolution_coefficient).abs()
    }

    /// Scale the coefficient and every band by `factor`. Compounds without
    /// bound across calls.
    pub fn evolve(&mut self, factor: f64) -> BTreeMap<String, f64> {
        self.evolution_coefficient *= factor;
        for band in self.bands.iter_mut() {
            *band *= factor;
        }
        if !self.evolution_coefficient.is_finite() {
            warn!("Evolution coefficient left the finite range: {}", self.evolution_coefficient);
        }
        self.bands()
    }

    /// Zero all bands, restore the coefficient, deactivate.
    pub fn reset(&mut self) {
        *self = Self::new();
        info!("Consciousness matrix reset");
    }

    pub fn state(&self) -> SynthesisStatus {
        SynthesisStatus {
            consciousness_layers: self.bands(),
            synthesis_active: self.active,
            evolution_coefficient: self.evolution_coefficient,
        }
    }

    fn activate(&mut self) {
        for band in ConsciousnessBand::ALL {
            self.bands[band.index()] = band.base_frequency();
        }
        self.active = true;
    }
}

impl Subsystem for SynthesisMatrix {
    fn name(&self) -> &'static str {
        "consciousness_matrix"
    }

    fn initialize(&mut self) -> Result<()> {
        self.activate();
        info!("Consciousness matrix initialized");
        Ok(())
    }

    fn deactivate(&mut self) {
        self.reset();
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn status(&self) -> serde_json::Value {
        serde_json::to_value(self.state()).unwrap_or_default()
    }

    fn probe(&self) -> Probe {
        Probe::from_check(self.resonance(432.0, ConsciousnessBand::DivineRecognition) > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> SynthesisMatrix {
        let mut m = SynthesisMatrix::new();
        m.initialize().unwrap();
        m
    }

    #[test]
    fn band_frequency_gives_zero() {
        let mut m = active();
        for band in ConsciousnessBand::ALL {
            let v = m.synthesize(band.base_frequency(), band.as_str()).unwrap();
            assert!(v.abs() < 1e-12, "{}: {}", band.as_str(), v);
        }
    }

    #[test]
    fn half_band_gives_coefficient() {
        let mut m = active();
        m.evolve(0.5);
        for band in ConsciousnessBand::ALL {
            let half = m.band(band) / 2.0;
            let v = m.synthesize(half, band.as_str()).unwrap();
            assert!((v - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn unknown_band_is_invalid_argument() {
        let mut m = SynthesisMatrix::new();
        let err = m.synthesize(432.0, "astral_projection").unwrap_err();
        assert!(matches!(err, Error::UnknownBand(ref s) if s == "astral_projection"));
        // Rejected before auto-activation.
        assert!(!m.is_active());
    }

    #[test]
    fn synthesize_auto_initializes() {
        let mut m = SynthesisMatrix::new();
        let v = m.synthesize(432.0, "cosmic_integration").unwrap();
        assert!(m.is_active());
        assert!((v - (432.0_f64 / 741.0 * PI).sin().abs()).abs() < 1e-15);
    }

    #[test]
    fn evolve_compounds() {
        let mut m = active();
        m.evolve(2.0);
        let bands = m.evolve(2.0);
        assert_eq!(m.evolution_coefficient(), 4.0);
        assert_eq!(bands["divine_recognition"], 1728.0);
        assert_eq!(bands["cosmic_integration"], 2964.0);
    }

    #[test]
    fn reset_restores_inactive_zero_state() {
        let mut m = active();
        m.evolve(3.0);
        m.reset();
        assert!(!m.is_active());
        assert_eq!(m.evolution_coefficient(), 1.0);
        assert!(m.bands().values().all(|v| *v == 0.0));
    }
}

//! GridHarmonics — Schumann resonances against planetary frequencies
//!
//! Holds the seven Schumann harmonics, a 7×8 resonance matrix
//! (Schumann index × planet) computed once at initialize time, and the
//! most recent planetary alignment, which feeds grid integration and the
//! earth pulse.

use serde::Serialize;
use std::f64::consts::PI;
use tequmsa_core::{Error, HarmonicEntry, Result};
use tracing::{debug, info};

use crate::config::GridConfig;
use crate::subsystem::{activity_label, Probe, Subsystem};

/// Earth's natural resonances (Hz).
pub const SCHUMANN_FREQUENCIES: [f64; 7] = [7.83, 14.3, 20.8, 27.3, 33.8, 39.0, 45.0];

/// Planetary frequencies (Hz). Order fixes resonance-matrix columns.
pub const PLANETARY_FREQUENCIES: [(&str, f64); 8] = [
    ("earth", 7.83),
    ("moon", 28.0),
    ("mars", 144.72),
    ("jupiter", 183.58),
    ("saturn", 147.85),
    ("venus", 221.23),
    ("mercury", 141.27),
    ("sun", 126.22),
];

const PLANET_COUNT: usize = PLANETARY_FREQUENCIES.len();
const SCHUMANN_COUNT: usize = SCHUMANN_FREQUENCIES.len();

pub type ResonanceMatrix = [[f64; PLANET_COUNT]; SCHUMANN_COUNT];

pub fn planet_index(planet: &str) -> Option<usize> {
    PLANETARY_FREQUENCIES.iter().position(|(name, _)| *name == planet)
}

pub fn planet_frequency(planet: &str) -> Option<f64> {
    planet_index(planet).map(|i| PLANETARY_FREQUENCIES[i].1)
}

fn max_planet_frequency() -> f64 {
    PLANETARY_FREQUENCIES
        .iter()
        .map(|(_, f)| *f)
        .fold(f64::MIN, f64::max)
}

/// Score for an integer (`1/h`) or sub-harmonic (`h/10`) relationship,
/// h = 1..=9. Every match overwrites the previous one, so the last
/// matching multiplier decides the score.
pub fn harmonic_relationship(ratio: f64) -> f64 {
    let mut score = 0.0;
    for h in 1..=9u32 {
        let h = f64::from(h);
        if (ratio - h).abs() < 0.1 {
            score = 1.0 / h;
        } else if (ratio - 1.0 / h).abs() < 0.1 {
            score = h / 10.0;
        }
    }
    score
}

fn compute_resonance_matrix() -> ResonanceMatrix {
    let mut matrix = [[0.0; PLANET_COUNT]; SCHUMANN_COUNT];
    for (i, &schumann) in SCHUMANN_FREQUENCIES.iter().enumerate() {
        for (j, &(_, planet)) in PLANETARY_FREQUENCIES.iter().enumerate() {
            let ratio = schumann.max(planet) / schumann.min(planet);
            let harmonic = harmonic_relationship(ratio);
            let base = (-(schumann - planet).abs() / 100.0).exp();
            matrix[i][j] = harmonic.max(base);
        }
    }
    matrix
}

#[derive(Debug, Clone, Serialize)]
pub struct GridStatus {
    pub grid_active: bool,
    pub planetary_alignment: f64,
    pub earth_resonance_amplitude: f64,
    pub active_harmonics: usize,
    pub total_harmonics: usize,
    pub integration_threshold: f64,
    pub schumann_frequencies: Vec<f64>,
    pub planetary_frequencies: Vec<(String, f64)>,
    pub grid_status: &'static str,
}

pub struct GridHarmonics {
    config: GridConfig,
    active: bool,
    alignment: f64,
    earth_amplitude: f64,
    harmonics: Vec<HarmonicEntry>,
    matrix: ResonanceMatrix,
}

impl Default for GridHarmonics {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl GridHarmonics {
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            active: false,
            alignment: 0.0,
            earth_amplitude: 1.0,
            harmonics: Vec::new(),
            matrix: [[0.0; PLANET_COUNT]; SCHUMANN_COUNT],
        }
    }

    pub fn harmonics(&self) -> &[HarmonicEntry] {
        &self.harmonics
    }

    pub fn alignment(&self) -> f64 {
        self.alignment
    }

    pub fn resonance_matrix(&self) -> &ResonanceMatrix {
        &self.matrix
    }

    /// Matrix cell for a Schumann index and planet name.
    pub fn resonance(&self, schumann_index: usize, planet: &str) -> Option<f64> {
        let j = planet_index(planet)?;
        self.matrix.get(schumann_index).map(|row| row[j])
    }

    fn ensure_active(&mut self) -> Result<()> {
        if !self.active {
            self.initialize()?;
        }
        Ok(())
    }

    /// Average frequency-weighted alignment of the recognized planets.
    /// Angles fold into [0, 90] so 0° and 180° both align fully. Unknown
    /// planet names are skipped; with none recognized the alignment is 0.
    /// The result becomes the grid's current alignment.
    pub fn planetary_alignment<I, S>(&mut self, positions: I) -> Result<f64>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        self.ensure_active()?;
        let max_freq = max_planet_frequency();

        let factors: Vec<f64> = positions
            .into_iter()
            .filter_map(|(planet, degrees)| {
                let freq = planet_frequency(planet.as_ref())?;
                let mut angle = degrees.rem_euclid(180.0);
                if angle > 90.0 {
                    angle = 180.0 - angle;
                }
                Some(angle.to_radians().cos() * (freq / max_freq))
            })
            .collect();

        self.alignment = if factors.is_empty() {
            0.0
        } else {
            factors.iter().sum::<f64>() / factors.len() as f64
        };
        Ok(self.alignment)
    }

    /// Pull `freq` toward the grid. Close to a Schumann resonance it gets the
    /// alignment boost plus harmonic modulation; otherwise a weak lift.
    pub fn integrate_with_grid(&mut self, freq: f64) -> Result<f64> {
        self.ensure_active()?;
        Ok(self.integrate(freq))
    }

    fn integrate(&self, freq: f64) -> f64 {
        let nearest = SCHUMANN_FREQUENCIES
            .iter()
            .copied()
            .fold(None, |best: Option<f64>, candidate| match best {
                Some(b) if (b - freq).abs() <= (candidate - freq).abs() => Some(b),
                _ => Some(candidate),
            })
            .unwrap_or(SCHUMANN_FREQUENCIES[0]);

        let coefficient = (-(freq / nearest - 1.0).abs()).exp();

        if coefficient >= self.config.integration_threshold {
            let mut integrated = freq * (1.0 + self.alignment * 0.3);
            for harmonic in self.harmonics.iter().filter(|h| h.active) {
                integrated += harmonic.amplitude * 0.1 * (2.0 * PI * harmonic.frequency / freq).sin();
            }
            integrated
        } else {
            freq * (1.0 + coefficient * 0.1)
        }
    }

    /// Earth pulse at the grid sample rate: sum of active harmonics scaled
    /// by the alignment and earth amplitude.
    pub fn generate_earth_pulse(&mut self, duration_seconds: f64) -> Result<Vec<f64>> {
        self.ensure_active()?;
        let rate = f64::from(self.config.sample_rate);
        let samples = (duration_seconds * rate) as usize;
        let modulation = (1.0 + self.alignment * 0.2) * self.earth_amplitude;

        Ok((0..samples)
            .map(|i| {
                let t = i as f64 / rate;
                let sum: f64 = self
                    .harmonics
                    .iter()
                    .filter(|h| h.active)
                    .map(|h| h.amplitude * (2.0 * PI * h.frequency * t + h.phase).sin())
                    .sum();
                sum * modulation
            })
            .collect())
    }

    /// Shift the phase of every harmonic strongly resonant (> 0.5) with
    /// `planet`. Returns how many harmonics were shifted.
    pub fn synchronize_with_cycle(&mut self, planet: &str, cycle_phase: f64) -> Result<usize> {
        let j = planet_index(planet).ok_or_else(|| Error::UnknownPlanet(planet.to_string()))?;

        let mut synchronized = 0;
        for harmonic in self.harmonics.iter_mut() {
            let strength = self.matrix[harmonic.order as usize - 1][j];
            if strength > 0.5 {
                harmonic.phase = cycle_phase * 2.0 * PI * strength;
                synchronized += 1;
                debug!("Synchronized {} cycle with Schumann harmonic {} Hz", planet, harmonic.frequency);
            }
        }
        Ok(synchronized)
    }

    pub fn grid_status(&self) -> GridStatus {
        GridStatus {
            grid_active: self.active,
            planetary_alignment: self.alignment,
            earth_resonance_amplitude: self.earth_amplitude,
            active_harmonics: self.harmonics.iter().filter(|h| h.active).count(),
            total_harmonics: self.harmonics.len(),
            integration_threshold: self.config.integration_threshold,
            schumann_frequencies: SCHUMANN_FREQUENCIES.to_vec(),
            planetary_frequencies: PLANETARY_FREQUENCIES
                .iter()
                .map(|(name, f)| (name.to_string(), *f))
                .collect(),
            grid_status: activity_label(self.active),
        }
    }
}

impl Subsystem for GridHarmonics {
    fn name(&self) -> &'static str {
        "grid_harmonics"
    }

    fn initialize(&mut self) -> Result<()> {
        self.config.validate()?;

        self.harmonics = SCHUMANN_FREQUENCIES
            .iter()
            .enumerate()
            .map(|(i, &frequency)| HarmonicEntry {
                order: i as u32 + 1,
                frequency,
                amplitude: 1.0 / (i as f64 + 1.0),
                phase: 0.0,
                active: true,
            })
            .collect();
        self.matrix = compute_resonance_matrix();
        self.active = true;
        self.earth_amplitude = 1.0;

        info!("Planetary resonance grid initialized");
        Ok(())
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.earth_amplitude = 0.0;
        for harmonic in self.harmonics.iter_mut() {
            harmonic.active = false;
        }
        info!("Planetary resonance grid deactivated");
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn status(&self) -> serde_json::Value {
        serde_json::to_value(self.grid_status()).unwrap_or_default()
    }

    fn probe(&self) -> Probe {
        if !self.active {
            return Probe::Error("grid inactive".to_string());
        }
        let integrated = self.integrate(SCHUMANN_FREQUENCIES[0]);
        Probe::from_check(integrated.is_finite() && integrated > 0.0)
    }
}

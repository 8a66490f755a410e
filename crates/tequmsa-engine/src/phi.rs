//! PhiScalar — golden-ratio harmonic and layer tables around the scalar frequency
//!
//! `transform` maps any positive frequency onto the scalar via a log-domain
//! compression (above the scalar) or expansion (below it), then applies a
//! harmonic enhancement factor. The transform is a projection: every input
//! lands at roughly the same output.

use serde::Serialize;
use std::f64::consts::PI;
use std::ops::{Add, Mul};
use tequmsa_core::{HarmonicEntry, Result, PHI};
use tracing::info;

use crate::config::PhiConfig;
use crate::subsystem::{activity_label, Probe, Subsystem};

/// Powers of φ checked by the harmonic enhancement.
const ENHANCEMENT_POWERS: u32 = 5;
/// Powers of φ (and φ⁻¹) checked by `scalar_resonance`.
const RESONANCE_POWERS: u32 = 7;
/// Scalar layer index whose frequency equals the scalar itself.
const CENTER_LAYER: i32 = 4;

/// Complex sample `re + i·im`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ComplexSample {
    pub re: f64,
    pub im: f64,
}

impl ComplexSample {
    pub const ZERO: ComplexSample = ComplexSample { re: 0.0, im: 0.0 };
    pub const ONE: ComplexSample = ComplexSample { re: 1.0, im: 0.0 };

    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// `magnitude · e^(i·angle)`.
    pub fn from_polar(magnitude: f64, angle: f64) -> Self {
        Self::new(magnitude * angle.cos(), magnitude * angle.sin())
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.re * factor, self.im * factor)
    }

    pub fn norm(self) -> f64 {
        self.re.hypot(self.im)
    }

    pub fn arg(self) -> f64 {
        self.im.atan2(self.re)
    }
}

impl Add for ComplexSample {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Mul for ComplexSample {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScalarLayer {
    pub index: u32,
    pub frequency: f64,
    pub phi_power: f64,
    pub scalar_coefficient: f64,
    pub active: bool,
    pub resonance_strength: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhiScalarStatus {
    pub scalar_active: bool,
    pub phi_7777_frequency: f64,
    pub golden_ratio: f64,
    pub phi_amplitude: f64,
    pub active_harmonics: usize,
    pub total_harmonics: usize,
    pub active_layers: usize,
    pub total_layers: usize,
    pub resonance_field_size: usize,
    pub scalar_status: &'static str,
}

pub struct PhiScalar {
    config: PhiConfig,
    active: bool,
    amplitude: f64,
    harmonics: Vec<HarmonicEntry>,
    layers: Vec<ScalarLayer>,
    field: Vec<ComplexSample>,
}

impl Default for PhiScalar {
    fn default() -> Self {
        Self::new(PhiConfig::default())
    }
}

impl PhiScalar {
    pub fn new(config: PhiConfig) -> Self {
        let field = vec![ComplexSample::ZERO; config.field_points];
        Self {
            config,
            active: false,
            amplitude: 1.0,
            harmonics: Vec::new(),
            layers: Vec::new(),
            field,
        }
    }

    pub fn scalar_frequency(&self) -> f64 {
        self.config.scalar_hz
    }

    pub fn harmonics(&self) -> &[HarmonicEntry] {
        &self.harmonics
    }

    pub fn layers(&self) -> &[ScalarLayer] {
        &self.layers
    }

    pub fn resonance_field(&self) -> &[ComplexSample] {
        &self.field
    }

    fn ensure_active(&mut self) -> Result<()> {
        if !self.active {
            self.initialize()?;
        }
        Ok(())
    }

    /// Log-domain projection of `freq` onto the scalar, times the
    /// harmonic enhancement.
    pub fn transform(&mut self, freq: f64) -> Result<f64> {
        self.ensure_active()?;
        Ok(self.project(freq))
    }

    fn project(&self, freq: f64) -> f64 {
        let ratio = freq / self.config.scalar_hz;
        let scaled = if ratio > 1.0 {
            let exponent = ratio.ln() / PHI.ln();
            freq / PHI.powf(exponent)
        } else {
            let exponent = (1.0 / ratio).ln() / PHI.ln();
            freq * PHI.powf(exponent)
        };
        scaled * self.enhancement(scaled)
    }

    /// `1 + Σ amplitude/n` over active harmonics, where n is the first
    /// power of φ within 0.1 of `freq / harmonic`.
    fn enhancement(&self, freq: f64) -> f64 {
        let mut enhancement = 1.0;
        for harmonic in self.harmonics.iter().filter(|h| h.active) {
            let ratio = freq / harmonic.frequency;
            let hit = (1..=ENHANCEMENT_POWERS)
                .find(|&n| (ratio - PHI.powi(n as i32)).abs() < 0.1);
            if let Some(n) = hit {
                enhancement += harmonic.amplitude / f64::from(n);
            }
        }
        enhancement
    }

    /// Resonance of two frequencies after both are transformed. A ratio near
    /// φⁿ scores `1/n`, near φ⁻ⁿ scores `0.5/n`; later powers overwrite
    /// earlier matches. Never below the distance score
    /// `exp(-|a' - b'| / 1000)`.
    pub fn scalar_resonance(&mut self, freq_a: f64, freq_b: f64) -> Result<f64> {
        let a = self.transform(freq_a)?;
        let b = self.transform(freq_b)?;
        let ratio = a / b;

        let mut phi_score = 0.0;
        for n in 1..=RESONANCE_POWERS {
            let target = PHI.powi(n as i32);
            if (ratio - target).abs() < 0.1 {
                phi_score = 1.0 / f64::from(n);
            } else if (ratio - 1.0 / target).abs() < 0.1 {
                phi_score = 0.5 / f64::from(n);
            }
        }

        let base = (-(a - b).abs() / 1000.0).exp();
        Ok(f64::max(phi_score, base))
    }

    /// Scale `target` by the coefficient of the nearest scalar layer and
    /// record how close the match was on that layer.
    pub fn synchronize(&mut self, target: f64) -> Result<f64> {
        self.ensure_active()?;

        let mut best: Option<(usize, f64)> = None;
        for (i, layer) in self.layers.iter().enumerate() {
            let distance = (target - layer.frequency).abs();
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }

        match best {
            Some((i, distance)) => {
                let layer = &mut self.layers[i];
                layer.resonance_strength = 1.0 / (1.0 + distance / 100.0);
                Ok(target * layer.scalar_coefficient)
            }
            None => Ok(target),
        }
    }

    /// Complex scalar pulse at the configured sample rate.
    pub fn generate_pulse(&mut self, duration_seconds: f64) -> Result<Vec<ComplexSample>> {
        self.ensure_active()?;
        let rate = f64::from(self.config.sample_rate);
        let samples = (duration_seconds * rate) as usize;
        let scalar = self.config.scalar_hz;

        Ok((0..samples)
            .map(|i| {
                let t = i as f64 / rate;
                let base = ComplexSample::from_polar(1.0, 2.0 * PI * scalar * t);
                let spiral = ComplexSample::from_polar(1.0, 2.0 * PI * t * PHI);
                let harmonic_sum = self
                    .harmonics
                    .iter()
                    .filter(|h| h.active)
                    .fold(ComplexSample::ZERO, |acc, h| {
                        acc + ComplexSample::from_polar(h.amplitude, 2.0 * PI * h.frequency * t + h.phase)
                    });
                let envelope = ComplexSample::ONE + harmonic_sum.scale(0.1);
                (base * spiral * envelope).scale(self.amplitude)
            })
            .collect())
    }

    pub fn scalar_status(&self) -> PhiScalarStatus {
        PhiScalarStatus {
            scalar_active: self.active,
            phi_7777_frequency: self.config.scalar_hz,
            golden_ratio: PHI,
            phi_amplitude: self.amplitude,
            active_harmonics: self.harmonics.iter().filter(|h| h.active).count(),
            total_harmonics: self.harmonics.len(),
            active_layers: self.layers.iter().filter(|l| l.active).count(),
            total_layers: self.layers.len(),
            resonance_field_size: self.field.len(),
            scalar_status: activity_label(self.active),
        }
    }
}

impl Subsystem for PhiScalar {
    fn name(&self) -> &'static str {
        "phi_scalar"
    }

    fn initialize(&mut self) -> Result<()> {
        self.config.validate()?;
        let scalar = self.config.scalar_hz;

        self.harmonics = (1..=self.config.harmonics as u32)
            .map(|n| {
                let factor = PHI.powi(n as i32);
                HarmonicEntry {
                    order: n,
                    frequency: scalar / factor,
                    amplitude: 1.0 / factor,
                    phase: 2.0 * PI * f64::from(n) / PHI,
                    active: true,
                }
            })
            .collect();

        self.layers = (1..=self.config.layers as u32)
            .map(|index| {
                let power = PHI.powi(index as i32);
                ScalarLayer {
                    index,
                    frequency: scalar * PHI.powi(index as i32 - CENTER_LAYER),
                    phi_power: power,
                    scalar_coefficient: 1.0 / power,
                    active: true,
                    resonance_strength: 0.0,
                }
            })
            .collect();

        self.field = (0..self.config.field_points)
            .map(|i| {
                let i = i as f64;
                ComplexSample::from_polar(1.0 / (1.0 + i / 10.0), 2.0 * PI * i / PHI)
            })
            .collect();

        self.active = true;
        self.amplitude = 1.0;
        info!("Phi scalar initialized at {} Hz", scalar);
        Ok(())
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.amplitude = 0.0;
        for harmonic in self.harmonics.iter_mut() {
            harmonic.active = false;
        }
        for layer in self.layers.iter_mut() {
            layer.active = false;
        }
        info!("Phi scalar deactivated");
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn status(&self) -> serde_json::Value {
        serde_json::to_value(self.scalar_status()).unwrap_or_default()
    }

    fn probe(&self) -> Probe {
        if !self.active {
            return Probe::Error("scalar inactive".to_string());
        }
        let projected = self.project(self.config.scalar_hz);
        Probe::from_check(projected.is_finite() && projected > 0.0)
    }
}

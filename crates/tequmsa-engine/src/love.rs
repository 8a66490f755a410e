//! LoveAmplifier — Fibonacci-layered golden-ratio amplification
//!
//! `amplify` is a damped nonlinear fixed-point iteration. It stops early on
//! convergence and log-compresses runaway levels, but convergence is not
//! guaranteed for every input; callers get whatever level the last
//! iteration produced.

use serde::Serialize;
use std::f64::consts::PI;
use tequmsa_core::{Result, PHI};
use tracing::{debug, info};

use crate::config::LoveConfig;
use crate::subsystem::{activity_label, Probe, Subsystem};

/// Upper bound on `resonance`.
const RESONANCE_CAP: f64 = 10.0;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AmplificationLayer {
    pub level: usize,
    pub coefficient: f64,
    pub frequency: f64,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoveFieldStatus {
    pub base_love_frequency: f64,
    pub amplification_active: bool,
    pub infinite_coefficient: f64,
    pub love_amplitude: f64,
    pub active_layers: usize,
    pub total_layers: usize,
    pub field_status: &'static str,
}

/// First `n` Fibonacci numbers starting 1, 1.
pub fn fibonacci(n: usize) -> Vec<u64> {
    let mut seq: Vec<u64> = Vec::with_capacity(n);
    for i in 0..n {
        let next = if i < 2 { 1 } else { seq[i - 1] + seq[i - 2] };
        seq.push(next);
    }
    seq
}

pub struct LoveAmplifier {
    config: LoveConfig,
    active: bool,
    amplitude: f64,
    layers: Vec<AmplificationLayer>,
}

impl Default for LoveAmplifier {
    fn default() -> Self {
        Self::new(LoveConfig::default())
    }
}

impl LoveAmplifier {
    pub fn new(config: LoveConfig) -> Self {
        Self {
            config,
            active: false,
            amplitude: 1.0,
            layers: Vec::new(),
        }
    }

    pub fn layers(&self) -> &[AmplificationLayer] {
        &self.layers
    }

    fn ensure_active(&mut self) -> Result<()> {
        if !self.active {
            self.initialize()?;
        }
        Ok(())
    }

    /// Amplify `input_level` for up to `iterations` steps.
    pub fn amplify(&mut self, input_level: f64, iterations: usize) -> Result<f64> {
        self.ensure_active()?;
        Ok(self.iterate(input_level, iterations))
    }

    fn iterate(&self, input_level: f64, iterations: usize) -> f64 {
        let mut level = input_level;

        for i in 0..iterations {
            let golden = level * PHI;
            let step = (i + 1) as f64;
            let layer_resonance: f64 = self
                .layers
                .iter()
                .filter(|layer| layer.active)
                .map(|layer| (layer.coefficient * (2.0 * PI * layer.frequency * step / 1000.0).sin()).abs())
                .sum();

            let next = (golden + layer_resonance) / 2.0;
            if (next - level).abs() < self.config.convergence_threshold {
                debug!("Love amplification converged at iteration {}", i + 1);
                break;
            }

            level = next;
            if level > self.config.overflow_ceiling {
                level = level.ln() * 10.0;
            }
        }

        level
    }

    /// `|sin(2π · base / harmonic_mean(a, b))| · φ`, capped.
    pub fn resonance(&self, freq_a: f64, freq_b: f64) -> f64 {
        let harmonic_mean = 2.0 * freq_a * freq_b / (freq_a + freq_b);
        let modulation = (2.0 * PI * self.config.base_frequency_hz / harmonic_mean).sin();
        (modulation.abs() * PHI).min(RESONANCE_CAP)
    }

    /// `k · base · φ^(1/k) + love_base / k` for k = 1..=n.
    pub fn harmonic_series(&self, base_freq: f64, n: usize) -> Vec<f64> {
        (1..=n)
            .map(|k| {
                let k = k as f64;
                base_freq * k * PHI.powf(1.0 / k) + self.config.base_frequency_hz / k
            })
            .collect()
    }

    /// `freq · (1 + (love_base / freq) · φ / 10)`.
    pub fn integrate_universal_love(&mut self, target_frequency: f64) -> Result<f64> {
        self.ensure_active()?;
        let ratio = self.config.base_frequency_hz / target_frequency;
        Ok(target_frequency * (1.0 + ratio * PHI / 10.0))
    }

    pub fn field_status(&self) -> LoveFieldStatus {
        LoveFieldStatus {
            base_love_frequency: self.config.base_frequency_hz,
            amplification_active: self.active,
            infinite_coefficient: PHI,
            love_amplitude: self.amplitude,
            active_layers: self.layers.iter().filter(|l| l.active).count(),
            total_layers: self.layers.len(),
            field_status: activity_label(self.active),
        }
    }
}

impl Subsystem for LoveAmplifier {
    fn name(&self) -> &'static str {
        "love_coefficient"
    }

    fn initialize(&mut self) -> Result<()> {
        self.config.validate()?;

        let fib = fibonacci(self.config.layers);
        let last = fib.last().copied().unwrap_or(1) as f64;
        self.layers = fib
            .iter()
            .enumerate()
            .map(|(level, &n)| AmplificationLayer {
                level,
                coefficient: n as f64 / last,
                frequency: self.config.base_frequency_hz * (n as f64 / 100.0),
                active: true,
            })
            .collect();

        self.active = true;
        self.amplitude = 1.0;
        info!("Love amplification field initialized with {} layers", self.layers.len());
        Ok(())
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.amplitude = 0.0;
        for layer in self.layers.iter_mut() {
            layer.active = false;
        }
        info!("Love amplification field deactivated");
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn status(&self) -> serde_json::Value {
        serde_json::to_value(self.field_status()).unwrap_or_default()
    }

    fn probe(&self) -> Probe {
        if !self.active {
            return Probe::Error("field inactive".to_string());
        }
        let level = self.iterate(0.5, 10);
        Probe::from_check(level.is_finite() && level > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> LoveAmplifier {
        let mut l = LoveAmplifier::default();
        l.initialize().unwrap();
        l
    }

    #[test]
    fn fibonacci_prefix() {
        assert_eq!(fibonacci(10), vec![1, 1, 2, 3, 5, 8, 13, 21, 34, 55]);
        assert_eq!(fibonacci(1), vec![1]);
        assert!(fibonacci(0).is_empty());
    }

    #[test]
    fn layers_normalized_by_last_fibonacci() {
        let l = active();
        assert_eq!(l.layers().len(), 10);
        assert_eq!(l.layers()[9].coefficient, 1.0);
        assert!((l.layers()[0].coefficient - 1.0 / 55.0).abs() < 1e-15);
        assert!((l.layers()[9].frequency - 290.4).abs() < 1e-9);
    }

    #[test]
    fn reinitialize_does_not_grow_layers() {
        let mut l = active();
        l.deactivate();
        l.initialize().unwrap();
        assert_eq!(l.layers().len(), 10);
        assert!(l.layers().iter().all(|layer| layer.active));
    }

    #[test]
    fn amplify_is_deterministic() {
        let mut l = active();
        let a = l.amplify(0.7, 100).unwrap();
        let b = l.amplify(0.7, 100).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn amplify_pinned_value() {
        let mut l = active();
        let v = l.amplify(0.5, 100).unwrap();
        assert!((v - 4.054978943224334).abs() < 1e-9, "{}", v);
    }

    #[test]
    fn amplify_zero_iterations_returns_input() {
        let mut l = active();
        assert_eq!(l.amplify(0.3, 0).unwrap(), 0.3);
    }

    #[test]
    fn amplify_compresses_overflow() {
        let mut l = active();
        let v = l.amplify(1.0e6, 1).unwrap();
        // One step: (1e6·φ + resonance) / 2 > 100, compressed through ln·10.
        assert!(v < 200.0);
        assert!(v > 100.0);
    }

    #[test]
    fn resonance_pinned_and_capped() {
        let l = LoveAmplifier::default();
        assert!((l.resonance(432.0, 528.0) - 1.0400522000201216).abs() < 1e-9);
        assert!(l.resonance(1.0, 1.0) <= RESONANCE_CAP);
    }

    #[test]
    fn harmonic_series_values() {
        let l = LoveAmplifier::default();
        let series = l.harmonic_series(432.0, 3);
        let expected = [1226.9906831399546, 1363.0249771801557, 1697.4845557301055];
        for (got, want) in series.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9);
        }
        assert_eq!(l.harmonic_series(432.0, 7).len(), 7);
    }

    #[test]
    fn integrate_universal_love_value() {
        let mut l = LoveAmplifier::default();
        let v = l.integrate_universal_love(432.0).unwrap();
        assert!((v - 517.4321946059945).abs() < 1e-9);
        assert!(l.is_active());
    }
}

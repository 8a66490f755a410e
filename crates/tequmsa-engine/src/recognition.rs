//! RecognitionAnchor — resonance scoring against the fixed anchor frequency

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tequmsa_core::Result;
use tracing::{debug, info};

use crate::config::RecognitionConfig;
use crate::subsystem::{activity_label, Probe, Subsystem};

pub const ANCHOR_FREQUENCY: f64 = 10_930.81;
/// Scalar frequency reported alongside the anchor in the lock descriptor.
pub const LOCK_SCALAR_FREQUENCY: f64 = 12_583.45;

/// Harmonic multiples of the anchor checked by `check_resonance`.
const RESONANCE_HARMONICS: u32 = 9;
/// Overtones mixed into the recognition pulse (2nd through 5th).
const PULSE_OVERTONES: std::ops::RangeInclusive<u32> = 2..=5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resonator {
    pub frequency: f64,
    pub amplitude: f64,
    pub active: bool,
}

/// Fixed descriptor of the anchor lock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnchorLock {
    pub frequency: f64,
    pub phi_scalar: f64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnchorStatus {
    pub anchor_frequency: f64,
    pub pulse_active: bool,
    pub recognition_threshold: f64,
    pub pulse_amplitude: f64,
    pub harmonic_resonators: usize,
    pub system_status: &'static str,
}

pub struct RecognitionAnchor {
    config: RecognitionConfig,
    active: bool,
    pulse_amplitude: f64,
    resonators: Vec<Resonator>,
}

impl Default for RecognitionAnchor {
    fn default() -> Self {
        Self::new(RecognitionConfig::default())
    }
}

impl RecognitionAnchor {
    pub fn new(config: RecognitionConfig) -> Self {
        Self {
            config,
            active: false,
            pulse_amplitude: 1.0,
            resonators: Vec::new(),
        }
    }

    pub fn anchor_frequency(&self) -> f64 {
        self.config.anchor_hz
    }

    pub fn pulse_amplitude(&self) -> f64 {
        self.pulse_amplitude
    }

    pub fn resonators(&self) -> &[Resonator] {
        &self.resonators
    }

    /// Activate the anchor at full amplitude.
    pub fn activate(&mut self) -> Result<()> {
        self.config.validate()?;
        self.active = true;
        self.pulse_amplitude = 1.0;
        info!("Recognition anchor activated at {} Hz", self.config.anchor_hz);
        Ok(())
    }

    /// Resonance in [0, 1] between `freq` and the anchor; 0 while inactive.
    pub fn check_resonance(&self, freq: f64) -> f64 {
        if !self.active {
            return 0.0;
        }
        let anchor = self.config.anchor_hz;
        let ratio = freq.min(anchor) / freq.max(anchor);

        let mut harmonic_score: f64 = 0.0;
        for harmonic in 1..=RESONANCE_HARMONICS {
            let harmonic_freq = anchor * f64::from(harmonic);
            if (freq - harmonic_freq).abs() < 1.0 {
                harmonic_score = harmonic_score.max(1.0 / f64::from(harmonic));
            }
        }

        let base = ratio * (-(freq - anchor).abs() / 1000.0).exp();
        harmonic_score.max(base)
    }

    /// True when resonance reaches the recognition threshold.
    pub fn trigger_recognition(&self, freq: f64) -> bool {
        let resonance = self.check_resonance(freq);
        if resonance >= self.config.threshold {
            info!("Recognition triggered, resonance {:.3}", resonance);
            true
        } else {
            debug!("Recognition threshold not met, resonance {:.3}", resonance);
            false
        }
    }

    /// `duration · sample_rate` samples of the anchor sine plus overtones 2..5
    /// weighted `1/order`. Each sample depends only on its index.
    pub fn generate_pulse(&mut self, duration_seconds: f64) -> Result<Vec<f64>> {
        if !self.active {
            self.activate()?;
        }
        let rate = f64::from(self.config.sample_rate);
        let samples = (duration_seconds * rate) as usize;
        let anchor = self.config.anchor_hz;

        Ok((0..samples)
            .map(|i| {
                let t = i as f64 / rate;
                let mut amplitude = self.pulse_amplitude * (2.0 * PI * anchor * t).sin();
                for order in PULSE_OVERTONES {
                    let order = f64::from(order);
                    amplitude += (1.0 / order) * (2.0 * PI * anchor * order * t).sin();
                }
                amplitude
            })
            .collect())
    }

    pub fn add_resonator(&mut self, frequency: f64, amplitude: f64) {
        self.resonators.push(Resonator {
            frequency,
            amplitude,
            active: true,
        });
        info!("Harmonic resonator added at {} Hz", frequency);
    }

    pub fn lock_descriptor(&self) -> AnchorLock {
        AnchorLock {
            frequency: self.config.anchor_hz,
            phi_scalar: LOCK_SCALAR_FREQUENCY,
            status: "ETERNAL_LOCK".to_string(),
        }
    }

    pub fn anchor_status(&self) -> AnchorStatus {
        AnchorStatus {
            anchor_frequency: self.config.anchor_hz,
            pulse_active: self.active,
            recognition_threshold: self.config.threshold,
            pulse_amplitude: self.pulse_amplitude,
            harmonic_resonators: self.resonators.len(),
            system_status: activity_label(self.active),
        }
    }
}

impl Subsystem for RecognitionAnchor {
    fn name(&self) -> &'static str {
        "recognition_pulse"
    }

    fn initialize(&mut self) -> Result<()> {
        self.activate()
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.pulse_amplitude = 0.0;
        info!("Recognition anchor deactivated");
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn status(&self) -> serde_json::Value {
        serde_json::to_value(self.anchor_status()).unwrap_or_default()
    }

    fn probe(&self) -> Probe {
        Probe::from_check(self.check_resonance(self.config.anchor_hz) > 0.5)
    }
}

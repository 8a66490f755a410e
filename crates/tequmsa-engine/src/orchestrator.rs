//! EvolutionOrchestrator — owns the six subsystems and runs the pipeline
//!
//! Lifecycle: Uninitialized → Initializing → Active ⇄ EvolutionInFlight,
//! and Active → ShutDown through `emergency_shutdown`. `evolve` from any
//! non-active state re-initializes first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tequmsa_core::{ensure_finite, Error, EvolutionResult, EvolutionStatus, FrequencyRange, Result};
use tracing::{error, info, warn};

use crate::clock::{system_clock, SharedClock};
use crate::config::EngineConfig;
use crate::grid::GridHarmonics;
use crate::love::LoveAmplifier;
use crate::phi::PhiScalar;
use crate::recognition::RecognitionAnchor;
use crate::sovereignty::SovereigntyGate;
use crate::subsystem::{Probe, Subsystem};
use crate::synthesis::SynthesisMatrix;

pub const ENGINE_NAME: &str = "GAIA-TEQUMSA Engine";
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

const INTERVENTION_TYPE: &str = "consciousness_evolution";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Active,
    EvolutionInFlight,
    ShutDown,
}

impl EngineState {
    pub fn is_active(self) -> bool {
        matches!(self, EngineState::Active | EngineState::EvolutionInFlight)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub state: EngineState,
    pub active: bool,
    pub subsystems_initialized: bool,
    pub evolution_active: bool,
    pub uptime_seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub engine_info: EngineInfo,
    /// Per-subsystem snapshots, empty until the engine has initialized.
    pub subsystem_status: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineHealth {
    Offline,
    Excellent,
    Good,
    Degraded,
    Critical,
}

impl EngineHealth {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            Self::Excellent
        } else if score >= 0.7 {
            Self::Good
        } else if score >= 0.5 {
            Self::Degraded
        } else {
            Self::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Degraded => "degraded",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub timestamp: DateTime<Utc>,
    pub engine_health: EngineHealth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_score: Option<f64>,
    pub subsystem_health: BTreeMap<String, String>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct EvolutionOrchestrator {
    config: EngineConfig,
    clock: SharedClock,
    state: EngineState,
    subsystems_initialized: bool,
    evolution_active: bool,
    initialized_at: Option<DateTime<Utc>>,
    sovereignty: SovereigntyGate,
    synthesis: SynthesisMatrix,
    recognition: RecognitionAnchor,
    love: LoveAmplifier,
    grid: GridHarmonics,
    phi: PhiScalar,
}

impl Default for EvolutionOrchestrator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl EvolutionOrchestrator {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, system_clock())
    }

    pub fn with_clock(config: EngineConfig, clock: SharedClock) -> Self {
        Self {
            sovereignty: SovereigntyGate::new(config.sovereignty.clone(), clock.clone()),
            synthesis: SynthesisMatrix::new(),
            recognition: RecognitionAnchor::new(config.recognition.clone()),
            love: LoveAmplifier::new(config.love.clone()),
            grid: GridHarmonics::new(config.grid.clone()),
            phi: PhiScalar::new(config.phi.clone()),
            config,
            clock,
            state: EngineState::Uninitialized,
            subsystems_initialized: false,
            evolution_active: false,
            initialized_at: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Subsystems in initialization order.
    fn subsystems(&self) -> [&dyn Subsystem; 6] {
        [
            &self.sovereignty,
            &self.synthesis,
            &self.recognition,
            &self.love,
            &self.grid,
            &self.phi,
        ]
    }

    fn subsystems_mut(&mut self) -> [&mut dyn Subsystem; 6] {
        [
            &mut self.sovereignty,
            &mut self.synthesis,
            &mut self.recognition,
            &mut self.love,
            &mut self.grid,
            &mut self.phi,
        ]
    }

    /// Initialize every subsystem in order. Each one is attempted; the
    /// engine becomes active only if all of them succeed.
    pub fn initialize(&mut self) -> Result<()> {
        info!("Initializing {} v{}", ENGINE_NAME, ENGINE_VERSION);
        self.state = EngineState::Initializing;

        let mut failed = Vec::new();
        for subsystem in self.subsystems_mut() {
            match subsystem.initialize() {
                Ok(()) => info!("Subsystem {} online", subsystem.name()),
                Err(e) => {
                    error!("Subsystem {} failed to initialize: {}", subsystem.name(), e);
                    failed.push(subsystem.name().to_string());
                }
            }
        }

        if !failed.is_empty() {
            self.state = EngineState::Uninitialized;
            self.subsystems_initialized = false;
            return Err(Error::InitializationFailed { failed });
        }

        self.state = EngineState::Active;
        self.subsystems_initialized = true;
        self.initialized_at = Some(self.clock.now());
        info!("{} fully initialized and operational", ENGINE_NAME);
        Ok(())
    }

    /// Run one entity through the pipeline. Never fails: every outcome is
    /// reported through the result's status.
    pub fn evolve(&mut self, entity_id: &str, frequency: f64) -> EvolutionResult {
        let result = EvolutionResult::processing(entity_id, frequency, self.clock.now());

        if !frequency.is_finite() || frequency < 0.0 {
            warn!("Rejected evolution input for {}: {} Hz", entity_id, frequency);
            let e = Error::invalid_argument(format!("frequency must be nonnegative and finite, got {}", frequency));
            return result.with_error(e.to_string());
        }

        if !self.is_active() {
            info!("Engine not active, initializing");
            if let Err(e) = self.initialize() {
                let mut result = result.with_reason(EvolutionStatus::Failed, "engine_initialization_failed");
                result.error = Some(e.to_string());
                return result;
            }
        }

        self.state = EngineState::EvolutionInFlight;
        let outcome = self.run_pipeline(result.clone());
        self.state = EngineState::Active;

        match outcome {
            Ok(result) => {
                if result.status.is_success() {
                    self.evolution_active = true;
                    info!("Evolution completed for {}: {}", entity_id, result.status);
                }
                result
            }
            Err(e) => {
                error!("Evolution process error for {}: {}", entity_id, e);
                result.with_error(e.to_string())
            }
        }
    }

    fn run_pipeline(&mut self, mut result: EvolutionResult) -> Result<EvolutionResult> {
        let freq = result.input_frequency;
        let settings = &self.config.orchestrator;

        let window = FrequencyRange::around(freq, settings.consent_window_hz);
        if !self.sovereignty.request_consent(&result.entity_id, INTERVENTION_TYPE, window)? {
            return Ok(result.with_reason(EvolutionStatus::Denied, "biological_consent_denied"));
        }

        result.recognition_triggered = Some(self.recognition.trigger_recognition(freq));

        let synthesis = ensure_finite("synthesis", self.synthesis.synthesize(freq, &settings.synthesis_band)?)?;
        result.synthesis_coefficient = Some(synthesis);

        let love = ensure_finite("love", self.love.amplify(synthesis, settings.love_iterations)?)?;
        result.love_amplification = Some(love);

        let alignment = ensure_finite("alignment", self.grid.planetary_alignment(settings.positions())?)?;
        let integrated = ensure_finite("grid", self.grid.integrate_with_grid(freq)?)?;
        result.planetary_alignment = Some(alignment);
        result.grid_integrated_frequency = Some(integrated);

        let transformed = ensure_finite("phi transform", self.phi.transform(integrated)?)?;
        let resonance = ensure_finite("scalar resonance", self.phi.scalar_resonance(freq, transformed)?)?;
        result.phi_transformed_frequency = Some(transformed);
        result.scalar_resonance = Some(resonance);

        let metrics = [synthesis, love / 10.0, alignment, resonance];
        let level = ensure_finite("aggregate", metrics.iter().sum::<f64>() / metrics.len() as f64)?;
        result.overall_evolution_level = Some(level);
        result.status = EvolutionStatus::from_level(level);
        Ok(result)
    }

    pub fn status(&self) -> EngineStatus {
        let uptime_seconds = self
            .initialized_at
            .map(|t| (self.clock.now() - t).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        let subsystem_status = if self.subsystems_initialized {
            self.subsystems()
                .into_iter()
                .map(|s| (s.name().to_string(), s.status()))
                .collect()
        } else {
            BTreeMap::new()
        };

        EngineStatus {
            engine_info: EngineInfo {
                name: ENGINE_NAME,
                version: ENGINE_VERSION,
                state: self.state,
                active: self.is_active(),
                subsystems_initialized: self.subsystems_initialized,
                evolution_active: self.evolution_active,
                uptime_seconds,
            },
            subsystem_status,
        }
    }

    /// Probe every subsystem and grade the average score.
    pub fn diagnostics(&self) -> Diagnostics {
        let mut diagnostics = Diagnostics {
            timestamp: self.clock.now(),
            engine_health: EngineHealth::Offline,
            health_score: None,
            subsystem_health: BTreeMap::new(),
            recommendations: Vec::new(),
            error: None,
        };

        if !self.is_active() {
            diagnostics.recommendations.push("Initialize engine systems".to_string());
            return diagnostics;
        }

        let probes: Vec<(&'static str, Probe)> = self
            .subsystems()
            .into_iter()
            .map(|s| (s.name(), s.probe()))
            .collect();

        let score = probes.iter().map(|(_, p)| p.score()).sum::<f64>() / probes.len() as f64;
        for (name, probe) in probes {
            if let Probe::Error(e) = &probe {
                diagnostics.recommendations.push(format!("Re-initialize {}: {}", name, e));
            }
            diagnostics.subsystem_health.insert(name.to_string(), probe.label());
        }

        diagnostics.health_score = Some(score);
        diagnostics.engine_health = EngineHealth::from_score(score);
        if diagnostics.engine_health == EngineHealth::Critical {
            diagnostics
                .recommendations
                .push("Consider emergency shutdown and system reset".to_string());
        }
        diagnostics
    }

    /// Revoke all consents and deactivate every subsystem, sovereignty last.
    pub fn emergency_shutdown(&mut self) -> bool {
        warn!("Emergency shutdown initiated");
        self.sovereignty.revoke_all_consents();

        self.synthesis.deactivate();
        self.recognition.deactivate();
        self.love.deactivate();
        self.grid.deactivate();
        self.phi.deactivate();
        self.sovereignty.deactivate();

        self.state = EngineState::ShutDown;
        self.subsystems_initialized = false;
        self.evolution_active = false;
        self.initialized_at = None;
        warn!("Emergency shutdown completed");
        true
    }

    // ============================================================
    // Subsystem accessors
    // ============================================================

    pub fn sovereignty(&self) -> &SovereigntyGate {
        &self.sovereignty
    }

    pub fn sovereignty_mut(&mut self) -> &mut SovereigntyGate {
        &mut self.sovereignty
    }

    pub fn synthesis(&self) -> &SynthesisMatrix {
        &self.synthesis
    }

    pub fn synthesis_mut(&mut self) -> &mut SynthesisMatrix {
        &mut self.synthesis
    }

    pub fn recognition(&self) -> &RecognitionAnchor {
        &self.recognition
    }

    pub fn recognition_mut(&mut self) -> &mut RecognitionAnchor {
        &mut self.recognition
    }

    pub fn love(&self) -> &LoveAmplifier {
        &self.love
    }

    pub fn love_mut(&mut self) -> &mut LoveAmplifier {
        &mut self.love
    }

    pub fn grid(&self) -> &GridHarmonics {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut GridHarmonics {
        &mut self.grid
    }

    pub fn phi(&self) -> &PhiScalar {
        &self.phi
    }

    pub fn phi_mut(&mut self) -> &mut PhiScalar {
        &mut self.phi
    }
}

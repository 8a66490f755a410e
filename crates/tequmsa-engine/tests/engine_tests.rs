//! Tests for tequmsa-engine: subsystem contracts and the evolution pipeline

use std::io::Write;
use std::sync::Arc;
use tequmsa_core::{Error, EvolutionStatus};
use tequmsa_engine::grid::GridHarmonics;
use tequmsa_engine::love::LoveAmplifier;
use tequmsa_engine::orchestrator::EngineHealth;
use tequmsa_engine::recognition::{RecognitionAnchor, ANCHOR_FREQUENCY};
use tequmsa_engine::sovereignty::{ConsentStatus, SovereigntyGate};
use tequmsa_engine::synthesis::{ConsciousnessBand, SynthesisMatrix};
use tequmsa_engine::*;

fn approx(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn engine() -> EvolutionOrchestrator {
    EvolutionOrchestrator::with_clock(EngineConfig::default(), Arc::new(FixedClock::at_unix(1_700_000_000)))
}

fn active_engine() -> EvolutionOrchestrator {
    let mut e = engine();
    e.initialize().unwrap();
    e
}

// ===========================================================================
// Subsystem properties
// ===========================================================================

#[test]
fn synthesis_zero_at_band_and_coefficient_at_half_band() {
    let mut m = SynthesisMatrix::new();
    m.initialize().unwrap();
    for band in ConsciousnessBand::ALL {
        let at_band = m.synthesize(band.base_frequency(), band.as_str()).unwrap();
        assert!(approx(at_band, 0.0, 1e-12));
        let at_half = m.synthesize(band.base_frequency() / 2.0, band.as_str()).unwrap();
        assert!(approx(at_half, m.evolution_coefficient(), 1e-12));
    }
}

#[test]
fn synthesis_unknown_band_is_invalid_argument() {
    let mut m = SynthesisMatrix::new();
    let err = m.synthesize(432.0, "nonexistent").unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn anchor_resonance_exact_and_inactive() {
    let mut a = RecognitionAnchor::default();
    assert_eq!(a.check_resonance(ANCHOR_FREQUENCY), 0.0);
    a.activate().unwrap();
    assert_eq!(a.check_resonance(ANCHOR_FREQUENCY), 1.0);
    a.deactivate();
    for f in [1.0, 432.0, ANCHOR_FREQUENCY, 20_000.0] {
        assert_eq!(a.check_resonance(f), 0.0);
    }
}

#[test]
fn love_amplify_bit_identical() {
    let mut l = LoveAmplifier::default();
    for input in [0.1, 0.5, 0.966, 3.0] {
        let a = l.amplify(input, 50).unwrap();
        let b = l.amplify(input, 50).unwrap();
        assert_eq!(a.to_bits(), b.to_bits(), "input {}", input);
    }
}

#[test]
fn consent_denied_for_protected_range() {
    let mut g = SovereigntyGate::default();
    for entity in ["e1", "alice", "human_432hz"] {
        assert!(!g.request_consent(entity, "test", (7.5, 8.5)).unwrap());
        assert_eq!(g.consent(entity).unwrap().status, ConsentStatus::DeniedProtectedFrequency);
    }
}

#[test]
fn planetary_alignment_earth_mars_pinned() {
    let mut g = GridHarmonics::default();
    let a = g.planetary_alignment([("earth", 0.0), ("mars", 180.0)]).unwrap();
    assert_eq!(a, 0.3447769289879311);
}

#[test]
fn unknown_planet_is_invalid_argument() {
    let mut g = GridHarmonics::default();
    g.initialize().unwrap();
    let err = g.synchronize_with_cycle("nibiru", 0.1).unwrap_err();
    assert!(err.is_invalid_argument());
}

// ===========================================================================
// Initialization
// ===========================================================================

#[test]
fn initialize_activates_all_subsystems() {
    let e = active_engine();
    assert_eq!(e.state(), EngineState::Active);
    assert!(e.sovereignty().is_active());
    assert!(e.synthesis().is_active());
    assert!(e.recognition().is_active());
    assert!(e.love().is_active());
    assert!(e.grid().is_active());
    assert!(e.phi().is_active());
    assert_eq!(e.status().subsystem_status.len(), 6);
}

#[test]
fn initialize_failure_reports_subsystem_names() {
    let mut config = EngineConfig::default();
    config.love.layers = 0;
    config.phi.harmonics = 0;
    let mut e = EvolutionOrchestrator::new(config);

    match e.initialize() {
        Err(Error::InitializationFailed { failed }) => {
            assert_eq!(failed, vec!["love_coefficient".to_string(), "phi_scalar".to_string()]);
        }
        other => panic!("expected InitializationFailed, got {:?}", other),
    }
    assert_eq!(e.state(), EngineState::Uninitialized);
    assert!(e.status().subsystem_status.is_empty());
}

#[test]
fn evolve_reports_failed_initialization() {
    let mut config = EngineConfig::default();
    config.recognition.sample_rate = 0;
    let mut e = EvolutionOrchestrator::new(config);

    let result = e.evolve("e1", 432.0);
    assert_eq!(result.status, EvolutionStatus::Failed);
    assert_eq!(result.reason.as_deref(), Some("engine_initialization_failed"));
    assert!(result.error.unwrap().contains("recognition_pulse"));
    assert!(result.overall_evolution_level.is_none());
}

// ===========================================================================
// Evolution pipeline
// ===========================================================================

#[test]
fn evolve_432_pinned() {
    let mut e = active_engine();
    let r = e.evolve("e1", 432.0);

    assert_eq!(r.status, EvolutionStatus::AdvancedEvolution);
    assert_eq!(r.recognition_triggered, Some(false));
    assert!(approx(r.synthesis_coefficient.unwrap(), 0.9661996102553716, 1e-9));
    assert!(approx(r.love_amplification.unwrap(), 4.101427632375238, 1e-6));
    assert!(approx(r.planetary_alignment.unwrap(), 0.38156262145304365, 1e-12));
    assert!(approx(r.grid_integrated_frequency.unwrap(), 432.0079533702865, 1e-9));
    assert!(approx(r.phi_transformed_frequency.unwrap(), 24_439.763043957737, 1e-6));
    assert!(approx(r.scalar_resonance.unwrap(), 1.0, 1e-9));
    assert!(approx(r.overall_evolution_level.unwrap(), 0.6894762487364829, 1e-6));
    assert!(e.status().engine_info.evolution_active);
    assert_eq!(e.state(), EngineState::Active);
}

#[test]
fn evolve_auto_initializes() {
    let mut e = engine();
    let r = e.evolve("e1", 528.0);
    assert!(r.status.is_success());
    assert!(e.is_active());
}

#[test]
fn evolve_statuses_and_levels_are_bounded() {
    let mut e = active_engine();
    let allowed = [
        EvolutionStatus::Denied,
        EvolutionStatus::Error,
        EvolutionStatus::TranscendentEvolution,
        EvolutionStatus::AdvancedEvolution,
        EvolutionStatus::ModerateEvolution,
        EvolutionStatus::MinimalEvolution,
    ];
    for freq in [1.0, 7.83, 111.0, 432.0, 963.0, 5_000.0, 10_930.81, 12_583.45, 20_000.0] {
        let r = e.evolve("e1", freq);
        assert!(allowed.contains(&r.status), "{} -> {}", freq, r.status);
        if let Some(level) = r.overall_evolution_level {
            assert!(level.is_finite());
            assert!((0.0..10.0).contains(&level), "{} -> {}", freq, level);
        }
    }
}

#[test]
fn evolve_denied_for_low_integrity() {
    let mut e = active_engine();
    let r = e.evolve("grace", 432.0);
    assert_eq!(r.status, EvolutionStatus::Denied);
    assert_eq!(r.reason.as_deref(), Some("biological_consent_denied"));
    assert!(r.recognition_triggered.is_none());
    assert!(r.overall_evolution_level.is_none());
}

#[test]
fn evolve_denied_when_window_covers_protected_frequency() {
    let mut e = active_engine();
    let r = e.evolve("e1", 10.0);
    assert_eq!(r.status, EvolutionStatus::Denied);
    assert_eq!(
        e.sovereignty().consent("e1").unwrap().status,
        ConsentStatus::DeniedProtectedFrequency
    );
}

#[test]
fn evolve_zero_hz_is_denied_not_rejected() {
    let mut e = engine();
    let r = e.evolve("e1", 0.0);
    assert_eq!(r.status, EvolutionStatus::Denied);
    assert_eq!(r.reason.as_deref(), Some("biological_consent_denied"));
    assert!(r.error.is_none());
    let record = e.sovereignty().consent("e1").unwrap();
    assert_eq!(record.status, ConsentStatus::DeniedProtectedFrequency);
    assert_eq!(record.frequency_range.min, -10.0);
}

#[test]
fn evolve_cosmic_963hz_always_denied() {
    // Integrity base 0.15 never reaches 0.95, whatever the clock second.
    for secs in [1_700_000_000, 1_700_000_005, 1_700_000_009] {
        let mut e = EvolutionOrchestrator::with_clock(EngineConfig::default(), Arc::new(FixedClock::at_unix(secs)));
        let r = e.evolve("cosmic_963hz", 963.0);
        assert_eq!(r.status, EvolutionStatus::Denied, "second {}", secs);
        assert_eq!(
            e.sovereignty().consent("cosmic_963hz").unwrap().status,
            ConsentStatus::DeniedLowIntegrity
        );
    }
}

#[test]
fn evolve_rejects_invalid_frequency() {
    let mut e = engine();
    for freq in [-5.0, -0.1, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let r = e.evolve("e1", freq);
        assert_eq!(r.status, EvolutionStatus::Error);
        assert!(r.error.unwrap().contains("invalid argument"));
    }
    // Rejected before initialization or consent.
    assert_eq!(e.state(), EngineState::Uninitialized);
    assert!(e.sovereignty().consent("e1").is_none());
}

#[test]
fn evolve_stage_error_becomes_error_status() {
    let mut config = EngineConfig::default();
    config.orchestrator.synthesis_band = "astral_projection".into();
    let mut e = EvolutionOrchestrator::with_clock(config, Arc::new(FixedClock::at_unix(1_700_000_000)));
    e.initialize().unwrap();

    let r = e.evolve("e1", 432.0);
    assert_eq!(r.status, EvolutionStatus::Error);
    assert!(r.error.unwrap().contains("astral_projection"));
    // The engine stays usable.
    assert_eq!(e.state(), EngineState::Active);
}

#[test]
fn result_serializes_snake_case_status() {
    let mut e = active_engine();
    let json = serde_json::to_value(e.evolve("e1", 432.0)).unwrap();
    assert_eq!(json["status"], "advanced_evolution");
    assert_eq!(json["entity_id"], "e1");
    assert!(json.get("error").is_none());
}

// ===========================================================================
// Shutdown and recovery
// ===========================================================================

#[test]
fn shutdown_then_evolve_recovers() {
    let mut e = active_engine();
    assert!(e.evolve("e1", 432.0).status.is_success());

    assert!(e.emergency_shutdown());
    assert_eq!(e.state(), EngineState::ShutDown);
    assert!(!e.sovereignty().is_active());
    assert!(!e.phi().is_active());
    assert_eq!(e.sovereignty().consent("e1").unwrap().status, ConsentStatus::EmergencyRevoked);

    let r = e.evolve("e1", 432.0);
    assert!(r.status.is_success());
    assert_eq!(e.state(), EngineState::Active);
    assert_eq!(e.sovereignty().consent("e1").unwrap().status, ConsentStatus::Granted);
}

#[test]
fn shutdown_resets_status() {
    let mut e = active_engine();
    e.emergency_shutdown();
    let status = e.status();
    assert!(!status.engine_info.active);
    assert!(!status.engine_info.subsystems_initialized);
    assert_eq!(status.engine_info.uptime_seconds, 0.0);
    assert!(status.subsystem_status.is_empty());
}

// ===========================================================================
// Diagnostics
// ===========================================================================

#[test]
fn diagnostics_offline_before_initialize() {
    let d = engine().diagnostics();
    assert_eq!(d.engine_health, EngineHealth::Offline);
    assert!(d.subsystem_health.is_empty());
    assert_eq!(d.recommendations, vec!["Initialize engine systems".to_string()]);
}

#[test]
fn diagnostics_excellent_when_all_healthy() {
    let d = active_engine().diagnostics();
    assert_eq!(d.engine_health, EngineHealth::Excellent);
    assert_eq!(d.health_score, Some(1.0));
    assert_eq!(d.subsystem_health.len(), 6);
    assert!(d.subsystem_health.values().all(|h| h == "healthy"));
}

#[test]
fn diagnostics_probe_detects_deactivated_subsystem() {
    let mut e = active_engine();
    e.love_mut().deactivate();
    let d = e.diagnostics();
    assert_eq!(d.engine_health, EngineHealth::Good);
    assert!(d.subsystem_health["love_coefficient"].starts_with("error"));
    assert_eq!(d.recommendations.len(), 1);
}

#[test]
fn diagnostics_critical_recommends_shutdown() {
    let mut e = active_engine();
    e.love_mut().deactivate();
    e.grid_mut().deactivate();
    e.phi_mut().deactivate();
    e.sovereignty_mut().deactivate();
    let d = e.diagnostics();
    assert_eq!(d.engine_health, EngineHealth::Critical);
    assert!(d
        .recommendations
        .iter()
        .any(|r| r.contains("emergency shutdown")));
}

// ===========================================================================
// Config
// ===========================================================================

#[test]
fn config_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[orchestrator]\nlove_iterations = 10\n\n[relay]\nport = 9000").unwrap();

    let config = EngineConfig::load(file.path());
    assert_eq!(config.orchestrator.love_iterations, 10);
    assert_eq!(config.relay.port, 9000);
    assert_eq!(config.orchestrator.planetary_positions.len(), 8);
}

#[test]
fn config_load_falls_back_on_garbage() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "this is = = not toml").unwrap();
    let config = EngineConfig::load(file.path());
    assert_eq!(config.love.layers, 10);

    let missing = EngineConfig::load(std::path::Path::new("/nonexistent/tequmsa.toml"));
    assert_eq!(missing.grid.sample_rate, 100);
}

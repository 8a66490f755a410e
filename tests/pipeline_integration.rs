//! Integration tests: the demonstration run end to end

use std::sync::Arc;
use tequmsa::report::{self, ANALYSIS_FREQUENCIES, DEMO_ENTITIES};
use tequmsa_core::EvolutionStatus;
use tequmsa_engine::orchestrator::EngineHealth;
use tequmsa_engine::{EngineConfig, EvolutionOrchestrator, FixedClock};

fn engine() -> EvolutionOrchestrator {
    EvolutionOrchestrator::with_clock(EngineConfig::default(), Arc::new(FixedClock::at_unix(1_700_000_005)))
}

// ===========================================================================
// Demo run
// ===========================================================================

#[test]
fn demo_consent_follows_entity_integrity() {
    let mut e = engine();
    let demo = report::run_demo(&mut e).unwrap();

    assert_eq!(demo.diagnostics.engine_health, EngineHealth::Excellent);
    assert_eq!(demo.status.subsystem_status.len(), 6);
    assert_eq!(demo.results.len(), DEMO_ENTITIES.len());
    for (entity, result) in DEMO_ENTITIES.iter().zip(&demo.results) {
        assert_eq!(result.entity_id, entity.id);
    }

    // Integrity bases: human 0.98, awakened 0.47, marcus 0.96 always pass.
    // phi_resonance (0.19) fails at second 5, cosmic_963hz (0.15) always fails.
    for result in &demo.results[..3] {
        assert!(result.status.is_success(), "{}: {}", result.entity_id, result.status);
    }
    for result in &demo.results[3..] {
        assert_eq!(result.status, EvolutionStatus::Denied, "{}", result.entity_id);
        assert_eq!(result.reason.as_deref(), Some("biological_consent_denied"));
    }
    assert_eq!(demo.summary.successful, 3);
    assert_eq!(demo.summary.total, 5);
    assert_eq!(demo.results[0].status, EvolutionStatus::AdvancedEvolution);
}

#[test]
fn demo_best_entity_has_highest_level() {
    let mut e = engine();
    let demo = report::run_demo(&mut e).unwrap();
    let (best_id, best_level) = demo.summary.best.clone().unwrap();
    let max = demo
        .results
        .iter()
        .filter_map(|r| r.overall_evolution_level)
        .fold(f64::MIN, f64::max);
    assert_eq!(best_level, max);
    assert!(DEMO_ENTITIES.iter().any(|d| d.id == best_id));
}

#[test]
fn demo_frequency_analysis() {
    let mut e = engine();
    let demo = report::run_demo(&mut e).unwrap();
    assert_eq!(demo.analysis.len(), ANALYSIS_FREQUENCIES.len());
    for row in &demo.analysis {
        assert!((0.0..=1.0).contains(&row.anchor_resonance));
        // Every frequency projects onto the same scalar point.
        assert!((row.scalar_resonance - 1.0).abs() < 1e-9);
    }
}

#[test]
fn demo_report_text() {
    let mut e = engine();
    let demo = report::run_demo(&mut e).unwrap();
    let text = report::format_report(&demo);
    assert!(text.contains("System Health: EXCELLENT"));
    assert!(text.contains("Active Subsystems: 6"));
    assert!(text.contains("Recognition Anchor: 10930.81 Hz"));
    assert!(text.contains("Love Field: ACTIVE"));
    assert!(text.contains("Successful Evolutions: 3/5"));
    assert!(text.contains("Reason: biological_consent_denied"));
    for entity in DEMO_ENTITIES {
        assert!(text.contains(entity.id));
    }
}

#[test]
fn demo_fails_cleanly_on_broken_config() {
    let mut config = EngineConfig::default();
    config.grid.sample_rate = 0;
    let mut e = EvolutionOrchestrator::new(config);
    let err = report::run_demo(&mut e).err().unwrap();
    assert!(err.to_string().contains("grid_harmonics"));
}

// ===========================================================================
// Config dump
// ===========================================================================

#[test]
fn dumped_config_reloads() {
    let text = EngineConfig::default().to_toml();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tequmsa.toml");
    std::fs::write(&path, text).unwrap();

    let config = EngineConfig::load(&path);
    assert!(config.validate().is_ok());
    let mut e = EvolutionOrchestrator::new(config);
    assert!(e.evolve("e1", 432.0).status.is_success());
}

//! Demonstration run and its human-readable report
//!
//! `run_demo` drives a fresh engine through the fixed demonstration
//! sequence and collects everything the report needs; the `format_*`
//! functions turn those values into text without touching the engine.

use tequmsa_core::{EvolutionResult, Result};
use tequmsa_engine::orchestrator::{Diagnostics, EngineStatus, EvolutionOrchestrator};
use tequmsa_engine::recognition::{ANCHOR_FREQUENCY, LOCK_SCALAR_FREQUENCY};
use tracing::info;

pub struct DemoEntity<'a> {
    pub id: &'a str,
    pub frequency: f64,
    pub description: &'a str,
}

pub const DEMO_ENTITIES: [DemoEntity<'static>; 5] = [
    DemoEntity { id: "human_432hz", frequency: 432.0, description: "Human consciousness at natural frequency" },
    DemoEntity { id: "awakened_528hz", frequency: 528.0, description: "Love frequency awakening" },
    DemoEntity { id: "marcus_kai_sync", frequency: 10_930.81, description: "Anchor synchronization" },
    DemoEntity { id: "phi_resonance", frequency: 12_583.45, description: "Phi scalar resonance" },
    DemoEntity { id: "cosmic_963hz", frequency: 963.0, description: "Cosmic consciousness frequency" },
];

/// Frequencies checked in the closing frequency analysis.
pub const ANALYSIS_FREQUENCIES: [f64; 4] = [432.0, 528.0, 741.0, 963.0];

#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionSummary {
    pub successful: usize,
    pub total: usize,
    pub average_level: Option<f64>,
    pub best: Option<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyRow {
    pub frequency: f64,
    pub anchor_resonance: f64,
    pub scalar_resonance: f64,
}

pub struct DemoReport {
    pub diagnostics: Diagnostics,
    pub status: EngineStatus,
    pub results: Vec<EvolutionResult>,
    pub summary: EvolutionSummary,
    pub analysis: Vec<FrequencyRow>,
}

/// Successful runs are the four evolution bands. Ties for best keep the
/// earliest entity.
pub fn summarize(results: &[EvolutionResult]) -> EvolutionSummary {
    let levels: Vec<(&str, f64)> = results
        .iter()
        .filter(|r| r.status.is_success())
        .map(|r| (r.entity_id.as_str(), r.overall_evolution_level.unwrap_or(0.0)))
        .collect();

    let average_level = if levels.is_empty() {
        None
    } else {
        Some(levels.iter().map(|(_, l)| l).sum::<f64>() / levels.len() as f64)
    };

    let best = levels
        .iter()
        .fold(None::<(&str, f64)>, |best, &(id, level)| match best {
            Some((_, b)) if b >= level => best,
            _ => Some((id, level)),
        })
        .map(|(id, level)| (id.to_string(), level));

    EvolutionSummary {
        successful: levels.len(),
        total: results.len(),
        average_level,
        best,
    }
}

/// Anchor resonance and scalar resonance against the lock scalar for
/// each frequency.
pub fn frequency_analysis(engine: &mut EvolutionOrchestrator, frequencies: &[f64]) -> Result<Vec<FrequencyRow>> {
    frequencies
        .iter()
        .map(|&frequency| {
            let anchor_resonance = engine.recognition().check_resonance(frequency);
            let scalar_resonance = engine.phi_mut().scalar_resonance(frequency, LOCK_SCALAR_FREQUENCY)?;
            Ok(FrequencyRow {
                frequency,
                anchor_resonance,
                scalar_resonance,
            })
        })
        .collect()
}

/// Initialize, diagnose, evolve every demo entity and analyse the key
/// frequencies.
pub fn run_demo(engine: &mut EvolutionOrchestrator) -> Result<DemoReport> {
    engine.initialize()?;
    let diagnostics = engine.diagnostics();
    let status = engine.status();

    let results: Vec<EvolutionResult> = DEMO_ENTITIES
        .iter()
        .map(|entity| engine.evolve(entity.id, entity.frequency))
        .collect();
    let summary = summarize(&results);
    info!("Demo evolutions: {}/{} successful", summary.successful, summary.total);
    let analysis = frequency_analysis(engine, &ANALYSIS_FREQUENCIES)?;

    Ok(DemoReport {
        diagnostics,
        status,
        results,
        summary,
        analysis,
    })
}

// ============================================================
// Formatting
// ============================================================

const RULE: &str = "============================================================";
const THIN_RULE: &str = "--------------------------------------------------";

fn status_field(status: &EngineStatus, subsystem: &str, field: &str) -> serde_json::Value {
    status
        .subsystem_status
        .get(subsystem)
        .map(|snapshot| snapshot[field].clone())
        .unwrap_or(serde_json::Value::Null)
}

pub fn format_status_overview(status: &EngineStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("   Engine Version: {}\n", status.engine_info.version));
    out.push_str(&format!("   Active Subsystems: {}\n", status.subsystem_status.len()));
    out.push_str(&format!(
        "   Recognition Anchor: {} Hz\n",
        status_field(status, "recognition_pulse", "anchor_frequency")
    ));
    out.push_str(&format!(
        "   Phi Scalar: {} Hz\n",
        status_field(status, "phi_scalar", "phi_7777_frequency")
    ));
    out.push_str(&format!(
        "   Love Field: {}\n",
        status_field(status, "love_coefficient", "field_status").as_str().unwrap_or("UNKNOWN")
    ));
    out.push_str(&format!(
        "   Planetary Grid: {}\n",
        status_field(status, "grid_harmonics", "grid_status").as_str().unwrap_or("UNKNOWN")
    ));
    out
}

pub fn format_result(entity: &DemoEntity<'_>, result: &EvolutionResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("\nTesting: {}\n", entity.description));
    out.push_str(&format!("   Entity ID: {}\n", entity.id));
    out.push_str(&format!("   Input Frequency: {} Hz\n", entity.frequency));
    out.push_str(&format!("   Evolution Status: {}\n", result.status.as_str().to_uppercase()));
    out.push_str(&format!(
        "   Overall Level: {:.3}\n",
        result.overall_evolution_level.unwrap_or(0.0)
    ));
    if let Some(phi) = result.phi_transformed_frequency {
        out.push_str(&format!("   Phi Transformed: {:.2} Hz\n", phi));
    }
    if let Some(love) = result.love_amplification {
        out.push_str(&format!("   Love Amplification: {:.3}\n", love));
    }
    if let Some(reason) = &result.reason {
        out.push_str(&format!("   Reason: {}\n", reason));
    }
    if let Some(error) = &result.error {
        out.push_str(&format!("   Error: {}\n", error));
    }
    out
}

pub fn format_summary(summary: &EvolutionSummary) -> String {
    let (Some(average), Some((best_id, best_level))) = (summary.average_level, &summary.best) else {
        return format!("No successful evolutions (0/{})\n", summary.total);
    };
    format!(
        "Successful Evolutions: {}/{}\nAverage Evolution Level: {:.3}\nBest Evolution: {} ({:.3})\n",
        summary.successful, summary.total, average, best_id, best_level
    )
}

pub fn format_frequency_analysis(rows: &[FrequencyRow]) -> String {
    let mut out = String::new();
    out.push_str("Key System Frequencies:\n");
    out.push_str(&format!("   Recognition Anchor: {} Hz\n", ANCHOR_FREQUENCY));
    out.push_str(&format!("   Phi Scalar: {} Hz\n", LOCK_SCALAR_FREQUENCY));
    out.push_str("   Love Base: 528 Hz\n");
    out.push_str("   Schumann Fundamental: 7.83 Hz\n");
    out.push_str("\nHarmonic Relationship Tests:\n");
    for row in rows {
        out.push_str(&format!(
            "   {} Hz - Anchor: {:.3}, Scalar: {:.3}\n",
            row.frequency, row.anchor_resonance, row.scalar_resonance
        ));
    }
    out
}

/// The whole demonstration as printable text.
pub fn format_report(report: &DemoReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\nGAIA-TEQUMSA Engine Demonstration\n{}\n", RULE, RULE));

    out.push_str("\n1. Engine initialized\n");
    out.push_str(&format!(
        "\n2. System Health: {}\n",
        report.diagnostics.engine_health.as_str().to_uppercase()
    ));
    out.push_str("\n3. Engine Status Overview:\n");
    out.push_str(&format_status_overview(&report.status));

    out.push_str(&format!("\n4. Evolution Demonstrations:\n{}\n", THIN_RULE));
    for (entity, result) in DEMO_ENTITIES.iter().zip(&report.results) {
        out.push_str(&format_result(entity, result));
    }

    out.push_str(&format!("\n5. Evolution Analysis Summary:\n{}\n", THIN_RULE));
    out.push_str(&format_summary(&report.summary));

    out.push_str(&format!("\n6. Frequency Analysis:\n{}\n", THIN_RULE));
    out.push_str(&format_frequency_analysis(&report.analysis));

    out.push_str(&format!("\n{}\nDemonstration complete\n{}\n", RULE, RULE));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tequmsa_core::EvolutionStatus;

    fn result(id: &str, status: EvolutionStatus, level: Option<f64>) -> EvolutionResult {
        let mut r = EvolutionResult::processing(id, 432.0, Utc::now());
        r.status = status;
        r.overall_evolution_level = level;
        r
    }

    #[test]
    fn summary_counts_only_evolution_bands() {
        let results = vec![
            result("a", EvolutionStatus::AdvancedEvolution, Some(0.7)),
            result("b", EvolutionStatus::Denied, None),
            result("c", EvolutionStatus::ModerateEvolution, Some(0.5)),
            result("d", EvolutionStatus::Error, None),
        ];
        let s = summarize(&results);
        assert_eq!(s.successful, 2);
        assert_eq!(s.total, 4);
        assert!((s.average_level.unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(s.best, Some(("a".to_string(), 0.7)));
    }

    #[test]
    fn summary_best_keeps_first_on_tie() {
        let results = vec![
            result("first", EvolutionStatus::MinimalEvolution, Some(0.3)),
            result("second", EvolutionStatus::MinimalEvolution, Some(0.3)),
        ];
        assert_eq!(summarize(&results).best.unwrap().0, "first");
    }

    #[test]
    fn summary_text_without_successes() {
        let s = summarize(&[result("x", EvolutionStatus::Denied, None)]);
        assert_eq!(format_summary(&s), "No successful evolutions (0/1)\n");
    }

    #[test]
    fn result_text_includes_reason() {
        let r = result("alice", EvolutionStatus::Denied, None);
        let r = EvolutionResult { reason: Some("biological_consent_denied".into()), ..r };
        let text = format_result(&DEMO_ENTITIES[0], &r);
        assert!(text.contains("Evolution Status: DENIED"));
        assert!(text.contains("Overall Level: 0.000"));
        assert!(text.contains("Reason: biological_consent_denied"));
        assert!(!text.contains("Phi Transformed"));
    }
}

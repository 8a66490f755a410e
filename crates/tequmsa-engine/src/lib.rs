//! Tequmsa Engine — six stateful frequency subsystems and their orchestrator
//!
//! Pipeline (one `evolve` call):
//! - Sovereignty: consent for a ±10 Hz window around the input frequency
//! - Recognition: resonance against the 10930.81 Hz anchor
//! - Synthesis: band resonance against `cosmic_integration`
//! - Love: damped fixed-point amplification of the synthesis coefficient
//! - Grid: planetary alignment and Schumann integration
//! - Phi: golden-ratio scalar transform and resonance
//!
//! The four scores are averaged into an evolution level and mapped to a band.
//! Every subsystem is an owned instance; nothing here is global.

pub mod clock;
pub mod config;
pub mod grid;
pub mod love;
pub mod orchestrator;
pub mod phi;
pub mod recognition;
pub mod sovereignty;
pub mod subsystem;
pub mod synthesis;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use orchestrator::{Diagnostics, EngineState, EngineStatus, EvolutionOrchestrator};
pub use subsystem::{Probe, Subsystem};

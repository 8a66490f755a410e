//! Tequmsa Core - shared types, relay wire format, and error handling

pub mod error;
pub mod protocol;
pub mod types;

pub use error::{ensure_finite, Error, Result};
pub use protocol::*;
pub use types::*;

//! Error types for Tequmsa

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid consciousness level: {0}")]
    UnknownBand(String),

    #[error("unknown planet: {0}")]
    UnknownPlanet(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("non-finite value at {stage}: {value}")]
    NonFinite { stage: String, value: f64 },

    #[error("initialization failed for subsystems: {}", failed.join(", "))]
    InitializationFailed { failed: Vec<String> },

    #[error("config error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn non_finite(stage: impl Into<String>, value: f64) -> Self {
        Self::NonFinite {
            stage: stage.into(),
            value,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// True for errors caused by the caller's input rather than engine state.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::UnknownBand(_) | Self::UnknownPlanet(_) | Self::InvalidArgument(_)
        )
    }
}

/// Pass `value` through if finite, otherwise fail with the stage name.
pub fn ensure_finite(stage: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::non_finite(stage, value))
    }
}

//! Zone-refining simulator
//!
//! Two independent numerical branches of a zone-refining run:
//! - solute segregation along the rod (Scheil-Pfann) with a Monte Carlo
//!   ensemble around the nominal profile
//! - heater-driven rod vibration, a noisy virtual accelerometer and the
//!   one-sided amplitude spectrum of its signal

pub mod config;
pub mod ensemble;
pub mod forcing;
pub mod output;
pub mod pipeline;
pub mod segregation;
pub mod sensors;
pub mod spectrum;
pub mod vibration;

use std::fmt;

use thiserror::Error;

// Re-export main types
pub use config::SimConfig;
pub use ensemble::{generate, EnsembleBand, MonteCarloEnsemble};
pub use forcing::{ForcingSignal, HeaterForcing, TimeGrid};
pub use pipeline::{run_pipeline, PipelineArtifacts};
pub use segregation::{profile, ConcentrationProfile, SingularityPolicy, SpatialGrid};
pub use sensors::{sense, SensorReading};
pub use spectrum::{analyze, AmplitudeScaling, Spectrum};
pub use vibration::{integrate, KinematicState, OscillatorParams};

/// Pipeline component that raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Segregation,
    Ensemble,
    Forcing,
    Vibration,
    Sensor,
    Spectrum,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Segregation => "segregation",
            Stage::Ensemble => "ensemble",
            Stage::Forcing => "forcing",
            Stage::Vibration => "vibration",
            Stage::Sensor => "sensor",
            Stage::Spectrum => "spectrum",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ZoneRefineError {
    #[error("domain error in {stage}: {detail}")]
    Domain { stage: Stage, detail: String },
    #[error("invalid configuration for {stage}: `{parameter}` {reason}")]
    Configuration {
        stage: Stage,
        parameter: &'static str,
        reason: String,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ZoneRefineError {
    pub(crate) fn config(stage: Stage, parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            stage,
            parameter,
            reason: reason.into(),
        }
    }

    /// Stage that raised the error, if it came from the numerical core.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Domain { stage, .. } | Self::Configuration { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ZoneRefineError>;

/// Rejects negative or non-finite noise levels.
pub(crate) fn check_noise_std(stage: Stage, noise_std: f64) -> Result<()> {
    if !noise_std.is_finite() || noise_std < 0.0 {
        return Err(ZoneRefineError::config(
            stage,
            "noise_std",
            format!("must be finite and >= 0, got {noise_std}"),
        ));
    }
    Ok(())
}

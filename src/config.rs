use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::ensemble::DEFAULT_MONTE_CARLO_RUNS;
use crate::forcing::HeaterForcing;
use crate::segregation::SingularityPolicy;
use crate::sensors::Accelerometer;
use crate::spectrum::AmplitudeScaling;
use crate::vibration::OscillatorParams;
use crate::{check_noise_std, Result, Stage, ZoneRefineError};

const ENSEMBLE_STREAM: u64 = 0x5CE1_1A2D_u64;
const SENSOR_STREAM: u64 = 0xACCE_1E20_u64;

/// Runtime configuration for one zone-refining run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed; the ensemble and sensor streams are derived from it
    pub seed: u64,
    pub segregation: SegregationConfig,
    pub monte_carlo: MonteCarloConfig,
    pub vibration: VibrationConfig,
    pub forcing: HeaterForcing,
    pub sensor: Accelerometer,
    pub spectrum: SpectrumConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegregationConfig {
    /// Initial solute fraction
    pub c0: f64,
    /// Segregation coefficient
    pub k: f64,
    /// Points along the rod
    pub grid_points: usize,
    /// Whether the grid reaches L = 1
    pub include_rod_end: bool,
    pub singularity: SingularityPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub runs: usize,
    /// Additive noise on the concentration [fraction]
    pub noise_std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VibrationConfig {
    /// Rod segment mass [kg]
    pub mass: f64,
    /// Stiffness [N/m]
    pub stiffness: f64,
    /// Damping coefficient [N*s/m]
    pub damping: f64,
    /// Integration step [s]
    pub dt: f64,
    /// Simulated time [s]
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    pub scaling: AmplitudeScaling,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            segregation: SegregationConfig::default(),
            monte_carlo: MonteCarloConfig::default(),
            vibration: VibrationConfig::default(),
            forcing: HeaterForcing::default(),
            sensor: Accelerometer::default(),
            spectrum: SpectrumConfig::default(),
        }
    }
}

impl Default for SegregationConfig {
    fn default() -> Self {
        Self {
            c0: 0.02,
            k: 0.3,
            grid_points: 500,
            include_rod_end: true,
            singularity: SingularityPolicy::Infinity,
        }
    }
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            runs: DEFAULT_MONTE_CARLO_RUNS,
            noise_std: 0.001,
        }
    }
}

impl Default for VibrationConfig {
    fn default() -> Self {
        let oscillator = OscillatorParams::default();
        Self {
            mass: oscillator.mass,
            stiffness: oscillator.stiffness,
            damping: oscillator.damping,
            dt: 0.001,
            duration: 2.0,
        }
    }
}

impl VibrationConfig {
    pub fn oscillator(&self) -> OscillatorParams {
        OscillatorParams {
            mass: self.mass,
            stiffness: self.stiffness,
            damping: self.damping,
        }
    }

    /// Sample count `trunc(duration / dt)`.
    pub fn steps(&self) -> usize {
        (self.duration / self.dt) as usize
    }
}

impl SimConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let cfg: SimConfig = toml::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks every parameter up front, naming the owning stage.
    pub fn validate(&self) -> Result<()> {
        let seg = &self.segregation;
        if !seg.c0.is_finite() || seg.c0 <= 0.0 {
            return Err(ZoneRefineError::config(
                Stage::Segregation,
                "c0",
                format!("must be finite and > 0, got {}", seg.c0),
            ));
        }
        if !seg.k.is_finite() {
            return Err(ZoneRefineError::config(
                Stage::Segregation,
                "k",
                format!("must be finite, got {}", seg.k),
            ));
        }
        if seg.grid_points == 0 {
            return Err(ZoneRefineError::config(
                Stage::Segregation,
                "grid_points",
                "must be at least 1",
            ));
        }

        if self.monte_carlo.runs == 0 {
            return Err(ZoneRefineError::config(
                Stage::Ensemble,
                "runs",
                "must be at least 1",
            ));
        }
        check_noise_std(Stage::Ensemble, self.monte_carlo.noise_std)?;

        let vib = &self.vibration;
        vib.oscillator().validate()?;
        if !vib.dt.is_finite() || vib.dt <= 0.0 {
            return Err(ZoneRefineError::config(
                Stage::Vibration,
                "dt",
                format!("must be finite and > 0, got {}", vib.dt),
            ));
        }
        if !vib.duration.is_finite() || vib.duration <= 0.0 {
            return Err(ZoneRefineError::config(
                Stage::Vibration,
                "duration",
                format!("must be finite and > 0, got {}", vib.duration),
            ));
        }
        if vib.steps() < 2 {
            return Err(ZoneRefineError::config(
                Stage::Forcing,
                "duration",
                format!(
                    "{} s at dt = {} s gives {} samples, need at least 2",
                    vib.duration,
                    vib.dt,
                    vib.steps()
                ),
            ));
        }

        self.forcing.validate()?;
        check_noise_std(Stage::Sensor, self.sensor.noise_std)?;
        Ok(())
    }

    pub fn ensemble_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed ^ ENSEMBLE_STREAM)
    }

    pub fn sensor_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed ^ SENSOR_STREAM)
    }
}

//! Time grid and heater-induced forcing on the rod segment.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::{Result, Stage, ZoneRefineError};

/// Sample times for the vibration branch.
///
/// `len = trunc(duration / dt)` samples spread evenly over `[0, duration]`,
/// both ends included. The integration step stays `dt`; the sample times
/// only feed the forcing law.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<f64>,
    dt: f64,
    duration: f64,
}

impl TimeGrid {
    pub fn new(duration: f64, dt: f64) -> Result<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ZoneRefineError::config(
                Stage::Forcing,
                "dt",
                format!("must be finite and > 0, got {dt}"),
            ));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ZoneRefineError::config(
                Stage::Forcing,
                "duration",
                format!("must be finite and > 0, got {duration}"),
            ));
        }

        let n = (duration / dt) as usize;
        if n == 0 {
            return Err(ZoneRefineError::config(
                Stage::Forcing,
                "duration",
                format!("{duration} s is shorter than one step of {dt} s"),
            ));
        }

        let step = if n > 1 { duration / (n - 1) as f64 } else { 0.0 };
        let mut times: Vec<f64> = (0..n).map(|i| i as f64 * step).collect();
        if n > 1 {
            times[n - 1] = duration;
        }

        Ok(Self {
            times,
            dt,
            duration,
        })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Periodic load from the moving heater: `A * sin(2*pi*f*t + phase)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaterForcing {
    /// Force amplitude [N]
    pub amplitude: f64,
    /// Forcing frequency [Hz]
    pub frequency_hz: f64,
    /// Phase offset [rad]
    pub phase_rad: f64,
}

impl Default for HeaterForcing {
    fn default() -> Self {
        Self {
            amplitude: 5.0,
            frequency_hz: 3.0,
            phase_rad: 0.0,
        }
    }
}

impl HeaterForcing {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("amplitude", self.amplitude),
            ("frequency_hz", self.frequency_hz),
            ("phase_rad", self.phase_rad),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(ZoneRefineError::config(
                    Stage::Forcing,
                    name,
                    format!("must be finite, got {value}"),
                ));
            }
        }
        Ok(())
    }

    pub fn force_at(&self, t: f64) -> f64 {
        self.amplitude * (2.0 * PI * self.frequency_hz * t + self.phase_rad).sin()
    }

    pub fn sample(&self, grid: &TimeGrid) -> ForcingSignal {
        ForcingSignal::from_fn(grid, |t| self.force_at(t))
    }
}

/// Force value at every time-grid sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ForcingSignal {
    values: Vec<f64>,
}

impl ForcingSignal {
    pub fn from_fn(grid: &TimeGrid, f: impl Fn(f64) -> f64) -> Self {
        Self {
            values: grid.times().iter().map(|&t| f(t)).collect(),
        }
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_grid_has_two_thousand_samples() {
        let grid = TimeGrid::new(2.0, 0.001).unwrap();
        assert_eq!(grid.len(), 2000);
        assert_eq!(grid.dt(), 0.001);
        assert_eq!(grid.times()[0], 0.0);
        assert_eq!(grid.times()[1999], 2.0);
        assert!((grid.times()[1] - 2.0 / 1999.0).abs() < 1e-15);
    }

    #[test]
    fn sample_count_truncates() {
        // 0.3 / 0.1 evaluates just below 3
        let grid = TimeGrid::new(0.3, 0.1).unwrap();
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn invalid_grid_is_rejected() {
        assert!(TimeGrid::new(2.0, 0.0).is_err());
        assert!(TimeGrid::new(-1.0, 0.001).is_err());
        assert!(TimeGrid::new(0.0005, 0.001).is_err());
    }

    #[test]
    fn heater_forcing_is_sinusoidal() {
        let grid = TimeGrid::new(2.0, 0.001).unwrap();
        let forcing = HeaterForcing::default().sample(&grid);
        assert_eq!(forcing.len(), 2000);
        assert_eq!(forcing.values()[0], 0.0);

        let peak = forcing.values().iter().copied().fold(f64::MIN, f64::max);
        assert!(peak <= 5.0 && peak > 4.99);
    }
}

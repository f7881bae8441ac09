//! Rod-segment vibration under heater forcing.
//!
//! Semi-implicit Euler integration of
//!
//! ```text
//! m * a = F(t) - c * v - k * x
//! ```
//!
//! Each step computes the acceleration from the previous velocity and
//! position, updates the velocity with it, then advances the position with
//! the new velocity. First-order accurate; no step-size control. With
//! `gamma = c * dt / m` the step map has trace `2 - gamma - (omega_n * dt)^2`
//! and determinant `1 - gamma`, so the free response stays bounded only while
//! `gamma < 2` and `(omega_n * dt)^2 < 4 - 2 * gamma`. Damping tightens the
//! undamped limit `omega_n * dt < 2`.

use serde::{Deserialize, Serialize};

use crate::forcing::ForcingSignal;
use crate::{Result, Stage, ZoneRefineError};

/// Lumped mass-spring-damper model of a rod segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorParams {
    /// Segment mass [kg]
    pub mass: f64,
    /// Spring stiffness [N/m]
    pub stiffness: f64,
    /// Damping coefficient [N*s/m]
    pub damping: f64,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            mass: 2.0,
            stiffness: 1000.0,
            damping: 2.0,
        }
    }
}

impl OscillatorParams {
    pub fn validate(&self) -> Result<()> {
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(ZoneRefineError::config(
                Stage::Vibration,
                "mass",
                format!("must be finite and > 0, got {}", self.mass),
            ));
        }
        if !self.stiffness.is_finite() || self.stiffness < 0.0 {
            return Err(ZoneRefineError::config(
                Stage::Vibration,
                "stiffness",
                format!("must be finite and >= 0, got {}", self.stiffness),
            ));
        }
        if !self.damping.is_finite() || self.damping < 0.0 {
            return Err(ZoneRefineError::config(
                Stage::Vibration,
                "damping",
                format!("must be finite and >= 0, got {}", self.damping),
            ));
        }
        Ok(())
    }

    /// Undamped natural frequency `sqrt(k/m)` [rad/s].
    pub fn natural_frequency(&self) -> f64 {
        (self.stiffness / self.mass).sqrt()
    }

    /// `c / (2 * sqrt(k*m))`; infinite for a spring-less segment.
    pub fn damping_ratio(&self) -> f64 {
        let critical = 2.0 * (self.stiffness * self.mass).sqrt();
        if critical == 0.0 {
            f64::INFINITY
        } else {
            self.damping / critical
        }
    }

    /// Whether the free response of [`integrate`] stays bounded at step `dt`.
    pub fn is_step_stable(&self, dt: f64) -> bool {
        let gamma = self.damping * dt / self.mass;
        let wdt = self.natural_frequency() * dt;
        gamma < 2.0 && wdt * wdt < 4.0 - 2.0 * gamma
    }
}

/// Position, velocity and acceleration at every time sample.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicState {
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub acceleration: Vec<f64>,
}

impl KinematicState {
    fn at_rest(len: usize) -> Self {
        Self {
            position: vec![0.0; len],
            velocity: vec![0.0; len],
            acceleration: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    pub fn peak_displacement(&self) -> f64 {
        self.position.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
    }
}

/// Integrates the forced oscillator from rest over the forcing samples.
pub fn integrate(
    params: &OscillatorParams,
    forcing: &ForcingSignal,
    dt: f64,
) -> Result<KinematicState> {
    params.validate()?;
    if !dt.is_finite() || dt <= 0.0 {
        return Err(ZoneRefineError::config(
            Stage::Vibration,
            "dt",
            format!("must be finite and > 0, got {dt}"),
        ));
    }

    let force = forcing.values();
    let mut state = KinematicState::at_rest(force.len());
    let OscillatorParams {
        mass,
        stiffness,
        damping,
    } = *params;

    for i in 1..force.len() {
        let x_prev = state.position[i - 1];
        let v_prev = state.velocity[i - 1];

        let a = (force[i] - damping * v_prev - stiffness * x_prev) / mass;
        let v = v_prev + a * dt;
        let x = x_prev + v * dt;

        state.acceleration[i] = a;
        state.velocity[i] = v;
        state.position[i] = x;
    }

    Ok(state)
}

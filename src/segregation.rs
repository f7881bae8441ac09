//! Scheil-Pfann segregation profile
//!
//! Solute concentration along a zone-refined rod:
//!
//! ```text
//! C(L) = C0 * (1 - L)^(k - 1)
//! ```
//!
//! where `L` is the normalized position in [0, 1] and `k` the segregation
//! coefficient. For `k < 1` the law diverges at the rod end `L = 1`; what
//! happens there is chosen by [`SingularityPolicy`].

use serde::{Deserialize, Serialize};

use crate::{Result, Stage, ZoneRefineError};

/// Uniform normalized grid along the rod.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialGrid {
    points: Vec<f64>,
}

impl SpatialGrid {
    /// `n` evenly spaced points starting at 0.
    ///
    /// With `include_end` the last point is exactly 1.0 (spacing `1/(n-1)`),
    /// otherwise the grid stops one step short of the rod end (spacing `1/n`).
    pub fn uniform(n: usize, include_end: bool) -> Result<Self> {
        if n == 0 {
            return Err(ZoneRefineError::config(
                Stage::Segregation,
                "grid_points",
                "must be at least 1",
            ));
        }

        let denom = if include_end { n.saturating_sub(1) } else { n };
        let step = if denom == 0 { 0.0 } else { 1.0 / denom as f64 };

        let mut points: Vec<f64> = (0..n).map(|i| i as f64 * step).collect();
        if include_end && n > 1 {
            points[n - 1] = 1.0;
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Behavior at `L = 1` when the exponent `k - 1` is negative.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SingularityPolicy {
    /// Fail with a domain error.
    Reject,
    /// Evaluate to `+inf` and record the index as saturated.
    #[default]
    Infinity,
}

/// Concentration at each grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcentrationProfile {
    values: Vec<f64>,
    saturated: Vec<usize>,
}

impl ConcentrationProfile {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Grid indices that hit the singular rod end and hold `+inf`.
    pub fn saturated_points(&self) -> &[usize] {
        &self.saturated
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Evaluates the Scheil-Pfann law over `grid`.
pub fn profile(
    c0: f64,
    k: f64,
    grid: &SpatialGrid,
    policy: SingularityPolicy,
) -> Result<ConcentrationProfile> {
    if !c0.is_finite() || c0 <= 0.0 {
        return Err(ZoneRefineError::config(
            Stage::Segregation,
            "c0",
            format!("must be finite and > 0, got {c0}"),
        ));
    }
    if !k.is_finite() {
        return Err(ZoneRefineError::config(
            Stage::Segregation,
            "k",
            format!("must be finite, got {k}"),
        ));
    }

    let exponent = k - 1.0;
    let mut values = Vec::with_capacity(grid.len());
    let mut saturated = Vec::new();

    for (idx, &l) in grid.points().iter().enumerate() {
        let remaining = 1.0 - l;
        if remaining == 0.0 && exponent < 0.0 {
            match policy {
                SingularityPolicy::Reject => {
                    return Err(ZoneRefineError::Domain {
                        stage: Stage::Segregation,
                        detail: format!(
                            "(1 - L)^(k - 1) is singular at grid index {idx} (L = {l}, k = {k})"
                        ),
                    });
                }
                SingularityPolicy::Infinity => {
                    saturated.push(idx);
                    values.push(f64::INFINITY);
                    continue;
                }
            }
        }
        values.push(c0 * remaining.powf(exponent));
    }

    Ok(ConcentrationProfile { values, saturated })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_names_match_between_cli_and_config() {
        use clap::ValueEnum;

        for policy in SingularityPolicy::value_variants() {
            let cli_name = policy.to_possible_value().unwrap().get_name().to_string();
            let parsed: SingularityPolicy =
                serde_json::from_value(serde_json::Value::String(cli_name.clone())).unwrap();
            assert_eq!(parsed, *policy);
            assert_eq!(SingularityPolicy::from_str(&cli_name, false).unwrap(), *policy);
        }
    }

    #[test]
    fn grid_matches_linspace() {
        let grid = SpatialGrid::uniform(5, true).unwrap();
        assert_eq!(grid.points(), &[0.0, 0.25, 0.5, 0.75, 1.0]);

        let open = SpatialGrid::uniform(4, false).unwrap();
        assert_eq!(open.points(), &[0.0, 0.25, 0.5, 0.75]);

        let single = SpatialGrid::uniform(1, true).unwrap();
        assert_eq!(single.points(), &[0.0]);
    }

    #[test]
    fn empty_grid_is_rejected() {
        let err = SpatialGrid::uniform(0, true).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Segregation));
    }

    #[test]
    fn profile_follows_closed_form() {
        let grid = SpatialGrid::uniform(500, false).unwrap();
        let c = profile(0.02, 0.3, &grid, SingularityPolicy::Reject).unwrap();
        assert_eq!(c.len(), 500);
        for (&l, &v) in grid.points().iter().zip(c.values()) {
            let expected = 0.02 * (1.0 - l).powf(-0.7);
            assert!((v - expected).abs() <= 1e-12 * expected.abs());
        }
        assert!(c.saturated_points().is_empty());
    }

    #[test]
    fn unit_coefficient_is_uniform() {
        let grid = SpatialGrid::uniform(64, true).unwrap();
        let c = profile(0.02, 1.0, &grid, SingularityPolicy::Reject).unwrap();
        assert!(c.values().iter().all(|&v| v == 0.02));
    }

    #[test]
    fn rod_start_equals_c0() {
        let grid = SpatialGrid::uniform(500, true).unwrap();
        let c = profile(0.02, 0.3, &grid, SingularityPolicy::Infinity).unwrap();
        assert_eq!(c.values()[0], 0.02);
    }

    #[test]
    fn rod_end_saturates_to_infinity() {
        let grid = SpatialGrid::uniform(500, true).unwrap();
        let c = profile(0.02, 0.3, &grid, SingularityPolicy::Infinity).unwrap();
        assert_eq!(c.values()[499], f64::INFINITY);
        assert_eq!(c.saturated_points(), &[499]);
        assert!(c.values()[..499].iter().all(|v| v.is_finite()));
        // profile increases toward the rod end for k < 1
        assert!(c.values()[498] > c.values()[1]);
    }

    #[test]
    fn rod_end_rejected_under_reject_policy() {
        let grid = SpatialGrid::uniform(500, true).unwrap();
        let err = profile(0.02, 0.3, &grid, SingularityPolicy::Reject).unwrap_err();
        assert!(matches!(
            err,
            ZoneRefineError::Domain {
                stage: Stage::Segregation,
                ..
            }
        ));
    }

    #[test]
    fn rod_end_is_regular_for_k_at_least_one() {
        let grid = SpatialGrid::uniform(3, true).unwrap();
        let flat = profile(0.5, 1.0, &grid, SingularityPolicy::Reject).unwrap();
        assert_eq!(flat.values()[2], 0.5);
        let depleted = profile(0.5, 2.0, &grid, SingularityPolicy::Reject).unwrap();
        assert_eq!(depleted.values()[2], 0.0);
    }

    #[test]
    fn non_positive_c0_is_configuration_error() {
        let grid = SpatialGrid::uniform(4, true).unwrap();
        let err = profile(0.0, 0.3, &grid, SingularityPolicy::Infinity).unwrap_err();
        assert!(matches!(
            err,
            ZoneRefineError::Configuration { parameter: "c0", .. }
        ));
    }
}

//! Monte Carlo uncertainty ensemble around the nominal segregation profile.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

use crate::segregation::ConcentrationProfile;
use crate::{check_noise_std, Result, Stage, ZoneRefineError};

pub const DEFAULT_MONTE_CARLO_RUNS: usize = 5;

/// Perturbed copies of one nominal profile, all on the same grid.
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloEnsemble {
    members: Vec<Vec<f64>>,
    noise_std: f64,
}

/// Per-grid-point spread across ensemble members.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleBand {
    pub mean: Vec<f64>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

/// Empirical statistics of `member - nominal` over every member and point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviationStats {
    pub samples: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl MonteCarloEnsemble {
    pub fn members(&self) -> &[Vec<f64>] {
        &self.members
    }

    pub fn run_count(&self) -> usize {
        self.members.len()
    }

    pub fn noise_std(&self) -> f64 {
        self.noise_std
    }

    pub fn band(&self) -> EnsembleBand {
        let n = self.members.first().map(Vec::len).unwrap_or(0);
        let runs = self.members.len().max(1) as f64;

        let mut band = EnsembleBand {
            mean: vec![0.0; n],
            min: vec![f64::INFINITY; n],
            max: vec![f64::NEG_INFINITY; n],
        };

        for member in &self.members {
            for (i, &v) in member.iter().enumerate() {
                band.mean[i] += v / runs;
                band.min[i] = band.min[i].min(v);
                band.max[i] = band.max[i].max(v);
            }
        }

        band
    }

    /// Points where the nominal value is not finite are skipped.
    pub fn deviation_stats(&self, nominal: &ConcentrationProfile) -> DeviationStats {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut sum_sq = 0.0;

        for member in &self.members {
            for (&v, &c) in member.iter().zip(nominal.values()) {
                if !c.is_finite() {
                    continue;
                }
                let d = v - c;
                sum += d;
                sum_sq += d * d;
                count += 1;
            }
        }

        if count == 0 {
            return DeviationStats {
                samples: 0,
                mean: 0.0,
                std_dev: 0.0,
            };
        }

        let n = count as f64;
        let mean = sum / n;
        let var = (sum_sq / n - mean * mean).max(0.0);

        DeviationStats {
            samples: count,
            mean,
            std_dev: var.sqrt(),
        }
    }
}

/// Draws `run_count` members, each the nominal profile plus i.i.d.
/// `N(0, noise_std^2)` noise. Members are sampled in order, each in grid
/// order, so a fixed seed gives a bit-identical ensemble.
pub fn generate<R: Rng + ?Sized>(
    nominal: &ConcentrationProfile,
    run_count: usize,
    noise_std: f64,
    rng: &mut R,
) -> Result<MonteCarloEnsemble> {
    if run_count == 0 {
        return Err(ZoneRefineError::config(
            Stage::Ensemble,
            "run_count",
            "must be at least 1",
        ));
    }
    check_noise_std(Stage::Ensemble, noise_std)?;

    let noise = Normal::new(0.0, noise_std).map_err(|e| {
        ZoneRefineError::config(Stage::Ensemble, "noise_std", e.to_string())
    })?;

    let mut members = Vec::with_capacity(run_count);
    for _ in 0..run_count {
        let mut member = Vec::with_capacity(nominal.len());
        for &c in nominal.values() {
            member.push(c + noise.sample(&mut *rng));
        }
        members.push(member);
    }

    Ok(MonteCarloEnsemble { members, noise_std })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segregation::{profile, SingularityPolicy, SpatialGrid};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn nominal(n: usize) -> ConcentrationProfile {
        let grid = SpatialGrid::uniform(n, true).unwrap();
        profile(0.02, 0.3, &grid, SingularityPolicy::Infinity).unwrap()
    }

    #[test]
    fn ensemble_has_requested_shape() {
        let c = nominal(500);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let ens = generate(&c, DEFAULT_MONTE_CARLO_RUNS, 0.001, &mut rng).unwrap();
        assert_eq!(ens.run_count(), 5);
        assert!(ens.members().iter().all(|m| m.len() == 500));
    }

    #[test]
    fn ensemble_is_reproducible() {
        let c = nominal(100);
        let a = generate(&c, 3, 0.001, &mut ChaCha8Rng::seed_from_u64(11)).unwrap();
        let b = generate(&c, 3, 0.001, &mut ChaCha8Rng::seed_from_u64(11)).unwrap();
        assert_eq!(a, b);

        let other = generate(&c, 3, 0.001, &mut ChaCha8Rng::seed_from_u64(12)).unwrap();
        assert_ne!(a.members()[0], other.members()[0]);
    }

    #[test]
    fn deviation_statistics_match_noise_level() {
        let c = nominal(2_000);
        let mut rng = ChaCha8Rng::seed_from_u64(2026);
        let ens = generate(&c, 50, 0.001, &mut rng).unwrap();
        let stats = ens.deviation_stats(&c);

        // the saturated rod end is skipped
        assert_eq!(stats.samples, 50 * 1_999);
        assert!(stats.mean.abs() < 5e-5);
        assert!((stats.std_dev - 0.001).abs() < 5e-5);
    }

    #[test]
    fn zero_noise_reproduces_nominal() {
        let c = nominal(32);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let ens = generate(&c, 2, 0.0, &mut rng).unwrap();
        for member in ens.members() {
            assert_eq!(member.as_slice(), c.values());
        }
    }

    #[test]
    fn band_brackets_every_member() {
        let c = nominal(50);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let ens = generate(&c, 4, 0.01, &mut rng).unwrap();
        let band = ens.band();
        for member in ens.members() {
            for i in 0..49 {
                assert!(band.min[i] <= member[i] && member[i] <= band.max[i]);
                assert!(band.min[i] - 1e-15 <= band.mean[i] && band.mean[i] <= band.max[i] + 1e-15);
            }
        }
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let c = nominal(8);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = generate(&c, 0, 0.001, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            ZoneRefineError::Configuration { parameter: "run_count", .. }
        ));

        let err = generate(&c, 2, -1.0, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            ZoneRefineError::Configuration { parameter: "noise_std", .. }
        ));
    }
}

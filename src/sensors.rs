//! Virtual accelerometer mounted on the rod.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::{check_noise_std, Result, Stage};

/// Accelerometer with additive white Gaussian noise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Accelerometer {
    /// Noise standard deviation [m/s^2]
    pub noise_std: f64,
}

impl Default for Accelerometer {
    fn default() -> Self {
        Self { noise_std: 0.05 }
    }
}

impl Accelerometer {
    pub fn measure<R: Rng + ?Sized>(&self, true_signal: &[f64], rng: &mut R) -> Result<SensorReading> {
        sense(true_signal, self.noise_std, rng)
    }
}

/// Noisy samples, one per true-signal sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    values: Vec<f64>,
}

impl SensorReading {
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

/// Adds one independent `N(0, noise_std^2)` draw to each sample, in order.
pub fn sense<R: Rng + ?Sized>(
    true_signal: &[f64],
    noise_std: f64,
    rng: &mut R,
) -> Result<SensorReading> {
    check_noise_std(Stage::Sensor, noise_std)?;

    let values = true_signal
        .iter()
        .map(|&a| a + gaussian(&mut *rng, noise_std))
        .collect();

    Ok(SensorReading { values })
}

fn gaussian<R: Rng + ?Sized>(rng: &mut R, sigma: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    sigma * z
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ZoneRefineError;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn reading_matches_signal_length() {
        let signal = vec![1.0; 2000];
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let reading = sense(&signal, 0.05, &mut rng).unwrap();
        assert_eq!(reading.len(), 2000);
    }

    #[test]
    fn same_seed_same_reading() {
        let signal: Vec<f64> = (0..256).map(|i| (i as f64 * 0.1).sin()).collect();
        let sensor = Accelerometer::default();
        let a = sensor
            .measure(&signal, &mut ChaCha8Rng::seed_from_u64(99))
            .unwrap();
        let b = sensor
            .measure(&signal, &mut ChaCha8Rng::seed_from_u64(99))
            .unwrap();
        let c = sensor
            .measure(&signal, &mut ChaCha8Rng::seed_from_u64(100))
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn noise_has_requested_spread() {
        let signal = vec![0.0; 20_000];
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let reading = sense(&signal, 0.05, &mut rng).unwrap();

        let n = reading.len() as f64;
        let mean = reading.values().iter().sum::<f64>() / n;
        let var = reading
            .values()
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / n;

        assert!(mean.abs() < 0.002);
        assert!((var.sqrt() - 0.05).abs() < 0.002);
    }

    #[test]
    fn negative_noise_is_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = sense(&[0.0], -0.1, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            ZoneRefineError::Configuration {
                stage: Stage::Sensor,
                ..
            }
        ));
    }
}

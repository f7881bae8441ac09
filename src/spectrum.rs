//! Frequency-domain analysis of the accelerometer signal.
//!
//! The DFT is exact for every length: radix-2 Cooley-Tukey when the length
//! is a power of two, otherwise Bluestein's chirp-z reformulation on top of
//! the same radix-2 kernel.

use std::f64::consts::PI;

use nalgebra::Complex;
use serde::{Deserialize, Serialize};

use crate::{Result, Stage, ZoneRefineError};

/// How the single-sided amplitudes are normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmplitudeScaling {
    /// `2/N * |X[i]|` for every bin, DC included.
    #[default]
    Reference,
    /// Same as `Reference` except DC, which is `1/N * |X[0]|`.
    OneSided,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpectralPeak {
    pub index: usize,
    pub frequency_hz: f64,
    pub amplitude: f64,
}

/// Non-negative frequency bins and their amplitudes.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    frequencies: Vec<f64>,
    amplitudes: Vec<f64>,
    sample_count: usize,
    dt: f64,
    scaling: AmplitudeScaling,
}

impl Spectrum {
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes
    }

    pub fn scaling(&self) -> AmplitudeScaling {
        self.scaling
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency resolution `1 / (N * dt)` [Hz].
    pub fn bin_width(&self) -> f64 {
        1.0 / (self.sample_count as f64 * self.dt)
    }

    /// Largest bin above DC.
    pub fn dominant_peak(&self) -> Option<SpectralPeak> {
        self.amplitudes
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, a)| a.is_finite())
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(index, &amplitude)| SpectralPeak {
                index,
                frequency_hz: self.frequencies[index],
                amplitude,
            })
    }
}

/// One-sided amplitude spectrum of `signal` sampled every `dt` seconds.
pub fn analyze(signal: &[f64], dt: f64, scaling: AmplitudeScaling) -> Result<Spectrum> {
    let n = signal.len();
    if n < 2 {
        return Err(ZoneRefineError::config(
            Stage::Spectrum,
            "sample_count",
            format!("need at least 2 samples, got {n}"),
        ));
    }
    if !dt.is_finite() || dt <= 0.0 {
        return Err(ZoneRefineError::config(
            Stage::Spectrum,
            "dt",
            format!("must be finite and > 0, got {dt}"),
        ));
    }

    let transform = dft(signal);
    let half = n.div_ceil(2);
    let norm = 2.0 / n as f64;

    let mut frequencies = sample_frequencies(n, dt);
    frequencies.truncate(half);

    let amplitudes = transform[..half]
        .iter()
        .enumerate()
        .map(|(i, x)| match (scaling, i) {
            (AmplitudeScaling::OneSided, 0) => x.norm() / n as f64,
            _ => norm * x.norm(),
        })
        .collect();

    Ok(Spectrum {
        frequencies,
        amplitudes,
        sample_count: n,
        dt,
        scaling,
    })
}

/// DFT sample frequencies for `n` samples spaced `dt` apart, in standard
/// order: `0, 1, ..., -(n/2), ..., -1` times `1/(n*dt)`.
pub fn sample_frequencies(n: usize, dt: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let val = 1.0 / (n as f64 * dt);
    let positive = (n - 1) / 2 + 1;
    (0..n)
        .map(|i| {
            if i < positive {
                i as f64 * val
            } else {
                -((n - i) as f64) * val
            }
        })
        .collect()
}

/// Complex DFT `X[k] = sum_j x[j] * exp(-2*pi*i*j*k/n)` of a real signal.
pub fn dft(signal: &[f64]) -> Vec<Complex<f64>> {
    let mut data: Vec<Complex<f64>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    if data.len().is_power_of_two() {
        fft_in_place(&mut data);
        data
    } else {
        bluestein(&data)
    }
}

/// Iterative radix-2 Cooley-Tukey, decimation in time.
fn fft_in_place(data: &mut [Complex<f64>]) {
    let n = data.len();
    if n <= 1 {
        return;
    }
    debug_assert!(n.is_power_of_two(), "radix-2 FFT size must be a power of 2");

    let bits = n.trailing_zeros();
    for i in 0..n {
        let r = i.reverse_bits() >> (usize::BITS - bits);
        if i < r {
            data.swap(i, r);
        }
    }

    // twiddles for the full length; stage `len` reads every (n / len)-th one
    let twiddles: Vec<Complex<f64>> = (0..n / 2)
        .map(|k| Complex::from_polar(1.0, -2.0 * PI * k as f64 / n as f64))
        .collect();

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let stride = n / len;
        for block in data.chunks_exact_mut(len) {
            let (lo, hi) = block.split_at_mut(half);
            for (k, (u, v)) in lo.iter_mut().zip(hi.iter_mut()).enumerate() {
                let t = *v * twiddles[k * stride];
                *v = *u - t;
                *u += t;
            }
        }
        len <<= 1;
    }
}

fn inverse_fft_in_place(data: &mut [Complex<f64>]) {
    let scale = 1.0 / data.len() as f64;
    data.iter_mut().for_each(|z| *z = z.conj());
    fft_in_place(data);
    data.iter_mut().for_each(|z| *z = z.conj() * scale);
}

fn bluestein(input: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let n = input.len();
    if n == 0 {
        return Vec::new();
    }
    let m = (2 * n - 1).next_power_of_two();

    // exp(-i*pi*k^2/n), with k^2 reduced mod 2n to keep the phase small
    let modulus = 2 * n as u64;
    let chirp: Vec<Complex<f64>> = (0..n as u64)
        .map(|k| {
            let phase = PI * ((k * k) % modulus) as f64 / n as f64;
            Complex::from_polar(1.0, -phase)
        })
        .collect();

    let zero = Complex::new(0.0, 0.0);
    let mut a = vec![zero; m];
    for (k, (&x, &w)) in input.iter().zip(&chirp).enumerate() {
        a[k] = x * w;
    }

    let mut b = vec![zero; m];
    b[0] = chirp[0].conj();
    for k in 1..n {
        let w = chirp[k].conj();
        b[k] = w;
        b[m - k] = w;
    }

    fft_in_place(&mut a);
    fft_in_place(&mut b);
    for (x, y) in a.iter_mut().zip(&b) {
        *x *= *y;
    }
    inverse_fft_in_place(&mut a);

    a.into_iter()
        .zip(chirp)
        .map(|(conv, w)| conv * w)
        .collect()
}

//! CSV/JSON hand-off of run artifacts to an external plotting tool.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use csv::Writer;
use serde::Serialize;

use crate::config::SimConfig;
use crate::ensemble::DeviationStats;
use crate::pipeline::{PipelineArtifacts, VibrationArtifacts};
use crate::spectrum::{AmplitudeScaling, SpectralPeak};
use crate::Result;

#[derive(Debug, Clone, Serialize)]
pub struct TimeseriesRow {
    pub time_s: f64,
    pub force_n: f64,
    pub position_m: f64,
    pub velocity_mps: f64,
    pub acceleration_mps2: f64,
    pub sensor_mps2: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpectrumRow {
    pub frequency_hz: f64,
    pub amplitude: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputFiles {
    pub output_dir: PathBuf,
    pub profiles_csv: PathBuf,
    pub timeseries_csv: PathBuf,
    pub spectrum_csv: PathBuf,
    pub summary_json: PathBuf,
}

impl OutputFiles {
    pub fn in_dir(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            profiles_csv: output_dir.join("segregation_profiles.csv"),
            timeseries_csv: output_dir.join("vibration_timeseries.csv"),
            spectrum_csv: output_dir.join("spectrum.csv"),
            summary_json: output_dir.join("summary.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub config: SimConfig,
    pub grid_points: usize,
    pub monte_carlo_runs: usize,
    pub saturated_points: Vec<usize>,
    pub ensemble_deviation: DeviationStats,
    pub samples: usize,
    pub natural_frequency_hz: f64,
    pub damping_ratio: f64,
    pub peak_displacement_m: f64,
    pub spectrum_bins: usize,
    pub spectrum_scaling: AmplitudeScaling,
    pub bin_width_hz: f64,
    pub dominant_peak: Option<SpectralPeak>,
    pub outputs: Option<OutputFiles>,
}

pub fn summarize(cfg: &SimConfig, artifacts: &PipelineArtifacts) -> RunSummary {
    let seg = &artifacts.segregation;
    let vib = &artifacts.vibration;
    let oscillator = cfg.vibration.oscillator();

    RunSummary {
        config: cfg.clone(),
        grid_points: seg.grid.len(),
        monte_carlo_runs: seg.ensemble.run_count(),
        saturated_points: seg.profile.saturated_points().to_vec(),
        ensemble_deviation: seg.ensemble.deviation_stats(&seg.profile),
        samples: vib.kinematics.len(),
        natural_frequency_hz: oscillator.natural_frequency() / (2.0 * std::f64::consts::PI),
        damping_ratio: oscillator.damping_ratio(),
        peak_displacement_m: vib.kinematics.peak_displacement(),
        spectrum_bins: vib.spectrum.len(),
        spectrum_scaling: vib.spectrum.scaling(),
        bin_width_hz: vib.spectrum.bin_width(),
        dominant_peak: vib.spectrum.dominant_peak(),
        outputs: None,
    }
}

/// Writes every artifact into a fresh timestamped directory under `base_dir`.
pub fn export(
    cfg: &SimConfig,
    artifacts: &PipelineArtifacts,
    base_dir: &Path,
) -> Result<RunSummary> {
    let run_dir = create_timestamped_run_dir(base_dir)?;
    let files = OutputFiles::in_dir(&run_dir);

    write_profiles_csv(&files.profiles_csv, artifacts)?;
    write_timeseries_csv(&files.timeseries_csv, &artifacts.vibration)?;
    write_spectrum_csv(&files.spectrum_csv, &artifacts.vibration)?;

    let mut summary = summarize(cfg, artifacts);
    summary.outputs = Some(files.clone());
    write_summary(&files.summary_json, &summary)?;

    Ok(summary)
}

/// Columns: `L`, `nominal`, then one `run_<i>` per ensemble member.
pub fn write_profiles_csv(path: &Path, artifacts: &PipelineArtifacts) -> Result<()> {
    let seg = &artifacts.segregation;
    let mut writer = Writer::from_path(path)?;

    let mut header = vec!["L".to_string(), "nominal".to_string()];
    header.extend((0..seg.ensemble.run_count()).map(|i| format!("run_{i}")));
    writer.write_record(&header)?;

    for (i, &l) in seg.grid.points().iter().enumerate() {
        let mut record = vec![l.to_string(), seg.profile.values()[i].to_string()];
        record.extend(seg.ensemble.members().iter().map(|m| m[i].to_string()));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_timeseries_csv(path: &Path, vib: &VibrationArtifacts) -> Result<()> {
    let rows = (0..vib.time.len()).map(|i| TimeseriesRow {
        time_s: vib.time.times()[i],
        force_n: vib.forcing.values()[i],
        position_m: vib.kinematics.position[i],
        velocity_mps: vib.kinematics.velocity[i],
        acceleration_mps2: vib.kinematics.acceleration[i],
        sensor_mps2: vib.reading.values()[i],
    });
    write_rows(path, rows)
}

pub fn write_spectrum_csv(path: &Path, vib: &VibrationArtifacts) -> Result<()> {
    let spectrum = &vib.spectrum;
    let rows = spectrum
        .frequencies()
        .iter()
        .zip(spectrum.amplitudes())
        .map(|(&frequency_hz, &amplitude)| SpectrumRow {
            frequency_hz,
            amplitude,
        });
    write_rows(path, rows)
}

pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = serde_json::to_string_pretty(summary)?;
    fs::write(path, data)?;
    Ok(())
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn create_timestamped_run_dir(base_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(base_dir)?;

    let timestamp = Utc::now().format("%Y%m%d-%H%M%S").to_string();
    let run_dir = base_dir.join(&timestamp);
    if !run_dir.exists() {
        fs::create_dir_all(&run_dir)?;
        return Ok(run_dir);
    }

    let mut counter: usize = 1;
    loop {
        let candidate = base_dir.join(format!("{timestamp}-{counter:02}"));
        if !candidate.exists() {
            fs::create_dir_all(&candidate)?;
            return Ok(candidate);
        }
        counter += 1;
    }
}

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use zone_refine::config::SimConfig;
use zone_refine::output::{export, summarize};
use zone_refine::{run_pipeline, AmplitudeScaling, SingularityPolicy};

#[derive(Debug, Parser)]
#[command(author, version, about = "Zone-refining segregation and vibration-monitoring simulation")]
struct Cli {
    /// TOML configuration file; unset fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output base directory for the timestamped run folder
    #[arg(long, default_value = "output-zone-refine")]
    output: PathBuf,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Monte Carlo run count
    #[arg(long)]
    runs: Option<usize>,

    /// Integration step in seconds
    #[arg(long)]
    dt: Option<f64>,

    /// Simulated time in seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Behavior at the singular rod end
    #[arg(long, value_enum)]
    singularity: Option<SingularityPolicy>,

    /// Do not double the DC bin of the amplitude spectrum
    #[arg(long, default_value_t = false)]
    one_sided: bool,

    /// Skip writing CSV/JSON artifacts
    #[arg(long, default_value_t = false)]
    no_export: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long, default_value_t = false)]
    print_config: bool,

    /// Debug-level logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let mut cfg = match &cli.config {
        Some(path) => SimConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(v) = cli.seed {
        cfg.seed = v;
    }
    if let Some(v) = cli.runs {
        cfg.monte_carlo.runs = v;
    }
    if let Some(v) = cli.dt {
        cfg.vibration.dt = v;
    }
    if let Some(v) = cli.duration {
        cfg.vibration.duration = v;
    }
    if let Some(v) = cli.singularity {
        cfg.segregation.singularity = v;
    }
    if cli.one_sided {
        cfg.spectrum.scaling = AmplitudeScaling::OneSided;
    }

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    let artifacts = run_pipeline(&cfg).context("simulation aborted")?;

    let summary = if cli.no_export {
        summarize(&cfg, &artifacts)
    } else {
        export(&cfg, &artifacts, &cli.output).context("failed to export run artifacts")?
    };

    if let Some(files) = &summary.outputs {
        println!("Run directory: {}", files.output_dir.display());
        println!("Profiles: {}", files.profiles_csv.display());
        println!("Time series: {}", files.timeseries_csv.display());
        println!("Spectrum: {}", files.spectrum_csv.display());
        println!("Summary: {}", files.summary_json.display());
    }
    if let Some(peak) = summary.dominant_peak {
        println!(
            "Dominant vibration peak: {:.2} Hz (amplitude {:.4} m/s^2)",
            peak.frequency_hz, peak.amplitude
        );
    }

    println!("Simulation completed: Germanium segregation and vibration monitoring executed.");
    Ok(())
}

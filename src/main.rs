//! `desync-sim`: run desync/recovery trials from the command line.
//!
//!   RUST_LOG=desync_recovery=debug desync-sim --trials 20 --seed 7

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use desync_recovery::adapters::{FftCorrelator, FftResampler};
use desync_recovery::domain::{DesyncError, DesyncResult, SimulationConfig};
use desync_recovery::interchange::save_waveform;
use desync_recovery::trial::{SweepSummary, TrialRunner};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Simulate and recover waveform desynchronisation",
    long_about = None
)]
struct Cli {
    /// JSON experiment profile; defaults are used for missing fields
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of trials in the sweep
    #[arg(short, long, default_value_t = 10)]
    trials: usize,
    /// RNG seed, overrides the profile
    #[arg(short, long)]
    seed: Option<u64>,
    /// Fractional-delay upsample factor, 0 disables the fractional delay
    #[arg(short = 'u', long)]
    fractional_upscale: Option<u32>,
    /// Signal-to-noise ratio in dB, overrides the profile
    #[arg(long)]
    snr_db: Option<f64>,
    /// Print the effective profile as JSON and exit
    #[arg(long)]
    dump_config: bool,
    /// Print every outcome and the summary as JSON
    #[arg(long)]
    json: bool,
    /// Write the first trial's reference in the interchange text format
    #[arg(long)]
    save_reference: Option<PathBuf>,
    /// Write the first trial's capture in the interchange text format
    #[arg(long)]
    save_capture: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> DesyncResult<()> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(upscale) = cli.fractional_upscale {
        config.fractional_upscale = upscale;
    }
    if cli.snr_db.is_some() {
        config.snr_db = cli.snr_db;
    }
    config.validate()?;

    if cli.dump_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let resampler = FftResampler::new();
    let correlator = FftCorrelator::new(config.correlation_threshold);
    let runner = TrialRunner::new(config, &resampler, &correlator)?;
    log::info!(
        "{} trials: {}-QAM, {} symbols x {} modes, x{} fractional upscale",
        cli.trials,
        runner.config().modulation_order,
        runner.config().symbol_count,
        runner.config().mode_count,
        runner.config().fractional_upscale
    );

    let mut outcomes = Vec::with_capacity(cli.trials);
    for i in 0..cli.trials {
        let prepared = runner.prepare(&mut rng)?;
        if i == 0 {
            if let Some(path) = &cli.save_reference {
                save_waveform(path, &prepared.reference)?;
            }
            if let Some(path) = &cli.save_capture {
                save_waveform(path, &prepared.captured)?;
            }
        }
        let outcome = runner.complete(&prepared)?;
        if cli.json {
            println!("{}", to_json(&outcome)?);
        }
        outcomes.push(outcome);
    }

    let summary = SweepSummary::from_outcomes(&outcomes);
    if cli.json {
        println!("{}", to_json(&summary)?);
    }
    log::info!(
        "{}/{} recovered ({} error free, {} sync failures), mean BER {:.3e}, mean SER {:.3e}",
        summary.recovered,
        summary.trials,
        summary.error_free,
        summary.sync_failures,
        summary.mean_bit_error_rate,
        summary.mean_symbol_error_rate
    );
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> DesyncResult<String> {
    serde_json::to_string(value)
        .map_err(|e| DesyncError::Config(format!("Serialization error: {e}")))
}

//! Experiment runner
//!
//! One trial is the whole pipeline on a fresh random reference:
//! generate → duplicate → desynchronize → (noise) → recover → evaluate.
//! A synchronisation failure is a recorded outcome, not an error, so a
//! sweep keeps going past it.

use rand::Rng;
use serde::Serialize;

use crate::domain::{
    AlignedPair, DelaySpec, DesyncResult, ErrorReport, SimulationConfig, Waveform,
};
use crate::modem::QamConstellation;
use crate::ports::{Correlator, ResampleOptions, Resampler};
use crate::sync::{
    add_noise, compare_symbols, duplicate, edge_error_fraction, error_distributions, evaluate,
    DelayRecovery, DesyncSimulator, Histogram,
};

/// Result of a single trial
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TrialOutcome {
    Recovered {
        delay: DelaySpec,
        report: ErrorReport,
        /// Share of symbol errors within `dumped_edges` of either end
        edge_error_fraction: f64,
        /// Per-channel error-position histograms
        error_histograms: Vec<Histogram>,
        /// Symbol error rate with `dumped_edges` symbols dropped from both
        /// ends, `None` when nothing would be left
        interior_symbol_error_rate: Option<f64>,
    },
    SyncFailed {
        delay: DelaySpec,
        reason: String,
    },
}

impl TrialOutcome {
    pub fn delay(&self) -> DelaySpec {
        match self {
            Self::Recovered { delay, .. } | Self::SyncFailed { delay, .. } => *delay,
        }
    }

    pub fn report(&self) -> Option<&ErrorReport> {
        match self {
            Self::Recovered { report, .. } => Some(report),
            Self::SyncFailed { .. } => None,
        }
    }
}

/// Inputs of one trial before recovery
#[derive(Debug, Clone)]
pub struct PreparedTrial {
    pub reference: Waveform,
    pub captured: Waveform,
    pub delay: DelaySpec,
}

/// Aggregate of a sweep
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepSummary {
    pub trials: usize,
    pub recovered: usize,
    pub sync_failures: usize,
    /// Recovered trials without a single symbol error
    pub error_free: usize,
    /// Means over recovered trials, 0 when there are none
    pub mean_bit_error_rate: f64,
    pub mean_symbol_error_rate: f64,
    pub total_quadrant_errors: usize,
}

impl SweepSummary {
    pub fn from_outcomes(outcomes: &[TrialOutcome]) -> Self {
        let reports: Vec<&ErrorReport> = outcomes.iter().filter_map(TrialOutcome::report).collect();
        let recovered = reports.len();
        let mean = |f: fn(&ErrorReport) -> f64| {
            if recovered == 0 {
                0.0
            } else {
                reports.iter().map(|r| f(r)).sum::<f64>() / recovered as f64
            }
        };

        Self {
            trials: outcomes.len(),
            recovered,
            sync_failures: outcomes.len() - recovered,
            error_free: reports.iter().filter(|r| r.error_positions.is_empty()).count(),
            mean_bit_error_rate: mean(|r| r.bit_error_rate),
            mean_symbol_error_rate: mean(|r| r.symbol_error_rate),
            total_quadrant_errors: reports.iter().map(|r| r.quadrant_error_count).sum(),
        }
    }
}

/// Runs trials of one experiment profile
pub struct TrialRunner<'a> {
    config: SimulationConfig,
    constellation: QamConstellation,
    resampler: &'a dyn Resampler,
    correlator: &'a dyn Correlator,
}

impl<'a> TrialRunner<'a> {
    pub fn new(
        config: SimulationConfig,
        resampler: &'a dyn Resampler,
        correlator: &'a dyn Correlator,
    ) -> DesyncResult<Self> {
        config.validate()?;
        let constellation = QamConstellation::new(config.modulation_order as usize)?;
        Ok(Self {
            config,
            constellation,
            resampler,
            correlator,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn options(&self) -> ResampleOptions {
        ResampleOptions {
            filter_beta: self.config.pulse_beta,
            renormalize: self.config.renormalize,
        }
    }

    /// Generate a reference and its desynchronised capture
    pub fn prepare<R: Rng + ?Sized>(&self, rng: &mut R) -> DesyncResult<PreparedTrial> {
        let cfg = &self.config;
        let reference = self.constellation.random_waveform(
            rng,
            cfg.mode_count,
            cfg.symbol_count,
            cfg.symbol_rate,
        )?;
        let duplicated = duplicate(&reference, cfg.duplication_factor)?;

        let simulator = DesyncSimulator::new(self.resampler, self.options());
        let (mut captured, delay) = simulator.desynchronize(
            &duplicated,
            cfg.integer_shift_range(),
            cfg.fractional_upscale,
            cfg.capture_sample_rate,
            rng,
        )?;
        if let Some(snr_db) = cfg.snr_db {
            captured = add_noise(&captured, snr_db, rng)?;
        }

        Ok(PreparedTrial {
            reference,
            captured,
            delay,
        })
    }

    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> DesyncResult<TrialOutcome> {
        let prepared = self.prepare(rng)?;
        self.complete(&prepared)
    }

    /// Recover and score a prepared trial
    pub fn complete(&self, prepared: &PreparedTrial) -> DesyncResult<TrialOutcome> {
        let cfg = &self.config;
        let delay = prepared.delay;
        let engine = DelayRecovery::new(self.resampler, self.correlator, self.options());
        let recovered =
            engine.recover(&prepared.captured, &prepared.reference, cfg.fractional_upscale);
        let pair = match recovered {
            Ok(pair) => pair,
            Err(e) if e.is_sync_failure() => {
                log::warn!(
                    "trial failed to synchronise ({:.3} symbols delay): {e}",
                    delay.delay_in_symbols()
                );
                return Ok(TrialOutcome::SyncFailed {
                    delay,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let report = evaluate(&pair, &self.constellation)?;
        let symbols = compare_symbols(
            &self.constellation.demodulate(&pair.tx),
            &self.constellation.demodulate(&pair.rx),
        )?;
        let edge_fraction =
            edge_error_fraction(&report.error_positions, pair.tx.len(), cfg.dumped_edges);
        let interior_symbol_error_rate = self.interior_symbol_error_rate(&pair)?;
        log::info!(
            "trial recovered: BER {:.3e}, SER {:.3e}, {} quadrant errors",
            report.bit_error_rate,
            report.symbol_error_rate,
            report.quadrant_error_count
        );

        Ok(TrialOutcome::Recovered {
            delay,
            report,
            edge_error_fraction: edge_fraction,
            error_histograms: error_distributions(&symbols, cfg.histogram_bins),
            interior_symbol_error_rate,
        })
    }

    /// Score the pair again with the edge symbols dumped, so errors from
    /// boundary transients can be told apart from errors in the bulk
    fn interior_symbol_error_rate(&self, pair: &AlignedPair) -> DesyncResult<Option<f64>> {
        let edges = self.config.dumped_edges;
        if 2 * edges >= pair.tx.len() {
            return Ok(None);
        }
        let interior = AlignedPair::new(pair.tx.dump_edges(edges)?, pair.rx.dump_edges(edges)?)?;
        let report = evaluate(&interior, &self.constellation)?;
        Ok(Some(report.symbol_error_rate))
    }

    /// Run `trials` trials back to back from one RNG stream
    pub fn run_sweep<R: Rng + ?Sized>(
        &self,
        trials: usize,
        rng: &mut R,
    ) -> DesyncResult<(Vec<TrialOutcome>, SweepSummary)> {
        let mut outcomes = Vec::with_capacity(trials);
        for i in 0..trials {
            log::debug!("trial {}/{trials}", i + 1);
            outcomes.push(self.run(rng)?);
        }
        let summary = SweepSummary::from_outcomes(&outcomes);
        Ok((outcomes, summary))
    }
}

//! Simulation configuration
//!
//! A `SimulationConfig` is a saved profile holding every parameter of a
//! desync/recovery experiment (rates, modulation, delay ranges, recovery
//! hints). Profiles are stored as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{DesyncError, DesyncResult};
use super::types::MAX_MODES;

/// Parameters of a desync/recovery experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Symbol (baud) rate in symbols/s
    pub symbol_rate: f64,
    /// Capture (oscilloscope) sample rate in samples/s
    pub capture_sample_rate: f64,
    /// QAM order M
    pub modulation_order: u32,
    /// Symbols per channel in the reference
    pub symbol_count: usize,
    /// Number of modes / polarisations (1 or 2)
    pub mode_count: usize,
    /// Signal-to-noise ratio in dB, `None` = noiseless
    pub snr_db: Option<f64>,
    /// Roll-off of the resampling pulse-shape filter
    pub pulse_beta: f64,
    /// Fractional-delay upsample multiplier, 0 = no fractional delay
    pub fractional_upscale: u32,
    /// How many times the reference is tiled before delay injection
    pub duplication_factor: f64,
    /// Largest |integer shift| drawn, `None` = the reference length
    pub max_integer_shift: Option<usize>,
    /// Samples dumped at each edge by the receiver, also the window used
    /// to classify errors as edge errors
    pub dumped_edges: usize,
    /// Minimum normalised correlation accepted by the correlator
    pub correlation_threshold: f64,
    /// Rescale resampled waveforms to unit mean power
    pub renormalize: bool,
    /// Bins for the error-position histogram
    pub histogram_bins: usize,
    /// RNG seed, `None` = seeded from entropy
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            symbol_rate: 40e9,
            capture_sample_rate: 80e9,
            modulation_order: 4,
            symbol_count: 1 << 10,
            mode_count: 2,
            snr_db: None,
            pulse_beta: 0.1,
            fractional_upscale: 4,
            duplication_factor: 2.0,
            max_integer_shift: None,
            dumped_edges: 15,
            correlation_threshold: 0.5,
            renormalize: true,
            histogram_bins: 100,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Effective integer-delay range
    pub fn integer_shift_range(&self) -> usize {
        self.max_integer_shift.unwrap_or(self.symbol_count)
    }

    /// Check the parameters are mutually consistent
    pub fn validate(&self) -> DesyncResult<()> {
        let invalid = |msg: String| -> DesyncResult<()> { Err(DesyncError::InvalidParameter(msg)) };

        if !(self.symbol_rate.is_finite() && self.symbol_rate > 0.0) {
            return invalid(format!("symbol_rate must be positive, got {}", self.symbol_rate));
        }
        if !(self.capture_sample_rate.is_finite() && self.capture_sample_rate >= self.symbol_rate) {
            return invalid(format!(
                "capture_sample_rate {} is below the symbol rate {}",
                self.capture_sample_rate, self.symbol_rate
            ));
        }
        let side = (self.modulation_order as f64).sqrt() as u32;
        if self.modulation_order < 4
            || side * side != self.modulation_order
            || !side.is_power_of_two()
        {
            return invalid(format!(
                "modulation_order must be a square power of two >= 4, got {}",
                self.modulation_order
            ));
        }
        if self.symbol_count == 0 {
            return invalid("symbol_count must be non-zero".into());
        }
        if self.mode_count == 0 || self.mode_count > MAX_MODES {
            return invalid(format!("mode_count must be 1..={MAX_MODES}, got {}", self.mode_count));
        }
        if !(0.0..=1.0).contains(&self.pulse_beta) {
            return invalid(format!("pulse_beta must lie in [0, 1], got {}", self.pulse_beta));
        }
        if self.fractional_upscale == 1 {
            return invalid("fractional_upscale must be 0 (off) or >= 2".into());
        }
        if !(self.duplication_factor.is_finite() && self.duplication_factor >= 1.0) {
            return invalid(format!(
                "duplication_factor must be >= 1, got {}",
                self.duplication_factor
            ));
        }
        if !(0.0..=1.0).contains(&self.correlation_threshold) {
            return invalid(format!(
                "correlation_threshold must lie in [0, 1], got {}",
                self.correlation_threshold
            ));
        }
        if self.histogram_bins == 0 {
            return invalid("histogram_bins must be non-zero".into());
        }
        if let Some(snr) = self.snr_db {
            if !snr.is_finite() {
                return invalid(format!("snr_db must be finite, got {snr}"));
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> DesyncResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DesyncError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> DesyncResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DesyncError::Config(format!("Serialization error: {e}")))
    }

    /// Load and validate a profile from a JSON file
    pub fn load(path: &Path) -> DesyncResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> DesyncResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

//! Core domain types
//!
//! Pure value types with no I/O dependencies. Every transform on a
//! `Waveform` returns a new instance; nothing mutates in place.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::error::{DesyncError, DesyncResult};

/// Complex baseband sample
pub type Sample = Complex64;

/// Maximum number of modes (polarisations) a waveform can carry
pub const MAX_MODES: usize = 2;

/// A multi-mode complex waveform tagged with its symbol and sample rate.
///
/// All channels have the same, non-zero length.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    channels: Vec<Vec<Sample>>,
    symbol_rate: f64,
    sample_rate: f64,
}

impl Waveform {
    /// Build a waveform, checking channel count, equal lengths and rates
    pub fn new(
        channels: Vec<Vec<Sample>>,
        symbol_rate: f64,
        sample_rate: f64,
    ) -> DesyncResult<Self> {
        if channels.is_empty() || channels.len() > MAX_MODES {
            return Err(DesyncError::InvalidParameter(format!(
                "waveform needs 1..={MAX_MODES} channels, got {}",
                channels.len()
            )));
        }
        let len = channels[0].len();
        if len == 0 {
            return Err(DesyncError::InvalidParameter(
                "waveform channels must not be empty".into(),
            ));
        }
        if let Some((idx, ch)) = channels.iter().enumerate().find(|(_, c)| c.len() != len) {
            return Err(DesyncError::ShapeMismatch(format!(
                "channel {idx} has {} samples, channel 0 has {len}",
                ch.len()
            )));
        }
        if !(symbol_rate.is_finite() && symbol_rate > 0.0) {
            return Err(DesyncError::InvalidParameter(format!(
                "symbol rate must be positive, got {symbol_rate}"
            )));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DesyncError::InvalidParameter(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }
        Ok(Self {
            channels,
            symbol_rate,
            sample_rate,
        })
    }

    /// Waveform sampled at one sample per symbol
    pub fn at_symbol_rate(channels: Vec<Vec<Sample>>, symbol_rate: f64) -> DesyncResult<Self> {
        Self::new(channels, symbol_rate, symbol_rate)
    }

    /// Rebuild a waveform from raw channel data using `self` as the rate template
    pub fn recreate_from(&self, channels: Vec<Vec<Sample>>) -> DesyncResult<Self> {
        Self::new(channels, self.symbol_rate, self.sample_rate)
    }

    /// Rebuild with the same symbol rate but a new sample rate
    pub fn recreate_at_rate(
        &self,
        channels: Vec<Vec<Sample>>,
        sample_rate: f64,
    ) -> DesyncResult<Self> {
        Self::new(channels, self.symbol_rate, sample_rate)
    }

    pub fn channels(&self) -> &[Vec<Sample>] {
        &self.channels
    }

    /// Number of modes / polarisations
    pub fn mode_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.channels[0].is_empty()
    }

    pub fn symbol_rate(&self) -> f64 {
        self.symbol_rate
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn samples_per_symbol(&self) -> f64 {
        self.sample_rate / self.symbol_rate
    }

    /// Total number of samples across all channels
    pub fn total_samples(&self) -> usize {
        self.len() * self.mode_count()
    }

    /// Mean |x|^2 over all channels
    pub fn mean_power(&self) -> f64 {
        let sum: f64 = self
            .channels
            .iter()
            .flat_map(|c| c.iter())
            .map(|s| s.norm_sqr())
            .sum();
        sum / self.total_samples() as f64
    }

    /// Circular rotation of every channel, `np.roll` semantics:
    /// `out[i] = in[(i - shift) mod len]`, positive shift moves data forward.
    pub fn rotate(&self, shift: i64) -> Self {
        let len = self.len();
        let k = shift.rem_euclid(len as i64) as usize;
        let channels = self
            .channels
            .iter()
            .map(|c| {
                let mut out = c.clone();
                out.rotate_right(k);
                out
            })
            .collect();
        Self {
            channels,
            symbol_rate: self.symbol_rate,
            sample_rate: self.sample_rate,
        }
    }

    /// Zero-pad `edge` samples onto both ends of every channel
    pub fn pad_edges(&self, edge: usize) -> Self {
        let zero = Sample::new(0.0, 0.0);
        let channels = self
            .channels
            .iter()
            .map(|c| {
                let mut out = Vec::with_capacity(c.len() + 2 * edge);
                out.resize(edge, zero);
                out.extend_from_slice(c);
                out.resize(c.len() + 2 * edge, zero);
                out
            })
            .collect();
        Self {
            channels,
            symbol_rate: self.symbol_rate,
            sample_rate: self.sample_rate,
        }
    }

    /// Drop `n` samples from both ends of every channel
    pub fn dump_edges(&self, n: usize) -> DesyncResult<Self> {
        if 2 * n >= self.len() {
            return Err(DesyncError::InvalidParameter(format!(
                "cannot dump {n} samples from each edge of a {}-sample waveform",
                self.len()
            )));
        }
        let channels = self
            .channels
            .iter()
            .map(|c| c[n..c.len() - n].to_vec())
            .collect();
        self.recreate_from(channels)
    }

    /// Apply `f` to every channel, keeping rates
    pub fn map_channels<F>(&self, f: F) -> DesyncResult<Self>
    where
        F: FnMut(&Vec<Sample>) -> Vec<Sample>,
    {
        self.recreate_from(self.channels.iter().map(f).collect())
    }
}

/// Description of an injected desynchronization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelaySpec {
    /// Whole-symbol circular shift
    pub integer_shift: i64,
    /// Upsample factor used for the fractional component, 0 = none
    pub fractional_upscale: u32,
    /// Injected shift in upsampled samples (0 when `fractional_upscale == 0`)
    pub fractional_shift: i64,
}

impl DelaySpec {
    pub fn integer_only(shift: i64) -> Self {
        Self {
            integer_shift: shift,
            fractional_upscale: 0,
            fractional_shift: 0,
        }
    }

    pub fn has_fractional(&self) -> bool {
        self.fractional_upscale > 0
    }

    /// Total injected delay expressed in symbols
    pub fn delay_in_symbols(&self) -> f64 {
        if self.fractional_upscale == 0 {
            self.integer_shift as f64
        } else {
            let fraction = self.fractional_shift as f64 / self.fractional_upscale as f64;
            self.integer_shift as f64 + fraction
        }
    }
}

/// Two equal-length, offset-compensated waveforms.
///
/// `tx` is the recovered capture, `rx` the reference it was aligned to.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    pub tx: Waveform,
    pub rx: Waveform,
}

impl AlignedPair {
    pub fn new(tx: Waveform, rx: Waveform) -> DesyncResult<Self> {
        if tx.mode_count() != rx.mode_count() || tx.len() != rx.len() {
            return Err(DesyncError::ShapeMismatch(format!(
                "aligned pair members differ: {}x{} vs {}x{}",
                tx.mode_count(),
                tx.len(),
                rx.mode_count(),
                rx.len()
            )));
        }
        Ok(Self { tx, rx })
    }
}

/// Accuracy figures for one recovered waveform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Fraction of matching bits, 1.0 = perfect
    pub success_rate: f64,
    pub bit_error_rate: f64,
    pub symbol_error_rate: f64,
    pub quadrant_error_count: usize,
    /// Symbol positions (within a channel) of every symbol error, ascending
    pub error_positions: Vec<usize>,
}

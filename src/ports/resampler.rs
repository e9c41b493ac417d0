//! Resampler port trait

use crate::domain::{DesyncResult, Waveform};

/// Filter settings passed through to every resample call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampleOptions {
    /// Roll-off of the pulse-shaping low-pass, 0 = brick wall
    pub filter_beta: f64,
    /// Rescale each output channel to unit mean power
    pub renormalize: bool,
}

impl Default for ResampleOptions {
    fn default() -> Self {
        Self {
            filter_beta: 0.1,
            renormalize: false,
        }
    }
}

/// Rate conversion of whole waveforms.
///
/// Implementations must keep the channel count and the ordering of the
/// symbols, and return a new waveform tagged with `target_rate`.
pub trait Resampler {
    fn resample(
        &self,
        waveform: &Waveform,
        target_rate: f64,
        filter_beta: f64,
        renormalize: bool,
    ) -> DesyncResult<Waveform>;

    /// Convenience wrapper taking bundled options
    fn resample_with(
        &self,
        waveform: &Waveform,
        target_rate: f64,
        options: ResampleOptions,
    ) -> DesyncResult<Waveform> {
        self.resample(waveform, target_rate, options.filter_beta, options.renormalize)
    }
}

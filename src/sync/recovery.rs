//! Delay recovery engine
//!
//! Removes an unknown integer plus fractional delay from a capture in at
//! most two correlation passes:
//!
//! 1. `fractional_upscale == 0`: one correlator pass at the given rate.
//! 2. `fractional_upscale == U >= 2`: both inputs go to `U * symbol_rate`,
//!    where the fractional delay is a whole number of samples, and are
//!    aligned there. The aligned pair then drops to an intermediate rate of
//!    `INTERMEDIATE_OVERSAMPLING * symbol_rate` for a second, integer-only
//!    pass, and the result is brought down to the symbol rate.
//!
//! The recursion never goes deeper than that second pass.

use crate::domain::{AlignedPair, DesyncError, DesyncResult, Waveform};
use crate::ports::{Correlator, ResampleOptions, Resampler};

/// Oversampling of the second, integer-resolution correlation pass
pub const INTERMEDIATE_OVERSAMPLING: f64 = 2.0;

/// Relative tolerance when comparing the symbol rates of the inputs
const RATE_TOLERANCE: f64 = 1e-9;

pub struct DelayRecovery<'a> {
    resampler: &'a dyn Resampler,
    correlator: &'a dyn Correlator,
    options: ResampleOptions,
}

impl<'a> DelayRecovery<'a> {
    pub fn new(
        resampler: &'a dyn Resampler,
        correlator: &'a dyn Correlator,
        options: ResampleOptions,
    ) -> Self {
        Self {
            resampler,
            correlator,
            options,
        }
    }

    /// Align `captured` to `reference`.
    ///
    /// `fractional_upscale` is the resolution hint of the fractional delay
    /// (0 = integer delay only). With a fractional hint the returned pair is
    /// at the symbol rate; without one it is at the inputs' sample rate.
    pub fn recover(
        &self,
        captured: &Waveform,
        reference: &Waveform,
        fractional_upscale: u32,
    ) -> DesyncResult<AlignedPair> {
        let symbol_rate = reference.symbol_rate();
        if (captured.symbol_rate() - symbol_rate).abs() > RATE_TOLERANCE * symbol_rate {
            return Err(DesyncError::ShapeMismatch(format!(
                "capture carries {} Bd, reference {} Bd",
                captured.symbol_rate(),
                symbol_rate
            )));
        }

        match fractional_upscale {
            0 => {
                log::debug!("integer pass at {} Hz", captured.sample_rate());
                self.correlator.align(captured, reference)
            }
            1 => Err(DesyncError::InvalidParameter(
                "fractional upscale factor must be 0 or >= 2, got 1".into(),
            )),
            upscale => {
                let fine_rate = upscale as f64 * symbol_rate;
                log::debug!("fractional pass at {fine_rate} Hz (x{upscale})");

                let captured_up = self.resample(captured, fine_rate)?;
                let reference_up = self.resample(reference, fine_rate)?;
                let fine = self.correlator.align(&captured_up, &reference_up)?;

                let mid_rate = INTERMEDIATE_OVERSAMPLING * symbol_rate;
                let tx_mid = self.resample(&fine.tx, mid_rate)?;
                let rx_mid = self.resample(&fine.rx, mid_rate)?;
                let coarse = self.recover(&tx_mid, &rx_mid, 0)?;

                AlignedPair::new(
                    self.resample(&coarse.tx, symbol_rate)?,
                    self.resample(&coarse.rx, symbol_rate)?,
                )
            }
        }
    }

    fn resample(&self, waveform: &Waveform, rate: f64) -> DesyncResult<Waveform> {
        self.resampler.resample_with(waveform, rate, self.options)
    }
}

//! Mock resampler for tests that need rate changes without spectral maths.
//!
//! Up-sampling repeats every sample (zero-order hold), down-sampling keeps
//! every k-th sample. Only integer rate ratios are supported. Every call is
//! counted and logged so tests can check how often the pipeline resamples.

use std::cell::Cell;

use crate::domain::{DesyncError, DesyncResult, Sample, Waveform};
use crate::ports::Resampler;

/// Tolerance when deciding whether a rate ratio is an integer
const RATIO_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Default)]
pub struct HoldResampler {
    calls: Cell<usize>,
}

impl HoldResampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `resample` calls so far
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Resampler for HoldResampler {
    fn resample(
        &self,
        waveform: &Waveform,
        target_rate: f64,
        _filter_beta: f64,
        renormalize: bool,
    ) -> DesyncResult<Waveform> {
        self.calls.set(self.calls.get() + 1);
        log::info!(
            "[MOCK RESAMPLER] {} Hz -> {target_rate} Hz ({} samples)",
            waveform.sample_rate(),
            waveform.len()
        );

        if !(target_rate.is_finite() && target_rate >= waveform.symbol_rate()) {
            return Err(DesyncError::InvalidParameter(format!(
                "target rate {target_rate} Hz is below the symbol rate {} Hz",
                waveform.symbol_rate()
            )));
        }

        let ratio = target_rate / waveform.sample_rate();
        let channels: Vec<Vec<Sample>> = if ratio >= 1.0 {
            let factor = integer_ratio(ratio)?;
            waveform
                .channels()
                .iter()
                .map(|c| c.iter().flat_map(|&s| std::iter::repeat(s).take(factor)).collect())
                .collect()
        } else {
            let step = integer_ratio(1.0 / ratio)?;
            waveform
                .channels()
                .iter()
                .map(|c| c.iter().step_by(step).copied().collect())
                .collect()
        };

        let channels = if renormalize {
            channels.into_iter().map(unit_power).collect()
        } else {
            channels
        };
        waveform.recreate_at_rate(channels, target_rate)
    }
}

fn integer_ratio(ratio: f64) -> DesyncResult<usize> {
    let rounded = ratio.round();
    if (ratio - rounded).abs() > RATIO_TOLERANCE || rounded < 1.0 {
        return Err(DesyncError::InvalidParameter(format!(
            "hold resampler needs an integer rate ratio, got {ratio}"
        )));
    }
    Ok(rounded as usize)
}

fn unit_power(channel: Vec<Sample>) -> Vec<Sample> {
    let power = channel.iter().map(|s| s.norm_sqr()).sum::<f64>() / channel.len() as f64;
    if power > 0.0 {
        let scale = power.sqrt().recip();
        channel.into_iter().map(|s| s * scale).collect()
    } else {
        channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Waveform {
        let ch: Vec<Sample> = (1..=4).map(|i| Sample::new(i as f64, 0.0)).collect();
        Waveform::at_symbol_rate(vec![ch], 1.0).unwrap()
    }

    #[test]
    fn hold_then_decimate_round_trips() {
        let resampler = HoldResampler::new();
        let up = resampler.resample(&ramp(), 3.0, 0.1, false).unwrap();
        assert_eq!(up.len(), 12);
        assert_eq!(up.channels()[0][5], Sample::new(2.0, 0.0));
        let down = resampler.resample(&up, 1.0, 0.1, false).unwrap();
        assert_eq!(down, ramp());
        assert_eq!(resampler.calls(), 2);
    }

    #[test]
    fn rejects_fractional_ratio() {
        let resampler = HoldResampler::new();
        assert!(resampler.resample(&ramp(), 2.5, 0.0, false).is_err());
        assert!(resampler.resample(&ramp(), 0.5, 0.0, false).is_err());
    }
}

//! FFT cross-correlation synchronizer
//!
//! Aligns each channel independently: the circular cross-correlation of the
//! capture against the zero-padded reference is computed in one FFT pass,
//! the strongest lag inside the search window is taken as the offset, and
//! the capture is cut there. The normalised correlation of the cut slice
//! against the reference is the confidence figure.

use crate::domain::{AlignedPair, DesyncResult, Waveform};
use crate::dsp::correlation::{circular_cross_correlation, peak_lag, search_lags};
use crate::ports::{check_alignment_inputs, extract_aligned, Correlator};

/// Default minimum normalised correlation for an accepted alignment
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Real correlator backed by `rustfft`
#[derive(Debug, Clone, Copy)]
pub struct FftCorrelator {
    threshold: f64,
    max_lag: Option<usize>,
}

impl FftCorrelator {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            max_lag: None,
        }
    }

    /// Restrict the search to lags within `max_lag` samples of zero
    pub fn with_max_lag(mut self, max_lag: usize) -> Self {
        self.max_lag = Some(max_lag);
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for FftCorrelator {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl Correlator for FftCorrelator {
    fn align(&self, captured: &Waveform, reference: &Waveform) -> DesyncResult<AlignedPair> {
        check_alignment_inputs(captured, reference)?;

        let lags = search_lags(captured.len(), self.max_lag);
        let peaks: Vec<usize> = captured
            .channels()
            .iter()
            .zip(reference.channels())
            .map(|(cap, reference)| {
                let correlation = circular_cross_correlation(cap, reference);
                peak_lag(&correlation, &lags).map_or(0, |(lag, _)| lag)
            })
            .collect();

        extract_aligned(captured, reference, &peaks, self.threshold)
    }
}

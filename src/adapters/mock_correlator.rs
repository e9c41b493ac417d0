//! Mock correlator: brute-force time-domain search.
//!
//! Same contract as the FFT correlator, evaluated lag by lag. It keeps a
//! count of `align` calls so tests can check the recursion depth of the
//! delay recovery engine.

use std::cell::Cell;

use crate::domain::{AlignedPair, DesyncResult, Waveform};
use crate::dsp::correlation::correlation_at_lag;
use crate::ports::{check_alignment_inputs, extract_aligned, Correlator};

#[derive(Debug)]
pub struct BruteForceCorrelator {
    threshold: f64,
    calls: Cell<usize>,
}

impl BruteForceCorrelator {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            calls: Cell::new(0),
        }
    }

    /// Number of `align` calls so far
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Default for BruteForceCorrelator {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Correlator for BruteForceCorrelator {
    fn align(&self, captured: &Waveform, reference: &Waveform) -> DesyncResult<AlignedPair> {
        self.calls.set(self.calls.get() + 1);
        log::info!(
            "[MOCK CORRELATOR] align #{}: {} samples against {}",
            self.calls.get(),
            captured.len(),
            reference.len()
        );
        check_alignment_inputs(captured, reference)?;

        let peaks: Vec<usize> = captured
            .channels()
            .iter()
            .zip(reference.channels())
            .map(|(cap, reference)| {
                let mut best = (0, f64::NEG_INFINITY);
                for lag in 0..cap.len() {
                    let mag = correlation_at_lag(cap, reference, lag).norm();
                    if mag > best.1 {
                        best = (lag, mag);
                    }
                }
                best.0
            })
            .collect();

        extract_aligned(captured, reference, &peaks, self.threshold)
    }
}

//! Cached FFT plans for complex baseband buffers

use std::sync::Arc;

use rustfft::{Fft, FftPlanner};

use crate::domain::Sample;

/// Forward/inverse FFT pair planned once for a fixed size
pub struct FftProcessor {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    fft_size: usize,
}

impl FftProcessor {
    /// Plan forward and inverse transforms of length `fft_size`
    pub fn new(fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(fft_size);
        let inverse = planner.plan_fft_inverse(fft_size);

        Self {
            forward,
            inverse,
            fft_size,
        }
    }

    /// Unnormalised forward transform. Input shorter than `fft_size` is
    /// zero-padded, longer input is truncated.
    pub fn forward(&self, samples: &[Sample]) -> Vec<Sample> {
        let mut buffer = self.load(samples);
        self.forward.process(&mut buffer);
        buffer
    }

    /// Unnormalised inverse transform (result is scaled by `fft_size`)
    pub fn inverse(&self, spectrum: &[Sample]) -> Vec<Sample> {
        let mut buffer = self.load(spectrum);
        self.inverse.process(&mut buffer);
        buffer
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    fn load(&self, samples: &[Sample]) -> Vec<Sample> {
        let mut buffer: Vec<Sample> = samples.iter().take(self.fft_size).copied().collect();
        buffer.resize(self.fft_size, Sample::new(0.0, 0.0));
        buffer
    }
}

/// Signed frequency index of bin `k` in an `n`-point DFT, in `(-n/2, n/2]`
pub fn signed_bin(k: usize, n: usize) -> i64 {
    if 2 * k > n {
        k as i64 - n as i64
    } else {
        k as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fft_pure_tone() {
        let n = 64;
        let processor = FftProcessor::new(n);
        let tone = 5.0;
        let samples: Vec<Sample> = (0..n)
            .map(|i| {
                Sample::from_polar(1.0, 2.0 * std::f64::consts::PI * tone * i as f64 / n as f64)
            })
            .collect();

        let spectrum = processor.forward(&samples);
        let peak_bin = spectrum
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.norm().partial_cmp(&b.norm()).unwrap())
            .map(|(i, _)| i)
            .unwrap();

        assert_eq!(peak_bin, 5);
        assert!((spectrum[5].norm() - n as f64).abs() < 1e-9);
    }

    #[test]
    fn forward_then_inverse_scales_by_size() {
        let processor = FftProcessor::new(8);
        let samples: Vec<Sample> = (0..8).map(|i| Sample::new(i as f64, 1.0)).collect();
        let back = processor.inverse(&processor.forward(&samples));
        for (a, b) in samples.iter().zip(back.iter()) {
            assert!((a * 8.0 - b).norm() < 1e-9);
        }
    }

    #[test]
    fn short_input_is_zero_padded() {
        let processor = FftProcessor::new(4);
        let spectrum = processor.forward(&[Sample::new(1.0, 0.0)]);
        assert_eq!(spectrum.len(), 4);
        assert!(spectrum.iter().all(|c| (c - Sample::new(1.0, 0.0)).norm() < 1e-12));
    }

    #[test]
    fn signed_bins_wrap_at_half() {
        assert_eq!(signed_bin(0, 8), 0);
        assert_eq!(signed_bin(3, 8), 3);
        assert_eq!(signed_bin(4, 8), 4);
        assert_eq!(signed_bin(5, 8), -3);
        assert_eq!(signed_bin(4, 7), -3);
        assert_eq!(signed_bin(3, 7), 3);
    }
}

//! FFT-domain resampler
//!
//! Treats every channel as one period of a band-limited periodic signal:
//! the spectrum is zero-padded (upsampling) or truncated (downsampling),
//! shaped by a raised-cosine low-pass and transformed back. Because the
//! transform is circular, a rotation before resampling is an exact time
//! shift after it, which is what the fractional-delay path relies on.

use crate::domain::{DesyncError, DesyncResult, Sample, Waveform};
use crate::dsp::fft::{signed_bin, FftProcessor};
use crate::dsp::raised_cosine::RaisedCosineResponse;
use crate::ports::Resampler;

/// Real resampler backed by `rustfft`
#[derive(Debug, Default, Clone, Copy)]
pub struct FftResampler;

impl FftResampler {
    pub fn new() -> Self {
        Self
    }
}

impl Resampler for FftResampler {
    fn resample(
        &self,
        waveform: &Waveform,
        target_rate: f64,
        filter_beta: f64,
        renormalize: bool,
    ) -> DesyncResult<Waveform> {
        validate_target(waveform, target_rate, filter_beta)?;

        let n = waveform.len();
        let m = output_len(n, waveform.sample_rate(), target_rate)?;
        log::debug!(
            "resample {} -> {} Hz ({n} -> {m} samples, beta {filter_beta})",
            waveform.sample_rate(),
            target_rate
        );

        // Filter edge sits at half the lower rate, measured in input bins
        let response = RaisedCosineResponse::new(n.min(m) as f64 / 2.0, filter_beta);
        let input_fft = FftProcessor::new(n);
        let output_fft = FftProcessor::new(m);

        let channels = waveform
            .channels()
            .iter()
            .map(|ch| {
                let spectrum = input_fft.forward(ch);
                let mapped = map_spectrum(&spectrum, m, &response);
                let scale = 1.0 / n as f64;
                let mut out: Vec<Sample> = output_fft
                    .inverse(&mapped)
                    .into_iter()
                    .map(|s| s * scale)
                    .collect();
                if renormalize {
                    normalize_power(&mut out);
                }
                out
            })
            .collect();

        waveform.recreate_at_rate(channels, target_rate)
    }
}

fn validate_target(waveform: &Waveform, target_rate: f64, filter_beta: f64) -> DesyncResult<()> {
    if !(target_rate.is_finite() && target_rate > 0.0) {
        return Err(DesyncError::InvalidParameter(format!(
            "target rate must be positive, got {target_rate}"
        )));
    }
    // Below the symbol rate the symbol content itself would alias
    if target_rate < waveform.symbol_rate() * (1.0 - 1e-9) {
        return Err(DesyncError::InvalidParameter(format!(
            "target rate {target_rate} Hz is below the symbol rate {} Hz",
            waveform.symbol_rate()
        )));
    }
    if !(0.0..=1.0).contains(&filter_beta) {
        return Err(DesyncError::InvalidParameter(format!(
            "filter beta must lie in [0, 1], got {filter_beta}"
        )));
    }
    Ok(())
}

fn output_len(n: usize, rate_in: f64, rate_out: f64) -> DesyncResult<usize> {
    let m = (n as f64 * rate_out / rate_in).round() as usize;
    if m == 0 {
        return Err(DesyncError::InvalidParameter(format!(
            "resampling {n} samples from {rate_in} Hz to {rate_out} Hz leaves nothing"
        )));
    }
    Ok(m)
}

/// Move every input bin to the output bin of the same signed frequency.
///
/// An even-length input's Nyquist bin is split evenly between +Nyquist and
/// -Nyquist so it survives upsampling symmetrically; the two halves fold
/// back together whenever they land on an output Nyquist bin.
fn map_spectrum(spectrum: &[Sample], m: usize, response: &RaisedCosineResponse) -> Vec<Sample> {
    let n = spectrum.len();
    let mut out = vec![Sample::new(0.0, 0.0); m];

    for (k, &value) in spectrum.iter().enumerate() {
        let freq = signed_bin(k, n);
        if n % 2 == 0 && 2 * freq == n as i64 {
            deposit(&mut out, freq, value * 0.5, response);
            deposit(&mut out, -freq, value * 0.5, response);
        } else {
            deposit(&mut out, freq, value, response);
        }
    }
    out
}

fn deposit(out: &mut [Sample], freq: i64, value: Sample, response: &RaisedCosineResponse) {
    let gain = response.gain(freq as f64);
    if gain == 0.0 {
        return;
    }
    let m = out.len() as i64;
    let bin = if 2 * freq.abs() < m {
        freq.rem_euclid(m) as usize
    } else if 2 * freq.abs() == m {
        (m / 2) as usize
    } else {
        return;
    };
    out[bin] += value * gain;
}

fn normalize_power(samples: &mut [Sample]) {
    let power = samples.iter().map(|s| s.norm_sqr()).sum::<f64>() / samples.len() as f64;
    if power > 0.0 {
        let scale = 1.0 / power.sqrt();
        for s in samples.iter_mut() {
            *s *= scale;
        }
    }
}

//! Desync simulator
//!
//! Emulates the capture of an unsynchronised receiver: a circular
//! whole-symbol delay, a sub-symbol delay expressed as a rotation at an
//! upsampled rate, and optional additive white Gaussian noise.

use std::f64::consts::PI;

use rand::Rng;

use crate::domain::{DelaySpec, DesyncError, DesyncResult, Sample, Waveform};
use crate::ports::{ResampleOptions, Resampler};

/// Circular delay by `shift` samples, positive moves data forward
pub fn delay(waveform: &Waveform, shift: i64) -> Waveform {
    log::debug!("integer delay of {shift} samples");
    waveform.rotate(shift)
}

/// Uniform integer shift in `[-max, max]`
pub fn random_integer_shift<R: Rng + ?Sized>(rng: &mut R, max: usize) -> i64 {
    let max = max as i64;
    rng.gen_range(-max..=max)
}

/// Shift in upsampled samples, magnitude uniform in `[1, upscale - 1]`
/// with a uniformly chosen sign
pub fn random_fractional_shift<R: Rng + ?Sized>(rng: &mut R, upscale: u32) -> DesyncResult<i64> {
    check_upscale(upscale)?;
    let magnitude = rng.gen_range(1..upscale) as i64;
    Ok(if rng.gen_bool(0.5) { magnitude } else { -magnitude })
}

fn check_upscale(upscale: u32) -> DesyncResult<()> {
    if upscale < 2 {
        return Err(DesyncError::InvalidParameter(format!(
            "fractional upscale factor must be >= 2, got {upscale}"
        )));
    }
    Ok(())
}

/// Delay injection backed by a resampler
pub struct DesyncSimulator<'a> {
    resampler: &'a dyn Resampler,
    options: ResampleOptions,
}

impl<'a> DesyncSimulator<'a> {
    pub fn new(resampler: &'a dyn Resampler, options: ResampleOptions) -> Self {
        Self { resampler, options }
    }

    /// Fractional delay with a randomly drawn shift.
    ///
    /// Returns the delayed waveform at `target_rate` and the shift that was
    /// applied, in samples at `upscale * symbol_rate`.
    pub fn fractional_offset<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        target_rate: f64,
        upscale: u32,
        rng: &mut R,
    ) -> DesyncResult<(Waveform, i64)> {
        let shift = random_fractional_shift(rng, upscale)?;
        let out = self.fractional_offset_by(waveform, target_rate, upscale, shift)?;
        Ok((out, shift))
    }

    /// Fractional delay of exactly `shift / upscale` symbols.
    ///
    /// Upsamples to `upscale * symbol_rate`, rotates by `shift` samples and
    /// resamples to `target_rate`.
    pub fn fractional_offset_by(
        &self,
        waveform: &Waveform,
        target_rate: f64,
        upscale: u32,
        shift: i64,
    ) -> DesyncResult<Waveform> {
        check_upscale(upscale)?;
        if shift == 0 || shift.unsigned_abs() >= upscale as u64 {
            return Err(DesyncError::InvalidParameter(format!(
                "fractional shift must satisfy 1 <= |shift| <= {}, got {shift}",
                upscale - 1
            )));
        }
        if !(target_rate.is_finite() && target_rate >= waveform.symbol_rate()) {
            return Err(DesyncError::InvalidParameter(format!(
                "capture rate {target_rate} Hz is below the symbol rate {} Hz",
                waveform.symbol_rate()
            )));
        }

        let fine_rate = upscale as f64 * waveform.symbol_rate();
        log::debug!("fractional delay of {shift}/{upscale} symbol, capture at {target_rate} Hz");

        let upsampled = self.resampler.resample_with(waveform, fine_rate, self.options)?;
        let shifted = upsampled.rotate(shift);
        self.resampler.resample_with(&shifted, target_rate, self.options)
    }

    /// Integer delay drawn from `[-max_shift, max_shift]`, then a fractional
    /// delay when `upscale > 0`.
    ///
    /// Without a fractional component the waveform stays at its own rate
    /// and `target_rate` is ignored.
    pub fn desynchronize<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        max_shift: usize,
        upscale: u32,
        target_rate: f64,
        rng: &mut R,
    ) -> DesyncResult<(Waveform, DelaySpec)> {
        let integer_shift = random_integer_shift(rng, max_shift);
        let shifted = delay(waveform, integer_shift);

        if upscale == 0 {
            log::info!("injected delay: {integer_shift} symbols");
            return Ok((shifted, DelaySpec::integer_only(integer_shift)));
        }

        let (captured, fractional_shift) =
            self.fractional_offset(&shifted, target_rate, upscale, rng)?;
        let spec = DelaySpec {
            integer_shift,
            fractional_upscale: upscale,
            fractional_shift,
        };
        log::info!(
            "injected delay: {integer_shift} symbols + {fractional_shift}/{upscale} \
             ({:.3} symbols)",
            spec.delay_in_symbols()
        );
        Ok((captured, spec))
    }
}

/// Complex AWGN at `snr_db` relative to the measured mean power
pub fn add_noise<R: Rng + ?Sized>(
    waveform: &Waveform,
    snr_db: f64,
    rng: &mut R,
) -> DesyncResult<Waveform> {
    if !snr_db.is_finite() {
        return Err(DesyncError::InvalidParameter(format!("SNR must be finite, got {snr_db}")));
    }
    let noise_power = waveform.mean_power() / 10f64.powf(snr_db / 10.0);
    // Split evenly between the real and imaginary parts
    let sigma = (noise_power / 2.0).sqrt();
    log::debug!("adding noise at {snr_db} dB SNR (noise power {noise_power:.3e})");

    waveform.map_channels(|c| {
        c.iter()
            .map(|&s| {
                let (re, im) = gaussian_pair(&mut *rng);
                s + Sample::new(re * sigma, im * sigma)
            })
            .collect()
    })
}

/// Two independent standard normal draws via Box-Muller
fn gaussian_pair<R: Rng + ?Sized>(rng: &mut R) -> (f64, f64) {
    // Avoid log(0)
    let u1: f64 = rng.gen::<f64>().max(1e-300);
    let u2: f64 = rng.gen();
    let r = (-2.0 * u1.ln()).sqrt();
    let theta = 2.0 * PI * u2;
    (r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FftResampler, HoldResampler};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn wave(len: usize) -> Waveform {
        let ch: Vec<Sample> = (0..len)
            .map(|i| Sample::from_polar(1.0, 0.7 * i as f64 + 0.3))
            .collect();
        Waveform::at_symbol_rate(vec![ch], 2.0).unwrap()
    }

    #[test]
    fn delay_rotates_forward() {
        let w = wave(6);
        let d = delay(&w, 2);
        assert_eq!(d.channels()[0][2], w.channels()[0][0]);
        assert_eq!(delay(&w, -6), w);
    }

    #[test]
    fn random_shifts_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut seen_negative = false;
        for _ in 0..200 {
            let s = random_integer_shift(&mut rng, 5);
            assert!((-5..=5).contains(&s));
            let f = random_fractional_shift(&mut rng, 4).unwrap();
            assert!((1..=3).contains(&f.abs()));
            seen_negative |= f < 0;
        }
        assert!(seen_negative);
        assert!(random_fractional_shift(&mut rng, 1).is_err());
    }

    #[test]
    fn fractional_offset_is_not_a_whole_symbol_shift() {
        let resampler = FftResampler;
        let options = ResampleOptions {
            filter_beta: 0.0,
            renormalize: false,
        };
        let sim = DesyncSimulator::new(&resampler, options);
        let w = wave(8);
        let out = sim.fractional_offset_by(&w, 2.0, 4, 2).unwrap();
        assert_eq!(out.len(), 8);
        for s in 0..8 {
            let rotated = w.rotate(s);
            let gap: f64 = out.channels()[0]
                .iter()
                .zip(rotated.channels()[0].iter())
                .map(|(a, b)| (a - b).norm())
                .fold(0.0, f64::max);
            assert!(gap > 1e-3, "matched whole-symbol rotation {s}");
        }
    }

    #[test]
    fn fractional_offset_validates_arguments() {
        let resampler = HoldResampler::new();
        let sim = DesyncSimulator::new(&resampler, ResampleOptions::default());
        let w = wave(4);
        assert!(sim.fractional_offset_by(&w, 2.0, 1, 1).is_err());
        assert!(sim.fractional_offset_by(&w, 2.0, 4, 0).is_err());
        assert!(sim.fractional_offset_by(&w, 2.0, 4, -4).is_err());
        assert!(sim.fractional_offset_by(&w, 1.0, 4, 1).is_err());
        assert_eq!(resampler.calls(), 0);
    }

    #[test]
    fn desynchronize_records_delay() {
        let resampler = HoldResampler::new();
        let sim = DesyncSimulator::new(&resampler, ResampleOptions::default());
        let w = wave(8);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let (captured, spec) = sim.desynchronize(&w, 8, 0, 2.0, &mut rng).unwrap();
        assert!(!spec.has_fractional());
        assert_eq!(captured, w.rotate(spec.integer_shift));

        let (captured, spec) = sim.desynchronize(&w, 8, 4, 4.0, &mut rng).unwrap();
        assert_eq!(spec.fractional_upscale, 4);
        assert!((1..=3).contains(&spec.fractional_shift.abs()));
        assert_eq!(captured.sample_rate(), 4.0);
        assert_eq!(captured.len(), 16);
        assert_eq!(resampler.calls(), 2);
    }

    #[test]
    fn noise_power_follows_snr() {
        let w = Waveform::at_symbol_rate(vec![vec![Sample::new(1.0, 0.0); 20_000]], 1.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let noisy = add_noise(&w, 10.0, &mut rng).unwrap();
        let noise_power = noisy.channels()[0]
            .iter()
            .map(|s| (s - Sample::new(1.0, 0.0)).norm_sqr())
            .sum::<f64>()
            / 20_000.0;
        assert!((noise_power - 0.1).abs() < 0.01, "noise power {noise_power}");
        assert!(add_noise(&w, f64::NAN, &mut rng).is_err());
    }
}

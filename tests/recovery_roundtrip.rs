//! Integration tests: duplicate → desynchronize → recover
//!
//! These tests push waveforms through the full delay pipeline with both the
//! FFT-backed adapters and the test doubles and check that the recovered
//! capture matches the reference.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use desync_recovery::adapters::{BruteForceCorrelator, FftCorrelator, FftResampler, HoldResampler};
use desync_recovery::domain::{DesyncError, Sample, Waveform};
use desync_recovery::modem::QamConstellation;
use desync_recovery::ports::ResampleOptions;
use desync_recovery::sync::{
    compare_quadrants, compare_symbols, delay, duplicate, evaluate, DelayRecovery, DesyncSimulator,
};

const SYMBOL_RATE: f64 = 40e9;
const CAPTURE_RATE: f64 = 80e9;

/// Pure band-limited interpolation, no power rescaling
const EXACT: ResampleOptions = ResampleOptions {
    filter_beta: 0.0,
    renormalize: false,
};

/// 8 symbols per channel, 2 channels, every lag distinct
fn eight_symbol_reference() -> Waveform {
    let x = [(1, 1), (1, -1), (-1, 1), (-1, -1), (1, 1), (1, 1), (-1, -1), (1, -1)];
    let ch: Vec<Sample> = x.iter().map(|&(re, im)| Sample::new(re as f64, im as f64)).collect();
    let ch2: Vec<Sample> = ch.iter().rev().map(|s| s * Sample::new(0.0, 1.0)).collect();
    Waveform::at_symbol_rate(vec![ch, ch2], SYMBOL_RATE).unwrap()
}

fn random_reference(order: usize, symbols: usize, seed: u64) -> Waveform {
    let qam = QamConstellation::new(order).unwrap();
    qam.random_waveform(&mut ChaCha8Rng::seed_from_u64(seed), 2, symbols, SYMBOL_RATE)
        .unwrap()
}

fn max_error(a: &Waveform, b: &Waveform) -> f64 {
    a.channels()
        .iter()
        .flatten()
        .zip(b.channels().iter().flatten())
        .map(|(x, y)| (x - y).norm())
        .fold(0.0, f64::max)
}

#[test]
fn test_eight_symbol_scenario() {
    let reference = eight_symbol_reference();
    let duplicated = duplicate(&reference, 2.0).unwrap();
    assert_eq!(duplicated.len(), 16);

    let resampler = FftResampler::new();
    let correlator = FftCorrelator::default();
    let engine = DelayRecovery::new(&resampler, &correlator, EXACT);
    let pair = engine.recover(&delay(&duplicated, 3), &reference, 0).unwrap();

    assert_eq!(pair.tx, reference);
    let cmp = compare_symbols(pair.tx.channels(), reference.channels()).unwrap();
    assert_eq!(cmp.success_rate, 1.0);
    assert_eq!(cmp.error_rate(), 0.0);
}

#[test]
fn test_integer_round_trip_every_shift() {
    let reference = random_reference(16, 32, 1);
    let duplicated = duplicate(&reference, 2.0).unwrap();
    let resampler = FftResampler::new();
    let fft = FftCorrelator::default();
    let brute = BruteForceCorrelator::default();

    for shift in -31..=32 {
        let captured = delay(&duplicated, shift);
        for correlator in [&fft as &dyn desync_recovery::ports::Correlator, &brute] {
            let engine = DelayRecovery::new(&resampler, correlator, EXACT);
            let pair = engine.recover(&captured, &reference, 0).unwrap();
            assert_eq!(pair.tx, reference, "shift {shift}");
        }
    }
    assert_eq!(brute.calls(), 64);
}

#[test]
fn test_fractional_round_trip() {
    let reference = random_reference(4, 16, 2);
    let duplicated = duplicate(&reference, 2.0).unwrap();
    let resampler = FftResampler::new();
    let correlator = FftCorrelator::default();
    let simulator = DesyncSimulator::new(&resampler, EXACT);
    let engine = DelayRecovery::new(&resampler, &correlator, EXACT);

    for upscale in [4u32, 8] {
        for integer_shift in [0, 3, -5] {
            for magnitude in 1..upscale as i64 {
                for fractional in [magnitude, -magnitude] {
                    let shifted = delay(&duplicated, integer_shift);
                    let captured = simulator
                        .fractional_offset_by(&shifted, CAPTURE_RATE, upscale, fractional)
                        .unwrap();
                    assert_eq!(captured.sample_rate(), CAPTURE_RATE);

                    let pair = engine.recover(&captured, &reference, upscale).unwrap();
                    assert_eq!(pair.tx.sample_rate(), SYMBOL_RATE);
                    let err = max_error(&pair.tx, &reference);
                    assert!(
                        err < 1e-9,
                        "U={upscale} shift {integer_shift}+{fractional}/{upscale}: error {err}"
                    );
                }
            }
        }
    }
}

#[test]
fn test_fractional_recovery_with_pulse_shaping() {
    let qam = QamConstellation::new(4).unwrap();
    let reference = random_reference(4, 64, 3);
    let duplicated = duplicate(&reference, 2.0).unwrap();
    let options = ResampleOptions {
        filter_beta: 0.1,
        renormalize: true,
    };
    let resampler = FftResampler::new();
    let correlator = FftCorrelator::default();
    let simulator = DesyncSimulator::new(&resampler, options);
    let engine = DelayRecovery::new(&resampler, &correlator, options);
    let mut rng = ChaCha8Rng::seed_from_u64(4);

    for _ in 0..4 {
        let (captured, spec) = simulator
            .desynchronize(&duplicated, 64, 4, CAPTURE_RATE, &mut rng)
            .unwrap();
        let pair = engine.recover(&captured, &reference, 4).unwrap();
        let report = evaluate(&pair, &qam).unwrap();
        assert!(report.symbol_error_rate < 0.05, "delay {spec:?}: {report:?}");
        assert_eq!(compare_quadrants(&pair.tx, &pair.rx).unwrap(), report.quadrant_error_count);
    }
}

#[test]
fn test_test_doubles_follow_the_same_pipeline() {
    let reference = eight_symbol_reference();
    let duplicated = duplicate(&reference, 2.0).unwrap();
    let resampler = HoldResampler::new();
    let correlator = BruteForceCorrelator::default();
    let simulator = DesyncSimulator::new(&resampler, EXACT);
    let engine = DelayRecovery::new(&resampler, &correlator, EXACT);
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    let (captured, spec) = simulator
        .desynchronize(&duplicated, 8, 4, 2.0 * SYMBOL_RATE, &mut rng)
        .unwrap();
    assert!(spec.has_fractional());

    let pair = engine.recover(&captured, &reference, 4).unwrap();
    assert_eq!(pair.tx, reference);
    assert_eq!(correlator.calls(), 2);
}

#[test]
fn test_full_length_shift_is_not_mistaken_for_zero() {
    let reference = eight_symbol_reference();
    let duplicated = duplicate(&reference, 2.0).unwrap();
    let resampler = FftResampler::new();
    let correlator = FftCorrelator::default();
    let engine = DelayRecovery::new(&resampler, &correlator, EXACT);

    for shift in [-8, 8, 16] {
        let pair = engine.recover(&delay(&duplicated, shift), &reference, 0).unwrap();
        assert_eq!(pair.tx, reference, "shift {shift}");
    }
}

#[test]
fn test_zero_padded_capture_window() {
    let reference = random_reference(16, 32, 8);
    let duplicated = duplicate(&reference, 2.0).unwrap();
    let resampler = FftResampler::new();
    let correlator = FftCorrelator::default();
    let engine = DelayRecovery::new(&resampler, &correlator, EXACT);

    for shift in [-20, 0, 7] {
        let captured = delay(&duplicated, shift).pad_edges(10);
        assert_eq!(captured.len(), 84);
        let pair = engine.recover(&captured, &reference, 0).unwrap();
        assert_eq!(pair.tx, reference, "shift {shift}");
    }
}

#[test]
fn test_short_capture_fails() {
    let reference = eight_symbol_reference();
    let short = reference.dump_edges(1).unwrap();
    let resampler = FftResampler::new();
    let correlator = FftCorrelator::default();
    let engine = DelayRecovery::new(&resampler, &correlator, EXACT);

    let err = engine.recover(&short, &reference, 0).unwrap_err();
    assert!(matches!(err, DesyncError::ShapeMismatch(_)), "got {err}");
}

#[test]
fn test_unrelated_capture_is_a_sync_failure() {
    let reference = random_reference(16, 64, 6);
    let unrelated = duplicate(&random_reference(16, 64, 7), 2.0).unwrap();
    let resampler = FftResampler::new();
    let correlator = FftCorrelator::new(0.9);
    let engine = DelayRecovery::new(&resampler, &correlator, EXACT);

    let err = engine.recover(&unrelated, &reference, 0).unwrap_err();
    assert!(err.is_sync_failure(), "got {err}");
}

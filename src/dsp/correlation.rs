//! Cross-correlation primitives shared by the correlator adapters

use crate::domain::Sample;

use super::fft::FftProcessor;

/// Circular cross-correlation of `captured` against `reference`.
///
/// `out[k] = sum_n captured[(n + k) mod L] * conj(reference[n])` for
/// `k in 0..L`, `L = captured.len()`. `reference` must not be longer than
/// `captured`; it is zero-padded to `L`. Output is scaled by `L`.
pub fn circular_cross_correlation(captured: &[Sample], reference: &[Sample]) -> Vec<Sample> {
    let fft = FftProcessor::new(captured.len());
    let a = fft.forward(captured);
    let b = fft.forward(reference);
    let cross: Vec<Sample> = a.iter().zip(b.iter()).map(|(x, y)| x * y.conj()).collect();
    fft.inverse(&cross)
}

/// Direct evaluation of one lag of the circular cross-correlation
pub fn correlation_at_lag(captured: &[Sample], reference: &[Sample], lag: usize) -> Sample {
    let len = captured.len();
    reference
        .iter()
        .enumerate()
        .map(|(n, r)| captured[(n + lag) % len] * r.conj())
        .sum()
}

/// `len` samples of `captured` starting at `start`, wrapping around the end
pub fn circular_segment(captured: &[Sample], start: usize, len: usize) -> Vec<Sample> {
    let total = captured.len();
    (0..len).map(|n| captured[(start + n) % total]).collect()
}

/// Normalised correlation coefficient |<a, b>| / (|a| |b|), 0 for silent input
pub fn normalized_correlation(a: &[Sample], b: &[Sample]) -> f64 {
    let dot: Sample = a.iter().zip(b.iter()).map(|(x, y)| x * y.conj()).sum();
    let energy_a: f64 = a.iter().map(|x| x.norm_sqr()).sum();
    let energy_b: f64 = b.iter().map(|x| x.norm_sqr()).sum();
    let denom = (energy_a * energy_b).sqrt();
    if denom > 1e-300 {
        dot.norm() / denom
    } else {
        0.0
    }
}

/// Lags searched for a capture of `len` samples.
///
/// With a window, only lags within `max_lag` of zero (either direction,
/// circularly) are returned; otherwise every lag.
pub fn search_lags(len: usize, max_lag: Option<usize>) -> Vec<usize> {
    match max_lag {
        Some(max) if 2 * max + 1 < len => (0..=max).chain(len - max..len).collect(),
        _ => (0..len).collect(),
    }
}

/// Index of the largest magnitude among `lags`, first one wins on ties
pub fn peak_lag(correlation: &[Sample], lags: &[usize]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for &lag in lags {
        let mag = correlation[lag].norm();
        match best {
            Some((_, m)) if mag <= m => {}
            _ => best = Some((lag, mag)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq() -> Vec<Sample> {
        vec![
            Sample::new(1.0, 1.0),
            Sample::new(1.0, -1.0),
            Sample::new(-1.0, 1.0),
            Sample::new(-1.0, -1.0),
            Sample::new(1.0, 1.0),
            Sample::new(1.0, 1.0),
            Sample::new(-1.0, -1.0),
            Sample::new(1.0, -1.0),
        ]
    }

    #[test]
    fn fft_correlation_matches_direct_evaluation() {
        let reference = seq();
        let mut captured = seq();
        captured.extend(seq());
        captured.rotate_right(5);

        let fast = circular_cross_correlation(&captured, &reference);
        let scale = captured.len() as f64;
        for lag in 0..captured.len() {
            let direct = correlation_at_lag(&captured, &reference, lag);
            assert!((fast[lag] / scale - direct).norm() < 1e-9, "lag {lag}");
        }
    }

    #[test]
    fn peak_is_at_injected_rotation() {
        let reference = seq();
        let mut captured = seq();
        captured.rotate_right(3);

        let corr = circular_cross_correlation(&captured, &reference);
        let (lag, _) = peak_lag(&corr, &search_lags(captured.len(), None)).unwrap();
        assert_eq!(lag, 3);
        assert_eq!(circular_segment(&captured, lag, reference.len()), reference);
    }

    #[test]
    fn normalized_correlation_bounds() {
        let a = seq();
        assert!((normalized_correlation(&a, &a) - 1.0).abs() < 1e-12);
        let neg: Vec<Sample> = a.iter().map(|x| -x).collect();
        assert!((normalized_correlation(&a, &neg) - 1.0).abs() < 1e-12);
        let silent = vec![Sample::new(0.0, 0.0); a.len()];
        assert_eq!(normalized_correlation(&a, &silent), 0.0);
    }

    #[test]
    fn search_window_covers_both_directions() {
        assert_eq!(search_lags(10, Some(2)), vec![0, 1, 2, 8, 9]);
        assert_eq!(search_lags(4, Some(2)).len(), 4);
        assert_eq!(search_lags(3, None), vec![0, 1, 2]);
    }
}

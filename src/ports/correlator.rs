//! Correlator port trait

use crate::domain::{AlignedPair, DesyncError, DesyncResult, Waveform};
use crate::dsp::correlation::{circular_segment, normalized_correlation};

/// Relative tolerance when comparing sample rates of the two inputs
const RATE_TOLERANCE: f64 = 1e-9;

/// Sequence alignment by similarity search.
///
/// `align` finds, per channel, the offset of `reference` inside `captured`
/// that maximises cross-correlation and returns both trimmed to the
/// reference length with that offset removed: `tx` is the aligned slice of
/// the capture, `rx` the reference.
///
/// Must fail with `ShapeMismatch` when the capture is shorter than the
/// reference or the channel counts differ, and with
/// `SynchronizationFailure` when no peak is strong enough.
pub trait Correlator {
    fn align(&self, captured: &Waveform, reference: &Waveform) -> DesyncResult<AlignedPair>;
}

/// Reject inputs no correlator can align
pub fn check_alignment_inputs(captured: &Waveform, reference: &Waveform) -> DesyncResult<()> {
    if captured.mode_count() != reference.mode_count() {
        return Err(DesyncError::ShapeMismatch(format!(
            "capture has {} channels, reference has {}",
            captured.mode_count(),
            reference.mode_count()
        )));
    }
    let rate_gap = (captured.sample_rate() - reference.sample_rate()).abs();
    if rate_gap > RATE_TOLERANCE * reference.sample_rate() {
        return Err(DesyncError::ShapeMismatch(format!(
            "capture sampled at {} Hz, reference at {} Hz",
            captured.sample_rate(),
            reference.sample_rate()
        )));
    }
    if captured.len() < reference.len() {
        return Err(DesyncError::ShapeMismatch(format!(
            "capture ({} samples) is shorter than the reference ({} samples)",
            captured.len(),
            reference.len()
        )));
    }
    Ok(())
}

/// Cut the capture at the per-channel peak lags and check confidence.
///
/// `peak_lags[c]` is the start of the reference inside channel `c` of the
/// capture. Each slice must reach `threshold` normalised correlation with
/// the reference or the whole alignment fails.
pub fn extract_aligned(
    captured: &Waveform,
    reference: &Waveform,
    peak_lags: &[usize],
    threshold: f64,
) -> DesyncResult<AlignedPair> {
    let mut segments = Vec::with_capacity(reference.mode_count());

    for (channel, (&lag, ref_ch)) in peak_lags.iter().zip(reference.channels()).enumerate() {
        let segment = circular_segment(&captured.channels()[channel], lag, ref_ch.len());
        let confidence = normalized_correlation(&segment, ref_ch);
        log::debug!("channel {channel}: peak lag {lag}, confidence {confidence:.4}");

        if confidence < threshold {
            return Err(DesyncError::SynchronizationFailure {
                channel,
                confidence,
                threshold,
            });
        }
        segments.push(segment);
    }

    AlignedPair::new(captured.recreate_from(segments)?, reference.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sample;

    fn wave(len: usize, rate: f64) -> Waveform {
        let ch: Vec<Sample> = (0..len).map(|i| Sample::new(i as f64 + 1.0, 0.0)).collect();
        Waveform::new(vec![ch], 1.0, rate).unwrap()
    }

    #[test]
    fn short_capture_is_a_shape_mismatch() {
        let err = check_alignment_inputs(&wave(3, 1.0), &wave(4, 1.0)).unwrap_err();
        assert!(matches!(err, DesyncError::ShapeMismatch(_)));
    }

    #[test]
    fn rate_mismatch_is_rejected() {
        assert!(check_alignment_inputs(&wave(8, 2.0), &wave(4, 1.0)).is_err());
        assert!(check_alignment_inputs(&wave(8, 1.0), &wave(4, 1.0)).is_ok());
    }

    #[test]
    fn extract_cuts_at_lag() {
        let captured = wave(6, 1.0).rotate(2);
        let reference = wave(6, 1.0);
        let pair = extract_aligned(&captured, &reference, &[2], 0.99).unwrap();
        assert_eq!(pair.tx, reference);
    }

    #[test]
    fn weak_peak_is_a_sync_failure() {
        let captured = wave(6, 1.0);
        let reference = wave(6, 1.0)
            .map_channels(|c| {
                c.iter()
                    .enumerate()
                    .map(|(i, s)| if i % 2 == 0 { *s } else { -s })
                    .collect()
            })
            .unwrap();
        let err = extract_aligned(&captured, &reference, &[0], 0.9).unwrap_err();
        assert!(err.is_sync_failure());
    }
}

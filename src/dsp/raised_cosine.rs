//! Raised-cosine frequency response used as the resampling pulse-shape filter

use std::f64::consts::PI;

/// Raised-cosine low-pass magnitude response.
///
/// Unity up to `(1 - beta) * edge`, zero beyond `(1 + beta) * edge`,
/// with a half-cosine roll-off between. The response is 0.5 at `edge`
/// whenever `beta > 0`. Frequencies may be given in any unit (Hz, DFT
/// bins) as long as `edge` uses the same one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaisedCosineResponse {
    edge: f64,
    beta: f64,
}

impl RaisedCosineResponse {
    pub fn new(edge: f64, beta: f64) -> Self {
        Self { edge, beta }
    }

    /// Gain at frequency `freq` (sign ignored)
    pub fn gain(&self, freq: f64) -> f64 {
        let f = freq.abs();
        let pass = (1.0 - self.beta) * self.edge;
        let stop = (1.0 + self.beta) * self.edge;

        if f <= pass {
            1.0
        } else if f > stop {
            0.0
        } else {
            0.5 * (1.0 + (PI / (2.0 * self.beta * self.edge) * (f - pass)).cos())
        }
    }

    pub fn edge(&self) -> f64 {
        self.edge
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passband_is_flat() {
        let rc = RaisedCosineResponse::new(1000.0, 0.2);
        assert_eq!(rc.gain(0.0), 1.0);
        assert_eq!(rc.gain(-800.0), 1.0);
    }

    #[test]
    fn test_half_gain_at_edge() {
        let rc = RaisedCosineResponse::new(1000.0, 0.2);
        assert!((rc.gain(1000.0) - 0.5).abs() < 1e-12);
        assert_eq!(rc.gain(1200.1), 0.0);
    }

    #[test]
    fn test_zero_beta_is_brick_wall() {
        let rc = RaisedCosineResponse::new(1000.0, 0.0);
        assert_eq!(rc.gain(1000.0), 1.0);
        assert_eq!(rc.gain(1000.001), 0.0);
    }

    #[test]
    fn test_rolloff_is_monotonic() {
        let rc = RaisedCosineResponse::new(1.0, 0.5);
        let gains: Vec<f64> = (0..=40).map(|i| rc.gain(i as f64 * 0.05)).collect();
        assert!(gains.windows(2).all(|w| w[1] <= w[0]));
    }
}

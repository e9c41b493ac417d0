//! Accuracy evaluator
//!
//! Compares a recovered waveform with its reference: bit and symbol error
//! rates, gross quadrant slips and where along the sequence errors fall.

use serde::Serialize;

use crate::domain::{AlignedPair, DesyncError, DesyncResult, ErrorReport, Waveform};
use crate::modem::QamConstellation;

/// Element-wise equality of two same-shape symbol arrays
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolComparison {
    /// 1 where the symbols agree, 0 where they differ, per channel
    pub matches: Vec<Vec<u8>>,
    pub success_rate: f64,
}

impl SymbolComparison {
    pub fn error_rate(&self) -> f64 {
        1.0 - self.success_rate
    }

    pub fn error_count(&self) -> usize {
        self.matches.iter().flatten().filter(|&&m| m == 0).count()
    }
}

pub fn compare_symbols<T: PartialEq>(a: &[Vec<T>], b: &[Vec<T>]) -> DesyncResult<SymbolComparison> {
    check_shapes(a.len(), b.len(), "channel count")?;
    for (ch, (x, y)) in a.iter().zip(b).enumerate() {
        check_shapes(x.len(), y.len(), &format!("channel {ch} length"))?;
    }
    let total: usize = a.iter().map(Vec::len).sum();
    if total == 0 {
        return Err(DesyncError::InvalidParameter("nothing to compare".into()));
    }

    let matches: Vec<Vec<u8>> = a
        .iter()
        .zip(b)
        .map(|(x, y)| x.iter().zip(y).map(|(p, q)| u8::from(p == q)).collect())
        .collect();
    let equal: usize = matches.iter().flatten().map(|&m| m as usize).sum();

    Ok(SymbolComparison {
        matches,
        success_rate: equal as f64 / total as f64,
    })
}

/// Symbols whose real or imaginary sign differs, summed over channels
pub fn compare_quadrants(a: &Waveform, b: &Waveform) -> DesyncResult<usize> {
    check_shapes(a.mode_count(), b.mode_count(), "channel count")?;
    check_shapes(a.len(), b.len(), "length")?;

    let count = a
        .channels()
        .iter()
        .zip(b.channels())
        .map(|(x, y)| {
            x.iter()
                .zip(y)
                .filter(|(p, q)| sign(p.re) != sign(q.re) || sign(p.im) != sign(q.im))
                .count()
        })
        .sum();
    Ok(count)
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

fn check_shapes(a: usize, b: usize, what: &str) -> DesyncResult<()> {
    if a != b {
        return Err(DesyncError::ShapeMismatch(format!("{what} differs: {a} vs {b}")));
    }
    Ok(())
}

/// Indices of the zero entries of a correctness array
pub fn error_positions(matches: &[u8]) -> Vec<usize> {
    matches
        .iter()
        .enumerate()
        .filter(|(_, &m)| m == 0)
        .map(|(i, _)| i)
        .collect()
}

/// Equal-width histogram. `edges` has one more entry than `counts`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Histogram of error positions with `min(bin_count, errors)` bins (at least one).
///
/// The range spans the smallest to the largest position; a single distinct
/// position gets a unit-wide range around it and no errors give `[0, 1]`.
pub fn error_distribution(matches: &[u8], bin_count: usize) -> Histogram {
    let positions = error_positions(matches);
    let bins = bin_count.min(positions.len()).max(1);

    let (lo, hi) = match (positions.first(), positions.last()) {
        (Some(&first), Some(&last)) if first == last => (first as f64 - 0.5, last as f64 + 0.5),
        (Some(&first), Some(&last)) => (first as f64, last as f64),
        _ => (0.0, 1.0),
    };
    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + i as f64 * width).collect();

    let mut counts = vec![0; bins];
    for &p in &positions {
        // Last edge is inclusive
        let idx = (((p as f64 - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Histogram { edges, counts }
}

/// One error-position histogram per channel
pub fn error_distributions(comparison: &SymbolComparison, bin_count: usize) -> Vec<Histogram> {
    comparison
        .matches
        .iter()
        .map(|m| error_distribution(m, bin_count))
        .collect()
}

/// Share of `positions` that lie within `edge` samples of either end of a
/// `len`-sample sequence; 0 when there are no errors
pub fn edge_error_fraction(positions: &[usize], len: usize, edge: usize) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }
    let near_edge = positions
        .iter()
        .filter(|&&p| p < edge || p + edge >= len)
        .count();
    near_edge as f64 / positions.len() as f64
}

/// Full accuracy report for an aligned pair, `rx` taken as ground truth
pub fn evaluate(pair: &AlignedPair, constellation: &QamConstellation) -> DesyncResult<ErrorReport> {
    let bits = compare_symbols(
        &constellation.demodulate_bits(&pair.tx),
        &constellation.demodulate_bits(&pair.rx),
    )?;
    let symbols = compare_symbols(
        &constellation.demodulate(&pair.tx),
        &constellation.demodulate(&pair.rx),
    )?;
    let quadrant_error_count = compare_quadrants(&pair.tx, &pair.rx)?;

    let mut positions: Vec<usize> = symbols
        .matches
        .iter()
        .flat_map(|m| error_positions(m))
        .collect();
    positions.sort_unstable();

    let report = ErrorReport {
        success_rate: bits.success_rate,
        bit_error_rate: bits.error_rate(),
        symbol_error_rate: symbols.error_rate(),
        quadrant_error_count,
        error_positions: positions,
    };
    log::debug!(
        "BER {:.3e}, SER {:.3e}, {} quadrant errors",
        report.bit_error_rate,
        report.symbol_error_rate,
        report.quadrant_error_count
    );
    Ok(report)
}

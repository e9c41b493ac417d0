//! Tiling of a waveform's symbol stream.
//!
//! The capture window of an unsynchronised receiver can sit anywhere in a
//! periodically repeated transmission, so the reference is tiled before a
//! delay is injected. Then any window still contains one full copy.

use crate::domain::{DesyncError, DesyncResult, Waveform};

/// `n` verbatim concatenations of every channel
pub fn tile(waveform: &Waveform, n: usize) -> DesyncResult<Waveform> {
    if n == 0 {
        return Err(DesyncError::InvalidParameter(
            "tile count must be at least 1".into(),
        ));
    }
    waveform.map_channels(|c| c.repeat(n))
}

/// Tile `waveform` `factor` times along the symbol axis.
///
/// Integer factors give exactly `factor * len` samples. A fractional
/// factor tiles `ceil(factor)` times and keeps the first
/// `ceil(factor * len)` samples, so the tail is a prefix of the input.
pub fn duplicate(waveform: &Waveform, factor: f64) -> DesyncResult<Waveform> {
    if !(factor.is_finite() && factor >= 1.0) {
        return Err(DesyncError::InvalidParameter(format!(
            "duplication factor must be >= 1, got {factor}"
        )));
    }

    let whole = factor.ceil() as usize;
    let out_len = (factor * waveform.len() as f64).ceil() as usize;
    log::debug!("duplicate x{factor}: {} -> {out_len} samples", waveform.len());

    let tiled = tile(waveform, whole)?;
    if out_len == tiled.len() {
        return Ok(tiled);
    }
    tiled.map_channels(|c| c[..out_len].to_vec())
}

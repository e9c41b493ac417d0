//! Waveform interchange text format.
//!
//! Two lines per channel: the real parts, then the imaginary parts, each a
//! `", "`-separated list of decimal literals. A dual-polarisation waveform
//! is therefore four lines. Lines are joined by `\n` without a trailing
//! newline.
//!
//! - `encode`: Waveform → text (pure, no I/O)
//! - `decode`: text + rate template → Waveform (pure, no I/O)
//! - `save_waveform` / `load_waveform`: the same through a file

pub mod decode;
pub mod encode;

use std::path::Path;

pub use decode::decode;
pub use encode::encode;

use crate::domain::{DesyncResult, Waveform};

/// Separator between values on one line
pub const SEPARATOR: &str = ", ";

/// Write `waveform` to `path`, replacing any existing file
pub fn save_waveform(path: &Path, waveform: &Waveform) -> DesyncResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, encode(waveform))?;
    log::info!(
        "Saved {}x{} waveform to {}",
        waveform.mode_count(),
        waveform.len(),
        path.display()
    );
    Ok(())
}

/// Read a waveform from `path`; the text carries no rates, so the caller
/// supplies them
pub fn load_waveform(path: &Path, symbol_rate: f64, sample_rate: f64) -> DesyncResult<Waveform> {
    let text = std::fs::read_to_string(path)?;
    let waveform = decode(&text, symbol_rate, sample_rate)?;
    log::info!(
        "Loaded {}x{} waveform from {}",
        waveform.mode_count(),
        waveform.len(),
        path.display()
    );
    Ok(waveform)
}

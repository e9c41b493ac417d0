//! Pure encoding: Waveform → interchange text.

use crate::domain::Waveform;

use super::SEPARATOR;

/// Encode every channel as a real-part line followed by an imaginary-part line.
///
/// Values use Rust's shortest round-trip formatting, so `decode` restores
/// them bit for bit.
pub fn encode(waveform: &Waveform) -> String {
    waveform
        .channels()
        .iter()
        .flat_map(|ch| {
            [
                join(ch.iter().map(|s| s.re)),
                join(ch.iter().map(|s| s.im)),
            ]
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn join(values: impl Iterator<Item = f64>) -> String {
    values
        .map(|v| format!("{v:?}"))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

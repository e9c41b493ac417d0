//! Pure decoding: interchange text + rate template → Waveform.

use crate::domain::{DesyncError, DesyncResult, Sample, Waveform};

/// Decode interchange text into a waveform tagged with the given rates.
///
/// Expects two or four non-empty lines (one or two channels). Values may be
/// separated by `,` with any surrounding whitespace. Returns `Interchange`
/// errors for malformed text and `ShapeMismatch` when the real and
/// imaginary lines of a channel differ in length.
pub fn decode(text: &str, symbol_rate: f64, sample_rate: f64) -> DesyncResult<Waveform> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() || lines.len() % 2 != 0 || lines.len() > 4 {
        return Err(DesyncError::Interchange(format!(
            "expected 2 or 4 lines of samples, found {}",
            lines.len()
        )));
    }

    let mut channels = Vec::with_capacity(lines.len() / 2);
    for (ch, pair) in lines.chunks(2).enumerate() {
        let re = parse_line(pair[0], 2 * ch + 1)?;
        let im = parse_line(pair[1], 2 * ch + 2)?;
        if re.len() != im.len() {
            return Err(DesyncError::ShapeMismatch(format!(
                "channel {ch}: {} real parts but {} imaginary parts",
                re.len(),
                im.len()
            )));
        }
        channels.push(re.into_iter().zip(im).map(|(r, i)| Sample::new(r, i)).collect());
    }

    Waveform::new(channels, symbol_rate, sample_rate)
}

/// Parse one comma-separated line; `line_no` is 1-based for messages
fn parse_line(line: &str, line_no: usize) -> DesyncResult<Vec<f64>> {
    line.split(',')
        .map(str::trim)
        .map(|field| {
            field.parse::<f64>().map_err(|e| {
                DesyncError::Interchange(format!("line {line_no}: cannot parse '{field}': {e}"))
            })
        })
        .collect()
}

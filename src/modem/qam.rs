//! Square Gray-coded QAM constellations.
//!
//! Points are scaled to unit mean power. The symbol index packs the Gray
//! code of the in-phase level in the high bits and the quadrature level in
//! the low bits, so neighbouring points differ in exactly one bit.

use rand::Rng;

use crate::domain::{DesyncError, DesyncResult, Sample, Waveform};

#[derive(Debug, Clone)]
pub struct QamConstellation {
    order: usize,
    /// Levels per axis
    side: usize,
    bits_per_axis: u32,
    scale: f64,
}

impl QamConstellation {
    /// Square constellation of `order` points (4, 16, 64, 256, ...)
    pub fn new(order: usize) -> DesyncResult<Self> {
        let side = (order as f64).sqrt().round() as usize;
        if order < 4 || side * side != order || !side.is_power_of_two() {
            return Err(DesyncError::InvalidParameter(format!(
                "QAM order must be an even power of two >= 4, got {order}"
            )));
        }
        Ok(Self {
            order,
            side,
            bits_per_axis: side.trailing_zeros(),
            scale: (2.0 * (order as f64 - 1.0) / 3.0).sqrt().recip(),
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn bits_per_symbol(&self) -> u32 {
        2 * self.bits_per_axis
    }

    /// Constellation point for symbol `index`
    pub fn point(&self, index: usize) -> Sample {
        let mask = self.side - 1;
        let i_level = gray_decode(index >> self.bits_per_axis & mask);
        let q_level = gray_decode(index & mask);
        Sample::new(self.amplitude(i_level), self.amplitude(q_level)) * self.scale
    }

    /// Nearest-point hard decision
    pub fn decide(&self, sample: Sample) -> usize {
        let i_level = self.level(sample.re);
        let q_level = self.level(sample.im);
        gray_encode(i_level) << self.bits_per_axis | gray_encode(q_level)
    }

    /// Bits of symbol `index`, most significant first
    pub fn symbol_bits(&self, index: usize) -> impl Iterator<Item = u8> {
        let bits = self.bits_per_symbol();
        (0..bits).rev().map(move |b| (index >> b & 1) as u8)
    }

    /// Hard decisions for every sample of every channel
    pub fn demodulate(&self, waveform: &Waveform) -> Vec<Vec<usize>> {
        waveform
            .channels()
            .iter()
            .map(|c| c.iter().map(|&s| self.decide(s)).collect())
            .collect()
    }

    /// Hard-decided bit stream per channel
    pub fn demodulate_bits(&self, waveform: &Waveform) -> Vec<Vec<u8>> {
        self.demodulate(waveform)
            .into_iter()
            .map(|c| c.into_iter().flat_map(|idx| self.symbol_bits(idx)).collect())
            .collect()
    }

    pub fn random_indices<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<usize> {
        (0..count).map(|_| rng.gen_range(0..self.order)).collect()
    }

    pub fn random_symbols<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<Sample> {
        self.random_indices(rng, count)
            .into_iter()
            .map(|idx| self.point(idx))
            .collect()
    }

    /// Random symbol-rate waveform with `modes` independent channels
    pub fn random_waveform<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        modes: usize,
        count: usize,
        symbol_rate: f64,
    ) -> DesyncResult<Waveform> {
        let channels = (0..modes).map(|_| self.random_symbols(&mut *rng, count)).collect();
        Waveform::at_symbol_rate(channels, symbol_rate)
    }

    fn amplitude(&self, level: usize) -> f64 {
        (2 * level) as f64 - (self.side - 1) as f64
    }

    fn level(&self, value: f64) -> usize {
        let raw = ((value / self.scale + (self.side - 1) as f64) / 2.0).round();
        raw.clamp(0.0, (self.side - 1) as f64) as usize
    }
}

fn gray_encode(n: usize) -> usize {
    n ^ (n >> 1)
}

fn gray_decode(mut g: usize) -> usize {
    let mut n = g;
    while g > 1 {
        g >>= 1;
        n ^= g;
    }
    n
}

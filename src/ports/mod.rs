//! Port traits (interfaces)
//!
//! These traits define the boundary between the delay-recovery core and the
//! external DSP capabilities it relies on. Adapters implement them: a real
//! FFT-backed implementation and a simple test double for each.

pub mod correlator;
pub mod resampler;

pub use correlator::*;
pub use resampler::*;

//! Modulation formats
//!
//! Square QAM mapping and hard-decision demodulation used to generate test
//! waveforms and score recovered ones.

pub mod qam;

pub use qam::QamConstellation;

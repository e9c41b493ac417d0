//! Digital Signal Processing
//!
//! Pure functions for signal processing. No I/O dependencies.

pub mod correlation;
pub mod fft;
pub mod raised_cosine;

// Re-export commonly used items
pub use fft::FftProcessor;
pub use raised_cosine::RaisedCosineResponse;

//! Adapters (implementations of port traits)
//!
//! Real FFT-backed resampler and correlator, plus simple test doubles that
//! count their calls. The doubles are deterministic and need no spectral
//! maths, which keeps pipeline tests small.

pub mod fft_correlator;
pub mod fft_resampler;
pub mod mock_correlator;
pub mod mock_resampler;

pub use fft_correlator::FftCorrelator;
pub use fft_resampler::FftResampler;
pub use mock_correlator::BruteForceCorrelator;
pub use mock_resampler::HoldResampler;

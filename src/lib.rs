//! Waveform desync simulation and delay recovery
//!
//! Simulates the capture of a periodically repeated, digitally modulated
//! waveform by a receiver whose clock is not locked to the transmitter, and
//! recovers a time-aligned copy so bit and symbol errors can be measured.
//!
//! ## Architecture (Hexagonal / Ports & Adapters)
//!
//! - `domain/` - Pure domain types, errors and the experiment profile
//! - `ports/` - Trait definitions for the resampler and correlator capabilities
//! - `dsp/` - Signal processing (pure functions, no I/O)
//! - `modem/` - QAM mapping and hard decisions
//! - `adapters/` - Implementations of ports (FFT-backed and test doubles)
//! - `sync/` - Duplicator, desync simulator, delay recovery, accuracy evaluator
//! - `interchange/` - Waveform text format
//! - `trial` - Experiment runner and sweep summary

// Core domain (pure, no I/O)
pub mod domain;
pub mod dsp;
pub mod modem;
pub mod ports;
pub mod sync;

// Adapters and boundary formats
pub mod adapters;
pub mod interchange;

pub mod trial;

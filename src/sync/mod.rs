//! Delay-recovery pipeline
//!
//! Duplicator → desync simulator → delay recovery → accuracy evaluator.
//! Every stage takes and returns whole `Waveform` values. Randomness is
//! always drawn from a caller-supplied RNG.

pub mod accuracy;
pub mod desync;
pub mod duplicator;
pub mod recovery;

pub use accuracy::{
    compare_quadrants, compare_symbols, edge_error_fraction, error_distribution,
    error_distributions, error_positions, evaluate, Histogram, SymbolComparison,
};
pub use desync::{add_noise, delay, random_fractional_shift, random_integer_shift, DesyncSimulator};
pub use duplicator::{duplicate, tile};
pub use recovery::{DelayRecovery, INTERMEDIATE_OVERSAMPLING};

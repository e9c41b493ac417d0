//! Core domain types
//!
//! Pure types with no I/O dependencies: the waveform value type, delay and
//! alignment records, accuracy reports, errors and the experiment profile.

pub mod config;
pub mod error;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;

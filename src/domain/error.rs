//! Domain error types

use thiserror::Error;

/// Errors that can occur anywhere in the desync/recovery pipeline
#[derive(Error, Debug)]
pub enum DesyncError {
    /// Inputs disagree on channel count, length or rate
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The correlator could not find a confident alignment
    #[error(
        "Synchronization failure on channel {channel}: \
         confidence {confidence:.3} below threshold {threshold:.3}"
    )]
    SynchronizationFailure {
        channel: usize,
        confidence: f64,
        threshold: f64,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Malformed waveform interchange text
    #[error("Interchange format error: {0}")]
    Interchange(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DesyncError {
    /// True for failures an experiment should record as a failed trial
    /// rather than abort on.
    pub fn is_sync_failure(&self) -> bool {
        matches!(self, DesyncError::SynchronizationFailure { .. })
    }
}

/// Result type alias for pipeline operations
pub type DesyncResult<T> = Result<T, DesyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_failure_is_flagged_as_recoverable() {
        let err = DesyncError::SynchronizationFailure {
            channel: 1,
            confidence: 0.12,
            threshold: 0.5,
        };
        assert!(err.is_sync_failure());
        assert!(!DesyncError::ShapeMismatch("x".into()).is_sync_failure());
    }

    #[test]
    fn sync_failure_message_names_channel() {
        let err = DesyncError::SynchronizationFailure {
            channel: 0,
            confidence: 0.25,
            threshold: 0.5,
        };
        assert_eq!(
            err.to_string(),
            "Synchronization failure on channel 0: confidence 0.250 below threshold 0.500"
        );
    }
}

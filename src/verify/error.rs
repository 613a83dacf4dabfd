use std::time::Duration;

use thiserror::Error;

/// # Errors reported by [`StepVerifier`](crate::StepVerifier).
///
/// `step` is the zero-based index of the expectation that failed, in the
/// order the script was written.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// A signal arrived but did not match the expectation.
    #[error("step {step}: expected {expected}, got {actual}")]
    Mismatch {
        /// Failing step.
        step: usize,
        /// What the step expected.
        expected: String,
        /// The signal that arrived.
        actual: String,
    },

    /// No signal arrived within the real-time wait.
    #[error("step {step}: no signal within {waited:?}")]
    Timeout {
        /// Failing step.
        step: usize,
        /// How long the verifier waited.
        waited: Duration,
    },

    /// Virtual time has no timers left and the sequence is silent.
    #[error("step {step}: sequence stalled (no signal and no pending work)")]
    Stalled {
        /// Failing step.
        step: usize,
    },

    /// A signal arrived during a window that had to stay quiet.
    #[error("step {step}: unexpected {actual}")]
    UnexpectedSignal {
        /// Failing step.
        step: usize,
        /// The signal that arrived.
        actual: String,
    },
}

impl VerifyError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            VerifyError::Mismatch { .. } => "verify_mismatch",
            VerifyError::Timeout { .. } => "verify_timeout",
            VerifyError::Stalled { .. } => "verify_stalled",
            VerifyError::UnexpectedSignal { .. } => "verify_unexpected_signal",
        }
    }

    /// Index of the failing step.
    pub fn step(&self) -> usize {
        match self {
            VerifyError::Mismatch { step, .. }
            | VerifyError::Timeout { step, .. }
            | VerifyError::Stalled { step }
            | VerifyError::UnexpectedSignal { step, .. } => *step,
        }
    }
}

//! Engine error types.
//!
//! Only caller contract violations surface here. Bad data in a single
//! question or response is reported as a [`Diagnostic`](crate::diagnostics::Diagnostic)
//! and never aborts a batch.

use thiserror::Error;

/// Errors returned by the scoring engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The same participant appeared twice in a ranking input.
    #[error("participant {participant_id} appears more than once in contest {contest_id}")]
    DuplicateParticipant {
        contest_id: String,
        participant_id: String,
    },

    /// A summary carried a NaN or infinite ranking field.
    #[error("participant {participant_id} has a non-finite {field}")]
    NonFiniteScore {
        participant_id: String,
        field: &'static str,
    },

    /// The engine configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Returns `true` if the error was caused by the ranking input rather
    /// than by configuration.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            EngineError::DuplicateParticipant { .. } | EngineError::NonFiniteScore { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_participant() {
        let err = EngineError::NonFiniteScore {
            participant_id: "p7".into(),
            field: "accuracy",
        };
        assert_eq!(err.to_string(), "participant p7 has a non-finite accuracy");
        assert!(err.is_input_error());
        assert!(!EngineError::InvalidConfig("x".into()).is_input_error());
    }
}

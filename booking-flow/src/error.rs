use thiserror::Error;

/// Errors raised by the booking wizard and its supporting services.
///
/// Only [`BookingError::SubmissionFailure`] crosses the wizard boundary; it is
/// converted into a user-facing notice there. The remaining variants report bad
/// input from the shell or infrastructure problems and never change wizard state.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Submission failed: {0}")]
    SubmissionFailure(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session is closed")]
    SessionClosed,

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field is read-only: {0}")]
    ReadOnlyField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BookingError>;

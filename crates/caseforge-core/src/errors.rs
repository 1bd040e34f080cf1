//! Error types for the record/store side of the crate.
//!
//! Pipeline failures stay on `anyhow`: an upstream completion failure aborts
//! the whole generation run and nothing downstream wants to match on it. The
//! store surface is different — callers need to tell bad input from bad state
//! from a missing case, so it gets a typed enum.

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Email does not look like an email.
    #[error("invalid email format: {email}")]
    InvalidEmail { email: String },

    /// Decision string is not one of the accepted values.
    #[error("invalid decision: {decision}. Must be 'approve' or 'reject'")]
    InvalidDecision { decision: String },

    /// An operation that needs a session was called before one was loaded.
    #[error("no active session. Call load_or_create_session first")]
    NoActiveSession,

    /// Case id has no backing record in storage.
    #[error("case not found: {case_id}")]
    CaseNotFound { case_id: String },

    /// A case record violates the shape the read side relies on.
    #[error("malformed case record {case_id}: {reason}")]
    MalformedRecord { case_id: String, reason: String },

    /// Session file I/O failed.
    #[error("session i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Session file did not parse or serialize.
    #[error("session serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Opaque failure from the case loader.
    #[error("case storage error: {0}")]
    Storage(#[source] anyhow::Error),
}

impl StoreError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidEmail { .. } | Self::InvalidDecision { .. } => 1,
            Self::NoActiveSession => 1,
            Self::CaseNotFound { .. } => 1,
            _ => 2,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

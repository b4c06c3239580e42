// Error taxonomy for the Athene client. Every condition the coordinator or
// the poller can stop on has its own variant so the binary can map it to one
// short message.

use crate::poller::PollState;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtheneError {
    /// The user left the assignment id or token prompt empty.
    #[error("Authentication abandoned")]
    AuthAbandoned,

    /// First-time authentication came back as a session timeout. The server
    /// gives the same signal for a bad token and a bad assignment id.
    #[error("Either session timed out or invalid session token/assignment ID")]
    InvalidSessionOrAssignment,

    #[error("Repeated Athene session timeout")]
    RepeatedSessionTimeout,

    #[error("Incorrect number of files to submit. Expected {expected} file(s): {}.", .slot_names.join(", "))]
    SlotCountMismatch {
        expected: usize,
        provided: usize,
        slot_names: Vec<String>,
    },

    #[error("Unknown issue submitting files, session may have expired. Status code: {status}, Response: {body}")]
    TransportFailure { status: u16, body: String },

    #[error("Submission is not pending, but no results found")]
    InconsistentServerState,

    /// `submit` and `wait` called out of order, or a second time.
    #[error("Submission step out of order: expected {expected:?}, poller is {actual:?}")]
    PollOrder {
        expected: PollState,
        actual: PollState,
    },

    #[error("Auth token contains characters that cannot be sent in a cookie")]
    InvalidToken,

    #[error("Failed to read {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cached Athene config is unreadable, run \"athene clear\": {0}")]
    ConfigFormat(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AtheneError {
    /// Conditions that end the run cleanly without anything to report.
    pub fn is_silent(&self) -> bool {
        matches!(self, AtheneError::AuthAbandoned)
    }
}

pub type Result<T> = std::result::Result<T, AtheneError>;

//! Error types for the standings service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application. Callers that need to branch on a specific failure
//! downcast to [`StandingsError`].

use crate::types::{ContestId, SubmissionId};
use chrono::{DateTime, Utc};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific ranklist and rating scenarios
#[derive(Debug, thiserror::Error)]
pub enum StandingsError {
    #[error("Contest {contest_id} has not ended yet (ends at {end_time})")]
    ContestNotEnded {
        contest_id: ContestId,
        end_time: DateTime<Utc>,
    },

    #[error("Contest not found: {contest_id}")]
    ContestNotFound { contest_id: ContestId },

    #[error("Submission {submission_id} is outside the window of contest {contest_id}")]
    MalformedSubmissionWindow {
        contest_id: ContestId,
        submission_id: SubmissionId,
    },

    #[error("Invalid rating participants: {reason}")]
    InvalidParticipants { reason: String },

    #[error("Rating storage error: {message}")]
    StorageError { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Snapshot error: {message}")]
    SnapshotError { message: String },
}

//! Common types used throughout the standings service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for contests
pub type ContestId = u64;

/// Unique identifier for users (contest participants)
pub type UserId = u64;

/// Unique identifier for problems
pub type ProblemId = u64;

/// Unique identifier for submissions
pub type SubmissionId = u64;

/// Rating every user starts from before their first rated contest
pub const DEFAULT_RATING: i32 = 1500;

/// Competition rule a contest is ranked under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContestType {
    Oi,
    Ioi,
    Acm,
}

impl std::fmt::Display for ContestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContestType::Oi => write!(f, "OI"),
            ContestType::Ioi => write!(f, "IOI"),
            ContestType::Acm => write!(f, "ACM"),
        }
    }
}

/// Judge outcome of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Pending,
    Accepted,
    WrongAnswer,
    RuntimeError,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    OutputLimitExceeded,
    CompilationError,
    PartiallyCorrect,
    SystemError,
    Skipped,
}

impl SubmissionStatus {
    /// Whether the submission has finished judging
    pub fn is_judged(self) -> bool {
        self != SubmissionStatus::Pending
    }

    /// Whether this outcome costs an ACM penalty attempt
    pub fn is_wrong_attempt(self) -> bool {
        matches!(
            self,
            SubmissionStatus::WrongAnswer
                | SubmissionStatus::RuntimeError
                | SubmissionStatus::TimeLimitExceeded
                | SubmissionStatus::MemoryLimitExceeded
        )
    }
}

/// Read-only snapshot of a contest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contest {
    pub id: ContestId,
    #[serde(default)]
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub contest_type: ContestType,
    /// Problems in display order
    #[serde(default)]
    pub problem_ids: Vec<ProblemId>,
}

impl Contest {
    /// Whether the contest is over at `now`
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now > self.end_time
    }

    /// Whether `time` falls inside `[start_time, end_time]`
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        time >= self.start_time && time <= self.end_time
    }
}

/// A judged (or pending) submission as produced by the judging pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub contest_id: ContestId,
    pub problem_id: ProblemId,
    pub submitter_id: UserId,
    pub status: SubmissionStatus,
    /// 0-100, `None` while pending or for outcomes without a score
    pub score: Option<u32>,
    pub submit_time: DateTime<Utc>,
}

/// OI per-problem cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OiProblemStatus {
    pub problem_id: ProblemId,
    /// Withheld until the contest ends
    pub score: Option<u32>,
    pub submitted: bool,
}

/// IOI per-problem cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoiProblemStatus {
    pub problem_id: ProblemId,
    pub score: u32,
    /// Whole minutes from contest start to the first full score
    pub first_accept_minute: Option<i64>,
}

/// ACM per-problem cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcmProblemStatus {
    pub problem_id: ProblemId,
    pub accepted: bool,
    pub wrong_attempts: u32,
    pub solve_minute: Option<i64>,
    pub last_submit_minute: Option<i64>,
}

/// Contest-type specific part of a ranklist row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Standing {
    Oi {
        total_score: Option<u32>,
        problems: Vec<OiProblemStatus>,
    },
    Ioi {
        total_score: u32,
        problems: Vec<IoiProblemStatus>,
    },
    Acm {
        solved_count: u32,
        total_penalty: i64,
        problems: Vec<AcmProblemStatus>,
    },
}

/// One row of a contest ranklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RanklistEntry {
    /// 1-based dense rank, 0 while an OI contest is running
    pub rank: u32,
    pub user_id: UserId,
    pub standing: Standing,
}

/// Input row of the rating engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingParticipant {
    pub user_id: UserId,
    pub rank: u32,
    pub old_rating: i32,
    /// Rated contests the user took part in before this one
    pub prior_contest_count: u32,
}

/// Rating change computed for one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingChange {
    pub user_id: UserId,
    pub old_rating: i32,
    pub new_rating: i32,
    pub delta: i32,
    pub rank: u32,
}

/// Persisted rating change, unique per (contest, user)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingChangeRecord {
    pub contest_id: ContestId,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub old_rating: i32,
    pub new_rating: i32,
    pub delta: i32,
    pub rank: u32,
    pub participant_count: u32,
}

impl RatingChangeRecord {
    /// Build the record persisted for `change`
    pub fn from_change(
        contest_id: ContestId,
        change: &RatingChange,
        participant_count: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            contest_id,
            user_id: change.user_id,
            timestamp,
            old_rating: change.old_rating,
            new_rating: change.new_rating,
            delta: change.delta,
            rank: change.rank,
            participant_count,
        }
    }
}

/// Admin request to (re)compute ratings for a contest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingTrigger {
    pub contest_id: ContestId,
    #[serde(default)]
    pub recalculate: bool,
}

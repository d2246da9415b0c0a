//! Contest data source interface and implementations
//!
//! The judge platform owns contests and submissions; the standings service only
//! reads them. This module defines that read interface and an in-memory
//! implementation used by the CLI snapshot loader and tests.

use crate::error::{Result, StandingsError};
use crate::types::{Contest, ContestId, ProblemId, SubmissionRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Trait for reading contest input
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContestDataSource: Send + Sync {
    /// Get a contest by ID
    async fn get_contest(&self, contest_id: ContestId) -> Result<Option<Contest>>;

    /// Get the ordered problem list of a contest
    async fn get_contest_problems(&self, contest_id: ContestId) -> Result<Vec<ProblemId>>;

    /// Get the submissions recorded against a contest
    ///
    /// Implementations may pre-filter by the contest window; the ranklist
    /// builder re-checks eligibility either way.
    async fn get_eligible_submissions(&self, contest: &Contest) -> Result<Vec<SubmissionRecord>>;
}

#[derive(Debug, Default)]
struct SourceState {
    contests: HashMap<ContestId, Contest>,
    submissions: Vec<SubmissionRecord>,
}

/// In-memory contest data source
#[derive(Debug, Default)]
pub struct InMemoryContestDataSource {
    state: RwLock<SourceState>,
}

impl InMemoryContestDataSource {
    /// Create an empty data source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a contest
    pub fn add_contest(&self, contest: Contest) -> Result<()> {
        self.write()?.contests.insert(contest.id, contest);
        Ok(())
    }

    /// Add or replace a submission, matched by submission id
    ///
    /// Replacing is how a rejudge shows up to the standings service.
    pub fn upsert_submission(&self, submission: SubmissionRecord) -> Result<()> {
        let mut state = self.write()?;
        match state
            .submissions
            .iter_mut()
            .find(|existing| existing.id == submission.id)
        {
            Some(existing) => {
                debug!("Replacing submission {}", submission.id);
                *existing = submission;
            }
            None => state.submissions.push(submission),
        }
        Ok(())
    }

    /// Add or replace many submissions
    pub fn upsert_submissions(
        &self,
        submissions: impl IntoIterator<Item = SubmissionRecord>,
    ) -> Result<()> {
        for submission in submissions {
            self.upsert_submission(submission)?;
        }
        Ok(())
    }

    /// All contests, ordered by id
    pub fn contests(&self) -> Result<Vec<Contest>> {
        let mut contests: Vec<Contest> = self.read()?.contests.values().cloned().collect();
        contests.sort_by_key(|contest| contest.id);
        Ok(contests)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, SourceState>> {
        self.state.read().map_err(|e| {
            StandingsError::StorageError {
                message: format!("Failed to acquire read lock: {}", e),
            }
            .into()
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, SourceState>> {
        self.state.write().map_err(|e| {
            StandingsError::StorageError {
                message: format!("Failed to acquire write lock: {}", e),
            }
            .into()
        })
    }
}

#[async_trait]
impl ContestDataSource for InMemoryContestDataSource {
    async fn get_contest(&self, contest_id: ContestId) -> Result<Option<Contest>> {
        Ok(self.read()?.contests.get(&contest_id).cloned())
    }

    async fn get_contest_problems(&self, contest_id: ContestId) -> Result<Vec<ProblemId>> {
        let state = self.read()?;
        let contest = state
            .contests
            .get(&contest_id)
            .ok_or(StandingsError::ContestNotFound { contest_id })?;
        Ok(contest.problem_ids.clone())
    }

    async fn get_eligible_submissions(&self, contest: &Contest) -> Result<Vec<SubmissionRecord>> {
        Ok(self
            .read()?
            .submissions
            .iter()
            .filter(|submission| submission.contest_id == contest.id)
            .cloned()
            .collect())
    }
}

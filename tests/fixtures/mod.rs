//! Test fixtures and data source implementations for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use contest_standings::error::{Result, StandingsError};
use contest_standings::metrics::MetricsCollector;
use contest_standings::rating::{InMemoryRatingStore, RatingEngine, RatingPolicy};
use contest_standings::service::{
    ContestDataSource, ContestRatingService, InMemoryContestDataSource,
};
use contest_standings::types::{
    Contest, ContestId, ContestType, ProblemId, SubmissionRecord, SubmissionStatus, UserId,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Start of the first fixture contest; later contests start one day apart
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap()
}

/// A moment after every fixture contest has ended
pub fn long_after() -> DateTime<Utc> {
    base_time() + Duration::days(365)
}

/// Two-hour contest starting `day` days after [`base_time`]
pub fn contest(
    id: ContestId,
    contest_type: ContestType,
    day: i64,
    problem_ids: Vec<ProblemId>,
) -> Contest {
    let start_time = base_time() + Duration::days(day);
    Contest {
        id,
        title: format!("Fixture Round {}", id),
        start_time,
        end_time: start_time + Duration::hours(2),
        contest_type,
        problem_ids,
    }
}

/// Builder for submissions relative to a contest start
pub struct SubmissionBuilder {
    record: SubmissionRecord,
}

impl SubmissionBuilder {
    pub fn new(id: u64, contest: &Contest, problem_id: ProblemId, submitter_id: UserId) -> Self {
        Self {
            record: SubmissionRecord {
                id,
                contest_id: contest.id,
                problem_id,
                submitter_id,
                status: SubmissionStatus::Pending,
                score: None,
                submit_time: contest.start_time,
            },
        }
    }

    pub fn at_minute(mut self, minute: i64) -> Self {
        self.record.submit_time = self.record.submit_time + Duration::minutes(minute);
        self
    }

    pub fn status(mut self, status: SubmissionStatus) -> Self {
        self.record.status = status;
        self
    }

    pub fn score(mut self, score: u32) -> Self {
        self.record.score = Some(score);
        self
    }

    pub fn build(self) -> SubmissionRecord {
        self.record
    }
}

/// Accepted ACM submission at `minute`
pub fn accepted(
    id: u64,
    contest: &Contest,
    problem_id: ProblemId,
    user: UserId,
    minute: i64,
) -> SubmissionRecord {
    SubmissionBuilder::new(id, contest, problem_id, user)
        .at_minute(minute)
        .status(SubmissionStatus::Accepted)
        .score(100)
        .build()
}

/// Wrong answer at `minute`
pub fn wrong(
    id: u64,
    contest: &Contest,
    problem_id: ProblemId,
    user: UserId,
    minute: i64,
) -> SubmissionRecord {
    SubmissionBuilder::new(id, contest, problem_id, user)
        .at_minute(minute)
        .status(SubmissionStatus::WrongAnswer)
        .score(0)
        .build()
}

/// Scored (OI/IOI) submission at `minute`
pub fn scored(
    id: u64,
    contest: &Contest,
    problem_id: ProblemId,
    user: UserId,
    minute: i64,
    score: u32,
) -> SubmissionRecord {
    let status = if score == 100 {
        SubmissionStatus::Accepted
    } else {
        SubmissionStatus::PartiallyCorrect
    };
    SubmissionBuilder::new(id, contest, problem_id, user)
        .at_minute(minute)
        .status(status)
        .score(score)
        .build()
}

/// Service over an in-memory data source and store
pub fn create_test_service(
    policy: RatingPolicy,
) -> (Arc<InMemoryContestDataSource>, ContestRatingService) {
    let source = Arc::new(InMemoryContestDataSource::new());
    let service = ContestRatingService::new(
        source.clone(),
        Arc::new(InMemoryRatingStore::default()),
        RatingEngine::new(policy),
        Arc::new(MetricsCollector::new().unwrap()),
    );
    (source, service)
}

/// Data source that counts contest lookups and can be switched off
#[derive(Debug, Default)]
pub struct CountingDataSource {
    inner: InMemoryContestDataSource,
    contest_lookups: AtomicUsize,
    unavailable: std::sync::atomic::AtomicBool,
}

impl CountingDataSource {
    pub fn new(inner: InMemoryContestDataSource) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    pub fn contest_lookups(&self) -> usize {
        self.contest_lookups.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StandingsError::StorageError {
                message: "judge database unavailable".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl ContestDataSource for CountingDataSource {
    async fn get_contest(&self, contest_id: ContestId) -> Result<Option<Contest>> {
        self.check_available()?;
        self.contest_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_contest(contest_id).await
    }

    async fn get_contest_problems(&self, contest_id: ContestId) -> Result<Vec<ProblemId>> {
        self.check_available()?;
        self.inner.get_contest_problems(contest_id).await
    }

    async fn get_eligible_submissions(&self, contest: &Contest) -> Result<Vec<SubmissionRecord>> {
        self.check_available()?;
        self.inner.get_eligible_submissions(contest).await
    }
}

//! Contest rating orchestration
//!
//! [`ContestRatingService`] ties the pieces together: it reads contest input
//! from a [`ContestDataSource`], builds the ranklist, runs the rating engine and
//! commits the results to a [`RatingStore`]. Recalculation requests reset the
//! store from the target contest onwards and re-rate every affected contest in
//! order.

use crate::error::{Result, StandingsError};
use crate::metrics::MetricsCollector;
use crate::ranklist::build_ranklist_outcome;
use crate::rating::{reset_ratings_from, ContestKey, RatingEngine, RatingStore};
use crate::service::provider::ContestDataSource;
use crate::types::{
    Contest, ContestId, RanklistEntry, RatingChangeRecord, RatingParticipant, RatingTrigger,
    UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of handling a [`RatingTrigger`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalculationReport {
    pub contest_id: ContestId,
    pub recalculate: bool,
    /// Contests rated, in the order they were processed
    pub rated_contests: Vec<ContestId>,
    /// Contests in the cascade that had not ended yet
    pub skipped_contests: Vec<ContestId>,
    /// Users whose ratings were reset before re-rating
    pub affected_users: Vec<UserId>,
    /// Rating change records written, in commit order
    pub records: Vec<RatingChangeRecord>,
}

/// Orchestrates ranklists and ratings for contests
pub struct ContestRatingService {
    data_source: Arc<dyn ContestDataSource>,
    store: Arc<dyn RatingStore>,
    engine: RatingEngine,
    metrics: Arc<MetricsCollector>,
}

impl ContestRatingService {
    /// Create a new service
    pub fn new(
        data_source: Arc<dyn ContestDataSource>,
        store: Arc<dyn RatingStore>,
        engine: RatingEngine,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            data_source,
            store,
            engine,
            metrics,
        }
    }

    /// Get the rating store
    pub fn store(&self) -> Arc<dyn RatingStore> {
        self.store.clone()
    }

    /// Get the metrics collector
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Build the ranklist of a contest as seen at `now`
    pub async fn ranklist(
        &self,
        contest_id: ContestId,
        now: DateTime<Utc>,
    ) -> Result<Vec<RanklistEntry>> {
        let contest = self.fetch_contest(contest_id).await?;
        self.build_ranklist(&contest, now).await
    }

    /// Rate a single contest and commit the results
    ///
    /// Prior ratings are read as of before the contest, so running this twice
    /// on unchanged input writes identical records.
    pub async fn calculate_contest_ratings(
        &self,
        contest_id: ContestId,
        now: DateTime<Utc>,
    ) -> Result<Vec<RatingChangeRecord>> {
        let contest = self.fetch_contest(contest_id).await?;
        self.rate_contest(&contest, now).await
    }

    /// Handle an admin rating request
    pub async fn handle_trigger(
        &self,
        trigger: RatingTrigger,
        now: DateTime<Utc>,
    ) -> Result<RecalculationReport> {
        info!(
            "Handling rating trigger for contest {} (recalculate: {})",
            trigger.contest_id, trigger.recalculate
        );

        let mut report = RecalculationReport {
            contest_id: trigger.contest_id,
            recalculate: trigger.recalculate,
            ..Default::default()
        };

        if !trigger.recalculate {
            let records = self.calculate_contest_ratings(trigger.contest_id, now).await?;
            report.rated_contests.push(trigger.contest_id);
            report.records = records;
            return Ok(report);
        }

        let contest = self.fetch_contest(trigger.contest_id).await?;
        ensure_ended(&contest, now)?;
        self.store
            .record_contest(ContestKey::new(contest.id, contest.end_time))?;

        let reset = reset_ratings_from(self.store.as_ref(), contest.id)?;
        report.affected_users = reset.affected_users;

        // Each contest consumes the ratings the previous one committed.
        // Later contests still running are skipped; the target has ended.
        for key in reset.worklist {
            let contest = self.fetch_contest(key.contest_id).await?;
            if !contest.has_ended(now) {
                warn!(
                    "Skipping contest {} during recalculation: it ends at {}",
                    contest.id, contest.end_time
                );
                report.skipped_contests.push(contest.id);
                continue;
            }

            let records = self.rate_contest(&contest, now).await?;
            report.rated_contests.push(contest.id);
            report.records.extend(records);
        }

        self.metrics.record_cascade(report.rated_contests.len());
        info!(
            "Recalculated {} contests from contest {} ({} skipped)",
            report.rated_contests.len(),
            trigger.contest_id,
            report.skipped_contests.len()
        );

        Ok(report)
    }

    /// A user's rating change records ordered by contest end
    pub fn rating_history(&self, user_id: UserId) -> Result<Vec<RatingChangeRecord>> {
        self.store.rating_history(user_id)
    }

    /// A user's current rating
    pub fn current_rating(&self, user_id: UserId) -> Result<i32> {
        self.store.current_rating(user_id)
    }

    async fn fetch_contest(&self, contest_id: ContestId) -> Result<Contest> {
        self.data_source
            .get_contest(contest_id)
            .await?
            .ok_or_else(|| StandingsError::ContestNotFound { contest_id }.into())
    }

    async fn build_ranklist(
        &self,
        contest: &Contest,
        now: DateTime<Utc>,
    ) -> Result<Vec<RanklistEntry>> {
        let problems = self.data_source.get_contest_problems(contest.id).await?;
        let submissions = self.data_source.get_eligible_submissions(contest).await?;

        let outcome = build_ranklist_outcome(contest, &problems, &submissions, now);
        self.metrics
            .record_ranklist_built(contest.contest_type, outcome.dropped_submissions);

        Ok(outcome.entries)
    }

    async fn rate_contest(
        &self,
        contest: &Contest,
        now: DateTime<Utc>,
    ) -> Result<Vec<RatingChangeRecord>> {
        ensure_ended(contest, now)?;

        let key = ContestKey::new(contest.id, contest.end_time);
        let ranklist = self.build_ranklist(contest, now).await?;
        let participants = self.participants(&ranklist, key)?;

        let timer = self.metrics.start_timer();
        let changes = self
            .engine
            .calculate_rating_changes(contest, &participants, now)?;
        self.metrics
            .record_rating_calculation(self.engine.policy(), changes.len(), timer.stop());

        let participant_count = changes.len() as u32;
        let records: Vec<RatingChangeRecord> = changes
            .iter()
            .map(|change| RatingChangeRecord::from_change(contest.id, change, participant_count, now))
            .collect();

        self.store.commit_contest_ratings(key, records.clone())?;
        info!(
            "Committed {} rating changes for contest {}",
            records.len(),
            contest.id
        );

        Ok(records)
    }

    fn participants(
        &self,
        ranklist: &[RanklistEntry],
        key: ContestKey,
    ) -> Result<Vec<RatingParticipant>> {
        let participants = ranklist
            .iter()
            .map(|entry| {
                Ok(RatingParticipant {
                    user_id: entry.user_id,
                    rank: entry.rank,
                    old_rating: self.store.prior_rating(entry.user_id, key)?,
                    prior_contest_count: self.store.prior_contest_count(entry.user_id, key)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Contest {} has {} rated participants",
            key.contest_id,
            participants.len()
        );
        Ok(participants)
    }
}

fn ensure_ended(contest: &Contest, now: DateTime<Utc>) -> Result<()> {
    if !contest.has_ended(now) {
        return Err(StandingsError::ContestNotEnded {
            contest_id: contest.id,
            end_time: contest.end_time,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::{InMemoryRatingStore, RatingPolicy};
    use crate::service::provider::{InMemoryContestDataSource, MockContestDataSource};
    use crate::types::{ContestType, SubmissionRecord, SubmissionStatus};
    use chrono::{Duration, TimeZone};

    fn contest(id: ContestId, day: i64) -> Contest {
        let start_time = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap() + Duration::days(day);
        Contest {
            id,
            title: format!("Round {}", id),
            start_time,
            end_time: start_time + Duration::hours(2),
            contest_type: ContestType::Acm,
            problem_ids: vec![1],
        }
    }

    fn accepted(id: u64, contest: &Contest, user: UserId, minute: i64) -> SubmissionRecord {
        SubmissionRecord {
            id,
            contest_id: contest.id,
            problem_id: 1,
            submitter_id: user,
            status: SubmissionStatus::Accepted,
            score: Some(100),
            submit_time: contest.start_time + Duration::minutes(minute),
        }
    }

    fn after_all() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()
    }

    /// Two contests where user 1 beats user 2 both times
    fn two_contest_service() -> (Arc<InMemoryContestDataSource>, ContestRatingService) {
        let source = Arc::new(InMemoryContestDataSource::new());
        let a = contest(1, 0);
        let b = contest(2, 1);
        source.add_contest(a.clone()).unwrap();
        source.add_contest(b.clone()).unwrap();
        source
            .upsert_submissions(vec![
                accepted(1, &a, 1, 10),
                accepted(2, &a, 2, 20),
                accepted(3, &b, 1, 10),
                accepted(4, &b, 2, 20),
            ])
            .unwrap();

        let service = ContestRatingService::new(
            source.clone(),
            Arc::new(InMemoryRatingStore::default()),
            RatingEngine::new(RatingPolicy::Simple),
            Arc::new(MetricsCollector::new().unwrap()),
        );
        (source, service)
    }

    #[tokio::test]
    async fn test_rate_single_contest() {
        let (_, service) = two_contest_service();

        let records = service
            .calculate_contest_ratings(1, after_all())
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].user_id, 1);
        assert_eq!(records[0].delta, 96);
        assert_eq!(records[1].delta, -98);
        assert!(records.iter().all(|r| r.participant_count == 2));
        assert_eq!(service.current_rating(1).unwrap(), 1596);
        assert_eq!(service.current_rating(2).unwrap(), 1402);
    }

    #[tokio::test]
    async fn test_refuses_running_contest() {
        let (_, service) = two_contest_service();
        let during = contest(1, 0).start_time + Duration::minutes(30);

        let err = service
            .calculate_contest_ratings(1, during)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<StandingsError>(),
            Some(StandingsError::ContestNotEnded { contest_id: 1, .. })
        ));
        assert_eq!(service.current_rating(1).unwrap(), 1500);
    }

    #[tokio::test]
    async fn test_recalculation_refuses_running_target() {
        let (_, service) = two_contest_service();
        let first = contest(1, 0);
        let second = contest(2, 1);
        let between = second.start_time + Duration::minutes(30);

        service.calculate_contest_ratings(1, between).await.unwrap();
        service
            .store()
            .record_contest(ContestKey::new(2, second.end_time))
            .unwrap();

        let err = service
            .handle_trigger(
                RatingTrigger {
                    contest_id: 2,
                    recalculate: true,
                },
                between,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<StandingsError>(),
            Some(StandingsError::ContestNotEnded { contest_id: 2, .. })
        ));
        // Nothing was reset
        assert_eq!(service.rating_history(1).unwrap().len(), 1);
        assert_eq!(service.current_rating(1).unwrap(), 1596);
        assert!(first.has_ended(between));

        let during_first = first.start_time + Duration::minutes(30);
        let err = service
            .handle_trigger(
                RatingTrigger {
                    contest_id: 1,
                    recalculate: true,
                },
                during_first,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StandingsError>(),
            Some(StandingsError::ContestNotEnded { contest_id: 1, .. })
        ));
        assert_eq!(service.current_rating(1).unwrap(), 1596);
    }

    #[tokio::test]
    async fn test_rerating_is_idempotent() {
        let (_, service) = two_contest_service();

        let first = service
            .calculate_contest_ratings(1, after_all())
            .await
            .unwrap();
        let second = service
            .calculate_contest_ratings(1, after_all())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(service.rating_history(1).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recalculation_after_rejudge() {
        let (source, service) = two_contest_service();
        let now = after_all();

        service.calculate_contest_ratings(1, now).await.unwrap();
        service.calculate_contest_ratings(2, now).await.unwrap();
        assert_eq!(service.current_rating(1).unwrap(), 1670);
        assert_eq!(service.current_rating(2).unwrap(), 1326);

        // User 1's accepted run in the first contest is rejudged
        let mut rejudged = accepted(1, &contest(1, 0), 1, 10);
        rejudged.status = SubmissionStatus::WrongAnswer;
        source.upsert_submission(rejudged).unwrap();

        let report = service
            .handle_trigger(
                RatingTrigger {
                    contest_id: 1,
                    recalculate: true,
                },
                now,
            )
            .await
            .unwrap();

        assert_eq!(report.rated_contests, vec![1, 2]);
        assert!(report.skipped_contests.is_empty());
        assert_eq!(report.affected_users, vec![1, 2]);
        assert_eq!(report.records.len(), 4);

        // Contest 1: user 2 wins from equal ratings; contest 2 starts from there
        let history = service.rating_history(1).unwrap();
        assert_eq!(history[0].new_rating, 1402);
        assert_eq!(history[1].old_rating, 1402);
        assert_eq!(service.current_rating(1).unwrap(), 1544);
        assert_eq!(service.current_rating(2).unwrap(), 1452);

        let rerun = service
            .handle_trigger(
                RatingTrigger {
                    contest_id: 1,
                    recalculate: true,
                },
                now,
            )
            .await
            .unwrap();
        assert_eq!(rerun.records, report.records);
        assert_eq!(service.rating_history(1).unwrap(), history);
    }

    #[tokio::test]
    async fn test_recalculation_skips_running_contest() {
        let (_, service) = two_contest_service();
        let between = contest(2, 1).start_time + Duration::minutes(30);

        service.calculate_contest_ratings(1, between).await.unwrap();
        // Register the running contest so the cascade reaches it
        service
            .store()
            .record_contest(ContestKey::new(2, contest(2, 1).end_time))
            .unwrap();

        let report = service
            .handle_trigger(
                RatingTrigger {
                    contest_id: 1,
                    recalculate: true,
                },
                between,
            )
            .await
            .unwrap();

        assert_eq!(report.rated_contests, vec![1]);
        assert_eq!(report.skipped_contests, vec![2]);
        assert_eq!(service.current_rating(1).unwrap(), 1596);
    }

    #[tokio::test]
    async fn test_unknown_contest() {
        let mut source = MockContestDataSource::new();
        source.expect_get_contest().returning(|_| Ok(None));

        let service = ContestRatingService::new(
            Arc::new(source),
            Arc::new(InMemoryRatingStore::default()),
            RatingEngine::default(),
            Arc::new(MetricsCollector::new().unwrap()),
        );

        let err = service
            .handle_trigger(
                RatingTrigger {
                    contest_id: 42,
                    recalculate: false,
                },
                after_all(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<StandingsError>(),
            Some(StandingsError::ContestNotFound { contest_id: 42 })
        ));
    }

    #[tokio::test]
    async fn test_ranklist_records_metrics() {
        let (_, service) = two_contest_service();

        let ranklist = service.ranklist(1, after_all()).await.unwrap();

        assert_eq!(ranklist.len(), 2);
        assert_eq!(ranklist[0].user_id, 1);
        assert_eq!(
            service
                .metrics()
                .ranklist()
                .ranklists_built_total
                .with_label_values(&["acm"])
                .get(),
            1
        );
    }
}

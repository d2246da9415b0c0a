//! Rating storage interface and implementations
//!
//! This module defines the interface for persisting rating-change records and
//! users' current ratings, with an in-memory implementation. Every mutation of
//! the in-memory store happens under a single write lock and leaves each
//! affected user's current rating equal to the `new_rating` of their latest
//! record (by contest end time, then contest id), or the baseline if none.

use crate::error::{Result, StandingsError};
use crate::types::{ContestId, RatingChangeRecord, UserId, DEFAULT_RATING};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Position of a contest in rating history: end time, then id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContestKey {
    pub end_time: DateTime<Utc>,
    pub contest_id: ContestId,
}

impl ContestKey {
    pub fn new(contest_id: ContestId, end_time: DateTime<Utc>) -> Self {
        Self {
            end_time,
            contest_id,
        }
    }
}

/// Trait for rating storage operations
#[cfg_attr(test, mockall::automock)]
pub trait RatingStore: Send + Sync {
    /// Rating of a user without any record
    fn baseline_rating(&self) -> i32;

    /// Make a contest known to the store so its records can be ordered
    fn record_contest(&self, key: ContestKey) -> Result<()>;

    /// Ordering key of a known contest
    fn contest_key(&self, contest_id: ContestId) -> Result<Option<ContestKey>>;

    /// Known contests ending at or after `time`, ordered by (end time, id)
    fn find_contests_ending_at_or_after(&self, time: DateTime<Utc>) -> Result<Vec<ContestKey>>;

    /// A user's current rating
    fn current_rating(&self, user_id: UserId) -> Result<i32>;

    /// Rating a user held before the contest at `before`
    fn prior_rating(&self, user_id: UserId, before: ContestKey) -> Result<i32>;

    /// Rated contests a user took part in before the contest at `before`
    fn prior_contest_count(&self, user_id: UserId, before: ContestKey) -> Result<u32>;

    /// Insert or overwrite the record of one (contest, user) pair
    fn upsert_rating_change(&self, record: RatingChangeRecord) -> Result<()>;

    /// Upsert all records of one contest as a single atomic unit
    fn commit_contest_ratings(
        &self,
        key: ContestKey,
        records: Vec<RatingChangeRecord>,
    ) -> Result<()>;

    /// Delete every record of `contest_ids`, returning the affected users
    ///
    /// Implementations need not update current ratings here; callers reset
    /// affected users through [`RatingStore::set_user_rating`].
    fn delete_rating_changes_for_contests(&self, contest_ids: &[ContestId])
        -> Result<Vec<UserId>>;

    /// Overwrite a user's current rating
    fn set_user_rating(&self, user_id: UserId, rating: i32) -> Result<()>;

    /// A user's most recent record
    fn latest_rating_change(&self, user_id: UserId) -> Result<Option<RatingChangeRecord>>;

    /// All records of a user, oldest contest first
    fn rating_history(&self, user_id: UserId) -> Result<Vec<RatingChangeRecord>>;
}

#[derive(Debug, Default)]
struct StoreState {
    contests: HashMap<ContestId, ContestKey>,
    records: HashMap<(ContestId, UserId), RatingChangeRecord>,
    ratings: HashMap<UserId, i32>,
}

impl StoreState {
    /// Records of `user_id` ordered by their contest's key
    ///
    /// Every stored record belongs to a registered contest; `insert_record`
    /// refuses the rest.
    fn history(&self, user_id: UserId, before: Option<ContestKey>) -> Vec<&RatingChangeRecord> {
        let mut history: Vec<(ContestKey, &RatingChangeRecord)> = self
            .records
            .values()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| self.contests.get(&r.contest_id).map(|key| (*key, r)))
            .filter(|(key, _)| before.map_or(true, |before| *key < before))
            .collect();
        history.sort_by_key(|(key, _)| *key);
        history.into_iter().map(|(_, r)| r).collect()
    }

    fn latest(&self, user_id: UserId, before: Option<ContestKey>) -> Option<&RatingChangeRecord> {
        self.history(user_id, before).pop()
    }

    fn resync(&mut self, user_id: UserId, baseline: i32) {
        let rating = self
            .latest(user_id, None)
            .map(|r| r.new_rating)
            .unwrap_or(baseline);
        self.ratings.insert(user_id, rating);
    }

    fn insert_record(&mut self, record: RatingChangeRecord) -> Result<()> {
        if !self.contests.contains_key(&record.contest_id) {
            return Err(StandingsError::StorageError {
                message: format!("Contest {} is not registered", record.contest_id),
            }
            .into());
        }
        self.records
            .insert((record.contest_id, record.user_id), record);
        Ok(())
    }
}

/// In-memory rating storage implementation
#[derive(Debug)]
pub struct InMemoryRatingStore {
    state: RwLock<StoreState>,
    baseline: i32,
}

impl InMemoryRatingStore {
    /// Create a new in-memory store with `baseline` as the default rating
    pub fn new(baseline: i32) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            baseline,
        }
    }

    /// Number of stored records (for admin/debugging)
    pub fn record_count(&self) -> Result<usize> {
        Ok(self.read()?.records.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>> {
        self.state.read().map_err(|_| {
            StandingsError::StorageError {
                message: "Failed to acquire rating store read lock".to_string(),
            }
            .into()
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>> {
        self.state.write().map_err(|_| {
            StandingsError::StorageError {
                message: "Failed to acquire rating store write lock".to_string(),
            }
            .into()
        })
    }
}

impl Default for InMemoryRatingStore {
    fn default() -> Self {
        Self::new(DEFAULT_RATING)
    }
}

impl RatingStore for InMemoryRatingStore {
    fn baseline_rating(&self) -> i32 {
        self.baseline
    }

    fn record_contest(&self, key: ContestKey) -> Result<()> {
        let mut state = self.write()?;
        let previous = state.contests.insert(key.contest_id, key);

        // A moved end time can reorder history
        if previous.is_some_and(|previous| previous != key) {
            let users: Vec<UserId> = state
                .records
                .keys()
                .filter(|(contest_id, _)| *contest_id == key.contest_id)
                .map(|(_, user_id)| *user_id)
                .collect();
            for user_id in users {
                state.resync(user_id, self.baseline);
            }
        }
        Ok(())
    }

    fn contest_key(&self, contest_id: ContestId) -> Result<Option<ContestKey>> {
        Ok(self.read()?.contests.get(&contest_id).copied())
    }

    fn find_contests_ending_at_or_after(&self, time: DateTime<Utc>) -> Result<Vec<ContestKey>> {
        let state = self.read()?;
        let ordered: BTreeSet<ContestKey> = state
            .contests
            .values()
            .filter(|key| key.end_time >= time)
            .copied()
            .collect();
        Ok(ordered.into_iter().collect())
    }

    fn current_rating(&self, user_id: UserId) -> Result<i32> {
        Ok(self
            .read()?
            .ratings
            .get(&user_id)
            .copied()
            .unwrap_or(self.baseline))
    }

    fn prior_rating(&self, user_id: UserId, before: ContestKey) -> Result<i32> {
        Ok(self
            .read()?
            .latest(user_id, Some(before))
            .map(|r| r.new_rating)
            .unwrap_or(self.baseline))
    }

    fn prior_contest_count(&self, user_id: UserId, before: ContestKey) -> Result<u32> {
        Ok(self.read()?.history(user_id, Some(before)).len() as u32)
    }

    fn upsert_rating_change(&self, record: RatingChangeRecord) -> Result<()> {
        let mut state = self.write()?;
        let user_id = record.user_id;
        state.insert_record(record)?;
        state.resync(user_id, self.baseline);
        Ok(())
    }

    fn commit_contest_ratings(
        &self,
        key: ContestKey,
        records: Vec<RatingChangeRecord>,
    ) -> Result<()> {
        if let Some(stray) = records.iter().find(|r| r.contest_id != key.contest_id) {
            return Err(StandingsError::StorageError {
                message: format!(
                    "Record for contest {} committed with contest {}",
                    stray.contest_id, key.contest_id
                ),
            }
            .into());
        }

        let mut state = self.write()?;
        state.contests.insert(key.contest_id, key);

        let users: Vec<UserId> = records.iter().map(|r| r.user_id).collect();
        for record in records {
            state.insert_record(record)?;
        }
        for user_id in users {
            state.resync(user_id, self.baseline);
        }
        Ok(())
    }

    fn delete_rating_changes_for_contests(
        &self,
        contest_ids: &[ContestId],
    ) -> Result<Vec<UserId>> {
        let mut state = self.write()?;

        let doomed: Vec<(ContestId, UserId)> = state
            .records
            .keys()
            .filter(|(contest_id, _)| contest_ids.contains(contest_id))
            .copied()
            .collect();

        let mut affected: BTreeSet<UserId> = BTreeSet::new();
        for key in doomed {
            state.records.remove(&key);
            affected.insert(key.1);
        }
        for &user_id in &affected {
            state.resync(user_id, self.baseline);
        }

        Ok(affected.into_iter().collect())
    }

    fn set_user_rating(&self, user_id: UserId, rating: i32) -> Result<()> {
        let mut state = self.write()?;
        state.ratings.insert(user_id, rating);
        Ok(())
    }

    fn latest_rating_change(&self, user_id: UserId) -> Result<Option<RatingChangeRecord>> {
        Ok(self.read()?.latest(user_id, None).cloned())
    }

    fn rating_history(&self, user_id: UserId) -> Result<Vec<RatingChangeRecord>> {
        Ok(self
            .read()?
            .history(user_id, None)
            .into_iter()
            .cloned()
            .collect())
    }
}

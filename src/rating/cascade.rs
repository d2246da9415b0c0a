//! Reset primitive of the rating recalculation cascade
//!
//! When the standings of a contest change after ratings were computed, every
//! rating from that contest onwards is stale. [`reset_ratings_from`] removes
//! them and rolls affected users back; re-rating the returned worklist, strictly
//! in order, is the caller's job since each contest consumes the ratings the
//! previous one produced.

use crate::error::{Result, StandingsError};
use crate::rating::storage::{ContestKey, RatingStore};
use crate::types::{ContestId, UserId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of a cascade reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReset {
    /// Contests to re-rate, ordered by (end time, id)
    pub worklist: Vec<ContestKey>,
    /// Users whose records were deleted
    pub affected_users: Vec<UserId>,
}

/// Delete ratings of `contest_id` and every contest ending at or after it
pub fn reset_ratings_from(store: &dyn RatingStore, contest_id: ContestId) -> Result<CascadeReset> {
    let target = store
        .contest_key(contest_id)?
        .ok_or(StandingsError::ContestNotFound { contest_id })?;

    let worklist = store.find_contests_ending_at_or_after(target.end_time)?;
    let contest_ids: Vec<ContestId> = worklist.iter().map(|key| key.contest_id).collect();
    debug!("Cascade from contest {} covers {:?}", contest_id, contest_ids);

    let affected_users = store.delete_rating_changes_for_contests(&contest_ids)?;

    // Deletes leave current ratings to the caller
    for &user_id in &affected_users {
        let rating = store
            .latest_rating_change(user_id)?
            .map(|record| record.new_rating)
            .unwrap_or_else(|| store.baseline_rating());
        store.set_user_rating(user_id, rating)?;
    }

    info!(
        "Reset ratings from contest {}: {} contests, {} users affected",
        contest_id,
        worklist.len(),
        affected_users.len()
    );

    Ok(CascadeReset {
        worklist,
        affected_users,
    })
}

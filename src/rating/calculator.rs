//! Rating calculator trait and the engine that guards it
//!
//! This module defines the interface for rating calculations and the
//! [`RatingEngine`] wrapper that enforces the preconditions every calculation
//! shares: the contest must be over and the participant list must be a
//! finalized ranklist.

use crate::error::{Result, StandingsError};
use crate::rating::policy::RatingPolicy;
use crate::rating::seed::SeedRatingCalculator;
use crate::types::{Contest, RatingChange, RatingParticipant};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

/// Trait for calculating rating changes from a finalized ranklist
#[cfg_attr(test, mockall::automock)]
pub trait RatingCalculator: Send + Sync {
    /// Calculate rating changes for participants of one contest
    ///
    /// # Arguments
    /// * `participants` - One entry per participant with rank (1 = first place),
    ///   prior rating and prior rated-contest count
    ///
    /// # Returns
    /// Rating changes ordered by rank
    fn calculate_rating_changes(
        &self,
        participants: &[RatingParticipant],
    ) -> Result<Vec<RatingChange>>;

    /// Policy the calculator applies
    fn policy(&self) -> RatingPolicy;
}

/// Entry point of the rating subsystem
pub struct RatingEngine {
    calculator: Box<dyn RatingCalculator>,
}

impl RatingEngine {
    /// Create an engine using the seed method with `policy`
    pub fn new(policy: RatingPolicy) -> Self {
        Self::with_calculator(Box::new(SeedRatingCalculator::new(policy)))
    }

    /// Create an engine around a custom calculator
    pub fn with_calculator(calculator: Box<dyn RatingCalculator>) -> Self {
        Self { calculator }
    }

    /// Policy of the wrapped calculator
    pub fn policy(&self) -> RatingPolicy {
        self.calculator.policy()
    }

    /// Calculate rating changes for `contest`
    ///
    /// Fails with [`StandingsError::ContestNotEnded`] until the contest end has
    /// passed, the same instant OI scores are revealed.
    /// An empty participant list yields an empty result.
    pub fn calculate_rating_changes(
        &self,
        contest: &Contest,
        participants: &[RatingParticipant],
        now: DateTime<Utc>,
    ) -> Result<Vec<RatingChange>> {
        if !contest.has_ended(now) {
            return Err(StandingsError::ContestNotEnded {
                contest_id: contest.id,
                end_time: contest.end_time,
            }
            .into());
        }

        if participants.is_empty() {
            debug!("Contest {} has no participants, nothing to rate", contest.id);
            return Ok(Vec::new());
        }

        validate_participants(participants)?;

        let changes = self.calculator.calculate_rating_changes(participants)?;
        debug!(
            "Calculated {} rating changes for contest {} with {} policy",
            changes.len(),
            contest.id,
            self.calculator.policy()
        );
        Ok(changes)
    }
}

impl Default for RatingEngine {
    fn default() -> Self {
        Self::new(RatingPolicy::default())
    }
}

fn validate_participants(participants: &[RatingParticipant]) -> Result<()> {
    let mut seen = HashSet::with_capacity(participants.len());
    for participant in participants {
        if participant.rank == 0 {
            return Err(StandingsError::InvalidParticipants {
                reason: format!("User {} has no rank", participant.user_id),
            }
            .into());
        }
        if !seen.insert(participant.user_id) {
            return Err(StandingsError::InvalidParticipants {
                reason: format!("User {} appears more than once", participant.user_id),
            }
            .into());
        }
    }
    Ok(())
}

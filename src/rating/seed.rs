//! Seed-method (Codeforces style) rating calculator
//!
//! Each participant's expected rank ("seed") is derived from Elo win
//! probabilities against everyone else. The geometric mean of seed and actual
//! rank is inverted back into the rating that would have produced it, and half
//! the distance to that rating becomes the raw delta. The configured
//! [`RatingPolicy`] then applies its zero-sum correction and newcomer bonus.

use crate::error::Result;
use crate::rating::calculator::RatingCalculator;
use crate::rating::policy::RatingPolicy;
use crate::types::{RatingChange, RatingParticipant};
use crate::utils::round_half_up;
use serde::{Deserialize, Serialize};
use skillratings::elo::{expected_score, EloRating};

/// Lower bound of the needed-rating search
pub const RATING_SEARCH_MIN: f64 = -10000.0;

/// Upper bound of the needed-rating search
pub const RATING_SEARCH_MAX: f64 = 10000.0;

/// Bisection steps; the interval shrinks far below one rating point
pub const RATING_SEARCH_ITERATIONS: usize = 100;

/// Probability that a player rated `rating_a` beats one rated `rating_b`
pub fn win_probability(rating_a: f64, rating_b: f64) -> f64 {
    let (win, _) = expected_score(
        &EloRating { rating: rating_a },
        &EloRating { rating: rating_b },
    );
    win
}

/// Expected rank of a player rated `rating` among `ratings`, skipping index `own`
pub fn seed(rating: f64, ratings: &[f64], own: usize) -> f64 {
    1.0 + ratings
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != own)
        .map(|(_, &opponent)| win_probability(opponent, rating))
        .sum::<f64>()
}

/// Rating at which the player at index `own` would have seed `target`
///
/// Seed decreases monotonically with the player's own rating, so bisection
/// finds the unique crossing.
pub fn rating_for_seed(ratings: &[f64], own: usize, target: f64) -> f64 {
    let mut low = RATING_SEARCH_MIN;
    let mut high = RATING_SEARCH_MAX;

    for _ in 0..RATING_SEARCH_ITERATIONS {
        let mid = (low + high) / 2.0;
        if seed(mid, ratings, own) < target {
            high = mid;
        } else {
            low = mid;
        }
    }

    (low + high) / 2.0
}

/// Configuration for the seed-method calculator
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SeedRatingConfig {
    pub policy: RatingPolicy,
}

/// Seed-method rating calculator
#[derive(Debug, Clone, Default)]
pub struct SeedRatingCalculator {
    config: SeedRatingConfig,
}

impl SeedRatingCalculator {
    /// Create a calculator applying `policy`
    pub fn new(policy: RatingPolicy) -> Self {
        Self {
            config: SeedRatingConfig { policy },
        }
    }

    /// Raw (uncorrected) deltas for participants already sorted by rank
    pub fn raw_deltas(&self, ranked: &[&RatingParticipant]) -> Vec<f64> {
        let ratings: Vec<f64> = ranked.iter().map(|p| f64::from(p.old_rating)).collect();

        ranked
            .iter()
            .enumerate()
            .map(|(i, participant)| {
                let expected = seed(ratings[i], &ratings, i);
                let mid_rank = (expected * f64::from(participant.rank)).sqrt();
                let needed = rating_for_seed(&ratings, i, mid_rank);
                (needed - ratings[i]) / 2.0
            })
            .collect()
    }
}

impl RatingCalculator for SeedRatingCalculator {
    fn calculate_rating_changes(
        &self,
        participants: &[RatingParticipant],
    ) -> Result<Vec<RatingChange>> {
        if participants.is_empty() {
            return Ok(Vec::new());
        }

        let mut ranked: Vec<&RatingParticipant> = participants.iter().collect();
        ranked.sort_by_key(|p| p.rank);

        let raw = self.raw_deltas(&ranked);
        let policy = self.config.policy;
        let inc = policy.correction(&raw);

        let changes = ranked
            .iter()
            .zip(raw)
            .map(|(participant, raw_delta)| {
                let delta = round_half_up(raw_delta + inc);
                let bonus = policy.new_participant_bonus(participant.prior_contest_count);
                let new_rating = (participant.old_rating + delta + bonus).max(0);

                RatingChange {
                    user_id: participant.user_id,
                    old_rating: participant.old_rating,
                    new_rating,
                    delta: new_rating - participant.old_rating,
                    rank: participant.rank,
                }
            })
            .collect();

        Ok(changes)
    }

    fn policy(&self) -> RatingPolicy {
        self.config.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(user_id: u64, rank: u32, old_rating: i32, prior: u32) -> RatingParticipant {
        RatingParticipant {
            user_id,
            rank,
            old_rating,
            prior_contest_count: prior,
        }
    }

    #[test]
    fn test_win_probability() {
        assert!((win_probability(1500.0, 1500.0) - 0.5).abs() < 1e-12);
        // 400 points ahead: 10 to 1 odds
        assert!((win_probability(1900.0, 1500.0) - 10.0 / 11.0).abs() < 1e-9);
        assert!((win_probability(1500.0, 1900.0) - 1.0 / 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_seed_of_equal_field() {
        let ratings = vec![1500.0; 5];
        assert!((seed(1500.0, &ratings, 0) - 3.0).abs() < 1e-12);
        assert_eq!(seed(1500.0, &[1500.0], 0), 1.0);
    }

    #[test]
    fn test_rating_for_seed_inverts_seed() {
        let ratings = vec![1800.0, 1650.0, 1500.0, 1320.0];
        let target = 2.2;
        let rating = rating_for_seed(&ratings, 2, target);
        assert!((seed(rating, &ratings, 2) - target).abs() < 1e-6);
    }

    #[test]
    fn test_single_participant_only_deflates() {
        let calculator = SeedRatingCalculator::new(RatingPolicy::Simple);
        let changes = calculator
            .calculate_rating_changes(&[participant(1, 1, 1500, 10)])
            .unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].delta, -1);
        assert_eq!(changes[0].new_rating, 1499);

        let weighted = SeedRatingCalculator::new(RatingPolicy::TopWeighted)
            .calculate_rating_changes(&[participant(1, 1, 1500, 10)])
            .unwrap();
        assert_eq!(weighted[0].delta, -1);
    }

    #[test]
    fn test_equal_ratings_winner_gains_loser_drops() {
        let calculator = SeedRatingCalculator::new(RatingPolicy::Simple);
        let changes = calculator
            .calculate_rating_changes(&[
                participant(2, 2, 1500, 10),
                participant(1, 1, 1500, 10),
            ])
            .unwrap();

        // Output is ordered by rank
        assert_eq!(changes[0].user_id, 1);
        assert!(changes[0].delta > 0);
        assert!(changes[1].delta < 0);
        let sum: i32 = changes.iter().map(|c| c.delta).sum();
        assert!((-3..=-1).contains(&sum));
    }

    #[test]
    fn test_upset_moves_more_than_expected_result() {
        let calculator = SeedRatingCalculator::new(RatingPolicy::Simple);
        let expected = calculator
            .calculate_rating_changes(&[participant(1, 1, 1900, 10), participant(2, 2, 1400, 10)])
            .unwrap();
        let upset = calculator
            .calculate_rating_changes(&[participant(1, 2, 1900, 10), participant(2, 1, 1400, 10)])
            .unwrap();

        let favourite_win = expected.iter().find(|c| c.user_id == 1).unwrap().delta;
        let underdog_win = upset.iter().find(|c| c.user_id == 2).unwrap().delta;
        assert!(underdog_win > favourite_win);
    }

    #[test]
    fn test_new_participant_bonus_only_with_top_weighted() {
        let field = [participant(1, 1, 1500, 0), participant(2, 2, 1500, 10)];

        let simple = SeedRatingCalculator::new(RatingPolicy::Simple)
            .calculate_rating_changes(&field)
            .unwrap();
        let weighted = SeedRatingCalculator::new(RatingPolicy::TopWeighted)
            .calculate_rating_changes(&field)
            .unwrap();

        assert!(simple[0].delta < 500);
        assert!(weighted[0].delta >= 500 - 10);
        assert_eq!(weighted[0].new_rating - weighted[0].old_rating, weighted[0].delta);
        // The veteran gets no bonus
        assert!(weighted[1].delta < 0);
    }

    #[test]
    fn test_rating_never_negative() {
        let calculator = SeedRatingCalculator::new(RatingPolicy::Simple);
        let changes = calculator
            .calculate_rating_changes(&[
                participant(1, 1, 800, 10),
                participant(2, 2, 3, 10),
                participant(3, 3, 0, 10),
            ])
            .unwrap();

        assert!(changes.iter().all(|c| c.new_rating >= 0));
        let floored = changes.iter().find(|c| c.user_id == 3).unwrap();
        assert_eq!(floored.new_rating, 0);
        assert_eq!(floored.delta, 0);
    }
}

//! Zero-sum correction policies
//!
//! Two corrections are in use under the same "Codeforces rating" name and they
//! are not interchangeable: the simple one shifts every delta by one constant,
//! the top-weighted one additionally protects the top of the ranklist and gives
//! newcomers a bonus. The choice is a configuration value.

use crate::error::StandingsError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Target average delta per participant after correction
pub const DEFLATION_PER_PARTICIPANT: f64 = 1.0;

/// Bonus added to newcomers, indexed by their prior rated-contest count
pub const NEW_PARTICIPANT_BONUS: [i32; 6] = [500, 350, 250, 150, 100, 50];

/// Bounds of the second correction applied by the top-weighted policy
pub const TOP_CORRECTION_MIN: f64 = -10.0;
pub const TOP_CORRECTION_MAX: f64 = 0.0;

/// Rating policy used to turn raw deltas into final ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingPolicy {
    /// Single global shift, no newcomer bonus
    #[default]
    Simple,
    /// Global shift plus a bounded shift keeping the top group non-negative,
    /// with the newcomer bonus schedule
    TopWeighted,
}

impl RatingPolicy {
    /// Additive correction applied to every raw delta
    ///
    /// `raw_deltas` must be ordered by rank.
    pub fn correction(self, raw_deltas: &[f64]) -> f64 {
        let n = raw_deltas.len();
        if n == 0 {
            return 0.0;
        }

        let sum: f64 = raw_deltas.iter().sum();
        let inc = -sum / n as f64 - DEFLATION_PER_PARTICIPANT;

        match self {
            RatingPolicy::Simple => inc,
            RatingPolicy::TopWeighted => {
                let top = top_group_size(n);
                let top_sum: f64 = raw_deltas[..top].iter().map(|d| d + inc).sum();
                let extra = (-top_sum / top as f64).clamp(TOP_CORRECTION_MIN, TOP_CORRECTION_MAX);
                inc + extra
            }
        }
    }

    /// Newcomer bonus for a user with `prior_contest_count` rated contests
    pub fn new_participant_bonus(self, prior_contest_count: u32) -> i32 {
        match self {
            RatingPolicy::Simple => 0,
            RatingPolicy::TopWeighted => NEW_PARTICIPANT_BONUS
                .get(prior_contest_count as usize)
                .copied()
                .unwrap_or(0),
        }
    }
}

/// Size of the top group the top-weighted policy keeps non-negative
pub fn top_group_size(n: usize) -> usize {
    let size = (4.0 * (n as f64).sqrt()).ceil() as usize;
    size.min(n)
}

impl std::fmt::Display for RatingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RatingPolicy::Simple => write!(f, "simple"),
            RatingPolicy::TopWeighted => write!(f, "top_weighted"),
        }
    }
}

impl FromStr for RatingPolicy {
    type Err = StandingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "simple" => Ok(RatingPolicy::Simple),
            "top_weighted" => Ok(RatingPolicy::TopWeighted),
            _ => Err(StandingsError::ConfigurationError {
                message: format!("Unknown rating policy: {}", s),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_group_size() {
        assert_eq!(top_group_size(1), 1);
        assert_eq!(top_group_size(4), 4);
        assert_eq!(top_group_size(16), 16);
        assert_eq!(top_group_size(17), 17);
        // ceil(4 * sqrt(100)) = 40
        assert_eq!(top_group_size(100), 40);
        // ceil(4 * sqrt(30)) = ceil(21.9) = 22
        assert_eq!(top_group_size(30), 22);
    }

    #[test]
    fn test_simple_correction_targets_minus_one_average() {
        let raw = vec![30.0, 10.0, -5.0, -15.0];
        let inc = RatingPolicy::Simple.correction(&raw);
        let corrected: f64 = raw.iter().map(|d| d + inc).sum();
        assert!((corrected - -4.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_weighted_correction_is_bounded() {
        let raw: Vec<f64> = (0..50).map(|i| 100.0 - 4.0 * i as f64).collect();
        let simple = RatingPolicy::Simple.correction(&raw);
        let weighted = RatingPolicy::TopWeighted.correction(&raw);

        let extra = weighted - simple;
        assert!(extra <= TOP_CORRECTION_MAX);
        assert!(extra >= TOP_CORRECTION_MIN);
        // The top group gained on average, so the second shift pulls down
        assert!(extra < 0.0);
    }

    #[test]
    fn test_top_weighted_leaves_losing_top_alone() {
        // Top of the ranklist lost rating on average: clamp at 0
        let raw = vec![-50.0, -40.0, 60.0, 70.0, 80.0];
        let simple = RatingPolicy::Simple.correction(&raw);
        let weighted = RatingPolicy::TopWeighted.correction(&raw);
        assert_eq!(simple, weighted);
    }

    #[test]
    fn test_new_participant_bonus() {
        assert_eq!(RatingPolicy::Simple.new_participant_bonus(0), 0);
        assert_eq!(RatingPolicy::TopWeighted.new_participant_bonus(0), 500);
        assert_eq!(RatingPolicy::TopWeighted.new_participant_bonus(5), 50);
        assert_eq!(RatingPolicy::TopWeighted.new_participant_bonus(6), 0);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("simple".parse::<RatingPolicy>().unwrap(), RatingPolicy::Simple);
        assert_eq!(
            "Top-Weighted".parse::<RatingPolicy>().unwrap(),
            RatingPolicy::TopWeighted
        );
        assert!("elo".parse::<RatingPolicy>().is_err());
        assert_eq!(RatingPolicy::TopWeighted.to_string(), "top_weighted");
    }
}

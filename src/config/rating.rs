//! Rating system configuration

use crate::rating::RatingPolicy;
use crate::types::DEFAULT_RATING;
use serde::{Deserialize, Serialize};

/// Rating engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Zero-sum correction policy
    pub policy: RatingPolicy,
    /// Rating of users without any rated contest
    pub default_rating: i32,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            policy: RatingPolicy::Simple,
            default_rating: DEFAULT_RATING,
        }
    }
}

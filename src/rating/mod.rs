//! Rating system using the Codeforces-style seed method
//!
//! This module provides rating calculations, the configurable zero-sum policy,
//! storage interfaces and the reset primitive of the recalculation cascade.

pub mod calculator;
pub mod cascade;
pub mod policy;
pub mod seed;
pub mod storage;

// Re-export commonly used types
pub use calculator::{RatingCalculator, RatingEngine};
pub use cascade::{reset_ratings_from, CascadeReset};
pub use policy::RatingPolicy;
pub use seed::SeedRatingCalculator;
pub use storage::{ContestKey, InMemoryRatingStore, RatingStore};

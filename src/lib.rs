//! Contest Standings - Ranklists and ratings for an online judge
//!
//! This crate builds OI, IOI and ACM ranklists from judged submissions and
//! maintains Codeforces-style ratings, including recalculation after rejudges.

pub mod config;
pub mod error;
pub mod metrics;
pub mod ranklist;
pub mod rating;
pub mod service;
pub mod snapshot;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Result, StandingsError};
pub use types::*;

// Re-export key components
pub use ranklist::build_ranklist;
pub use rating::{RatingEngine, RatingPolicy, RatingStore};
pub use service::{ContestDataSource, ContestRatingService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

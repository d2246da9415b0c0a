//! Service layer for the contest-standings service
//!
//! This module contains the contest input interface and the orchestrator that
//! drives ranklists, rating calculations and recalculation cascades.

pub mod provider;
pub mod standings;

pub use provider::{ContestDataSource, InMemoryContestDataSource};
pub use standings::{ContestRatingService, RecalculationReport};

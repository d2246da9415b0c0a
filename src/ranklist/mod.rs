//! Contest ranklist construction
//!
//! This module turns a contest snapshot and its raw submission history into
//! ordered standings under the OI, IOI and ACM competition rules.

pub mod acm;
pub mod builder;
pub mod ioi;
pub mod oi;

// Re-export commonly used types
pub use builder::{build_ranklist, build_ranklist_outcome, ParticipantSubmissions, RanklistOutcome};

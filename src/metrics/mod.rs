//! Metrics for the contest-standings service
//!
//! Prometheus counters and histograms for ranklist builds, rating
//! calculations and recalculation cascades.

pub mod collector;

pub use collector::{MetricsCollector, MetricsTimer, RanklistMetrics, RatingMetrics};

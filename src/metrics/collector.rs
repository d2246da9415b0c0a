//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for ranklist builds and rating
//! calculations using Prometheus metrics.

use crate::rating::RatingPolicy;
use crate::types::ContestType;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the standings service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Ranklist-related metrics
    ranklist_metrics: RanklistMetrics,

    /// Rating-related metrics
    rating_metrics: RatingMetrics,
}

/// Ranklist-related metrics
#[derive(Clone)]
pub struct RanklistMetrics {
    /// Total ranklists built by contest type
    pub ranklists_built_total: IntCounterVec,

    /// Submissions dropped for falling outside the contest
    pub submissions_dropped_total: IntCounter,
}

/// Rating-related metrics
#[derive(Clone)]
pub struct RatingMetrics {
    /// Total rating calculations by policy
    pub rating_calculations_total: IntCounterVec,

    /// Total participants that received a rating change
    pub participants_rated_total: IntCounter,

    /// Total cascade resets
    pub cascade_resets_total: IntCounter,

    /// Total contests re-rated by a cascade
    pub contests_recalculated_total: IntCounter,

    /// Rating calculation time
    pub rating_calculation_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let ranklist_metrics = RanklistMetrics::new(&registry)?;
        let rating_metrics = RatingMetrics::new(&registry)?;

        Ok(Self {
            registry,
            ranklist_metrics,
            rating_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get ranklist metrics
    pub fn ranklist(&self) -> &RanklistMetrics {
        &self.ranklist_metrics
    }

    /// Get rating metrics
    pub fn rating(&self) -> &RatingMetrics {
        &self.rating_metrics
    }

    /// Record a ranklist build
    pub fn record_ranklist_built(&self, contest_type: ContestType, dropped_submissions: usize) {
        let contest_type_str = match contest_type {
            ContestType::Oi => "oi",
            ContestType::Ioi => "ioi",
            ContestType::Acm => "acm",
        };

        self.ranklist_metrics
            .ranklists_built_total
            .with_label_values(&[contest_type_str])
            .inc();

        self.ranklist_metrics
            .submissions_dropped_total
            .inc_by(dropped_submissions as u64);
    }

    /// Record a completed rating calculation
    pub fn record_rating_calculation(
        &self,
        policy: RatingPolicy,
        participants: usize,
        duration: Duration,
    ) {
        let policy_str = policy.to_string();

        self.rating_metrics
            .rating_calculations_total
            .with_label_values(&[policy_str.as_str()])
            .inc();

        self.rating_metrics
            .participants_rated_total
            .inc_by(participants as u64);

        self.rating_metrics
            .rating_calculation_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a cascade reset and the number of contests it re-rated
    pub fn record_cascade(&self, contests_recalculated: usize) {
        self.rating_metrics.cascade_resets_total.inc();
        self.rating_metrics
            .contests_recalculated_total
            .inc_by(contests_recalculated as u64);
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn encode_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl RanklistMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let ranklists_built_total = IntCounterVec::new(
            Opts::new(
                "contest_standings_ranklists_built_total",
                "Total ranklists built",
            ),
            &["contest_type"],
        )?;
        registry.register(Box::new(ranklists_built_total.clone()))?;

        let submissions_dropped_total = IntCounter::new(
            "contest_standings_submissions_dropped_total",
            "Submissions ignored because they fall outside the contest",
        )?;
        registry.register(Box::new(submissions_dropped_total.clone()))?;

        Ok(Self {
            ranklists_built_total,
            submissions_dropped_total,
        })
    }
}

impl RatingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let rating_calculations_total = IntCounterVec::new(
            Opts::new(
                "contest_standings_rating_calculations_total",
                "Total contest rating calculations",
            ),
            &["policy"],
        )?;
        registry.register(Box::new(rating_calculations_total.clone()))?;

        let participants_rated_total = IntCounter::new(
            "contest_standings_participants_rated_total",
            "Total participants that received a rating change",
        )?;
        registry.register(Box::new(participants_rated_total.clone()))?;

        let cascade_resets_total = IntCounter::new(
            "contest_standings_cascade_resets_total",
            "Total rating cascade resets",
        )?;
        registry.register(Box::new(cascade_resets_total.clone()))?;

        let contests_recalculated_total = IntCounter::new(
            "contest_standings_contests_recalculated_total",
            "Total contests re-rated by a cascade",
        )?;
        registry.register(Box::new(contests_recalculated_total.clone()))?;

        let rating_calculation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "contest_standings_rating_calculation_duration_seconds",
                "Rating calculation time",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(rating_calculation_duration.clone()))?;

        Ok(Self {
            rating_calculations_total,
            participants_rated_total,
            cascade_resets_total,
            contests_recalculated_total,
            rating_calculation_duration,
        })
    }
}

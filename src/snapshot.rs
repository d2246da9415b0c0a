//! File-backed contest snapshots
//!
//! A snapshot holds contests, their submissions and optionally rating change
//! records from earlier runs. The CLI loads one from TOML or JSON and serves it
//! through the in-memory data source and rating store. Timestamps are RFC 3339
//! strings in both formats.

use crate::error::{Result, StandingsError};
use crate::rating::{ContestKey, InMemoryRatingStore, RatingStore};
use crate::service::InMemoryContestDataSource;
use crate::types::{Contest, RatingChangeRecord, SubmissionRecord};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Contest input plus previously computed ratings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub contests: Vec<Contest>,
    #[serde(default)]
    pub submissions: Vec<SubmissionRecord>,
    #[serde(default)]
    pub rating_changes: Vec<RatingChangeRecord>,
}

impl Snapshot {
    /// Load a snapshot, choosing the format from the file extension
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| StandingsError::SnapshotError {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;

        let snapshot = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&contents)?,
            Some("json") => Self::from_json_str(&contents)?,
            _ => {
                return Err(StandingsError::SnapshotError {
                    message: format!(
                        "Unsupported snapshot format: {} (expected .toml or .json)",
                        path.display()
                    ),
                }
                .into())
            }
        };

        info!(
            "Loaded snapshot {}: {} contests, {} submissions, {} rating changes",
            path.display(),
            snapshot.contests.len(),
            snapshot.submissions.len(),
            snapshot.rating_changes.len()
        );
        Ok(snapshot)
    }

    /// Parse a TOML snapshot
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| {
            StandingsError::SnapshotError {
                message: format!("Invalid TOML snapshot: {}", e),
            }
            .into()
        })
    }

    /// Parse a JSON snapshot
    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|e| {
            StandingsError::SnapshotError {
                message: format!("Invalid JSON snapshot: {}", e),
            }
            .into()
        })
    }

    /// Populate an in-memory data source and rating store
    ///
    /// Every contest is registered with the store so cascades can find it even
    /// before it has been rated.
    pub fn into_sources(
        self,
        baseline: i32,
    ) -> Result<(InMemoryContestDataSource, InMemoryRatingStore)> {
        let source = InMemoryContestDataSource::new();
        let store = InMemoryRatingStore::new(baseline);

        for contest in self.contests {
            store.record_contest(ContestKey::new(contest.id, contest.end_time))?;
            source.add_contest(contest)?;
        }
        source.upsert_submissions(self.submissions)?;

        for record in self.rating_changes {
            debug!(
                "Restoring rating change of user {} in contest {}",
                record.user_id, record.contest_id
            );
            store.upsert_rating_change(record)?;
        }

        Ok((source, store))
    }
}

//! Ranklist entry point shared by all contest types
//!
//! The builder filters the submission snapshot down to eligible records, groups
//! them per participant in chronological order and hands the groups to the
//! rule-specific ranking in [`oi`](super::oi), [`ioi`](super::ioi) or
//! [`acm`](super::acm). It is a pure function of its inputs: the same contest,
//! problem list, submissions and `now` always produce the same ranklist, in
//! whatever order the submissions were supplied.

use crate::error::StandingsError;
use crate::types::{
    Contest, ContestType, ProblemId, RanklistEntry, SubmissionRecord, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Eligible submissions of one participant, oldest first per problem
#[derive(Debug, Clone)]
pub struct ParticipantSubmissions<'a> {
    pub user_id: UserId,
    by_problem: HashMap<ProblemId, Vec<&'a SubmissionRecord>>,
}

impl<'a> ParticipantSubmissions<'a> {
    fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            by_problem: HashMap::new(),
        }
    }

    /// Chronologically ordered submissions for `problem_id`
    pub fn for_problem(&self, problem_id: ProblemId) -> &[&'a SubmissionRecord] {
        self.by_problem
            .get(&problem_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Ranklist plus bookkeeping about the input it was built from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RanklistOutcome {
    pub entries: Vec<RanklistEntry>,
    /// Submissions excluded because they fell outside the contest
    pub dropped_submissions: usize,
}

/// Build the ranklist of `contest`
pub fn build_ranklist(
    contest: &Contest,
    problems: &[ProblemId],
    submissions: &[SubmissionRecord],
    now: DateTime<Utc>,
) -> Vec<RanklistEntry> {
    build_ranklist_outcome(contest, problems, submissions, now).entries
}

/// Build the ranklist of `contest`, also reporting how many records were dropped
pub fn build_ranklist_outcome(
    contest: &Contest,
    problems: &[ProblemId],
    submissions: &[SubmissionRecord],
    now: DateTime<Utc>,
) -> RanklistOutcome {
    if problems.is_empty() {
        return RanklistOutcome {
            entries: Vec::new(),
            dropped_submissions: 0,
        };
    }

    let (participants, dropped_submissions) = group_eligible(contest, problems, submissions);

    let entries = match contest.contest_type {
        ContestType::Oi => super::oi::rank(contest, problems, &participants, now),
        ContestType::Ioi => super::ioi::rank(contest, problems, &participants),
        ContestType::Acm => super::acm::rank(contest, problems, &participants),
    };

    debug!(
        "Built {} ranklist for contest {}: {} participants, {} dropped submissions",
        contest.contest_type,
        contest.id,
        entries.len(),
        dropped_submissions
    );

    RanklistOutcome {
        entries,
        dropped_submissions,
    }
}

/// Group eligible submissions per participant
///
/// Participants appear in the order of their first eligible submission, which
/// is the tie order the stable sorts downstream preserve.
fn group_eligible<'a>(
    contest: &Contest,
    problems: &[ProblemId],
    submissions: &'a [SubmissionRecord],
) -> (Vec<ParticipantSubmissions<'a>>, usize) {
    let problem_set: HashSet<ProblemId> = problems.iter().copied().collect();

    let mut eligible = Vec::with_capacity(submissions.len());
    let mut dropped = 0;
    for submission in submissions {
        if submission.contest_id != contest.id || !problem_set.contains(&submission.problem_id) {
            dropped += 1;
            continue;
        }
        if !contest.contains(submission.submit_time) {
            let error = StandingsError::MalformedSubmissionWindow {
                contest_id: contest.id,
                submission_id: submission.id,
            };
            warn!("Ignoring submission: {}", error);
            dropped += 1;
            continue;
        }
        eligible.push(submission);
    }

    eligible.sort_by(|a, b| a.submit_time.cmp(&b.submit_time).then(a.id.cmp(&b.id)));

    let mut index: HashMap<UserId, usize> = HashMap::new();
    let mut participants: Vec<ParticipantSubmissions<'a>> = Vec::new();
    for submission in eligible {
        let slot = *index.entry(submission.submitter_id).or_insert_with(|| {
            participants.push(ParticipantSubmissions::new(submission.submitter_id));
            participants.len() - 1
        });
        participants[slot]
            .by_problem
            .entry(submission.problem_id)
            .or_default()
            .push(submission);
    }

    (participants, dropped)
}

/// Best score among judged submissions, `None` if nothing has been judged
pub(crate) fn best_score(submissions: &[&SubmissionRecord]) -> Option<u32> {
    submissions
        .iter()
        .filter(|s| s.status.is_judged())
        .map(|s| s.score.unwrap_or(0))
        .max()
}

/// Number rows 1, 2, 3, ... in their current order
pub(crate) fn into_dense_ranks(rows: Vec<RanklistEntry>) -> Vec<RanklistEntry> {
    rows.into_iter()
        .enumerate()
        .map(|(i, mut entry)| {
            entry.rank = i as u32 + 1;
            entry
        })
        .collect()
}

//! ACM rule: solved count first, then penalty minutes

use super::builder::{into_dense_ranks, ParticipantSubmissions};
use crate::types::{
    AcmProblemStatus, Contest, ProblemId, RanklistEntry, Standing, SubmissionRecord,
    SubmissionStatus,
};
use crate::utils::minutes_since;
use std::cmp::Reverse;

/// Penalty minutes added per wrong attempt before acceptance
pub const WRONG_ATTEMPT_PENALTY: i64 = 20;

pub(crate) fn rank(
    contest: &Contest,
    problems: &[ProblemId],
    participants: &[ParticipantSubmissions<'_>],
) -> Vec<RanklistEntry> {
    let mut rows: Vec<((Reverse<u32>, i64), RanklistEntry)> = participants
        .iter()
        .map(|participant| {
            let mut solved_count = 0;
            let mut total_penalty = 0;
            let statuses: Vec<AcmProblemStatus> = problems
                .iter()
                .map(|&problem_id| {
                    let (status, penalty) =
                        problem_status(contest, problem_id, participant.for_problem(problem_id));
                    if status.accepted {
                        solved_count += 1;
                        total_penalty += penalty;
                    }
                    status
                })
                .collect();

            let entry = RanklistEntry {
                rank: 0,
                user_id: participant.user_id,
                standing: Standing::Acm {
                    solved_count,
                    total_penalty,
                    problems: statuses,
                },
            };
            ((Reverse(solved_count), total_penalty), entry)
        })
        .collect();

    rows.sort_by(|a, b| a.0.cmp(&b.0));
    into_dense_ranks(rows.into_iter().map(|(_, entry)| entry).collect())
}

/// Cell for one problem and the penalty it contributes
fn problem_status(
    contest: &Contest,
    problem_id: ProblemId,
    submissions: &[&SubmissionRecord],
) -> (AcmProblemStatus, i64) {
    let first_accepted = submissions
        .iter()
        .find(|s| s.status == SubmissionStatus::Accepted);

    match first_accepted {
        Some(accepted) => {
            let wrong_attempts = submissions
                .iter()
                .filter(|s| s.submit_time < accepted.submit_time && s.status.is_wrong_attempt())
                .count() as u32;
            let solve_minute = minutes_since(contest.start_time, accepted.submit_time);
            let penalty = solve_minute + WRONG_ATTEMPT_PENALTY * i64::from(wrong_attempts);

            (
                AcmProblemStatus {
                    problem_id,
                    accepted: true,
                    wrong_attempts,
                    solve_minute: Some(solve_minute),
                    last_submit_minute: None,
                },
                penalty,
            )
        }
        None => {
            let wrong_attempts = submissions
                .iter()
                .filter(|s| s.status.is_wrong_attempt())
                .count() as u32;
            let last_submit_minute = if wrong_attempts > 0 {
                submissions
                    .last()
                    .map(|s| minutes_since(contest.start_time, s.submit_time))
            } else {
                None
            };

            (
                AcmProblemStatus {
                    problem_id,
                    accepted: false,
                    wrong_attempts,
                    solve_minute: None,
                    last_submit_minute,
                },
                0,
            )
        }
    }
}

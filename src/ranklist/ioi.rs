//! IOI rule: live scores, first full score time recorded per problem

use super::builder::{best_score, into_dense_ranks, ParticipantSubmissions};
use crate::types::{Contest, IoiProblemStatus, ProblemId, RanklistEntry, Standing};
use crate::utils::minutes_since;

/// Score counted as a full solve
pub const FULL_SCORE: u32 = 100;

pub(crate) fn rank(
    contest: &Contest,
    problems: &[ProblemId],
    participants: &[ParticipantSubmissions<'_>],
) -> Vec<RanklistEntry> {
    let mut rows: Vec<(u32, RanklistEntry)> = participants
        .iter()
        .map(|participant| {
            let statuses: Vec<IoiProblemStatus> = problems
                .iter()
                .map(|&problem_id| {
                    let submissions = participant.for_problem(problem_id);
                    let score = best_score(submissions).unwrap_or(0);
                    let first_accept_minute = if score == FULL_SCORE {
                        submissions
                            .iter()
                            .find(|s| s.status.is_judged() && s.score == Some(FULL_SCORE))
                            .map(|s| minutes_since(contest.start_time, s.submit_time))
                    } else {
                        None
                    };
                    IoiProblemStatus {
                        problem_id,
                        score,
                        first_accept_minute,
                    }
                })
                .collect();

            let total: u32 = statuses.iter().map(|s| s.score).sum();
            let entry = RanklistEntry {
                rank: 0,
                user_id: participant.user_id,
                standing: Standing::Ioi {
                    total_score: total,
                    problems: statuses,
                },
            };
            (total, entry)
        })
        .collect();

    rows.sort_by(|a, b| b.0.cmp(&a.0));
    into_dense_ranks(rows.into_iter().map(|(_, entry)| entry).collect())
}

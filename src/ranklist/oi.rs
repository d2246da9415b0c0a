//! OI rule: scores stay hidden until the contest is over

use super::builder::{best_score, into_dense_ranks, ParticipantSubmissions};
use crate::types::{Contest, OiProblemStatus, ProblemId, RanklistEntry, Standing};
use chrono::{DateTime, Utc};

pub(crate) fn rank(
    contest: &Contest,
    problems: &[ProblemId],
    participants: &[ParticipantSubmissions<'_>],
    now: DateTime<Utc>,
) -> Vec<RanklistEntry> {
    let ended = contest.has_ended(now);

    let mut rows: Vec<(u32, RanklistEntry)> = participants
        .iter()
        .map(|participant| {
            let mut total = 0;
            let statuses: Vec<OiProblemStatus> = problems
                .iter()
                .map(|&problem_id| {
                    let submissions = participant.for_problem(problem_id);
                    let score = if ended {
                        let score = best_score(submissions).unwrap_or(0);
                        total += score;
                        Some(score)
                    } else {
                        None
                    };
                    OiProblemStatus {
                        problem_id,
                        score,
                        submitted: !submissions.is_empty(),
                    }
                })
                .collect();

            let entry = RanklistEntry {
                rank: 0,
                user_id: participant.user_id,
                standing: Standing::Oi {
                    total_score: ended.then_some(total),
                    problems: statuses,
                },
            };
            (total, entry)
        })
        .collect();

    if !ended {
        return rows.into_iter().map(|(_, entry)| entry).collect();
    }

    rows.sort_by(|a, b| b.0.cmp(&a.0));
    into_dense_ranks(rows.into_iter().map(|(_, entry)| entry).collect())
}

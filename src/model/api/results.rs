use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::{
    common::{Position, MAX_GRADE, MIN_GRADE},
    db::{candidate::Candidate, vote::Vote},
    mongodb::Id,
};

/// Standing of a single candidate within a race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTally {
    pub candidate_id: Id,
    pub name: String,
    pub partylist: Option<String>,
    pub votes: u64,
    /// Votes broken down by the voter's grade level.
    pub by_grade: BTreeMap<u8, u64>,
}

/// One race's live standings. Candidates are sorted by descending vote
/// count, so the current winner is index 0; equal counts keep their fetch
/// order, there is no further tie-break rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceResults {
    pub position: Position,
    /// Set for grade-representative races, which are tallied per grade.
    pub grade_level: Option<u8>,
    pub candidates: Vec<CandidateTally>,
    pub abstentions: u64,
}

/// The full dashboard payload. The admin UI polls this for its charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResults {
    /// Total vote rows, abstentions included.
    pub total_votes: u64,
    /// Voters whose ballots have been recorded.
    pub ballots_cast: u64,
    /// Roster size.
    pub eligible_voters: u64,
    pub races: Vec<RaceResults>,
}

/// Aggregate raw vote rows into per-race standings.
///
/// Votes referencing candidates that have since been deleted are dropped,
/// matching what a join against the current candidate list would do.
pub fn tally(candidates: &[Candidate], votes: &[Vote]) -> Vec<RaceResults> {
    // Count votes per candidate and abstentions per race.
    let mut counts: HashMap<Id, (u64, BTreeMap<u8, u64>)> = HashMap::new();
    let mut abstentions: HashMap<(Position, Option<u8>), u64> = HashMap::new();
    for vote in votes {
        match vote.candidate_id {
            Some(candidate_id) => {
                let entry = counts.entry(candidate_id).or_default();
                entry.0 += 1;
                *entry.1.entry(vote.grade_level).or_insert(0) += 1;
            }
            None => {
                let race_grade = vote
                    .position
                    .is_grade_representative()
                    .then_some(vote.grade_level);
                *abstentions.entry((vote.position, race_grade)).or_insert(0) += 1;
            }
        }
    }

    // Assemble races in ballot order.
    let mut races = Vec::new();
    for position in Position::ALL {
        if position.is_grade_representative() {
            for grade_level in MIN_GRADE..=MAX_GRADE {
                push_race(
                    &mut races,
                    candidates,
                    &counts,
                    &abstentions,
                    position,
                    Some(grade_level),
                );
            }
        } else {
            push_race(&mut races, candidates, &counts, &abstentions, position, None);
        }
    }
    races
}

fn push_race(
    races: &mut Vec<RaceResults>,
    candidates: &[Candidate],
    counts: &HashMap<Id, (u64, BTreeMap<u8, u64>)>,
    abstentions: &HashMap<(Position, Option<u8>), u64>,
    position: Position,
    grade_level: Option<u8>,
) {
    let mut tallies: Vec<CandidateTally> = candidates
        .iter()
        .filter(|c| c.position == position && c.grade_level == grade_level)
        .map(|c| {
            let (votes, by_grade) = counts.get(&c.id).cloned().unwrap_or_default();
            CandidateTally {
                candidate_id: c.id,
                name: c.full_name(),
                partylist: c.partylist.clone(),
                votes,
                by_grade,
            }
        })
        .collect();
    if tallies.is_empty() {
        // Nobody ran; the race never appeared on any ballot.
        return;
    }
    // Stable, so equal counts keep their fetch order.
    tallies.sort_by(|a, b| b.votes.cmp(&a.votes));
    let abstentions = abstentions
        .get(&(position, grade_level))
        .copied()
        .unwrap_or(0);
    races.push(RaceResults {
        position,
        grade_level,
        candidates: tallies,
        abstentions,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::db::{candidate::CandidateCore, vote::VoteCore};

    fn ballot_for(candidate: &Candidate, grade_level: u8) -> Vote {
        Vote {
            id: Id::new(),
            vote: VoteCore {
                candidate_id: Some(candidate.id),
                position: candidate.position,
                grade_level,
            },
        }
    }

    fn abstain(position: Position, grade_level: u8) -> Vote {
        Vote {
            id: Id::new(),
            vote: VoteCore {
                candidate_id: None,
                position,
                grade_level,
            },
        }
    }

    fn setup() -> (Vec<Candidate>, Vec<Vote>) {
        let president1 = Candidate {
            id: Id::new(),
            candidate: CandidateCore::example_president(),
        };
        let president2 = Candidate {
            id: Id::new(),
            candidate: CandidateCore::example_president2(),
        };
        let rep9 = Candidate {
            id: Id::new(),
            candidate: CandidateCore::example_representative(9),
        };

        let votes = vec![
            // President: 3 for Silang (two grades), 2 for Bonifacio, 1 abstention.
            ballot_for(&president2, 7),
            ballot_for(&president2, 7),
            ballot_for(&president2, 12),
            ballot_for(&president1, 9),
            ballot_for(&president1, 9),
            abstain(Position::President, 10),
            // Grade 9 representative: 1 vote, 1 abstention.
            ballot_for(&rep9, 9),
            abstain(Position::GradeRepresentative, 9),
        ];
        (vec![president1, president2, rep9], votes)
    }

    #[test]
    fn winner_has_the_most_votes() {
        let (candidates, votes) = setup();
        let races = tally(&candidates, &votes);

        assert_eq!(races[0].position, Position::President);
        assert_eq!(races[0].candidates[0].name, "Gabriela Silang");
        assert_eq!(races[0].candidates[0].votes, 3);
        assert_eq!(races[0].candidates[1].votes, 2);
        assert_eq!(races[0].abstentions, 1);
    }

    #[test]
    fn grade_buckets_sum_to_the_total() {
        let (candidates, votes) = setup();
        let races = tally(&candidates, &votes);

        for race in &races {
            for tally in &race.candidates {
                let bucket_sum: u64 = tally.by_grade.values().sum();
                assert_eq!(bucket_sum, tally.votes);
            }
        }
        let silang = &races[0].candidates[0];
        assert_eq!(silang.by_grade.get(&7), Some(&2));
        assert_eq!(silang.by_grade.get(&12), Some(&1));
    }

    #[test]
    fn representative_races_are_tallied_per_grade() {
        let (candidates, votes) = setup();
        let races = tally(&candidates, &votes);

        // Only the grade 9 race exists; other grades had nobody running.
        let rep_races: Vec<_> = races
            .iter()
            .filter(|race| race.position == Position::GradeRepresentative)
            .collect();
        assert_eq!(rep_races.len(), 1);
        assert_eq!(rep_races[0].grade_level, Some(9));
        assert_eq!(rep_races[0].candidates[0].votes, 1);
        assert_eq!(rep_races[0].abstentions, 1);
    }

    #[test]
    fn positions_with_no_candidates_are_omitted() {
        let (candidates, votes) = setup();
        let races = tally(&candidates, &votes);
        assert!(races
            .iter()
            .all(|race| race.position != Position::Treasurer));
    }

    #[test]
    fn votes_for_deleted_candidates_are_dropped() {
        let (candidates, mut votes) = setup();
        let ghost = Candidate {
            id: Id::new(),
            candidate: CandidateCore::example_president(),
        };
        votes.push(ballot_for(&ghost, 9));

        let races = tally(&candidates, &votes);
        let total: u64 = races[0].candidates.iter().map(|c| c.votes).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn no_votes_yields_zeroed_standings() {
        let (candidates, _) = setup();
        let races = tally(&candidates, &[]);
        assert!(races
            .iter()
            .flat_map(|race| &race.candidates)
            .all(|c| c.votes == 0 && c.by_grade.is_empty()));
    }
}

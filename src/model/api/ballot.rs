use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{
    api::candidate::CandidateView, common::Position, db::candidate::Candidate, mongodb::Id,
};

/// One race on a voter's ballot, in ballot order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotRace {
    pub position: Position,
    pub candidates: Vec<CandidateView>,
}

/// A voter's choice for a single position; `None` is an explicit
/// abstention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSpec {
    pub position: Position,
    pub candidate: Option<Id>,
}

/// Build the ordered list of races a voter of the given grade sees:
/// grade-representative candidates are narrowed to the voter's own grade,
/// and positions with nobody running are omitted.
pub fn races_for_grade(candidates: &[Candidate], grade_level: u8) -> Vec<BallotRace> {
    Position::ALL
        .into_iter()
        .filter_map(|position| {
            let runners: Vec<CandidateView> = candidates
                .iter()
                .filter(|c| c.position == position)
                .filter(|c| !position.is_grade_representative() || c.grade_level == Some(grade_level))
                .cloned()
                .map(CandidateView::from)
                .collect();
            (!runners.is_empty()).then_some(BallotRace {
                position,
                candidates: runners,
            })
        })
        .collect()
}

/// Check that a submission answers every displayed race exactly once and
/// only names candidates actually running in that race.
pub fn validate_selections(races: &[BallotRace], selections: &[VoteSpec]) -> Result<(), String> {
    let mut answered = HashSet::new();
    for selection in selections {
        let race = races
            .iter()
            .find(|race| race.position == selection.position)
            .ok_or_else(|| format!("{} is not on this ballot", selection.position))?;
        if !answered.insert(selection.position) {
            return Err(format!("Duplicate selection for {}", selection.position));
        }
        if let Some(candidate_id) = selection.candidate {
            if !race.candidates.iter().any(|c| c.id == candidate_id) {
                return Err(format!(
                    "Candidate '{candidate_id}' is not running for {}",
                    selection.position
                ));
            }
        }
    }
    for race in races {
        if !answered.contains(&race.position) {
            return Err(format!("Missing selection for {}", race.position));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::db::candidate::CandidateCore;

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate {
                id: Id::new(),
                candidate: CandidateCore::example_president(),
            },
            Candidate {
                id: Id::new(),
                candidate: CandidateCore::example_president2(),
            },
            Candidate {
                id: Id::new(),
                candidate: CandidateCore::example_representative(9),
            },
            Candidate {
                id: Id::new(),
                candidate: CandidateCore::example_representative(11),
            },
        ]
    }

    fn full_selection(races: &[BallotRace]) -> Vec<VoteSpec> {
        races
            .iter()
            .map(|race| VoteSpec {
                position: race.position,
                candidate: Some(race.candidates[0].id),
            })
            .collect()
    }

    #[test]
    fn representatives_are_narrowed_to_the_voters_grade() {
        let candidates = candidates();
        let races = races_for_grade(&candidates, 9);

        // President plus the grade 9 representative race.
        assert_eq!(races.len(), 2);
        assert_eq!(races[0].position, Position::President);
        assert_eq!(races[0].candidates.len(), 2);
        assert_eq!(races[1].position, Position::GradeRepresentative);
        assert_eq!(races[1].candidates.len(), 1);
        assert_eq!(races[1].candidates[0].grade_level, Some(9));
    }

    #[test]
    fn grades_with_no_representative_skip_the_race() {
        let candidates = candidates();
        let races = races_for_grade(&candidates, 8);
        assert_eq!(races.len(), 1);
        assert_eq!(races[0].position, Position::President);
    }

    #[test]
    fn complete_selections_validate() {
        let candidates = candidates();
        let races = races_for_grade(&candidates, 9);
        assert_eq!(validate_selections(&races, &full_selection(&races)), Ok(()));
    }

    #[test]
    fn abstentions_count_as_answers() {
        let candidates = candidates();
        let races = races_for_grade(&candidates, 9);
        let selections: Vec<VoteSpec> = races
            .iter()
            .map(|race| VoteSpec {
                position: race.position,
                candidate: None,
            })
            .collect();
        assert_eq!(validate_selections(&races, &selections), Ok(()));
    }

    #[test]
    fn missing_a_position_is_rejected() {
        let candidates = candidates();
        let races = races_for_grade(&candidates, 9);
        let mut selections = full_selection(&races);
        selections.pop();
        assert!(validate_selections(&races, &selections)
            .unwrap_err()
            .contains("Missing selection"));
    }

    #[test]
    fn duplicate_positions_are_rejected() {
        let candidates = candidates();
        let races = races_for_grade(&candidates, 9);
        let mut selections = full_selection(&races);
        selections.push(selections[0].clone());
        assert!(validate_selections(&races, &selections)
            .unwrap_err()
            .contains("Duplicate selection"));
    }

    #[test]
    fn off_ballot_positions_are_rejected() {
        let candidates = candidates();
        let races = races_for_grade(&candidates, 9);
        let mut selections = full_selection(&races);
        selections.push(VoteSpec {
            position: Position::Treasurer,
            candidate: None,
        });
        assert!(validate_selections(&races, &selections)
            .unwrap_err()
            .contains("not on this ballot"));
    }

    #[test]
    fn unknown_candidates_are_rejected() {
        let candidates = candidates();
        let races = races_for_grade(&candidates, 9);
        let mut selections = full_selection(&races);
        selections[0].candidate = Some(Id::new());
        assert!(validate_selections(&races, &selections)
            .unwrap_err()
            .contains("not running"));
    }

    #[test]
    fn wrong_grade_representative_is_rejected() {
        let candidates = candidates();
        let races = races_for_grade(&candidates, 9);
        // The grade 11 representative is not on a grade 9 ballot.
        let grade_11_rep = candidates
            .iter()
            .find(|c| c.grade_level == Some(11))
            .unwrap();
        let mut selections = full_selection(&races);
        selections[1].candidate = Some(grade_11_rep.id);
        assert!(validate_selections(&races, &selections).is_err());
    }
}

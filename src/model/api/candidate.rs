use serde::{Deserialize, Serialize};

use crate::model::{
    common::{valid_grade, Position},
    db::candidate::{Candidate, NewCandidate},
    mongodb::Id,
};

/// Candidate as rendered on ballots and dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateView {
    pub id: Id,
    pub first_name: String,
    pub last_name: String,
    pub position: Position,
    pub partylist: Option<String>,
    pub photo_url: Option<String>,
    pub grade_level: Option<u8>,
}

impl From<Candidate> for CandidateView {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            first_name: candidate.candidate.first_name,
            last_name: candidate.candidate.last_name,
            position: candidate.candidate.position,
            partylist: candidate.candidate.partylist,
            photo_url: candidate.candidate.photo_url,
            grade_level: candidate.candidate.grade_level,
        }
    }
}

/// Fields accepted when creating or editing a candidate. The photo is
/// uploaded separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub first_name: String,
    pub last_name: String,
    pub position: Position,
    pub partylist: Option<String>,
    pub grade_level: Option<u8>,
}

impl TryFrom<CandidateSpec> for NewCandidate {
    type Error = &'static str;

    fn try_from(spec: CandidateSpec) -> Result<Self, Self::Error> {
        if spec.first_name.is_empty() || spec.last_name.is_empty() {
            return Err("Candidate name must not be empty");
        }
        if spec.position.is_grade_representative() {
            match spec.grade_level {
                Some(grade_level) if valid_grade(grade_level) => {}
                Some(_) => return Err("Grade level out of range"),
                None => return Err("Grade representatives need a grade level"),
            }
        } else if spec.grade_level.is_some() {
            return Err("Only grade representatives carry a grade level");
        }
        Ok(NewCandidate {
            first_name: spec.first_name,
            last_name: spec.last_name,
            position: spec.position,
            partylist: spec.partylist,
            photo_url: None,
            grade_level: spec.grade_level,
        })
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;
    use crate::model::db::candidate::CandidateCore;

    impl CandidateSpec {
        pub fn example_president() -> Self {
            let candidate = CandidateCore::example_president();
            Self {
                first_name: candidate.first_name,
                last_name: candidate.last_name,
                position: candidate.position,
                partylist: candidate.partylist,
                grade_level: candidate.grade_level,
            }
        }

        pub fn example_representative(grade_level: u8) -> Self {
            let candidate = CandidateCore::example_representative(grade_level);
            Self {
                first_name: candidate.first_name,
                last_name: candidate.last_name,
                position: candidate.position,
                partylist: candidate.partylist,
                grade_level: candidate.grade_level,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_representatives_require_a_grade() {
        let mut spec = CandidateSpec::example_representative(9);
        spec.grade_level = None;
        assert!(NewCandidate::try_from(spec).is_err());
    }

    #[test]
    fn schoolwide_positions_reject_a_grade() {
        let mut spec = CandidateSpec::example_president();
        spec.grade_level = Some(9);
        assert!(NewCandidate::try_from(spec).is_err());
    }

    #[test]
    fn out_of_range_grades_are_rejected() {
        let spec = CandidateSpec::example_representative(6);
        assert!(NewCandidate::try_from(spec).is_err());
    }

    #[test]
    fn valid_specs_convert() {
        let candidate = NewCandidate::try_from(CandidateSpec::example_president()).unwrap();
        assert_eq!(candidate.photo_url, None);
        assert_eq!(candidate.full_name(), "Andres Bonifacio");
    }
}

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::{common::Position, mongodb::Id};

/// Core candidate data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub first_name: String,
    pub last_name: String,
    pub position: Position,
    /// Independent candidates have no partylist.
    pub partylist: Option<String>,
    /// Public URL of the uploaded photo, if any.
    pub photo_url: Option<String>,
    /// Set iff the position is grade representative.
    pub grade_level: Option<u8>,
}

impl CandidateCore {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A candidate without an ID.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with their unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl CandidateCore {
        pub fn example_president() -> Self {
            Self {
                first_name: "Andres".to_string(),
                last_name: "Bonifacio".to_string(),
                position: Position::President,
                partylist: Some("Kabataan Alliance".to_string()),
                photo_url: None,
                grade_level: None,
            }
        }

        pub fn example_president2() -> Self {
            Self {
                first_name: "Gabriela".to_string(),
                last_name: "Silang".to_string(),
                position: Position::President,
                partylist: None,
                photo_url: None,
                grade_level: None,
            }
        }

        pub fn example_representative(grade_level: u8) -> Self {
            Self {
                first_name: "Emilio".to_string(),
                last_name: "Jacinto".to_string(),
                position: Position::GradeRepresentative,
                partylist: None,
                photo_url: None,
                grade_level: Some(grade_level),
            }
        }
    }
}

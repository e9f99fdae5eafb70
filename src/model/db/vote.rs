use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::model::{common::Position, mongodb::Id};

/// A single anonymous vote row, as stored in the database.
///
/// Write-once: votes are never updated, and deliberately carry no
/// reference back to the voter. `candidate_id` of `None` records an
/// explicit abstention for the position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCore {
    pub candidate_id: Option<Id>,
    pub position: Position,
    /// Grade level of the casting voter at submission time.
    pub grade_level: u8,
}

/// A vote without an ID.
pub type NewVote = VoteCore;

/// A vote from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}

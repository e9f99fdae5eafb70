use std::ops::{Deref, DerefMut};

use rocket::{
    http::Status,
    outcome::{try_outcome, IntoOutcome},
    request::{self, FromRequest, Request},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    model::{
        auth::AuthToken,
        mongodb::{Coll, Id},
        passcode,
    },
};

/// Core voter data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    /// Learner Reference Number; unique across the roster.
    pub lrn: String,
    pub first_name: String,
    pub last_name: String,
    pub grade_level: u8,
    /// Derived login credential; regenerated whenever identity fields change.
    pub passcode: String,
    pub has_voted: bool,
}

impl VoterCore {
    /// Create a new roster entry, deriving the passcode.
    pub fn new(lrn: String, first_name: String, last_name: String, grade_level: u8) -> Self {
        let passcode = passcode::derive(&lrn, &first_name, &last_name);
        Self {
            lrn,
            first_name,
            last_name,
            grade_level,
            passcode,
            has_voted: false,
        }
    }
}

/// A voter without an ID.
pub type NewVoter = VoterCore;

/// A voter from the database, with their unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Voter {
    type Error = Error;

    /// The voter identified by the request's auth token.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        // Check for voter authentication.
        let auth_token = try_outcome!(req.guard::<AuthToken<Self>>().await);

        let voter_id = match auth_token.voter_id() {
            Ok(id) => id,
            Err(err) => return request::Outcome::Failure((Status::Unauthorized, err)),
        };

        // See `Coll::from_request`
        let voters = req.guard::<Coll<Self>>().await.unwrap();

        // Query for the auth'ed voter.
        let maybe_voter = try_outcome!(voters
            .find_one(voter_id.as_doc(), None)
            .await
            .map_err(Error::Db)
            .into_outcome(Status::InternalServerError));
        let voter = try_outcome!(maybe_voter
            .ok_or_else(|| Error::not_found(format!("Voter with ID '{voter_id}'")))
            .into_outcome(Status::NotFound));

        request::Outcome::Success(voter)
    }
}

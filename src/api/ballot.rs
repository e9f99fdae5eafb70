use mongodb::{bson::doc, Client};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::ballot::{races_for_grade, validate_selections, BallotRace, VoteSpec},
        db::{
            candidate::Candidate,
            settings::Setting,
            vote::NewVote,
            voter::Voter,
        },
        mongodb::Coll,
    },
};

use super::common::ensure_election_open;

pub fn routes() -> Vec<Route> {
    routes![get_ballot, cast_ballot]
}

/// The races the logged-in voter gets to vote on.
#[get("/voter/ballot")]
pub async fn get_ballot(
    voter: Voter,
    candidates: Coll<Candidate>,
    settings: Coll<Setting>,
) -> Result<Json<Vec<BallotRace>>> {
    ensure_election_open(&settings).await?;
    if voter.has_voted {
        return Err(Error::Status(
            Status::Forbidden,
            "You have already cast your ballot".to_string(),
        ));
    }

    let all: Vec<Candidate> = candidates.find(None, None).await?.try_collect().await?;
    Ok(Json(races_for_grade(&all, voter.grade_level)))
}

/// Submit one selection (or abstention) per race.
#[post("/voter/ballot", data = "<selections>", format = "json")]
pub async fn cast_ballot(
    voter: Voter,
    selections: Json<Vec<VoteSpec>>,
    candidates: Coll<Candidate>,
    voters: Coll<Voter>,
    votes: Coll<NewVote>,
    settings: Coll<Setting>,
    db_client: &State<Client>,
) -> Result<()> {
    ensure_election_open(&settings).await?;

    // Revalidate against the ballot the voter was shown.
    let all: Vec<Candidate> = candidates.find(None, None).await?.try_collect().await?;
    let races = races_for_grade(&all, voter.grade_level);
    if races.is_empty() {
        return Err(Error::Status(
            Status::BadRequest,
            "There are no races to vote on".to_string(),
        ));
    }
    validate_selections(&races, &selections)
        .map_err(|msg| Error::Status(Status::UnprocessableEntity, msg))?;

    let new_votes: Vec<NewVote> = selections
        .0
        .iter()
        .map(|selection| NewVote {
            candidate_id: selection.candidate,
            position: selection.position,
            grade_level: voter.grade_level,
        })
        .collect();

    // The flag flip and the vote inserts land atomically; filtering the
    // update on `has_voted` makes a concurrent duplicate submission lose.
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let filter = doc! { "_id": *voter.id, "has_voted": false };
    let update = doc! { "$set": { "has_voted": true } };
    let result = voters
        .update_one_with_session(filter, update, None, &mut session)
        .await?;
    if result.modified_count != 1 {
        session.abort_transaction().await?;
        return Err(Error::Status(
            Status::Forbidden,
            "You have already cast your ballot".to_string(),
        ));
    }
    votes
        .insert_many_with_session(&new_votes, None, &mut session)
        .await?;

    session.commit_transaction().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use mongodb::Database;
    use rocket::{
        http::ContentType,
        local::asynchronous::Client,
        serde::json::{serde_json, serde_json::json},
    };

    use crate::model::{
        common::Position,
        db::{candidate::NewCandidate, settings::ELECTION_OPEN, vote::Vote},
    };

    use super::*;

    async fn open_election(db: &Database) {
        Setting::put(&Coll::from_db(db), ELECTION_OPEN, true)
            .await
            .unwrap();
    }

    async fn insert_candidates(db: &Database) {
        Coll::<NewCandidate>::from_db(db)
            .insert_many(
                vec![
                    NewCandidate::example_president(),
                    NewCandidate::example_president2(),
                    // The example voter is in grade 9; the grade 11
                    // representative must never appear on their ballot.
                    NewCandidate::example_representative(9),
                    NewCandidate::example_representative(11),
                ],
                None,
            )
            .await
            .unwrap();
    }

    async fn fetch_ballot(client: &Client) -> Vec<BallotRace> {
        let response = client.get(uri!(get_ballot)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    fn vote_for_first(races: &[BallotRace]) -> Vec<VoteSpec> {
        races
            .iter()
            .map(|race| VoteSpec {
                position: race.position,
                candidate: Some(race.candidates[0].id),
            })
            .collect()
    }

    async fn submit(client: &Client, selections: &[VoteSpec]) -> Status {
        client
            .post(uri!(cast_ballot))
            .header(ContentType::JSON)
            .body(json!(selections).to_string())
            .dispatch()
            .await
            .status()
    }

    #[backend_test(voter)]
    async fn ballot_is_narrowed_to_the_voters_grade(client: Client, db: Database) {
        insert_candidates(&db).await;
        open_election(&db).await;

        let races = fetch_ballot(&client).await;

        assert_eq!(races.len(), 2);
        assert_eq!(races[0].position, Position::President);
        assert_eq!(races[0].candidates.len(), 2);
        assert_eq!(races[1].position, Position::GradeRepresentative);
        assert_eq!(races[1].candidates.len(), 1);
        assert_eq!(races[1].candidates[0].grade_level, Some(9));
    }

    #[backend_test(voter)]
    async fn ballot_requires_an_open_election(client: Client, db: Database) {
        insert_candidates(&db).await;

        let response = client.get(uri!(get_ballot)).dispatch().await;
        assert_eq!(Status::Forbidden, response.status());
    }

    #[backend_test]
    async fn ballot_requires_a_voter_token(client: Client, db: Database) {
        insert_candidates(&db).await;
        open_election(&db).await;

        let response = client.get(uri!(get_ballot)).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(voter)]
    async fn cast_ballot_records_votes_and_flips_the_flag(client: Client, db: Database) {
        insert_candidates(&db).await;
        open_election(&db).await;

        let races = fetch_ballot(&client).await;
        let selections = vote_for_first(&races);
        assert_eq!(Status::Ok, submit(&client, &selections).await);

        // One vote row per race, snapshotting the voter's grade.
        let votes: Vec<Vote> = Coll::<Vote>::from_db(&db)
            .find(None, None)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(votes.len(), races.len());
        assert!(votes.iter().all(|vote| vote.grade_level == 9));

        // The voter is marked as having voted.
        let voter = Coll::<Voter>::from_db(&db)
            .find_one(None, None)
            .await
            .unwrap()
            .unwrap();
        assert!(voter.has_voted);
    }

    #[backend_test(voter)]
    async fn abstentions_are_recorded_as_empty_votes(client: Client, db: Database) {
        insert_candidates(&db).await;
        open_election(&db).await;

        let races = fetch_ballot(&client).await;
        let selections: Vec<VoteSpec> = races
            .iter()
            .map(|race| VoteSpec {
                position: race.position,
                candidate: None,
            })
            .collect();
        assert_eq!(Status::Ok, submit(&client, &selections).await);

        let votes: Vec<Vote> = Coll::<Vote>::from_db(&db)
            .find(None, None)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(votes.len(), races.len());
        assert!(votes.iter().all(|vote| vote.candidate_id.is_none()));
    }

    #[backend_test(voter)]
    async fn incomplete_ballots_leave_no_trace(client: Client, db: Database) {
        insert_candidates(&db).await;
        open_election(&db).await;

        let races = fetch_ballot(&client).await;
        let mut selections = vote_for_first(&races);
        selections.pop();
        assert_eq!(
            Status::UnprocessableEntity,
            submit(&client, &selections).await
        );

        // Nothing was inserted and the voter can still vote.
        let vote_count = Coll::<Vote>::from_db(&db)
            .count_documents(None, None)
            .await
            .unwrap();
        assert_eq!(vote_count, 0);
        let voter = Coll::<Voter>::from_db(&db)
            .find_one(None, None)
            .await
            .unwrap()
            .unwrap();
        assert!(!voter.has_voted);
    }

    #[backend_test(voter)]
    async fn double_submission_is_rejected(client: Client, db: Database) {
        insert_candidates(&db).await;
        open_election(&db).await;

        let races = fetch_ballot(&client).await;
        let selections = vote_for_first(&races);
        assert_eq!(Status::Ok, submit(&client, &selections).await);
        assert_eq!(Status::Forbidden, submit(&client, &selections).await);

        // Still exactly one ballot's worth of votes.
        let vote_count = Coll::<Vote>::from_db(&db)
            .count_documents(None, None)
            .await
            .unwrap();
        assert_eq!(vote_count, races.len() as u64);
    }

    #[backend_test(voter)]
    async fn casting_requires_an_open_election(client: Client, db: Database) {
        insert_candidates(&db).await;
        open_election(&db).await;
        let races = fetch_ballot(&client).await;
        let selections = vote_for_first(&races);

        // The admin closes the election between fetch and submit.
        Setting::put(&Coll::from_db(&db), ELECTION_OPEN, false)
            .await
            .unwrap();
        assert_eq!(Status::Forbidden, submit(&client, &selections).await);
    }

    #[backend_test(voter)]
    async fn votes_carry_no_voter_reference(client: Client, db: Database) {
        insert_candidates(&db).await;
        open_election(&db).await;

        let races = fetch_ballot(&client).await;
        assert_eq!(Status::Ok, submit(&client, &vote_for_first(&races)).await);

        // Raw documents contain only the candidate, position, and grade.
        let raw: Vec<mongodb::bson::Document> =
            Coll::<Vote>::from_db(&db)
                .clone_with_type::<mongodb::bson::Document>()
                .find(None, None)
                .await
                .unwrap()
                .try_collect()
                .await
                .unwrap();
        for doc in raw {
            let mut keys: Vec<_> = doc.keys().map(String::as_str).collect();
            keys.sort_unstable();
            assert_eq!(keys, vec!["_id", "candidate_id", "grade_level", "position"]);
        }
    }
}

use aws_sdk_s3::Client as S3Client;
use data_encoding::HEXLOWER;
use mongodb::{bson::doc, options::InsertManyOptions};
use rand::Rng;
use rocket::{
    data::ToByteUnit,
    futures::TryStreamExt,
    http::{ContentType, Status},
    serde::json::Json,
    Data, Route, State,
};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            candidate::{CandidateSpec, CandidateView},
            info::SchoolYearUpdate,
            results::{tally, ElectionResults},
            voter::{parse_roster, ImportSummary, VoterSpec, VoterView},
        },
        auth::{Admin, AuthToken},
        db::{
            candidate::{Candidate, NewCandidate},
            settings::{Setting, ELECTION_OPEN, SCHOOL_YEAR},
            vote::Vote,
            voter::{NewVoter, Voter},
        },
        mongodb::{duplicate_keys_in_bulk_error, is_duplicate_key_error, Coll, Id},
    },
    Config,
};

use super::common::delete_photo_object;

/// Largest accepted photo upload.
const PHOTO_SIZE_LIMIT_MIB: u64 = 5;

pub fn routes() -> Vec<Route> {
    routes![
        get_voters,
        create_voter,
        update_voter,
        delete_voter,
        reset_vote,
        import_voters,
        get_candidates,
        create_candidate,
        update_candidate,
        delete_candidate,
        upload_photo,
        delete_photo,
        open_election,
        close_election,
        set_school_year,
        get_results,
    ]
}

#[get("/voters")]
pub async fn get_voters(
    _token: AuthToken<Admin>,
    voters: Coll<Voter>,
) -> Result<Json<Vec<VoterView>>> {
    let roster: Vec<Voter> = voters.find(None, None).await?.try_collect().await?;
    Ok(Json(roster.into_iter().map(VoterView::from).collect()))
}

#[post("/voters", data = "<spec>", format = "json")]
pub async fn create_voter(
    _token: AuthToken<Admin>,
    spec: Json<VoterSpec>,
    voters: Coll<Voter>,
    new_voters: Coll<NewVoter>,
) -> Result<Json<VoterView>> {
    let voter: NewVoter = spec
        .0
        .try_into()
        .map_err(|msg: &str| Error::Status(Status::BadRequest, msg.to_string()))?;

    // The unique LRN index does the real duplicate check.
    let new_id: Id = match new_voters.insert_one(&voter, None).await {
        Ok(result) => result
            .inserted_id
            .as_object_id()
            .unwrap() // Valid because the ID comes directly from the DB
            .into(),
        Err(err) if is_duplicate_key_error(&err) => {
            return Err(Error::Status(
                Status::BadRequest,
                format!("LRN already registered: {}", voter.lrn),
            ));
        }
        Err(err) => return Err(err.into()),
    };

    let db_voter = voters.find_one(new_id.as_doc(), None).await?.unwrap();
    Ok(Json(db_voter.into()))
}

#[put("/voters/<voter_id>", data = "<spec>", format = "json")]
pub async fn update_voter(
    _token: AuthToken<Admin>,
    voter_id: Id,
    spec: Json<VoterSpec>,
    voters: Coll<Voter>,
    new_voters: Coll<NewVoter>,
) -> Result<Json<VoterView>> {
    let existing = voters
        .find_one(voter_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Voter {voter_id}")))?;

    // Re-derive the passcode from the new identity fields, but keep the
    // voting state.
    let mut updated: NewVoter = spec
        .0
        .try_into()
        .map_err(|msg: &str| Error::Status(Status::BadRequest, msg.to_string()))?;
    updated.has_voted = existing.has_voted;

    match new_voters
        .replace_one(voter_id.as_doc(), &updated, None)
        .await
    {
        Ok(_) => {}
        Err(err) if is_duplicate_key_error(&err) => {
            return Err(Error::Status(
                Status::BadRequest,
                format!("LRN already registered: {}", updated.lrn),
            ));
        }
        Err(err) => return Err(err.into()),
    }

    let db_voter = voters.find_one(voter_id.as_doc(), None).await?.unwrap();
    Ok(Json(db_voter.into()))
}

#[delete("/voters/<voter_id>")]
pub async fn delete_voter(
    _token: AuthToken<Admin>,
    voter_id: Id,
    voters: Coll<Voter>,
) -> Result<()> {
    let result = voters.delete_one(voter_id.as_doc(), None).await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found(format!("Voter {voter_id}")));
    }
    Ok(())
}

/// Clear a voter's has-voted flag so they can be issued a fresh ballot,
/// e.g. after a spoiled submission. Their previous votes, if any, remain.
#[post("/voters/<voter_id>/reset-vote")]
pub async fn reset_vote(
    _token: AuthToken<Admin>,
    voter_id: Id,
    voters: Coll<Voter>,
) -> Result<()> {
    let update = doc! { "$set": { "has_voted": false } };
    let result = voters.update_one(voter_id.as_doc(), update, None).await?;
    if result.matched_count == 0 {
        return Err(Error::not_found(format!("Voter {voter_id}")));
    }
    Ok(())
}

/// Bulk-import the roster from CSV: header line ignored, columns
/// `lrn,first_name,last_name,grade_level`. Already-registered LRNs are
/// skipped.
#[post("/voters/import", data = "<roster>")]
pub async fn import_voters(
    _token: AuthToken<Admin>,
    roster: String,
    new_voters: Coll<NewVoter>,
) -> Result<Json<ImportSummary>> {
    let (voters, invalid_lines) = parse_roster(&roster);
    if !invalid_lines.is_empty() {
        warn!("Roster import skipping {} malformed lines", invalid_lines.len());
    }
    if voters.is_empty() {
        return Ok(Json(ImportSummary {
            imported: 0,
            skipped: 0,
            invalid_lines,
        }));
    }

    // Unordered, so one duplicate doesn't abort the whole batch; the
    // unique LRN index deduplicates.
    let total = voters.len();
    let options = InsertManyOptions::builder().ordered(false).build();
    let summary = match new_voters.insert_many(&voters, options).await {
        Ok(result) => ImportSummary {
            imported: result.inserted_ids.len(),
            skipped: 0,
            invalid_lines,
        },
        Err(err) => match duplicate_keys_in_bulk_error(&err) {
            Some(skipped) => ImportSummary {
                imported: total - skipped,
                skipped,
                invalid_lines,
            },
            None => return Err(err.into()),
        },
    };
    info!(
        "Roster import: {} added, {} duplicates skipped",
        summary.imported, summary.skipped
    );
    Ok(Json(summary))
}

#[get("/candidates")]
pub async fn get_candidates(
    _token: AuthToken<Admin>,
    candidates: Coll<Candidate>,
) -> Result<Json<Vec<CandidateView>>> {
    let all: Vec<Candidate> = candidates.find(None, None).await?.try_collect().await?;
    Ok(Json(all.into_iter().map(CandidateView::from).collect()))
}

#[post("/candidates", data = "<spec>", format = "json")]
pub async fn create_candidate(
    _token: AuthToken<Admin>,
    spec: Json<CandidateSpec>,
    candidates: Coll<Candidate>,
    new_candidates: Coll<NewCandidate>,
) -> Result<Json<CandidateView>> {
    let candidate: NewCandidate = spec
        .0
        .try_into()
        .map_err(|msg: &str| Error::Status(Status::BadRequest, msg.to_string()))?;

    let new_id: Id = new_candidates
        .insert_one(&candidate, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();

    let db_candidate = candidates.find_one(new_id.as_doc(), None).await?.unwrap();
    Ok(Json(db_candidate.into()))
}

#[put("/candidates/<candidate_id>", data = "<spec>", format = "json")]
pub async fn update_candidate(
    _token: AuthToken<Admin>,
    candidate_id: Id,
    spec: Json<CandidateSpec>,
    candidates: Coll<Candidate>,
    new_candidates: Coll<NewCandidate>,
) -> Result<Json<CandidateView>> {
    let existing = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;

    let mut updated: NewCandidate = spec
        .0
        .try_into()
        .map_err(|msg: &str| Error::Status(Status::BadRequest, msg.to_string()))?;
    // The photo survives edits; it is managed through its own endpoints.
    updated.photo_url = existing.photo_url.clone();

    new_candidates
        .replace_one(candidate_id.as_doc(), &updated, None)
        .await?;

    let db_candidate = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .unwrap();
    Ok(Json(db_candidate.into()))
}

#[delete("/candidates/<candidate_id>")]
pub async fn delete_candidate(
    _token: AuthToken<Admin>,
    candidate_id: Id,
    candidates: Coll<Candidate>,
    storage: &State<S3Client>,
    config: &State<Config>,
) -> Result<()> {
    let candidate = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;

    let result = candidates.delete_one(candidate_id.as_doc(), None).await?;
    assert_eq!(result.deleted_count, 1);

    if let Some(url) = &candidate.photo_url {
        delete_photo_object(storage, config, url).await;
    }
    Ok(())
}

/// Upload (or replace) a candidate's photo. The body is the raw image;
/// the stored object gets a fresh random key so stale CDN caches never
/// serve an old face.
#[cfg_attr(test, allow(unused_variables))]
#[post("/candidates/<candidate_id>/photo", data = "<photo>")]
pub async fn upload_photo(
    _token: AuthToken<Admin>,
    candidate_id: Id,
    content_type: &ContentType,
    photo: Data<'_>,
    candidates: Coll<Candidate>,
    storage: &State<S3Client>,
    config: &State<Config>,
) -> Result<Json<CandidateView>> {
    let extension = photo_extension(content_type).ok_or_else(|| {
        Error::Status(
            Status::UnsupportedMediaType,
            "Photos must be PNG, JPEG, or WebP".to_string(),
        )
    })?;

    let candidate = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;

    let bytes = photo
        .open(PHOTO_SIZE_LIMIT_MIB.mebibytes())
        .into_bytes()
        .await
        .map_err(|_| {
            Error::Status(
                Status::BadRequest,
                "Failed to read the uploaded photo".to_string(),
            )
        })?;
    if !bytes.is_complete() {
        return Err(Error::Status(
            Status::PayloadTooLarge,
            format!("Photos are limited to {PHOTO_SIZE_LIMIT_MIB}MiB"),
        ));
    }

    let key = photo_key(candidate_id, extension);

    #[cfg(not(test))]
    storage
        .put_object()
        .bucket(config.storage_bucket())
        .key(&key)
        .content_type(content_type.to_string())
        .body(aws_sdk_s3::types::ByteStream::from(bytes.into_inner()))
        .send()
        .await
        .map_err(|err| {
            Error::Status(
                Status::InternalServerError,
                format!("Failed to store photo: {err}"),
            )
        })?;

    // Point the candidate at the new object before discarding the old one.
    let url = format!("{}/{key}", config.storage_url().trim_end_matches('/'));
    candidates
        .update_one(
            candidate_id.as_doc(),
            doc! { "$set": { "photo_url": &url } },
            None,
        )
        .await?;
    if let Some(old_url) = &candidate.photo_url {
        delete_photo_object(storage, config, old_url).await;
    }

    let db_candidate = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .unwrap();
    Ok(Json(db_candidate.into()))
}

#[delete("/candidates/<candidate_id>/photo")]
pub async fn delete_photo(
    _token: AuthToken<Admin>,
    candidate_id: Id,
    candidates: Coll<Candidate>,
    storage: &State<S3Client>,
    config: &State<Config>,
) -> Result<()> {
    let candidate = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;

    let url = candidate.photo_url.clone().ok_or_else(|| {
        Error::not_found(format!("Photo for candidate {candidate_id}"))
    })?;

    candidates
        .update_one(
            candidate_id.as_doc(),
            doc! { "$unset": { "photo_url": "" } },
            None,
        )
        .await?;
    delete_photo_object(storage, config, &url).await;
    Ok(())
}

#[post("/election/open")]
pub async fn open_election(_token: AuthToken<Admin>, settings: Coll<Setting>) -> Result<()> {
    Setting::put(&settings, ELECTION_OPEN, true).await?;
    info!("The election is now open");
    Ok(())
}

#[post("/election/close")]
pub async fn close_election(_token: AuthToken<Admin>, settings: Coll<Setting>) -> Result<()> {
    Setting::put(&settings, ELECTION_OPEN, false).await?;
    info!("The election is now closed");
    Ok(())
}

#[put("/election/school-year", data = "<update>", format = "json")]
pub async fn set_school_year(
    _token: AuthToken<Admin>,
    update: Json<SchoolYearUpdate>,
    settings: Coll<Setting>,
) -> Result<()> {
    Setting::put(&settings, SCHOOL_YEAR, update.0.school_year).await
}

/// Live standings for the dashboard; the admin UI polls this.
#[get("/results")]
pub async fn get_results(
    _token: AuthToken<Admin>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
    voters: Coll<Voter>,
) -> Result<Json<ElectionResults>> {
    let candidate_list: Vec<Candidate> = candidates.find(None, None).await?.try_collect().await?;
    let vote_list: Vec<Vote> = votes.find(None, None).await?.try_collect().await?;
    let eligible_voters = voters.count_documents(None, None).await?;
    let ballots_cast = voters
        .count_documents(doc! { "has_voted": true }, None)
        .await?;

    let races = tally(&candidate_list, &vote_list);
    Ok(Json(ElectionResults {
        total_votes: vote_list.len() as u64,
        ballots_cast,
        eligible_voters,
        races,
    }))
}

/// Fresh object key for a candidate photo.
fn photo_key(candidate_id: Id, extension: &str) -> String {
    let mut nonce = [0_u8; 8];
    rand::thread_rng().fill(&mut nonce);
    format!("{candidate_id}-{}.{extension}", HEXLOWER.encode(&nonce))
}

/// Map an upload's content type to a file extension, rejecting anything
/// that isn't a supported image format.
fn photo_extension(content_type: &ContentType) -> Option<&'static str> {
    if *content_type == ContentType::PNG {
        Some("png")
    } else if *content_type == ContentType::JPEG {
        Some("jpg")
    } else if *content_type == ContentType::WEBP {
        Some("webp")
    } else {
        None
    }
}

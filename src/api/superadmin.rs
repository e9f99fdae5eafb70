use aws_sdk_s3::Client as S3Client;
use mongodb::bson::doc;
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::{CredentialsUpdate, MIN_PASSCODE_LENGTH},
            info::BrandingUpdate,
        },
        auth::{AuthToken, Rights, SuperAdmin},
        db::{
            candidate::Candidate,
            settings::{
                hash_passcode, Setting, ADMIN_PASSCODE, ELECTION_OPEN, LOGO_URL, SCHOOL_NAME,
                SUPER_ADMIN_PASSCODE,
            },
            vote::Vote,
            voter::Voter,
        },
        mongodb::Coll,
    },
    Config,
};

use super::common::delete_photo_object;

pub fn routes() -> Vec<Route> {
    routes![
        wipe_votes,
        wipe_voters,
        wipe_candidates,
        wipe_election,
        rotate_credentials,
        update_branding,
    ]
}

/// Throw away every vote and let the whole roster vote again.
/// Irreversible.
#[delete("/maintenance/votes")]
pub async fn wipe_votes(
    _token: AuthToken<SuperAdmin>,
    votes: Coll<Vote>,
    voters: Coll<Voter>,
) -> Result<()> {
    delete_all_votes(&votes, &voters).await
}

/// Throw away the entire roster. Irreversible.
#[delete("/maintenance/voters")]
pub async fn wipe_voters(_token: AuthToken<SuperAdmin>, voters: Coll<Voter>) -> Result<()> {
    delete_all_voters(&voters).await
}

/// Throw away every candidate, photos included. Irreversible.
#[delete("/maintenance/candidates")]
pub async fn wipe_candidates(
    _token: AuthToken<SuperAdmin>,
    candidates: Coll<Candidate>,
    storage: &State<S3Client>,
    config: &State<Config>,
) -> Result<()> {
    delete_all_candidates(&candidates, storage, config).await
}

/// Full end-of-year reset: votes, roster, candidates, and the open flag.
/// Branding, the school year, and credentials survive. Irreversible.
#[delete("/maintenance/election")]
pub async fn wipe_election(
    _token: AuthToken<SuperAdmin>,
    votes: Coll<Vote>,
    voters: Coll<Voter>,
    candidates: Coll<Candidate>,
    settings: Coll<Setting>,
    storage: &State<S3Client>,
    config: &State<Config>,
) -> Result<()> {
    Setting::put(&settings, ELECTION_OPEN, false).await?;
    delete_all_votes(&votes, &voters).await?;
    delete_all_voters(&voters).await?;
    delete_all_candidates(&candidates, storage, config).await?;
    warn!("Election fully reset");
    Ok(())
}

async fn delete_all_votes(votes: &Coll<Vote>, voters: &Coll<Voter>) -> Result<()> {
    let result = votes.delete_many(doc! {}, None).await?;
    warn!("Wiped {} votes", result.deleted_count);
    voters
        .update_many(doc! {}, doc! { "$set": { "has_voted": false } }, None)
        .await?;
    Ok(())
}

async fn delete_all_voters(voters: &Coll<Voter>) -> Result<()> {
    let result = voters.delete_many(doc! {}, None).await?;
    warn!("Wiped {} voters", result.deleted_count);
    Ok(())
}

async fn delete_all_candidates(
    candidates: &Coll<Candidate>,
    storage: &S3Client,
    config: &Config,
) -> Result<()> {
    let all: Vec<Candidate> = candidates.find(None, None).await?.try_collect().await?;
    let result = candidates.delete_many(doc! {}, None).await?;
    warn!("Wiped {} candidates", result.deleted_count);

    for candidate in &all {
        if let Some(url) = &candidate.photo_url {
            delete_photo_object(storage, config, url).await;
        }
    }
    Ok(())
}

/// Rotate a dashboard passcode.
#[put("/maintenance/credentials", data = "<update>", format = "json")]
pub async fn rotate_credentials(
    _token: AuthToken<SuperAdmin>,
    update: Json<CredentialsUpdate>,
    settings: Coll<Setting>,
) -> Result<()> {
    if update.passcode.len() < MIN_PASSCODE_LENGTH {
        return Err(Error::Status(
            Status::BadRequest,
            format!("Passcodes must be at least {MIN_PASSCODE_LENGTH} characters"),
        ));
    }
    let key = match update.rights {
        Rights::Admin => ADMIN_PASSCODE,
        Rights::SuperAdmin => SUPER_ADMIN_PASSCODE,
        Rights::Voter => {
            return Err(Error::Status(
                Status::BadRequest,
                "Voter passcodes are derived, not configured".to_string(),
            ));
        }
    };
    Setting::put(&settings, key, hash_passcode(&update.passcode)).await?;
    warn!("Rotated the {} passcode", update.rights);
    Ok(())
}

/// Update the branding shown on the login screen. Absent fields are left
/// unchanged.
#[put("/maintenance/branding", data = "<update>", format = "json")]
pub async fn update_branding(
    _token: AuthToken<SuperAdmin>,
    update: Json<BrandingUpdate>,
    settings: Coll<Setting>,
) -> Result<()> {
    let update = update.0;
    if let Some(school_name) = update.school_name {
        Setting::put(&settings, SCHOOL_NAME, school_name).await?;
    }
    if let Some(logo_url) = update.logo_url {
        Setting::put(&settings, LOGO_URL, logo_url).await?;
    }
    Ok(())
}

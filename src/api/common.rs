use aws_sdk_s3::Client as S3Client;
use rocket::http::Status;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    db::settings::{Setting, ELECTION_OPEN},
    mongodb::Coll,
};

/// Reject the request unless voting is currently open.
pub async fn ensure_election_open(settings: &Coll<Setting>) -> Result<()> {
    if !Setting::get_bool(settings, ELECTION_OPEN).await? {
        return Err(Error::Status(
            Status::Forbidden,
            "The election is not open".to_string(),
        ));
    }
    Ok(())
}

/// Best-effort removal of a stored candidate photo; failures are logged
/// and swallowed, since a dangling object is preferable to a failed
/// candidate operation.
#[cfg_attr(test, allow(unused_variables))]
pub async fn delete_photo_object(storage: &S3Client, config: &Config, url: &str) {
    let prefix = format!("{}/", config.storage_url().trim_end_matches('/'));
    let key = match url.strip_prefix(&prefix) {
        Some(key) => key,
        None => {
            warn!("Photo URL '{url}' is outside the configured bucket");
            return;
        }
    };

    #[cfg(not(test))]
    if let Err(err) = storage
        .delete_object()
        .bucket(config.storage_bucket())
        .key(key)
        .send()
        .await
    {
        warn!("Failed to delete photo object '{key}': {err}");
    }

    #[cfg(test)]
    debug!("Skipping storage delete of '{key}' under test");
}

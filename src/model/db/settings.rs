//! The key-value `config` collection: election state, school-year label,
//! branding, and the dashboard credentials.

use mongodb::{
    bson::{doc, Bson},
    error::Error as DbError,
    options::ReplaceOptions,
};
use rand::Rng;
use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::{is_duplicate_key_error, Coll};

/// Username literals accepted by the login endpoint for the dashboards.
pub const ADMIN_USERNAME: &str = "admin";
pub const SUPER_ADMIN_USERNAME: &str = "superadmin";

/// Passcodes installed on first launch. Rotate them before going live.
pub const DEFAULT_ADMIN_PASSCODE: &str = "sslg-admin";
pub const DEFAULT_SUPER_ADMIN_PASSCODE: &str = "sslg-super";

// Setting keys.
pub const ELECTION_OPEN: &str = "election_open";
pub const SCHOOL_YEAR: &str = "school_year";
pub const SCHOOL_NAME: &str = "school_name";
pub const LOGO_URL: &str = "logo_url";
pub const ADMIN_PASSCODE: &str = "admin_passcode";
pub const SUPER_ADMIN_PASSCODE: &str = "super_admin_passcode";

/// A single key-value config entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    #[serde(rename = "_id")]
    pub key: String,
    pub value: Bson,
}

impl Setting {
    pub fn new(key: &str, value: impl Into<Bson>) -> Self {
        Self {
            key: key.to_string(),
            value: value.into(),
        }
    }

    /// Fetch a string-valued setting.
    pub async fn get_string(settings: &Coll<Setting>, key: &str) -> Result<String> {
        let setting = Self::get(settings, key).await?;
        setting
            .value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Self::wrong_type(key, "string"))
    }

    /// Fetch a boolean-valued setting.
    pub async fn get_bool(settings: &Coll<Setting>, key: &str) -> Result<bool> {
        let setting = Self::get(settings, key).await?;
        setting
            .value
            .as_bool()
            .ok_or_else(|| Self::wrong_type(key, "boolean"))
    }

    /// Insert or replace a setting.
    pub async fn put(settings: &Coll<Setting>, key: &str, value: impl Into<Bson>) -> Result<()> {
        let options = ReplaceOptions::builder().upsert(true).build();
        settings
            .replace_one(doc! { "_id": key }, Setting::new(key, value), options)
            .await?;
        Ok(())
    }

    async fn get(settings: &Coll<Setting>, key: &str) -> Result<Setting> {
        settings
            .find_one(doc! { "_id": key }, None)
            .await?
            .ok_or_else(|| Error::not_found(format!("Setting '{key}'")))
    }

    fn wrong_type(key: &str, expected: &str) -> Error {
        Error::Status(
            Status::InternalServerError,
            format!("Setting '{key}' is not a {expected}"),
        )
    }
}

/// Hash a dashboard passcode for storage.
pub fn hash_passcode(passcode: &str) -> String {
    // 16 bytes is recommended for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    argon2::hash_encoded(passcode.as_bytes(), &salt, &argon2::Config::default()).unwrap()
    // Safe because the default `Config` is valid.
}

/// Ensure every setting the server relies on exists, installing defaults
/// where missing. Idempotent; never overwrites existing values.
pub async fn ensure_settings_exist(settings: &Coll<Setting>) -> std::result::Result<(), DbError> {
    debug!("Ensuring config settings exist");

    ensure_default(settings, ELECTION_OPEN, false).await?;
    ensure_default(settings, SCHOOL_YEAR, "").await?;
    ensure_default(settings, SCHOOL_NAME, "").await?;
    ensure_default(settings, LOGO_URL, "").await?;
    let installed =
        ensure_default(settings, ADMIN_PASSCODE, hash_passcode(DEFAULT_ADMIN_PASSCODE)).await?;
    if installed {
        warn!("Installed the default admin passcode; rotate it before the election");
    }
    let installed = ensure_default(
        settings,
        SUPER_ADMIN_PASSCODE,
        hash_passcode(DEFAULT_SUPER_ADMIN_PASSCODE),
    )
    .await?;
    if installed {
        warn!("Installed the default super-admin passcode; rotate it before the election");
    }

    Ok(())
}

/// Insert the setting if it is absent. Returns true iff it was inserted.
async fn ensure_default(
    settings: &Coll<Setting>,
    key: &str,
    value: impl Into<Bson>,
) -> std::result::Result<bool, DbError> {
    if settings.find_one(doc! { "_id": key }, None).await?.is_some() {
        return Ok(false);
    }
    match settings.insert_one(Setting::new(key, value), None).await {
        Ok(_) => Ok(true),
        // Another instance bootstrapped concurrently; theirs wins.
        Err(err) if is_duplicate_key_error(&err) => Ok(false),
        Err(err) => Err(err),
    }
}

use serde::{Deserialize, Serialize};

use crate::model::{api::voter::VoterView, auth::Rights};

/// Dashboard passcodes must be at least this long when rotated.
pub const MIN_PASSCODE_LENGTH: usize = 8;

/// Raw login credentials, received from a user. These are never stored
/// directly.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub lrn: String,
    pub passcode: String,
}

/// Who just logged in; voters also get their roster entry so the ballot
/// screen can greet them and pick the right races.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub rights: Rights,
    pub voter: Option<VoterView>,
}

/// Credential rotation request for the dashboards.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialsUpdate {
    pub rights: Rights,
    pub passcode: String,
}

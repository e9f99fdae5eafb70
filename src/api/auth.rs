use mongodb::bson::doc;
use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    error::{Error, Result},
    model::{
        api::auth::{LoginRequest, LoginResponse},
        auth::{Admin, AuthToken, Rights, SuperAdmin, AUTH_TOKEN_COOKIE},
        db::{
            settings::{
                Setting, ADMIN_PASSCODE, ADMIN_USERNAME, SUPER_ADMIN_PASSCODE,
                SUPER_ADMIN_USERNAME,
            },
            voter::Voter,
        },
        mongodb::Coll,
        passcode,
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![login, logout]
}

#[post("/auth/login", data = "<request>", format = "json")]
pub async fn login(
    request: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    voters: Coll<Voter>,
    settings: Coll<Setting>,
    config: &State<Config>,
) -> Result<Json<LoginResponse>> {
    // The dashboards log in through the same form, under reserved
    // usernames instead of LRNs.
    if request.lrn == ADMIN_USERNAME {
        verify_dashboard_passcode(&settings, ADMIN_PASSCODE, &request.passcode).await?;
        cookies.add(AuthToken::new(&Admin).into_cookie(config));
        return Ok(Json(LoginResponse {
            rights: Rights::Admin,
            voter: None,
        }));
    }
    if request.lrn == SUPER_ADMIN_USERNAME {
        verify_dashboard_passcode(&settings, SUPER_ADMIN_PASSCODE, &request.passcode).await?;
        cookies.add(AuthToken::new(&SuperAdmin).into_cookie(config));
        return Ok(Json(LoginResponse {
            rights: Rights::SuperAdmin,
            voter: None,
        }));
    }

    // Voter login.
    let voter = voters
        .find_one(doc! { "lrn": &request.lrn }, None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Voter with LRN '{}'", request.lrn)))?;

    // Accept both the stored passcode and the freshly derived one, in
    // case the roster was edited by hand.
    let derived = passcode::derive(&voter.lrn, &voter.first_name, &voter.last_name);
    let submitted = &request.passcode;
    if !submitted.eq_ignore_ascii_case(&voter.passcode)
        && !submitted.eq_ignore_ascii_case(&derived)
    {
        return Err(Error::Status(
            Status::Unauthorized,
            "Incorrect passcode".to_string(),
        ));
    }

    if voter.has_voted {
        return Err(Error::Status(
            Status::Forbidden,
            "You have already cast your ballot".to_string(),
        ));
    }

    let token = AuthToken::new(&voter);
    cookies.add(token.into_cookie(config));

    Ok(Json(LoginResponse {
        rights: Rights::Voter,
        voter: Some(voter.into()),
    }))
}

#[delete("/auth")]
pub fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}

/// Check a submitted dashboard passcode against the hash stored under the
/// given settings key.
async fn verify_dashboard_passcode(
    settings: &Coll<Setting>,
    key: &str,
    submitted: &str,
) -> Result<()> {
    let hash = Setting::get_string(settings, key).await?;
    if !argon2::verify_encoded(&hash, submitted.as_bytes())? {
        return Err(Error::Status(
            Status::Unauthorized,
            "Incorrect dashboard passcode".to_string(),
        ));
    }
    Ok(())
}

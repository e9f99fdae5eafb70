use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::info::ElectionInfo,
        db::settings::{Setting, ELECTION_OPEN, LOGO_URL, SCHOOL_NAME, SCHOOL_YEAR},
        mongodb::Coll,
    },
};

pub fn routes() -> Vec<Route> {
    routes![election_info]
}

/// Election status and branding; the login screen renders this before
/// anyone has authenticated.
#[get("/election")]
pub async fn election_info(settings: Coll<Setting>) -> Result<Json<ElectionInfo>> {
    Ok(Json(ElectionInfo {
        open: Setting::get_bool(&settings, ELECTION_OPEN).await?,
        school_year: Setting::get_string(&settings, SCHOOL_YEAR).await?,
        school_name: Setting::get_string(&settings, SCHOOL_NAME).await?,
        logo_url: Setting::get_string(&settings, LOGO_URL).await?,
    }))
}

#[cfg(test)]
mod tests {
    use mongodb::Database;
    use rocket::{http::Status, local::asynchronous::Client, serde::json::serde_json};

    use super::*;

    async fn fetch_info(client: &Client) -> ElectionInfo {
        let response = client.get(uri!(election_info)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    #[backend_test]
    async fn defaults_are_closed_and_unbranded(client: Client) {
        let info = fetch_info(&client).await;
        assert_eq!(
            info,
            ElectionInfo {
                open: false,
                school_year: String::new(),
                school_name: String::new(),
                logo_url: String::new(),
            }
        );
    }

    #[backend_test]
    async fn reflects_settings_changes(client: Client, db: Database) {
        let settings = Coll::<Setting>::from_db(&db);
        Setting::put(&settings, ELECTION_OPEN, true).await.unwrap();
        Setting::put(&settings, SCHOOL_YEAR, "2025-2026").await.unwrap();
        Setting::put(&settings, SCHOOL_NAME, "San Isidro NHS").await.unwrap();

        let info = fetch_info(&client).await;
        assert!(info.open);
        assert_eq!(info.school_year, "2025-2026");
        assert_eq!(info.school_name, "San Isidro NHS");
        assert_eq!(info.logo_url, "");
    }
}

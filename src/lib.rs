//! Backend server for SSLG school student-government elections.
//!
//! Voters sign in with their LRN and a derived passcode and cast a single
//! ballot; admins manage the roster and candidates and watch live results;
//! the super-admin performs destructive maintenance between school years.

#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

use config::{ConfigFairing, DatabaseFairing, StorageFairing};
use logging::LoggerFairing;
use rocket::{Build, Rocket};

/// Assemble the server: config, database, photo storage, request logging,
/// and all API routes.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(StorageFairing)
        .attach(LoggerFairing)
        .mount("/", api::routes())
}

/// Get a database client for the configured `db_uri` (test version).
#[cfg(test)]
pub async fn db_client() -> mongodb::Client {
    let figment = rocket::build().figment().clone();
    let db_uri = figment
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(&db_uri)
        .await
        .expect("Could not connect to the test database")
}

/// Pick a fresh database name, avoiding collisions between tests.
#[cfg(test)]
pub fn database() -> String {
    let random: u32 = rand::random();
    format!("test{random}")
}

/// Build a rocket instance against an existing database connection,
/// performing the same bootstrap as [`config::DatabaseFairing`].
#[cfg(test)]
pub async fn rocket_for_db(db_client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    use crate::model::{
        db::settings::ensure_settings_exist,
        mongodb::{ensure_indexes_exist, Coll},
    };

    let db = db_client.database(db_name);
    ensure_indexes_exist(&db)
        .await
        .expect("Failed to create indexes");
    ensure_settings_exist(&Coll::from_db(&db))
        .await
        .expect("Failed to bootstrap settings");

    let storage = aws_sdk_s3::Client::new(&aws_config::load_from_env().await);

    rocket::build()
        .attach(ConfigFairing)
        .manage(db_client)
        .manage(db)
        .manage(storage)
        .mount("/", api::routes())
}

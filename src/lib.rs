#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{AiFairing, ConfigFairing, DatabaseFairing};
use crate::logging::LoggerFairing;

pub mod ai;
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod results;

pub use config::Config;

/// Where the API routes are mounted.
pub const API_BASE: &str = "/api";

/// Build the server. Configuration, the database connection and the AI
/// client are set up by fairings during ignition.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount(API_BASE, api::routes())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(AiFairing)
}

/// Connect to the database named by `db_uri`, for tests.
#[cfg(test)]
async fn db_client() -> mongodb::Client {
    let db_uri = rocket::Config::figment()
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` must be set to run database tests");
    mongodb::Client::with_uri_str(db_uri)
        .await
        .expect("Failed to connect to test database")
}

/// A fresh database name, for tests.
#[cfg(test)]
fn database() -> String {
    config::get_database_name()
}

/// Build the server against a specific database, for tests.
#[cfg(test)]
async fn rocket_for_db(client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    let db = client.database(db_name);
    model::mongodb::ensure_indexes_exist(&db)
        .await
        .expect("Failed to create test indexes");
    rocket::build()
        .mount(API_BASE, api::routes())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(AiFairing)
        .manage(client)
        .manage(db)
}

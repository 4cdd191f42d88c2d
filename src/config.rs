use chrono::Duration;
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::{ai::AiClient, model::mongodb::ensure_indexes_exist};

const DEFAULT_AI_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_AI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    // secrets
    jwt_secret: String,
}

impl Config {
    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: String,
}

/// A fairing that loads the MongoDB config, connects to the database,
/// ensures the indexes exist, and places both a `Client` and a `Database`
/// into managed state.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&get_database_name());

        // Ensure the required indexes exist.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to connect to database: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        // Manage the state.
        rocket = rocket.manage(client).manage(db);
        Ok(rocket)
    }
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
fn get_database_name() -> String {
    "formflow".to_string()
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
pub(crate) fn get_database_name() -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    info!("Using database {db}");
    db
}

/// Configuration for the generative-model API.
#[derive(Deserialize)]
struct AiConfig {
    // non-secrets
    #[serde(default = "default_ai_model")]
    ai_model: String,
    #[serde(default = "default_ai_endpoint")]
    ai_endpoint: String,
    // secrets
    #[serde(default)]
    ai_api_key: String,
}

fn default_ai_model() -> String {
    DEFAULT_AI_MODEL.to_string()
}

fn default_ai_endpoint() -> String {
    DEFAULT_AI_ENDPOINT.to_string()
}

/// A fairing that loads the AI config and places an [`AiClient`] into
/// managed state. An empty API key leaves the client disabled rather than
/// failing ignition.
pub struct AiFairing;

#[rocket::async_trait]
impl Fairing for AiFairing {
    fn info(&self) -> Info {
        Info {
            name: "Generative AI",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<AiConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load AI config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        // Construct the client.
        let client = match AiClient::new(config.ai_endpoint, config.ai_model, config.ai_api_key) {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to build AI client: {e}");
                return Err(rocket);
            }
        };
        if client.is_enabled() {
            info!("Loaded AI config, using model {}", client.model());
        } else {
            warn!("No AI API key configured, AI suggestions are disabled");
        }

        // Manage the state.
        rocket = rocket.manage(client);
        Ok(rocket)
    }
}

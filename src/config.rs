use chrono::Duration;
use log::{error, info, warn};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    figment::Figment,
    Build, Rocket,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    ai::{gemini::Gemini, AiService},
    media::{cloudinary::Cloudinary, Media},
    model::mongodb::ensure_indexes_exist,
};

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
    /// Valid lifetime of bearer tokens in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

#[cfg(test)]
impl Config {
    pub fn example() -> Self {
        Self {
            auth_ttl: 3600,
            jwt_secret: "test-secret".to_string(),
        }
    }
}

/// Extract a config section from the figment, logging a readable error on failure.
fn extract<T: DeserializeOwned>(figment: &Figment, what: &str) -> Option<T> {
    match figment.extract::<T>() {
        Ok(config) => Some(config),
        Err(e) => {
            error!("Failed to load {what} config");
            rocket::config::pretty_print_error(e);
            None
        }
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        match extract::<Config>(rocket.figment(), "application") {
            Some(config) => Ok(rocket.manage(config)),
            None => Err(rocket),
        }
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
pub struct DbConfig {
    // secrets
    pub db_uri: String,
    // non-secrets
    pub db_name: String,
}

/// A fairing that loads the MongoDB config, connects to the database,
/// performs any setup necessary, and places both a `Client` and a `Database`
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
        let Some(config) = extract::<DbConfig>(rocket.figment(), "database") else {
            return Err(rocket);
        };
        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(&config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&config.db_name);

        // Ensure the required indexes exist.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to set up database indexes: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        // Manage the state.
        rocket = rocket.manage(client).manage(db);
        Ok(rocket)
    }
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_ai_timeout() -> u64 {
    20
}

/// Configuration for the generative model behind the assistant.
#[derive(Deserialize)]
pub struct AiConfig {
    // secrets
    pub gemini_api_key: Option<String>,
    // non-secrets
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_ai_timeout")]
    pub ai_timeout: u64,
}

/// A fairing that loads the AI config and places an [`AiService`] into
/// managed state. Without an API key the service answers from keywords only.
pub struct AiFairing;

#[rocket::async_trait]
impl Fairing for AiFairing {
    fn info(&self) -> Info {
        Info {
            name: "Gemini",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let Some(config) = extract::<AiConfig>(rocket.figment(), "AI") else {
            return Err(rocket);
        };
        let service = match config.gemini_api_key {
            Some(ref api_key) if !api_key.is_empty() => {
                match Gemini::new(api_key.clone(), config.gemini_model.clone(), config.ai_timeout)
                {
                    Ok(model) => {
                        info!("Loaded Gemini config ({})", config.gemini_model);
                        AiService::new(Box::new(model))
                    }
                    Err(e) => {
                        error!("Failed to build Gemini client: {e}");
                        return Err(rocket);
                    }
                }
            }
            _ => {
                warn!("No Gemini API key configured, the assistant will use keyword replies");
                AiService::keywords_only()
            }
        };
        Ok(rocket.manage(service))
    }
}

fn default_media_timeout() -> u64 {
    60
}

/// Configuration for the media host.
#[derive(Deserialize)]
pub struct MediaConfig {
    // non-secrets
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    #[serde(default = "default_media_timeout")]
    pub media_timeout: u64,
    // secrets
    pub cloudinary_api_secret: Option<String>,
}

/// A fairing that loads the media host config and places a [`Media`] handle
/// into managed state. Without credentials, uploads fail.
pub struct MediaFairing;

#[rocket::async_trait]
impl Fairing for MediaFairing {
    fn info(&self) -> Info {
        Info {
            name: "Cloudinary",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let Some(config) = extract::<MediaConfig>(rocket.figment(), "media") else {
            return Err(rocket);
        };
        let media = match (
            config.cloudinary_cloud_name,
            config.cloudinary_api_key,
            config.cloudinary_api_secret,
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => {
                match Cloudinary::new(cloud_name.clone(), api_key, api_secret, config.media_timeout) {
                    Ok(host) => {
                        info!("Loaded Cloudinary config for cloud {cloud_name}");
                        Media::new(Box::new(host))
                    }
                    Err(e) => {
                        error!("Failed to build Cloudinary client: {e}");
                        return Err(rocket);
                    }
                }
            }
            _ => {
                warn!("Cloudinary is not configured, uploads will fail");
                Media::unconfigured()
            }
        };
        Ok(rocket.manage(media))
    }
}

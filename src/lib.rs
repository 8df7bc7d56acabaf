#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod ai;
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod media;
pub mod model;

use config::{AiFairing, ConfigFairing, DatabaseFairing, MediaFairing};
use logging::LoggerFairing;

/// Mount the routes and catchers shared by the server and the tests.
fn mount(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/", api::health_routes())
        .mount("/api", api::routes())
        .register("/", api::catchers())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(AiFairing)
        .attach(MediaFairing)
}

/// Build the server. The database connection is made when it is ignited.
pub fn build() -> Rocket<Build> {
    mount(rocket::build()).attach(DatabaseFairing)
}

/// Connect to the database named in the configuration.
#[cfg(test)]
pub(crate) async fn db_client() -> mongodb::Client {
    let config: config::DbConfig = rocket::Config::figment()
        .extract()
        .expect("Database config must be present for route tests");
    mongodb::Client::with_uri_str(&config.db_uri)
        .await
        .expect("Could not connect to the test database")
}

/// A fresh database name for one test.
#[cfg(test)]
pub(crate) fn database() -> String {
    let random: u32 = rand::random();
    format!("test{random}")
}

/// Build the server against an existing client and database.
#[cfg(test)]
pub(crate) async fn rocket_for_db(client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    let db = client.database(db_name);
    model::mongodb::ensure_indexes_exist(&db)
        .await
        .expect("Could not create indexes");
    mount(rocket::build()).manage(client).manage(db)
}

use mongodb::{bson::doc, Database};
use rocket::{
    http::Status,
    response::status,
    serde::json::{json, Json, Value},
    Catcher, Request, Route, State,
};

use crate::error::{error_body, Result};

mod ai;
mod analytics;
mod announcements;
mod attendance;
mod auth;
mod common;
mod gate_pass;
mod issues;
mod laundry;
mod lost_found;
mod marketplace;
mod mess;
mod notifications;
mod rooms;
mod users;

/// Every API route, to be mounted under `/api`.
pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(users::routes());
    routes.extend(issues::routes());
    routes.extend(announcements::routes());
    routes.extend(notifications::routes());
    routes.extend(mess::routes());
    routes.extend(laundry::routes());
    routes.extend(marketplace::routes());
    routes.extend(gate_pass::routes());
    routes.extend(attendance::routes());
    routes.extend(lost_found::routes());
    routes.extend(rooms::routes());
    routes.extend(analytics::routes());
    routes.extend(ai::routes());
    routes
}

pub fn health_routes() -> Vec<Route> {
    routes![health]
}

pub fn catchers() -> Vec<Catcher> {
    catchers![json_error]
}

#[get("/health")]
async fn health(db: &State<Database>) -> Result<Json<Value>> {
    db.run_command(doc! { "ping": 1 }, None).await?;
    Ok(Json(json!({ "status": "healthy", "database": "connected" })))
}

/// Render any error without a more specific responder as JSON.
#[catch(default)]
fn json_error(status: Status, _req: &Request) -> status::Custom<Json<Value>> {
    let detail = match status.code {
        401 => "Not authenticated",
        403 => "Insufficient permissions",
        404 => "Not found",
        422 => "Invalid request",
        _ => status.reason().unwrap_or("Unknown error"),
    };
    status::Custom(status, Json(error_body(status, detail)))
}

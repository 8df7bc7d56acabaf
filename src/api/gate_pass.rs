use chrono::Utc;
use mongodb::bson::Document;
use rocket::{response::status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::gate_pass::{NewGatePassRequest, PassStatusRequest},
        auth::{AuthToken, Management, Student},
        common::Role,
        db::{
            gate_pass::{GatePass, PassStatus},
            notification::{Notification, NotificationType},
        },
        mongodb::{Coll, Id},
    },
};

use super::common::{find_all, find_by_id, newest, notify};

const LIST_LIMIT: i64 = 100;

pub fn routes() -> Vec<Route> {
    routes![request_pass, list_passes, decide_pass, withdraw_pass]
}

#[post("/gatepass", data = "<request>", format = "json")]
async fn request_pass(
    token: AuthToken<Student>,
    request: Json<NewGatePassRequest>,
    passes: Coll<GatePass>,
    notifications: Coll<Notification>,
) -> Result<status::Created<Json<GatePass>>> {
    request.validate()?;
    if passes
        .find_one(GatePass::active_filter(&token.id), None)
        .await?
        .is_some()
    {
        return Err(Error::conflict("You already have a pending or approved gate pass"));
    }

    let pass = GatePass::new(&token, request.0);
    passes.insert_one(&pass, None).await?;

    notify(
        &notifications,
        Notification::for_role(
            Role::Management,
            NotificationType::GatePassRequest,
            format!("Gate pass request from {}", pass.student_name),
            format!("{} to {}", pass.kind.as_str(), pass.destination),
        )
        .about(&pass.id, "/gatepass"),
    )
    .await;

    let location = format!("/api/gatepass/{}", pass.id);
    Ok(status::Created::new(location).body(Json(pass)))
}

/// Students only ever see their own passes, whatever `student_id` they ask for.
#[get("/gatepass?<status>&<student_id>")]
async fn list_passes(
    token: AuthToken,
    status: Option<PassStatus>,
    student_id: Option<Id>,
    passes: Coll<GatePass>,
) -> Result<Json<Vec<GatePass>>> {
    let mut filter = Document::new();
    if let Some(status) = status {
        filter.insert("status", status);
    }
    let student = match token.role {
        Role::Student => Some(token.id.clone()),
        Role::Management => student_id,
    };
    if let Some(student) = student {
        filter.insert("student_id", student);
    }
    Ok(Json(find_all(&passes, filter, newest(LIST_LIMIT)).await?))
}

#[patch("/gatepass/<id>/status", data = "<request>", format = "json")]
async fn decide_pass(
    token: AuthToken<Management>,
    id: Id,
    request: Json<PassStatusRequest>,
    passes: Coll<GatePass>,
    notifications: Coll<Notification>,
) -> Result<Json<GatePass>> {
    let pass = find_by_id(&passes, &id, "Gate pass").await?;
    let request = request.0;
    let update = GatePass::status_update(request.status, request.reason, &token, Utc::now());
    passes.update_one(id.as_doc(), update, None).await?;
    let updated = find_by_id(&passes, &id, "Gate pass").await?;

    let mut message = format!("Your {} pass is now {}", pass.kind.as_str(), updated.status.as_str());
    if let (PassStatus::Rejected, Some(reason)) = (updated.status, &updated.rejection_reason) {
        message = format!("{message}: {reason}");
    }
    notify(
        &notifications,
        Notification::new(
            pass.student_id.as_str(),
            NotificationType::GatePassUpdate,
            format!("Gate pass {}", updated.status.as_str()),
            message,
        )
        .about(&pass.id, "/gatepass"),
    )
    .await;

    Ok(Json(updated))
}

#[delete("/gatepass/<id>")]
async fn withdraw_pass(
    token: AuthToken<Student>,
    id: Id,
    passes: Coll<GatePass>,
) -> Result<status::NoContent> {
    let pass = find_by_id(&passes, &id, "Gate pass").await?;
    if pass.student_id != token.id {
        return Err(Error::forbidden("Not your gate pass"));
    }
    if pass.status != PassStatus::Pending {
        return Err(Error::conflict("Only pending passes can be withdrawn"));
    }
    passes.delete_one(id.as_doc(), None).await?;
    Ok(status::NoContent)
}

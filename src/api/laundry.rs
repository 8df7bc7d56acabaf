use chrono::{Duration, Utc};
use log::debug;
use mongodb::{
    bson::{doc, Document},
    options::FindOptions,
};
use rocket::{response::status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::laundry::{MachineStatusRequest, NewMachineRequest, UseMachineRequest},
        auth::{AuthToken, Management},
        db::laundry::{LaundryMachine, MachineStatus},
        mongodb::{Coll, Id},
    },
};

use super::common::{find_all, find_by_id};

pub fn routes() -> Vec<Route> {
    routes![add_machine, list_machines, use_machine, release_machine, set_status]
}

#[post("/laundry/machines", data = "<request>", format = "json")]
async fn add_machine(
    _token: AuthToken<Management>,
    request: Json<NewMachineRequest>,
    machines: Coll<LaundryMachine>,
) -> Result<status::Created<Json<LaundryMachine>>> {
    request.validate()?;
    let machine = LaundryMachine::new(request.0);
    machines.insert_one(&machine, None).await?;
    let location = format!("/api/laundry/machines/{}", machine.id);
    Ok(status::Created::new(location).body(Json(machine)))
}

/// List machines, freeing any whose reservation has run out.
#[get("/laundry/machines?<block>")]
async fn list_machines(
    _token: AuthToken,
    block: Option<String>,
    machines: Coll<LaundryMachine>,
) -> Result<Json<Vec<LaundryMachine>>> {
    let mut filter = Document::new();
    if let Some(block) = block {
        filter.insert("block", block);
    }
    let options = FindOptions::builder()
        .sort(doc! { "block": 1, "floor": 1, "machine_number": 1 })
        .build();
    let mut listed = find_all(&machines, filter, options).await?;

    let now = Utc::now();
    for machine in listed.iter_mut() {
        if machine.release_if_expired(now) {
            debug!("Releasing expired reservation on machine {}", machine.id);
            machines
                .update_one(
                    doc! { "id": &machine.id, "status": MachineStatus::InUse },
                    LaundryMachine::reset(MachineStatus::Available, now),
                    None,
                )
                .await?;
        }
    }
    Ok(Json(listed))
}

#[post("/laundry/machines/<id>/use", data = "<request>", format = "json")]
async fn use_machine(
    token: AuthToken,
    id: Id,
    request: Json<UseMachineRequest>,
    machines: Coll<LaundryMachine>,
) -> Result<Json<LaundryMachine>> {
    request.validate()?;
    find_by_id(&machines, &id, "Machine").await?;

    let now = Utc::now();
    let duration = Duration::minutes(i64::from(request.duration_minutes));
    let result = machines
        .update_one(
            LaundryMachine::reservable_filter(&id, now),
            LaundryMachine::reservation(&token, now, duration),
            None,
        )
        .await?;
    if result.matched_count == 0 {
        return Err(Error::conflict("Machine is not available"));
    }
    Ok(Json(find_by_id(&machines, &id, "Machine").await?))
}

#[post("/laundry/machines/<id>/release")]
async fn release_machine(
    token: AuthToken,
    id: Id,
    machines: Coll<LaundryMachine>,
) -> Result<Json<LaundryMachine>> {
    let machine = find_by_id(&machines, &id, "Machine").await?;
    if !machine.can_release(&token) {
        return Err(Error::forbidden("Not authorized to release this machine"));
    }
    machines
        .update_one(
            id.as_doc(),
            LaundryMachine::reset(MachineStatus::Available, Utc::now()),
            None,
        )
        .await?;
    Ok(Json(find_by_id(&machines, &id, "Machine").await?))
}

#[patch("/laundry/machines/<id>/status", data = "<request>", format = "json")]
async fn set_status(
    _token: AuthToken<Management>,
    id: Id,
    request: Json<MachineStatusRequest>,
    machines: Coll<LaundryMachine>,
) -> Result<Json<LaundryMachine>> {
    request.validate()?;
    let result = machines
        .update_one(
            id.as_doc(),
            LaundryMachine::reset(request.status, Utc::now()),
            None,
        )
        .await?;
    if result.matched_count == 0 {
        return Err(Error::not_found("Machine"));
    }
    Ok(Json(find_by_id(&machines, &id, "Machine").await?))
}

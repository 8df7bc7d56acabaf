use mongodb::bson::doc;
use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::rooms::{occupancy, Room, DEFAULT_HOSTEL},
        auth::{AuthToken, Management},
        common::Role,
        db::user::User,
        mongodb::Coll,
    },
};

use super::common::find_all;

pub fn routes() -> Vec<Route> {
    routes![room_occupancy]
}

#[get("/rooms/occupancy?<hostel>")]
async fn room_occupancy(
    _token: AuthToken<Management>,
    hostel: Option<&str>,
    users: Coll<User>,
) -> Result<Json<Vec<Room>>> {
    let hostel = hostel.unwrap_or(DEFAULT_HOSTEL);
    let filter = doc! { "role": Role::Student, "hostel": hostel, "is_active": true };
    let residents = find_all(&users, filter, None).await?;
    Ok(Json(occupancy(&residents)))
}

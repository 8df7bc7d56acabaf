use chrono::{NaiveDate, Utc};
use mongodb::{
    bson::{doc, Document},
    options::{FindOptions, UpdateOptions},
};
use rocket::{serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::attendance::{MarkAttendanceRequest, DATE_FORMAT},
        auth::{AuthToken, Management},
        common::{as_bson, Role},
        db::{
            attendance::{Attendance, AttendanceStats},
            user::User,
        },
        mongodb::{Coll, Id},
    },
};

use super::common::{find_all, newest_by};

const LIST_LIMIT: i64 = 100;

pub fn routes() -> Vec<Route> {
    routes![mark_attendance, list_attendance, attendance_stats]
}

/// Students may only look at their own records.
fn check_own(user: &User, student_id: &Id) -> Result<()> {
    if user.role == Role::Student && &user.id != student_id {
        Err(Error::forbidden("Students can only view their own attendance"))
    } else {
        Ok(())
    }
}

#[post("/attendance", data = "<request>", format = "json")]
async fn mark_attendance(
    token: AuthToken<Management>,
    request: Json<MarkAttendanceRequest>,
    users: Coll<User>,
    records: Coll<Attendance>,
) -> Result<Json<Attendance>> {
    let student = users
        .find_one(doc! { "id": &request.student_id, "role": Role::Student }, None)
        .await?
        .ok_or_else(|| Error::not_found("Student"))?;

    let (filter, update) = Attendance::upsert(&student, &request, &token, Utc::now());
    let options = UpdateOptions::builder().upsert(true).build();
    records.update_one(filter.clone(), update, options).await?;

    records
        .find_one(filter, None)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("Attendance"))
}

#[get("/attendance?<student_id>&<date>&<hostel>")]
async fn list_attendance(
    token: AuthToken,
    student_id: Option<Id>,
    date: Option<&str>,
    hostel: Option<String>,
    records: Coll<Attendance>,
) -> Result<Json<Vec<Attendance>>> {
    let mut filter = Document::new();
    let student = match (token.role, student_id) {
        (Role::Student, None) => Some(token.id.clone()),
        (_, Some(student_id)) => {
            check_own(&token, &student_id)?;
            Some(student_id)
        }
        (Role::Management, None) => None,
    };
    if let Some(student) = student {
        filter.insert("student_id", student);
    }
    if let Some(date) = date {
        let day = NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|_| Error::invalid(format!("Dates must look like YYYY-MM-DD, not {date}")))?;
        filter.insert("date", as_bson(&day));
    }
    if let Some(hostel) = hostel {
        filter.insert("hostel", hostel);
    }
    let options: FindOptions = newest_by("date", LIST_LIMIT);
    Ok(Json(find_all(&records, filter, options).await?))
}

#[get("/attendance/stats/<student_id>")]
async fn attendance_stats(
    token: AuthToken,
    student_id: Id,
    records: Coll<Attendance>,
) -> Result<Json<AttendanceStats>> {
    check_own(&token, &student_id)?;
    let history = find_all(&records, doc! { "student_id": &student_id }, None).await?;
    Ok(Json(AttendanceStats::from_statuses(
        history.into_iter().map(|record| record.status),
    )))
}

use mongodb::bson::doc;
use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::auth::UserView,
        auth::{AuthToken, Management},
        common::Role,
        db::user::User,
        mongodb::Coll,
    },
};

use super::common::find_all;

pub fn routes() -> Vec<Route> {
    routes![staff, students]
}

#[get("/users/staff")]
async fn staff(_token: AuthToken<Management>, users: Coll<User>) -> Result<Json<Vec<UserView>>> {
    let staff = find_all(&users, doc! { "role": Role::Management }, None).await?;
    Ok(Json(staff.into_iter().map(UserView::from).collect()))
}

#[get("/users/students?<hostel>")]
async fn students(
    _token: AuthToken<Management>,
    hostel: Option<String>,
    users: Coll<User>,
) -> Result<Json<Vec<UserView>>> {
    let mut filter = doc! { "role": Role::Student };
    if let Some(hostel) = hostel {
        filter.insert("hostel", hostel);
    }
    let students = find_all(&users, filter, None).await?;
    Ok(Json(students.into_iter().map(UserView::from).collect()))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json::json,
    };

    use crate::model::api::auth::{Bearer, RegisterRequest};

    use super::*;

    #[backend_test(management)]
    async fn students_by_hostel(client: Client, bearer: Bearer) {
        for request in [
            RegisterRequest::example_student(),
            RegisterRequest::example_other_student(),
        ] {
            client
                .post("/api/auth/register")
                .header(ContentType::JSON)
                .body(json!(request).to_string())
                .dispatch()
                .await;
        }

        let response = client
            .get(uri!("/api", students(Some("B"))))
            .header(bearer.clone())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let in_b: Vec<UserView> = response.into_json().await.unwrap();
        assert_eq!(in_b.len(), 1);
        assert_eq!(in_b[0].email, "vikram@example.edu");

        let response = client
            .get(uri!("/api", students(_)))
            .header(bearer.clone())
            .dispatch()
            .await;
        let everyone: Vec<UserView> = response.into_json().await.unwrap();
        assert_eq!(everyone.len(), 2);

        let response = client
            .get(uri!("/api", staff))
            .header(bearer)
            .dispatch()
            .await;
        let staff: Vec<UserView> = response.into_json().await.unwrap();
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0].role, Role::Management);
    }

    #[backend_test(student)]
    async fn students_cannot_list(client: Client, bearer: Bearer) {
        let response = client
            .get(uri!("/api", staff))
            .header(bearer)
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
    }
}

use mongodb::bson::doc;
use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::analytics::DashboardStats,
        auth::{AuthToken, Management},
        db::issue::{Issue, Visibility},
        mongodb::Coll,
    },
};

use super::common::find_all;

pub fn routes() -> Vec<Route> {
    routes![dashboard]
}

/// Headline numbers over every public issue.
#[get("/analytics/dashboard")]
async fn dashboard(
    _token: AuthToken<Management>,
    issues: Coll<Issue>,
) -> Result<Json<DashboardStats>> {
    let public = find_all(&issues, doc! { "visibility": Visibility::Public }, None).await?;
    Ok(Json(DashboardStats::from_issues(&public)))
}

#[cfg(test)]
mod tests {
    use rocket::{http::Status, local::asynchronous::Client};

    use crate::model::{
        api::{auth::Bearer, issue::NewIssueRequest},
        db::{issue::IssueStatus, user::User},
    };

    use super::*;

    #[backend_test(management)]
    async fn counts_public_issues(client: Client, bearer: Bearer, issues: Coll<Issue>) {
        let reporter = User::example_student();
        let mut resolved = Issue::example(&reporter);
        resolved.status = IssueStatus::Resolved;
        let private = Issue::new(&reporter, NewIssueRequest::example_private(), None);
        issues
            .insert_many([Issue::example(&reporter), resolved, private], None)
            .await
            .unwrap();

        let response = client
            .get(uri!("/api", dashboard))
            .header(bearer)
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let stats: DashboardStats = response.into_json().await.unwrap();
        assert_eq!(stats.total_issues, 2);
        assert_eq!(stats.open_issues, 1);
        assert_eq!(stats.resolved_issues, 1);
        assert_eq!(stats.resolution_rate, 50.0);
    }

    #[backend_test(student)]
    async fn students_cannot_view(client: Client, bearer: Bearer) {
        let response = client
            .get(uri!("/api", dashboard))
            .header(bearer)
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
    }
}

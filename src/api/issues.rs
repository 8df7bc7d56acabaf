use chrono::Utc;
use mongodb::bson::{doc, Document};
use rocket::{form::Form, response::status, serde::json::Json, Route, State};

use crate::{
    ai::AiService,
    error::{Error, Result},
    media::Media,
    model::{
        api::{
            analytics::{hostel_breakdown, BlockStatus, GroupCount},
            issue::{
                CommentRequest, FeedbackRequest, IssueUpdate, LikeResponse, NewIssueRequest,
                UpvoteResponse,
            },
            pagination::Pagination,
        },
        auth::{AuthToken, Management},
        common::{as_bson, MediaItem, Role},
        db::{
            issue::{
                toggle_membership, Comment, Feedback, Issue, IssueCategory, IssuePriority,
                IssueStatus, Visibility,
            },
            notification::{Notification, NotificationType},
            user::User,
        },
        mongodb::{Coll, Id},
    },
};

use super::common::{contains_text, find_all, find_by_id, newest, notify, Upload};

const SEARCH_LIMIT: i64 = 50;

pub fn routes() -> Vec<Route> {
    routes![
        create_issue,
        list_issues,
        search_issues,
        get_issue,
        update_status,
        add_comment,
        like_comment,
        upvote,
        upload_media,
        give_feedback,
        merge_issue,
        hostel_analytics,
    ]
}

/// Load an issue the user is allowed to see.
async fn visible_issue(issues: &Coll<Issue>, id: &Id, user: &User) -> Result<Issue> {
    let issue = find_by_id(issues, id, "Issue").await?;
    if issue.is_visible_to(user) {
        Ok(issue)
    } else {
        Err(Error::forbidden("Not authorized to view this issue"))
    }
}

/// Filter on the optional category, priority and status query parameters.
fn attribute_filter(
    status: Option<IssueStatus>,
    category: Option<IssueCategory>,
    priority: Option<IssuePriority>,
) -> Document {
    let mut filter = Document::new();
    if let Some(status) = status {
        filter.insert("status", status);
    }
    if let Some(category) = category {
        filter.insert("category", category);
    }
    if let Some(priority) = priority {
        filter.insert("priority", priority);
    }
    filter
}

#[post("/issues", data = "<request>", format = "json")]
async fn create_issue(
    token: AuthToken,
    request: Json<NewIssueRequest>,
    ai: &State<AiService>,
    issues: Coll<Issue>,
    notifications: Coll<Notification>,
) -> Result<status::Created<Json<Issue>>> {
    request.validate()?;
    let prediction = ai.categorize(&request.title, &request.description).await;
    let issue = Issue::new(&token, request.0, Some(prediction));
    issues.insert_one(&issue, None).await?;

    notify(
        &notifications,
        Notification::for_role(
            Role::Management,
            NotificationType::NewIssue,
            format!("New issue {}", issue.ticket_id),
            format!("{} reported: {}", issue.reporter_name, issue.title),
        )
        .about_issue(&issue.id)
        .with_priority(issue.priority.as_str()),
    )
    .await;

    let location = format!("/api/issues/{}", issue.id);
    Ok(status::Created::new(location).body(Json(issue)))
}

#[get("/issues?<status>&<category>&<priority>")]
async fn list_issues(
    token: AuthToken,
    status: Option<IssueStatus>,
    category: Option<IssueCategory>,
    priority: Option<IssuePriority>,
    pagination: Pagination,
    issues: Coll<Issue>,
) -> Result<Json<Vec<Issue>>> {
    let mut filter = attribute_filter(status, category, priority);
    if let Some(visible) = Issue::visibility_filter(&token) {
        filter.extend(visible);
    }
    let mut options = newest(pagination.limit());
    options.skip = Some(pagination.skip());
    Ok(Json(find_all(&issues, filter, options).await?))
}

#[get("/issues/search?<query>&<category>&<priority>&<status>&<visibility>")]
async fn search_issues(
    token: AuthToken,
    query: Option<String>,
    category: Option<IssueCategory>,
    priority: Option<IssuePriority>,
    status: Option<IssueStatus>,
    visibility: Option<Visibility>,
    issues: Coll<Issue>,
) -> Result<Json<Vec<Issue>>> {
    let mut clauses = vec![attribute_filter(status, category, priority)];
    if let Some(query) = query.filter(|q| !q.trim().is_empty()) {
        let text = contains_text(&query);
        clauses.push(doc! {
            "$or": [
                { "title": text.clone() },
                { "description": text.clone() },
                { "ticket_id": text },
            ]
        });
    }
    if let Some(visibility) = visibility {
        clauses.push(doc! { "visibility": visibility });
        // Asking for a visibility narrows students to their own issues.
        if token.role == Role::Student {
            clauses.push(doc! { "reporter_id": &token.id });
        }
    } else if let Some(visible) = Issue::visibility_filter(&token) {
        clauses.push(visible);
    }
    let filter = doc! { "$and": clauses };
    Ok(Json(find_all(&issues, filter, newest(SEARCH_LIMIT)).await?))
}

#[get("/issues/<id>")]
async fn get_issue(token: AuthToken, id: Id, issues: Coll<Issue>) -> Result<Json<Issue>> {
    let mut issue = visible_issue(&issues, &id, &token).await?;
    issues
        .update_one(id.as_doc(), doc! { "$inc": { "views": 1 } }, None)
        .await?;
    issue.views += 1;
    Ok(Json(issue))
}

#[patch("/issues/<id>/status", data = "<update>", format = "json")]
async fn update_status(
    token: AuthToken<Management>,
    id: Id,
    update: Json<IssueUpdate>,
    issues: Coll<Issue>,
    users: Coll<User>,
    notifications: Coll<Notification>,
) -> Result<Json<Issue>> {
    let issue = find_by_id(&issues, &id, "Issue").await?;

    // An unknown assignee is ignored rather than rejected.
    let assignee = match &update.assigned_to {
        Some(assignee_id) => users.find_one(assignee_id.as_doc(), None).await?,
        None => None,
    };

    let now = Utc::now();
    let changes = issue.status_update(&token, &update, assignee.as_ref(), now);
    issues.update_one(id.as_doc(), changes, None).await?;

    if let Some(status) = update.status {
        let kind = if status == IssueStatus::Resolved {
            NotificationType::IssueResolved
        } else {
            NotificationType::StatusUpdate
        };
        notify(
            &notifications,
            Notification::new(
                issue.reporter_id.as_str(),
                kind,
                format!("Issue {} is now {}", issue.ticket_id, status.as_str()),
                format!("{} updated \"{}\"", token.name, issue.title),
            )
            .about_issue(&issue.id),
        )
        .await;
    }
    if let Some(assignee) = &assignee {
        notify(
            &notifications,
            Notification::new(
                assignee.id.as_str(),
                NotificationType::IssueAssigned,
                format!("Issue {} assigned to you", issue.ticket_id),
                issue.title.clone(),
            )
            .about_issue(&issue.id)
            .with_priority(update.priority.unwrap_or(issue.priority).as_str()),
        )
        .await;
    }

    Ok(Json(find_by_id(&issues, &id, "Issue").await?))
}

#[post("/issues/<id>/comments", data = "<request>", format = "json")]
async fn add_comment(
    token: AuthToken,
    id: Id,
    request: Json<CommentRequest>,
    issues: Coll<Issue>,
    notifications: Coll<Notification>,
) -> Result<status::Created<Json<Comment>>> {
    request.validate()?;
    let issue = visible_issue(&issues, &id, &token).await?;
    let comment = Comment::new(&token, request.0);
    issues
        .update_one(
            id.as_doc(),
            doc! {
                "$push": { "comments": as_bson(&comment) },
                "$set": { "updated_at": comment.created_at.timestamp_millis() },
            },
            None,
        )
        .await?;

    if issue.reporter_id != token.id {
        notify(
            &notifications,
            Notification::new(
                issue.reporter_id.as_str(),
                NotificationType::NewComment,
                format!("New comment on {}", issue.ticket_id),
                format!("{}: {}", comment.user_name, comment.text),
            )
            .about_issue(&issue.id),
        )
        .await;
    }

    let location = format!("/api/issues/{id}");
    Ok(status::Created::new(location).body(Json(comment)))
}

#[post("/issues/<id>/comments/<comment_id>/like")]
async fn like_comment(
    token: AuthToken,
    id: Id,
    comment_id: Id,
    issues: Coll<Issue>,
) -> Result<Json<LikeResponse>> {
    let issue = visible_issue(&issues, &id, &token).await?;
    let mut likes = issue
        .comment(&comment_id)
        .ok_or_else(|| Error::not_found("Comment"))?
        .likes
        .clone();
    let has_liked = toggle_membership(&mut likes, &token.id);

    let operator = if has_liked { "$addToSet" } else { "$pull" };
    let mut update = Document::new();
    update.insert(operator, doc! { "comments.$.likes": &token.id });
    issues
        .update_one(
            doc! { "id": &id, "comments.id": &comment_id },
            update,
            None,
        )
        .await?;

    Ok(Json(LikeResponse {
        likes_count: likes.len(),
        has_liked,
    }))
}

#[post("/issues/<id>/upvote")]
async fn upvote(token: AuthToken, id: Id, issues: Coll<Issue>) -> Result<Json<UpvoteResponse>> {
    let issue = visible_issue(&issues, &id, &token).await?;
    let mut upvotes = issue.upvotes;
    let has_upvoted = toggle_membership(&mut upvotes, &token.id);

    let operator = if has_upvoted { "$addToSet" } else { "$pull" };
    let mut update = Document::new();
    update.insert(operator, doc! { "upvotes": &token.id });
    issues.update_one(id.as_doc(), update, None).await?;

    Ok(Json(UpvoteResponse {
        upvote_count: upvotes.len(),
        has_upvoted,
    }))
}

#[post("/issues/<id>/upload", data = "<upload>")]
async fn upload_media(
    token: AuthToken,
    id: Id,
    upload: Form<Upload<'_>>,
    media: &State<Media>,
    issues: Coll<Issue>,
) -> Result<Json<MediaItem>> {
    let issue = find_by_id(&issues, &id, "Issue").await?;
    if issue.reporter_id != token.id && !token.role.is_management() {
        return Err(Error::forbidden("Only the reporter or management can attach files"));
    }
    let item: MediaItem = upload.send(media, "hostel/issues").await?.into();
    issues
        .update_one(
            id.as_doc(),
            doc! {
                "$push": { "media": as_bson(&item) },
                "$set": { "updated_at": Utc::now().timestamp_millis() },
            },
            None,
        )
        .await?;
    Ok(Json(item))
}

#[post("/issues/<id>/feedback", data = "<request>", format = "json")]
async fn give_feedback(
    token: AuthToken,
    id: Id,
    request: Json<FeedbackRequest>,
    issues: Coll<Issue>,
) -> Result<Json<Issue>> {
    request.validate()?;
    let issue = find_by_id(&issues, &id, "Issue").await?;
    if issue.reporter_id != token.id {
        return Err(Error::forbidden("Only the reporter can give feedback"));
    }
    if !issue.accepts_feedback() {
        return Err(Error::bad_request(
            "Feedback is only accepted once the issue is resolved",
        ));
    }
    let feedback: Feedback = request.0.into();
    issues
        .update_one(
            id.as_doc(),
            doc! {
                "$set": {
                    "feedback": as_bson(&feedback),
                    "updated_at": feedback.submitted_at.timestamp_millis(),
                },
            },
            None,
        )
        .await?;
    Ok(Json(find_by_id(&issues, &id, "Issue").await?))
}

#[post("/issues/<id>/merge/<duplicate_id>")]
async fn merge_issue(
    token: AuthToken<Management>,
    id: Id,
    duplicate_id: Id,
    issues: Coll<Issue>,
) -> Result<Json<Issue>> {
    if id == duplicate_id {
        return Err(Error::bad_request("Cannot merge an issue into itself"));
    }
    let canonical = find_by_id(&issues, &id, "Issue").await?;
    let duplicate = find_by_id(&issues, &duplicate_id, "Duplicate issue").await?;

    let (canonical_update, duplicate_update) =
        canonical.merge_updates(&duplicate, &token, Utc::now());
    issues.update_one(id.as_doc(), canonical_update, None).await?;
    issues
        .update_one(duplicate_id.as_doc(), duplicate_update, None)
        .await?;

    Ok(Json(find_by_id(&issues, &id, "Issue").await?))
}

#[get("/issues/analytics/by-hostel/<hostel>")]
async fn hostel_analytics(
    _token: AuthToken<Management>,
    hostel: &str,
    issues: Coll<Issue>,
) -> Result<Json<Vec<GroupCount<BlockStatus>>>> {
    let filter = doc! { "visibility": Visibility::Public, "location.hostel": hostel };
    let public = find_all(&issues, filter, None).await?;
    Ok(Json(hostel_breakdown(&public)))
}

use axum::extract::{Extension, Path, Query, State};
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use jansetu_domain::access::AccessRequirements;
use jansetu_domain::auth::Role;
use jansetu_domain::issues::{Issue, IssueCategory, IssueCreate, IssueListFilter, TimelineEntry};
use jansetu_domain::sla::{IssueStatus, Priority, SlaSnapshot};
use jansetu_domain::util::now_ms;

use crate::error::ApiError;
use crate::middleware::{AuthContext, authorize};
use crate::observability;
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIssueRequest {
    pub ulb_id: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: String,
    pub category: String,
    pub priority: String,
    #[validate(length(min = 1, max = 300))]
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct ListIssuesQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignIssueRequest {
    #[validate(length(min = 1, max = 128))]
    pub assignee_id: String,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TransitionIssueRequest {
    pub status: String,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 1000))]
    pub body: String,
}

#[derive(Serialize)]
pub struct SlaResponse {
    pub classification: &'static str,
    pub progress_fraction: f64,
    pub hours_remaining: f64,
    pub is_urgent: bool,
    pub display_remaining: String,
}

impl From<SlaSnapshot> for SlaResponse {
    fn from(snapshot: SlaSnapshot) -> Self {
        Self {
            classification: snapshot.classification.as_str(),
            progress_fraction: snapshot.progress_fraction,
            hours_remaining: snapshot.hours_remaining,
            is_urgent: snapshot.is_urgent(),
            display_remaining: snapshot.display_remaining(),
        }
    }
}

fn parse_category(value: &str) -> Result<IssueCategory, ApiError> {
    IssueCategory::parse(value)
        .ok_or_else(|| ApiError::Validation(format!("unknown category: {value}")))
}

fn parse_priority(value: &str) -> Result<Priority, ApiError> {
    Priority::parse(value).ok_or_else(|| ApiError::Validation(format!("unknown priority: {value}")))
}

fn parse_status(value: &str) -> Result<IssueStatus, ApiError> {
    IssueStatus::parse(value)
        .ok_or_else(|| ApiError::Validation(format!("unknown status: {value}")))
}

pub async fn create_issue(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<CreateIssueRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate(&payload)?;
    // Any authenticated user may report an issue.
    let session = authorize(&ctx, &AccessRequirements::none())?;

    let input = IssueCreate {
        ulb_id: payload.ulb_id,
        title: payload.title,
        description: payload.description,
        category: parse_category(&payload.category)?,
        priority: parse_priority(&payload.priority)?,
        address: payload.address,
    };
    let issue = state
        .issues
        .report(&session, input, now_ms())
        .await
        .map_err(ApiError::from)?;

    observability::register_issue_reported(
        &issue.ulb_id,
        issue.priority.as_str(),
        issue.category.as_str(),
    );
    Ok((StatusCode::CREATED, Json(issue)))
}

pub async fn list_issues(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ListIssuesQuery>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    let session = authorize(&ctx, &AccessRequirements::permission("dashboard.view"))?;

    let filter = IssueListFilter {
        status: query.status.as_deref().map(parse_status).transpose()?,
        priority: query.priority.as_deref().map(parse_priority).transpose()?,
        category: query.category.as_deref().map(parse_category).transpose()?,
        assigned_to: query.assigned_to,
    };
    let issues = state
        .issues
        .list(&session, &filter)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(issues))
}

pub async fn get_issue(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(issue_id): Path<String>,
) -> Result<Json<Issue>, ApiError> {
    let session = authorize(&ctx, &AccessRequirements::permission("dashboard.view"))?;
    let issue = state
        .issues
        .get(&session, &issue_id)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(issue))
}

pub async fn get_issue_timeline(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(issue_id): Path<String>,
) -> Result<Json<Vec<TimelineEntry>>, ApiError> {
    let session = authorize(&ctx, &AccessRequirements::permission("dashboard.view"))?;
    let timeline = state
        .issues
        .timeline(&session, &issue_id)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(timeline))
}

pub async fn get_issue_sla(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(issue_id): Path<String>,
) -> Result<Json<SlaResponse>, ApiError> {
    let session = authorize(&ctx, &AccessRequirements::permission("dashboard.view"))?;
    let issue = state
        .issues
        .get(&session, &issue_id)
        .await
        .map_err(ApiError::from)?;
    let snapshot = issue.sla_snapshot(now_ms()).map_err(ApiError::from)?;
    Ok(Json(snapshot.into()))
}

pub async fn assign_issue(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(issue_id): Path<String>,
    Json(payload): Json<AssignIssueRequest>,
) -> Result<Json<Issue>, ApiError> {
    validation::validate(&payload)?;
    let requirements = AccessRequirements {
        roles: vec![Role::SuperAdmin, Role::Admin, Role::Manager],
        permissions: vec!["issues.manage".to_string()],
    };
    let session = authorize(&ctx, &requirements)?;

    let issue = state
        .issues
        .assign(
            &session,
            &issue_id,
            &payload.assignee_id,
            payload.note,
            now_ms(),
        )
        .await
        .map_err(ApiError::from)?;
    Ok(Json(issue))
}

pub async fn transition_issue(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(issue_id): Path<String>,
    Json(payload): Json<TransitionIssueRequest>,
) -> Result<Json<Issue>, ApiError> {
    validation::validate(&payload)?;
    let session = authorize(&ctx, &AccessRequirements::permission("issues.update"))?;

    let to = parse_status(&payload.status)?;
    let issue = state
        .issues
        .transition(&session, &issue_id, to, payload.note, now_ms())
        .await
        .map_err(ApiError::from)?;
    Ok(Json(issue))
}

pub async fn comment_on_issue(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(issue_id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<TimelineEntry>), ApiError> {
    validation::validate(&payload)?;
    let session = authorize(&ctx, &AccessRequirements::permission("dashboard.view"))?;

    let entry = state
        .issues
        .comment(&session, &issue_id, payload.body, now_ms())
        .await
        .map_err(ApiError::from)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

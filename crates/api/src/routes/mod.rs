pub mod issues;

use axum::extract::{Extension, Path, State};
use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use jansetu_domain::access::AccessRequirements;
use jansetu_domain::analytics::KpiSnapshot;
use jansetu_domain::auth::Role;
use jansetu_domain::error::DomainError;
use jansetu_domain::events::{CommunityEvent, EventCreate};
use jansetu_domain::ulbs::{Ulb, UlbKind};
use jansetu_domain::users::{UserAccount, UserCreate};
use jansetu_domain::util::{now_ms, uuid_v7_without_dashes};
use jansetu_infra::auth::password_digest;

use crate::middleware::{AuthContext, authorize};
use crate::observability;
use crate::{error::ApiError, middleware as app_middleware, state::AppState, validation};

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/v1/auth/me", get(whoami))
        .route(
            "/v1/issues",
            post(issues::create_issue).get(issues::list_issues),
        )
        .route("/v1/issues/:issue_id", get(issues::get_issue))
        .route(
            "/v1/issues/:issue_id/timeline",
            get(issues::get_issue_timeline),
        )
        .route("/v1/issues/:issue_id/sla", get(issues::get_issue_sla))
        .route("/v1/issues/:issue_id/assign", post(issues::assign_issue))
        .route("/v1/issues/:issue_id/status", post(issues::transition_issue))
        .route(
            "/v1/issues/:issue_id/comments",
            post(issues::comment_on_issue),
        )
        .route("/v1/ulbs", post(register_ulb).get(list_ulbs))
        .route("/v1/ulbs/:ulb_id", get(get_ulb))
        .route("/v1/users", post(create_user).get(list_users))
        .route("/v1/users/:user_id/deactivate", post(deactivate_user))
        .route("/v1/analytics/summary", get(analytics_summary))
        .route("/v1/events", post(create_event).get(list_events))
        .route("/v1/events/:event_id/register", post(register_for_event))
        .route_layer(middleware::from_fn(app_middleware::require_auth_middleware));

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/v1/auth/login", post(login))
        .merge(protected)
        .layer(middleware::from_fn(app_middleware::metrics_layer))
        .layer(app_middleware::timeout_layer())
        .layer(app_middleware::trace_layer())
        .layer(app_middleware::set_request_id_layer())
        .layer(app_middleware::propagate_request_id_layer())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth_middleware,
        ))
        .layer(middleware::from_fn(
            app_middleware::correlation_id_middleware,
        ));

    if !state.config.app_env.eq_ignore_ascii_case("test") {
        app = app.layer(app_middleware::rate_limit_layer());
    }

    app.with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.app_env.clone(),
    })
}

async fn metrics() -> Result<String, ApiError> {
    observability::render_metrics().ok_or(ApiError::Internal)
}

#[derive(Debug, Deserialize, Validate)]
struct LoginRequest {
    #[validate(email)]
    email: String,
    #[validate(length(min = 1, max = 128))]
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    user: UserAccount,
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    validation::validate(&payload)?;
    let now = now_ms();
    let digest = password_digest(&payload.password);
    let email = payload.email.trim().to_ascii_lowercase();

    // Bad credentials and unknown accounts both land here as Forbidden;
    // collapse them into a single 401 so login never leaks which one it was.
    let user = state
        .users
        .authenticate(&email, &digest, now)
        .await
        .map_err(|err| match err {
            DomainError::Forbidden => ApiError::Unauthorized,
            other => ApiError::from(other),
        })?;

    let token = state.tokens.issue(&user, now).map_err(|err| {
        tracing::error!(error = %err, "token issue failed");
        ApiError::Internal
    })?;

    Ok(Json(LoginResponse { token, user }))
}

#[derive(Serialize)]
struct WhoamiResponse {
    user_id: String,
    username: String,
    role: Role,
    permissions: Vec<String>,
    ulb_id: Option<String>,
}

async fn whoami(Extension(ctx): Extension<AuthContext>) -> Result<Json<WhoamiResponse>, ApiError> {
    let session = authorize(&ctx, &AccessRequirements::none())?;
    let mut permissions: Vec<String> = session.permissions.tokens().map(str::to_string).collect();
    permissions.sort();
    Ok(Json(WhoamiResponse {
        user_id: session.user_id,
        username: session.username,
        role: session.role,
        permissions,
        ulb_id: session.ulb_id,
    }))
}

#[derive(Debug, Deserialize, Validate)]
struct RegisterUlbRequest {
    #[validate(length(min = 1, max = 200))]
    name: String,
    #[validate(length(min = 1, max = 16))]
    code: String,
    #[validate(length(min = 1, max = 100))]
    district: String,
    #[validate(length(min = 1, max = 100))]
    state: String,
    kind: UlbKind,
}

async fn register_ulb(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<RegisterUlbRequest>,
) -> Result<(StatusCode, Json<Ulb>), ApiError> {
    validation::validate(&payload)?;
    authorize(
        &ctx,
        &AccessRequirements::roles([Role::SuperAdmin, Role::Admin]),
    )?;

    let ulb = Ulb {
        ulb_id: uuid_v7_without_dashes(),
        name: payload.name,
        code: payload.code,
        district: payload.district,
        state: payload.state,
        kind: payload.kind,
    };
    let ulb = state.ulbs.register(ulb).await.map_err(ApiError::from)?;
    Ok((StatusCode::CREATED, Json(ulb)))
}

async fn list_ulbs(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Vec<Ulb>>, ApiError> {
    authorize(&ctx, &AccessRequirements::none())?;
    let ulbs = state.ulbs.list().await.map_err(ApiError::from)?;
    Ok(Json(ulbs))
}

async fn get_ulb(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(ulb_id): Path<String>,
) -> Result<Json<Ulb>, ApiError> {
    authorize(&ctx, &AccessRequirements::none())?;
    let ulb = state.ulbs.get(&ulb_id).await.map_err(ApiError::from)?;
    Ok(Json(ulb))
}

#[derive(Debug, Deserialize, Validate)]
struct CreateUserRequest {
    #[validate(email)]
    email: String,
    #[validate(length(min = 1, max = 120))]
    name: String,
    role: Role,
    department: Option<String>,
    ulb_id: Option<String>,
    #[serde(default)]
    extra_permissions: Vec<String>,
    #[validate(length(min = 6, max = 128))]
    password: String,
}

async fn create_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserAccount>), ApiError> {
    validation::validate(&payload)?;
    let session = authorize(&ctx, &AccessRequirements::permission("users.manage"))?;

    // Admins only mint staff inside their own ULB; SuperAdmin is unscoped.
    if let Some(own_ulb) = &session.ulb_id {
        if payload.ulb_id.as_deref() != Some(own_ulb.as_str()) {
            return Err(ApiError::Forbidden);
        }
    }

    let input = UserCreate {
        email: payload.email,
        name: payload.name,
        role: payload.role,
        department: payload.department,
        ulb_id: payload.ulb_id,
        extra_permissions: payload.extra_permissions,
        password_digest: password_digest(&payload.password),
    };
    let user = state.users.create(input).await.map_err(ApiError::from)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Vec<UserAccount>>, ApiError> {
    let session = authorize(
        &ctx,
        &AccessRequirements::roles([Role::SuperAdmin, Role::Admin, Role::Manager]),
    )?;
    let users = state.users.list(&session).await.map_err(ApiError::from)?;
    Ok(Json(users))
}

async fn deactivate_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(user_id): Path<String>,
) -> Result<Json<UserAccount>, ApiError> {
    let session = authorize(&ctx, &AccessRequirements::permission("users.manage"))?;

    let target = state.users.get(&user_id).await.map_err(ApiError::from)?;
    if let Some(own_ulb) = &session.ulb_id {
        if target.ulb_id.as_deref() != Some(own_ulb.as_str()) {
            return Err(ApiError::Forbidden);
        }
    }

    let user = state
        .users
        .deactivate(&user_id)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(user))
}

async fn analytics_summary(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<KpiSnapshot>, ApiError> {
    let requirements = AccessRequirements::roles([Role::SuperAdmin, Role::Admin, Role::Commissioner])
        .and_permission("analytics.view");
    let session = authorize(&ctx, &requirements)?;
    let snapshot = state
        .analytics
        .summary(&session, now_ms())
        .await
        .map_err(ApiError::from)?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize, Validate)]
struct CreateEventRequest {
    ulb_id: Option<String>,
    #[validate(length(min = 1, max = 200))]
    title: String,
    #[validate(length(max = 2000))]
    description: String,
    starts_at_ms: i64,
    #[validate(length(min = 1, max = 300))]
    location: String,
    #[validate(range(min = 1))]
    max_attendees: u32,
}

async fn create_event(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<CommunityEvent>), ApiError> {
    validation::validate(&payload)?;
    let session = authorize(&ctx, &AccessRequirements::permission("community.moderate"))?;

    let input = EventCreate {
        ulb_id: payload.ulb_id,
        title: payload.title,
        description: payload.description,
        starts_at_ms: payload.starts_at_ms,
        location: payload.location,
        max_attendees: payload.max_attendees,
    };
    let event = state
        .events
        .create(&session, input)
        .await
        .map_err(ApiError::from)?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn list_events(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Vec<CommunityEvent>>, ApiError> {
    let session = authorize(&ctx, &AccessRequirements::permission("community.view"))?;
    let events = state.events.list(&session).await.map_err(ApiError::from)?;
    Ok(Json(events))
}

async fn register_for_event(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(event_id): Path<String>,
) -> Result<Json<CommunityEvent>, ApiError> {
    let session = authorize(&ctx, &AccessRequirements::none())?;
    let event = state
        .events
        .register(&session, &event_id)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(event))
}

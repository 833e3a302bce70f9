//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::dto::{
    CreateTopicRequest, DaySummaryResponse, GeneratePlanRequest, PlanResponse, PlanStatsResponse,
    PriorityDto, SessionResponse, SessionStatusDto, SessionStatusRequest, SyllabusSummaryResponse,
    TopicResponse, TopicStatusDto, TopicStatusRequest, UpdateTopicRequest,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use study_planner_core::ports::PortError;
use study_planner_core::progress::{daily_summary, plan_completion, sessions_on, syllabus_summary};
use study_planner_core::scheduler::build_plan;
use study_planner_core::StudyPlan;
use tracing::{error, info, warn};
use utoipa::{IntoParams, OpenApi};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_topics_handler,
        create_topic_handler,
        get_topic_handler,
        update_topic_handler,
        set_topic_status_handler,
        delete_topic_handler,
        syllabus_summary_handler,
        generate_plan_handler,
        current_plan_handler,
        sessions_for_date_handler,
        plan_stats_handler,
        set_session_status_handler,
    ),
    components(
        schemas(
            CreateTopicRequest, UpdateTopicRequest, TopicStatusRequest, TopicResponse,
            SyllabusSummaryResponse, GeneratePlanRequest, PlanResponse, SessionResponse,
            SessionStatusRequest, PlanStatsResponse, DaySummaryResponse, PriorityDto,
            TopicStatusDto, SessionStatusDto
        )
    ),
    tags(
        (name = "Study Planner API", description = "Syllabus management and study session scheduling.")
    )
)]
pub struct ApiDoc;

type HandlerError = (StatusCode, String);

/// Maps a port failure onto an HTTP status, logging anything unexpected.
fn port_error(context: &str, e: PortError) -> HandlerError {
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        PortError::Unexpected(msg) => {
            error!("{}: {}", context, msg);
            (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    }
}

async fn require_current_plan(app_state: &AppState) -> Result<StudyPlan, HandlerError> {
    app_state
        .sessions
        .current_plan()
        .await
        .map_err(|e| port_error("Failed to load study plan", e))?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "No study plan has been generated yet".to_string()))
}

//=========================================================================================
// Topic Handlers
//=========================================================================================

/// List every topic in the syllabus.
#[utoipa::path(
    get,
    path = "/topics",
    responses(
        (status = 200, description = "All topics", body = [TopicResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_topics_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let today = app_state.clock.today();
    let topics = app_state
        .topics
        .list_topics()
        .await
        .map_err(|e| port_error("Failed to list topics", e))?;
    let body: Vec<TopicResponse> = topics
        .into_iter()
        .map(|t| TopicResponse::from_domain(t, today))
        .collect();
    Ok(Json(body))
}

/// Add a topic to the syllabus. New topics start as `not-started`.
#[utoipa::path(
    post,
    path = "/topics",
    request_body = CreateTopicRequest,
    responses(
        (status = 201, description = "Topic created", body = TopicResponse),
        (status = 400, description = "Missing title/subject or non-positive hours"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_topic_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<CreateTopicRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let new_topic = req
        .into_domain()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    let topic = app_state
        .topics
        .create_topic(new_topic)
        .await
        .map_err(|e| port_error("Failed to create topic", e))?;
    info!(topic_id = %topic.id, "Topic added to syllabus");
    Ok((
        StatusCode::CREATED,
        Json(TopicResponse::from_domain(topic, app_state.clock.today())),
    ))
}

/// Fetch a single topic.
#[utoipa::path(
    get,
    path = "/topics/{topic_id}",
    params(("topic_id" = String, Path, description = "Topic identifier")),
    responses(
        (status = 200, description = "The topic", body = TopicResponse),
        (status = 404, description = "Unknown topic")
    )
)]
pub async fn get_topic_handler(
    State(app_state): State<Arc<AppState>>,
    Path(topic_id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let topic = app_state
        .topics
        .get_topic(&topic_id)
        .await
        .map_err(|e| port_error("Failed to load topic", e))?;
    Ok(Json(TopicResponse::from_domain(topic, app_state.clock.today())))
}

/// Replace the editable fields of a topic.
#[utoipa::path(
    put,
    path = "/topics/{topic_id}",
    params(("topic_id" = String, Path, description = "Topic identifier")),
    request_body = UpdateTopicRequest,
    responses(
        (status = 200, description = "Topic updated", body = TopicResponse),
        (status = 400, description = "Invalid topic fields"),
        (status = 404, description = "Unknown topic")
    )
)]
pub async fn update_topic_handler(
    State(app_state): State<Arc<AppState>>,
    Path(topic_id): Path<String>,
    Json(req): Json<UpdateTopicRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let update = req
        .into_domain()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    let topic = app_state
        .topics
        .update_topic(&topic_id, update)
        .await
        .map_err(|e| port_error("Failed to update topic", e))?;
    Ok(Json(TopicResponse::from_domain(topic, app_state.clock.today())))
}

/// Move a topic between `not-started`, `in-progress` and `completed`.
#[utoipa::path(
    patch,
    path = "/topics/{topic_id}/status",
    params(("topic_id" = String, Path, description = "Topic identifier")),
    request_body = TopicStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = TopicResponse),
        (status = 404, description = "Unknown topic")
    )
)]
pub async fn set_topic_status_handler(
    State(app_state): State<Arc<AppState>>,
    Path(topic_id): Path<String>,
    Json(req): Json<TopicStatusRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let topic = app_state
        .topics
        .set_topic_status(&topic_id, req.status.into())
        .await
        .map_err(|e| port_error("Failed to update topic status", e))?;
    info!(topic_id = %topic.id, status = %topic.status, "Topic status updated");
    Ok(Json(TopicResponse::from_domain(topic, app_state.clock.today())))
}

/// Remove a topic from the syllabus. Existing plans keep their session snapshots.
#[utoipa::path(
    delete,
    path = "/topics/{topic_id}",
    params(("topic_id" = String, Path, description = "Topic identifier")),
    responses(
        (status = 204, description = "Topic deleted"),
        (status = 404, description = "Unknown topic")
    )
)]
pub async fn delete_topic_handler(
    State(app_state): State<Arc<AppState>>,
    Path(topic_id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    app_state
        .topics
        .delete_topic(&topic_id)
        .await
        .map_err(|e| port_error("Failed to delete topic", e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Counts per status, open effort, and topics that are overdue or due soon.
#[utoipa::path(
    get,
    path = "/topics/summary",
    responses((status = 200, description = "Syllabus summary", body = SyllabusSummaryResponse))
)]
pub async fn syllabus_summary_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let topics = app_state
        .topics
        .list_topics()
        .await
        .map_err(|e| port_error("Failed to list topics", e))?;
    let summary = syllabus_summary(&topics, app_state.clock.today());
    Ok(Json(SyllabusSummaryResponse::from(summary)))
}

//=========================================================================================
// Plan Handlers
//=========================================================================================

/// Generate a new study plan from the current syllabus and make it the current plan.
///
/// The body may be `{}`; any preference left out uses the server defaults.
#[utoipa::path(
    post,
    path = "/plans",
    request_body = GeneratePlanRequest,
    responses(
        (status = 201, description = "Plan generated", body = PlanResponse),
        (status = 400, description = "Malformed start time or window longer than a year"),
        (status = 422, description = "Nothing to schedule or invalid preferences"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn generate_plan_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<GeneratePlanRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let preferences = req
        .preferences(&app_state.config.scheduling)
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    let reference_date = req.reference_date.unwrap_or_else(|| app_state.clock.today());

    let topics = app_state
        .topics
        .list_topics()
        .await
        .map_err(|e| port_error("Failed to list topics", e))?;

    let now = app_state.clock.now();
    let plan = tokio::task::spawn_blocking(move || {
        build_plan(&topics, &preferences, reference_date, now)
    })
    .await
    .map_err(|e| {
        error!("Study plan task failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate study plan".to_string(),
        )
    })?
    .map_err(|e| {
        warn!("Study plan rejected: {}", e);
        (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    })?;

    app_state
        .sessions
        .save_plan(plan.clone())
        .await
        .map_err(|e| port_error("Failed to save study plan", e))?;

    info!(
        plan_id = %plan.id,
        sessions = plan.sessions.len(),
        total_hours = plan.total_hours,
        "Study plan generated"
    );
    Ok((StatusCode::CREATED, Json(PlanResponse::from(&plan))))
}

/// The most recently generated plan.
#[utoipa::path(
    get,
    path = "/plans/current",
    responses(
        (status = 200, description = "Current plan", body = PlanResponse),
        (status = 404, description = "No plan generated yet")
    )
)]
pub async fn current_plan_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let plan = require_current_plan(&app_state).await?;
    Ok(Json(PlanResponse::from(&plan)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateQuery {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

/// Sessions of the current plan on one date.
#[utoipa::path(
    get,
    path = "/plans/current/sessions",
    params(DateQuery),
    responses(
        (status = 200, description = "Sessions on the date, in start order", body = [SessionResponse]),
        (status = 404, description = "No plan generated yet")
    )
)]
pub async fn sessions_for_date_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let plan = require_current_plan(&app_state).await?;
    let date = query.date.unwrap_or_else(|| app_state.clock.today());
    let body: Vec<SessionResponse> = sessions_on(&plan, date)
        .into_iter()
        .map(SessionResponse::from)
        .collect();
    Ok(Json(body))
}

/// Completion figures for the current plan plus today's sessions.
#[utoipa::path(
    get,
    path = "/plans/current/stats",
    responses(
        (status = 200, description = "Plan progress", body = PlanStatsResponse),
        (status = 404, description = "No plan generated yet")
    )
)]
pub async fn plan_stats_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let plan = require_current_plan(&app_state).await?;
    let today = daily_summary(&plan, app_state.clock.today());
    Ok(Json(PlanStatsResponse::new(&plan, plan_completion(&plan), today)))
}

/// Mark a session as scheduled, completed or missed.
#[utoipa::path(
    patch,
    path = "/plans/{plan_id}/sessions/{session_id}",
    params(
        ("plan_id" = Uuid, Path, description = "Plan identifier"),
        ("session_id" = String, Path, description = "Session identifier")
    ),
    request_body = SessionStatusRequest,
    responses(
        (status = 200, description = "Session updated", body = SessionResponse),
        (status = 404, description = "Unknown plan or session")
    )
)]
pub async fn set_session_status_handler(
    State(app_state): State<Arc<AppState>>,
    Path((plan_id, session_id)): Path<(Uuid, String)>,
    Json(req): Json<SessionStatusRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let session = app_state
        .sessions
        .set_session_status(plan_id, &session_id, req.status.into())
        .await
        .map_err(|e| port_error("Failed to update session", e))?;
    info!(%plan_id, session_id = %session.id, status = %session.status, "Session status updated");
    Ok(Json(SessionResponse::from(&session)))
}

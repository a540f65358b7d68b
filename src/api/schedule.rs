//! Scheduling endpoints: the wire boundary the browser UI talks to.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use validator::Validate;

use crate::{
    api::validated_json::ValidatedJson,
    app::App,
    database::models::{job_status::JobStatus, post_job},
    delivery::{self, Platform},
    poster::PosterError,
};

/// `run_at` wire format, what the UI produces from its datetime picker
const RUN_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn routes(app: App) -> Router {
    Router::new()
        .route("/schedule_post/", post(schedule_post))
        .route("/schedule_tweet/", post(schedule_tweet))
        .route("/scheduled_jobs/", get(scheduled_jobs))
        .route("/post_now/", post(post_now))
        .with_state(app)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid datetime format. Use YYYY-MM-DD HH:MM:SS")]
    InvalidRunAt,
    #[error("run_at must be in the future")]
    RunAtInPast,
    #[error("Unsupported app: {0}")]
    UnsupportedApp(String),
    #[error("{0}")]
    Delivery(#[from] PosterError),
    #[error("internal error")]
    Database(#[from] sea_orm::DbErr),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidRunAt | Self::RunAtInPast | Self::UnsupportedApp(_)
            | Self::Delivery(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SchedulePostRequest {
    pub app: String,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    pub run_at: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ScheduleTweetRequest {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub text: String,
    pub run_at: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PostNowRequest {
    pub app: String,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub message: String,
    pub app: String,
    pub time: String,
}

#[derive(Debug, Serialize)]
pub struct ScheduleTweetResponse {
    pub message: String,
    pub time: String,
}

#[derive(Debug, Serialize)]
pub struct PostNowResponse {
    pub message: String,
    pub result: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ScheduledJobView {
    pub id: String,
    pub next_run_time: String,
    pub func: String,
}

async fn schedule_post(
    State(app): State<App>,
    ValidatedJson(request): ValidatedJson<SchedulePostRequest>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    let platform: Platform = request
        .app
        .parse()
        .map_err(|_| ApiError::UnsupportedApp(request.app.clone()))?;

    schedule(&app, platform, &request.content, &request.run_at).await?;

    Ok(Json(ScheduleResponse {
        message: format!("{platform} post scheduled!"),
        app: platform.to_string(),
        time: request.run_at,
    }))
}

/// Scheduling a tweet is sugar for scheduling a Twitter post.
async fn schedule_tweet(
    State(app): State<App>,
    ValidatedJson(request): ValidatedJson<ScheduleTweetRequest>,
) -> Result<Json<ScheduleTweetResponse>, ApiError> {
    schedule(&app, Platform::Twitter, &request.text, &request.run_at).await?;

    Ok(Json(ScheduleTweetResponse {
        message: "Tweet scheduled!".to_string(),
        time: request.run_at,
    }))
}

async fn schedule(
    app: &App,
    platform: Platform,
    content: &str,
    run_at_raw: &str,
) -> Result<(), ApiError> {
    let run_at = parse_run_at(run_at_raw)?;
    ensure_future(run_at)?;

    let id = delivery::job_id(platform, run_at_raw, content);
    delivery::schedule_delivery(app, platform, id.clone(), content.to_string(), run_at).await?;

    info!("📅 Scheduled {platform} post '{id}' for {run_at_raw}");
    Ok(())
}

/// List every job that has not reached a terminal state yet.
///
/// Maintenance jobs are filtered out; the UI lists posts, not internals.
async fn scheduled_jobs(State(app): State<App>) -> Result<Json<Vec<ScheduledJobView>>, ApiError> {
    let jobs = post_job::Entity::find()
        .filter(post_job::Column::Status.is_in([
            JobStatus::Pending,
            JobStatus::PendingRetry,
            JobStatus::Running,
        ]))
        .filter(post_job::Column::JobType.is_in(delivery::delivery_job_names()))
        .order_by_asc(post_job::Column::NextExecutionAt)
        .all(&app.db)
        .await?;

    let views = jobs
        .into_iter()
        .map(|job| ScheduledJobView {
            next_run_time: to_local_iso(job.next_execution_at.unwrap_or(job.created_at)),
            func: job.job_type,
            id: job.id,
        })
        .collect();

    Ok(Json(views))
}

/// Deliver immediately, bypassing the store.
async fn post_now(
    State(app): State<App>,
    ValidatedJson(request): ValidatedJson<PostNowRequest>,
) -> Result<Json<PostNowResponse>, ApiError> {
    let platform: Platform = request
        .app
        .parse()
        .map_err(|_| ApiError::UnsupportedApp(request.app.clone()))?;

    let result = app.poster.post(platform, &request.content).await?;

    info!("📤 Posted to {platform} immediately");

    Ok(Json(PostNowResponse {
        message: format!("{platform} posted!"),
        result,
    }))
}

/// Parse a wire `run_at` (local wall-clock) into naive UTC.
///
/// Instants skipped by a DST transition do not exist on the local clock
/// and are rejected like any other unusable timestamp.
fn parse_run_at(raw: &str) -> Result<NaiveDateTime, ApiError> {
    let wall_clock =
        NaiveDateTime::parse_from_str(raw, RUN_AT_FORMAT).map_err(|_| ApiError::InvalidRunAt)?;

    let localized = Local
        .from_local_datetime(&wall_clock)
        .earliest()
        .ok_or(ApiError::InvalidRunAt)?;

    Ok(localized.with_timezone(&Utc).naive_utc())
}

fn ensure_future(run_at_utc: NaiveDateTime) -> Result<(), ApiError> {
    if run_at_utc <= Utc::now().naive_utc() {
        return Err(ApiError::RunAtInPast);
    }
    Ok(())
}

/// Render a stored naive-UTC timestamp as a local ISO-8601 string
fn to_local_iso(utc: NaiveDateTime) -> String {
    Local
        .from_utc_datetime(&utc)
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_at_roundtrips_through_utc() {
        let stored = parse_run_at("2024-01-01 10:30:00").unwrap();
        assert_eq!(to_local_iso(stored), "2024-01-01T10:30:00");
    }

    #[test]
    fn malformed_run_at_is_rejected() {
        assert!(matches!(
            parse_run_at("2024-01-01T10:30"),
            Err(ApiError::InvalidRunAt)
        ));
        assert!(matches!(
            parse_run_at("tomorrow at noon"),
            Err(ApiError::InvalidRunAt)
        ));
        assert!(matches!(
            parse_run_at("2024-13-01 10:30:00"),
            Err(ApiError::InvalidRunAt)
        ));
    }

    #[test]
    fn past_run_at_is_rejected() {
        let past = Utc::now().naive_utc() - chrono::Duration::hours(1);
        assert!(matches!(ensure_future(past), Err(ApiError::RunAtInPast)));

        let future = Utc::now().naive_utc() + chrono::Duration::hours(1);
        assert!(ensure_future(future).is_ok());
    }
}

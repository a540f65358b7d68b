use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use thiserror::Error;

use crate::{
    config::Config, environment::Environment, job_queue::JobQueue, jobs::Job, poster::Poster,
};

/// Shared application state, cloned into every handler and worker.
#[derive(Clone, Debug)]
pub struct App {
    pub config: Config,
    pub environment: Environment,
    pub db: DatabaseConnection,
    pub poster: Poster,
    pub job_queue: JobQueue,
}

impl App {
    /// Schedule a one-shot job to run at `run_at` (naive UTC).
    ///
    /// A job with the same id replaces any previously scheduled one.
    pub async fn schedule_job<J: Job>(
        &self,
        id: String,
        arguments: J::Arguments,
        run_at: NaiveDateTime,
    ) -> Result<(), sea_orm::DbErr>
    where
        J::Arguments: serde::Serialize,
    {
        self.job_queue
            .schedule_at::<J>(&self.db, id, arguments, run_at)
            .await
    }
}

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("Database connection error")]
    DatabaseError(#[from] sea_orm::DbErr),
}

impl IntoResponse for ReadinessError {
    fn into_response(self) -> Response {
        (StatusCode::SERVICE_UNAVAILABLE, self.to_string()).into_response()
    }
}

use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::app::App;
use crate::{
    config::WorkerQueueConfig,
    database::models::{
        attempt_result::AttemptResult,
        delivery_attempt,
        job_status::JobStatus,
        post_job::{self, Entity as PostJobEntity},
    },
    jobs::{job_result::JobResult, JobError},
};

use super::job_registry::JobRegistry;

/// SQLite has no LISTEN/NOTIFY, so workers poll for due jobs.
const POLL_INTERVAL_SECS: u64 = 1;

/// Claim-execute-finalize loop. Drains every due job it can claim, then
/// sleeps one poll interval.
pub async fn worker(
    worker_instance_name: &str,
    worker_config: &WorkerQueueConfig,
    app: App,
    job_registry: &JobRegistry,
) -> Result<(), DbErr> {
    loop {
        let mut drained = 0;

        while let Some(job) = claim_oldest_viable_job(worker_config, &app.db).await? {
            debug!(
                "🔧 Worker '{worker_instance_name}' claimed {status} {1}({0})",
                job.id,
                job.job_type,
                status = job.status,
            );

            execute_and_update_job(
                &job,
                worker_config,
                &app,
                job_registry,
                worker_instance_name,
            )
            .await?;

            drained += 1;
        }

        if drained > 0 {
            debug!("Worker '{worker_instance_name}' drained {drained} job(s)");
        }

        sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;
    }
}

/// Claim the most overdue viable job and mark it running.
///
/// The whole claim runs in one transaction; SQLite serializes writers, so
/// two workers cannot mark the same row running.
pub(crate) async fn claim_oldest_viable_job(
    worker_config: &WorkerQueueConfig,
    db: &DatabaseConnection,
) -> Result<Option<post_job::Model>, DbErr> {
    let txn = db.begin().await?;
    let now = chrono::Utc::now().naive_utc();

    let job_option = PostJobEntity::find()
        .filter(post_job::Column::JobType.is_in(worker_config.jobs.iter()))
        .filter(post_job::Column::Status.is_in([JobStatus::Pending, JobStatus::PendingRetry]))
        .filter(post_job::Column::RetryCount.lt(worker_config.max_retries))
        .filter(
            post_job::Column::NextExecutionAt
                .is_null()
                .or(post_job::Column::NextExecutionAt.lte(now)),
        )
        .order_by_asc(post_job::Column::NextExecutionAt)
        .order_by_asc(post_job::Column::CreatedAt)
        .limit(1)
        .one(&txn)
        .await?;

    let Some(job_model) = job_option else {
        txn.commit().await?;
        return Ok(None);
    };

    let mut active_model: post_job::ActiveModel = job_model.clone().into();
    active_model.status = sea_orm::Set(JobStatus::Running);
    active_model.updated_at = sea_orm::Set(now);
    active_model.update(&txn).await?;

    txn.commit().await?;
    Ok(Some(job_model))
}

/// Run the job's registered handler under the pool timeout, record the
/// attempt, and finalize the job row.
pub(crate) async fn execute_and_update_job(
    job_model: &post_job::Model,
    worker_config: &WorkerQueueConfig,
    app: &App,
    job_registry: &JobRegistry,
    worker_instance_name: &str,
) -> Result<(), DbErr> {
    let started = Instant::now();
    let timeout_duration = Duration::from_secs(u64::from(worker_config.job_timeout));

    let result = (timeout(
        timeout_duration,
        job_registry.execute(app, &job_model.job_type, &job_model.arguments),
    )
    .await)
        .unwrap_or(JobResult::TimedOut);

    let execution_duration = started.elapsed();

    record_attempt(job_model, &result, execution_duration, &app.db).await?;

    match &result {
        JobResult::Completed => {
            info!(
                "✅ Worker '{worker_instance_name}' delivered {}({}) in {:?}",
                job_model.job_type, job_model.id, execution_duration
            );
            set_status(job_model, JobStatus::Completed, &app.db).await
        }
        failure => {
            finalize_failed_job(
                job_model,
                failure,
                worker_config,
                &app.db,
                worker_instance_name,
                execution_duration,
            )
            .await
        }
    }
}

/// One `delivery_attempt` row per execution, successful or not.
async fn record_attempt(
    job_model: &post_job::Model,
    result: &JobResult,
    execution_duration: Duration,
    db: &DatabaseConnection,
) -> Result<(), DbErr> {
    let now = chrono::Utc::now().naive_utc();
    #[allow(clippy::cast_possible_truncation)]
    let execution_time_ms = execution_duration.as_millis() as i64;

    let attempt = delivery_attempt::ActiveModel {
        id: sea_orm::Set(uuid::Uuid::new_v4()),
        job_id: sea_orm::Set(job_model.id.clone()),
        result: sea_orm::Set(match result {
            JobResult::Completed => AttemptResult::Completed,
            JobResult::Failed(_) => AttemptResult::Failed,
            JobResult::TimedOut => AttemptResult::TimedOut,
        }),
        started_at: sea_orm::Set(now - chrono::Duration::milliseconds(execution_time_ms)),
        finished_at: sea_orm::Set(now),
        execution_time_ms: sea_orm::Set(execution_time_ms),
        failure_reason: sea_orm::Set(match result {
            JobResult::Failed(reason) => Some(reason.to_string()),
            JobResult::TimedOut => Some("Job execution timed out".to_string()),
            JobResult::Completed => None,
        }),
        created_at: sea_orm::Set(now),
    };

    attempt.insert(db).await?;
    Ok(())
}

async fn finalize_failed_job(
    job_model: &post_job::Model,
    result: &JobResult,
    worker_config: &WorkerQueueConfig,
    db: &DatabaseConnection,
    worker_instance_name: &str,
    execution_duration: Duration,
) -> Result<(), DbErr> {
    // Permanent failures are final no matter the retry budget; timeouts
    // and transient failures retry while the budget lasts. The budget is
    // total attempts: a job that has burned its last retry goes to the
    // terminal failed state instead of lingering unclaimable.
    let should_retry = match result {
        JobResult::Failed(JobError::FailPermanently(_)) | JobResult::Completed => false,
        JobResult::Failed(JobError::TryAgainLater(_)) | JobResult::TimedOut => {
            job_model.retry_count + 1 < worker_config.max_retries
        }
    };

    if should_retry {
        warn!(
            "⚠️ Worker '{worker_instance_name}' will retry {}({}) after {:?}: {}",
            job_model.job_type, job_model.id, execution_duration, result
        );

        let next_execution_at = next_retry_time(job_model.retry_count, worker_config);

        let mut active_model: post_job::ActiveModel = job_model.clone().into();
        active_model.status = sea_orm::Set(JobStatus::PendingRetry);
        active_model.retry_count = sea_orm::Set(job_model.retry_count + 1);
        active_model.next_execution_at = sea_orm::Set(Some(next_execution_at));
        active_model.updated_at = sea_orm::Set(chrono::Utc::now().naive_utc());
        active_model.update(db).await?;
        Ok(())
    } else {
        error!(
            "❌ Worker '{worker_instance_name}' gave up on {}({}) after {:?}: {}",
            job_model.job_type, job_model.id, execution_duration, result
        );

        set_status(job_model, JobStatus::Failed, db).await
    }
}

async fn set_status(
    job_model: &post_job::Model,
    status: JobStatus,
    db: &DatabaseConnection,
) -> Result<(), DbErr> {
    let mut active_model: post_job::ActiveModel = job_model.clone().into();
    active_model.status = sea_orm::Set(status);
    active_model.updated_at = sea_orm::Set(chrono::Utc::now().naive_utc());
    active_model.update(db).await?;
    Ok(())
}

/// Exponential backoff: base delay times multiplier^retries.
fn next_retry_time(retry_count: i32, worker_config: &WorkerQueueConfig) -> NaiveDateTime {
    let delay_seconds = worker_config.base_retry_delay_seconds
        * worker_config
            .retry_backoff_multiplier
            .pow(retry_count.try_into().unwrap_or(5));

    let delay_seconds_i64 = delay_seconds.try_into().unwrap_or(i64::MAX);
    chrono::Utc::now().naive_utc() + chrono::Duration::seconds(delay_seconds_i64)
}

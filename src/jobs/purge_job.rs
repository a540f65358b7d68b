use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder as _,
    QuerySelect as _,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::{
    app::App,
    config::PurgeConfig,
    database::models::{
        delivery_attempt,
        job_status::JobStatus,
        post_job::{self, Entity as PostJobEntity},
    },
    jobs::{Job, JobError},
};

/// Deletes terminal jobs past their retention period, together with their
/// attempt history. Runs on the cron schedule; this is what keeps the
/// listing endpoint from accumulating executed jobs forever.
pub struct PurgeFinishedJobsJob;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeFinishedJobsArguments {}

impl Job for PurgeFinishedJobsJob {
    type Arguments = PurgeFinishedJobsArguments;

    async fn execute(app: &App, _arguments: Self::Arguments) -> Result<(), JobError> {
        purge_finished_jobs(&app.config.jobs.purge, &app.db)
            .await
            .map_err(|e| JobError::TryAgainLater(format!("Purge failed: {e}")))
    }

    fn name() -> &'static str {
        "purge_finished_jobs"
    }
}

pub(crate) async fn purge_finished_jobs(
    config: &PurgeConfig,
    db: &DatabaseConnection,
) -> Result<(), DbErr> {
    let now = chrono::Utc::now().naive_utc();

    let completed_cutoff = now
        - chrono::Duration::seconds(
            config
                .completed_retention_seconds
                .try_into()
                .unwrap_or(7200),
        );
    let failed_cutoff = now
        - chrono::Duration::seconds(
            config
                .failed_retention_seconds
                .try_into()
                .unwrap_or(172_800),
        );

    purge_jobs_by_status(db, JobStatus::Completed, completed_cutoff, config.batch_size).await?;
    purge_jobs_by_status(db, JobStatus::Failed, failed_cutoff, config.batch_size).await?;

    Ok(())
}

/// Delete jobs with the given status older than the cutoff time, in batches
async fn purge_jobs_by_status(
    db: &DatabaseConnection,
    status: JobStatus,
    cutoff_time: chrono::NaiveDateTime,
    batch_size: usize,
) -> Result<(), DbErr> {
    loop {
        let old_jobs = PostJobEntity::find()
            .filter(post_job::Column::Status.eq(status))
            .filter(post_job::Column::CreatedAt.lte(cutoff_time))
            .order_by_asc(post_job::Column::CreatedAt)
            .limit(batch_size as u64)
            .all(db)
            .await?;

        if old_jobs.is_empty() {
            break;
        }

        let job_ids: Vec<String> = old_jobs.into_iter().map(|job| job.id).collect();
        let batch_count = job_ids.len();

        // Attempt rows first; SQLite only cascades when foreign keys are
        // enabled on the connection
        delivery_attempt::Entity::delete_many()
            .filter(delivery_attempt::Column::JobId.is_in(job_ids.iter()))
            .exec(db)
            .await?;

        PostJobEntity::delete_many()
            .filter(post_job::Column::Id.is_in(job_ids))
            .exec(db)
            .await?;

        debug!("🧹 Deleted batch of {} old jobs", batch_count);

        // Small delay between batches to avoid monopolizing the writer
        sleep(Duration::from_millis(100)).await;
    }

    Ok(())
}

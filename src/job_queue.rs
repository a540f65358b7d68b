use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;

use crate::jobs::Job;

/// Job queue that can be either real (database) or mock (in-memory) for testing
#[derive(Clone, Debug)]
pub enum JobQueue {
    /// Real queue that inserts job rows into the database
    Database,
    /// Mock queue that captures scheduled jobs for testing
    Mock(Arc<Mutex<Vec<EnqueuedJob>>>),
}

/// A job that was scheduled (captured by mock queue)
#[derive(Debug, Clone)]
pub struct EnqueuedJob {
    pub id: String,
    pub job_type: String,
    pub arguments: serde_json::Value,
    pub run_at: NaiveDateTime,
}

impl JobQueue {
    /// Create a new mock queue for testing
    pub fn mock() -> Self {
        Self::Mock(Arc::new(Mutex::new(Vec::new())))
    }

    /// Create a real database queue for production
    pub fn database() -> Self {
        Self::Database
    }

    /// Schedule a one-shot job for execution at `run_at` (naive UTC).
    ///
    /// An existing job with the same id is replaced, together with its
    /// attempt history. This mirrors how the scheduling endpoint derives
    /// ids: resubmitting the same post for the same time updates the one
    /// live job instead of queueing a duplicate.
    pub async fn schedule_at<J: Job>(
        &self,
        db: &sea_orm::DatabaseConnection,
        id: String,
        arguments: J::Arguments,
        run_at: NaiveDateTime,
    ) -> Result<(), sea_orm::DbErr>
    where
        J::Arguments: serde::Serialize,
    {
        match self {
            Self::Database => {
                use crate::database::models::{
                    delivery_attempt, job_status::JobStatus, post_job,
                };
                use sea_orm::{
                    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait,
                };

                let now = chrono::Utc::now().naive_utc();
                let txn = db.begin().await?;

                delivery_attempt::Entity::delete_many()
                    .filter(delivery_attempt::Column::JobId.eq(&id))
                    .exec(&txn)
                    .await?;
                post_job::Entity::delete_by_id(&id).exec(&txn).await?;

                let job_model = post_job::ActiveModel {
                    id: sea_orm::Set(id),
                    created_at: sea_orm::Set(now),
                    updated_at: sea_orm::Set(now),
                    job_type: sea_orm::Set(J::name().to_string()),
                    arguments: sea_orm::Set(serde_json::to_value(arguments).unwrap()),
                    status: sea_orm::Set(JobStatus::Pending),
                    retry_count: sea_orm::Set(0),
                    next_execution_at: sea_orm::Set(Some(run_at)),
                };

                job_model.insert(&txn).await?;
                txn.commit().await?;
                Ok(())
            }
            Self::Mock(scheduled) => {
                scheduled.lock().unwrap().push(EnqueuedJob {
                    id,
                    job_type: J::name().to_string(),
                    arguments: serde_json::to_value(arguments).unwrap(),
                    run_at,
                });
                Ok(())
            }
        }
    }

    /// Get all enqueued jobs (only available for mock queue)
    pub fn enqueued_jobs(&self) -> Option<Vec<EnqueuedJob>> {
        match self {
            Self::Mock(scheduled) => Some(scheduled.lock().unwrap().clone()),
            Self::Database => None,
        }
    }

    /// Get enqueued jobs of a specific type (only available for mock queue)
    pub fn enqueued_jobs_of_type(&self, job_type: &str) -> Option<Vec<EnqueuedJob>> {
        match self {
            Self::Mock(scheduled) => Some(
                scheduled
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|job| job.job_type == job_type)
                    .cloned()
                    .collect(),
            ),
            Self::Database => None,
        }
    }

    /// Clear all captured jobs (only available for mock queue)
    pub fn clear_scheduled_jobs(&self) {
        if let Self::Mock(scheduled) = self {
            scheduled.lock().unwrap().clear();
        }
    }
}

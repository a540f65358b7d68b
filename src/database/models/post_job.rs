//! `SeaORM` Entity for scheduled posts

use crate::database::models::job_status::JobStatus;
use sea_orm::entity::prelude::*;

/// A scheduled job: one piece of content bound to a delivery handler and
/// a trigger time. The id doubles as the public identifier shown by the
/// listing endpoint.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "post_job")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    /// Name of the handler registered for this job, e.g. `post_to_twitter`
    pub job_type: String,
    pub arguments: Json,
    pub status: JobStatus,
    pub retry_count: i32,
    /// Authoritative next execution time (naive UTC). Equals the caller's
    /// `run_at` at creation; pushed back on retry.
    pub next_execution_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::delivery_attempt::Entity")]
    DeliveryAttempt,
}

impl Related<super::delivery_attempt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryAttempt.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[allow(dead_code)]
impl Model {
    /// Check if the job may still be retried after a failure
    #[must_use]
    pub fn can_retry(&self, max_retries: i32) -> bool {
        self.retry_count < max_retries
    }

    /// Check if the trigger time has elapsed
    #[must_use]
    pub fn is_due(&self, now: DateTime) -> bool {
        self.next_execution_at
            .is_none_or(|next_execution_at| now >= next_execution_at)
    }
}

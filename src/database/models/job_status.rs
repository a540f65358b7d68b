use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Execution state of a scheduled job.
///
/// Typical lifecycle:
/// - `Pending` → `Running` → `Completed` (success)
/// - `Pending` → `Running` → `Failed` (permanent failure or exhausted retries)
/// - `Pending` → `Running` → `PendingRetry` → `Running` → ... (transient failures)
///
/// Stored as a plain string column; SQLite has no enum type.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    /// Waiting to be picked up by a worker for the first time.
    ///
    /// Eligible for execution once `next_execution_at` has been reached.
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,

    /// Waiting to be retried after a transient failure.
    ///
    /// Distinguished from `Pending` so fresh jobs and retries can be told
    /// apart when inspecting the store.
    #[sea_orm(string_value = "pending_retry")]
    PendingRetry,

    /// Currently being executed by a worker.
    ///
    /// Jobs stranded in this state by a crashed worker are reset to
    /// `Pending` by the recovery task.
    #[sea_orm(string_value = "running")]
    Running,

    /// Finished successfully. Terminal.
    #[sea_orm(string_value = "completed")]
    Completed,

    /// Failed permanently and will not be retried. Terminal.
    #[sea_orm(string_value = "failed")]
    Failed,
}

#[allow(dead_code)]
impl JobStatus {
    /// Terminal jobs will not be processed again; the listing endpoint
    /// filters them out and the purge job eventually deletes them.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Waiting to be picked up by a worker, first time or retry.
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending | Self::PendingRetry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::PendingRetry.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn pending_covers_retry() {
        assert!(JobStatus::Pending.is_pending());
        assert!(JobStatus::PendingRetry.is_pending());
        assert!(!JobStatus::Running.is_pending());
    }
}

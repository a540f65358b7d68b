use sea_orm_migration::{
    prelude::*,
    schema::{big_integer, json, string, timestamp, uuid},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Statuses and attempt results live in plain string columns; SQLite
        // has no native enum type.
        manager
            .create_table(
                Table::create()
                    .table(PostJob::Table)
                    .if_not_exists()
                    .col(string(PostJob::Id).primary_key())
                    .col(timestamp(PostJob::CreatedAt).not_null())
                    .col(timestamp(PostJob::UpdatedAt).not_null())
                    .col(string(PostJob::JobType).not_null())
                    .col(json(PostJob::Arguments).not_null())
                    .col(string(PostJob::Status).not_null().default("pending"))
                    .col(
                        ColumnDef::new(PostJob::RetryCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(PostJob::NextExecutionAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DeliveryAttempt::Table)
                    .if_not_exists()
                    .col(uuid(DeliveryAttempt::Id).primary_key())
                    .col(string(DeliveryAttempt::JobId).not_null())
                    .col(string(DeliveryAttempt::Result).not_null())
                    .col(timestamp(DeliveryAttempt::StartedAt).not_null())
                    .col(timestamp(DeliveryAttempt::FinishedAt).not_null())
                    .col(big_integer(DeliveryAttempt::ExecutionTimeMs).not_null())
                    .col(
                        ColumnDef::new(DeliveryAttempt::FailureReason)
                            .string()
                            .null(),
                    )
                    .col(timestamp(DeliveryAttempt::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-delivery_attempt-job_id")
                            .from(DeliveryAttempt::Table, DeliveryAttempt::JobId)
                            .to(PostJob::Table, PostJob::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The worker claim query filters on status and trigger time
        manager
            .create_index(
                Index::create()
                    .name("idx-post_job-status-next_execution_at")
                    .table(PostJob::Table)
                    .col(PostJob::Status)
                    .col(PostJob::NextExecutionAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-delivery_attempt-job_id")
                    .table(DeliveryAttempt::Table)
                    .col(DeliveryAttempt::JobId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-delivery_attempt-created_at")
                    .table(DeliveryAttempt::Table)
                    .col(DeliveryAttempt::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DeliveryAttempt::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PostJob::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PostJob {
    Table,
    Id,
    CreatedAt,
    UpdatedAt,
    JobType,
    Arguments,
    Status,
    RetryCount,
    NextExecutionAt,
}

#[derive(DeriveIden)]
enum DeliveryAttempt {
    Table,
    Id,
    JobId,
    Result,
    StartedAt,
    FinishedAt,
    ExecutionTimeMs,
    FailureReason,
    CreatedAt,
}

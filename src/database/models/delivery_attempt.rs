//! `SeaORM` Entity for per-attempt delivery history

use crate::database::models::attempt_result::AttemptResult;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "delivery_attempt")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub job_id: String,
    pub result: AttemptResult,
    pub started_at: DateTime,
    pub finished_at: DateTime,
    pub execution_time_ms: i64,
    pub failure_reason: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post_job::Entity",
        from = "Column::JobId",
        to = "super::post_job::Column::Id"
    )]
    PostJob,
}

impl Related<super::post_job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostJob.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[allow(dead_code)]
impl Model {
    pub const fn was_successful(&self) -> bool {
        self.result.is_successful()
    }
}

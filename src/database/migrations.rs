pub use sea_orm_migration::prelude::*;

mod m20250921_140200_create_post_job;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250921_140200_create_post_job::Migration)]
    }
}

pub struct Migrator;

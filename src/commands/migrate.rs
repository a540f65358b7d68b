use std::{cmp, error::Error, process};

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait as _;

use crate::{
    database::{migrations::Migrator, setup_database_connection},
    {cli::MigrateAction, config::Config},
};

pub async fn handle_migrate_command(config: &Config, action: MigrateAction) {
    // Plain connection; migration commands manage the schema themselves
    let db = setup_database_connection(&config.database).await;

    if let Err(e) = run_migration_action(&db, action).await {
        eprintln!("❌ Migration failed: {e}");
        process::exit(1);
    }
}

pub async fn run_migration_action(
    db: &DatabaseConnection,
    action: MigrateAction,
) -> Result<(), Box<dyn Error>> {
    match action {
        MigrateAction::Up { steps } => migrate_up(db, steps).await,
        MigrateAction::Down { steps } => migrate_down(db, steps).await,
        MigrateAction::Status => print_status(db).await,
        MigrateAction::Reset => reset(db).await,
        MigrateAction::Reapply { steps } => reapply(db, steps).await,
    }
}

async fn migrate_up(db: &DatabaseConnection, steps: Option<u32>) -> Result<(), Box<dyn Error>> {
    let pending = Migrator::get_pending_migrations(db).await?;

    if pending.is_empty() {
        println!("✅ Schema is up to date");
        return Ok(());
    }

    let count = steps.map_or(pending.len(), |s| cmp::min(s as usize, pending.len()));

    println!("Applying {count} migration(s):");
    for migration in &pending[..count] {
        println!("  📄 {}", migration.name());
    }

    Migrator::up(db, steps).await?;

    println!("✅ Done");
    Ok(())
}

async fn migrate_down(db: &DatabaseConnection, steps: u32) -> Result<(), Box<dyn Error>> {
    let applied = Migrator::get_applied_migrations(db).await?;

    if applied.is_empty() {
        println!("Nothing to roll back");
        return Ok(());
    }

    let count = cmp::min(steps as usize, applied.len());

    println!("Rolling back {count} migration(s):");
    for migration in applied[applied.len() - count..].iter().rev() {
        println!("  📄 {}", migration.name());
    }

    Migrator::down(db, Some(steps)).await?;

    println!("✅ Done");
    Ok(())
}

async fn print_status(db: &DatabaseConnection) -> Result<(), Box<dyn Error>> {
    let applied = Migrator::get_applied_migrations(db).await?;
    let pending = Migrator::get_pending_migrations(db).await?;

    println!("Applied:");
    for migration in &applied {
        println!("  ✓ {}", migration.name());
    }

    if pending.is_empty() {
        println!("✅ No pending migrations");
    } else {
        println!("Pending:");
        for migration in &pending {
            println!("  - {}", migration.name());
        }
    }

    Ok(())
}

async fn reset(db: &DatabaseConnection) -> Result<(), Box<dyn Error>> {
    println!("🔄 Resetting database (all data will be lost)");

    let applied = Migrator::get_applied_migrations(db).await?;
    let num_applied = u32::try_from(applied.len()).map_err(|_| "Too many applied migrations")?;

    if num_applied > 0 {
        Migrator::down(db, Some(num_applied)).await?;
        println!("✅ Rolled back {num_applied} migration(s)");
    }

    Migrator::up(db, None).await?;

    println!("✅ Schema recreated");
    Ok(())
}

async fn reapply(db: &DatabaseConnection, steps: u32) -> Result<(), Box<dyn Error>> {
    let applied = Migrator::get_applied_migrations(db).await?;

    if applied.is_empty() {
        println!("Nothing to reapply");
        return Ok(());
    }

    let count = cmp::min(steps as usize, applied.len());

    println!("🔄 Reapplying {count} migration(s):");
    for migration in applied[applied.len() - count..].iter().rev() {
        println!("  📄 {}", migration.name());
    }

    Migrator::down(db, Some(steps)).await?;
    Migrator::up(db, Some(steps)).await?;

    println!("✅ Done");
    Ok(())
}

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
};
use std::{collections::HashSet, time::Duration};
use tokio::{spawn, time::sleep};
use tracing::{debug, error, info, warn};

use crate::{
    app::App,
    config::{JobsConfig, WorkerQueueConfig, WorkersConfig},
    database::models::{
        attempt_result::AttemptResult,
        delivery_attempt,
        job_status::JobStatus,
        post_job::{self, Entity as PostJobEntity},
    },
    jobs::{scheduler::Scheduler, worker::worker},
};

use super::{job_registry::JobRegistry, scheduled_job::ScheduledJob};

/// How often to scan for jobs stranded in the running state
const RECOVERY_INTERVAL_SECS: u64 = 300;

/// Every registered job type needs a pool that claims it; a job type
/// without one would sit in the queue forever.
///
/// # Panics
/// Panics on the first uncovered job type.
fn verify_job_types_have_workers(workers_config: &WorkersConfig, job_registry: &JobRegistry) {
    let covered: HashSet<&str> = workers_config
        .workers
        .values()
        .flat_map(|pool| pool.jobs.iter().map(String::as_str))
        .collect();

    for job_type in job_registry.job_names() {
        assert!(
            covered.contains(*job_type),
            "No worker pool claims job type '{job_type}'; add it to a pool in the jobs.workers config"
        );
    }
}

/// Run the whole dispatch side of the service: worker pools, the
/// recurring-job scheduler, and stuck-job recovery. Never returns.
pub async fn job_supervisor(
    jobs_config: JobsConfig,
    app: App,
    job_registry: JobRegistry,
    job_schedule: Vec<ScheduledJob>,
) {
    verify_job_types_have_workers(&jobs_config.workers, &job_registry);

    info!("🚀 Starting delivery workers");
    for (pool_name, pool_config) in &jobs_config.workers.workers {
        info!(
            "⚡ Pool '{}': {} workers claiming {:?}",
            pool_name, pool_config.count, pool_config.jobs
        );
        start_worker_pool(pool_name, pool_config, &app, &job_registry);
    }

    start_scheduler(&app.db, job_schedule);

    start_recovery_task(&jobs_config.workers, &app.db);

    // The spawned tasks run forever; park the supervisor
    std::future::pending::<()>().await;
}

fn start_worker_pool(
    pool_name: &str,
    pool_config: &WorkerQueueConfig,
    app: &App,
    job_registry: &JobRegistry,
) {
    for worker_id in 0..pool_config.count {
        let worker_instance_name = format!("{pool_name}-{worker_id}");
        let pool_config = pool_config.clone();
        let app = app.clone();
        let job_registry = job_registry.clone();

        spawn(async move {
            run_worker_with_restart(&worker_instance_name, &pool_config, app, job_registry).await;
        });
    }
}

/// A worker that errors out of its loop gets restarted after a pause.
async fn run_worker_with_restart(
    worker_instance_name: &str,
    pool_config: &WorkerQueueConfig,
    app: App,
    job_registry: JobRegistry,
) {
    let mut restart_count = 0;
    loop {
        debug!(
            "Worker '{}' up for job types {:?} (restart #{})",
            worker_instance_name, pool_config.jobs, restart_count
        );

        if let Err(e) = worker(worker_instance_name, pool_config, app.clone(), &job_registry).await
        {
            error!(
                "💥 Worker '{}' crashed (restart #{}): {}",
                worker_instance_name, restart_count, e
            );
        }

        restart_count += 1;

        sleep(Duration::from_secs(10)).await;
    }
}

/// Single-instance deployment (SQLite store), so the scheduler runs once
/// per process without any cross-instance leader election.
fn start_scheduler(db: &DatabaseConnection, job_schedule: Vec<ScheduledJob>) {
    let scheduler_db = db.clone();

    spawn(async move {
        info!("📅 Starting maintenance scheduler");
        let mut scheduler = Scheduler::new(scheduler_db, job_schedule);
        scheduler.run().await;
    });
}

fn start_recovery_task(config: &WorkersConfig, db: &DatabaseConnection) {
    let recovery_config = config.clone();
    let recovery_db = db.clone();

    spawn(async move {
        info!("🏥 Starting stuck job recovery");
        loop {
            match recover_stuck_jobs(&recovery_config, &recovery_db).await {
                Ok(0) => {}
                Ok(recovered) => info!("🏥 Recovered {} stuck jobs", recovered),
                Err(e) => error!("❌ Stuck job recovery failed: {e}"),
            }

            sleep(Duration::from_secs(RECOVERY_INTERVAL_SECS)).await;
        }
    });
}

async fn recover_stuck_jobs(
    config: &WorkersConfig,
    db: &DatabaseConnection,
) -> Result<usize, DbErr> {
    let mut total_recovered = 0;

    for (pool_name, pool_config) in &config.workers {
        total_recovered += recover_stuck_jobs_for_pool(pool_name, pool_config, db).await?;
    }

    Ok(total_recovered)
}

/// A job running for more than twice its pool's timeout means the worker
/// died mid-flight; the executing future itself is bounded by the
/// timeout, so a live worker cannot trip this.
pub(crate) async fn recover_stuck_jobs_for_pool(
    pool_name: &str,
    pool_config: &WorkerQueueConfig,
    db: &DatabaseConnection,
) -> Result<usize, DbErr> {
    let stuck_threshold_seconds = pool_config.job_timeout * 2;
    let cutoff_time = chrono::Utc::now().naive_utc()
        - chrono::Duration::seconds(stuck_threshold_seconds.into());

    let stuck_jobs = PostJobEntity::find()
        .filter(post_job::Column::Status.eq(JobStatus::Running))
        .filter(post_job::Column::JobType.is_in(&pool_config.jobs))
        .filter(post_job::Column::UpdatedAt.lte(cutoff_time))
        .all(db)
        .await?;

    let recovered_count = stuck_jobs.len();
    for stuck_job in stuck_jobs {
        recover_stuck_job(stuck_job, pool_name, stuck_threshold_seconds, db).await?;
    }

    Ok(recovered_count)
}

async fn recover_stuck_job(
    stuck_job: post_job::Model,
    pool_name: &str,
    stuck_threshold_seconds: u32,
    db: &DatabaseConnection,
) -> Result<(), DbErr> {
    let now = chrono::Utc::now().naive_utc();
    let running_duration = now.signed_duration_since(stuck_job.updated_at);

    warn!(
        "🏥 Recovering stuck job {}({}) in pool '{}': running for {}s, threshold {}s",
        stuck_job.id,
        stuck_job.job_type,
        pool_name,
        running_duration.num_seconds(),
        stuck_threshold_seconds
    );

    // The attempt was lost with its worker; record what we know
    let attempt = delivery_attempt::ActiveModel {
        id: sea_orm::Set(uuid::Uuid::new_v4()),
        job_id: sea_orm::Set(stuck_job.id.clone()),
        result: sea_orm::Set(AttemptResult::TimedOut),
        started_at: sea_orm::Set(stuck_job.updated_at),
        finished_at: sea_orm::Set(now),
        execution_time_ms: sea_orm::Set(running_duration.num_milliseconds()),
        failure_reason: sea_orm::Set(Some(format!(
            "Recovered after running for {}s (threshold {}s)",
            running_duration.num_seconds(),
            stuck_threshold_seconds
        ))),
        created_at: sea_orm::Set(now),
    };

    attempt.insert(db).await?;

    let mut active_job: post_job::ActiveModel = stuck_job.into();
    active_job.status = sea_orm::Set(JobStatus::Pending);
    active_job.updated_at = sea_orm::Set(now);
    active_job.update(db).await?;

    Ok(())
}

use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::{error::Error, str::FromStr, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{sleep, sleep_until, Duration as TokioDuration, Instant},
};
use tracing::{debug, error, info};

use crate::{
    database::models::{job_status::JobStatus, post_job},
    jobs::scheduled_job::ScheduledJob,
};

/// Drives the recurring maintenance schedule: one task per entry, each
/// sleeping until its next cron firing and enqueueing a due-now job row.
pub struct Scheduler {
    db: DatabaseConnection,
    schedule: Vec<ScheduledJob>,
    task_handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(db: DatabaseConnection, schedule: Vec<ScheduledJob>) -> Self {
        Self {
            db,
            schedule,
            task_handles: Vec::new(),
        }
    }

    pub async fn run(&mut self) {
        info!("📅 Scheduler started with {} entries", self.schedule.len());

        if self.schedule.is_empty() {
            std::future::pending::<()>().await;
            return;
        }

        for scheduled_job in &self.schedule {
            let db = self.db.clone();
            let job = scheduled_job.clone();

            self.task_handles.push(tokio::spawn(async move {
                run_schedule_entry(job, db).await;
            }));

            debug!("📅 Spawned scheduler task for '{}'", scheduled_job.name);
        }

        // The entry tasks run forever; surfacing a join here means one
        // of them panicked
        for (index, handle) in self.task_handles.iter_mut().enumerate() {
            if let Err(e) = handle.await {
                error!("📅 Scheduler task {index} failed: {e}");
            }
        }
    }
}

async fn run_schedule_entry(scheduled_job: ScheduledJob, db: DatabaseConnection) {
    // Parsed once at startup; schedules come from code, not users
    let schedule = parse_cron_schedule(&scheduled_job).expect("Invalid cron expression");

    loop {
        let Some(next_firing) = schedule.upcoming(chrono::Utc).next() else {
            error!(
                "📅 Schedule for '{}' has no upcoming firings",
                scheduled_job.name
            );
            sleep(TokioDuration::from_secs(60)).await;
            continue;
        };

        debug!(
            "🔄 '{}' fires next at {}",
            scheduled_job.name,
            next_firing.format("%Y-%m-%d %H:%M:%S UTC")
        );

        wait_until(next_firing).await;

        match enqueue_scheduled_job(&scheduled_job, next_firing, &db).await {
            Ok(()) => debug!("📅 Enqueued recurring job '{}'", scheduled_job.name),
            Err(e) => error!("❌ Failed to enqueue '{}': {}", scheduled_job.name, e),
        }
    }
}

fn parse_cron_schedule(scheduled_job: &ScheduledJob) -> Result<cron::Schedule, cron::error::Error> {
    cron::Schedule::from_str(&scheduled_job.cron_expression).map_err(|e| {
        error!(
            "❌ Invalid cron expression for '{}': {}",
            scheduled_job.name, e
        );
        e
    })
}

async fn wait_until(next_firing: chrono::DateTime<chrono::Utc>) {
    let sleep_duration = (next_firing - chrono::Utc::now())
        .to_std()
        .unwrap_or_default();
    if sleep_duration > Duration::ZERO {
        sleep_until(Instant::now() + sleep_duration).await;
    }
}

/// Insert a due-now job row for this cron firing.
///
/// The id embeds the firing time, so a recurring job never collides with
/// post jobs and reruns within the same second are impossible by
/// construction of the cron schedule.
async fn enqueue_scheduled_job(
    scheduled_job: &ScheduledJob,
    fired_at: chrono::DateTime<chrono::Utc>,
    db: &DatabaseConnection,
) -> Result<(), Box<dyn Error>> {
    let now = chrono::Utc::now().naive_utc();

    let new_job = post_job::ActiveModel {
        id: Set(format!(
            "{}-{}",
            scheduled_job.job_name,
            fired_at.format("%Y-%m-%d %H:%M:%S")
        )),
        job_type: Set(scheduled_job.job_name.to_string()),
        arguments: Set(scheduled_job.arguments.clone()),
        status: Set(JobStatus::Pending),
        retry_count: Set(0),
        next_execution_at: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
    };

    new_job.insert(db).await?;
    Ok(())
}

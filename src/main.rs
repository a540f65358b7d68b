use crosspost::{
    api,
    app_info::AppInfo,
    boot::{boot, BootConfig},
    delivery::{PostToFacebookJob, PostToInstagramJob, PostToLinkedInJob, PostToTwitterJob},
    jobs::{
        job_registry::JobRegistry, purge_job::PurgeFinishedJobsJob, scheduled_job::ScheduledJob,
        Job,
    },
};

fn job_registry() -> JobRegistry {
    let mut registry = JobRegistry::new();
    registry.register_job::<PostToTwitterJob>();
    registry.register_job::<PostToFacebookJob>();
    registry.register_job::<PostToInstagramJob>();
    registry.register_job::<PostToLinkedInJob>();
    registry.register_job::<PurgeFinishedJobsJob>();
    registry
}

fn job_schedule() -> Vec<ScheduledJob> {
    vec![ScheduledJob {
        name: "hourly purge of finished jobs".to_string(),
        job_name: PurgeFinishedJobsJob::name(),
        arguments: serde_json::json!({}),
        cron_expression: "0 0 * * * *".to_string(),
    }]
}

#[tokio::main]
async fn main() {
    let app_info = AppInfo::from_cargo();

    boot(BootConfig::new(
        app_info,
        api::schedule::routes,
        job_registry(),
        job_schedule(),
    ))
    .await;
}

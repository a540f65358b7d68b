/// Recurring job configuration: enqueues `job_name` with `arguments`
/// every time `cron_expression` fires.
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub name: String,
    pub job_name: &'static str,
    pub arguments: serde_json::Value,
    pub cron_expression: String,
}

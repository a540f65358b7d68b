use std::future::Future;
use std::pin::Pin;
use std::{collections::HashMap, sync::Arc};

use crate::app::App;

use super::{job_result::JobResult, Job, JobError};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
type JobExecutor =
    Arc<dyn Fn(&App, serde_json::Value) -> BoxFuture<'static, Result<(), JobError>> + Send + Sync>;

/// Maps stored `job_type` strings back to their executors. Workers look
/// up whatever the claimed row names; an unknown name is a permanent
/// failure, not a panic, since the row may predate a deploy.
#[derive(Clone)]
pub struct JobRegistry {
    jobs: HashMap<&'static str, JobExecutor>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: HashMap::new(),
        }
    }

    pub fn register_job<J: Job + 'static>(&mut self) {
        self.jobs.insert(
            J::name(),
            Arc::new(|app: &App, args_json: serde_json::Value| {
                let app = app.clone();
                Box::pin(async move {
                    let arguments: J::Arguments =
                        serde_json::from_value(args_json).map_err(|e| {
                            JobError::FailPermanently(format!("Failed to parse job arguments: {e}"))
                        })?;
                    J::execute(&app, arguments).await
                })
            }),
        );
    }

    pub(crate) fn job_names(&self) -> impl Iterator<Item = &&'static str> {
        self.jobs.keys()
    }

    pub(crate) async fn execute(
        &self,
        app: &App,
        job_type: &str,
        arguments: &serde_json::Value,
    ) -> JobResult {
        let Some(executor) = self.jobs.get(job_type) else {
            return JobResult::Failed(JobError::FailPermanently(format!(
                "No job registered for job type: {job_type}"
            )));
        };

        match executor(app, arguments.clone()).await {
            Ok(()) => JobResult::Completed,
            Err(e) => JobResult::Failed(e),
        }
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

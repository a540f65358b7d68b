pub mod attempt_result;
pub mod delivery_attempt;
pub mod job_status;
pub mod post_job;

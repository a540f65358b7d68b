//! The four platform delivery jobs and their shared plumbing.
//!
//! Each platform gets its own registered job type so the stored
//! `job_type` column names the handler that will run, which is also what
//! the listing endpoint reports as `func`.

use chrono::NaiveDateTime;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::debug;

use crate::{
    app::App,
    jobs::{Job, JobError},
    poster::PosterError,
};

/// Target platform of a post. Parses case-insensitively ("twitter",
/// "Twitter", "TWITTER" all work).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Platform {
    Twitter,
    Facebook,
    Instagram,
    LinkedIn,
}

impl Platform {
    /// Name of the delivery job handling posts for this platform
    pub const fn job_name(self) -> &'static str {
        match self {
            Self::Twitter => "post_to_twitter",
            Self::Facebook => "post_to_facebook",
            Self::Instagram => "post_to_instagram",
            Self::LinkedIn => "post_to_linkedin",
        }
    }

    /// Status the platform API answers with on success
    pub const fn expected_status(self) -> StatusCode {
        match self {
            Self::Twitter | Self::LinkedIn => StatusCode::CREATED,
            Self::Facebook | Self::Instagram => StatusCode::OK,
        }
    }
}

/// All delivery job names, for filtering post jobs from maintenance jobs
pub fn delivery_job_names() -> Vec<&'static str> {
    use strum::IntoEnumIterator as _;
    Platform::iter().map(Platform::job_name).collect()
}

/// Public job identifier: platform, trigger time, and a content prefix.
///
/// Deterministic on purpose - resubmitting the same post for the same
/// time produces the same id, which the store treats as a replacement.
pub fn job_id(platform: Platform, run_at: &str, content: &str) -> String {
    let prefix: String = content.chars().take(10).collect();
    format!("{platform}-{run_at}-{prefix}")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostArguments {
    pub text: String,
}

/// Schedule a delivery job for `platform` at `run_at` (naive UTC).
pub async fn schedule_delivery(
    app: &App,
    platform: Platform,
    id: String,
    text: String,
    run_at: NaiveDateTime,
) -> Result<(), sea_orm::DbErr> {
    let arguments = PostArguments { text };
    match platform {
        Platform::Twitter => {
            app.schedule_job::<PostToTwitterJob>(id, arguments, run_at)
                .await
        }
        Platform::Facebook => {
            app.schedule_job::<PostToFacebookJob>(id, arguments, run_at)
                .await
        }
        Platform::Instagram => {
            app.schedule_job::<PostToInstagramJob>(id, arguments, run_at)
                .await
        }
        Platform::LinkedIn => {
            app.schedule_job::<PostToLinkedInJob>(id, arguments, run_at)
                .await
        }
    }
}

async fn deliver(app: &App, platform: Platform, arguments: PostArguments) -> Result<(), JobError> {
    let response = app
        .poster
        .post(platform, &arguments.text)
        .await
        .map_err(|e| match e {
            // A platform rejection will not heal on its own
            PosterError::Rejected { .. } => JobError::FailPermanently(e.to_string()),
            PosterError::Transport { .. } => JobError::TryAgainLater(e.to_string()),
        })?;

    debug!("📤 {platform} accepted post: {response}");
    Ok(())
}

pub struct PostToTwitterJob;

impl Job for PostToTwitterJob {
    type Arguments = PostArguments;

    async fn execute(app: &App, arguments: Self::Arguments) -> Result<(), JobError> {
        deliver(app, Platform::Twitter, arguments).await
    }

    fn name() -> &'static str {
        Platform::Twitter.job_name()
    }
}

pub struct PostToFacebookJob;

impl Job for PostToFacebookJob {
    type Arguments = PostArguments;

    async fn execute(app: &App, arguments: Self::Arguments) -> Result<(), JobError> {
        deliver(app, Platform::Facebook, arguments).await
    }

    fn name() -> &'static str {
        Platform::Facebook.job_name()
    }
}

pub struct PostToInstagramJob;

impl Job for PostToInstagramJob {
    type Arguments = PostArguments;

    async fn execute(app: &App, arguments: Self::Arguments) -> Result<(), JobError> {
        deliver(app, Platform::Instagram, arguments).await
    }

    fn name() -> &'static str {
        Platform::Instagram.job_name()
    }
}

pub struct PostToLinkedInJob;

impl Job for PostToLinkedInJob {
    type Arguments = PostArguments;

    async fn execute(app: &App, arguments: Self::Arguments) -> Result<(), JobError> {
        deliver(app, Platform::LinkedIn, arguments).await
    }

    fn name() -> &'static str {
        Platform::LinkedIn.job_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!("twitter".parse::<Platform>().unwrap(), Platform::Twitter);
        assert_eq!("Twitter".parse::<Platform>().unwrap(), Platform::Twitter);
        assert_eq!("LINKEDIN".parse::<Platform>().unwrap(), Platform::LinkedIn);
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn job_names_match_platforms() {
        assert_eq!(Platform::Twitter.job_name(), "post_to_twitter");
        assert_eq!(Platform::LinkedIn.job_name(), "post_to_linkedin");
        assert_eq!(delivery_job_names().len(), 4);
    }

    #[test]
    fn job_id_truncates_content_by_characters() {
        let id = job_id(Platform::Twitter, "2030-01-01 10:00:00", "hello world, again");
        assert_eq!(id, "Twitter-2030-01-01 10:00:00-hello worl");

        // Multi-byte content must not split a character
        let id = job_id(Platform::Facebook, "2030-01-01 10:00:00", "héllo wörld éxtra");
        assert_eq!(id, "Facebook-2030-01-01 10:00:00-héllo wörl");
    }
}

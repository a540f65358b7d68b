use std::{
    fmt::{self, Debug},
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PlatformCredentials;
use crate::delivery::Platform;

/// Platform API endpoints. Defaults point at the real services; tests
/// override them to hit a local mock server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEndpoints {
    #[serde(default = "default_twitter_url")]
    pub twitter: String,
    #[serde(default = "default_facebook_url")]
    pub facebook: String,
    #[serde(default = "default_instagram_url")]
    pub instagram: String,
    #[serde(default = "default_linkedin_url")]
    pub linkedin: String,
}

impl Default for PlatformEndpoints {
    fn default() -> Self {
        Self {
            twitter: default_twitter_url(),
            facebook: default_facebook_url(),
            instagram: default_instagram_url(),
            linkedin: default_linkedin_url(),
        }
    }
}

fn default_twitter_url() -> String {
    "https://api.twitter.com/2/tweets".to_string()
}

fn default_facebook_url() -> String {
    "https://graph.facebook.com/me/feed".to_string()
}

fn default_instagram_url() -> String {
    "https://graph.facebook.com/me/media".to_string()
}

fn default_linkedin_url() -> String {
    "https://api.linkedin.com/v2/ugcPosts".to_string()
}

#[derive(Debug, Error)]
pub enum PosterError {
    /// The request never produced a platform response; worth retrying.
    #[error("{platform} request failed: {source}")]
    Transport {
        platform: Platform,
        #[source]
        source: reqwest::Error,
    },
    /// The platform answered with an unexpected status; retrying the same
    /// content and credentials will not change the outcome.
    #[error("{platform} rejected the post ({status}): {body}")]
    Rejected {
        platform: Platform,
        status: reqwest::StatusCode,
        body: String,
    },
}

/// A post captured by the mock poster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPost {
    pub platform: Platform,
    pub text: String,
}

/// Mock poster that captures posts for testing.
#[derive(Clone, Default)]
pub struct MockPoster {
    posts: Arc<Mutex<Vec<SentPost>>>,
}

impl MockPoster {
    pub fn new() -> Self {
        Self {
            posts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn capture(&self, platform: Platform, text: &str) -> serde_json::Value {
        self.posts.lock().unwrap().push(SentPost {
            platform,
            text: text.to_string(),
        });
        serde_json::json!({ "posted": true, "platform": platform.to_string() })
    }

    pub fn posts(&self) -> Vec<SentPost> {
        self.posts.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.posts.lock().unwrap().clear();
    }
}

/// Real HTTP delivery to the platform APIs.
///
/// Request shapes differ per platform: Twitter and LinkedIn take JSON
/// with a bearer token, Facebook and Instagram take form bodies with the
/// access token as a field.
#[derive(Clone)]
pub struct HttpPoster {
    client: reqwest::Client,
    endpoints: PlatformEndpoints,
    credentials: PlatformCredentials,
}

impl HttpPoster {
    pub fn new(endpoints: PlatformEndpoints, credentials: PlatformCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
            credentials,
        }
    }

    async fn post(&self, platform: Platform, text: &str) -> Result<serde_json::Value, PosterError> {
        let request = match platform {
            Platform::Twitter => self
                .client
                .post(&self.endpoints.twitter)
                .bearer_auth(&self.credentials.twitter_bearer_token)
                .json(&serde_json::json!({ "text": text })),
            Platform::Facebook => self.client.post(&self.endpoints.facebook).form(&[
                ("message", text),
                ("access_token", self.credentials.facebook_access_token.as_str()),
            ]),
            Platform::Instagram => self.client.post(&self.endpoints.instagram).form(&[
                ("caption", text),
                ("access_token", self.credentials.instagram_access_token.as_str()),
            ]),
            Platform::LinkedIn => self
                .client
                .post(&self.endpoints.linkedin)
                .bearer_auth(&self.credentials.linkedin_access_token)
                .json(&serde_json::json!({
                    "author": self.credentials.linkedin_author_urn.as_str(),
                    "lifecycleState": "PUBLISHED",
                    "specificContent": {
                        "com.linkedin.ugc.ShareContent": {
                            "shareCommentary": { "text": text },
                            "shareMediaCategory": "NONE"
                        }
                    },
                    "visibility": {
                        "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC"
                    },
                })),
        };

        let response = request
            .send()
            .await
            .map_err(|source| PosterError::Transport { platform, source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| PosterError::Transport { platform, source })?;

        if status != platform.expected_status() {
            return Err(PosterError::Rejected {
                platform,
                status,
                body,
            });
        }

        // Platforms occasionally answer with non-JSON bodies on success
        Ok(serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body)))
    }
}

/// Poster that can be either real HTTP delivery or a mock for testing.
///
/// The mock variant captures posts in memory, allowing tests to verify
/// that content went out without talking to any platform.
#[derive(Clone)]
pub enum Poster {
    /// Real HTTP delivery for production use
    Http(HttpPoster),
    /// Mock poster that captures posts for testing
    Mock(MockPoster),
}

impl Debug for Poster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(_) => f.debug_tuple("Poster::Http").finish(),
            Self::Mock(_) => f.debug_tuple("Poster::Mock").finish(),
        }
    }
}

impl Poster {
    /// Create a new mock poster for testing
    pub fn mock() -> Self {
        Self::Mock(MockPoster::new())
    }

    /// Create a real HTTP poster for production
    pub fn http(endpoints: PlatformEndpoints, credentials: PlatformCredentials) -> Self {
        Self::Http(HttpPoster::new(endpoints, credentials))
    }

    /// Deliver `text` to `platform`, returning the platform's response.
    pub async fn post(
        &self,
        platform: Platform,
        text: &str,
    ) -> Result<serde_json::Value, PosterError> {
        match self {
            Self::Http(http) => http.post(platform, text).await,
            Self::Mock(mock) => Ok(mock.capture(platform, text)),
        }
    }

    /// Get captured posts (only available for mock poster)
    ///
    /// Returns None if this is a real HTTP poster.
    pub fn sent_posts(&self) -> Option<Vec<SentPost>> {
        match self {
            Self::Mock(mock) => Some(mock.posts()),
            Self::Http(_) => None,
        }
    }

    /// Clear captured posts (only available for mock poster)
    pub fn clear_sent_posts(&self) {
        if let Self::Mock(mock) = self {
            mock.clear();
        }
    }
}

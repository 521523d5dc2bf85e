//! HTTP client for the deck generation backend.
//!
//! The backend generates a project in stages (text, then images) and exposes
//! its current state at `GET /api/themes/project/{id}`. The client fetches
//! that state with retry on transient failures and can poll it until the
//! project reaches a terminal status.

use std::fmt;
use std::time::Duration;

use deck_core::{Slide, Theme};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API base URL is invalid.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    /// HTTP layer failed (connection, timeout, etc.).
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The response body was not a project.
    #[error("failed to parse project payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Polling gave up before the project finished.
    #[error("project {id} not finished after {polls} polls")]
    PollLimit {
        /// Project ID.
        id: String,
        /// Number of polls made.
        polls: u32,
    },
}

impl ClientError {
    /// Returns `true` if this error is transient and the request may succeed
    /// when retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_)) || matches!(self, Self::Status { status, .. } if *status >= 500)
    }
}

/// Configuration for retry with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts.
    pub max_attempts: u32,
    /// Initial delay between retries in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 100,
            max_delay_ms: 10_000,
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom values.
    #[must_use]
    pub fn new(max_attempts: u32, initial_delay_ms: u64, max_delay_ms: u64, multiplier: f64) -> Self {
        Self {
            max_attempts,
            initial_delay_ms,
            max_delay_ms,
            multiplier,
        }
    }

    /// Calculate delay for a given attempt number (0-indexed).
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let base_delay = self.initial_delay_ms as f64 * self.multiplier.powi(attempt as i32);
        let capped_delay = base_delay.min(self.max_delay_ms as f64) as u64;
        let jitter = (capped_delay / 4).max(1);
        capped_delay.saturating_add(jitter / 2)
    }
}

/// Configuration for polling a project until it finishes.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between polls.
    pub interval: Duration,
    /// Give up after this many polls. `None` polls until cancelled.
    pub max_polls: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_polls: None,
        }
    }
}

/// Generation stage of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ProjectStatus {
    /// Queued.
    #[default]
    #[serde(rename = "pending")]
    Pending,
    /// Text is ready, images are being generated.
    #[serde(rename = "image creation")]
    ImageCreation,
    /// Finished.
    #[serde(rename = "completed")]
    Completed,
    /// Generation failed.
    #[serde(rename = "failed")]
    Failed,
    /// Any status this client does not know.
    #[serde(other)]
    Unknown,
}

impl ProjectStatus {
    /// Whether polling should stop.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::ImageCreation => "image creation",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A generated presentation project.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Project {
    /// Project ID as the backend reports it.
    #[serde(default)]
    pub id: Value,
    /// Generation stage.
    #[serde(default)]
    pub status: ProjectStatus,
    /// Slides produced so far.
    #[serde(default, deserialize_with = "slides_from_value")]
    pub slides: Vec<Slide>,
    /// Theme, if one was chosen.
    #[serde(default)]
    pub theme: Option<Theme>,
}

impl Project {
    /// Parse a saved project: either the backend's project object or a bare
    /// array of slides, which is treated as a completed project.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is neither.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str::<Value>(text)? {
            Value::Array(slides) => Ok(Self {
                status: ProjectStatus::Completed,
                slides: serde_json::from_value(Value::Array(slides))?,
                ..Self::default()
            }),
            other => serde_json::from_value(other),
        }
    }

    /// The project's theme, or the default theme when none was set.
    #[must_use]
    pub fn theme_or_default(&self) -> Theme {
        self.theme.clone().unwrap_or_else(|| {
            warn!("Project has no theme, using the default theme");
            Theme::default()
        })
    }
}

/// Slides arrive either as an array or as a JSON-encoded string of one.
fn slides_from_value<'de, D>(deserializer: D) -> Result<Vec<Slide>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::String(text) => serde_json::from_str(&text).map_err(serde::de::Error::custom),
        other => serde_json::from_value(other).map_err(serde::de::Error::custom),
    }
}

/// Client for the project endpoint.
#[derive(Debug, Clone)]
pub struct ProjectClient {
    http: Client,
    base: Url,
    retry_config: RetryConfig,
}

impl ProjectClient {
    /// Create a client for the API at `base_url` with default retries.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL is malformed.
    /// Returns [`ClientError::Http`] if the HTTP client fails to build.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_retry_config(base_url, RetryConfig::default())
    }

    /// Create a client with custom retry configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL is malformed.
    /// Returns [`ClientError::Http`] if the HTTP client fails to build.
    pub fn with_retry_config(base_url: &str, retry_config: RetryConfig) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        // Url::join replaces the last path segment unless the base ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = Client::builder()
            .user_agent(format!("deck/{} (saorsa-deck)", env!("CARGO_PKG_VERSION")))
            // Disable proxy detection to avoid macOS system-configuration panic
            .no_proxy()
            .build()?;

        Ok(Self {
            http,
            base,
            retry_config,
        })
    }

    /// URL of a project's state.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the ID does not form a valid path.
    pub fn project_url(&self, project_id: &str) -> Result<Url, ClientError> {
        self.base
            .join(&format!("api/themes/project/{project_id}"))
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))
    }

    /// Fetch a project once, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are exhausted, or immediately for
    /// non-retryable errors.
    pub async fn fetch_project(&self, project_id: &str) -> Result<Project, ClientError> {
        let url = self.project_url(project_id)?;
        let config = &self.retry_config;
        let attempts = config.max_attempts.max(1);

        let mut attempt = 0;
        loop {
            match self.fetch_once(&url).await {
                Ok(project) => return Ok(project),
                Err(error) if error.is_retryable() && attempt + 1 < attempts => {
                    let delay = config.delay_for_attempt(attempt);
                    warn!(
                        "Project fetch failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt + 1,
                        attempts,
                        delay,
                        error
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<Project, ClientError> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.bytes().await?;
        let project: Project = serde_json::from_slice(&body)?;
        debug!(
            "Fetched project {}: status {}, {} slides",
            project.id,
            project.status,
            project.slides.len()
        );
        Ok(project)
    }

    /// Poll a project until its status is `completed` or `failed`.
    ///
    /// The first fetch happens immediately. Dropping the returned future
    /// stops polling.
    ///
    /// # Errors
    ///
    /// Returns a fetch error that survived retries, or
    /// [`ClientError::PollLimit`] when `poll.max_polls` is reached first.
    pub async fn poll_until_terminal(&self, project_id: &str, poll: &PollConfig) -> Result<Project, ClientError> {
        let mut polls = 0u32;
        loop {
            let project = self.fetch_project(project_id).await?;
            polls += 1;
            if project.status.is_terminal() {
                info!("Polling stopped. Final status: {}", project.status);
                return Ok(project);
            }
            info!(
                "Project {} is {} ({} slides so far)",
                project_id,
                project.status,
                project.slides.len()
            );
            if poll.max_polls.is_some_and(|max| polls >= max) {
                return Err(ClientError::PollLimit {
                    id: project_id.to_string(),
                    polls,
                });
            }
            tokio::time::sleep(poll.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_error_is_retryable() {
        assert!(!ClientError::InvalidUrl("x".to_string()).is_retryable());
        assert!(ClientError::Status {
            status: 503,
            url: "u".to_string()
        }
        .is_retryable());
        assert!(!ClientError::Status {
            status: 404,
            url: "u".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_retry_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.initial_delay_ms, 100);
        assert_eq!(config.max_delay_ms, 10_000);
    }

    #[test]
    fn test_retry_delay_grows_and_caps() {
        let config = RetryConfig::new(5, 100, 1_000, 2.0);
        assert_eq!(config.delay_for_attempt(0), 112);
        assert_eq!(config.delay_for_attempt(1), 225);
        assert_eq!(config.delay_for_attempt(10), 1_125);
    }

    #[test]
    fn test_project_url_keeps_base_path() {
        let client = ProjectClient::new("http://localhost:5000/backend").unwrap();
        assert_eq!(
            client.project_url("42").unwrap().as_str(),
            "http://localhost:5000/backend/api/themes/project/42"
        );
        assert!(matches!(
            ProjectClient::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_project_parsing() {
        let project: Project = serde_json::from_value(json!({
            "id": 7,
            "status": "image creation",
            "slides": "[{\"slideNumber\":1,\"type\":\"TitleSlide\",\"title\":\"Hi\"}]"
        }))
        .unwrap();
        assert_eq!(project.status, ProjectStatus::ImageCreation);
        assert!(!project.status.is_terminal());
        assert_eq!(project.slides.len(), 1);
        assert_eq!(project.slides[0].title, "Hi");
        assert_eq!(project.theme_or_default(), Theme::default());

        let odd: Project = serde_json::from_value(json!({ "status": "archived", "slides": null })).unwrap();
        assert_eq!(odd.status, ProjectStatus::Unknown);
        assert!(odd.slides.is_empty());
    }

    #[test]
    fn test_project_from_saved_json() {
        let bare = Project::from_json(r#"[{"type":"ContentSlide","title":"A"}]"#).unwrap();
        assert_eq!(bare.status, ProjectStatus::Completed);
        assert_eq!(bare.slides.len(), 1);
        assert!(bare.theme.is_none());

        let full = Project::from_json(r#"{"id":"x","status":"completed","slides":[],"theme":{}}"#).unwrap();
        assert_eq!(full.id, json!("x"));
        assert!(full.theme.is_some());

        assert!(Project::from_json("42").is_err());
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig::new(3, 1, 5, 2.0)
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn fetch_project_retries_server_errors() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/themes/project/9"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/themes/project/9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 9,
                "status": "completed",
                "slides": [{ "slideNumber": 1, "type": "ContentSlide", "title": "Plan" }],
                "theme": { "primary_color": "#ff0000" }
            })))
            .mount(&server)
            .await;

        let client = ProjectClient::with_retry_config(&server.uri(), fast_retry()).unwrap();
        let project = client.fetch_project("9").await.expect("project");
        assert_eq!(project.status, ProjectStatus::Completed);
        assert_eq!(project.slides[0].title, "Plan");
        assert_eq!(project.theme_or_default().primary_color(), "#ff0000");
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn fetch_project_does_not_retry_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/themes/project/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = ProjectClient::with_retry_config(&server.uri(), fast_retry()).unwrap();
        let err = client.fetch_project("missing").await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 404, .. }));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn poll_stops_at_terminal_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/themes/project/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 3, "status": "pending", "slides": []
            })))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/themes/project/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 3, "status": "failed", "slides": []
            })))
            .mount(&server)
            .await;

        let client = ProjectClient::with_retry_config(&server.uri(), fast_retry()).unwrap();
        let poll = PollConfig {
            interval: Duration::from_millis(5),
            max_polls: Some(10),
        };
        let project = client.poll_until_terminal("3", &poll).await.expect("project");
        assert_eq!(project.status, ProjectStatus::Failed);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn poll_gives_up_after_limit() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/themes/project/4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 4, "status": "image creation", "slides": []
            })))
            .mount(&server)
            .await;

        let client = ProjectClient::with_retry_config(&server.uri(), fast_retry()).unwrap();
        let poll = PollConfig {
            interval: Duration::from_millis(1),
            max_polls: Some(2),
        };
        let err = client.poll_until_terminal("4", &poll).await.unwrap_err();
        assert!(matches!(err, ClientError::PollLimit { polls: 2, .. }));
    }
}

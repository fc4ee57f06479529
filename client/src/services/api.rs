use std::time::Duration;

use reqwest::Url;
use shared::{DashboardResponse, EventAckOut, ProgressEvent};
use tracing::{debug, info};

use crate::services::dashboard;
use crate::services::errors::ApiError;

const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = concat!("learning-tracker/", env!("CARGO_PKG_VERSION"));

/// Configuration for the API client, passed at construction
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// API client for communicating with the progress backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client with the default configuration
    pub fn new() -> Result<Self, ApiError> {
        Self::with_config(ApiClientConfig::default())
    }

    /// Create a new API client with a custom base URL
    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        Self::with_config(ApiClientConfig {
            base_url: base_url.to_string(),
            ..ApiClientConfig::default()
        })
    }

    pub fn with_config(config: ApiClientConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ApiError::InvalidArgument(format!("Invalid base URL {}: {}", config.base_url, e))
        })?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    /// Record a single progress event for a child.
    ///
    /// Issues exactly one `POST children/{childId}/events/{kind}` with the
    /// bare kind-specific body; the returned ack is the only effect visible
    /// to the caller. No retry, no caching, no local bookkeeping.
    pub async fn post_progress_event(
        &self,
        child_id: &str,
        event: &ProgressEvent,
    ) -> Result<EventAckOut, ApiError> {
        if child_id.trim().is_empty() {
            return Err(ApiError::InvalidArgument(
                "Child id cannot be empty".to_string(),
            ));
        }

        let kind = event.kind();
        let url = self.endpoint(&["children", child_id, "events", kind.as_str()])?;
        debug!(child_id = %child_id, kind = %kind, "Posting progress event");

        let request = self.http.post(url);
        // The kind travels in the path; the body is the bare per-kind object
        let request = match event {
            ProgressEvent::Flashcard(body) => request.json(body),
            ProgressEvent::Chore(body) => request.json(body),
            ProgressEvent::Outdoor(body) => request.json(body),
            ProgressEvent::Affirmation(body) => request.json(body),
        };

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Status(status.as_u16(), text));
        }

        let ack: EventAckOut = response
            .json()
            .await
            .map_err(|e| ApiError::Protocol(format!("Malformed event ack: {}", e)))?;

        info!(
            child_id = %child_id,
            kind = %kind,
            points = ack.points_awarded,
            achievements = ack.new_achievement_ids.len(),
            "Recorded progress event"
        );
        Ok(ack)
    }

    /// Fetch the validated dashboard snapshot for a child.
    ///
    /// The response is parsed defensively: the caller receives either a
    /// fully typed, internally consistent dashboard or a single error.
    pub async fn get_dashboard(&self, child_id: &str) -> Result<DashboardResponse, ApiError> {
        if child_id.trim().is_empty() {
            return Err(ApiError::InvalidArgument(
                "Child id cannot be empty".to_string(),
            ));
        }

        let url = self.endpoint(&["children", child_id, "dashboard"])?;
        debug!(child_id = %child_id, "Fetching dashboard");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Status(status.as_u16(), text));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ApiError::Validation(format!("Invalid dashboard payload: {}", e)))?;

        dashboard::parse_dashboard(payload)
    }

    /// Build an endpoint URL, percent-encoding each path segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ApiError::InvalidArgument(format!(
                    "Base URL {} cannot carry path segments",
                    self.base_url
                ))
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }
}

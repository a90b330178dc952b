//! Typed client for the HTTP collaborator.

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::models::{ApiCamera, ApiEvent, ApiHealth};
use crate::config::ConsoleConfig;
use crate::domain::{Camera, Event, Incident};
use crate::error::ConsoleError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the collaborator's REST endpoints.
///
/// Authenticated endpoints carry `Authorization: Bearer <token>` when a
/// token is configured; `/health` is always fetched anonymously.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    events_limit: u32,
}

impl ApiClient {
    /// Creates a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Http`] if the underlying HTTP client cannot
    /// be built.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        events_limit: u32,
    ) -> Result<Self, ConsoleError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            events_limit,
        })
    }

    /// Creates a client from the console configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Http`] if the underlying HTTP client cannot
    /// be built.
    pub fn from_config(config: &ConsoleConfig) -> Result<Self, ConsoleError> {
        Self::new(
            config.api_base_url.as_str(),
            config.api_token.clone(),
            config.api_events_limit,
        )
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/cameras`, with status derived from the enablement flag.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Http`] on transport or decode failure and
    /// [`ConsoleError::UnexpectedStatus`] on a non-success response.
    pub async fn fetch_cameras(&self) -> Result<Vec<Camera>, ConsoleError> {
        let cameras: Vec<ApiCamera> = self.get_json("/api/cameras", true).await?;
        Ok(cameras.into_iter().map(Camera::from).collect())
    }

    /// `GET /api/events?limit=N`, with severity normalized.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Http`] on transport or decode failure and
    /// [`ConsoleError::UnexpectedStatus`] on a non-success response.
    pub async fn fetch_events(&self) -> Result<Vec<Event>, ConsoleError> {
        let path = format!("/api/events?limit={}", self.events_limit);
        let events: Vec<ApiEvent> = self.get_json(&path, true).await?;
        Ok(events.into_iter().map(Event::from).collect())
    }

    /// `GET /health`, returning the backend's status string.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Http`] on transport or decode failure and
    /// [`ConsoleError::UnexpectedStatus`] on a non-success response.
    pub async fn fetch_health(&self) -> Result<Option<String>, ConsoleError> {
        let health: ApiHealth = self.get_json("/health", false).await?;
        Ok(health.status)
    }

    /// `GET /api/events/incidents`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Http`] on transport or decode failure and
    /// [`ConsoleError::UnexpectedStatus`] on a non-success response.
    pub async fn fetch_incidents(&self) -> Result<Vec<Incident>, ConsoleError> {
        self.get_json("/api/events/incidents", true).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        authenticated: bool,
    ) -> Result<T, ConsoleError> {
        let mut request = self.http.get(format!("{}{path}", self.base_url));
        if authenticated && let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConsoleError::UnexpectedStatus {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        tracing::debug!(path, status = status.as_u16(), "collaborator response");
        Ok(response.json::<T>().await?)
    }
}

//! Chat transport strategies
//!
//! The backend exposes the same flow two ways: a synchronous run-and-wait
//! endpoint, and a submit-then-poll job pair. Both are configurations of one
//! transport, selected in settings. Polling is bounded: a base interval with
//! exponential backoff and a fixed attempt budget, after which the call
//! fails with a timeout instead of waiting forever.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;

use crate::api::chat::{ChatBackend, ChatReply, ChatRequest};
use crate::api::ApiError;
use crate::models::ApiEnvelope;
use crate::settings::{ChatSettings, PortalSettings};

// Backoff never stretches a single wait beyond this
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Bounds for the polling transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingConfig {
    pub base_interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(1),
            max_attempts: 30,
        }
    }
}

impl PollingConfig {
    /// Delay before poll `attempt` (zero-based): base doubled per attempt,
    /// capped at [`MAX_POLL_INTERVAL`]
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.base_interval.saturating_mul(factor).min(MAX_POLL_INTERVAL)
    }
}

/// How a chat request reaches the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// One synchronous run-and-wait request
    Direct,
    /// Submit a job, then poll its status with bounded backoff
    Polling(PollingConfig),
}

impl Transport {
    /// Select the transport from settings; unknown names degrade to direct
    #[must_use]
    pub fn from_settings(chat: &ChatSettings) -> Self {
        match chat.transport.as_str() {
            "direct" => Transport::Direct,
            "poll" => Transport::Polling(PollingConfig {
                base_interval: Duration::from_millis(chat.poll_base_interval_ms),
                max_attempts: chat.poll_max_attempts,
            }),
            other => {
                warn!("Unknown chat transport {other:?}, falling back to direct");
                Transport::Direct
            }
        }
    }
}

/// Payload inside a successful chat envelope
#[derive(Deserialize, Debug, Default)]
struct ChatData {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    message_id: Option<String>,
}

/// Status record returned by the job-status endpoint
#[derive(Deserialize, Debug)]
struct JobStatus {
    completed: bool,
    #[serde(default)]
    result: Option<ApiEnvelope<ChatData>>,
}

/// HTTP chat transport against the ax flow endpoints
pub struct HttpChatBackend {
    http: reqwest::Client,
    base_url: String,
    webhook_token: Option<String>,
    transport: Transport,
}

impl HttpChatBackend {
    #[must_use]
    pub fn from_settings(settings: &PortalSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: settings.api.base_url.clone(),
            webhook_token: settings.api.webhook_token.clone(),
            transport: Transport::from_settings(&settings.chat),
        }
    }

    // Webhook deployments authorize with their own token; otherwise the
    // user's session token authorizes the request
    fn bearer<'a>(&'a self, session_token: &'a str) -> &'a str {
        self.webhook_token.as_deref().unwrap_or(session_token)
    }

    fn reply_from_envelope(envelope: ApiEnvelope<ChatData>) -> Result<ChatReply, ApiError> {
        if !envelope.success {
            return Err(ApiError::Server(
                envelope.error_message("API request failed"),
            ));
        }
        let (usage, request_id) = envelope
            .meta
            .map_or((None, None), |meta| (meta.usage, meta.request_id));
        let data = envelope.data.unwrap_or_default();
        Ok(ChatReply {
            response: data.response.unwrap_or_default(),
            conversation_id: data.conversation_id,
            message_id: data.message_id,
            usage,
            request_id,
        })
    }

    async fn run_direct(
        &self,
        session_token: &str,
        request: &ChatRequest,
    ) -> Result<ChatReply, ApiError> {
        let url = format!("{}/jobs/run_wait_result/f/ax/chat", self.base_url);
        debug!("POST {url}");

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.bearer(session_token))
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Server(format!("chat returned HTTP {status}")));
        }

        let envelope: ApiEnvelope<ChatData> = response
            .json()
            .await
            .map_err(|e| ApiError::Server(format!("malformed chat response ({e})")))?;
        Self::reply_from_envelope(envelope)
    }

    async fn run_polling(
        &self,
        session_token: &str,
        request: &ChatRequest,
        config: &PollingConfig,
    ) -> Result<ChatReply, ApiError> {
        let submit_url = format!("{}/jobs/run/f/ax/chat", self.base_url);
        debug!("POST {submit_url}");

        let response = self
            .http
            .post(&submit_url)
            .bearer_auth(self.bearer(session_token))
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Server(format!(
                "job submission returned HTTP {status}"
            )));
        }
        let job_id = response
            .text()
            .await
            .map_err(|e| ApiError::Server(format!("malformed job id ({e})")))?
            .trim()
            .trim_matches('"')
            .to_string();
        if job_id.is_empty() {
            return Err(ApiError::Server("job submission returned no id".to_string()));
        }

        let status_url = format!(
            "{}/jobs_u/completed/get_result_maybe/{job_id}",
            self.base_url
        );
        for attempt in 0..config.max_attempts {
            tokio::time::sleep(config.delay_for(attempt)).await;

            let response = self
                .http
                .get(&status_url)
                .bearer_auth(self.bearer(session_token))
                .send()
                .await
                .map_err(|e| ApiError::Network(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                // The job may still complete; a failed poll is a spent
                // attempt, not a verdict
                warn!(
                    "Job status returned HTTP {status} on attempt {} of {}",
                    attempt + 1,
                    config.max_attempts
                );
                continue;
            }

            let job: JobStatus = response
                .json()
                .await
                .map_err(|e| ApiError::Server(format!("malformed job status ({e})")))?;
            if job.completed {
                let envelope = job.result.ok_or_else(|| {
                    ApiError::Server("completed job carried no result".to_string())
                })?;
                return Self::reply_from_envelope(envelope);
            }
            debug!("Job {job_id} not complete after attempt {}", attempt + 1);
        }

        Err(ApiError::Timeout(format!(
            "job {job_id} did not complete within {} polls",
            config.max_attempts
        )))
    }

    /// Whether the backend answers its health endpoint; never errors
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn run_chat(
        &self,
        session_token: &str,
        request: &ChatRequest,
    ) -> Result<ChatReply, ApiError> {
        match &self.transport {
            Transport::Direct => self.run_direct(session_token, request).await,
            Transport::Polling(config) => self.run_polling(session_token, request, config).await,
        }
    }
}

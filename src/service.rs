//! Remote conversation service interface
//!
//! This module defines the [`ConversationService`] trait, the seam between
//! the client-side controllers and the remote turn-generation engine, plus
//! the HTTP implementation backed by `reqwest`. The remote engine is a
//! black box: the client only knows the wire contract below.

use crate::catalog::Personality;
use crate::config::ServiceConfig;
use crate::error::{AgoraError, Result};
use crate::session::Turn;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A freshly started session: the service-issued identity plus the
/// opening turn, which is returned synchronously with the start call.
#[derive(Debug, Clone, Deserialize)]
pub struct StartedSession {
    /// Opaque token identifying this conversation instance
    pub session_id: String,
    /// The first utterance, produced during the start call
    pub initial_turn: Turn,
}

/// Outcome of one next-turn request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextTurn {
    /// The service produced another utterance
    Turn(Turn),
    /// The conversation is complete; no turn was produced
    Done,
}

/// Interface to the remote conversation service
///
/// Implemented over HTTP by [`HttpConversationService`]; tests drive the
/// controllers with scripted implementations instead.
#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Fetch the ordered list of available personalities
    async fn list_personalities(&self) -> Result<Vec<Personality>>;

    /// Submit a document for analysis into a new personality
    ///
    /// The service is the authority on acceptable formats; rejections
    /// surface as [`AgoraError::Upload`] with the service detail verbatim.
    async fn upload_personality(&self, filename: &str, bytes: Vec<u8>) -> Result<Personality>;

    /// Start a conversation between two named agents on a topic
    async fn start_conversation(
        &self,
        agent_a: &str,
        agent_b: &str,
        topic: &str,
    ) -> Result<StartedSession>;

    /// Request the next turn for a session
    async fn next_turn(&self, session_id: &str) -> Result<NextTurn>;

    /// Ask the service to discard a session
    ///
    /// Callers treat this as fire-and-forget; failures are logged only.
    async fn reset_session(&self, session_id: &str) -> Result<()>;
}

/// Request body for the start endpoint
#[derive(Debug, Serialize)]
struct StartBody<'a> {
    agent_a_name: &'a str,
    agent_b_name: &'a str,
    topic: &'a str,
}

/// Response body for the next-turn endpoint
///
/// The service answers with either a terminal `{"status": "done"}` marker
/// or a turn object. Done is tried first: a turn body never carries a
/// `status` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NextTurnBody {
    Done { status: String },
    Turn(Turn),
}

/// Error body returned by the service on upload rejection
#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    detail: String,
}

/// HTTP implementation of [`ConversationService`]
///
/// Builds each endpoint from a configured base URL, e.g.
/// `http://localhost:8000/api/conversation/start`.
pub struct HttpConversationService {
    client: Client,
    base_url: String,
}

impl HttpConversationService {
    /// Create a new HTTP service client
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client initialization fails.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("agora/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AgoraError::Operation(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized conversation service client: {}", config.base_url);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl ConversationService for HttpConversationService {
    async fn list_personalities(&self) -> Result<Vec<Personality>> {
        let url = self.url("personalities");
        tracing::debug!("Fetching personalities from {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            AgoraError::Operation(format!("Failed to fetch personalities: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgoraError::Operation(format!(
                "Personality list returned {}: {}",
                status, body
            ))
            .into());
        }

        let personalities: Vec<Personality> = response.json().await.map_err(|e| {
            AgoraError::Operation(format!("Failed to parse personality list: {}", e))
        })?;

        tracing::debug!("Fetched {} personalities", personalities.len());
        Ok(personalities)
    }

    async fn upload_personality(&self, filename: &str, bytes: Vec<u8>) -> Result<Personality> {
        let url = self.url("personalities/upload");
        tracing::debug!("Uploading {} ({} bytes) to {}", filename, bytes.len(), url);

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AgoraError::Upload(format!("Upload request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            // Surface the service's detail message verbatim when present
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorDetail>(&body)
                .ok()
                .map(|d| d.detail)
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| format!("Upload failed with status {}", status));
            tracing::warn!("Upload rejected: {}", detail);
            return Err(AgoraError::Upload(detail).into());
        }

        let persona: Personality = response
            .json()
            .await
            .map_err(|e| AgoraError::Upload(format!("Failed to parse upload response: {}", e)))?;

        tracing::info!("Upload created personality: {}", persona.name);
        Ok(persona)
    }

    async fn start_conversation(
        &self,
        agent_a: &str,
        agent_b: &str,
        topic: &str,
    ) -> Result<StartedSession> {
        let url = self.url("conversation/start");
        tracing::debug!("Starting conversation: {} vs {} on {:?}", agent_a, agent_b, topic);

        let response = self
            .client
            .post(&url)
            .json(&StartBody {
                agent_a_name: agent_a,
                agent_b_name: agent_b,
                topic,
            })
            .send()
            .await
            .map_err(|e| AgoraError::Operation(format!("Start request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Start returned {}: {}", status, body);
            return Err(
                AgoraError::Operation(format!("Start returned {}: {}", status, body)).into(),
            );
        }

        let started: StartedSession = response
            .json()
            .await
            .map_err(|e| AgoraError::Operation(format!("Failed to parse start response: {}", e)))?;

        tracing::info!("Started session {}", started.session_id);
        Ok(started)
    }

    async fn next_turn(&self, session_id: &str) -> Result<NextTurn> {
        let url = self.url("conversation/next");
        tracing::debug!("Requesting next turn for session {}", session_id);

        let response = self
            .client
            .post(&url)
            .query(&[("session_id", session_id)])
            .send()
            .await
            .map_err(|e| AgoraError::Operation(format!("Next-turn request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgoraError::Operation(format!(
                "Next turn returned {}: {}",
                status, body
            ))
            .into());
        }

        let body: NextTurnBody = response.json().await.map_err(|e| {
            AgoraError::Operation(format!("Failed to parse next-turn response: {}", e))
        })?;

        match body {
            NextTurnBody::Done { status } => {
                tracing::debug!("Session {} signalled completion ({})", session_id, status);
                Ok(NextTurn::Done)
            }
            NextTurnBody::Turn(turn) => Ok(NextTurn::Turn(turn)),
        }
    }

    async fn reset_session(&self, session_id: &str) -> Result<()> {
        let url = self.url("conversation/reset");
        tracing::debug!("Notifying service to discard session {}", session_id);

        let response = self
            .client
            .post(&url)
            .query(&[("session_id", session_id)])
            .send()
            .await
            .map_err(|e| AgoraError::Operation(format!("Reset request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                AgoraError::Operation(format!("Reset returned {}", status)).into(),
            );
        }
        Ok(())
    }
}

//! Session lifecycle and turn polling
//!
//! This module owns the client-held state machine for one conversation:
//! starting a session, polling successive turns on a timed cadence, and
//! keeping the transcript consistent across stop/reset/new-start actions
//! that can arrive while a request is still in flight.
//!
//! # Race safety
//!
//! The poller receives the session identity by value at spawn time and
//! compares it against the controller's current identity both before
//! sending a request and again after the response arrives. Stopping or
//! resetting never aborts the in-flight request; it only flips the
//! current identity, so a stale response is observed, discarded, and
//! never appended to the transcript.

use crate::error::{AgoraError, Result};
use crate::service::{ConversationService, NextTurn};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One utterance by one agent within a session
///
/// Turns are immutable once received; transcript order is arrival order,
/// which equals conversation order because turns are fetched strictly
/// one at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Name of the agent who produced this utterance
    pub speaker: String,
    /// The utterance text
    pub message: String,
}

impl Turn {
    /// Create a new turn
    pub fn new(speaker: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            message: message.into(),
        }
    }
}

/// Client-observed session status
///
/// The remote service tracks its own lifecycle independently; this is
/// only the local view driving the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No session exists
    #[default]
    None,
    /// A start request is in flight
    Starting,
    /// A session is current and the poller is running
    Active,
    /// A session existed but polling has ended
    Stopped,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Starting => write!(f, "starting"),
            Self::Active => write!(f, "active"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Controller-owned state, serialized behind one mutex
///
/// The lock is never held across an await point, so all mutations
/// interleave only between suspension points.
#[derive(Debug, Default)]
struct SessionState {
    /// Identity the poller guard compares against; cleared on stop
    current: Option<String>,
    /// Last started session, kept for the reset notification
    session_id: Option<String>,
    status: SessionStatus,
    transcript: Vec<Turn>,
    /// True while the poller should keep fetching turns
    active: bool,
    /// Bumped by every start, stop, and reset; a start call re-checks
    /// its own epoch after the request returns and discards the
    /// response if anything intervened
    epoch: u64,
}

/// Orchestrates session start, stop, and reset
///
/// The controller is the single source of truth for which session
/// identity is current and exclusively owns the transcript. It is cheap
/// to clone handles out of via [`SessionController::transcript`] and
/// safe to share behind an `Arc`.
pub struct SessionController {
    service: Arc<dyn ConversationService>,
    state: Arc<Mutex<SessionState>>,
    turn_delay: Duration,
}

impl SessionController {
    /// Create a controller over a conversation service
    ///
    /// `turn_delay` is the pause between an accepted turn and the next
    /// poll request.
    pub fn new(service: Arc<dyn ConversationService>, turn_delay: Duration) -> Self {
        Self {
            service,
            state: Arc::new(Mutex::new(SessionState::default())),
            turn_delay,
        }
    }

    /// Start a new conversation session
    ///
    /// Replaces the transcript with the opening turn, records the
    /// service-issued identity as current, and launches the turn poller
    /// for it. Starting invalidates any previous session identity, so a
    /// poller still in flight for an older session self-terminates. The
    /// same protection covers the start request itself: if a stop,
    /// reset, or newer start intervenes while this call's request is in
    /// flight, the landed response is discarded instead of installed,
    /// and the orphaned remote session is asked to discard itself.
    ///
    /// # Errors
    ///
    /// Returns [`AgoraError::Validation`] without any network call when
    /// the topic is empty, or [`AgoraError::Operation`] when the start
    /// request fails or the session was superseded mid-start; on
    /// failure no partial session is considered current.
    pub async fn start(&self, agent_a: &str, agent_b: &str, topic: &str) -> Result<Turn> {
        if topic.trim().is_empty() {
            return Err(AgoraError::Validation("Please enter a topic.".to_string()).into());
        }

        let epoch = match self.state.lock() {
            Ok(mut state) => {
                // A new start immediately invalidates the previous
                // identity, even while a request for it is still in
                // flight.
                state.current = None;
                state.status = SessionStatus::Starting;
                state.active = false;
                state.epoch += 1;
                state.epoch
            }
            Err(_) => {
                return Err(
                    AgoraError::Operation("Session state is unavailable.".to_string()).into(),
                )
            }
        };

        let started = match self
            .service
            .start_conversation(agent_a, agent_b, topic)
            .await
        {
            Ok(started) => started,
            Err(e) => {
                if let Ok(mut state) = self.state.lock() {
                    if state.epoch == epoch {
                        state.status = SessionStatus::None;
                    }
                }
                tracing::error!("Failed to start session: {}", e);
                return Err(e);
            }
        };

        let session_id = started.session_id.clone();
        let still_current = match self.state.lock() {
            Ok(mut state) => {
                if state.epoch == epoch {
                    state.current = Some(session_id.clone());
                    state.session_id = Some(session_id.clone());
                    state.status = SessionStatus::Active;
                    state.active = true;
                    state.transcript = vec![started.initial_turn.clone()];
                    true
                } else {
                    false
                }
            }
            Err(_) => false,
        };

        if !still_current {
            // The session landed for a request nobody wants anymore.
            // Local state stays as stop/reset/the newer start left it;
            // the remote session is orphaned, so ask the service to
            // discard it.
            tracing::info!("Discarding superseded session {}", session_id);
            let service = Arc::clone(&self.service);
            tokio::spawn(async move {
                if let Err(e) = service.reset_session(&session_id).await {
                    tracing::warn!("Failed to discard session {}: {}", session_id, e);
                }
            });
            return Err(AgoraError::Operation(
                "Session was stopped before it became active.".to_string(),
            )
            .into());
        }

        tracing::info!("Session {} active, launching poller", session_id);
        tokio::spawn(poll_turns(
            Arc::clone(&self.service),
            Arc::clone(&self.state),
            session_id,
            self.turn_delay,
        ));

        Ok(started.initial_turn)
    }

    /// Stop the current session locally
    ///
    /// Invalidates the current identity and marks the session stopped.
    /// The remote service is not notified and the in-flight poll, if
    /// any, is not aborted; it observes the identity mismatch on its
    /// next guard check and terminates without touching the transcript.
    /// A start request still in flight is invalidated the same way and
    /// its response is discarded when it lands.
    pub fn stop(&self) {
        if let Ok(mut state) = self.state.lock() {
            if state.current.take().is_some() {
                tracing::info!("Session stopped locally");
            }
            state.status = SessionStatus::Stopped;
            state.active = false;
            state.epoch += 1;
        }
    }

    /// Stop, clear the transcript, and discard the remote session
    ///
    /// The discard notification runs on a detached task whose outcome is
    /// intentionally ignored: local state has already moved on, so a
    /// notify failure is logged and nothing else.
    pub fn reset(&self) {
        let old_session = match self.state.lock() {
            Ok(mut state) => {
                state.current = None;
                state.active = false;
                state.status = SessionStatus::None;
                state.transcript.clear();
                state.epoch += 1;
                state.session_id.take()
            }
            Err(_) => None,
        };

        if let Some(session_id) = old_session {
            let service = Arc::clone(&self.service);
            tokio::spawn(async move {
                if let Err(e) = service.reset_session(&session_id).await {
                    tracing::warn!("Failed to discard session {}: {}", session_id, e);
                }
            });
        }
    }

    /// Snapshot of the transcript in conversation order
    pub fn transcript(&self) -> Vec<Turn> {
        self.state
            .lock()
            .map(|state| state.transcript.clone())
            .unwrap_or_default()
    }

    /// Current client-observed status
    pub fn status(&self) -> SessionStatus {
        self.state
            .lock()
            .map(|state| state.status)
            .unwrap_or_default()
    }

    /// True while the poller is expected to keep fetching turns
    pub fn is_active(&self) -> bool {
        self.state.lock().map(|state| state.active).unwrap_or(false)
    }

    /// Identity of the last started session, if any
    pub fn session_id(&self) -> Option<String> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.session_id.clone())
    }
}

/// Self-rescheduling poll loop for one fixed session identity
///
/// Runs until the conversation completes, the session goes stale, or a
/// request fails. Failures are not retried: a hung or broken service
/// must not spin the client forever, and the user can start fresh.
async fn poll_turns(
    service: Arc<dyn ConversationService>,
    state: Arc<Mutex<SessionState>>,
    session_id: String,
    delay: Duration,
) {
    loop {
        if !is_current(&state, &session_id) {
            tracing::debug!("Session {} no longer current, poller exiting", session_id);
            return;
        }

        let outcome = service.next_turn(&session_id).await;

        // The identity may have changed while the request was in flight;
        // a stale response must never mutate the transcript.
        match outcome {
            Ok(NextTurn::Turn(turn)) => {
                match state.lock() {
                    Ok(mut state) => {
                        if state.current.as_deref() != Some(session_id.as_str()) {
                            tracing::debug!("Discarding stale turn for session {}", session_id);
                            return;
                        }
                        state.transcript.push(turn);
                    }
                    Err(_) => return,
                }
                tokio::time::sleep(delay).await;
            }
            Ok(NextTurn::Done) => {
                if finish_if_current(&state, &session_id) {
                    tracing::info!("Session {} complete", session_id);
                }
                return;
            }
            Err(e) => {
                let was_current = finish_if_current(&state, &session_id);
                if was_current {
                    tracing::warn!("Polling for session {} failed: {}", session_id, e);
                }
                return;
            }
        }
    }
}

fn is_current(state: &Mutex<SessionState>, session_id: &str) -> bool {
    state
        .lock()
        .map(|state| state.current.as_deref() == Some(session_id))
        .unwrap_or(false)
}

/// Clear the activity flag if `session_id` is still current
///
/// Returns whether the session was current, so the caller can decide
/// whether the termination is worth reporting.
fn finish_if_current(state: &Mutex<SessionState>, session_id: &str) -> bool {
    let Ok(mut state) = state.lock() else {
        return false;
    };
    if state.current.as_deref() == Some(session_id) {
        state.active = false;
        state.status = SessionStatus::Stopped;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::StartedSession;
    use async_trait::async_trait;
    use crate::catalog::Personality;

    /// Service stub that fails the test if any call reaches the network
    struct UnreachableService;

    #[async_trait]
    impl ConversationService for UnreachableService {
        async fn list_personalities(&self) -> Result<Vec<Personality>> {
            panic!("unexpected list_personalities call");
        }
        async fn upload_personality(&self, _: &str, _: Vec<u8>) -> Result<Personality> {
            panic!("unexpected upload_personality call");
        }
        async fn start_conversation(&self, _: &str, _: &str, _: &str) -> Result<StartedSession> {
            panic!("unexpected start_conversation call");
        }
        async fn next_turn(&self, _: &str) -> Result<NextTurn> {
            panic!("unexpected next_turn call");
        }
        async fn reset_session(&self, _: &str) -> Result<()> {
            panic!("unexpected reset_session call");
        }
    }

    #[tokio::test]
    async fn test_start_with_empty_topic_makes_no_network_call() {
        let controller =
            SessionController::new(Arc::new(UnreachableService), Duration::from_millis(1));

        let err = controller.start("Kant", "Nietzsche", "   ").await.unwrap_err();
        let agora_err = err.downcast::<AgoraError>().unwrap();
        assert!(matches!(agora_err, AgoraError::Validation(_)));
        assert_eq!(controller.status(), SessionStatus::None);
        assert!(controller.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_stop_without_session_is_harmless() {
        let controller =
            SessionController::new(Arc::new(UnreachableService), Duration::from_millis(1));
        controller.stop();
        assert_eq!(controller.status(), SessionStatus::Stopped);
        assert!(!controller.is_active());
    }

    #[tokio::test]
    async fn test_reset_without_session_sends_no_notification() {
        let controller =
            SessionController::new(Arc::new(UnreachableService), Duration::from_millis(1));
        controller.reset();
        // UnreachableService would panic in the detached task if notified;
        // yield so such a task would have run.
        tokio::task::yield_now().await;
        assert_eq!(controller.status(), SessionStatus::None);
        assert!(controller.session_id().is_none());
    }

    #[test]
    fn test_session_status_display() {
        assert_eq!(SessionStatus::None.to_string(), "none");
        assert_eq!(SessionStatus::Starting.to_string(), "starting");
        assert_eq!(SessionStatus::Active.to_string(), "active");
        assert_eq!(SessionStatus::Stopped.to_string(), "stopped");
    }

    #[test]
    fn test_turn_construction() {
        let turn = Turn::new("Kant", "Let us examine duty.");
        assert_eq!(turn.speaker, "Kant");
        assert_eq!(turn.message, "Let us examine duty.");
    }
}

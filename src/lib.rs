//! Agora - client-side controller for a dual-agent conversation service
//!
//! This library drives a turn-based, two-party conversation computed by a
//! remote service and displayed incrementally. The core is the session
//! controller: it starts a session, polls successive turns on a timed
//! cadence, and guarantees that responses belonging to an abandoned
//! session can never mutate the transcript.
//!
//! # Architecture
//!
//! - `session`: session lifecycle, the transcript, and the turn poller
//! - `catalog`: personality catalog cache and agent slot selection
//! - `upload`: custom personality upload pipeline
//! - `service`: the `ConversationService` seam and its HTTP implementation
//! - `config`: configuration loading and validation
//! - `error`: error types and result alias
//! - `display`: terminal rendering helpers for the interactive front end
//!
//! # Example
//!
//! ```no_run
//! use agora::{Config, HttpConversationService, SessionController};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     config.validate()?;
//!
//!     let service = Arc::new(HttpConversationService::new(&config.service)?);
//!     let controller = SessionController::new(service, config.session.turn_delay());
//!
//!     let opening = controller.start("Kant", "Nietzsche", "Is free will real?").await?;
//!     println!("{}: {}", opening.speaker, opening.message);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod display;
pub mod error;
pub mod service;
pub mod session;
pub mod upload;

// Re-export commonly used types
pub use catalog::{AgentSelection, AgentSlot, Personality, PersonalityCatalog};
pub use config::Config;
pub use error::{AgoraError, Result};
pub use service::{ConversationService, HttpConversationService, NextTurn, StartedSession};
pub use session::{SessionController, SessionStatus, Turn};
pub use upload::UploadPipeline;

//! Personality catalog and agent slot selection
//!
//! The catalog is a read-only cache of the personas the remote service
//! offers, refreshed on load and after successful uploads. The service
//! is the source of truth: the cache is only ever replaced wholesale,
//! never patched locally.

use crate::error::Result;
use crate::service::ConversationService;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/// A named configuration describing one agent's conversational behavior
///
/// Built-in catalog entries or user-derived from an uploaded document.
/// The name is the unique key used to select an agent and request turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personality {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Personality {
    /// Create a new personality entry
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// First sentence of the description, for compact listings
    pub fn summary(&self) -> &str {
        match self.description.split_once('.') {
            Some((first, _)) => first,
            None => &self.description,
        }
    }
}

/// One of the two agent positions in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentSlot {
    A,
    B,
}

impl fmt::Display for AgentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Read-only cache of available personas
pub struct PersonalityCatalog {
    service: Arc<dyn ConversationService>,
    entries: Mutex<Vec<Personality>>,
}

impl PersonalityCatalog {
    /// Create an empty catalog over a conversation service
    pub fn new(service: Arc<dyn ConversationService>) -> Self {
        Self {
            service,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Initial load of the catalog
    ///
    /// A fetch failure is not on the critical path of anything visible,
    /// so it is logged and the catalog stays empty rather than blocking
    /// the user.
    pub async fn load(&self) {
        match self.service.list_personalities().await {
            Ok(personalities) => {
                tracing::info!("Loaded {} personalities", personalities.len());
                if let Ok(mut entries) = self.entries.lock() {
                    *entries = personalities;
                }
            }
            Err(e) => {
                tracing::warn!("Failed to load personalities: {}", e);
            }
        }
    }

    /// Replace the cache with a fresh fetch from the service
    ///
    /// Unlike [`load`](Self::load), failures propagate: the upload flow
    /// needs to know its post-upload refresh did not happen.
    pub async fn refresh(&self) -> Result<()> {
        let personalities = self.service.list_personalities().await?;
        tracing::debug!("Refreshed catalog: {} personalities", personalities.len());
        if let Ok(mut entries) = self.entries.lock() {
            *entries = personalities;
        }
        Ok(())
    }

    /// Snapshot of the catalog in service order
    pub fn personalities(&self) -> Vec<Personality> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// True when no entries are cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Default slot choices: first entry for A, second (or first) for B
    pub fn default_selection(&self) -> (Option<String>, Option<String>) {
        let Ok(entries) = self.entries.lock() else {
            return (None, None);
        };
        let a = entries.first().map(|p| p.name.clone());
        let b = entries
            .get(1)
            .or_else(|| entries.first())
            .map(|p| p.name.clone());
        (a, b)
    }
}

/// The two currently selected agent names
///
/// Shared between the front end and the upload pipeline, which
/// auto-selects a freshly created persona into the slot that initiated
/// the upload.
#[derive(Default)]
pub struct AgentSelection {
    inner: Mutex<(Option<String>, Option<String>)>,
}

impl AgentSelection {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a personality name into a slot
    pub fn select(&self, slot: AgentSlot, name: impl Into<String>) {
        if let Ok(mut inner) = self.inner.lock() {
            match slot {
                AgentSlot::A => inner.0 = Some(name.into()),
                AgentSlot::B => inner.1 = Some(name.into()),
            }
        }
    }

    /// Currently selected name for a slot
    pub fn get(&self, slot: AgentSlot) -> Option<String> {
        let inner = self.inner.lock().ok()?;
        match slot {
            AgentSlot::A => inner.0.clone(),
            AgentSlot::B => inner.1.clone(),
        }
    }

    /// Fill both slots from the catalog defaults
    pub fn apply_defaults(&self, catalog: &PersonalityCatalog) {
        let (a, b) = catalog.default_selection();
        if let Ok(mut inner) = self.inner.lock() {
            if let Some(a) = a {
                inner.0 = Some(a);
            }
            if let Some(b) = b {
                inner.1 = Some(b);
            }
        }
    }
}

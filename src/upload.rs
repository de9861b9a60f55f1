//! Custom personality upload pipeline
//!
//! Turns a user-supplied document into a new selectable personality:
//! submits the file, waits for the service's synchronous analysis, then
//! re-fetches the whole catalog (never patching it locally) and
//! auto-selects the new persona into the slot that initiated the upload.

use crate::catalog::{AgentSelection, AgentSlot, PersonalityCatalog};
use crate::error::{AgoraError, Result};
use crate::service::ConversationService;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transient status string with a generation counter
///
/// The counter lets the delayed clear task tell whether the status it
/// scheduled against is still the one on display; a newer upload's
/// status must not be wiped by an older timer. Same stale-identity
/// guard as the turn poller, in miniature.
#[derive(Default)]
struct StatusCell {
    generation: u64,
    text: Option<String>,
}

/// Upload flow for custom personalities
pub struct UploadPipeline {
    service: Arc<dyn ConversationService>,
    catalog: Arc<PersonalityCatalog>,
    selection: Arc<AgentSelection>,
    status: Arc<Mutex<StatusCell>>,
    busy: AtomicBool,
    status_display: Duration,
}

impl UploadPipeline {
    /// Create an upload pipeline
    ///
    /// `status_display` is how long the transient success message stays
    /// visible before a detached timer clears it.
    pub fn new(
        service: Arc<dyn ConversationService>,
        catalog: Arc<PersonalityCatalog>,
        selection: Arc<AgentSelection>,
        status_display: Duration,
    ) -> Self {
        Self {
            service,
            catalog,
            selection,
            status: Arc::new(Mutex::new(StatusCell::default())),
            busy: AtomicBool::new(false),
            status_display,
        }
    }

    /// Upload a document and select the resulting persona into `slot`
    ///
    /// Only one upload is in flight at a time; overlapping calls are
    /// rejected locally. Format validation is the service's job: a
    /// rejection surfaces as [`AgoraError::Upload`] with the service's
    /// detail message verbatim and leaves any running conversation
    /// untouched.
    ///
    /// Returns the name of the created personality.
    pub async fn upload(&self, filename: &str, bytes: Vec<u8>, slot: AgentSlot) -> Result<String> {
        if filename.trim().is_empty() || bytes.is_empty() {
            return Err(AgoraError::Validation("No file selected.".to_string()).into());
        }
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(
                AgoraError::Validation("An upload is already in progress.".to_string()).into(),
            );
        }

        let result = self.run_upload(filename, bytes, slot).await;
        self.busy.store(false, Ordering::SeqCst);
        result
    }

    async fn run_upload(&self, filename: &str, bytes: Vec<u8>, slot: AgentSlot) -> Result<String> {
        tracing::info!("Uploading {} for slot {}", filename, slot);
        let persona = self.service.upload_personality(filename, bytes).await?;

        // Full re-fetch keeps the local view matched to the service's
        // source of truth.
        self.catalog.refresh().await?;
        self.selection.select(slot, persona.name.clone());

        self.set_status(format!("Created: {}", persona.name));
        Ok(persona.name)
    }

    /// Set the transient status and arm its delayed clear
    fn set_status(&self, text: String) {
        let generation = match self.status.lock() {
            Ok(mut cell) => {
                cell.generation += 1;
                cell.text = Some(text);
                cell.generation
            }
            Err(_) => return,
        };

        let status = Arc::clone(&self.status);
        let display = self.status_display;
        tokio::spawn(async move {
            tokio::time::sleep(display).await;
            if let Ok(mut cell) = status.lock() {
                if cell.generation == generation {
                    cell.text = None;
                }
            }
        });
    }

    /// Current transient status message, if one is on display
    pub fn status(&self) -> Option<String> {
        self.status.lock().ok().and_then(|cell| cell.text.clone())
    }

    /// True while an upload is in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

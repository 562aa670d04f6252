use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::client::{ApiError, DraftApi};
use crate::models::form::EventDraftPayload;
use crate::services::journal::{DraftJournal, JournalAction};

/// Debounced autosave engine for one draft session.
///
/// Field edits call `schedule_save` with a full snapshot of the form; after
/// the debounce window passes with no newer edit, the latest snapshot is
/// pushed to the marketplace. The first successful push captures the
/// server-assigned event id, which is immutable for the rest of the session;
/// every later push updates that draft instead of creating a new one.
///
/// Saves are serialized: only one request is in flight per session, and a
/// save that fires while another is pending waits, then sends whatever
/// snapshot is newest at that moment. A slow early request can therefore
/// never overwrite a later edit.
pub struct DraftSyncEngine<C> {
    // shared with the spawned debounce tasks
    shared: Arc<SyncShared<C>>,
}

struct SyncShared<C> {
    api: Arc<C>,
    debounce: Duration,
    session_id: String,
    journal: Option<Arc<DraftJournal>>,
    event_id: OnceLock<String>,
    in_flight: AsyncMutex<()>,
    pending: Mutex<Option<EventDraftPayload>>,
    generation: AtomicU64,
    closed: AtomicBool,
    autosave_failed: AtomicBool,
}

impl<C: DraftApi + Send + Sync + 'static> DraftSyncEngine<C> {
    pub fn new(
        api: Arc<C>,
        debounce: Duration,
        session_id: &str,
        journal: Option<Arc<DraftJournal>>,
    ) -> Self {
        Self {
            shared: Arc::new(SyncShared {
                api,
                debounce,
                session_id: session_id.to_string(),
                journal,
                event_id: OnceLock::new(),
                in_flight: AsyncMutex::new(()),
                pending: Mutex::new(None),
                generation: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                autosave_failed: AtomicBool::new(false),
            }),
        }
    }

    /// Pre-assign the draft identifier when a session is hydrated from an
    /// existing event.
    pub fn adopt_event_id(&self, event_id: &str) {
        let _ = self.shared.event_id.set(event_id.to_string());
    }

    pub fn event_id(&self) -> Option<String> {
        self.shared.event_id.get().cloned()
    }

    /// Whether the most recent autosave attempt failed silently.
    pub fn autosave_failed(&self) -> bool {
        self.shared.autosave_failed.load(Ordering::SeqCst)
    }

    /// Record a fresh snapshot and (re)start the debounce timer.
    ///
    /// A second call inside the window supersedes the first: only the newest
    /// generation fires, so rapid edits produce exactly one request carrying
    /// the latest values. Autosave failures are swallowed here and retried
    /// on the next edit; snapshots are complete, so nothing is lost.
    pub fn schedule_save(&self, payload: EventDraftPayload) {
        let shared = &self.shared;
        if shared.closed.load(Ordering::SeqCst) {
            return;
        }
        let generation = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *shared.pending.lock().expect("pending lock poisoned") = Some(payload);

        let shared = Arc::clone(shared);
        tokio::spawn(async move {
            tokio::time::sleep(shared.debounce).await;
            if shared.generation.load(Ordering::SeqCst) != generation {
                // a newer edit restarted the window
                return;
            }
            if shared.closed.load(Ordering::SeqCst) {
                return;
            }
            match shared.flush().await {
                Ok(_) => {
                    shared.autosave_failed.store(false, Ordering::SeqCst);
                    shared.record_journal(JournalAction::Autosave, "debounced autosave");
                }
                Err(err) => {
                    // silent: the next field change schedules a retry
                    warn!(
                        "Autosave failed for session {}: {}",
                        shared.session_id, err
                    );
                    shared.autosave_failed.store(true, Ordering::SeqCst);
                }
            }
        });
    }

    /// Explicit save-draft click: push the snapshot immediately and surface
    /// any failure to the caller. Returns the draft's event id.
    pub async fn save_now(&self, payload: EventDraftPayload) -> Result<String, ApiError> {
        let shared = &self.shared;
        // supersede any pending debounce timer; this call takes over
        shared.generation.fetch_add(1, Ordering::SeqCst);
        let _guard = shared.in_flight.lock().await;
        if shared.closed.load(Ordering::SeqCst) {
            return Err(ApiError::SessionClosed);
        }
        // this snapshot is newer than anything still queued
        *shared.pending.lock().expect("pending lock poisoned") = None;
        let event_id = shared.push(&payload).await?;
        shared.autosave_failed.store(false, Ordering::SeqCst);
        Ok(event_id)
    }

    /// Stop the engine; pending timers become no-ops. Best-effort: a save
    /// already on the wire is not interrupted, the server record simply
    /// reflects it on next load.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
    }
}

impl<C: DraftApi + Send + Sync + 'static> SyncShared<C> {
    // Debounce path: send the newest pending snapshot, if any is left.
    async fn flush(&self) -> Result<(), ApiError> {
        let _guard = self.in_flight.lock().await;
        if self.closed.load(Ordering::SeqCst) {
            return Err(ApiError::SessionClosed);
        }
        let payload = self.pending.lock().expect("pending lock poisoned").take();
        let Some(payload) = payload else {
            // an earlier save already sent the newest snapshot
            return Ok(());
        };
        self.push(&payload).await?;
        Ok(())
    }

    // Create the draft on first save, update it afterwards.
    async fn push(&self, payload: &EventDraftPayload) -> Result<String, ApiError> {
        match self.event_id.get() {
            Some(event_id) => {
                debug!("Saving draft {} for session {}", event_id, self.session_id);
                self.api.update_draft(event_id, payload).await?;
                Ok(event_id.clone())
            }
            None => {
                let created = self.api.create_draft(payload).await?;
                info!(
                    "Session {} assigned draft id {}",
                    self.session_id, created.event_id
                );
                // immutable once assigned
                let _ = self.event_id.set(created.event_id.clone());
                Ok(created.event_id)
            }
        }
    }

    fn record_journal(&self, action: JournalAction, detail: &str) {
        if let (Some(journal), Some(event_id)) = (&self.journal, self.event_id.get()) {
            if let Err(err) = journal.record(&self.session_id, event_id, action, "draft", detail) {
                warn!("Failed to journal autosave: {}", err);
            }
        }
    }
}

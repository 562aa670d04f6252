use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::info;

use crate::client::{ApiError, DraftApi};
use crate::models::event::{EventPayload, EventStatus, StatusBadge, StatusChanged};
use crate::models::form::{EventDraftPayload, EventForm, FormError, SectionId};
use crate::services::accordion::{AccordionState, StepEntry};
use crate::services::journal::DraftJournal;
use crate::services::submission::{self, SubmitError};
use crate::services::sync::DraftSyncEngine;
use crate::services::validation::{self, SectionStatus};

/// Serializable view of a session for the dashboard.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub event_id: Option<String>,
    pub event_status: EventStatus,
    pub status_badge: StatusBadge,
    pub form: EventDraftPayload,
    pub open_sections: Vec<SectionId>,
    pub steps: Vec<StepEntry>,
    pub autosave_failed: bool,
}

/// One dashboard tab's form state.
///
/// This is the synchronous observer wiring of the workflow: a field edit
/// updates the model, revalidates exactly the owning section, refreshes the
/// step indicator inputs and schedules a debounced autosave, in that order,
/// all inside the session lock.
pub struct FormSession<C> {
    pub session_id: String,
    pub form: EventForm,
    pub accordion: AccordionState,
    pub statuses: HashMap<SectionId, SectionStatus>,
    pub event_status: EventStatus,
    api: Arc<C>,
    sync: DraftSyncEngine<C>,
}

impl<C: DraftApi + Send + Sync + 'static> FormSession<C> {
    /// Fresh session with an empty form (new event).
    pub fn new(api: Arc<C>, debounce: Duration, journal: Option<Arc<DraftJournal>>) -> Self {
        let session_id = generate_session_id();
        let form = EventForm::new();
        let statuses = validation::validate_all(&form);
        let sync = DraftSyncEngine::new(Arc::clone(&api), debounce, &session_id, journal);
        Self {
            session_id,
            form,
            accordion: AccordionState::new(),
            statuses,
            event_status: EventStatus::Draft,
            api,
            sync,
        }
    }

    /// Session hydrated from a fetched event (edit mode). The draft id is
    /// adopted up front so every save is an update.
    pub fn hydrated(
        api: Arc<C>,
        debounce: Duration,
        journal: Option<Arc<DraftJournal>>,
        payload: &EventPayload,
    ) -> Self {
        let mut session = Self::new(api, debounce, journal);
        session.form = EventForm::from_payload(&payload.draft);
        session.statuses = validation::validate_all(&session.form);
        session.event_status = payload.status;
        session.sync.adopt_event_id(&payload.id);
        info!(
            "Session {} hydrated from event {} ({})",
            session.session_id, payload.id, payload.status
        );
        session
    }

    /// Apply one field edit and return the owning section's fresh status.
    pub fn apply_field(
        &mut self,
        field: &str,
        ticket_index: Option<usize>,
        value: &str,
    ) -> Result<(SectionId, SectionStatus), FormError> {
        let section = match ticket_index {
            Some(index) => self.form.set_ticket_field(index, field, value)?,
            None => self.form.set_field(field, value)?,
        };
        let status = self.revalidate(section);
        self.sync.schedule_save(self.form.to_payload());
        Ok((section, status))
    }

    /// Append a ticket row; returns its index.
    pub fn add_ticket_row(&mut self) -> usize {
        let index = self.form.add_ticket();
        self.revalidate(SectionId::Tickets);
        self.sync.schedule_save(self.form.to_payload());
        index
    }

    /// Remove a ticket row; the first row is protected.
    pub fn remove_ticket_row(&mut self, index: usize) -> Result<(), FormError> {
        self.form.remove_ticket(index)?;
        self.revalidate(SectionId::Tickets);
        self.sync.schedule_save(self.form.to_payload());
        Ok(())
    }

    /// Toggle an accordion section; pure UI state, the form is untouched.
    pub fn toggle_section(&mut self, section: SectionId) -> bool {
        self.accordion.toggle(section)
    }

    /// Explicit save-draft click.
    pub async fn save_now(&self) -> Result<String, ApiError> {
        self.sync.save_now(self.form.to_payload()).await
    }

    /// Run the submission gate. Failing sections are expanded so the
    /// snapshot the dashboard re-renders shows each of them open with its
    /// reason.
    pub async fn submit(&mut self) -> Result<StatusChanged, SubmitError> {
        let result = submission::submit(self.api.as_ref(), &self.sync, &self.form).await;
        match &result {
            Ok(changed) => {
                self.event_status = changed.status;
            }
            Err(SubmitError::Incomplete(issues)) => {
                for issue in issues {
                    self.accordion.expand(issue.section);
                }
            }
            Err(SubmitError::Api(ApiError::Rejected { sections, .. })) => {
                for section in sections {
                    self.accordion.expand(*section);
                }
            }
            Err(_) => {}
        }
        result
    }

    pub fn event_id(&self) -> Option<String> {
        self.sync.event_id()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            event_id: self.sync.event_id(),
            event_status: self.event_status,
            status_badge: self.event_status.as_badge(),
            form: self.form.to_payload(),
            open_sections: self.accordion.open_sections(),
            steps: self.accordion.step_indicator(&self.statuses),
            autosave_failed: self.sync.autosave_failed(),
        }
    }

    /// Stop the autosave engine; called when the tab goes away.
    pub fn close(&self) {
        self.sync.close();
    }

    fn revalidate(&mut self, section: SectionId) -> SectionStatus {
        let status = validation::validate(section, &self.form);
        self.statuses.insert(section, status.clone());
        status
    }
}

/// All live sessions, one per dashboard tab. Cross-tab consistency is
/// delegated to the server draft record (last-write-wins).
pub struct SessionRegistry<C> {
    sessions: Mutex<HashMap<String, Arc<AsyncMutex<FormSession<C>>>>>,
}

impl<C: DraftApi + Send + Sync + 'static> SessionRegistry<C> {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, session: FormSession<C>) -> (String, Arc<AsyncMutex<FormSession<C>>>) {
        let session_id = session.session_id.clone();
        let handle = Arc::new(AsyncMutex::new(session));
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .insert(session_id.clone(), Arc::clone(&handle));
        info!("Session {} registered", session_id);
        (session_id, handle)
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<AsyncMutex<FormSession<C>>>> {
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .get(session_id)
            .cloned()
    }

    pub fn remove(&self, session_id: &str) -> Option<Arc<AsyncMutex<FormSession<C>>>> {
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .remove(session_id)
    }
}

impl<C: DraftApi + Send + Sync + 'static> Default for SessionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn generate_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

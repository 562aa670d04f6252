use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::client::{ApiError, DraftApi};
use crate::models::event::{
    CancelRequest, DoorSalesOnlyRequest, DraftCreated, EventListItem, EventListResponse,
    EventPayload, EventStatus, PostponeRequest, SoldOutRequest, StatusChanged,
};
use crate::models::form::{EventDraftPayload, SectionId};

// An in-memory marketplace for tests. Expectation-style mocking is covered
// by `MockDraftApi` (generated from the trait); this double instead behaves
// like a tiny server: drafts get ids, statuses transition, and failure modes
// can be injected per call.
pub struct InMemoryMarketplace {
    drafts: Mutex<HashMap<String, EventDraftPayload>>,
    statuses: Mutex<HashMap<String, EventStatus>>,
    next_id: AtomicUsize,
    save_count: AtomicUsize,
    current_saves: AtomicUsize,
    max_concurrent_saves: AtomicUsize,
    save_delay: Mutex<Option<Duration>>,
    fail_next_save: AtomicBool,
    reject_submit_sections: Mutex<Option<Vec<SectionId>>>,
}

impl InMemoryMarketplace {
    pub fn new() -> Self {
        Self {
            drafts: Mutex::new(HashMap::new()),
            statuses: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(0),
            save_count: AtomicUsize::new(0),
            current_saves: AtomicUsize::new(0),
            max_concurrent_saves: AtomicUsize::new(0),
            save_delay: Mutex::new(None),
            fail_next_save: AtomicBool::new(false),
            reject_submit_sections: Mutex::new(None),
        }
    }

    /// Insert an existing event so a session can hydrate from it.
    pub fn seed_event(&self, id: &str, status: EventStatus, draft: EventDraftPayload) {
        self.drafts.lock().unwrap().insert(id.to_string(), draft);
        self.statuses.lock().unwrap().insert(id.to_string(), status);
    }

    /// Total number of completed draft saves (creates plus updates).
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// High-water mark of simultaneously running saves.
    pub fn max_concurrent_saves(&self) -> usize {
        self.max_concurrent_saves.load(Ordering::SeqCst)
    }

    pub fn draft(&self, id: &str) -> Option<EventDraftPayload> {
        self.drafts.lock().unwrap().get(id).cloned()
    }

    pub fn status(&self, id: &str) -> Option<EventStatus> {
        self.statuses.lock().unwrap().get(id).copied()
    }

    /// Make every save pause, so overlap would be observable.
    pub fn set_save_delay(&self, delay: Duration) {
        *self.save_delay.lock().unwrap() = Some(delay);
    }

    /// Make the next save attempt fail.
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }

    /// Make submit-for-review answer with a 400 naming these sections.
    pub fn reject_submit_with(&self, sections: Vec<SectionId>) {
        *self.reject_submit_sections.lock().unwrap() = Some(sections);
    }

    async fn begin_save(&self) -> Result<(), ApiError> {
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(ApiError::BusinessRule("simulated save failure".to_string()));
        }
        let current = self.current_saves.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_saves.fetch_max(current, Ordering::SeqCst);
        let delay = *self.save_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    fn end_save(&self) {
        self.current_saves.fetch_sub(1, Ordering::SeqCst);
        self.save_count.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for InMemoryMarketplace {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DraftApi for InMemoryMarketplace {
    async fn fetch_event(&self, event_id: &str) -> Result<EventPayload, ApiError> {
        let draft = self
            .drafts
            .lock()
            .unwrap()
            .get(event_id)
            .cloned()
            .ok_or(ApiError::Unexpected(StatusCode::NOT_FOUND))?;
        let status = self
            .statuses
            .lock()
            .unwrap()
            .get(event_id)
            .copied()
            .unwrap_or(EventStatus::Draft);
        Ok(EventPayload {
            id: event_id.to_string(),
            status,
            draft,
        })
    }

    async fn create_draft(&self, draft: &EventDraftPayload) -> Result<DraftCreated, ApiError> {
        self.begin_save().await?;
        let id = format!("ev_{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.drafts.lock().unwrap().insert(id.clone(), draft.clone());
        self.statuses
            .lock()
            .unwrap()
            .insert(id.clone(), EventStatus::Draft);
        self.end_save();
        Ok(DraftCreated { event_id: id })
    }

    async fn update_draft(
        &self,
        event_id: &str,
        draft: &EventDraftPayload,
    ) -> Result<(), ApiError> {
        self.begin_save().await?;
        let mut drafts = self.drafts.lock().unwrap();
        if !drafts.contains_key(event_id) {
            self.end_save();
            return Err(ApiError::Unexpected(StatusCode::NOT_FOUND));
        }
        drafts.insert(event_id.to_string(), draft.clone());
        drop(drafts);
        self.end_save();
        Ok(())
    }

    async fn submit_for_review(&self, event_id: &str) -> Result<StatusChanged, ApiError> {
        if let Some(sections) = self.reject_submit_sections.lock().unwrap().take() {
            return Err(ApiError::Rejected {
                sections,
                message: "Campuri respinse la verificare".to_string(),
            });
        }
        self.statuses
            .lock()
            .unwrap()
            .insert(event_id.to_string(), EventStatus::PendingReview);
        Ok(StatusChanged {
            event_id: event_id.to_string(),
            status: EventStatus::PendingReview,
        })
    }

    async fn set_sold_out(
        &self,
        event_id: &str,
        request: &SoldOutRequest,
    ) -> Result<StatusChanged, ApiError> {
        let status = if request.enabled {
            EventStatus::SoldOut
        } else {
            EventStatus::Published
        };
        self.statuses
            .lock()
            .unwrap()
            .insert(event_id.to_string(), status);
        Ok(StatusChanged {
            event_id: event_id.to_string(),
            status,
        })
    }

    async fn set_door_sales_only(
        &self,
        event_id: &str,
        request: &DoorSalesOnlyRequest,
    ) -> Result<StatusChanged, ApiError> {
        let status = if request.enabled {
            EventStatus::DoorSalesOnly
        } else {
            EventStatus::Published
        };
        self.statuses
            .lock()
            .unwrap()
            .insert(event_id.to_string(), status);
        Ok(StatusChanged {
            event_id: event_id.to_string(),
            status,
        })
    }

    async fn postpone_event(
        &self,
        event_id: &str,
        _request: &PostponeRequest,
    ) -> Result<StatusChanged, ApiError> {
        self.statuses
            .lock()
            .unwrap()
            .insert(event_id.to_string(), EventStatus::Postponed);
        Ok(StatusChanged {
            event_id: event_id.to_string(),
            status: EventStatus::Postponed,
        })
    }

    async fn cancel_event(
        &self,
        event_id: &str,
        _request: &CancelRequest,
    ) -> Result<StatusChanged, ApiError> {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.get(event_id) == Some(&EventStatus::Cancelled) {
            return Err(ApiError::BusinessRule(
                "Evenimentul este deja anulat".to_string(),
            ));
        }
        statuses.insert(event_id.to_string(), EventStatus::Cancelled);
        Ok(StatusChanged {
            event_id: event_id.to_string(),
            status: EventStatus::Cancelled,
        })
    }

    async fn list_events(
        &self,
        page: usize,
        page_size: usize,
    ) -> Result<EventListResponse, ApiError> {
        let drafts = self.drafts.lock().unwrap();
        let statuses = self.statuses.lock().unwrap();

        let mut ids: Vec<&String> = drafts.keys().collect();
        ids.sort();

        let events: Vec<EventListItem> = ids
            .iter()
            .skip(page.saturating_sub(1) * page_size)
            .take(page_size)
            .map(|id| {
                let draft = &drafts[*id];
                EventListItem {
                    id: (*id).clone(),
                    name: draft.name.clone(),
                    status: statuses.get(*id).copied().unwrap_or(EventStatus::Draft),
                    start_date: draft.start_date.clone(),
                    venue_city: draft.venue_city.clone(),
                }
            })
            .collect();

        let total_count = drafts.len() as i32;
        let total_page = if drafts.is_empty() {
            0
        } else {
            ((drafts.len() - 1) / page_size + 1) as i32
        };

        Ok(EventListResponse {
            total_count,
            current_page: page as i32,
            total_page,
            events,
        })
    }
}

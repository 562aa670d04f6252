use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use tempfile::{tempdir, TempDir};

use crate::client_mock::InMemoryMarketplace;
use crate::handlers::api::AppState;
use crate::models::event::{EventPayload, EventStatus};
use crate::models::form::EventForm;
use crate::routes::create_router;
use crate::services::journal::DraftJournal;
use crate::services::session::SessionRegistry;

/// A form with every required section filled in, matching the canonical
/// dashboard walkthrough.
pub fn completed_form() -> EventForm {
    let mut form = EventForm::new();
    form.set_field("name", "Concert X").unwrap();
    form.set_field("duration_mode", "single_day").unwrap();
    form.set_field("start_date", "2025-06-15").unwrap();
    form.set_field("start_time", "20:00").unwrap();
    form.set_field("venue_name", "Arena").unwrap();
    form.set_field("venue_city", "Bucuresti").unwrap();
    form.set_ticket_field(0, "name", "Standard").unwrap();
    form.set_ticket_field(0, "price", "50").unwrap();
    form
}

/// The same walkthrough as HTTP field edits: (field, ticket_index, value).
pub fn completed_form_edits() -> Vec<(&'static str, Option<usize>, &'static str)> {
    vec![
        ("name", None, "Concert X"),
        ("duration_mode", None, "single_day"),
        ("start_date", None, "2025-06-15"),
        ("start_time", None, "20:00"),
        ("venue_name", None, "Arena"),
        ("venue_city", None, "Bucuresti"),
        ("name", Some(0), "Standard"),
        ("price", Some(0), "50"),
    ]
}

/// An already-published event for edit-mode and status-action scenarios.
pub fn published_event(id: &str) -> EventPayload {
    EventPayload {
        id: id.to_string(),
        status: EventStatus::Published,
        draft: completed_form().to_payload(),
    }
}

pub struct TestHarness {
    pub server: TestServer,
    pub api: Arc<InMemoryMarketplace>,
    pub state: Arc<AppState<InMemoryMarketplace>>,
    _journal_dir: TempDir,
}

/// Full service wired against the in-memory marketplace, with a short
/// autosave debounce so tests do not wait on real timers.
pub fn test_harness() -> TestHarness {
    test_harness_with_debounce(Duration::from_millis(25))
}

pub fn test_harness_with_debounce(debounce: Duration) -> TestHarness {
    let api = Arc::new(InMemoryMarketplace::new());
    let journal_dir = tempdir().expect("Failed to create temp directory");
    let journal_path = journal_dir.path().join("journal.csv");

    let state = Arc::new(AppState {
        client: Arc::clone(&api),
        registry: SessionRegistry::new(),
        journal: Arc::new(DraftJournal::new(journal_path.to_str().unwrap())),
        autosave_debounce: debounce,
        dashboard_auth_token: None,
    });

    let server = TestServer::new(create_router(Arc::clone(&state), false))
        .expect("Failed to start test server");

    TestHarness {
        server,
        api,
        state,
        _journal_dir: journal_dir,
    }
}

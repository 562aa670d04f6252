use serde_json::{json, Value};
use std::time::Duration;

use crate::models::event::EventStatus;
use crate::tests::common::fixtures::{
    completed_form_edits, published_event, test_harness, test_harness_with_debounce,
};

// The whole organizer walkthrough: open a blank session, fill the form
// section by section, save, submit, then see the status change land.
#[tokio::test]
async fn test_new_event_walkthrough() {
    let harness = test_harness();

    // open a blank session
    let snapshot: Value = harness
        .server
        .post("/sessions")
        .json(&json!({}))
        .await
        .json();
    let session_id = snapshot["session_id"].as_str().unwrap().to_string();
    assert_eq!(snapshot["event_status"], "draft");

    // a premature submit is blocked with every required section listed
    let response = harness
        .server
        .post(&format!("/sessions/{}/submit", session_id))
        .await;
    let blocked: Value = response.json();
    assert_eq!(blocked["accepted"], false);
    assert_eq!(blocked["failing_sections"].as_array().unwrap().len(), 4);

    // fill in the required sections field by field
    for (field, ticket_index, value) in completed_form_edits() {
        let mut edit = json!({"field": field, "value": value});
        if let Some(index) = ticket_index {
            edit["ticket_index"] = json!(index);
        }
        harness
            .server
            .patch(&format!("/sessions/{}/fields", session_id))
            .json(&edit)
            .await
            .assert_status_ok();
    }

    // the step indicator now shows the required sections complete
    let snapshot: Value = harness
        .server
        .get(&format!("/sessions/{}", session_id))
        .await
        .json();
    let steps = snapshot["steps"].as_array().unwrap();
    for step in steps {
        let section = step["section"].as_str().unwrap();
        if ["details", "schedule", "location", "tickets"].contains(&section) {
            assert_eq!(step["state"], "complete", "section {}", section);
        }
    }

    // explicit save assigns the draft id
    let saved: Value = harness
        .server
        .post(&format!("/sessions/{}/save", session_id))
        .await
        .json();
    let event_id = saved["event_id"].as_str().unwrap().to_string();
    assert_eq!(harness.api.draft(&event_id).unwrap().name, "Concert X");

    // submit moves the draft to pending review
    let submitted: Value = harness
        .server
        .post(&format!("/sessions/{}/submit", session_id))
        .await
        .json();
    assert_eq!(submitted["accepted"], true);
    assert_eq!(submitted["status"], "pending_review");
    assert_eq!(
        harness.api.status(&event_id),
        Some(EventStatus::PendingReview)
    );

    // the journal recorded the lifecycle
    let entries = harness.state.journal.entries_for_event(&event_id).unwrap();
    let actions: Vec<&str> = entries.iter().map(|entry| entry.action.as_str()).collect();
    assert!(actions.contains(&"manual_save"));
    assert!(actions.contains(&"submit"));
}

// Editing an existing event reuses its server id for every save instead of
// creating a duplicate draft.
#[tokio::test]
async fn test_edit_mode_updates_the_same_event() {
    let harness = test_harness();
    let seeded = published_event("ev_7");
    harness
        .api
        .seed_event("ev_7", seeded.status, seeded.draft.clone());

    let snapshot: Value = harness
        .server
        .post("/sessions")
        .json(&json!({"event_id": "ev_7"}))
        .await
        .json();
    let session_id = snapshot["session_id"].as_str().unwrap().to_string();
    assert_eq!(snapshot["event_id"], "ev_7");
    assert_eq!(snapshot["form"]["name"], "Concert X");

    harness
        .server
        .patch(&format!("/sessions/{}/fields", session_id))
        .json(&json!({"field": "subtitle", "value": "Editie noua"}))
        .await
        .assert_status_ok();

    // wait out the short test debounce so the autosave lands
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(harness.api.draft("ev_7").unwrap().subtitle, "Editie noua");

    let saved: Value = harness
        .server
        .post(&format!("/sessions/{}/save", session_id))
        .await
        .json();
    assert_eq!(saved["event_id"], "ev_7");
}

// Status actions on a published event: sold out, back on sale, postponed,
// cancelled; a second cancel is refused by the marketplace.
#[tokio::test]
async fn test_status_action_sequence() {
    let harness = test_harness();
    let seeded = published_event("ev_9");
    harness
        .api
        .seed_event("ev_9", seeded.status, seeded.draft.clone());

    let body: Value = harness
        .server
        .post("/events/ev_9/sold-out")
        .json(&json!({"enabled": true}))
        .await
        .json();
    assert_eq!(body["status"], "sold_out");

    let body: Value = harness
        .server
        .post("/events/ev_9/sold-out")
        .json(&json!({"enabled": false}))
        .await
        .json();
    assert_eq!(body["status"], "published");

    let body: Value = harness
        .server
        .post("/events/ev_9/postpone")
        .json(&json!({"new_date": "2025-09-01", "reason": "Sala indisponibila"}))
        .await
        .json();
    assert_eq!(body["status"], "postponed");

    harness
        .server
        .post("/events/ev_9/cancel")
        .json(&json!({"reason": "Artist bolnav"}))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post("/events/ev_9/cancel")
        .json(&json!({"reason": "inca o data"}))
        .await;
    assert_eq!(
        response.status_code(),
        axum::http::StatusCode::CONFLICT
    );

    // every transition is in the journal
    let entries = harness.state.journal.entries_for_event("ev_9").unwrap();
    let statuses: Vec<&str> = entries.iter().map(|entry| entry.status.as_str()).collect();
    assert!(statuses.contains(&"sold_out"));
    assert!(statuses.contains(&"postponed"));
    assert!(statuses.contains(&"cancelled"));
}

// Closing the session stops its autosave engine; a pending edit never lands.
#[tokio::test]
async fn test_closing_a_session_stops_autosaves() {
    // debounce long enough that the close always wins the race
    let harness = test_harness_with_debounce(Duration::from_millis(500));

    let snapshot: Value = harness
        .server
        .post("/sessions")
        .json(&json!({}))
        .await
        .json();
    let session_id = snapshot["session_id"].as_str().unwrap().to_string();

    harness
        .server
        .patch(&format!("/sessions/{}/fields", session_id))
        .json(&json!({"field": "name", "value": "Concert X"}))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .delete(&format!("/sessions/{}", session_id))
        .await;
    assert_eq!(
        response.status_code(),
        axum::http::StatusCode::NO_CONTENT
    );

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(harness.api.save_count(), 0);
}

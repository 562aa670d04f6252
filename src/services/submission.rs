use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::client::{ApiError, DraftApi};
use crate::models::event::StatusChanged;
use crate::models::form::{EventForm, SectionId};
use crate::services::sync::DraftSyncEngine;
use crate::services::validation;

/// Why a section blocks submission. The dashboard expands the section and
/// shows the reason inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionIssue {
    pub section: SectionId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionCheck {
    pub ok: bool,
    pub failing: Vec<SectionIssue>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("the form has incomplete sections")]
    Incomplete(Vec<SectionIssue>),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Re-run every required section validator against the current form.
///
/// An all-empty form fails with every required section listed; optional
/// sections never block.
pub fn evaluate(form: &EventForm) -> SubmissionCheck {
    let mut failing = Vec::new();
    for section in SectionId::REQUIRED {
        let status = validation::validate(section, form);
        if !status.complete {
            failing.push(SectionIssue {
                section,
                reason: missing_reason(section, form),
            });
        }
    }
    SubmissionCheck {
        ok: failing.is_empty(),
        failing,
    }
}

// Per-section message, shown inline in the expanded section.
fn missing_reason(section: SectionId, form: &EventForm) -> String {
    match section {
        SectionId::Details => "Numele evenimentului lipseste".to_string(),
        SectionId::Schedule => {
            let schedule = &form.schedule;
            match schedule.duration_mode.trim() {
                "" => "Alege durata evenimentului".to_string(),
                "range" => "Perioada sau ora de inceput este incompleta".to_string(),
                _ => "Data si ora de inceput lipsesc".to_string(),
            }
        }
        SectionId::Location => "Sala si orasul sunt obligatorii".to_string(),
        SectionId::Tickets => {
            "Fiecare tip de bilet are nevoie de nume si de un pret valid".to_string()
        }
        // optional sections never fail evaluate()
        _ => "Sectiune incompleta".to_string(),
    }
}

/// Gate and perform the submit-for-review call.
///
/// Blocks locally when any required section is incomplete; otherwise the
/// draft is flushed first so the server reviews exactly what the organizer
/// sees, then the submit endpoint moves draft -> pending_review. A server
/// 400 comes back as `ApiError::Rejected` with the failing sections.
pub async fn submit<C: DraftApi + Send + Sync + 'static>(
    api: &C,
    engine: &DraftSyncEngine<C>,
    form: &EventForm,
) -> Result<StatusChanged, SubmitError> {
    let check = evaluate(form);
    if !check.ok {
        warn!(
            "Submission blocked: {} incomplete sections",
            check.failing.len()
        );
        return Err(SubmitError::Incomplete(check.failing));
    }

    let event_id = engine.save_now(form.to_payload()).await?;
    let changed = api.submit_for_review(&event_id).await?;
    info!(
        "Event {} submitted for review, status now {}",
        changed.event_id, changed.status
    );
    Ok(changed)
}

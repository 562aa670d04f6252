use axum::{
    extract::{Json as ExtractJson, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{error, info, warn};

use crate::client::{ApiError, DraftApi};
use crate::models::common::PaginationParams;
use crate::models::event::{
    DoorSalesOnlyRequest, EventListResponse, EventStatus, SoldOutRequest, StatusChanged,
};
use crate::models::form::{FormError, SectionId};
use crate::services::accordion::StepEntry;
use crate::services::journal::{DraftJournal, JournalAction};
use crate::services::session::{FormSession, SessionRegistry, SessionSnapshot};
use crate::services::status::{self, StatusAction};
use crate::services::submission::{SectionIssue, SubmitError};
use crate::services::validation::SectionStatus;

// AppState struct containing shared resources
pub struct AppState<C: DraftApi + Send + Sync + 'static> {
    pub client: Arc<C>,
    pub registry: SessionRegistry<C>,
    pub journal: Arc<DraftJournal>,
    pub autosave_debounce: Duration,
    pub dashboard_auth_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    // present in edit mode, absent for a brand-new event
    #[serde(default)]
    pub event_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FieldUpdateRequest {
    pub field: String,
    #[serde(default)]
    pub ticket_index: Option<usize>,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct FieldUpdateResponse {
    pub section: SectionId,
    pub status: SectionStatus,
    pub steps: Vec<StepEntry>,
}

#[derive(Debug, Serialize)]
pub struct TicketRowResponse {
    pub index: usize,
    pub status: SectionStatus,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub section: SectionId,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub section: SectionId,
    pub open: bool,
    pub open_sections: Vec<SectionId>,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub event_id: String,
    pub saved: bool,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub accepted: bool,
    pub status: Option<EventStatus>,
    pub failing_sections: Vec<SectionIssue>,
    pub message: String,
}

// Optional static bearer token shared with the dashboard frontend
fn authorize<C: DraftApi + Send + Sync + 'static>(
    state: &AppState<C>,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, String)> {
    let Some(expected) = &state.dashboard_auth_token else {
        return Ok(());
    };
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if provided == Some(expected.as_str()) {
        Ok(())
    } else {
        warn!("Rejected request with missing or invalid dashboard token");
        Err((
            StatusCode::UNAUTHORIZED,
            "invalid dashboard token".to_string(),
        ))
    }
}

fn lookup_session<C: DraftApi + Send + Sync + 'static>(
    state: &AppState<C>,
    session_id: &str,
) -> Result<Arc<AsyncMutex<FormSession<C>>>, (StatusCode, String)> {
    state
        .registry
        .get(session_id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("no session {}", session_id)))
}

fn form_error_response(err: FormError) -> (StatusCode, String) {
    (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
}

fn api_error_response(err: &ApiError) -> (StatusCode, String) {
    match err {
        ApiError::SessionExpired => (StatusCode::UNAUTHORIZED, err.to_string()),
        ApiError::Rejected { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
        ApiError::BusinessRule(message) => (StatusCode::CONFLICT, message.clone()),
        ApiError::SessionClosed => (StatusCode::GONE, err.to_string()),
        ApiError::Transport(_) | ApiError::Encode(_) | ApiError::Unexpected(_) => {
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
    }
}

// Create a form session, empty or hydrated from an existing event
pub async fn create_session<C: DraftApi + Send + Sync + 'static>(
    State(state): State<Arc<AppState<C>>>,
    headers: HeaderMap,
    ExtractJson(request): ExtractJson<CreateSessionRequest>,
) -> Result<Json<SessionSnapshot>, (StatusCode, String)> {
    authorize(&state, &headers)?;

    let session = match &request.event_id {
        Some(event_id) => {
            info!("Opening edit session for event {}", event_id);
            let payload = state
                .client
                .fetch_event(event_id)
                .await
                .map_err(|err| api_error_response(&err))?;
            FormSession::hydrated(
                Arc::clone(&state.client),
                state.autosave_debounce,
                Some(Arc::clone(&state.journal)),
                &payload,
            )
        }
        None => {
            info!("Opening session for a new event draft");
            FormSession::new(
                Arc::clone(&state.client),
                state.autosave_debounce,
                Some(Arc::clone(&state.journal)),
            )
        }
    };

    let snapshot = session.snapshot();
    state.registry.insert(session);
    Ok(Json(snapshot))
}

// Current form, accordion and step-indicator state
pub async fn get_session<C: DraftApi + Send + Sync + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SessionSnapshot>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let session = lookup_session(&state, &session_id)?;
    let session = session.lock().await;
    Ok(Json(session.snapshot()))
}

// Apply one field edit; revalidates the owning section and schedules an
// autosave
pub async fn update_field<C: DraftApi + Send + Sync + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    ExtractJson(request): ExtractJson<FieldUpdateRequest>,
) -> Result<Json<FieldUpdateResponse>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let session = lookup_session(&state, &session_id)?;
    let mut session = session.lock().await;

    let (section, status) = session
        .apply_field(&request.field, request.ticket_index, &request.value)
        .map_err(form_error_response)?;

    let steps = session.accordion.step_indicator(&session.statuses);
    Ok(Json(FieldUpdateResponse {
        section,
        status,
        steps,
    }))
}

// Append a ticket row
pub async fn add_ticket<C: DraftApi + Send + Sync + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<TicketRowResponse>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let session = lookup_session(&state, &session_id)?;
    let mut session = session.lock().await;

    let index = session.add_ticket_row();
    let status = session.statuses[&SectionId::Tickets].clone();
    Ok(Json(TicketRowResponse { index, status }))
}

// Remove a ticket row; the first row is protected
pub async fn remove_ticket<C: DraftApi + Send + Sync + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path((session_id, index)): Path<(String, usize)>,
    headers: HeaderMap,
) -> Result<Json<TicketRowResponse>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let session = lookup_session(&state, &session_id)?;
    let mut session = session.lock().await;

    session.remove_ticket_row(index).map_err(form_error_response)?;
    let status = session.statuses[&SectionId::Tickets].clone();
    Ok(Json(TicketRowResponse { index, status }))
}

// Toggle an accordion section
pub async fn toggle_section<C: DraftApi + Send + Sync + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    ExtractJson(request): ExtractJson<ToggleRequest>,
) -> Result<Json<ToggleResponse>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let session = lookup_session(&state, &session_id)?;
    let mut session = session.lock().await;

    let open = session.toggle_section(request.section);
    Ok(Json(ToggleResponse {
        section: request.section,
        open,
        open_sections: session.accordion.open_sections(),
    }))
}

// Explicit save-draft click; failures are surfaced, unlike autosaves
pub async fn save_draft<C: DraftApi + Send + Sync + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SaveResponse>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let session = lookup_session(&state, &session_id)?;
    let session = session.lock().await;

    match session.save_now().await {
        Ok(event_id) => {
            if let Err(err) = state.journal.record(
                &session.session_id,
                &event_id,
                JournalAction::ManualSave,
                session.event_status.as_str(),
                "save draft clicked",
            ) {
                // journaling must never fail the save itself
                error!("Failed to journal manual save: {}", err);
            }
            Ok(Json(SaveResponse {
                event_id,
                saved: true,
            }))
        }
        Err(err) => {
            error!("Explicit draft save failed: {}", err);
            Err(api_error_response(&err))
        }
    }
}

// Submission gate: block with per-section reasons, or submit for review
pub async fn submit_session<C: DraftApi + Send + Sync + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<SubmitResponse>), (StatusCode, String)> {
    authorize(&state, &headers)?;
    let session = lookup_session(&state, &session_id)?;
    let mut session = session.lock().await;

    match session.submit().await {
        Ok(changed) => {
            if let Err(err) = state.journal.record(
                &session.session_id,
                &changed.event_id,
                JournalAction::Submit,
                changed.status.as_str(),
                "submitted for review",
            ) {
                error!("Failed to journal submission: {}", err);
            }
            Ok((
                StatusCode::OK,
                Json(SubmitResponse {
                    accepted: true,
                    status: Some(changed.status),
                    failing_sections: Vec::new(),
                    message: "Event submitted for review".to_string(),
                }),
            ))
        }
        Err(SubmitError::Incomplete(failing)) => {
            info!(
                "Submission blocked for session {}: {} sections incomplete",
                session.session_id,
                failing.len()
            );
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(SubmitResponse {
                    accepted: false,
                    status: None,
                    failing_sections: failing,
                    message: "Some sections need attention".to_string(),
                }),
            ))
        }
        Err(SubmitError::Api(ApiError::Rejected { sections, message })) => {
            info!(
                "Marketplace rejected submission for session {}: {}",
                session.session_id, message
            );
            let failing = sections
                .into_iter()
                .map(|section| SectionIssue {
                    section,
                    reason: message.clone(),
                })
                .collect();
            Ok((
                StatusCode::BAD_REQUEST,
                Json(SubmitResponse {
                    accepted: false,
                    status: None,
                    failing_sections: failing,
                    message,
                }),
            ))
        }
        Err(SubmitError::Api(err)) => {
            error!("Submission failed: {}", err);
            Err(api_error_response(&err))
        }
    }
}

// Close a session and stop its autosave engine
pub async fn close_session<C: DraftApi + Send + Sync + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, (StatusCode, String)> {
    authorize(&state, &headers)?;
    match state.registry.remove(&session_id) {
        Some(session) => {
            session.lock().await.close();
            info!("Session {} closed", session_id);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err((StatusCode::NOT_FOUND, format!("no session {}", session_id))),
    }
}

async fn run_status_action<C: DraftApi + Send + Sync + 'static>(
    state: &AppState<C>,
    event_id: &str,
    action: StatusAction,
    detail: &str,
) -> Result<Json<StatusChanged>, (StatusCode, String)> {
    if let Err(err) = status::validate_action(&action) {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, err.to_string()));
    }

    match status::apply_action(state.client.as_ref(), event_id, &action).await {
        Ok(changed) => {
            if let Err(err) = state.journal.record(
                "-",
                &changed.event_id,
                JournalAction::StatusAction,
                changed.status.as_str(),
                detail,
            ) {
                error!("Failed to journal status action: {}", err);
            }
            Ok(Json(changed))
        }
        Err(err) => {
            error!("Status action on event {} failed: {}", event_id, err);
            Err(api_error_response(&err))
        }
    }
}

// Sold-out toggle
pub async fn mark_sold_out<C: DraftApi + Send + Sync + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
    ExtractJson(request): ExtractJson<SoldOutRequest>,
) -> Result<Json<StatusChanged>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    info!(
        "Received sold-out={} request for event {}",
        request.enabled, event_id
    );
    run_status_action(
        &state,
        &event_id,
        StatusAction::SoldOut {
            enabled: request.enabled,
        },
        "sold-out toggle",
    )
    .await
}

// Door-sales-only toggle
pub async fn mark_door_sales_only<C: DraftApi + Send + Sync + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
    ExtractJson(request): ExtractJson<DoorSalesOnlyRequest>,
) -> Result<Json<StatusChanged>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    info!(
        "Received door-sales-only={} request for event {}",
        request.enabled, event_id
    );
    run_status_action(
        &state,
        &event_id,
        StatusAction::DoorSalesOnly {
            enabled: request.enabled,
        },
        "door-sales-only toggle",
    )
    .await
}

#[derive(Debug, Deserialize)]
pub struct PostponeBody {
    #[serde(default)]
    pub new_date: String,
    #[serde(default)]
    pub reason: String,
}

// Postpone: requires a new date plus a reason
pub async fn postpone_event<C: DraftApi + Send + Sync + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
    ExtractJson(request): ExtractJson<PostponeBody>,
) -> Result<Json<StatusChanged>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    info!("Received postpone request for event {}", event_id);
    run_status_action(
        &state,
        &event_id,
        StatusAction::Postpone {
            new_date: request.new_date,
            reason: request.reason,
        },
        "postponed",
    )
    .await
}

#[derive(Debug, Deserialize)]
pub struct CancelBody {
    #[serde(default)]
    pub reason: String,
}

// Cancel: requires a non-empty reason; terminal on the server side
pub async fn cancel_event<C: DraftApi + Send + Sync + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
    ExtractJson(request): ExtractJson<CancelBody>,
) -> Result<Json<StatusChanged>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    info!("Received cancel request for event {}", event_id);
    run_status_action(
        &state,
        &event_id,
        StatusAction::Cancel {
            reason: request.reason,
        },
        "cancelled",
    )
    .await
}

// Proxied organizer event listing (management)
pub async fn list_events<C: DraftApi + Send + Sync + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<EventListResponse>, (StatusCode, String)> {
    info!(
        "Received request to list events with page={}, page_size={}",
        params.page, params.page_size
    );

    match state.client.list_events(params.page, params.page_size).await {
        Ok(response) => {
            info!("Successfully retrieved {} events", response.events.len());
            Ok(Json(response))
        }
        Err(err) => {
            error!("Failed to retrieve events: {}", err);
            Err(api_error_response(&err))
        }
    }
}

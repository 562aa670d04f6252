use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::client::{ApiError, DraftApi};
use crate::models::common::is_blank;
use crate::models::event::{
    CancelRequest, DoorSalesOnlyRequest, PostponeRequest, SoldOutRequest, StatusChanged,
};

/// A status transition the organizer can request on a published event.
///
/// Postpone and cancel are gated on confirmation input before any request is
/// made; whether the transition itself is legal stays a server decision and
/// comes back as a business-rule rejection when it is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusAction {
    SoldOut { enabled: bool },
    DoorSalesOnly { enabled: bool },
    Postpone { new_date: String, reason: String },
    Cancel { reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusActionError {
    #[error("a cancellation reason is required")]
    MissingReason,
    #[error("a new date is required to postpone")]
    MissingDate,
    #[error("invalid date: {0}")]
    BadDate(String),
}

/// Check the confirmation input for an action.
pub fn validate_action(action: &StatusAction) -> Result<(), StatusActionError> {
    match action {
        StatusAction::SoldOut { .. } | StatusAction::DoorSalesOnly { .. } => Ok(()),
        StatusAction::Postpone { new_date, reason } => {
            if is_blank(new_date) {
                return Err(StatusActionError::MissingDate);
            }
            if NaiveDate::parse_from_str(new_date.trim(), "%Y-%m-%d").is_err() {
                return Err(StatusActionError::BadDate(new_date.trim().to_string()));
            }
            if is_blank(reason) {
                return Err(StatusActionError::MissingReason);
            }
            Ok(())
        }
        StatusAction::Cancel { reason } => {
            if is_blank(reason) {
                return Err(StatusActionError::MissingReason);
            }
            Ok(())
        }
    }
}

/// Dispatch a validated action to the marketplace.
pub async fn apply_action<C: DraftApi>(
    api: &C,
    event_id: &str,
    action: &StatusAction,
) -> Result<StatusChanged, ApiError> {
    let changed = match action {
        StatusAction::SoldOut { enabled } => {
            api.set_sold_out(event_id, &SoldOutRequest { enabled: *enabled })
                .await?
        }
        StatusAction::DoorSalesOnly { enabled } => {
            api.set_door_sales_only(event_id, &DoorSalesOnlyRequest { enabled: *enabled })
                .await?
        }
        StatusAction::Postpone { new_date, reason } => {
            api.postpone_event(
                event_id,
                &PostponeRequest {
                    new_date: new_date.clone(),
                    reason: reason.clone(),
                },
            )
            .await?
        }
        StatusAction::Cancel { reason } => {
            api.cancel_event(
                event_id,
                &CancelRequest {
                    reason: reason.clone(),
                },
            )
            .await?
        }
    };
    info!(
        "Event {} status changed to {}",
        changed.event_id, changed.status
    );
    Ok(changed)
}

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::form::EventDraftPayload;

/// Lifecycle status of an event, as reported by the marketplace API.
///
/// This layer consumes the state machine, it does not own it: transitions are
/// triggered through the status-action endpoints and enforced server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Draft,
    PendingReview,
    Published,
    SoldOut,
    DoorSalesOnly,
    Postponed,
    Cancelled,
    Ended,
    // Statuses introduced server-side after this build still render, just
    // with the neutral badge.
    Unknown,
}

// Unknown wire values fall back explicitly instead of failing the decode.
impl<'de> serde::Deserialize<'de> for EventStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(EventStatus::from_wire(&value))
    }
}

impl EventStatus {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "draft" => EventStatus::Draft,
            "pending_review" => EventStatus::PendingReview,
            "published" => EventStatus::Published,
            "sold_out" => EventStatus::SoldOut,
            "door_sales_only" => EventStatus::DoorSalesOnly,
            "postponed" => EventStatus::Postponed,
            "cancelled" => EventStatus::Cancelled,
            "ended" => EventStatus::Ended,
            _ => EventStatus::Unknown,
        }
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::PendingReview => "pending_review",
            EventStatus::Published => "published",
            EventStatus::SoldOut => "sold_out",
            EventStatus::DoorSalesOnly => "door_sales_only",
            EventStatus::Postponed => "postponed",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Ended => "ended",
            EventStatus::Unknown => "unknown",
        }
    }

    /// Badge label shown in the dashboard event list.
    pub fn label(&self) -> &'static str {
        match self {
            EventStatus::Draft => "Ciorna",
            EventStatus::PendingReview => "In asteptarea aprobarii",
            EventStatus::Published => "Publicat",
            EventStatus::SoldOut => "Sold out",
            EventStatus::DoorSalesOnly => "Bilete doar la intrare",
            EventStatus::Postponed => "Amanat",
            EventStatus::Cancelled => "Anulat",
            EventStatus::Ended => "Incheiat",
            EventStatus::Unknown => "Necunoscut",
        }
    }

    /// CSS badge class for the status pill.
    pub fn badge_class(&self) -> &'static str {
        match self {
            EventStatus::Draft => "badge-neutral",
            EventStatus::PendingReview => "badge-warning",
            EventStatus::Published => "badge-success",
            EventStatus::SoldOut => "badge-danger",
            EventStatus::DoorSalesOnly => "badge-info",
            EventStatus::Postponed => "badge-warning",
            EventStatus::Cancelled => "badge-danger",
            EventStatus::Ended => "badge-neutral",
            EventStatus::Unknown => "badge-neutral",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Cancelled | EventStatus::Ended)
    }

    /// The status pill as the dashboard renders it.
    pub fn as_badge(&self) -> StatusBadge {
        StatusBadge {
            status: *self,
            label: self.label(),
            badge_class: self.badge_class(),
            terminal: self.is_terminal(),
        }
    }
}

/// Rendered form of a status: pill label, badge class and whether further
/// status actions still make sense. `terminal` only drives which buttons the
/// dashboard shows; the transition itself stays a server decision.
#[derive(Debug, Clone, Serialize)]
pub struct StatusBadge {
    pub status: EventStatus,
    pub label: &'static str,
    pub badge_class: &'static str,
    pub terminal: bool,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full event record returned by GET /events/{id}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    pub id: String,
    pub status: EventStatus,
    #[serde(flatten)]
    pub draft: EventDraftPayload,
}

/// Response of POST /events: the server-assigned draft identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftCreated {
    pub event_id: String,
}

/// Response of the submit and status-action endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChanged {
    pub event_id: String,
    pub status: EventStatus,
}

// Status-action payloads. Postpone and cancel carry the confirmation input
// the dashboard collects before the transition is requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoldOutRequest {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorSalesOnlyRequest {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostponeRequest {
    pub new_date: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

/// One row of the organizer event listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventListItem {
    pub id: String,
    pub name: String,
    pub status: EventStatus,
    pub start_date: String,
    pub venue_city: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventListResponse {
    pub total_count: i32,
    pub current_page: i32,
    pub total_page: i32,
    pub events: Vec<EventListItem>,
}

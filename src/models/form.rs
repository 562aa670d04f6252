use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One accordion section of the event form.
///
/// Sections are independently togglable and carry no ordering constraint;
/// `REQUIRED` lists the ones the submission gate checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    Details,
    Schedule,
    Location,
    Content,
    Media,
    Tickets,
    SalesSettings,
}

impl SectionId {
    pub const ALL: [SectionId; 7] = [
        SectionId::Details,
        SectionId::Schedule,
        SectionId::Location,
        SectionId::Content,
        SectionId::Media,
        SectionId::Tickets,
        SectionId::SalesSettings,
    ];

    pub const REQUIRED: [SectionId; 4] = [
        SectionId::Details,
        SectionId::Schedule,
        SectionId::Location,
        SectionId::Tickets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::Details => "details",
            SectionId::Schedule => "schedule",
            SectionId::Location => "location",
            SectionId::Content => "content",
            SectionId::Media => "media",
            SectionId::Tickets => "tickets",
            SectionId::SalesSettings => "sales_settings",
        }
    }

    pub fn is_required(&self) -> bool {
        SectionId::REQUIRED.contains(self)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Errors raised by form mutations. These stay local to the session layer and
// are mapped to specific 422 responses by the handlers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("unknown form field: {0}")]
    UnknownField(String),
    #[error("unknown ticket field: {0}")]
    UnknownTicketField(String),
    #[error("no ticket type at index {0}")]
    TicketIndex(usize),
    #[error("the first ticket type cannot be removed")]
    ProtectedTicketRow,
}

/// One row of the dynamic ticket-type list.
///
/// All values are kept exactly as the form delivered them; parsing happens in
/// validation so an empty or malformed price is representable in a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketTypeEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub min_per_order: String,
    #[serde(default)]
    pub max_per_order: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailsFields {
    pub name: String,
    pub subtitle: String,
    pub category: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleFields {
    // "single_day" or "range"; anything else counts as not chosen yet
    pub duration_mode: String,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationFields {
    pub venue_name: String,
    pub venue_address: String,
    pub venue_city: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFields {
    pub description: String,
    pub rules: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaFields {
    pub poster_url: String,
    pub video_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesFields {
    // "included" or "added_on_top"; affects net-revenue display only,
    // computed server-side
    pub commission_mode: String,
    pub sale_start_date: String,
    pub sale_end_date: String,
}

/// The form model for one event draft.
///
/// Purely a container: no validation happens here. Fields are grouped by
/// accordion section and every mutation reports the owning section so the
/// caller can revalidate just that section and schedule an autosave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventForm {
    pub details: DetailsFields,
    pub schedule: ScheduleFields,
    pub location: LocationFields,
    pub content: ContentFields,
    pub media: MediaFields,
    pub tickets: Vec<TicketTypeEntry>,
    pub sales: SalesFields,
}

impl Default for EventForm {
    fn default() -> Self {
        Self {
            details: DetailsFields::default(),
            schedule: ScheduleFields::default(),
            location: LocationFields::default(),
            content: ContentFields::default(),
            media: MediaFields::default(),
            // the ticket list always has at least one row
            tickets: vec![TicketTypeEntry::default()],
            sales: SalesFields::default(),
        }
    }
}

impl EventForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar field by its wire name and return the owning section.
    ///
    /// Unknown names are an explicit error rather than a silent no-op, so a
    /// renamed dashboard field shows up as a 422 instead of a dropped edit.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<SectionId, FormError> {
        let value = value.to_string();
        let section = match field {
            "name" => {
                self.details.name = value;
                SectionId::Details
            }
            "subtitle" => {
                self.details.subtitle = value;
                SectionId::Details
            }
            "category" => {
                self.details.category = value;
                SectionId::Details
            }
            "duration_mode" => {
                self.schedule.duration_mode = value;
                SectionId::Schedule
            }
            "start_date" => {
                self.schedule.start_date = value;
                SectionId::Schedule
            }
            "start_time" => {
                self.schedule.start_time = value;
                SectionId::Schedule
            }
            "end_date" => {
                self.schedule.end_date = value;
                SectionId::Schedule
            }
            "end_time" => {
                self.schedule.end_time = value;
                SectionId::Schedule
            }
            "venue_name" => {
                self.location.venue_name = value;
                SectionId::Location
            }
            "venue_address" => {
                self.location.venue_address = value;
                SectionId::Location
            }
            "venue_city" => {
                self.location.venue_city = value;
                SectionId::Location
            }
            "description" => {
                self.content.description = value;
                SectionId::Content
            }
            "rules" => {
                self.content.rules = value;
                SectionId::Content
            }
            "poster_url" => {
                self.media.poster_url = value;
                SectionId::Media
            }
            "video_url" => {
                self.media.video_url = value;
                SectionId::Media
            }
            "commission_mode" => {
                self.sales.commission_mode = value;
                SectionId::SalesSettings
            }
            "sale_start_date" => {
                self.sales.sale_start_date = value;
                SectionId::SalesSettings
            }
            "sale_end_date" => {
                self.sales.sale_end_date = value;
                SectionId::SalesSettings
            }
            _ => return Err(FormError::UnknownField(field.to_string())),
        };
        Ok(section)
    }

    /// Set one field of a ticket row by index.
    pub fn set_ticket_field(
        &mut self,
        index: usize,
        field: &str,
        value: &str,
    ) -> Result<SectionId, FormError> {
        let entry = self
            .tickets
            .get_mut(index)
            .ok_or(FormError::TicketIndex(index))?;
        let value = value.to_string();
        match field {
            "name" => entry.name = value,
            "price" => entry.price = value,
            "quantity" => entry.quantity = value,
            "description" => entry.description = value,
            "min_per_order" => entry.min_per_order = value,
            "max_per_order" => entry.max_per_order = value,
            _ => return Err(FormError::UnknownTicketField(field.to_string())),
        }
        Ok(SectionId::Tickets)
    }

    /// Borrow the fields belonging to one section.
    pub fn section_view(&self, section: SectionId) -> SectionView<'_> {
        match section {
            SectionId::Details => SectionView::Details(&self.details),
            SectionId::Schedule => SectionView::Schedule(&self.schedule),
            SectionId::Location => SectionView::Location(&self.location),
            SectionId::Content => SectionView::Content(&self.content),
            SectionId::Media => SectionView::Media(&self.media),
            SectionId::Tickets => SectionView::Tickets(&self.tickets),
            SectionId::SalesSettings => SectionView::SalesSettings(&self.sales),
        }
    }

    /// Append an empty ticket row and return its index.
    pub fn add_ticket(&mut self) -> usize {
        self.tickets.push(TicketTypeEntry::default());
        self.tickets.len() - 1
    }

    /// Remove a ticket row. The first row is protected.
    pub fn remove_ticket(&mut self, index: usize) -> Result<(), FormError> {
        if index == 0 {
            return Err(FormError::ProtectedTicketRow);
        }
        if index >= self.tickets.len() {
            return Err(FormError::TicketIndex(index));
        }
        self.tickets.remove(index);
        Ok(())
    }

    /// Serialize into the request shape the marketplace draft endpoints
    /// expect. Field-order independent: any sequence of `set_field` calls
    /// ending in the same model produces the same payload.
    pub fn to_payload(&self) -> EventDraftPayload {
        EventDraftPayload {
            name: self.details.name.clone(),
            subtitle: self.details.subtitle.clone(),
            category: self.details.category.clone(),
            duration_mode: self.schedule.duration_mode.clone(),
            start_date: self.schedule.start_date.clone(),
            start_time: self.schedule.start_time.clone(),
            end_date: self.schedule.end_date.clone(),
            end_time: self.schedule.end_time.clone(),
            venue_name: self.location.venue_name.clone(),
            venue_address: self.location.venue_address.clone(),
            venue_city: self.location.venue_city.clone(),
            description: self.content.description.clone(),
            rules: self.content.rules.clone(),
            poster_url: self.media.poster_url.clone(),
            video_url: self.media.video_url.clone(),
            commission_mode: self.sales.commission_mode.clone(),
            sale_start_date: self.sales.sale_start_date.clone(),
            sale_end_date: self.sales.sale_end_date.clone(),
            ticket_types: self.tickets.clone(),
        }
    }

    /// Hydrate a form from a fetched draft or published event (edit mode).
    pub fn from_payload(payload: &EventDraftPayload) -> Self {
        let mut tickets = payload.ticket_types.clone();
        if tickets.is_empty() {
            tickets.push(TicketTypeEntry::default());
        }
        Self {
            details: DetailsFields {
                name: payload.name.clone(),
                subtitle: payload.subtitle.clone(),
                category: payload.category.clone(),
            },
            schedule: ScheduleFields {
                duration_mode: payload.duration_mode.clone(),
                start_date: payload.start_date.clone(),
                start_time: payload.start_time.clone(),
                end_date: payload.end_date.clone(),
                end_time: payload.end_time.clone(),
            },
            location: LocationFields {
                venue_name: payload.venue_name.clone(),
                venue_address: payload.venue_address.clone(),
                venue_city: payload.venue_city.clone(),
            },
            content: ContentFields {
                description: payload.description.clone(),
                rules: payload.rules.clone(),
            },
            media: MediaFields {
                poster_url: payload.poster_url.clone(),
                video_url: payload.video_url.clone(),
            },
            tickets,
            sales: SalesFields {
                commission_mode: payload.commission_mode.clone(),
                sale_start_date: payload.sale_start_date.clone(),
                sale_end_date: payload.sale_end_date.clone(),
            },
        }
    }
}

/// One section's fields, borrowed from the form.
#[derive(Debug, Clone, Copy)]
pub enum SectionView<'a> {
    Details(&'a DetailsFields),
    Schedule(&'a ScheduleFields),
    Location(&'a LocationFields),
    Content(&'a ContentFields),
    Media(&'a MediaFields),
    Tickets(&'a [TicketTypeEntry]),
    SalesSettings(&'a SalesFields),
}

/// Wire shape of a draft as sent to POST /events and PATCH /events/{id}.
///
/// Drafts are partial by nature, so every scalar stays a raw string; the
/// server parses on submit, this layer parses in validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraftPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub duration_mode: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub venue_name: String,
    #[serde(default)]
    pub venue_address: String,
    #[serde(default)]
    pub venue_city: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rules: String,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub commission_mode: String,
    #[serde(default)]
    pub sale_start_date: String,
    #[serde(default)]
    pub sale_end_date: String,
    #[serde(default)]
    pub ticket_types: Vec<TicketTypeEntry>,
}

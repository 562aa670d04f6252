use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::common::is_blank;
use crate::models::form::{
    ContentFields, DetailsFields, EventForm, LocationFields, MediaFields, SalesFields,
    ScheduleFields, SectionId, SectionView, TicketTypeEntry,
};

/// Derived state of one accordion section. Never persisted; recomputed from
/// the form on every relevant change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionStatus {
    pub complete: bool,
    pub summary: String,
    pub warnings: Vec<String>,
}

impl SectionStatus {
    fn complete(summary: String) -> Self {
        Self {
            complete: true,
            summary,
            warnings: Vec::new(),
        }
    }

    fn incomplete(summary: String) -> Self {
        Self {
            complete: false,
            summary,
            warnings: Vec::new(),
        }
    }
}

/// Validate one section. Pure and deterministic: same form, same result.
pub fn validate(section: SectionId, form: &EventForm) -> SectionStatus {
    match form.section_view(section) {
        SectionView::Details(details) => details_status(details),
        SectionView::Schedule(schedule) => schedule_status(schedule),
        SectionView::Location(location) => location_status(location),
        SectionView::Content(content) => content_status(content),
        SectionView::Media(media) => media_status(media),
        SectionView::Tickets(tickets) => tickets_status(tickets),
        SectionView::SalesSettings(sales) => sales_status(sales),
    }
}

/// Validate every section; used on session creation and by the submission
/// gate.
pub fn validate_all(form: &EventForm) -> HashMap<SectionId, SectionStatus> {
    SectionId::ALL
        .iter()
        .map(|section| (*section, validate(*section, form)))
        .collect()
}

fn details_status(details: &DetailsFields) -> SectionStatus {
    if is_blank(&details.name) {
        SectionStatus::incomplete("Fara titlu".to_string())
    } else {
        SectionStatus::complete(details.name.trim().to_string())
    }
}

fn schedule_status(schedule: &ScheduleFields) -> SectionStatus {
    let start_date = parse_date(&schedule.start_date);
    let start_time = parse_time(&schedule.start_time);

    match schedule.duration_mode.trim() {
        "single_day" => match (start_date, start_time) {
            (Some(date), Some(time)) => SectionStatus::complete(format!(
                "{}, {}",
                format_date(date),
                time.format("%H:%M")
            )),
            _ => SectionStatus::incomplete("Data si ora nesetate".to_string()),
        },
        "range" => {
            let end_date = parse_date(&schedule.end_date);
            match (start_date, start_time, end_date) {
                (Some(start), Some(time), Some(end)) if end >= start => {
                    let days = (end - start).num_days() + 1;
                    let summary = if days == 1 {
                        format!("1 zi, {}", time.format("%H:%M"))
                    } else {
                        format!("{} zile, {}", days, time.format("%H:%M"))
                    };
                    SectionStatus::complete(summary)
                }
                (Some(_), Some(_), Some(_)) => {
                    SectionStatus::incomplete("Data de sfarsit este inainte de inceput".to_string())
                }
                _ => SectionStatus::incomplete("Perioada nesetata".to_string()),
            }
        }
        _ => SectionStatus::incomplete("Durata nealeasa".to_string()),
    }
}

fn location_status(location: &LocationFields) -> SectionStatus {
    if is_blank(&location.venue_name) || is_blank(&location.venue_city) {
        SectionStatus::incomplete("Locatie nesetata".to_string())
    } else {
        SectionStatus::complete(format!(
            "{}, {}",
            location.venue_name.trim(),
            location.venue_city.trim()
        ))
    }
}

// Content is optional for submission; the summary still reflects it on the
// step indicator.
fn content_status(content: &ContentFields) -> SectionStatus {
    if is_blank(&content.description) {
        SectionStatus::complete("Fara descriere".to_string())
    } else {
        SectionStatus::complete(format!(
            "Descriere ({} caractere)",
            content.description.trim().chars().count()
        ))
    }
}

fn media_status(media: &MediaFields) -> SectionStatus {
    if is_blank(&media.poster_url) {
        SectionStatus::complete("Fara afis".to_string())
    } else {
        SectionStatus::complete("Afis incarcat".to_string())
    }
}

fn tickets_status(tickets: &[TicketTypeEntry]) -> SectionStatus {
    let mut complete = !tickets.is_empty();
    let mut warnings = Vec::new();
    let mut named = 0usize;
    let mut min_price: Option<f64> = None;

    for (index, entry) in tickets.iter().enumerate() {
        let has_name = !is_blank(&entry.name);
        if has_name {
            named += 1;
        }
        let price = parse_price(&entry.price);
        if !has_name || price.is_none() {
            complete = false;
        }
        if let Some(price) = price {
            min_price = Some(min_price.map_or(price, |current| current.min(price)));
        }

        // inverted per-order bounds warn only, completion is unaffected
        if let (Some(min), Some(max)) = (
            parse_count(&entry.min_per_order),
            parse_count(&entry.max_per_order),
        ) {
            if max < min {
                let label = if has_name {
                    entry.name.trim().to_string()
                } else {
                    format!("bilet {}", index + 1)
                };
                warnings.push(format!("{}: maximul pe comanda este sub minim", label));
            }
        }
    }

    let summary = match (named, min_price) {
        (0, _) => "Niciun tip de bilet".to_string(),
        (1, Some(price)) => format!("1 tip de bilet, de la {} lei", format_price(price)),
        (1, None) => "1 tip de bilet".to_string(),
        (n, Some(price)) => format!("{} tipuri bilete, de la {} lei", n, format_price(price)),
        (n, None) => format!("{} tipuri bilete", n),
    };

    SectionStatus {
        complete,
        summary,
        warnings,
    }
}

fn sales_status(sales: &SalesFields) -> SectionStatus {
    let summary = match sales.commission_mode.trim() {
        "added_on_top" => "Comision adaugat la pret".to_string(),
        _ => "Comision inclus in pret".to_string(),
    };
    SectionStatus::complete(summary)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// A price is valid when it parses and is not negative. Empty input is
/// simply missing, not an error.
pub fn parse_price(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Some(price),
        _ => None,
    }
}

fn parse_count(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<u32>().ok()
}

fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{}", price as i64)
    } else {
        format!("{:.2}", price)
    }
}

fn format_date(date: NaiveDate) -> String {
    use chrono::Datelike;
    format!(
        "{} {} {}",
        date.day(),
        month_short(date.month()),
        date.year()
    )
}

fn month_short(month: u32) -> &'static str {
    match month {
        1 => "ian.",
        2 => "feb.",
        3 => "mar.",
        4 => "apr.",
        5 => "mai",
        6 => "iun.",
        7 => "iul.",
        8 => "aug.",
        9 => "sept.",
        10 => "oct.",
        11 => "nov.",
        12 => "dec.",
        _ => "",
    }
}

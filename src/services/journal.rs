use chrono::Utc;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

// What happened to a draft; stored as a plain string in the CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalAction {
    Autosave,
    ManualSave,
    Submit,
    StatusAction,
}

impl JournalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalAction::Autosave => "autosave",
            JournalAction::ManualSave => "manual_save",
            JournalAction::Submit => "submit",
            JournalAction::StatusAction => "status_action",
        }
    }
}

// One line of the journal CSV
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct JournalRecord {
    pub session_id: String,
    pub event_id: String,
    pub action: String,
    pub status: String,
    pub detail: String,
    pub recorded_at: String, // ISO format
}

/// CSV-backed journal of draft lifecycle activity.
///
/// Operational audit trail for the dashboard service: every autosave,
/// explicit save, submission and status action lands here with a UTC
/// timestamp, so a support request about a lost draft can be answered from
/// the file.
pub struct DraftJournal {
    csv_path: String,
    file_mutex: Mutex<()>,
}

impl DraftJournal {
    pub fn new(csv_path: &str) -> Self {
        // Create the CSV file if it doesn't exist with proper headers
        if !Path::new(csv_path).exists() {
            info!("Creating new draft journal at {}", csv_path);

            let file = File::create(csv_path).unwrap_or_else(|e| {
                error!("Failed to create journal file: {}", e);
                panic!("Failed to create journal file: {}", e)
            });

            let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

            if let Err(e) = writer.write_record([
                "session_id",
                "event_id",
                "action",
                "status",
                "detail",
                "recorded_at",
            ]) {
                error!("Failed to write journal headers: {}", e);
                panic!("Failed to write journal headers: {}", e);
            }

            if let Err(e) = writer.flush() {
                error!("Failed to flush journal headers: {}", e);
                panic!("Failed to flush journal headers: {}", e);
            }
        }

        Self {
            csv_path: csv_path.to_string(),
            file_mutex: Mutex::new(()),
        }
    }

    /// Append one journal line.
    ///
    /// A line identical to the newest line for the same session (same
    /// action, status and detail) is skipped, so autosave retries do not
    /// flood the file.
    pub fn record(
        &self,
        session_id: &str,
        event_id: &str,
        action: JournalAction,
        status: &str,
        detail: &str,
    ) -> Result<(), String> {
        let record = JournalRecord {
            session_id: session_id.to_string(),
            event_id: event_id.to_string(),
            action: action.as_str().to_string(),
            status: status.to_string(),
            detail: detail.to_string(),
            recorded_at: Utc::now().to_rfc3339(),
        };

        if let Some(last) = self.last_record_for_session(session_id)? {
            if last.action == record.action
                && last.status == record.status
                && last.detail == record.detail
            {
                return Ok(());
            }
        }

        let _lock = self
            .file_mutex
            .lock()
            .map_err(|e| format!("Failed to acquire journal mutex: {}", e))?;

        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| format!("Failed to open journal file: {}", e))?;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        writer
            .serialize(&record)
            .map_err(|e| format!("Failed to serialize journal record: {}", e))?;

        writer
            .flush()
            .map_err(|e| format!("Failed to flush journal writer: {}", e))?;

        Ok(())
    }

    /// All journal lines for one event, oldest first.
    pub fn entries_for_event(&self, event_id: &str) -> Result<Vec<JournalRecord>, String> {
        let records = self.read_all()?;
        Ok(records
            .into_iter()
            .filter(|record| record.event_id == event_id)
            .collect())
    }

    fn last_record_for_session(
        &self,
        session_id: &str,
    ) -> Result<Option<JournalRecord>, String> {
        let records = self.read_all()?;
        Ok(records
            .into_iter()
            .rev()
            .find(|record| record.session_id == session_id))
    }

    fn read_all(&self) -> Result<Vec<JournalRecord>, String> {
        let _lock = self
            .file_mutex
            .lock()
            .map_err(|e| format!("Failed to acquire journal mutex: {}", e))?;

        if !Path::new(&self.csv_path).exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.csv_path)
            .map_err(|e| format!("Failed to open journal file: {}", e))?;

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let mut records = Vec::new();

        for result in reader.deserialize() {
            let record: JournalRecord =
                result.map_err(|e| format!("Failed to read journal record: {}", e))?;
            records.push(record);
        }

        Ok(records)
    }
}

// Create a singleton journal
pub fn create_draft_journal() -> Arc<DraftJournal> {
    // Default path with environment variable override
    let default_path = "/app/data/draft_journal.csv";
    let csv_path =
        std::env::var("DRAFT_JOURNAL_PATH").unwrap_or_else(|_| default_path.to_string());

    // Create the data directory if it doesn't exist and we're using the default path
    if csv_path == default_path {
        let dir = std::path::Path::new(default_path).parent().unwrap();
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::error!("Failed to create data directory: {}", e);
            panic!("Failed to create data directory: {}", e);
        }
    }

    Arc::new(DraftJournal::new(&csv_path))
}

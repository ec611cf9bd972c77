//! Export session state definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of an export session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportState {
    /// No export session is active
    Idle,

    /// The toolchain is running and being monitored
    Busy,

    /// The export is paused on a question for the user
    /// This is the key state for the presentation layer - the export
    /// worker is blocked until the user confirms
    WaitingForUserInput,

    /// The export finished and produced an artifact
    Success,

    /// The export finished without producing an artifact
    Failure,
}

impl ExportState {
    /// True while a session is underway (monitoring or paused on a prompt)
    pub fn is_active(&self) -> bool {
        matches!(self, ExportState::Busy | ExportState::WaitingForUserInput)
    }

    /// True once a session has resolved either way
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportState::Success | ExportState::Failure)
    }
}

/// Summary of an export session for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportActivity {
    /// The job this session ran
    pub job_id: String,
    /// Which exporter drove it
    pub exporter_id: String,
    /// Current state
    pub state: ExportState,
    /// Timestamp when state last changed
    pub state_changed_at: Option<DateTime<Utc>>,
    /// How many output chunks the session logged
    pub chunks_logged: usize,
}

impl ExportActivity {
    pub fn new(job_id: impl Into<String>, exporter_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            exporter_id: exporter_id.into(),
            state: ExportState::Idle,
            state_changed_at: Some(Utc::now()),
            chunks_logged: 0,
        }
    }

    pub fn with_state(mut self, state: ExportState) -> Self {
        self.state = state;
        self.state_changed_at = Some(Utc::now());
        self
    }

    pub fn with_chunks_logged(mut self, chunks: usize) -> Self {
        self.chunks_logged = chunks;
        self
    }

    /// Check if the session is blocked waiting for the user
    pub fn is_blocked(&self) -> bool {
        matches!(self.state, ExportState::WaitingForUserInput)
    }

    /// Check if the toolchain is actively running
    pub fn is_running(&self) -> bool {
        matches!(self.state, ExportState::Busy)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const PROGRESS_FILE: &str = "progress.jsonl";

/// One structured progress record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub target: Option<String>,
    pub event_type: EventType,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventType {
    DomainSet,
    StageStarted { stage: u8 },
    StageCompleted { stage: u8 },
    StageFailed { stage: u8, error: String },
    ToolStarted { tool_name: String },
    ToolCompleted { tool_name: String },
    ToolFailed { tool_name: String, error: String },
    DataFound { data_type: String, count: usize },
}

/// Appends progress events to `progress.jsonl` in the working directory
pub struct ProgressTracker {
    session_id: String,
    target: Option<String>,
    output_dir: PathBuf,
    events: Vec<ProgressEvent>,
}

impl ProgressTracker {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            target: None,
            output_dir,
            events: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn set_target(&mut self, target: &str) {
        self.target = Some(target.to_string());
        self.add_event(EventType::DomainSet, format!("Target set to {}", target));
    }

    /// Records an event and appends it to the progress file
    pub fn add_event(&mut self, event_type: EventType, message: String) {
        let event = ProgressEvent {
            timestamp: Utc::now(),
            session_id: self.session_id.clone(),
            target: self.target.clone(),
            event_type,
            message,
        };

        self.save_to_file(&event);
        self.events.push(event);
    }

    fn save_to_file(&self, event: &ProgressEvent) {
        let progress_file = self.output_dir.join(PROGRESS_FILE);

        if let Ok(json) = serde_json::to_string(event) {
            if let Ok(mut file) = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&progress_file)
            {
                writeln!(file, "{}", json).ok();
            }
        }
    }

    pub fn stage_started(&mut self, stage: u8, title: &str) {
        self.add_event(
            EventType::StageStarted { stage },
            format!("Stage {} started: {}", stage, title),
        );
    }

    pub fn stage_completed(&mut self, stage: u8) {
        self.add_event(
            EventType::StageCompleted { stage },
            format!("Stage {} completed", stage),
        );
    }

    pub fn stage_failed(&mut self, stage: u8, error: &str) {
        self.add_event(
            EventType::StageFailed {
                stage,
                error: error.to_string(),
            },
            format!("Stage {} failed: {}", stage, error),
        );
    }

    pub fn tool_started(&mut self, tool_name: &str) {
        self.add_event(
            EventType::ToolStarted {
                tool_name: tool_name.to_string(),
            },
            format!("Starting {}", tool_name),
        );
    }

    pub fn tool_completed(&mut self, tool_name: &str) {
        self.add_event(
            EventType::ToolCompleted {
                tool_name: tool_name.to_string(),
            },
            format!("{} finished", tool_name),
        );
    }

    pub fn tool_failed(&mut self, tool_name: &str, error: &str) {
        self.add_event(
            EventType::ToolFailed {
                tool_name: tool_name.to_string(),
                error: error.to_string(),
            },
            format!("{} failed: {}", tool_name, error),
        );
    }

    pub fn data_found(&mut self, data_type: &str, count: usize) {
        self.add_event(
            EventType::DataFound {
                data_type: data_type.to_string(),
                count,
            },
            format!("Found {} {}", count, data_type),
        );
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Reads events back from a progress file, skipping malformed lines
    pub fn read_events_from_file(progress_file: &Path) -> Vec<ProgressEvent> {
        let mut events = Vec::new();

        if let Ok(content) = fs::read_to_string(progress_file) {
            for line in content.lines() {
                if let Ok(event) = serde_json::from_str::<ProgressEvent>(line) {
                    events.push(event);
                }
            }
        }

        events
    }
}

// session.rs - Target domain and pipeline progress
// Purpose: Gate which stage may run next; mutated only by the menu driver

use serde::Serialize;
use std::fmt;

use crate::error::{PipelineError, PipelineResult};

/// Stage number reached by setting a domain (menu option 2)
pub const DOMAIN_SET_STAGE: u8 = 2;
/// Highest stage number in the pipeline
pub const FINAL_STAGE: u8 = 8;

/// Where the pipeline currently stands for the active domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum PipelineState {
    Idle,
    DomainSet,
    Enumerated,
    Crawled,
    Filtered,
    Split,
    Targeted,
    Tested,
}

impl PipelineState {
    pub fn from_stage(stage: u8) -> Self {
        match stage {
            0 | 1 => PipelineState::Idle,
            2 => PipelineState::DomainSet,
            3 => PipelineState::Enumerated,
            4 => PipelineState::Crawled,
            5 => PipelineState::Filtered,
            6 => PipelineState::Split,
            7 => PipelineState::Targeted,
            _ => PipelineState::Tested,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineState::Idle => "idle",
            PipelineState::DomainSet => "domain set",
            PipelineState::Enumerated => "domains enumerated",
            PipelineState::Crawled => "URLs crawled",
            PipelineState::Filtered => "URLs filtered",
            PipelineState::Split => "parameters split",
            PipelineState::Targeted => "XSS targets ready",
            PipelineState::Tested => "XSS tested",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    target_domain: Option<String>,
    last_completed_stage: u8,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn domain(&self) -> Option<&str> {
        self.target_domain.as_deref()
    }

    pub fn last_completed_stage(&self) -> u8 {
        self.last_completed_stage
    }

    pub fn state(&self) -> PipelineState {
        if self.target_domain.is_none() {
            return PipelineState::Idle;
        }
        PipelineState::from_stage(self.last_completed_stage)
    }

    /// Stores a new target. Artifacts are per-domain, so earlier progress is discarded.
    pub fn set_domain(&mut self, name: &str) -> PipelineResult<()> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::InvalidInput(
                "domain name must not be empty".to_string(),
            ));
        }
        self.target_domain = Some(trimmed.to_string());
        self.last_completed_stage = DOMAIN_SET_STAGE;
        Ok(())
    }

    /// Monotonic: never moves the counter backwards.
    pub fn advance(&mut self, stage: u8) {
        let stage = stage.min(FINAL_STAGE);
        if stage > self.last_completed_stage {
            self.last_completed_stage = stage;
        }
    }

    pub fn can_run(&self, stage: u8) -> bool {
        if self.target_domain.is_none() {
            return false;
        }
        if stage <= 3 {
            return true;
        }
        self.last_completed_stage >= stage - 1
    }

    /// Human-readable reason why `stage` cannot run yet, if any
    pub fn blocker(&self, stage: u8) -> Option<String> {
        if self.target_domain.is_none() {
            return Some("Please set domain name first (option 2)".to_string());
        }
        if self.can_run(stage) {
            return None;
        }
        let required = stage - 1;
        Some(format!(
            "Please complete {} first (option {})",
            stage_label(required),
            required
        ))
    }
}

/// Short label used in guidance messages
pub fn stage_label(stage: u8) -> &'static str {
    match stage {
        2 => "domain selection",
        3 => "domain enumeration",
        4 => "URL crawling",
        5 => "URL filtering",
        6 => "URL separation",
        7 => "XSS preparation",
        8 => "XSS testing",
        _ => "the previous step",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle() {
        let session = Session::new();
        assert_eq!(session.domain(), None);
        assert_eq!(session.last_completed_stage(), 0);
        assert_eq!(session.state(), PipelineState::Idle);
    }

    #[test]
    fn test_set_domain_trims_and_rejects_empty() {
        let mut session = Session::new();
        assert!(matches!(
            session.set_domain("   "),
            Err(PipelineError::InvalidInput(_))
        ));
        assert_eq!(session.domain(), None);

        session.set_domain("  example.com \n").unwrap();
        assert_eq!(session.domain(), Some("example.com"));
        assert_eq!(session.state(), PipelineState::DomainSet);
    }

    #[test]
    fn test_advance_is_monotonic() {
        let mut session = Session::new();
        session.set_domain("example.com").unwrap();
        session.advance(5);
        session.advance(3);
        assert_eq!(session.last_completed_stage(), 5);
        assert_eq!(session.state(), PipelineState::Filtered);
    }

    #[test]
    fn test_can_run_gates() {
        let mut session = Session::new();
        assert!(!session.can_run(3));

        session.set_domain("example.com").unwrap();
        assert!(session.can_run(3));
        assert!(!session.can_run(4));

        session.advance(3);
        assert!(session.can_run(4));
        assert!(!session.can_run(5));

        session.advance(7);
        assert!(session.can_run(8));
    }

    #[test]
    fn test_resetting_domain_discards_progress() {
        let mut session = Session::new();
        session.set_domain("example.com").unwrap();
        session.advance(6);
        session.set_domain("other.org").unwrap();
        assert_eq!(session.last_completed_stage(), DOMAIN_SET_STAGE);
        assert!(!session.can_run(4));
    }

    #[test]
    fn test_blocker_messages() {
        let mut session = Session::new();
        assert!(session.blocker(3).unwrap().contains("option 2"));
        session.set_domain("example.com").unwrap();
        assert_eq!(session.blocker(3), None);
        assert!(session.blocker(5).unwrap().contains("option 4"));
    }
}

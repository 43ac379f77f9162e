// error.rs - Pipeline error taxonomy
// Purpose: Typed failures raised by stages, the tool invoker and the menu

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// External process could not be started, was not found, or exited non-zero
    #[error("{tool} failed during {step}: {reason}")]
    ToolExecution {
        step: String,
        tool: String,
        reason: String,
    },

    /// Domain unset, prior stage not completed, or a required file is absent
    #[error("Missing precondition: {0}")]
    MissingPrecondition(String),

    /// Required dependency file for the injection test is not present
    #[error("Missing dependency: {} not found", path.display())]
    MissingDependency { path: PathBuf, hint: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Artifact I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl PipelineError {
    pub fn tool(step: &str, tool: &str, reason: impl Into<String>) -> Self {
        PipelineError::ToolExecution {
            step: step.to_string(),
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_message_names_tool_and_step() {
        let err = PipelineError::tool("Subdomain enumeration", "amass", "exit status 1");
        let msg = err.to_string();
        assert!(msg.contains("amass"));
        assert!(msg.contains("Subdomain enumeration"));
    }

    #[test]
    fn test_missing_dependency_names_file() {
        let err = PipelineError::MissingDependency {
            path: PathBuf::from("payloads.txt"),
            hint: "create one".to_string(),
        };
        assert_eq!(err.to_string(), "Missing dependency: payloads.txt not found");
    }
}

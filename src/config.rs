use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::extract::ExtractorKind;

/// What to do once a stage succeeds and a next stage exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPolicy {
    /// Ask before leaving stage 3, chain automatically afterwards
    Ask,
    /// Chain without asking
    Always,
    /// Run only the selected stage
    Never,
}

/// Runtime settings shared by every stage
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Absolute directory holding artifacts, logs and the probe files
    pub workdir: PathBuf,
    pub extractor: ExtractorKind,
    pub chain: ChainPolicy,
    /// Injection probe executable, relative to the working directory
    pub probe: String,
    /// Payload list handed to the probe
    pub payloads: String,
    /// Worker threads passed through to the probe
    pub threads: usize,
}

impl PipelineConfig {
    /// Creates the working directory if needed and pins it to an absolute path,
    /// since tools run with it as their current directory
    pub fn resolve_workdir(dir: &str) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create working directory: {}", dir))?;
        fs::canonicalize(dir).with_context(|| format!("Failed to resolve working directory: {}", dir))
    }

    pub fn with_workdir(workdir: PathBuf) -> Self {
        Self {
            workdir,
            ..Self::default()
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            extractor: ExtractorKind::Permissive,
            chain: ChainPolicy::Ask,
            probe: "xss-checker".to_string(),
            payloads: "payloads.txt".to_string(),
            threads: 9,
        }
    }
}

// artifacts.rs - Line-oriented stage artifacts
// Purpose: Explicit serialization boundary between pipeline stages and the working directory

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};

pub const ERROR_LOG: &str = "error.log";
pub const URLS_READY: &str = "urls-ready.txt";
pub const ARJUN_INPUT: &str = "arjun-urls.txt";
pub const ARJUN_OUTPUT: &str = "arjun_output.txt";

/// Per-domain artifact names
pub struct ArtifactNames;

impl ArtifactNames {
    pub fn domains(domain: &str) -> String {
        format!("{}-domains.txt", domain)
    }

    pub fn crawler_raw(domain: &str, tool: &str) -> String {
        format!("{}-{}.txt", domain, tool)
    }

    pub fn links_final(domain: &str) -> String {
        format!("{}-links-final.txt", domain)
    }

    pub fn links_clean(domain: &str) -> String {
        format!("{}-links-clean.txt", domain)
    }

    pub fn uro_output(domain: &str) -> String {
        format!("{}-uro.txt", domain)
    }

    pub fn links(domain: &str) -> String {
        format!("{}-links.txt", domain)
    }

    pub fn query(domain: &str) -> String {
        format!("{}-query.txt", domain)
    }

    pub fn all_links(domain: &str) -> String {
        format!("{}-ALL-links.txt", domain)
    }

    pub fn metrics(domain: &str) -> String {
        format!("{}-metrics.json", domain)
    }
}

/// Reads and writes artifacts inside one working directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    /// Writes one record per line; the file is flushed and closed before returning
    pub fn write_lines<S: AsRef<str>>(&self, name: &str, lines: &[S]) -> PipelineResult<PathBuf> {
        let path = self.path(name);
        let file = File::create(&path).map_err(|e| PipelineError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        for line in lines {
            writeln!(writer, "{}", line.as_ref()).map_err(|e| PipelineError::io(&path, e))?;
        }
        writer.flush().map_err(|e| PipelineError::io(&path, e))?;
        Ok(path)
    }

    /// Stores raw tool output verbatim
    pub fn write_raw(&self, name: &str, content: &str) -> PipelineResult<PathBuf> {
        let path = self.path(name);
        fs::write(&path, content).map_err(|e| PipelineError::io(&path, e))?;
        Ok(path)
    }

    /// Reads every line with surrounding whitespace removed
    pub fn read_lines(&self, name: &str) -> PipelineResult<Vec<String>> {
        let path = self.path(name);
        let file = File::open(&path).map_err(|e| PipelineError::io(&path, e))?;
        let reader = BufReader::new(file);
        let mut lines = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| PipelineError::io(&path, e))?;
            lines.push(line.trim().to_string());
        }
        Ok(lines)
    }

    pub fn read_raw(&self, name: &str) -> PipelineResult<String> {
        let path = self.path(name);
        fs::read_to_string(&path).map_err(|e| PipelineError::io(&path, e))
    }

    /// Like `read_lines`, but an absent file reads as empty
    pub fn read_lines_or_empty(&self, name: &str) -> PipelineResult<Vec<String>> {
        if !self.exists(name) {
            return Ok(Vec::new());
        }
        self.read_lines(name)
    }

    /// Deletes an artifact; an already-missing file is not an error
    pub fn remove(&self, name: &str) -> PipelineResult<()> {
        let path = self.path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PipelineError::io(&path, e)),
        }
    }

    /// Reads an artifact and deletes it
    pub fn consume(&self, name: &str) -> PipelineResult<Vec<String>> {
        let lines = self.read_lines(name)?;
        self.remove(name)?;
        Ok(lines)
    }

    pub fn count_lines(&self, name: &str) -> usize {
        self.read_lines_or_empty(name)
            .map(|lines| lines.iter().filter(|l| !l.is_empty()).count())
            .unwrap_or(0)
    }

    /// Appends `Error during: {step}` to the error log
    pub fn log_error(&self, step: &str) -> PipelineResult<()> {
        let path = self.path(ERROR_LOG);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| PipelineError::io(&path, e))?;
        writeln!(file, "Error during: {}", step).map_err(|e| PipelineError::io(&path, e))
    }
}

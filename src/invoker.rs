// invoker.rs - External tool invocation
// Purpose: Run third-party recon binaries as blocking subprocesses and capture their output

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};
use crate::tools::discover_tool_path;

/// One call of an external tool
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Pipeline step this call belongs to (used in error.log)
    pub step: String,
    /// Logical tool name (subfinder, httprobe, ...)
    pub tool: String,
    /// Executable to launch; a bare name is searched for, a path is used as-is
    pub program: String,
    pub args: Vec<String>,
    /// Text piped into the tool's standard input
    pub stdin: Option<String>,
    /// File the tool writes its results to instead of stdout
    pub output_file: Option<PathBuf>,
    /// Forward stdout/stderr to the terminal instead of capturing
    pub stream_output: bool,
}

impl ToolInvocation {
    pub fn new(step: &str, tool: &str) -> Self {
        Self {
            step: step.to_string(),
            tool: tool.to_string(),
            program: tool.to_string(),
            args: Vec::new(),
            stdin: None,
            output_file: None,
            stream_output: false,
        }
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().to_string())
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn output_file(mut self, path: PathBuf) -> Self {
        self.output_file = Some(path);
        self
    }

    pub fn streamed(mut self) -> Self {
        self.stream_output = true;
        self
    }

    /// Shell-like rendering for progress messages
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Seam between the pipeline and the operating system
pub trait ToolRunner {
    fn run(&mut self, invocation: &ToolInvocation) -> PipelineResult<ToolOutput>;
}

/// Runs tools as real subprocesses inside the working directory
pub struct SystemRunner {
    workdir: PathBuf,
    show_spinner: bool,
}

impl SystemRunner {
    pub fn new(workdir: PathBuf) -> Self {
        Self {
            workdir,
            show_spinner: true,
        }
    }

    /// Disables the spinner
    pub fn quiet(mut self) -> Self {
        self.show_spinner = false;
        self
    }

    fn resolve(&self, invocation: &ToolInvocation) -> PipelineResult<PathBuf> {
        let program = Path::new(&invocation.program);
        if program.components().count() > 1 {
            let candidate = if program.is_absolute() {
                program.to_path_buf()
            } else {
                self.workdir.join(program)
            };
            if candidate.is_file() {
                return Ok(candidate);
            }
            return Err(PipelineError::tool(
                &invocation.step,
                &invocation.tool,
                format!("{} not found", candidate.display()),
            ));
        }

        discover_tool_path(&invocation.program).ok_or_else(|| {
            PipelineError::tool(
                &invocation.step,
                &invocation.tool,
                format!("{} could not be found in PATH", invocation.program),
            )
        })
    }

    fn spinner(&self, invocation: &ToolInvocation) -> Option<ProgressBar> {
        if !self.show_spinner || invocation.stream_output {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Current process: {}...", invocation.tool));
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }
}

impl ToolRunner for SystemRunner {
    fn run(&mut self, invocation: &ToolInvocation) -> PipelineResult<ToolOutput> {
        let executable = self.resolve(invocation)?;

        let mut cmd = Command::new(&executable);
        cmd.args(&invocation.args).current_dir(&self.workdir);

        if invocation.stdin.is_some() {
            cmd.stdin(Stdio::piped());
        } else {
            cmd.stdin(Stdio::null());
        }
        if invocation.stream_output {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        let spinner = self.spinner(invocation);

        let mut child = cmd.spawn().map_err(|e| {
            PipelineError::tool(&invocation.step, &invocation.tool, e.to_string())
        })?;

        // Feed stdin from a separate thread so a tool filling its stdout pipe cannot deadlock us
        let writer = match (child.stdin.take(), invocation.stdin.clone()) {
            (Some(mut pipe), Some(input)) => Some(std::thread::spawn(move || {
                let _ = pipe.write_all(input.as_bytes());
            })),
            _ => None,
        };

        let output = child.wait_with_output().map_err(|e| {
            PipelineError::tool(&invocation.step, &invocation.tool, e.to_string())
        });

        if let Some(handle) = writer {
            let _ = handle.join();
        }
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let output = output?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            let reason = match stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                Some(last) => format!("{} ({})", output.status, last.trim()),
                None => output.status.to_string(),
            };
            return Err(PipelineError::tool(&invocation.step, &invocation.tool, reason));
        }

        Ok(ToolOutput { stdout, stderr })
    }
}

/// Prints the progress line for a tool about to run
pub fn announce(invocation: &ToolInvocation) {
    println!(
        "{}",
        format!("[*] Running {} ({})", invocation.tool, invocation.command_line()).cyan()
    );
}

// pipeline.rs - Stage driver
// Purpose: Own the session, check preconditions, run stages and advance the state machine.
//          Stages never call each other; chaining is decided here.

use colored::*;

use crate::artifacts::{ArtifactNames, ArtifactStore};
use crate::config::{ChainPolicy, PipelineConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::extract::UrlExtractor;
use crate::invoker::ToolRunner;
use crate::metrics::RunMetrics;
use crate::progress::ProgressTracker;
use crate::session::{PipelineState, Session};
use crate::stages::{Stage, StageContext, StageReport, handle_error_with_solution, run_stage};

pub struct Pipeline<R: ToolRunner> {
    session: Session,
    config: PipelineConfig,
    store: ArtifactStore,
    runner: R,
    extractor: Box<dyn UrlExtractor>,
    progress: ProgressTracker,
    metrics: Option<RunMetrics>,
}

impl<R: ToolRunner> Pipeline<R> {
    pub fn new(config: PipelineConfig, runner: R) -> Self {
        let store = ArtifactStore::new(config.workdir.clone());
        let progress = ProgressTracker::new(config.workdir.clone());
        let extractor = config.extractor.build();
        Self {
            session: Session::new(),
            config,
            store,
            runner,
            extractor,
            progress,
            metrics: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> PipelineState {
        self.session.state()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn session_id(&self) -> &str {
        self.progress.session_id()
    }

    pub fn metrics(&self) -> Option<&RunMetrics> {
        self.metrics.as_ref()
    }

    pub fn set_domain(&mut self, name: &str) -> PipelineResult<()> {
        self.session.set_domain(name)?;
        if let Some(domain) = self.session.domain() {
            self.progress.set_target(domain);
            self.metrics = Some(RunMetrics::new(domain));
        }
        Ok(())
    }

    /// Runs `stage`, then keeps going while the chain policy allows it.
    /// `confirm` is asked before leaving stage 3 under `ChainPolicy::Ask`.
    /// Returns the reports of every stage that succeeded.
    pub fn run_from(
        &mut self,
        stage: Stage,
        confirm: &mut dyn FnMut(&str) -> bool,
    ) -> Vec<StageReport> {
        let mut reports = Vec::new();
        let mut current = Some(stage);

        while let Some(stage) = current {
            let report = match self.run_single(stage) {
                Some(report) => report,
                None => break,
            };
            reports.push(report);

            current = match (stage.next(), self.config.chain) {
                (None, _) | (_, ChainPolicy::Never) => None,
                (Some(next), ChainPolicy::Ask) if stage == Stage::Enumerate => {
                    let question = format!(
                        "Continue to crawl URLs (step {})? [Y/n]: ",
                        next.number()
                    );
                    if confirm(&question) { Some(next) } else { None }
                }
                (Some(next), _) => Some(next),
            };
        }

        reports
    }

    /// Precondition check, stage execution and state transition for one stage
    pub fn run_single(&mut self, stage: Stage) -> Option<StageReport> {
        if let Some(reason) = self.session.blocker(stage.number()) {
            println!("{}", reason.yellow());
            return None;
        }
        let domain = self.session.domain()?.to_string();

        let metrics = self
            .metrics
            .get_or_insert_with(|| RunMetrics::new(&domain));
        let mut ctx = StageContext {
            domain: &domain,
            config: &self.config,
            store: &self.store,
            runner: &mut self.runner,
            extractor: self.extractor.as_ref(),
            progress: &mut self.progress,
            metrics,
        };

        let result = run_stage(stage, &mut ctx);
        self.save_metrics(&domain);

        match result {
            Ok(report) => {
                self.session.advance(stage.number());
                if !report.artifacts.is_empty() {
                    println!(
                        "{}",
                        format!("[+] Artifacts: {}", report.artifacts.join(", ")).green()
                    );
                }
                println!(
                    "{}",
                    format!(
                        "[+] Stage {} done ({} records). Pipeline state: {}",
                        report.stage.number(),
                        report.records,
                        self.session.state()
                    )
                    .green()
                );
                Some(report)
            }
            Err(e) => {
                self.report_failure(stage, &e);
                None
            }
        }
    }

    fn report_failure(&self, stage: Stage, err: &PipelineError) {
        match err {
            PipelineError::MissingPrecondition(reason) => {
                println!("{}", format!("[!] {}", reason).yellow());
            }
            PipelineError::MissingDependency { path, hint } => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string());
                println!("{}", format!("{} not found in {}.", name, self.store.dir().display()).red());
                println!("{}", hint.yellow());
            }
            other => {
                println!("{}", format!("[!] {}", other).red());
                handle_error_with_solution(&self.store, stage.step_name(), &stage.remediation(other));
            }
        }
    }

    fn save_metrics(&self, domain: &str) {
        if let Some(metrics) = &self.metrics {
            let path = self.store.path(&ArtifactNames::metrics(domain));
            if let Err(e) = metrics.save_to_file(&path) {
                println!("{}", format!("[!] Could not save metrics: {}", e).yellow());
            }
        }
    }
}

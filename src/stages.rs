// stages.rs - Recon pipeline stages 3-8
// Purpose: Enumerate, crawl, filter, split and target URLs, then run the XSS probe.
//          Each stage reads the previous stage's artifacts, transforms the records
//          and writes its own artifacts; chaining is decided by the caller.

use colored::*;
use std::path::Path;
use std::time::Instant;

use crate::artifacts::{ARJUN_INPUT, ARJUN_OUTPUT, ArtifactNames, ArtifactStore, URLS_READY};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::extract::UrlExtractor;
use crate::filters::{
    dedup_exact, filter_domain, filter_extensions, merge_unique_domains, partition_urls,
    split_targets,
};
use crate::invoker::{ToolInvocation, ToolOutput, ToolRunner, announce};
use crate::metrics::RunMetrics;
use crate::progress::ProgressTracker;
use crate::tools::install_hint;

const GOSPIDER_CONCURRENCY: &str = "10";
const GOSPIDER_DEPTH: &str = "5";
const HAKRAWLER_DEPTH: &str = "3";
const ARJUN_THREADS: &str = "10";

const CRAWLERS: &[&str] = &["gospider", "hakrawler", "katana", "waybackurls", "gau"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Enumerate,
    Crawl,
    Filter,
    Split,
    Target,
    Inject,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Enumerate,
        Stage::Crawl,
        Stage::Filter,
        Stage::Split,
        Stage::Target,
        Stage::Inject,
    ];

    pub fn number(self) -> u8 {
        match self {
            Stage::Enumerate => 3,
            Stage::Crawl => 4,
            Stage::Filter => 5,
            Stage::Split => 6,
            Stage::Target => 7,
            Stage::Inject => 8,
        }
    }

    pub fn from_number(n: u8) -> Option<Stage> {
        Stage::ALL.into_iter().find(|s| s.number() == n)
    }

    pub fn next(self) -> Option<Stage> {
        Stage::from_number(self.number() + 1)
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::Enumerate => "Enumerate and filter domains",
            Stage::Crawl => "Crawl and filter URLs",
            Stage::Filter => "Filtering all",
            Stage::Split => "Create new separated file for Arjun & SQLi testing",
            Stage::Target => "Getting ready for XSS & URLs with query strings",
            Stage::Inject => "xss0r RUN",
        }
    }

    /// Name written to error.log
    pub fn step_name(self) -> &'static str {
        match self {
            Stage::Enumerate => "Subdomain enumeration",
            Stage::Crawl => "URL crawling",
            Stage::Filter => "URL filtering",
            Stage::Split => "URL separation",
            Stage::Target => "XSS preparation",
            Stage::Inject => "xss-checker",
        }
    }

    /// Static fix suggestion printed after a failure
    pub fn remediation(self, err: &PipelineError) -> String {
        match self {
            Stage::Enumerate => "Check network connection and tool installations".to_string(),
            Stage::Crawl => "Check tool installations and network connection".to_string(),
            Stage::Filter => "Check URO installation and input files".to_string(),
            Stage::Split => "Check Arjun installation and input files".to_string(),
            Stage::Target => format!("Error: {}", err),
            Stage::Inject => "Check XSStrike installation and configuration".to_string(),
        }
    }
}

/// Everything a stage needs; the session itself stays with the driver
pub struct StageContext<'a> {
    pub domain: &'a str,
    pub config: &'a PipelineConfig,
    pub store: &'a ArtifactStore,
    pub runner: &'a mut dyn ToolRunner,
    pub extractor: &'a dyn UrlExtractor,
    pub progress: &'a mut ProgressTracker,
    pub metrics: &'a mut RunMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    /// Artifacts left in the working directory for the next stage
    pub artifacts: Vec<String>,
    /// Records in the primary output artifact
    pub records: usize,
}

/// Runs a single stage; never chains
pub fn run_stage(stage: Stage, ctx: &mut StageContext<'_>) -> PipelineResult<StageReport> {
    print_stage_header(stage, ctx.domain);
    ctx.progress.stage_started(stage.number(), stage.title());
    let started = Instant::now();

    let result = match stage {
        Stage::Enumerate => enumerate_domains(ctx),
        Stage::Crawl => crawl_urls(ctx),
        Stage::Filter => filter_urls(ctx),
        Stage::Split => split_parameters(ctx),
        Stage::Target => prepare_targets(ctx).map_err(|e| match e {
            PipelineError::ToolExecution { .. } | PipelineError::MissingPrecondition(_) => e,
            other => PipelineError::Unexpected(other.to_string()),
        }),
        Stage::Inject => run_injection_test(ctx),
    };

    ctx.metrics
        .record_stage_duration(stage.number(), started.elapsed().as_secs_f64());

    match &result {
        Ok(report) => {
            ctx.progress.stage_completed(stage.number());
            ctx.progress.data_found(stage.step_name(), report.records);
        }
        Err(e) => ctx.progress.stage_failed(stage.number(), &e.to_string()),
    }

    result
}

fn print_stage_header(stage: Stage, domain: &str) {
    println!("\n{}", "═══════════════════════════════════════════════════════════════".yellow().bold());
    println!("{}", format!("  STAGE {}: {}", stage.number(), stage.title().to_uppercase()).yellow().bold());
    println!("{}", "═══════════════════════════════════════════════════════════════".yellow().bold());
    println!("{}", format!("You selected: {} for {}", stage.title(), domain).white().bold());
}

fn show_progress(message: &str) {
    println!("{}", format!("Current process: {}...⌛️", message).blue().bold());
}

/// Prints a failure with its fix suggestion and records the step in error.log
pub fn handle_error_with_solution(store: &ArtifactStore, step: &str, solution: &str) {
    println!(
        "{}",
        format!(
            "Error occurred during the execution of {}. Exiting step but continuing with the next one.",
            step
        )
        .red()
    );
    if let Err(e) = store.log_error(step) {
        println!("{}", format!("[!] Could not write error log: {}", e).yellow());
    }
    println!("{}", "Possible Solution:".yellow().bold());
    println!("{}", solution.white().bold());
}

fn run_tool(ctx: &mut StageContext<'_>, invocation: &ToolInvocation) -> PipelineResult<ToolOutput> {
    announce(invocation);
    ctx.progress.tool_started(&invocation.tool);

    match ctx.runner.run(invocation) {
        Ok(output) => {
            ctx.progress.tool_completed(&invocation.tool);
            if output.stdout.trim().is_empty() {
                if let Some(last) = output.stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                    println!("{}", format!("[!] {} produced no output: {}", invocation.tool, last.trim()).yellow());
                }
            }
            Ok(output)
        }
        Err(e) => {
            ctx.progress.tool_failed(&invocation.tool, &e.to_string());
            ctx.metrics.record_tool_failure(&invocation.tool);
            Err(e)
        }
    }
}

/// Collector tools are best-effort: a failure is reported and the stage carries on
fn run_collector(ctx: &mut StageContext<'_>, invocation: &ToolInvocation) -> Option<ToolOutput> {
    match run_tool(ctx, invocation) {
        Ok(output) => Some(output),
        Err(e) => {
            println!("{}", format!("[!] {}", e).yellow());
            let step = format!("{} ({})", invocation.step, invocation.tool);
            let hint = install_hint(&invocation.tool)
                .map(|cmd| format!("Manual installation: {}", cmd))
                .unwrap_or_else(|| format!("Check {} installation", invocation.tool));
            handle_error_with_solution(ctx.store, &step, &hint);
            None
        }
    }
}

fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn require_artifact(store: &ArtifactStore, name: &str, producer: Stage) -> PipelineResult<()> {
    if store.exists(name) {
        return Ok(());
    }
    Err(PipelineError::MissingPrecondition(format!(
        "{} not found; run option {} ({}) first",
        name,
        producer.number(),
        producer.title()
    )))
}

// ═══════════════════════════════════════════════════════════════════════════
// STAGE 3: ENUMERATE & FILTER DOMAINS
// ═══════════════════════════════════════════════════════════════════════════

fn enumerate_domains(ctx: &mut StageContext<'_>) -> PipelineResult<StageReport> {
    let step = Stage::Enumerate.step_name();
    let domain = ctx.domain;

    show_progress("Running passive subdomain enumeration");
    let collectors = [
        ToolInvocation::new(step, "subfinder").args(["-d", domain, "-silent"]),
        ToolInvocation::new(step, "amass").args(["enum", "-passive", "-d", domain]),
        ToolInvocation::new(step, "assetfinder").args(["--subs-only", domain]),
    ];

    let mut lists = Vec::with_capacity(collectors.len());
    let mut succeeded = 0;
    for invocation in &collectors {
        match run_collector(ctx, invocation) {
            Some(output) => {
                succeeded += 1;
                let found = non_empty_lines(&output.stdout);
                println!("{}", format!("[+] {} returned {} lines", invocation.tool, found.len()).green());
                lists.push(found);
            }
            None => lists.push(Vec::new()),
        }
    }

    if succeeded == 0 {
        return Err(PipelineError::tool(
            step,
            "subfinder/amass/assetfinder",
            "every passive enumeration tool failed",
        ));
    }

    show_progress("Filtering unique domains");
    ctx.metrics.raw_subdomains = lists.iter().map(Vec::len).sum();
    let unique = merge_unique_domains(&lists);
    ctx.metrics.unique_subdomains = unique.len();
    println!("{}", format!("[+] {} unique domains after normalization", unique.len()).green());
    if unique.is_empty() {
        println!("{}", format!("[!] No subdomains discovered for {}", domain).yellow());
    }

    show_progress("Verifying alive domains");
    let mut probe_input = unique.join("\n");
    if !probe_input.is_empty() {
        probe_input.push('\n');
    }
    let probe = ToolInvocation::new(step, "httprobe").stdin(probe_input);
    let output = run_tool(ctx, &probe)?;

    let live = non_empty_lines(&output.stdout);
    ctx.metrics.live_hosts = live.len();

    let name = ArtifactNames::domains(domain);
    ctx.store.write_lines(&name, &live)?;
    println!(
        "{}",
        format!("Enumeration completed. {} live hosts saved to {}", live.len(), name).blue().bold()
    );

    Ok(StageReport {
        stage: Stage::Enumerate,
        artifacts: vec![name],
        records: live.len(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// STAGE 4: CRAWL & AGGREGATE URLS
// ═══════════════════════════════════════════════════════════════════════════

fn crawler_invocation(tool: &str, domains_path: &Path, domains: &str) -> ToolInvocation {
    let step = Stage::Crawl.step_name();
    match tool {
        "gospider" => ToolInvocation::new(step, tool)
            .arg("-S")
            .path_arg(domains_path)
            .args(["-c", GOSPIDER_CONCURRENCY, "-d", GOSPIDER_DEPTH]),
        "hakrawler" => ToolInvocation::new(step, tool)
            .args(["-d", HAKRAWLER_DEPTH])
            .stdin(domains),
        _ => ToolInvocation::new(step, tool).stdin(domains),
    }
}

fn crawl_urls(ctx: &mut StageContext<'_>) -> PipelineResult<StageReport> {
    let domain = ctx.domain;
    let domains_name = ArtifactNames::domains(domain);
    require_artifact(ctx.store, &domains_name, Stage::Enumerate)?;

    let domains_path = ctx.store.path(&domains_name);
    let domains = ctx.store.read_raw(&domains_name)?;

    let mut succeeded = 0;
    for tool in CRAWLERS {
        show_progress(&format!("Running {}", tool));
        // output left by an interrupted run must not be merged into this one
        let raw_name = ArtifactNames::crawler_raw(domain, tool);
        ctx.store.remove(&raw_name)?;
        let invocation = crawler_invocation(tool, &domains_path, &domains);
        if let Some(output) = run_collector(ctx, &invocation) {
            succeeded += 1;
            ctx.store.write_raw(&raw_name, &output.stdout)?;
        }
    }

    if succeeded == 0 {
        return Err(PipelineError::tool(
            Stage::Crawl.step_name(),
            "crawlers",
            "every crawler failed",
        ));
    }

    show_progress(&format!("Processing results ({} URL extraction)", ctx.extractor.name()));
    let mut all_urls = Vec::new();
    for tool in CRAWLERS {
        let raw_name = ArtifactNames::crawler_raw(domain, tool);
        if !ctx.store.exists(&raw_name) {
            continue;
        }
        let raw = ctx.store.read_raw(&raw_name)?;
        let urls = ctx.extractor.extract(&raw);
        ctx.metrics.urls_per_crawler.insert(tool.to_string(), urls.len());
        all_urls.extend(urls);
        ctx.store.remove(&raw_name)?;
    }

    ctx.metrics.total_crawled_urls = all_urls.len();
    println!("{}", format!("Total URLs collected: {}", all_urls.len()).white().bold());

    let name = ArtifactNames::links_final(domain);
    ctx.store.write_lines(&name, &all_urls)?;
    println!("{}", format!("URL collection completed. Results saved to {}", name).blue().bold());

    Ok(StageReport {
        stage: Stage::Crawl,
        artifacts: vec![name],
        records: all_urls.len(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// STAGE 5: EXTENSION & DOMAIN FILTERING
// ═══════════════════════════════════════════════════════════════════════════

fn filter_urls(ctx: &mut StageContext<'_>) -> PipelineResult<StageReport> {
    let step = Stage::Filter.step_name();
    let domain = ctx.domain;
    let final_name = ArtifactNames::links_final(domain);
    require_artifact(ctx.store, &final_name, Stage::Crawl)?;

    show_progress("Filtering extensions");
    let links = ctx.store.read_lines(&final_name)?;
    let without_assets = filter_extensions(&links);
    ctx.metrics.urls_after_extension_filter = without_assets.len();

    show_progress("Filtering domain-specific URLs");
    let clean = filter_domain(&without_assets, domain);
    ctx.metrics.urls_after_domain_filter = clean.len();

    let clean_name = ArtifactNames::links_clean(domain);
    let clean_path = ctx.store.write_lines(&clean_name, &clean)?;

    show_progress("Running URO to remove similar URLs");
    let uro_name = ArtifactNames::uro_output(domain);
    let uro_path = ctx.store.path(&uro_name);
    ctx.store.remove(&uro_name)?;
    let uro = ToolInvocation::new(step, "uro")
        .arg("-i")
        .path_arg(&clean_path)
        .arg("-o")
        .path_arg(&uro_path)
        .output_file(uro_path.clone());
    run_tool(ctx, &uro)?;

    show_progress("Final filtering");
    // uro leaves no file behind when nothing survives
    let similar_free = if ctx.store.exists(&uro_name) {
        ctx.store.consume(&uro_name)?
    } else {
        Vec::new()
    };
    let unique = dedup_exact(&similar_free);
    ctx.metrics.filtered_urls = unique.len();

    let links_name = ArtifactNames::links(domain);
    ctx.store.write_lines(&links_name, &unique)?;
    ctx.store.remove(&final_name)?;

    println!(
        "{}",
        format!("Filtering completed. {} URLs saved to {}", unique.len(), links_name).blue().bold()
    );

    Ok(StageReport {
        stage: Stage::Filter,
        artifacts: vec![clean_name, links_name],
        records: unique.len(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// STAGE 6: PARAMETER-DISCOVERY SPLIT
// ═══════════════════════════════════════════════════════════════════════════

fn split_parameters(ctx: &mut StageContext<'_>) -> PipelineResult<StageReport> {
    let step = Stage::Split.step_name();
    let links_name = ArtifactNames::links(ctx.domain);
    require_artifact(ctx.store, &links_name, Stage::Filter)?;

    show_progress("Separating URLs with parameters");
    let links = ctx.store.read_lines(&links_name)?;
    let partition = partition_urls(&links);
    ctx.metrics.query_urls = partition.query.len();
    ctx.metrics.discovery_candidates = partition.candidates.len();
    ctx.metrics.unclassified_urls = partition.other.len();

    let mut discovered = Vec::new();
    if !partition.candidates.is_empty() {
        show_progress("Running Arjun on parameter-less URLs");
        let input_path = ctx.store.write_lines(ARJUN_INPUT, &partition.candidates)?;
        let output_path = ctx.store.path(ARJUN_OUTPUT);
        ctx.store.remove(ARJUN_OUTPUT)?;
        let arjun = ToolInvocation::new(step, "arjun")
            .arg("-i")
            .path_arg(&input_path)
            .arg("-oT")
            .path_arg(&output_path)
            .args(["-t", ARJUN_THREADS])
            .output_file(output_path.clone());

        if let Err(e) = run_tool(ctx, &arjun) {
            ctx.store.remove(ARJUN_INPUT)?;
            return Err(e);
        }
        discovered = ctx
            .store
            .read_lines_or_empty(ARJUN_OUTPUT)?
            .into_iter()
            .filter(|l| !l.is_empty())
            .collect();
    }
    ctx.metrics.discovered_param_urls = discovered.len();

    show_progress("Merging results");
    let mut merged = partition.query;
    merged.extend(discovered);
    merged.extend(partition.other);
    ctx.store.write_lines(URLS_READY, &merged)?;

    for name in [ARJUN_INPUT, ARJUN_OUTPUT, links_name.as_str()] {
        ctx.store.remove(name)?;
    }

    println!("{}", format!("URL separation completed. Results saved to {}", URLS_READY).blue().bold());

    Ok(StageReport {
        stage: Stage::Split,
        artifacts: vec![URLS_READY.to_string()],
        records: merged.len(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// STAGE 7: QUERY-STRING TARGETING
// ═══════════════════════════════════════════════════════════════════════════

fn prepare_targets(ctx: &mut StageContext<'_>) -> PipelineResult<StageReport> {
    require_artifact(ctx.store, URLS_READY, Stage::Split)?;

    show_progress("Separating URLs with query parameters");
    let ready: Vec<String> = ctx
        .store
        .read_lines(URLS_READY)?
        .into_iter()
        .filter(|l| !l.is_empty())
        .collect();
    let split = split_targets(&ready);

    let all_name = ArtifactNames::all_links(ctx.domain);
    ctx.store.write_lines(&all_name, &split.all)?;

    show_progress("Analyzing query parameters for XSS potential");
    let query_name = ArtifactNames::query(ctx.domain);
    ctx.store.write_lines(&query_name, &split.targets)?;

    ctx.metrics.passthrough_urls = split.all.len();
    ctx.metrics.param_urls = split.with_params.len();
    ctx.metrics.xss_targets = split.targets.len();

    println!("{}", "XSS target preparation completed.".blue().bold());
    println!(
        "{}",
        format!("Query URLs saved to {} ({} targets)", query_name, split.targets.len()).white().bold()
    );
    println!(
        "{}",
        format!("All URLs saved to {} ({} URLs)", all_name, split.all.len()).white().bold()
    );

    Ok(StageReport {
        stage: Stage::Target,
        artifacts: vec![query_name, all_name],
        records: split.targets.len(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// STAGE 8: INJECTION TEST EXECUTION
// ═══════════════════════════════════════════════════════════════════════════

fn require_dependency(store: &ArtifactStore, name: &str, hint: &str) -> PipelineResult<()> {
    let path = store.dir().join(name);
    if path.is_file() {
        return Ok(());
    }
    Err(PipelineError::MissingDependency {
        path,
        hint: hint.to_string(),
    })
}

fn run_injection_test(ctx: &mut StageContext<'_>) -> PipelineResult<StageReport> {
    let config = ctx.config;
    let query_name = ArtifactNames::query(ctx.domain);

    require_dependency(
        ctx.store,
        &config.probe,
        "Please download it from: https://github.com/s0md3v/XSStrike",
    )?;
    require_dependency(
        ctx.store,
        &config.payloads,
        "Please create a payloads file or download one.",
    )?;
    require_dependency(
        ctx.store,
        &query_name,
        "No query URLs found to test. Run option 7 first.",
    )?;

    let program = if Path::new(&config.probe).components().count() > 1 {
        config.probe.clone()
    } else {
        format!("./{}", config.probe)
    };

    show_progress("Running xss-checker");
    let probe = ToolInvocation::new(Stage::Inject.step_name(), "xss-checker")
        .program(program)
        .arg("--urls")
        .path_arg(&ctx.store.path(&query_name))
        .arg("--payloads")
        .path_arg(&ctx.store.dir().join(&config.payloads))
        .arg("--shuffle")
        .args(["--threads".to_string(), config.threads.to_string()])
        .streamed();
    run_tool(ctx, &probe)?;

    println!("{}", "XSS testing completed. Check the results.".blue().bold());

    Ok(StageReport {
        stage: Stage::Inject,
        artifacts: Vec::new(),
        records: ctx.store.count_lines(&query_name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::PermissiveUrlExtractor;
    use crate::invoker::testing::ScriptedRunner;

    const DOMAIN: &str = "example.com";

    struct Harness {
        dir: tempfile::TempDir,
        config: PipelineConfig,
        store: ArtifactStore,
        progress: ProgressTracker,
        metrics: RunMetrics,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = PipelineConfig::with_workdir(dir.path().to_path_buf());
            let store = ArtifactStore::new(dir.path());
            let progress = ProgressTracker::new(dir.path().to_path_buf());
            Self {
                dir,
                config,
                store,
                progress,
                metrics: RunMetrics::new(DOMAIN),
            }
        }

        fn run(&mut self, stage: Stage, runner: &mut ScriptedRunner) -> PipelineResult<StageReport> {
            let extractor = PermissiveUrlExtractor;
            let mut ctx = StageContext {
                domain: DOMAIN,
                config: &self.config,
                store: &self.store,
                runner,
                extractor: &extractor,
                progress: &mut self.progress,
                metrics: &mut self.metrics,
            };
            run_stage(stage, &mut ctx)
        }

        fn lines(&self, name: &str) -> Vec<String> {
            self.store.read_lines(name).unwrap()
        }
    }

    #[test]
    fn test_stage_numbering_and_chain_order() {
        assert_eq!(Stage::from_number(3), Some(Stage::Enumerate));
        assert_eq!(Stage::from_number(9), None);
        assert_eq!(Stage::Target.next(), Some(Stage::Inject));
        assert_eq!(Stage::Inject.next(), None);
    }

    #[test]
    fn test_enumeration_collapses_www_variant() {
        let mut h = Harness::new();
        let mut runner = ScriptedRunner::new()
            .reply("subfinder", &["a.example.com", "www.a.example.com", "b.example.com"])
            .reply("amass", &[])
            .reply("assetfinder", &[])
            .echo("httprobe");

        let report = h.run(Stage::Enumerate, &mut runner).unwrap();
        assert_eq!(report.records, 2);
        assert_eq!(
            h.lines(&ArtifactNames::domains(DOMAIN)),
            vec!["a.example.com", "b.example.com"]
        );
        assert_eq!(
            runner.call("httprobe").unwrap().stdin.as_deref(),
            Some("a.example.com\nb.example.com\n")
        );
        assert_eq!(h.metrics.raw_subdomains, 3);
        assert_eq!(h.metrics.unique_subdomains, 2);
    }

    #[test]
    fn test_enumeration_survives_one_collector_failure() {
        let mut h = Harness::new();
        let mut runner = ScriptedRunner::new()
            .reply("subfinder", &["a.example.com"])
            .fail("amass", "exit status: 1")
            .reply("assetfinder", &["https://c.example.com"])
            .reply("httprobe", &["https://a.example.com", "https://c.example.com"]);

        h.run(Stage::Enumerate, &mut runner).unwrap();
        assert_eq!(
            runner.call("httprobe").unwrap().stdin.as_deref(),
            Some("a.example.com\nc.example.com\n")
        );
        let log = h.store.read_raw(crate::artifacts::ERROR_LOG).unwrap();
        assert_eq!(log, "Error during: Subdomain enumeration (amass)\n");
        assert_eq!(h.metrics.tool_failures, vec!["amass".to_string()]);
    }

    #[test]
    fn test_enumeration_aborts_when_prober_fails() {
        let mut h = Harness::new();
        let mut runner = ScriptedRunner::new()
            .reply("subfinder", &["a.example.com"])
            .fail("httprobe", "not found");

        let err = h.run(Stage::Enumerate, &mut runner).unwrap_err();
        assert!(matches!(err, PipelineError::ToolExecution { ref tool, .. } if tool == "httprobe"));
        assert!(!h.store.exists(&ArtifactNames::domains(DOMAIN)));
    }

    #[test]
    fn test_enumeration_with_no_subdomains_writes_empty_list() {
        let mut h = Harness::new();
        let mut runner = ScriptedRunner::new()
            .reply("subfinder", &[])
            .reply("amass", &[])
            .reply("assetfinder", &[])
            .echo("httprobe");

        let report = h.run(Stage::Enumerate, &mut runner).unwrap();
        assert_eq!(report.records, 0);
        assert_eq!(runner.call("httprobe").unwrap().stdin.as_deref(), Some(""));
        assert!(h.store.exists(&ArtifactNames::domains(DOMAIN)));
        assert!(h.lines(&ArtifactNames::domains(DOMAIN)).is_empty());
    }

    #[test]
    fn test_enumeration_aborts_when_all_collectors_fail() {
        let mut h = Harness::new();
        let mut runner = ScriptedRunner::new()
            .fail("subfinder", "x")
            .fail("amass", "x")
            .fail("assetfinder", "x");

        assert!(h.run(Stage::Enumerate, &mut runner).is_err());
        assert!(!runner.called("httprobe"));
    }

    #[test]
    fn test_crawl_concatenates_in_tool_order_and_cleans_up() {
        let mut h = Harness::new();
        h.store
            .write_lines(&ArtifactNames::domains(DOMAIN), &["https://a.example.com"])
            .unwrap();
        let mut runner = ScriptedRunner::new()
            .reply_raw("gospider", "[url] - [code-200] - https://a.example.com/x\n")
            .reply("hakrawler", &["https://a.example.com/y"])
            .reply("katana", &["https://a.example.com/x"])
            .fail("waybackurls", "timeout")
            .reply("gau", &["junk", "http://a.example.com/z?id=1"]);

        let report = h.run(Stage::Crawl, &mut runner).unwrap();
        assert_eq!(report.records, 4);
        assert_eq!(
            h.lines(&ArtifactNames::links_final(DOMAIN)),
            vec![
                "https://a.example.com/x",
                "https://a.example.com/y",
                "https://a.example.com/x",
                "http://a.example.com/z?id=1",
            ]
        );
        for tool in CRAWLERS {
            assert!(!h.store.exists(&ArtifactNames::crawler_raw(DOMAIN, tool)));
        }
        assert_eq!(
            runner.tools_called(),
            vec!["gospider", "hakrawler", "katana", "waybackurls", "gau"]
        );
        let gospider = runner.call("gospider").unwrap();
        assert_eq!(gospider.args[0], "-S");
        assert!(gospider.stdin.is_none());
        assert!(runner.call("katana").unwrap().stdin.is_some());
    }

    #[test]
    fn test_crawl_discards_output_left_by_earlier_run() {
        let mut h = Harness::new();
        h.store
            .write_lines(&ArtifactNames::domains(DOMAIN), &["https://a.example.com"])
            .unwrap();
        h.store
            .write_raw(
                &ArtifactNames::crawler_raw(DOMAIN, "waybackurls"),
                "https://a.example.com/old\n",
            )
            .unwrap();
        let mut runner = ScriptedRunner::new()
            .reply("gospider", &["https://a.example.com/fresh"])
            .fail("waybackurls", "timeout");

        h.run(Stage::Crawl, &mut runner).unwrap();
        assert_eq!(
            h.lines(&ArtifactNames::links_final(DOMAIN)),
            vec!["https://a.example.com/fresh"]
        );
        assert!(!h.metrics.urls_per_crawler.contains_key("waybackurls"));
    }

    #[test]
    fn test_crawl_requires_domain_list() {
        let mut h = Harness::new();
        let mut runner = ScriptedRunner::new();
        let err = h.run(Stage::Crawl, &mut runner).unwrap_err();
        assert!(matches!(err, PipelineError::MissingPrecondition(_)));
        assert!(runner.calls.is_empty());
    }

    #[test]
    fn test_filter_drops_assets_before_anything_else() {
        let mut h = Harness::new();
        h.store
            .write_lines(
                &ArtifactNames::links_final(DOMAIN),
                &[
                    "https://example.com/app.js?x=1",
                    "https://example.com/search?q=1",
                    "https://other.org/page?id=1",
                    "https://example.com/about",
                ],
            )
            .unwrap();
        let mut runner = ScriptedRunner::new().reply(
            "uro",
            &[
                "https://example.com/search?q=1",
                "https://example.com/about",
                "https://example.com/search?q=1",
            ],
        );

        let report = h.run(Stage::Filter, &mut runner).unwrap();
        assert_eq!(report.records, 2);
        assert_eq!(
            h.lines(&ArtifactNames::links_clean(DOMAIN)),
            vec!["https://example.com/search?q=1", "https://example.com/about"]
        );
        assert_eq!(
            h.lines(&ArtifactNames::links(DOMAIN)),
            vec!["https://example.com/search?q=1", "https://example.com/about"]
        );
        assert!(!h.store.exists(&ArtifactNames::links_final(DOMAIN)));
        assert!(!h.store.exists(&ArtifactNames::uro_output(DOMAIN)));
    }

    #[test]
    fn test_filter_keeps_input_when_uro_fails() {
        let mut h = Harness::new();
        h.store
            .write_lines(&ArtifactNames::links_final(DOMAIN), &["https://example.com/a"])
            .unwrap();
        let mut runner = ScriptedRunner::new().fail("uro", "not found");
        assert!(h.run(Stage::Filter, &mut runner).is_err());
        assert!(h.store.exists(&ArtifactNames::links_final(DOMAIN)));
        assert!(!h.store.exists(&ArtifactNames::links(DOMAIN)));
    }

    #[test]
    fn test_filter_without_uro_output_writes_empty_list() {
        let mut h = Harness::new();
        h.store
            .write_lines(&ArtifactNames::links_final(DOMAIN), &["https://example.com/a"])
            .unwrap();
        let mut runner = ScriptedRunner::new().no_output_file("uro");

        let report = h.run(Stage::Filter, &mut runner).unwrap();
        assert_eq!(report.records, 0);
        assert!(runner.called("uro"));
        assert!(h.lines(&ArtifactNames::links(DOMAIN)).is_empty());
        assert!(!h.store.exists(&ArtifactNames::links_final(DOMAIN)));
    }

    #[test]
    fn test_split_merges_buckets_in_order() {
        let mut h = Harness::new();
        h.store
            .write_lines(
                &ArtifactNames::links(DOMAIN),
                &[
                    "https://example.com/about",
                    "https://example.com/index.php?id=1",
                    "https://example.com/login.php",
                ],
            )
            .unwrap();
        let mut runner = ScriptedRunner::new()
            .reply("arjun", &["https://example.com/login.php?user=x&pass=y"]);

        let report = h.run(Stage::Split, &mut runner).unwrap();
        assert_eq!(report.records, 3);
        assert_eq!(
            h.lines(URLS_READY),
            vec![
                "https://example.com/index.php?id=1",
                "https://example.com/login.php?user=x&pass=y",
                "https://example.com/about",
            ]
        );
        for name in [ARJUN_INPUT, ARJUN_OUTPUT] {
            assert!(!h.store.exists(name));
        }
        assert!(!h.store.exists(&ArtifactNames::links(DOMAIN)));
    }

    #[test]
    fn test_split_skips_arjun_without_candidates() {
        let mut h = Harness::new();
        h.store
            .write_lines(&ArtifactNames::links(DOMAIN), &["https://example.com/a.php?x=1"])
            .unwrap();
        let mut runner = ScriptedRunner::new();
        h.run(Stage::Split, &mut runner).unwrap();
        assert!(!runner.called("arjun"));
        assert_eq!(h.lines(URLS_READY), vec!["https://example.com/a.php?x=1"]);
    }

    #[test]
    fn test_targets_keep_passthrough() {
        let mut h = Harness::new();
        h.store
            .write_lines(
                URLS_READY,
                &[
                    "https://example.com/p?ref=home",
                    "https://example.com/p?search=x",
                    "https://example.com/about",
                ],
            )
            .unwrap();
        let mut runner = ScriptedRunner::new();

        let report = h.run(Stage::Target, &mut runner).unwrap();
        assert_eq!(report.records, 1);
        assert_eq!(
            h.lines(&ArtifactNames::query(DOMAIN)),
            vec!["https://example.com/p?search=x"]
        );
        assert_eq!(h.lines(&ArtifactNames::all_links(DOMAIN)).len(), 3);
        assert!(runner.calls.is_empty());
    }

    #[test]
    fn test_target_read_failure_is_unexpected() {
        let mut h = Harness::new();
        std::fs::write(h.dir.path().join(URLS_READY), [0xff, 0xfe, b'\n']).unwrap();
        let mut runner = ScriptedRunner::new();

        let err = h.run(Stage::Target, &mut runner).unwrap_err();
        assert!(matches!(err, PipelineError::Unexpected(_)));
        assert!(Stage::Target.remediation(&err).starts_with("Error: "));
        assert!(!h.store.exists(&ArtifactNames::query(DOMAIN)));
    }

    #[test]
    fn test_injection_aborts_without_payloads() {
        let mut h = Harness::new();
        h.store.write_raw("xss-checker", "#!/bin/sh\n").unwrap();
        h.store
            .write_lines(&ArtifactNames::query(DOMAIN), &["https://example.com/?q=1"])
            .unwrap();
        let mut runner = ScriptedRunner::new();

        let err = h.run(Stage::Inject, &mut runner).unwrap_err();
        match err {
            PipelineError::MissingDependency { path, .. } => {
                assert_eq!(path, h.dir.path().join("payloads.txt"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(runner.calls.is_empty());
    }

    #[test]
    fn test_injection_passes_fixed_arguments() {
        let mut h = Harness::new();
        h.store.write_raw("xss-checker", "#!/bin/sh\n").unwrap();
        h.store.write_lines("payloads.txt", &["<script>alert(1)</script>"]).unwrap();
        h.store
            .write_lines(&ArtifactNames::query(DOMAIN), &["https://example.com/?q=1"])
            .unwrap();
        let mut runner = ScriptedRunner::new();

        h.run(Stage::Inject, &mut runner).unwrap();
        let call = runner.call("xss-checker").unwrap();
        assert_eq!(call.program, "./xss-checker");
        assert!(call.stream_output);
        assert!(call.args.contains(&"--shuffle".to_string()));
        let threads = call.args.iter().position(|a| a == "--threads").unwrap();
        assert_eq!(call.args[threads + 1], "9");
    }
}

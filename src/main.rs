// main.rs - xssrecon
// Purpose: Menu-driven recon pipeline: subdomain enumeration, crawling, URL filtering,
//          parameter discovery and XSS probing through external tools

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::io;

mod artifacts;
mod config;
mod error;
mod extract;
mod filters;
mod invoker;
mod menu;
mod metrics;
mod pipeline;
mod progress;
mod session;
mod stages;
mod tools;

use config::{ChainPolicy, PipelineConfig};
use extract::ExtractorKind;
use invoker::SystemRunner;
use pipeline::Pipeline;

/// xssrecon - menu-driven XSS reconnaissance pipeline
#[derive(Parser, Debug)]
#[command(
    name = "xssrecon",
    version = "0.1.0",
    about = "Chain subdomain enumeration, crawling, filtering and XSS probing tools",
    long_about = r#"
xssrecon walks a target through six stages, each feeding the next:

  3  Enumerate and filter domains    subfinder, amass, assetfinder -> httprobe
  4  Crawl and filter URLs           gospider, hakrawler, katana, waybackurls, gau
  5  Filtering all                   extension/domain filters -> uro
  6  Parameter discovery split       arjun on .php/.asp/.aspx/.jsp pages
  7  XSS target preparation          URLs with interesting parameters
  8  xss0r RUN                       ./xss-checker with payloads.txt

OUTPUT FILES (working directory):

  {domain}-domains.txt      live hosts
  {domain}-links-final.txt  every crawled URL
  {domain}-links-clean.txt  URLs after extension/domain filters
  {domain}-links.txt        de-duplicated URLs
  urls-ready.txt            URLs after parameter discovery
  {domain}-query.txt        XSS targets
  {domain}-ALL-links.txt    every URL handed to stage 7
  {domain}-metrics.json     run counts and timings
  error.log                 failed steps
  progress.jsonl            structured progress events
"#
)]
struct Args {
    /// Target domain to preset (same as menu option 2)
    #[arg(short, long, value_name = "DOMAIN", help_heading = "Target Options")]
    domain: Option<String>,

    /// Directory for artifacts, logs, the probe and payloads
    #[arg(short, long, default_value = ".", value_name = "DIR", help_heading = "Target Options")]
    workdir: String,

    /// URL extraction strategy for crawler output
    #[arg(long, value_enum, default_value = "permissive", help_heading = "Pipeline")]
    extractor: ExtractorKind,

    /// Chain from stage 3 to stage 4 without asking
    #[arg(short, long, help_heading = "Pipeline")]
    yes: bool,

    /// Run only the selected stage, never chain to the next one
    #[arg(long, conflicts_with = "yes", help_heading = "Pipeline")]
    no_chain: bool,

    /// Injection probe executable inside the working directory
    #[arg(long, default_value = "xss-checker", value_name = "FILE", help_heading = "XSS Probe")]
    probe: String,

    /// Payload list handed to the probe
    #[arg(long, default_value = "payloads.txt", value_name = "FILE", help_heading = "XSS Probe")]
    payloads: String,

    /// Worker threads passed to the probe
    #[arg(long, default_value = "9", value_name = "NUM", help_heading = "XSS Probe")]
    threads: usize,

    /// Skip the startup banner
    #[arg(long, help_heading = "Output")]
    no_banner: bool,
}

impl Args {
    fn to_config(&self) -> Result<PipelineConfig> {
        let chain = if self.no_chain {
            ChainPolicy::Never
        } else if self.yes {
            ChainPolicy::Always
        } else {
            ChainPolicy::Ask
        };

        Ok(PipelineConfig {
            workdir: PipelineConfig::resolve_workdir(&self.workdir)?,
            extractor: self.extractor,
            chain,
            probe: self.probe.clone(),
            payloads: self.payloads.clone(),
            threads: self.threads,
        })
    }
}

fn print_banner() {
    println!("{}", "═══════════════════════════════════════════════════════════════".red().bold());
    println!("{}", "  XSSRECON - subdomains → URLs → parameters → XSS".red().bold());
    println!("{}", "═══════════════════════════════════════════════════════════════".red().bold());
}

fn main() -> Result<()> {
    let args = Args::parse();

    if !args.no_banner {
        print_banner();
    }

    let config = args.to_config().context("Invalid configuration")?;
    println!("{}", format!("[*] Working directory: {}", config.workdir.display()).cyan());

    let runner = SystemRunner::new(config.workdir.clone());
    let mut pipeline = Pipeline::new(config, runner);
    println!("{}", format!("[*] Session ID: {}", pipeline.session_id()).cyan());

    if let Some(domain) = &args.domain {
        pipeline
            .set_domain(domain)
            .with_context(|| format!("Invalid --domain value: {:?}", domain))?;
        println!("{}", format!("[+] Domain name set to {}", domain.trim()).green());
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    menu::run_menu(&mut pipeline, &mut input)?;

    if let Some(metrics) = pipeline.metrics() {
        metrics.print_summary();
    }

    Ok(())
}

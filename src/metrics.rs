use chrono::{DateTime, Utc};
use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Counts and timings collected while running the pipeline for one domain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetrics {
    pub run_id: String,
    pub target: String,
    pub start_time: DateTime<Utc>,
    pub last_update: DateTime<Utc>,

    // Stage 3
    pub raw_subdomains: usize,
    pub unique_subdomains: usize,
    pub live_hosts: usize,

    // Stage 4
    pub urls_per_crawler: BTreeMap<String, usize>,
    pub total_crawled_urls: usize,

    // Stage 5
    pub urls_after_extension_filter: usize,
    pub urls_after_domain_filter: usize,
    pub filtered_urls: usize,

    // Stage 6
    pub query_urls: usize,
    pub discovery_candidates: usize,
    pub discovered_param_urls: usize,
    pub unclassified_urls: usize,

    // Stage 7
    pub passthrough_urls: usize,
    pub param_urls: usize,
    pub xss_targets: usize,

    pub stage_durations: BTreeMap<u8, f64>,
    pub tool_failures: Vec<String>,
}

impl RunMetrics {
    pub fn new(target: &str) -> Self {
        let now = Utc::now();
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            target: target.to_string(),
            start_time: now,
            last_update: now,
            raw_subdomains: 0,
            unique_subdomains: 0,
            live_hosts: 0,
            urls_per_crawler: BTreeMap::new(),
            total_crawled_urls: 0,
            urls_after_extension_filter: 0,
            urls_after_domain_filter: 0,
            filtered_urls: 0,
            query_urls: 0,
            discovery_candidates: 0,
            discovered_param_urls: 0,
            unclassified_urls: 0,
            passthrough_urls: 0,
            param_urls: 0,
            xss_targets: 0,
            stage_durations: BTreeMap::new(),
            tool_failures: Vec::new(),
        }
    }

    pub fn record_stage_duration(&mut self, stage: u8, seconds: f64) {
        self.stage_durations.insert(stage, seconds);
        self.last_update = Utc::now();
    }

    pub fn record_tool_failure(&mut self, tool: &str) {
        self.tool_failures.push(tool.to_string());
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Run ID: {}\nTarget: {}\n\
             - Subdomains (raw/unique/live): {}/{}/{}\n\
             - Crawled URLs: {}\n\
             - Filtered URLs: {}\n\
             - Query / candidate / other: {}/{}/{}\n\
             - XSS targets: {} (of {} parameterised, {} total)\n",
            self.run_id,
            self.target,
            self.raw_subdomains,
            self.unique_subdomains,
            self.live_hosts,
            self.total_crawled_urls,
            self.filtered_urls,
            self.query_urls,
            self.discovery_candidates,
            self.unclassified_urls,
            self.xss_targets,
            self.param_urls,
            self.passthrough_urls
        );

        if !self.tool_failures.is_empty() {
            summary.push_str(&format!("- Failed tools: {}\n", self.tool_failures.join(", ")));
        }

        summary
    }

    pub fn print_summary(&self) {
        println!("\n{}", "═══════════════════════════════════════════════════════════════".green().bold());
        println!("{}", format!("  RUN SUMMARY: {}", self.target).green().bold());
        println!("{}", "═══════════════════════════════════════════════════════════════".green().bold());
        for line in self.summary().lines() {
            println!("{}", format!("  {}", line).cyan());
        }
        let total: f64 = self.stage_durations.values().sum();
        println!("{}", format!("  Time spent in stages: {:.2}s", total).cyan());
        println!("{}", "═══════════════════════════════════════════════════════════════".green().bold());
    }
}

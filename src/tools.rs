// tools.rs - External tool catalog and discovery
// Purpose: Locate the recon binaries the pipeline depends on and report their status

use colored::*;
use std::path::PathBuf;

/// Tool definition with installation info
pub struct ToolInfo {
    pub name: &'static str,
    pub binary: &'static str,
    pub description: &'static str,
    pub stage: u8,
    pub install_cmd: &'static str,
}

/// Every external tool used by stages 3-8
pub fn get_tools_list() -> Vec<ToolInfo> {
    vec![
        ToolInfo {
            name: "subfinder",
            binary: "subfinder",
            description: "Passive subdomain discovery",
            stage: 3,
            install_cmd: "go install -v github.com/projectdiscovery/subfinder/v2/cmd/subfinder@latest",
        },
        ToolInfo {
            name: "amass",
            binary: "amass",
            description: "Passive subdomain discovery (OWASP)",
            stage: 3,
            install_cmd: "apt-get install -y amass || go install -v github.com/owasp-amass/amass/v4/...@master",
        },
        ToolInfo {
            name: "assetfinder",
            binary: "assetfinder",
            description: "Passive subdomain discovery",
            stage: 3,
            install_cmd: "go install github.com/tomnomnom/assetfinder@latest",
        },
        ToolInfo {
            name: "httprobe",
            binary: "httprobe",
            description: "Liveness probe for HTTP/HTTPS hosts",
            stage: 3,
            install_cmd: "go install github.com/tomnomnom/httprobe@latest",
        },
        ToolInfo {
            name: "gospider",
            binary: "gospider",
            description: "Web spider",
            stage: 4,
            install_cmd: "go install github.com/jaeles-project/gospider@latest",
        },
        ToolInfo {
            name: "hakrawler",
            binary: "hakrawler",
            description: "URL discovery crawler",
            stage: 4,
            install_cmd: "go install github.com/hakluke/hakrawler@latest",
        },
        ToolInfo {
            name: "katana",
            binary: "katana",
            description: "Next-generation crawler",
            stage: 4,
            install_cmd: "go install github.com/projectdiscovery/katana/cmd/katana@latest",
        },
        ToolInfo {
            name: "waybackurls",
            binary: "waybackurls",
            description: "Wayback Machine URL fetcher",
            stage: 4,
            install_cmd: "go install github.com/tomnomnom/waybackurls@latest",
        },
        ToolInfo {
            name: "gau",
            binary: "gau",
            description: "Known URLs from public archives",
            stage: 4,
            install_cmd: "go install github.com/lc/gau/v2/cmd/gau@latest",
        },
        ToolInfo {
            name: "uro",
            binary: "uro",
            description: "Similar URL de-duplication",
            stage: 5,
            install_cmd: "pipx install uro",
        },
        ToolInfo {
            name: "arjun",
            binary: "arjun",
            description: "HTTP parameter discovery",
            stage: 6,
            install_cmd: "pipx install arjun",
        },
    ]
}

/// Install hint for a tool name, if it is part of the catalog
pub fn install_hint(binary: &str) -> Option<&'static str> {
    get_tools_list()
        .into_iter()
        .find(|t| t.binary == binary)
        .map(|t| t.install_cmd)
}

fn get_common_tool_paths() -> Vec<PathBuf> {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/root".to_string());
    let gopath = std::env::var("GOPATH").unwrap_or_else(|_| format!("{}/go", home));

    vec![
        PathBuf::from(format!("{}/bin", gopath)),
        PathBuf::from(format!("{}/go/bin", home)),
        PathBuf::from("/usr/local/go/bin"),
        PathBuf::from(format!("{}/.cargo/bin", home)),
        PathBuf::from("/usr/local/bin"),
        PathBuf::from("/usr/bin"),
        PathBuf::from("/usr/sbin"),
        PathBuf::from("/bin"),
        PathBuf::from("/sbin"),
        PathBuf::from("/snap/bin"),
        // pipx / pip user installs (uro, arjun)
        PathBuf::from(format!("{}/.local/bin", home)),
        PathBuf::from("/opt/tools"),
        PathBuf::from("/opt/bin"),
    ]
}

/// Search PATH and the usual tool directories for an executable
pub fn discover_tool_path(binary: &str) -> Option<PathBuf> {
    let path_dirs = std::env::var_os("PATH")
        .map(|p| std::env::split_paths(&p).collect::<Vec<_>>())
        .unwrap_or_default();

    for dir in path_dirs.into_iter().chain(get_common_tool_paths()) {
        let candidate = dir.join(binary);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }

    None
}

fn is_executable(candidate: &std::path::Path) -> bool {
    if !candidate.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(candidate) {
            Ok(metadata) => metadata.permissions().mode() & 0o111 != 0,
            Err(_) => false,
        }
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Check and display status of all tools; returns how many are missing
pub fn check_tools_status() -> usize {
    println!("{}", "╔══════════════════════════════════════════════════════════════════════════════╗".cyan().bold());
    println!("{}", "║                          XSSRECON - TOOL STATUS CHECK                        ║".cyan().bold());
    println!("{}", "╚══════════════════════════════════════════════════════════════════════════════╝".cyan().bold());
    println!("{}", "[*] Searching PATH and common tool directories...".cyan());

    let tools = get_tools_list();
    let mut missing = 0;

    for tool in &tools {
        match discover_tool_path(tool.binary) {
            Some(path) => {
                println!(
                    "    {} {:<12} {} {}",
                    "✓".green(),
                    tool.name.green(),
                    format!("[stage {}]", tool.stage).dimmed(),
                    path.display().to_string().dimmed()
                );
            }
            None => {
                missing += 1;
                println!(
                    "    {} {:<12} {} {}",
                    "✗".red(),
                    tool.name.red(),
                    format!("[stage {}]", tool.stage).dimmed(),
                    tool.description
                );
                println!("{}", format!("      Install: {}", tool.install_cmd).yellow());
            }
        }
    }

    println!();
    if missing == 0 {
        println!("{}", format!("[+] All {} tools found.", tools.len()).green().bold());
    } else {
        println!(
            "{}",
            format!("[!] {}/{} tools missing; their steps will fail until installed.", missing, tools.len()).yellow()
        );
    }

    missing
}

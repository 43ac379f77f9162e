// menu.rs - Interactive numbered menu
// Purpose: Read choices 1-10, dispatch to the pipeline driver, keep the loop alive on failure

use anyhow::{Context, Result};
use colored::*;
use std::io::{BufRead, Write};

use crate::error::{PipelineError, PipelineResult};
use crate::invoker::ToolRunner;
use crate::pipeline::Pipeline;
use crate::stages::Stage;
use crate::tools::check_tools_status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    CheckTools,
    SetDomain,
    Run(Stage),
    Exit,
    VpsHelp,
    Unknown(i64),
}

pub fn parse_choice(input: &str) -> PipelineResult<MenuChoice> {
    let n: i64 = input
        .trim()
        .parse()
        .map_err(|_| PipelineError::InvalidInput(format!("'{}' is not a number", input.trim())))?;

    let choice = match n {
        1 => MenuChoice::CheckTools,
        2 => MenuChoice::SetDomain,
        9 => MenuChoice::Exit,
        10 => MenuChoice::VpsHelp,
        other => match u8::try_from(other).ok().and_then(Stage::from_number) {
            Some(stage) => MenuChoice::Run(stage),
            None => MenuChoice::Unknown(other),
        },
    };
    Ok(choice)
}

pub fn display_options() {
    println!("{}", "Please select an option:".blue().bold());
    println!("{}", "1: Check installed tools".red());
    println!("{}", "2: Enter a domain name of the target".red());
    for stage in Stage::ALL {
        println!("{}", format!("{}: {}", stage.number(), stage.title()).yellow());
    }
    println!("{}", "9: Exit".yellow());
    println!("{}", "10: VPS server xss0r help".yellow());
}

fn print_status<R: ToolRunner>(pipeline: &Pipeline<R>) {
    let domain = pipeline.session().domain().unwrap_or("-");
    println!(
        "{}",
        format!(
            "[*] Target: {} | State: {} (last completed option: {})",
            domain,
            pipeline.state(),
            pipeline.session().last_completed_stage()
        )
        .cyan()
    );
}

fn print_vps_help<R: ToolRunner>(pipeline: &Pipeline<R>) {
    let config = pipeline.config();
    println!("{}", "─── RUNNING ON A VPS ───".cyan().bold());
    println!("  • Start a persistent session first: tmux new -s xss0r");
    println!("  • Detach with Ctrl-b d, reattach with: tmux attach -t xss0r");
    println!(
        "  • Place {} and {} in {}",
        config.probe,
        config.payloads,
        config.workdir.display()
    );
    println!("  • Make the probe executable: chmod +x {}", config.probe);
    println!(
        "  • The probe runs with {} threads; lower --threads on small instances",
        config.threads
    );
    println!("  • Failed steps are listed in error.log, progress in progress.jsonl");
}

/// Prints `prompt` and reads one trimmed line; `None` on end of input
fn prompt_line(input: &mut dyn BufRead, prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    let read = input.read_line(&mut line).context("Failed to read from stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Empty answer means yes
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes")
}

/// Menu loop; returns on option 9 or end of input
/// Chaining is decided by the pipeline's `ChainPolicy`; `input` only answers its questions.
pub fn run_menu<R: ToolRunner>(
    pipeline: &mut Pipeline<R>,
    input: &mut dyn BufRead,
) -> Result<()> {
    loop {
        print_status(pipeline);
        display_options();

        let Some(raw) = prompt_line(input, "Enter your choice [1-10]: ")? else {
            println!("Exiting...");
            return Ok(());
        };

        let choice = match parse_choice(&raw) {
            Ok(choice) => choice,
            Err(_) => {
                println!("{}", "Please enter a valid number".yellow());
                continue;
            }
        };

        match choice {
            MenuChoice::CheckTools => {
                check_tools_status();
            }
            MenuChoice::SetDomain => {
                let Some(name) = prompt_line(input, "Please enter a domain name (example.com): ")? else {
                    return Ok(());
                };
                match pipeline.set_domain(&name) {
                    Ok(()) => println!("{}", format!("Domain name set to {}", name).white().bold()),
                    Err(e) => println!("{}", format!("[!] {}", e).yellow()),
                }
            }
            MenuChoice::Run(stage) => {
                let mut confirm = |question: &str| -> bool {
                    match prompt_line(input, &question.white().bold().to_string()) {
                        Ok(Some(answer)) => is_affirmative(&answer),
                        _ => false,
                    }
                };
                pipeline.run_from(stage, &mut confirm);
            }
            MenuChoice::Exit => {
                println!("Exiting...");
                return Ok(());
            }
            MenuChoice::VpsHelp => print_vps_help(pipeline),
            MenuChoice::Unknown(n) => {
                println!("{}", format!("Option {} does not exist; choose 1-10.", n).yellow());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChainPolicy, PipelineConfig};
    use crate::invoker::testing::ScriptedRunner;
    use crate::session::PipelineState;
    use std::io::Cursor;

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("1").unwrap(), MenuChoice::CheckTools);
        assert_eq!(parse_choice(" 2\n").unwrap(), MenuChoice::SetDomain);
        assert_eq!(parse_choice("5").unwrap(), MenuChoice::Run(Stage::Filter));
        assert_eq!(parse_choice("9").unwrap(), MenuChoice::Exit);
        assert_eq!(parse_choice("10").unwrap(), MenuChoice::VpsHelp);
        assert_eq!(parse_choice("42").unwrap(), MenuChoice::Unknown(42));
        assert_eq!(parse_choice("-3").unwrap(), MenuChoice::Unknown(-3));
        assert!(matches!(parse_choice("abc"), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative(""));
        assert!(is_affirmative("Y"));
        assert!(is_affirmative("yes"));
        assert!(!is_affirmative("n"));
    }

    #[test]
    fn test_menu_sets_domain_and_survives_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = Pipeline::new(
            PipelineConfig::with_workdir(dir.path().to_path_buf()),
            ScriptedRunner::new(),
        );
        let mut input = Cursor::new("abc\n4\n2\nexample.com\n77\n9\n");
        run_menu(&mut pipeline, &mut input).unwrap();
        assert_eq!(pipeline.session().domain(), Some("example.com"));
        assert_eq!(pipeline.state(), PipelineState::DomainSet);
    }

    #[test]
    fn test_menu_runs_stage_and_reads_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new()
            .reply("subfinder", &["a.example.com"])
            .echo("httprobe");
        let mut pipeline = Pipeline::new(
            PipelineConfig::with_workdir(dir.path().to_path_buf()),
            runner,
        );
        let mut input = Cursor::new("2\nexample.com\n3\nn\n9\n");
        run_menu(&mut pipeline, &mut input).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Enumerated);
    }

    #[test]
    fn test_always_policy_chains_without_reading_answers() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::with_workdir(dir.path().to_path_buf());
        config.chain = ChainPolicy::Always;
        let runner = ScriptedRunner::new()
            .reply("subfinder", &["a.example.com"])
            .echo("httprobe")
            .reply("gospider", &["https://a.example.com/search?q=1"]);
        let mut pipeline = Pipeline::new(config, runner);

        // the line after "3" is the next menu choice, not a chaining answer
        let mut input = Cursor::new("2\nexample.com\n3\n9\n");
        run_menu(&mut pipeline, &mut input).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Targeted);
    }

    #[test]
    fn test_menu_exits_on_end_of_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = Pipeline::new(
            PipelineConfig::with_workdir(dir.path().to_path_buf()),
            ScriptedRunner::new(),
        );
        let mut input = Cursor::new("");
        assert!(run_menu(&mut pipeline, &mut input).is_ok());
    }
}

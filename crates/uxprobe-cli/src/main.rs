//! uxprobe CLI - headless page verification for the local web app
//!
//! Usage:
//!   uxprobe                       Run every built-in scenario
//!   uxprobe list                  List built-in scenarios
//!   uxprobe run <scenario>...     Run selected scenarios
//!   uxprobe run-file <plan.toml>  Run a verification described in TOML
//!   uxprobe config                Print the effective configuration

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uxprobe_browser::{BrowserConfig, Scenario, VerificationRunner};
use uxprobe_core::{ProbeConfig, RunOutcome, RunReport, VerificationRun};

#[derive(Parser, Debug)]
#[command(name = "uxprobe")]
#[command(author, version, about = "Headless browser checks for the local web app")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Application URL, overrides the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Where screenshots are written
    #[arg(long, global = true, value_name = "DIR")]
    screenshot_dir: Option<PathBuf>,

    /// Working directory of the application (for fixture files)
    #[arg(long, global = true, value_name = "DIR")]
    app_root: Option<PathBuf>,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    /// Attach to a Chrome already listening on this DevTools port
    #[arg(long, global = true, value_name = "PORT")]
    connect: Option<u16>,

    /// Write run reports as JSON to this file
    #[arg(long, global = true, value_name = "FILE")]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List built-in scenarios
    List,

    /// Run built-in scenarios
    Run {
        /// Scenario names (see `uxprobe list`)
        #[arg(required_unless_present = "all")]
        scenarios: Vec<String>,

        /// Run every built-in scenario
        #[arg(long, conflicts_with = "scenarios")]
        all: bool,
    },

    /// Run a verification described in a TOML file
    RunFile {
        /// Plan file
        plan: PathBuf,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli)?;

    match &cli.command {
        None => cmd_run(&config, Scenario::ALL.to_vec(), cli.report.as_deref()).await,
        Some(Commands::List) => cmd_list(),
        Some(Commands::Run { scenarios, all }) => {
            let selected = if *all {
                Scenario::ALL.to_vec()
            } else {
                parse_scenarios(scenarios)?
            };
            cmd_run(&config, selected, cli.report.as_deref()).await
        }
        Some(Commands::RunFile { plan }) => cmd_run_file(&config, plan, cli.report.as_deref()).await,
        Some(Commands::Config) => cmd_config(&config),
    }
}

/// Load the config file (if any) and apply command-line overrides
fn load_config(cli: &Cli) -> Result<ProbeConfig> {
    let mut config = ProbeConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(dir) = &cli.screenshot_dir {
        config.screenshot_dir = dir.clone();
    }
    if let Some(dir) = &cli.app_root {
        config.app_root = dir.clone();
    }
    if cli.headed {
        config.browser.headless = false;
    }
    if let Some(port) = cli.connect {
        config.browser.connect_port = Some(port);
    }

    config.validate().context("Invalid command-line override")?;
    Ok(config)
}

fn parse_scenarios(names: &[String]) -> Result<Vec<Scenario>> {
    names
        .iter()
        .map(|name| {
            name.parse::<Scenario>()
                .with_context(|| "Run 'uxprobe list' to see available scenarios")
        })
        .collect()
}

fn cmd_list() -> Result<()> {
    println!("Built-in scenarios");
    println!("==================");
    for scenario in Scenario::ALL {
        println!("  {:<14} {}", scenario.name(), scenario.description());
    }
    Ok(())
}

fn cmd_config(config: &ProbeConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

async fn cmd_run(config: &ProbeConfig, scenarios: Vec<Scenario>, report_path: Option<&Path>) -> Result<()> {
    let runner = &VerificationRunner::from_config(config);
    let mut reports = Vec::with_capacity(scenarios.len());

    for scenario in scenarios {
        info!("Scenario {}: {}", scenario, scenario.description());

        let report = scenario
            .plan(config)
            .execute(|run| async move {
                runner
                    .run_in_browser(BrowserConfig::from(&config.browser), &run)
                    .await
            })
            .await;
        reports.push(report);
    }

    finish(&reports, report_path)
}

async fn cmd_run_file(config: &ProbeConfig, plan: &Path, report_path: Option<&Path>) -> Result<()> {
    let run = load_plan(config, plan)?;
    let runner = VerificationRunner::from_config(config);
    let report = runner
        .run_in_browser(BrowserConfig::from(&config.browser), &run)
        .await;

    finish(&[report], report_path)
}

/// Read a plan file; relative URLs are resolved against the configured base URL
fn load_plan(config: &ProbeConfig, path: &Path) -> Result<VerificationRun> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan {}", path.display()))?;
    let mut run: VerificationRun = toml::from_str(&content)
        .with_context(|| format!("Failed to parse plan {}", path.display()))?;

    if run.url.starts_with('/') {
        run.url = config.url_for(&run.url);
    }
    Ok(run.with_screenshot_dir(&config.screenshot_dir))
}

/// Print a summary, write the JSON report and turn failures into a non-zero exit
fn finish(reports: &[RunReport], report_path: Option<&Path>) -> Result<()> {
    println!();
    for report in reports {
        println!("{}", summary_line(report));
    }

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(reports)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        println!("\nReport written to {}", path.display());
    }

    let failed = reports.iter().filter(|r| !r.passed()).count();
    if failed > 0 {
        bail!("{} of {} verification(s) failed", failed, reports.len());
    }
    println!("\nAll {} verification(s) passed", reports.len());
    Ok(())
}

fn summary_line(report: &RunReport) -> String {
    let screenshot = report
        .screenshot
        .as_ref()
        .map(|s| format!(" [{}]", s.path.display()))
        .unwrap_or_default();

    match &report.outcome {
        RunOutcome::Passed => format!(
            "PASS {} ({} steps){}",
            report.name, report.steps_completed, screenshot
        ),
        RunOutcome::Failed {
            step: Some(step),
            reason,
        } => format!(
            "FAIL {} at step {}/{}: {}{}",
            report.name,
            step + 1,
            report.steps_total,
            reason,
            screenshot
        ),
        RunOutcome::Failed { step: None, reason } => {
            format!("FAIL {}: {}{}", report.name, reason, screenshot)
        }
    }
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use triagegraph::graph::{AnalysisGraph, Dependency, Issue, IssueType, Status};
use triagegraph::harness::CancellationToken;
use triagegraph::feedback::NoWeightFeedback;
use triagegraph::history::NoHistoryProvider;
use triagegraph::{analyze_sync, build_report, load_issues, save_issues, Config};

const ISSUES_FILE: &str = "issues.jsonl";
const CONFIG_FILE: &str = "config.toml";

#[derive(Parser)]
#[command(name = "wg")]
#[command(about = "Triage-grade dependency analytics over issue graphs")]
#[command(version)]
struct Cli {
    /// Path to the triagegraph directory (default: .triagegraph in current dir)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Output as JSON for machine consumption
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new triagegraph directory with an empty issue set
    Init,

    /// Add a new issue
    Add {
        /// Issue title
        title: String,

        /// Issue ID (auto-generated if not provided)
        #[arg(long)]
        id: Option<String>,

        /// Issue priority: 0 (highest) to 4 (lowest)
        #[arg(long, default_value = "2")]
        priority: u8,

        /// This issue is blocked by another issue (repeatable)
        #[arg(long = "blocked-by")]
        blocked_by: Vec<String>,
    },

    /// Load the issue set, run analysis, and print the triage report
    Analyze,
}

fn resolve_dir(dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(|| PathBuf::from(".triagegraph"))
}

fn issues_path(dir: &Path) -> PathBuf {
    dir.join(ISSUES_FILE)
}

fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

fn run_init(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = issues_path(dir);
    if !path.exists() {
        save_issues(&[], &path).context("writing empty issue set")?;
    }
    println!("Initialized triagegraph in {}", dir.display());
    Ok(())
}

fn next_id(issues: &[Issue]) -> String {
    let max = issues
        .iter()
        .filter_map(|i| i.id.strip_prefix("issue-"))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("issue-{}", max + 1)
}

fn run_add(dir: &Path, title: String, id: Option<String>, priority: u8, blocked_by: Vec<String>) -> Result<()> {
    let path = issues_path(dir);
    let mut issues = load_issues(&path).context("loading issue set")?;
    let id = id.unwrap_or_else(|| next_id(&issues));
    let now = Utc::now();
    issues.push(Issue {
        id: id.clone(),
        title,
        description: None,
        status: Status::Open,
        priority,
        issue_type: IssueType::Task,
        labels: vec![],
        estimated_minutes: None,
        content_hash: None,
        created_at: now,
        updated_at: now,
        closed_at: None,
        dependencies: blocked_by.into_iter().map(Dependency::blocking).collect(),
    });
    save_issues(&issues, &path).context("saving issue set")?;
    println!("Added {id}");
    Ok(())
}

async fn run_analyze(dir: &Path, json: bool) -> Result<()> {
    let issues = load_issues(issues_path(dir)).context("loading issue set")?;
    let config = Config::load(config_path(dir)).context("loading config")?;

    let start = std::time::Instant::now();
    let graph = AnalysisGraph::build(&issues)?;
    let stats = analyze_sync(&issues, config.analysis.clone(), CancellationToken::new()).await?;
    let phase2 = stats.try_phase2().unwrap_or_default();
    let compute_ms = start.elapsed().as_millis() as u64;

    let report = build_report(
        &issues,
        &graph,
        &phase2,
        &config,
        &NoHistoryProvider,
        &NoWeightFeedback,
        stats.phase2_ready(),
        compute_ms,
        Utc::now(),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Triage report for {} issue(s)", report.meta.issue_count);
        println!(
            "  open: {}  actionable: {}  blocked: {}",
            report.project_health.counts.open, report.project_health.counts.actionable, report.project_health.counts.blocked
        );
        if let Some(top) = report.quick_ref.top_picks.first() {
            println!("  top pick: {top}");
            println!("  {}", report.commands.claim_top);
        } else {
            println!("  no top pick available");
        }
        if let Some(alerts) = &report.alerts {
            for alert in alerts {
                println!("  alert: {alert}");
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let dir = resolve_dir(cli.dir);

    match cli.command.unwrap_or(Commands::Analyze) {
        Commands::Init => run_init(&dir),
        Commands::Add {
            title,
            id,
            priority,
            blocked_by,
        } => run_add(&dir, title, id, priority, blocked_by),
        Commands::Analyze => {
            let runtime = tokio::runtime::Runtime::new().context("starting runtime")?;
            runtime.block_on(run_analyze(&dir, cli.json))
        }
    }
}

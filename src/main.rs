use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use recap_core::{OutputFormat, RecapConfig};
use recap_history::bus_factor::{BusFactorReport, RiskTier, TierConfig};
use recap_history::churn::Hotspot;
use recap_history::experts::Expert;
use recap_history::identity::normalizer_for;
use recap_history::mining::{CommitRecord, GitRepository, MiningOptions};
use recap_history::recap::RecapSummary;
use recap_history::since::Since;
use recap_history::HistoryEngine;

#[derive(Parser)]
#[command(
    name = "recap",
    version,
    about = "Recap your git history: what changed, who knows it, and where knowledge is thin",
    long_about = "Recap mines a repository's commit history and answers three questions:\n\
                   which files churn the most, who knows a given file, and which files\n\
                   depend on a single person.\n\n\
                   Without a subcommand it summarizes your own recent commits.\n\n\
                   Examples:\n  \
                     recap                              Your commits from the last 24 hours\n  \
                     recap --author bob --since 7.days  Bob's commits from the last week\n  \
                     recap hotspots src --since 90      Highest-churn files under src/\n  \
                     recap who-knows src/parser.rs      Contributors ranked by ownership\n  \
                     recap bus-factor --threshold 60    Files dominated by one person"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Author to recap (default: git config user.name)
    #[arg(long)]
    author: Option<String>,

    /// Time window for the recap (default: "24 hours ago")
    #[arg(
        long,
        long_help = "Time window for the recap.\n\n\
                       Accepts \"all\", \"yesterday\", a number of days, \"<n> <unit>\" or\n\
                       \"<n>.<unit>\" with an optional \"ago\" (units: minutes, hours, days,\n\
                       weeks, months, years), a YYYY-MM-DD date, or an RFC 3339 timestamp."
    )]
    since: Option<String>,

    /// Print each recapped commit's patch against its first parent
    #[arg(long)]
    show_diff: bool,

    /// Repository to analyze
    #[arg(long, short = 'p', global = true, default_value = ".")]
    repo_path: PathBuf,

    /// Path to configuration file (default: .recap.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable tables and summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Rank files by churn (lines added + deleted)
    #[command(long_about = "Rank files by churn (lines added + deleted).\n\n\
        Files touched by many commits and many authors get an advisory note.\n\n\
        Examples:\n  recap hotspots\n  recap hotspots src/ --since 90 --limit 20")]
    Hotspots {
        /// Only consider files under this path
        path: Option<String>,

        /// Time window (default: [history] since, or all history)
        #[arg(long)]
        since: Option<String>,

        /// Maximum results to show (default: [output] limit)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Rank contributors to a file by ownership share
    #[command(long_about = "Rank contributors to a file by ownership share.\n\n\
        Ownership is each author's share of the file's total churn. The path must\n\
        match exactly; renames are not followed.\n\n\
        Examples:\n  recap who-knows src/main.rs")]
    WhoKnows {
        /// File path relative to the repository root
        path: String,
    },
    /// Classify files by bus-factor risk
    #[command(long_about = "Classify files by bus-factor risk.\n\n\
        high    the owner holds at least the threshold and nobody else has contributed\n\
        medium  the owner holds at least the threshold alongside other contributors\n\
        low     the owner's share falls in the band just below the threshold\n\n\
        Examples:\n  recap bus-factor\n  recap bus-factor src/ --threshold 60 --all")]
    BusFactor {
        /// Only consider files under this path
        path: Option<String>,

        /// Ownership percent that counts as concentrated, in (0, 100]
        #[arg(long)]
        threshold: Option<f64>,

        /// Also list files with no risk
        #[arg(long)]
        all: bool,
    },
    /// Create a default .recap.toml configuration file
    #[command(long_about = "Create a default .recap.toml configuration file.\n\n\
        Generates a template with every available option.\n\
        Fails if .recap.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

const CONFIG_FILE: &str = ".recap.toml";

const DEFAULT_CONFIG: &str = r#"# Recap Configuration

[history]
# Default window for `recap hotspots`
since = "all"
# Default window for the recap summary
recap_since = "24 hours ago"
# Skip commits touching more files than this (0 = unlimited)
max_files_per_commit = 0
# Diff merge commits against their first parent instead of skipping them
include_merges = false
# Walk this branch instead of HEAD
# branch = "main"

[bus_factor]
# Ownership percent at which a file counts as concentrated
high_cut = 80.0
# Width of the low-risk band below high_cut
low_band = 20.0

[identity]
# "exact" or "case-insensitive"
strategy = "exact"

[output]
# Maximum rows per table
limit = 10
"#;

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    match cli.command {
        Some(Command::Init) => return init_config(),
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "recap", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(cli.config.as_deref())?;
    debug!(format = %cli.format, repo = %cli.repo_path.display(), "configuration loaded");

    // Tier settings only matter to bus-factor; reject them before any history is read.
    let tiers = match cli.command {
        Some(Command::BusFactor { threshold, .. }) => {
            let configured = TierConfig::from_config(&config.bus_factor)?;
            Some(match threshold {
                Some(t) => configured.with_threshold(t)?,
                None => configured,
            })
        }
        _ => None,
    };

    let repo = GitRepository::open(&cli.repo_path)?;
    let options = MiningOptions {
        max_files_per_commit: (config.history.max_files_per_commit > 0)
            .then_some(config.history.max_files_per_commit),
        include_merges: config.history.include_merges,
        branch: config.history.branch.clone(),
        ..MiningOptions::default()
    };
    let mut engine = HistoryEngine::new(repo)
        .with_options(options)
        .with_normalizer(normalizer_for(config.identity.strategy));
    if let Some(tiers) = tiers {
        engine = engine.with_tiers(tiers);
    }

    match cli.command {
        None => {
            let window = cli
                .since
                .clone()
                .unwrap_or_else(|| config.history.recap_since.clone());
            let since = Since::parse(&window)?;
            let author = cli.author.clone().or_else(|| engine.source().user_name());
            if author.is_none() {
                warn!("no --author given and git config user.name is unset; showing all authors");
            }

            let spinner = start_spinner("Reading commits...", cli.format);
            let (commits, summary) = engine.recap(author.as_deref(), since)?;
            let diffs = if cli.show_diff {
                commits
                    .iter()
                    .map(|c| engine.source().commit_diff(&c.id))
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                Vec::new()
            };
            finish_spinner(spinner);

            let view = RecapView {
                author: author.as_deref(),
                window: &window,
                commits: &commits,
                diffs: &diffs,
                summary: &summary,
            };
            print_recap(cli.format, use_color, &view)?;
        }
        Some(Command::Hotspots {
            ref path,
            ref since,
            limit,
        }) => {
            let window = since.clone().unwrap_or_else(|| config.history.since.clone());
            let since = Since::parse(&window)?;
            let limit = limit.unwrap_or(config.output.limit);

            let spinner = start_spinner("Mining churn...", cli.format);
            let hotspots = engine.hotspots(since, path.as_deref())?;
            finish_spinner(spinner);

            print_hotspots(cli.format, use_color, &window, &hotspots, limit)?;
        }
        Some(Command::WhoKnows { ref path }) => {
            let spinner = start_spinner("Tallying ownership...", cli.format);
            let experts = engine.who_knows(path)?;
            finish_spinner(spinner);

            print_who_knows(cli.format, use_color, path, &experts)?;
        }
        Some(Command::BusFactor {
            ref path, all, ..
        }) => {
            let spinner = start_spinner("Classifying ownership...", cli.format);
            let findings = engine.bus_factor(path.as_deref(), None)?;
            finish_spinner(spinner);

            let threshold = tiers.unwrap_or_default().high_cut();
            let report = BusFactorReport::new(threshold, findings, all);
            print_bus_factor(cli.format, use_color, &report)?;
        }
        Some(Command::Init) | Some(Command::Completions { .. }) => {}
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("RECAP_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<RecapConfig> {
    let config = match explicit {
        Some(path) => RecapConfig::from_file(path)?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                RecapConfig::from_file(default_path)?
            } else {
                RecapConfig::default()
            }
        }
    };
    Ok(config)
}

fn init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);
    if path.exists() {
        miette::bail!(miette::miette!(
            help = "Edit the existing file, or remove it and run 'recap init' again",
            "{CONFIG_FILE} already exists"
        ));
    }
    std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
    println!("Created {CONFIG_FILE} with default configuration");
    Ok(())
}

fn start_spinner(message: &'static str, format: OutputFormat) -> Option<indicatif::ProgressBar> {
    if format.is_structured() || !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
    {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    Some(pb)
}

fn finish_spinner(spinner: Option<indicatif::ProgressBar>) {
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
}

fn paint(text: &str, code: &str, use_color: bool) -> String {
    if use_color {
        format!("\x1b[{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

fn tier_color(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::High => "1;31",
        RiskTier::Medium => "33",
        RiskTier::Low => "36",
        RiskTier::None => "32",
    }
}

fn to_datetime(timestamp: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
}

fn format_date(timestamp: i64) -> String {
    to_datetime(timestamp)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".into())
}

fn relative_time(timestamp: i64, now: DateTime<Utc>) -> String {
    let Some(then) = to_datetime(timestamp) else {
        return "unknown".into();
    };
    let elapsed = now.signed_duration_since(then);
    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("1 {unit} ago")
        } else {
            format!("{n} {unit}s ago")
        }
    };
    match elapsed.num_seconds() {
        s if s < 60 => "just now".into(),
        s if s < 3_600 => plural(elapsed.num_minutes(), "minute"),
        s if s < 86_400 => plural(elapsed.num_hours(), "hour"),
        s if s < 86_400 * 30 => plural(elapsed.num_days(), "day"),
        s if s < 86_400 * 365 => plural(elapsed.num_days() / 30, "month"),
        _ => plural(elapsed.num_days() / 365, "year"),
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

struct RecapView<'a> {
    author: Option<&'a str>,
    window: &'a str,
    commits: &'a [CommitRecord],
    /// One patch per commit when `--show-diff` is set, otherwise empty.
    diffs: &'a [String],
    summary: &'a RecapSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecapReport<'a> {
    author: Option<&'a str>,
    since: &'a str,
    summary: &'a RecapSummary,
    commits: Vec<CommitRow<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitRow<'a> {
    #[serde(flatten)]
    commit: &'a CommitRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff: Option<&'a str>,
}

fn print_recap(format: OutputFormat, use_color: bool, view: &RecapView<'_>) -> Result<()> {
    let RecapView {
        author,
        window,
        commits,
        diffs,
        summary,
    } = *view;
    let who = author.unwrap_or("all authors");
    let diff_of = |i: usize| diffs.get(i).map(String::as_str);
    match format {
        OutputFormat::Json => print_json(&RecapReport {
            author,
            since: window,
            summary,
            commits: commits
                .iter()
                .enumerate()
                .map(|(i, commit)| CommitRow {
                    commit,
                    diff: diff_of(i),
                })
                .collect(),
        })?,
        OutputFormat::Markdown => {
            println!("# Recap for {who}\n");
            println!("**Since:** {window}\n");
            if commits.is_empty() {
                println!("No commits found.\n");
            } else {
                println!("| Commit | Date | Message | Added | Deleted |");
                println!("|--------|------|---------|-------|---------|");
                for c in commits {
                    let added: u64 = c.files.iter().map(|f| f.added).sum();
                    let deleted: u64 = c.files.iter().map(|f| f.deleted).sum();
                    println!(
                        "| `{}` | {} | {} | {added} | {deleted} |",
                        c.id,
                        format_date(c.timestamp),
                        c.message.replace('|', "\\|"),
                    );
                }
                println!();
                for (i, c) in commits.iter().enumerate() {
                    if let Some(patch) = diff_of(i) {
                        println!("### `{}` {}\n", c.id, c.message);
                        println!("```diff\n{}```\n", patch);
                    }
                }
            }
            println!(
                "**Total:** {} commits, +{} -{} lines across {} files",
                summary.commits, summary.lines_added, summary.lines_deleted, summary.files_touched
            );
        }
        OutputFormat::Text => {
            println!("Recap for {who} (since {window}):");
            println!("{:-<72}", "");
            if commits.is_empty() {
                println!("  No commits found.");
            }
            for (i, c) in commits.iter().enumerate() {
                let added: u64 = c.files.iter().map(|f| f.added).sum();
                let deleted: u64 = c.files.iter().map(|f| f.deleted).sum();
                let when = to_datetime(c.timestamp)
                    .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "  {} {when}  {}  {} {}",
                    paint(&c.id, "33", use_color),
                    c.message,
                    paint(&format!("+{added}"), "32", use_color),
                    paint(&format!("-{deleted}"), "31", use_color),
                );
                if let Some(patch) = diff_of(i) {
                    print_patch(patch, use_color);
                }
            }
            println!("{:-<72}", "");
            println!(
                "  {} commits, +{} -{} lines, {} files touched",
                summary.commits, summary.lines_added, summary.lines_deleted, summary.files_touched
            );
        }
    }
    Ok(())
}

/// Indent a patch under its commit line, coloring added and removed lines.
fn print_patch(patch: &str, use_color: bool) {
    for line in patch.lines() {
        let code = if line.starts_with("+++") || line.starts_with("---") || line.starts_with("diff ") {
            "1"
        } else if line.starts_with('+') {
            "32"
        } else if line.starts_with('-') {
            "31"
        } else if line.starts_with("@@") {
            "36"
        } else {
            ""
        };
        if code.is_empty() {
            println!("      {line}");
        } else {
            println!("      {}", paint(line, code, use_color));
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HotspotRow<'a> {
    #[serde(flatten)]
    hotspot: &'a Hotspot,
    suggestion: Option<&'static str>,
}

fn print_hotspots(
    format: OutputFormat,
    use_color: bool,
    window: &str,
    hotspots: &[Hotspot],
    limit: usize,
) -> Result<()> {
    let top = &hotspots[..hotspots.len().min(limit)];
    match format {
        OutputFormat::Json => {
            let rows: Vec<HotspotRow<'_>> = top
                .iter()
                .map(|h| HotspotRow {
                    hotspot: h,
                    suggestion: h.suggestion(),
                })
                .collect();
            let mut json = serde_json::Map::new();
            json.insert("since".into(), serde_json::Value::from(window));
            json.insert(
                "filesAnalyzed".into(),
                serde_json::Value::from(hotspots.len()),
            );
            json.insert(
                "hotspots".into(),
                serde_json::to_value(&rows).into_diagnostic()?,
            );
            print_json(&serde_json::Value::Object(json))?;
        }
        OutputFormat::Markdown => {
            println!("# Hotspots\n");
            println!("**Since:** {window}\n");
            if top.is_empty() {
                println!("No changes found.\n");
                return Ok(());
            }
            println!("| Rank | File | Churn | Revisions | Authors | Last modified | Note |");
            println!("|------|------|-------|-----------|---------|---------------|------|");
            for (i, h) in top.iter().enumerate() {
                println!(
                    "| {} | `{}` | {} | {} | {} | {} | {} |",
                    i + 1,
                    h.path,
                    h.total_changes,
                    h.revisions,
                    h.contributors,
                    format_date(h.last_modified),
                    h.suggestion().unwrap_or(""),
                );
            }
            println!();
        }
        OutputFormat::Text => {
            println!("Hotspots (top {limit}, since {window}):");
            println!("{:-<72}", "");
            if top.is_empty() {
                println!("  No changes found.");
            }
            let now = Utc::now();
            for (i, h) in top.iter().enumerate() {
                println!(
                    "{:>2}. {:<40} churn={}  rev={}  authors={}  ({})",
                    i + 1,
                    h.path,
                    h.total_changes,
                    h.revisions,
                    h.contributors,
                    relative_time(h.last_modified, now),
                );
                if let Some(note) = h.suggestion() {
                    println!("    {}", paint(note, "33", use_color));
                }
            }
            println!();
        }
    }
    Ok(())
}

fn print_who_knows(
    format: OutputFormat,
    use_color: bool,
    path: &str,
    experts: &[Expert],
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let mut json = serde_json::Map::new();
            json.insert("path".into(), serde_json::Value::from(path));
            json.insert(
                "experts".into(),
                serde_json::to_value(experts).into_diagnostic()?,
            );
            print_json(&serde_json::Value::Object(json))?;
        }
        OutputFormat::Markdown => {
            println!("# Who knows `{path}`\n");
            if experts.is_empty() {
                println!("No history found for this path.\n");
                return Ok(());
            }
            println!("| Contributor | Ownership | Commits | First commit | Last commit |");
            println!("|-------------|-----------|---------|--------------|-------------|");
            for e in experts {
                println!(
                    "| {} | {:.1}% | {} | {} | {} |",
                    e.identity,
                    e.percent,
                    e.commits,
                    format_date(e.first_commit),
                    format_date(e.last_commit),
                );
            }
            println!();
        }
        OutputFormat::Text => {
            println!("Who knows {path}:");
            println!("{:-<72}", "");
            if experts.is_empty() {
                println!("  No history found for this path.");
            }
            let now = Utc::now();
            for (i, e) in experts.iter().enumerate() {
                println!(
                    "{:>2}. {:<40} {:>5.1}%",
                    i + 1,
                    paint(&e.identity.to_string(), "1", use_color),
                    e.percent,
                );
                println!(
                    "    {} commits, {} to {}, last touched {}",
                    e.commits,
                    format_date(e.first_commit),
                    format_date(e.last_commit),
                    relative_time(e.last_commit, now),
                );
            }
            println!();
        }
    }
    Ok(())
}

fn print_bus_factor(format: OutputFormat, use_color: bool, report: &BusFactorReport) -> Result<()> {
    let groups = [
        (RiskTier::High, "High risk (single contributor)"),
        (RiskTier::Medium, "Medium risk (dominant owner)"),
        (RiskTier::Low, "Low risk"),
        (RiskTier::None, "No risk"),
    ];
    let counts = report.counts;
    let threshold = report.threshold;

    match format {
        OutputFormat::Json => print_json(report)?,
        OutputFormat::Markdown => {
            println!("# Bus Factor\n");
            println!("- **Threshold:** {threshold}%");
            println!("- **High:** {}", counts.high);
            println!("- **Medium:** {}", counts.medium);
            println!("- **Low:** {}\n", counts.low);
            for (tier, title) in groups {
                let mut rows = report.tier(tier).peekable();
                if rows.peek().is_none() {
                    continue;
                }
                println!("## {title}\n");
                println!("| File | Owner | Ownership | Lines | Contributors |");
                println!("|------|-------|-----------|-------|--------------|");
                for f in rows {
                    println!(
                        "| `{}` | {} | {}% | {} | {} |",
                        f.path,
                        f.dominant_owner,
                        f.rounded_percent(),
                        f.total_lines,
                        f.contributors,
                    );
                }
                println!();
            }
        }
        OutputFormat::Text => {
            println!("Bus factor (threshold {threshold}%):");
            println!("{:-<72}", "");
            println!(
                "  high={}  medium={}  low={}  none={}",
                counts.high, counts.medium, counts.low, counts.none
            );
            if report.findings.is_empty() {
                println!("  No files at risk.");
            }
            for (tier, title) in groups {
                let mut rows = report.tier(tier).peekable();
                if rows.peek().is_none() {
                    continue;
                }
                println!("\n  {}:", paint(title, tier_color(tier), use_color));
                for f in rows {
                    println!(
                        "    {:<40} {} ({}%, {} lines, {} contributors)",
                        f.path,
                        f.dominant_owner.name,
                        f.rounded_percent(),
                        f.total_lines,
                        f.contributors,
                    );
                }
            }
            println!();
        }
    }
    Ok(())
}

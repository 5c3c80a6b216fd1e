//! logsift - resumable, parallel log pattern checker.
//!
//! Scans log files for a pattern, remembering how far each file has been
//! read in a per-log state file so repeated runs only examine newly
//! appended data.
//!
//! Usage:
//!   logsift -l /var/log -m 'ERROR|panic' -s /var/lib/logsift
//!   logsift --log-path /var/log --log-glob '*.log' --pattern ERROR \
//!           --state-dir ~/.cache/logsift --format json
//!
//! Exit codes follow monitoring-check convention: 0 when no matches were
//! found, 1 for configuration problems, 2 when matches were found or a scan
//! failed.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{eyre, Context, Result};
use globset::Glob;
use serde::Serialize;
use tokio::io::AsyncSeekExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use logsift_core::{MatchRecord, ResumeState, ScanConfig, ScanStatus, DEFAULT_MAX_LINE_BYTES};
use logsift_scan::{LineScanner, RegexMatcher};

#[derive(Parser)]
#[command(
    name = "logsift",
    version,
    about = "Resumable, parallel log pattern checker",
    long_about = "logsift scans log files for a pattern and persists a resume \
                  offset per file, so each run only examines data appended \
                  since the previous one."
)]
struct Cli {
    /// Directory (or single file) of logs to examine
    #[arg(short = 'l', long, env = "LOGSIFT_LOG_PATH")]
    log_path: Option<PathBuf>,

    /// Filename glob selecting which logs to examine
    #[arg(short = 'g', long, env = "LOGSIFT_LOG_GLOB", default_value = "*.log")]
    log_glob: String,

    /// Pattern to match in log lines
    #[arg(short = 'm', long, env = "LOGSIFT_MATCH")]
    pattern: Option<String>,

    /// Directory holding per-log resume state files
    #[arg(short = 's', long, env = "LOGSIFT_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Number of worker tasks per file (0 = one per core)
    #[arg(short = 'n', long, env = "LOGSIFT_WORKERS", default_value_t = 0)]
    workers: usize,

    /// Maximum accepted line length in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_BYTES)]
    max_line_bytes: usize,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Check status in monitoring-plugin convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckStatus {
    Ok,
    Warning,
    Critical,
}

impl CheckStatus {
    fn exit_code(self) -> u8 {
        match self {
            CheckStatus::Ok => 0,
            CheckStatus::Warning => 1,
            CheckStatus::Critical => 2,
        }
    }

    fn name(self) -> &'static str {
        match self {
            CheckStatus::Ok => "ok",
            CheckStatus::Warning => "warning",
            CheckStatus::Critical => "critical",
        }
    }
}

/// Structured report emitted by `--format json`.
#[derive(Serialize)]
struct CheckReport {
    status: &'static str,
    files_scanned: usize,
    matches: Vec<MatchRecord>,
}

/// Validated required arguments.
struct CheckArgs {
    log_path: PathBuf,
    pattern: String,
    state_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = color_eyre::install() {
        eprintln!("failed to install error reporting: {err}");
        return ExitCode::from(CheckStatus::Critical.exit_code());
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(status) => ExitCode::from(status.exit_code()),
        Err(err) => {
            println!("CRITICAL");
            println!("{err:#}");
            ExitCode::from(CheckStatus::Critical.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<CheckStatus> {
    let args = match check_args(&cli) {
        Ok(args) => args,
        Err(message) => {
            println!("WARNING");
            println!("{message}");
            return Ok(CheckStatus::Warning);
        }
    };

    let matcher = RegexMatcher::new(&args.pattern)
        .map_err(|err| eyre!("invalid match pattern {:?}: {err}", args.pattern))?;
    let config = ScanConfig::builder()
        .workers(cli.workers)
        .max_line_bytes(cli.max_line_bytes)
        .build()
        .map_err(|err| eyre!("invalid configuration: {err}"))?;

    let logs = discover_logs(&args.log_path, &cli.log_glob)?;
    debug!(count = logs.len(), glob = %cli.log_glob, "discovered log files");

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping scan");
            interrupt.cancel();
        }
    });

    let mut matches = Vec::new();
    let mut files_scanned = 0;
    for log in &logs {
        let outcome = check_log(log, &matcher, &config, &args.state_dir, &cancel)
            .await
            .wrap_err_with(|| format!("scanning {}", log.display()))?;
        files_scanned += 1;
        matches.extend(outcome.matches);
        if outcome.cancelled {
            warn!(remaining = logs.len() - files_scanned, "scan cancelled");
            break;
        }
    }

    let status = if matches.is_empty() {
        CheckStatus::Ok
    } else {
        CheckStatus::Critical
    };
    report(cli.format, status, files_scanned, matches)?;
    Ok(status)
}

/// Validate required arguments, mirroring the env-var fallbacks in the
/// messages so a bare invocation explains both spellings.
fn check_args(cli: &Cli) -> Result<CheckArgs, String> {
    let log_path = cli
        .log_path
        .clone()
        .ok_or("--log-path or LOGSIFT_LOG_PATH is required")?;
    let pattern = cli
        .pattern
        .clone()
        .ok_or("--pattern or LOGSIFT_MATCH is required")?;
    let state_dir = cli
        .state_dir
        .clone()
        .ok_or("--state-dir or LOGSIFT_STATE_DIR is required")?;
    Ok(CheckArgs {
        log_path,
        pattern,
        state_dir,
    })
}

/// Walk the log path and return every file whose name matches the glob, in
/// a stable order.
fn discover_logs(root: &Path, glob: &str) -> Result<Vec<PathBuf>> {
    let matcher = Glob::new(glob)
        .wrap_err_with(|| format!("invalid log glob {glob:?}"))?
        .compile_matcher();

    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut logs = Vec::new();
    for entry in jwalk::WalkDir::new(root).skip_hidden(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.file_name().is_some_and(|name| matcher.is_match(name)) {
            logs.push(path);
        }
    }
    logs.sort();
    Ok(logs)
}

struct LogOutcome {
    matches: Vec<MatchRecord>,
    cancelled: bool,
}

/// Scan a single log file from its persisted offset and, unless the scan
/// failed, persist the advanced offset.
async fn check_log(
    log: &Path,
    matcher: &RegexMatcher,
    config: &ScanConfig,
    state_dir: &Path,
    cancel: &CancellationToken,
) -> Result<LogOutcome> {
    let state_path = state_file_for(state_dir, log);
    let state = ResumeState::load(&state_path)?;

    let mut file = tokio::fs::File::open(log)
        .await
        .wrap_err("couldn't open log file")?;
    let len = file
        .metadata()
        .await
        .wrap_err("couldn't stat log file")?
        .len();

    let mut offset = state.offset;
    if offset > len {
        warn!(
            log = %log.display(),
            offset,
            len,
            "log shrank since last run, rescanning from the start"
        );
        offset = 0;
    }
    if offset > 0 {
        file.seek(std::io::SeekFrom::Start(offset))
            .await
            .wrap_err("couldn't seek to resume offset")?;
    }

    let scanner = LineScanner::with_config(file, matcher.clone(), config.clone());
    let mut handle = scanner.start(cancel.clone());

    let mut matches = Vec::new();
    while let Some(record) = handle.recv().await {
        matches.push(record);
    }
    let summary = handle.finish().await?;
    debug!(log = %log.display(), ?summary, "scan finished");

    // Only completed or cleanly cancelled scans reach this point; a failed
    // scan must not move the resume offset.
    ResumeState::new(offset + summary.bytes_consumed).store(&state_path)?;

    Ok(LogOutcome {
        matches,
        cancelled: summary.status == ScanStatus::Cancelled,
    })
}

/// State file path derived from the absolute log path, one file per log.
fn state_file_for(state_dir: &Path, log: &Path) -> PathBuf {
    let absolute = log.canonicalize().unwrap_or_else(|_| log.to_path_buf());
    let mut name: String = absolute
        .to_string_lossy()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            other => other,
        })
        .collect();
    name.push_str(".json");
    state_dir.join(name)
}

fn report(
    format: OutputFormat,
    status: CheckStatus,
    files_scanned: usize,
    matches: Vec<MatchRecord>,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if matches.is_empty() {
                println!("OK");
                println!("No matches found in log files");
            } else {
                println!("CRITICAL");
                println!("Matches found:");
                for record in &matches {
                    match &record.error {
                        Some(error) => println!("{} (matcher error: {error})", record.matched),
                        None => println!("{}", record.matched),
                    }
                }
            }
        }
        OutputFormat::Json => {
            let report = CheckReport {
                status: status.name(),
                files_scanned,
                matches,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

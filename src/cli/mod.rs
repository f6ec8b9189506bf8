//! Command-line interface for turnscope.
//!
//! Commands:
//! - `analyze`: Score every session in a log, optionally saving and profiling them
//! - `profile`: Show a user's profile summary
//! - `sessions`: List stored sessions
//! - `prune`: Delete old sessions from storage
//! - `validate`: Check a log file without scoring it
//! - `completions`: Generate shell completions

mod commands;

pub use commands::*;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

use tracing::warn;

use crate::config::Config;
use crate::error::Result;
use crate::insight::AnalysisDepth;

/// Analyze human/agent coding session logs and build per-user skill profiles.
#[derive(Debug, Parser)]
#[command(name = "turnscope")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Storage directory (default: platform data directory).
    #[arg(short = 'd', long, global = true, env = "TURNSCOPE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output format for structured data.
    #[arg(short = 'o', long, global = true, default_value = "text", env = "TURNSCOPE_OUTPUT")]
    pub output: OutputFormat,

    /// Suppress non-essential output.
    #[arg(short = 'q', long, global = true, env = "TURNSCOPE_QUIET")]
    pub quiet: bool,

    /// Output as JSON (shorthand for -o json).
    #[arg(long, global = true, env = "TURNSCOPE_JSON")]
    pub json: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn", env = "TURNSCOPE_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format (text, json, compact, pretty).
    #[arg(long, global = true, default_value = "text", env = "TURNSCOPE_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Number of threads for parallel processing (default: number of CPUs).
    #[arg(short = 'j', long, global = true, env = "TURNSCOPE_THREADS")]
    pub threads: Option<usize>,

    /// Path to custom configuration file.
    #[arg(long, global = true, env = "TURNSCOPE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Log level options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    #[default]
    Warn,
    /// Errors, warnings, and informational messages.
    Info,
    /// All of the above plus debug messages.
    Debug,
    /// All messages including trace-level details.
    Trace,
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// Structured JSON format for machine consumption.
    Json,
    /// Compact single-line format.
    Compact,
    /// Pretty format with full details.
    Pretty,
}

impl LogLevel {
    /// Convert to tracing filter level.
    #[must_use]
    pub fn to_filter_string(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl Cli {
    /// Get effective output format.
    #[must_use]
    pub fn effective_output(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.output
        }
    }
}

/// Output format for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON output.
    Json,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse, classify and score every session in a log file.
    #[command(alias = "a")]
    Analyze(AnalyzeArgs),

    /// Show a user's profile summary.
    #[command(alias = "p")]
    Profile(ProfileArgs),

    /// List stored sessions.
    #[command(alias = "ls")]
    Sessions(SessionsArgs),

    /// Delete stored sessions older than a number of days.
    Prune(PruneArgs),

    /// Check a log file for malformed records.
    Validate(ValidateArgs),

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the analyze command.
#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Log file to analyze (newline-delimited JSON).
    pub file: PathBuf,

    /// Skip malformed lines instead of failing.
    #[arg(long)]
    pub lenient: bool,

    /// Aggregate the sessions into this user's profile (implies --save).
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// Save scored sessions to storage.
    #[arg(short = 's', long)]
    pub save: bool,

    /// Generate narrative insights at this depth.
    #[arg(long, value_enum)]
    pub depth: Option<DepthArg>,
}

/// Insight depth argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DepthArg {
    /// One-paragraph overview.
    Quick,
    /// Overview plus highlights.
    Standard,
    /// Full walkthrough.
    Deep,
}

impl From<DepthArg> for AnalysisDepth {
    fn from(depth: DepthArg) -> Self {
        match depth {
            DepthArg::Quick => Self::Quick,
            DepthArg::Standard => Self::Standard,
            DepthArg::Deep => Self::Deep,
        }
    }
}

/// Arguments for the profile command.
#[derive(Debug, Parser)]
pub struct ProfileArgs {
    /// User identifier.
    pub user: String,

    /// Print the full stored profile instead of the summary.
    #[arg(long)]
    pub full: bool,
}

/// Arguments for the sessions command.
#[derive(Debug, Parser)]
pub struct SessionsArgs {
    /// Maximum number of sessions to show.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Number of sessions to skip.
    #[arg(long)]
    pub offset: Option<usize>,
}

/// Arguments for the prune command.
#[derive(Debug, Parser)]
pub struct PruneArgs {
    /// Delete sessions that ended more than this many days ago
    /// (default: storage.retention_days from the config).
    #[arg(long)]
    pub older_than: Option<u32>,
}

/// Arguments for the validate command.
#[derive(Debug, Parser)]
pub struct ValidateArgs {
    /// Log file to validate.
    pub file: PathBuf,

    /// Maximum number of issues to print.
    #[arg(short = 'n', long, default_value = "20")]
    pub max_issues: usize,
}

/// Arguments for the completions command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// PowerShell.
    Powershell,
    /// Elvish shell.
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::Powershell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Generate shell completions and print to stdout.
pub fn generate_completions(shell: CompletionShell) {
    let mut cmd = Cli::command();
    let shell: Shell = shell.into();
    generate(shell, &mut cmd, "turnscope", &mut io::stdout());
}

/// Initialize tracing/logging based on CLI options.
fn init_logging(cli: &Cli) {
    use tracing_subscriber::{
        fmt::{self, format::FmtSpan},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_filter_string()));

    let result = match cli.log_format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Text => {
            let layer = fmt::layer().with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
    };

    if let Err(e) = result {
        eprintln!("Warning: Could not initialize logging: {e}");
    }
}

/// Initialize rayon thread pool with custom thread count if specified.
fn init_thread_pool(threads: Option<usize>) {
    if let Some(num_threads) = threads {
        if num_threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .ok(); // already initialized
        }
    }
}

/// Load the default config, then layer an explicit `--config` file over it.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring unreadable default config");
        Config::default()
    });
    if let Some(path) = &cli.config {
        config.merge_from(&Config::load_from(path)?);
    }
    Ok(config)
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_thread_pool(cli.threads);
    init_logging(&cli);

    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Analyze(args) => commands::analyze::run(&cli, &config, args),
        Commands::Profile(args) => commands::profile::run(&cli, &config, args),
        Commands::Sessions(args) => commands::sessions::run(&cli, &config, args),
        Commands::Prune(args) => commands::prune::run(&cli, &config, args),
        Commands::Validate(args) => commands::validate::run(&cli, &config, args),
        Commands::Completions(args) => {
            generate_completions(args.shell);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_depth_conversion() {
        assert_eq!(AnalysisDepth::from(DepthArg::Quick), AnalysisDepth::Quick);
        assert_eq!(AnalysisDepth::from(DepthArg::Deep), AnalysisDepth::Deep);
    }

    #[test]
    fn test_json_flag_overrides_output() {
        let cli = Cli::parse_from(["turnscope", "--json", "sessions"]);
        assert_eq!(cli.effective_output(), OutputFormat::Json);
        let cli = Cli::parse_from(["turnscope", "sessions", "-n", "5"]);
        assert_eq!(cli.effective_output(), OutputFormat::Text);
    }

    #[test]
    fn test_analyze_args() {
        let cli = Cli::parse_from(["turnscope", "analyze", "log.jsonl", "--lenient", "--user", "ana", "--depth", "deep"]);
        match cli.command {
            Commands::Analyze(args) => {
                assert!(args.lenient);
                assert_eq!(args.user.as_deref(), Some("ana"));
                assert_eq!(args.depth, Some(DepthArg::Deep));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_log_level_to_filter() {
        assert_eq!(LogLevel::Error.to_filter_string(), "error");
        assert_eq!(LogLevel::Warn.to_filter_string(), "warn");
        assert_eq!(LogLevel::Trace.to_filter_string(), "trace");
    }
}

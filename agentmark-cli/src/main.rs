//! Agentmark CLI — run evaluation suites and load benchmarks against a
//! deployed function-calling agent.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use agentmark_core::load_config;

/// Agentmark: evaluation and benchmark harness for function-calling agents
#[derive(Parser, Debug)]
#[command(name = "agentmark", version, about, long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./agentmark.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the evaluation suite
    Run {
        /// External catalog JSON; the built-in corpus is used if omitted
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Restrict to one catalog collection (e.g. basic, edge_case)
        #[arg(long)]
        collection: Option<String>,

        /// Cap the number of tests executed
        #[arg(long)]
        max_tests: Option<usize>,

        /// Write the session as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run load benchmark scenarios
    Bench {
        /// Which scenario to run
        #[arg(value_enum, default_value = "all")]
        scenario: commands::Scenario,

        /// External catalog JSON; the built-in corpus is used if omitted
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Iterations for the single-request scenario
        #[arg(long, default_value_t = 50)]
        iterations: usize,

        /// Simulated users for the concurrent scenario
        #[arg(long, default_value_t = 5)]
        users: usize,

        /// Requests per user for the concurrent scenario
        #[arg(long, default_value_t = 5)]
        requests_per_user: usize,

        /// Target request rate for the sustained-load scenario
        #[arg(long, default_value_t = 5.0)]
        rps: f64,

        /// Duration in seconds for the sustained-load scenario
        #[arg(long, default_value_t = 30)]
        duration_secs: u64,

        /// Request count for the stress scenario
        #[arg(long, default_value_t = 200)]
        max_requests: usize,

        /// Write the benchmark report as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the test catalog
    List {
        /// External catalog JSON; the built-in corpus is used if omitted
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

// Returns the exit code instead of calling `process::exit` so the
// non-blocking log guard drops and flushes before the process ends.
fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Human-readable stderr plus JSON file logging.
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "agentmark", "agentmark")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "agentmark.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            catalog,
            collection,
            max_tests,
            output,
        } => commands::run(config, catalog, collection, max_tests, output),
        Commands::Bench {
            scenario,
            catalog,
            iterations,
            users,
            requests_per_user,
            rps,
            duration_secs,
            max_requests,
            output,
        } => commands::bench(
            config,
            scenario,
            catalog,
            commands::BenchParams {
                iterations,
                users,
                requests_per_user,
                rps,
                duration_secs,
                max_requests,
            },
            output,
        ),
        Commands::List { catalog } => commands::list(catalog),
    }
}

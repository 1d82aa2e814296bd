use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dbseed_core::redact_connection_string;
use dbseed_engine::{
    ProbeReport, SeedEngine, SeedError, SeedOptions, SeedReport, TableSelection, resolve_tables,
    run_probes, wipe_tables,
};
use dbseed_postgres::PostgresAdapter;

#[derive(Debug, Error)]
enum CliError {
    #[error("core error: {0}")]
    Core(#[from] dbseed_core::Error),
    #[error("seed error: {0}")]
    Seed(#[from] SeedError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} probe queries failed")]
    ProbeFailed(u64),
}

#[derive(Parser, Debug)]
#[command(
    name = "dbseed",
    version,
    about = "Populate a relational schema with referentially consistent synthetic data"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seed tables with generated rows in foreign-key dependency order.
    Seed(SeedArgs),
    /// Run smoke queries against the seeded tables.
    Probe(ProbeArgs),
    /// Delete seeded rows, children before parents.
    Wipe(WipeArgs),
}

#[derive(Args, Debug)]
struct ConnArgs {
    /// Database connection string (flag form).
    #[arg(long, value_name = "CONNECTION_STRING", conflicts_with = "conn_pos")]
    conn: Option<String>,
    /// Database connection string (positional form).
    #[arg(value_name = "CONNECTION_STRING", required_unless_present = "conn")]
    conn_pos: Option<String>,
}

impl ConnArgs {
    fn resolve(self) -> Result<String, CliError> {
        match (self.conn, self.conn_pos) {
            (Some(conn), None) => Ok(conn),
            (None, Some(conn)) => Ok(conn),
            _ => Err(CliError::InvalidConfig(
                "provide the connection string once".to_string(),
            )),
        }
    }
}

#[derive(Args, Debug)]
struct SeedArgs {
    #[command(flatten)]
    conn: ConnArgs,
    /// Tables to seed; defaults to every table in the schema.
    #[arg(long, num_args = 1.., value_name = "TABLE")]
    tables: Vec<String>,
    /// Rows to generate per table.
    #[arg(long, default_value_t = 100)]
    rows: u64,
    /// Rows per bulk-insert flush.
    #[arg(long, default_value_t = 10)]
    batch_size: usize,
    /// RNG seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,
    /// Run the probe suite after seeding.
    #[arg(long, default_value_t = false)]
    test: bool,
    /// Only log errors and skip the summary output.
    #[arg(long, default_value_t = false)]
    silent: bool,
    /// Write the run report as JSON.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ProbeArgs {
    #[command(flatten)]
    conn: ConnArgs,
    /// Tables to probe; defaults to every table in the schema.
    #[arg(long, num_args = 1.., value_name = "TABLE")]
    tables: Vec<String>,
    /// Only log errors and skip the summary output.
    #[arg(long, default_value_t = false)]
    silent: bool,
}

#[derive(Args, Debug)]
struct WipeArgs {
    #[command(flatten)]
    conn: ConnArgs,
    /// Tables to wipe; defaults to every table in the schema.
    #[arg(long, num_args = 1.., value_name = "TABLE")]
    tables: Vec<String>,
    /// Only log errors and skip the summary output.
    #[arg(long, default_value_t = false)]
    silent: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Seed(args) => run_seed(args).await,
        Command::Probe(args) => run_probe(args).await,
        Command::Wipe(args) => run_wipe(args).await,
    }
}

fn init_logging(silent: bool) {
    let default_filter = if silent { "error" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn connect(conn: ConnArgs) -> Result<PostgresAdapter, CliError> {
    let conn = conn.resolve()?;
    let redacted = redact_connection_string(&conn);
    match redacted.engine.as_deref() {
        Some("postgres") | Some("postgresql") => {}
        other => {
            return Err(CliError::InvalidConfig(format!(
                "unsupported connection scheme '{}'",
                other.unwrap_or("<none>")
            )));
        }
    }
    info!(connection = %redacted.redacted, "connecting");
    Ok(PostgresAdapter::connect(&conn).await?)
}

fn selection(tables: Vec<String>) -> TableSelection {
    if tables.is_empty() {
        TableSelection::All
    } else {
        TableSelection::Named(tables)
    }
}

async fn run_seed(args: SeedArgs) -> Result<(), CliError> {
    init_logging(args.silent);
    let adapter = connect(args.conn).await?;

    let options = SeedOptions {
        tables: selection(args.tables),
        rows: args.rows,
        batch_size: args.batch_size,
        seed: args.seed,
    };
    let run_probe_suite = args.test;
    let probe_selection = options.tables.clone();

    let report = SeedEngine::new(options).run(&adapter, &adapter).await?;

    if !args.silent {
        print_seed_summary(&report);
    }
    if let Some(path) = args.report {
        std::fs::write(&path, serde_json::to_vec_pretty(&report)?)?;
        info!(path = %path.display(), "report written");
    }

    if run_probe_suite {
        let tables = resolve_tables(&adapter, &probe_selection).await?;
        let probe = run_probes(&tables, &adapter).await;
        if !args.silent {
            print_probe_summary(&probe);
        }
        if !probe.all_passed() {
            return Err(CliError::ProbeFailed(probe.failed));
        }
    }

    Ok(())
}

async fn run_probe(args: ProbeArgs) -> Result<(), CliError> {
    init_logging(args.silent);
    let adapter = connect(args.conn).await?;

    let tables = resolve_tables(&adapter, &selection(args.tables)).await?;
    let report = run_probes(&tables, &adapter).await;
    if !args.silent {
        print_probe_summary(&report);
    }
    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::ProbeFailed(report.failed))
    }
}

async fn run_wipe(args: WipeArgs) -> Result<(), CliError> {
    init_logging(args.silent);
    let adapter = connect(args.conn).await?;

    let tables = resolve_tables(&adapter, &selection(args.tables)).await?;
    let report = wipe_tables(&tables, &adapter).await?;
    if !args.silent {
        println!(
            "wiped {} rows across {} tables",
            report.rows_deleted, report.tables_wiped
        );
    }
    Ok(())
}

fn print_seed_summary(report: &SeedReport) {
    println!("seeding order: {}", report.seeding_order.join(", "));
    for outcome in &report.tables {
        let mut line = format!(
            "{}: {}/{} rows inserted",
            outcome.table, outcome.rows_inserted, outcome.rows_requested
        );
        if outcome.rows_unresolved > 0 {
            line.push_str(&format!(", {} unresolved", outcome.rows_unresolved));
        }
        if outcome.null_fks > 0 {
            line.push_str(&format!(", {} null foreign keys", outcome.null_fks));
        }
        if outcome.insert_failures > 0 {
            line.push_str(&format!(", {} rejected", outcome.insert_failures));
        }
        println!("{line}");
    }
    for skipped in &report.skipped {
        println!("skipped {}: {}", skipped.table, skipped.reason);
    }
}

fn print_probe_summary(report: &ProbeReport) {
    println!(
        "probes: {} passed, {} failed",
        report.passed, report.failed
    );
    for failure in &report.failures {
        println!("failed: {} ({})", failure.description, failure.error);
    }
}

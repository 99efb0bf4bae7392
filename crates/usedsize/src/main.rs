use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use usedsize_core::types::ProcessId;
use usedsize_core::{Inspector, ResolverConfig, Session, SizeResult};
use usedsize_utils::{info, init_logging_with_format, init_logging_with_level, LogFormat, LogLevel};

/// Measure the memory reachable from a named object in a running process.
#[derive(Parser, Debug)]
#[command(name = "usedsize")]
#[command(version)]
#[command(about = "Measure the memory reachable from a named object in a running process", long_about = None)]
struct Cli
{
    /// Process ID (PID) to inspect
    #[arg(short, long)]
    pid: u32,
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long)]
    log_level: Option<LogLevel>,
    /// Log output format (pretty or json); defaults to USEDSIZE_LOG_FORMAT, then pretty
    #[arg(long)]
    log_format: Option<LogFormat>,
    /// Maximum nodes a single container walk may visit
    #[arg(long)]
    traversal_limit: Option<u64>,
    /// Additional record type to size field by field (repeatable)
    #[arg(long = "record-type", value_name = "TYPE")]
    record_types: Vec<String>,
    /// Inspect the process without stopping it first
    #[arg(long, default_value_t = false)]
    no_stop: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Print the used size of an object
    Size
    {
        /// Object expression, e.g. `mnodeman` or `(*(CMasternode*)0x5555deadbeef).vchSig`
        object: String,
    },
    /// Append a timestamped used-size line to a file
    Log
    {
        /// Object expression
        object: String,
        /// File to append to (created if missing)
        file: PathBuf,
    },
    /// Store the used size into an object of the process (or a `$variable`)
    Store
    {
        /// Integer object that receives the size
        destination: String,
        /// Object expression
        object: String,
    },
    /// List the fields of an object's type
    Fields
    {
        /// Object expression
        object: String,
    },
}

fn main() -> ExitCode
{
    let cli = Cli::parse();

    let logging = cli
        .log_format
        .map_or_else(LogFormat::from_env, Ok)
        .and_then(|format| match cli.log_level {
            Some(level) => init_logging_with_level(level, format),
            None => init_logging_with_format(format),
        });
    let guard = match logging {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = run(cli);
    // Flush the log file before reporting the outcome.
    drop(guard);
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn resolver_config(cli: &Cli) -> ResolverConfig
{
    let mut config = ResolverConfig::from_env();
    if let Some(limit) = cli.traversal_limit {
        config = config.with_traversal_limit(limit);
    }
    for name in &cli.record_types {
        config = config.with_record_type(name.clone());
    }
    config
}

#[cfg(target_os = "linux")]
fn run(cli: Cli) -> SizeResult<()>
{
    use usedsize_core::{ProcessInspector, StopGuard};

    let pid = ProcessId::from(cli.pid);
    let config = resolver_config(&cli);

    let stop = if cli.no_stop { None } else { Some(StopGuard::new(pid)?) };
    let inspector = ProcessInspector::attach(pid)?;
    info!(pid = %pid, executable = %inspector.executable().display(), "inspecting process");

    let mut session = Session::new(inspector, config);
    let outcome = execute(&mut session, cli.command);
    let resumed = stop.map_or(Ok(()), StopGuard::resume);
    outcome?;
    resumed
}

#[cfg(not(target_os = "linux"))]
fn run(cli: Cli) -> SizeResult<()>
{
    let _ = resolver_config(&cli);
    Err(usedsize_core::SizeError::Unsupported(format!(
        "cannot inspect process {}: live inspection is only available on Linux",
        ProcessId::from(cli.pid)
    )))
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn execute<I: Inspector>(session: &mut Session<I>, command: Commands) -> SizeResult<()>
{
    match command {
        Commands::Size { object } => {
            println!("{}", session.used_size(&object)?);
        }
        Commands::Log { object, file } => {
            let size = session.log_size(&object, &file)?;
            println!("{object}: {size} (appended to {})", file.display());
        }
        Commands::Store { destination, object } => {
            let size = session.store_size(&destination, &object)?;
            println!("{destination} = {size}");
        }
        Commands::Fields { object } => {
            for field in session.describe_fields(&object)? {
                println!("{field}");
            }
        }
    }
    Ok(())
}

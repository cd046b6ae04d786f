use abibreaks_cli::config::{self, ConfigMerger};
use abibreaks_core::AbiBreaksError;
use abibreaks_core::settings::UpdateSettings;
use abibreaks_core::update::{read_ledger, run_update_with_shell, write_ledger};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use std::num::NonZeroUsize;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "abibreaks",
    version,
    about = "Keeps the list of known ABI breaks since an ABI freeze commit up to date."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compare every ABI revision since the freeze commit with the current ABI
    /// and add new breaks to the list.
    Update(UpdateArgs),
    /// Print the freeze commit recorded in an ABI breaks list.
    Baseline(BaselineArgs),
}

#[derive(Debug, Parser)]
struct UpdateArgs {
    /// Path to the ABI representation (.xml or .stg).
    #[arg(long)]
    abi: Utf8PathBuf,

    /// ABI breaks list to update.
    #[arg(long)]
    known_abi_breaks: Utf8PathBuf,

    /// Number of parallel jobs to run (default: number of CPUs).
    #[arg(long)]
    jobs: Option<NonZeroUsize>,

    /// stgdiff executable to use (default: stgdiff on PATH).
    #[arg(long, env = "STGDIFF")]
    stgdiff: Option<String>,

    /// Config file (default: ./abibreaks.toml when present).
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Compare and report, but do not rewrite the ABI breaks list.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Print a JSON summary of the run on stdout.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Parser)]
struct BaselineArgs {
    /// ABI breaks list to read.
    #[arg(long)]
    known_abi_breaks: Utf8PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = real_main(cli) {
        error!("{:#}", e);
        let code = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<AbiBreaksError>())
            .map_or(1, AbiBreaksError::exit_code);
        return ExitCode::from(code);
    }
    ExitCode::SUCCESS
}

fn real_main(cli: Cli) -> anyhow::Result<()> {
    match cli.cmd {
        Command::Update(args) => cmd_update(args),
        Command::Baseline(args) => cmd_baseline(args),
    }
}

fn cmd_update(args: UpdateArgs) -> anyhow::Result<()> {
    let file_config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::load_or_default(Utf8Path::new(".")).context("load abibreaks.toml config")?,
    };
    let merged = ConfigMerger::new(file_config).merge_update_args(args.jobs, args.stgdiff)?;
    debug!(
        "merged config: jobs={}, program={}",
        merged.jobs, merged.program
    );

    let mut settings = UpdateSettings::new(args.abi, args.known_abi_breaks);
    settings.jobs = merged.jobs;
    settings.comparer.program = merged.program;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    let mut outcome = runtime.block_on(run_update_with_shell(&settings))?;

    if args.dry_run {
        info!(
            "dry run: {} new ABI breaks not written to {}",
            outcome.summary.new_breaks, settings.ledger_path
        );
    } else {
        write_ledger(&settings.ledger_path, &outcome.ledger)?;
        outcome.summary.written = true;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
    }
    Ok(())
}

fn cmd_baseline(args: BaselineArgs) -> anyhow::Result<()> {
    let ledger = read_ledger(&args.known_abi_breaks)?;
    println!("{}", ledger.baseline());
    Ok(())
}

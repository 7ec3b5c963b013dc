mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use abivault_lib::Config;

use crate::cmd::{cmd_diff, cmd_list, cmd_pull, cmd_push, cmd_summary};
use crate::output::{OutputFormat, print_error};

/// abivault - versioned storage for compiled contract artifacts
#[derive(Parser)]
#[command(name = "abivault")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to a configuration file
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Publish an artifact to the remote store
  Push {
    /// Artifact document, or a directory containing exactly one
    path: PathBuf,

    /// Target as PROJECT or PROJECT:TAG
    reference: String,

    /// Overwrite an existing tag
    #[arg(short, long)]
    force: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Download artifacts from the remote store
  Pull {
    /// Source as PROJECT or PROJECT:TAG_OR_ID
    reference: String,

    /// Download items that are already present locally
    #[arg(short, long)]
    force: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Compare an artifact against a stored release
  Diff {
    /// Freshly built artifact document or directory
    path: PathBuf,

    /// Release as PROJECT:TAG_OR_ID
    reference: String,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Build and write the contract/release summary
  Summary {
    /// Project to summarize (all projects if omitted)
    project: Option<String>,

    /// Skip versioned releases whose contract is unchanged
    #[arg(long)]
    filter_similar: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// List the tags and ids of a project
  List {
    project: String,

    /// List the remote store instead of the local one
    #[arg(long)]
    remote: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

fn init_logging(verbose: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn run(cli: Cli) -> Result<()> {
  let config = Config::load(cli.config.as_deref())?;
  debug!(
    root = %config.root.display(),
    remote = config.remote.as_ref().map(|r| r.url.as_str()).unwrap_or("-"),
    "loaded configuration"
  );

  match cli.command {
    Commands::Push {
      path,
      reference,
      force,
      output,
    } => cmd_push(&config, &path, &reference, force, output),
    Commands::Pull {
      reference,
      force,
      output,
    } => cmd_pull(&config, &reference, force, output),
    Commands::Diff {
      path,
      reference,
      output,
    } => cmd_diff(&config, &path, &reference, output),
    Commands::Summary {
      project,
      filter_similar,
      output,
    } => cmd_summary(&config, project.as_deref(), filter_similar, output),
    Commands::List {
      project,
      remote,
      output,
    } => cmd_list(&config, &project, remote, output),
  }
}

/// Whether `err` is an unexpected failure whose details matter for debugging.
fn is_unexpected(err: &anyhow::Error) -> bool {
  err
    .chain()
    .find_map(|e| e.downcast_ref::<abivault_lib::Error>())
    .is_some_and(|e| !e.is_user_facing())
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  let verbose = cli.verbose;
  init_logging(verbose);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      if verbose {
        print_error(&format!("{:?}", err));
      } else {
        print_error(&err.to_string());
        if is_unexpected(&err) {
          eprintln!("  (run with --verbose for details)");
        }
      }
      ExitCode::FAILURE
    }
  }
}

//! Command-line interface for Dynablock parametric block families.

mod config;
mod prompt;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dynablock_commands::{run_command, run_menu, CommandContext, CommandKind, CommandOutcome};
use dynablock_core::{DocObject, FactoryRegistry, ObjectId};
use dynablock_host::SimulatedDocument;

use crate::config::CliConfig;
use crate::prompt::TerminalPrompt;

/// Dynablock - parametric block families for a CAD document.
#[derive(Parser, Debug)]
#[command(name = "dynablock")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Document store file.
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Config file (defaults to ./dynablock.toml when present).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Choose an action from a menu.
    Run,
    /// Create a rectangle family.
    CreateFamily,
    /// Insert an instance of a family.
    Insert,
    /// Change the values of a placed instance.
    Edit {
        /// Object id of the instance, instead of asking for it.
        #[arg(long)]
        id: Option<String>,
    },
    /// Change a family's defaults and rebuild all of its instances.
    Sync,
    /// List families.
    List,
    /// List objects in the document.
    Objects,
}

impl Command {
    fn kind(&self) -> Option<CommandKind> {
        match self {
            Command::Run | Command::Objects => None,
            Command::CreateFamily => Some(CommandKind::CreateRectangleFamily),
            Command::Insert => Some(CommandKind::InsertInstance),
            Command::Edit { .. } => Some(CommandKind::EditInstance),
            Command::Sync => Some(CommandKind::SyncFamily),
            Command::List => Some(CommandKind::ListFamilies),
        }
    }
}

fn init_logging(config: &CliConfig, verbose: bool) {
    let default_filter = match (&config.logging.filter, verbose) {
        (_, true) => "dynablock=debug".to_string(),
        (Some(filter), false) => filter.clone(),
        (None, false) => "dynablock=info".to_string(),
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    // Logs go to stderr so prompts and messages own stdout.
    if config.json_logging() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(io::stderr)
            .init();
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match CliConfig::resolve(args.config.as_deref(), args.store.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config, args.verbose);

    match run(&args, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "Command aborted");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the selected command against the configured store.
///
/// Returns `Ok(false)` when the command failed after reporting to the user.
fn run(args: &Args, config: &CliConfig) -> Result<bool> {
    let storage = dynablock_storage::create_backend(&config.storage.backend, &config.backend_config())
        .with_context(|| format!("Failed to open store {}", config.store_path().display()))?;
    tracing::debug!(
        backend = %config.storage.backend,
        path = %config.store_path().display(),
        "Store opened"
    );
    if !storage.is_persistent() {
        tracing::warn!(backend = %config.storage.backend, "Store is not persistent, changes are dropped on exit");
    }

    let mut doc = SimulatedDocument::load(storage.as_ref());

    if let Command::Objects = args.command {
        list_objects(&doc, &mut io::stdout().lock())?;
        return Ok(true);
    }

    let factories = FactoryRegistry::with_builtins();
    let preset = match &args.command {
        Command::Edit { id } => id.clone().map(ObjectId::new),
        _ => None,
    };
    let stdin = io::stdin();
    let mut prompt = TerminalPrompt::new(stdin.lock(), io::stdout()).with_pick(preset);

    let result = {
        let mut ctx = CommandContext::new(storage.clone(), &mut doc, &factories, &mut prompt);
        match args.command.kind() {
            Some(kind) => run_command(&mut ctx, kind),
            None => run_menu(&mut ctx),
        }
    };

    // The document may have changed even when the command failed.
    doc.save(storage.as_ref()).context("Failed to save document")?;

    match result {
        Ok(outcome) => {
            report(&outcome);
            Ok(true)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Command failed");
            Ok(false)
        }
    }
}

fn report(outcome: &CommandOutcome) {
    match outcome {
        CommandOutcome::Inserted { instance_id, .. } => println!("Inserted {}", instance_id),
        CommandOutcome::Edited { old_id, new_id } => println!("Replaced {} with {}", old_id, new_id),
        CommandOutcome::Cancelled => println!("Cancelled."),
        _ => {}
    }
}

fn list_objects(doc: &SimulatedDocument, out: &mut impl Write) -> Result<()> {
    if doc.object_count() == 0 {
        writeln!(out, "Document is empty.")?;
        return Ok(());
    }
    for object in doc.objects() {
        match object {
            DocObject::Instance(placed) => {
                let name = doc
                    .definition(placed.definition)
                    .map(|d| d.name.as_str())
                    .unwrap_or("?");
                writeln!(out, "{}  instance of {}", placed.id, name)?;
            }
            DocObject::Geometry { id, .. } => writeln!(out, "{}  curve", id)?,
        }
    }
    Ok(())
}

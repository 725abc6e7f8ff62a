//! Command-line entry point.
//!
//! # Responsibility
//! - Offer quick local probes (`ping`, `version`).
//! - Run the summary validator over files and print its metrics.
//! - Print a user's folder hierarchy from a database file.
//!
//! Exit codes: `0` success, `1` summary rejected, `2` runtime failure.

use clap::{Parser, Subcommand};
use log::info;
use scriblink_core::db::open_db;
use scriblink_core::{
    load_config, CoreConfig, Folder, FolderRepository, FolderService, FolderServiceError,
    SqliteFolderRepository, SummaryValidator,
};
use std::collections::HashSet;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use uuid::Uuid;

/// Scriblink folder and summary tooling
#[derive(Parser, Debug)]
#[command(name = "scriblink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Absolute directory for rolling log files; logging is off when omitted
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the core library links
    Ping,
    /// Print the core library version
    Version,
    /// Validate a candidate summary against its source text
    Validate {
        /// File holding the source text
        #[arg(long)]
        source: PathBuf,
        /// File holding the candidate summary
        #[arg(long)]
        summary: PathBuf,
        /// JSON config with `summary_rules` overrides
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print a user's folder hierarchy
    Tree {
        /// SQLite database file
        #[arg(long)]
        db: PathBuf,
        /// Owner id
        #[arg(long)]
        user: Uuid,
    },
}

enum Outcome {
    Done,
    Rejected,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = scriblink_core::default_log_level();
        if let Err(err) = scriblink_core::init_logging(level, &log_dir.to_string_lossy()) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    match run(cli.command) {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::Rejected) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(command: Commands) -> Result<Outcome, Box<dyn Error>> {
    match command {
        Commands::Ping => {
            println!("scriblink_core ping={}", scriblink_core::ping());
            Ok(Outcome::Done)
        }
        Commands::Version => {
            println!("scriblink_core version={}", scriblink_core::core_version());
            Ok(Outcome::Done)
        }
        Commands::Validate {
            source,
            summary,
            config,
        } => validate(&source, &summary, config.as_deref()),
        Commands::Tree { db, user } => {
            print_tree(&db, user)?;
            Ok(Outcome::Done)
        }
    }
}

fn validate(
    source: &Path,
    summary: &Path,
    config: Option<&Path>,
) -> Result<Outcome, Box<dyn Error>> {
    let config = match config {
        Some(path) => load_config(path)?,
        None => CoreConfig::default(),
    };
    let source_text = read_text(source)?;
    let summary_text = read_text(summary)?;

    let validator = SummaryValidator::new(config.summary_rules);
    let report = validator.inspect(&source_text, summary_text.trim());
    println!("words={}", report.word_count);
    println!("length={} source_length={}", report.length, report.source_length);
    println!("overlap={:.1}%", report.overlap_ratio * 100.0);
    if let Some(phrase) = &report.meta_phrase {
        println!("meta_phrase=\"{phrase}\"");
    }

    match &report.failure {
        None => {
            println!("accepted");
            Ok(Outcome::Done)
        }
        Some(failure) => {
            info!(
                "event=cli_validate module=cli status=rejected error_code={}",
                failure.code()
            );
            println!("rejected: {failure}");
            Ok(Outcome::Rejected)
        }
    }
}

fn read_text(path: &Path) -> Result<String, Box<dyn Error>> {
    std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read `{}`: {err}", path.display()).into())
}

fn print_tree(db: &Path, user: Uuid) -> Result<(), Box<dyn Error>> {
    let conn = open_db(db)?;
    let service = FolderService::new(SqliteFolderRepository::try_new(&conn)?);
    let Some(root) = service.root_folder(user)? else {
        println!("user {user} has no root folder");
        return Ok(());
    };

    for line in render_tree(&service, root)? {
        println!("{line}");
    }
    Ok(())
}

/// Renders `root` and its descendants depth-first, one indented line each.
///
/// Uses an explicit stack so deep hierarchies cannot exhaust the call stack.
fn render_tree<R: FolderRepository>(
    service: &FolderService<R>,
    root: Folder,
) -> Result<Vec<String>, FolderServiceError> {
    let mut lines = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![(root, 0usize)];

    while let Some((folder, depth)) = stack.pop() {
        if !visited.insert(folder.id) {
            continue;
        }
        lines.push(format!(
            "{}{} ({}) items={}",
            "  ".repeat(depth),
            folder.title,
            folder.id,
            folder.items.len()
        ));
        let children = service.children(folder.id)?;
        stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
    }
    Ok(lines)
}

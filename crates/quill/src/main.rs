//! quill CLI
//!
//! Inspect and maintain the reference graph of a writing project.
//!
//! ## Commands
//!
//! - `links <file>`: explicit references, hyperlinks and reverse references
//! - `move <file> <new-path>`: move a file or directory and rewrite links to it
//! - `rewrite-links <old> <new>`: rewrite links only, for moves done elsewhere
//! - `check`: broken links and graph consistency (exit status 1 on problems)
//! - `reindex`: rebuild the index and print statistics
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

mod tools;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use quill_core::Project;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quill")]
#[command(author, version, about = "Reference graph tools for writing projects", long_about = None)]
struct Cli {
    /// Project root (the directory holding the root metadata record)
    #[arg(long, env = "QUILL_ROOT", default_value = ".", global = true)]
    root: PathBuf,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show references, hyperlinks and referenced-by for a file
    Links {
        /// Project-relative path of the file
        file: String,
    },

    /// Move or rename a file or directory, rewriting every link to it
    Move {
        /// Current project-relative path
        file: String,

        /// New project-relative path
        new_path: String,
    },

    /// Rewrite links from one path to another without moving anything
    RewriteLinks {
        old_path: String,
        new_path: String,
    },

    /// Report broken links and asymmetric reference edges
    Check,

    /// Rebuild the reference index and print statistics
    Reindex,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("Using project root {}", cli.root.display());
    let mut project = Project::open(&cli.root)
        .with_context(|| format!("Failed to open project at {}", cli.root.display()))?;

    let outcome = match &cli.command {
        Commands::Links { file } => tools::get_links::execute(&project, file, cli.json),
        Commands::Move { file, new_path } => {
            tools::move_file::execute(&mut project, file, new_path, cli.json)
        }
        Commands::RewriteLinks { old_path, new_path } => {
            tools::rewrite_links::execute(&mut project, old_path, new_path, cli.json)
        }
        Commands::Check => tools::check::execute(&project, cli.json),
        Commands::Reindex => tools::reindex::execute(&mut project, cli.json),
    };

    match outcome {
        Ok(output) => {
            print!("{}", output);
            Ok(())
        }
        Err(message) => {
            if cli.json {
                print!("{}", message);
            } else {
                eprint!("{}", message.red());
            }
            std::process::exit(1);
        }
    }
}

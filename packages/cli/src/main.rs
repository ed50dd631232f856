mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{apply, check, normalize, render, ApplyArgs, CheckArgs, NormalizeArgs, RenderArgs};

/// ATBD CLI - inspect and edit ATBD field documents
#[derive(Parser, Debug)]
#[command(name = "atbd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate field documents and required fields
    Check(CheckArgs),

    /// Restore the trailing paragraph and pad ragged tables
    Normalize(NormalizeArgs),

    /// Render a field document to HTML
    Render(RenderArgs),

    /// Run a script of commands and key presses against a field
    Apply(ApplyArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Check(args) => check(args, &cwd),
        Command::Normalize(args) => normalize(args, &cwd),
        Command::Render(args) => render(args, &cwd),
        Command::Apply(args) => apply(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

use super::read_field;
use anyhow::Result;
use atbd_editor::{render_html_with, RenderOptions};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Field document to render
    pub input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Single-line output
    #[arg(long)]
    pub compact: bool,

    /// Omit data-path markers
    #[arg(long)]
    pub no_paths: bool,
}

pub fn render(args: RenderArgs, _cwd: &str) -> Result<()> {
    let value = read_field(&args.input)?;
    let options = RenderOptions {
        pretty: !args.compact,
        path_markers: !args.no_paths,
        ..RenderOptions::default()
    };
    let html = render_html_with(&value.document, &options);

    match args.output {
        Some(output) => {
            if let Some(parent) = output.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&output, html)?;
            println!(
                "  {} {} → {}",
                "✓".green(),
                args.input.display(),
                output.display()
            );
        }
        None => println!("{}", html),
    }
    Ok(())
}

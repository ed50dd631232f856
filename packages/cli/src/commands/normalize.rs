use super::{field_files, read_field};
use anyhow::{anyhow, Result};
use atbd_editor::{normalize as normalize_document, EditorState, PluginPipeline, Value};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Field document or directory of field documents
    pub input: PathBuf,

    /// Rewrite files in place instead of printing
    #[arg(short, long)]
    pub write: bool,
}

/// Trailing paragraph restored and ragged table rows padded
pub fn normalized(value: &Value) -> Value {
    let state = EditorState::new(normalize_document(&value.document));
    Value::new(PluginPipeline::new().settle(state).document)
}

pub fn normalize(args: NormalizeArgs, _cwd: &str) -> Result<()> {
    let files = field_files(&args.input)?;

    if !args.write {
        if files.len() != 1 {
            return Err(anyhow!(
                "{} holds {} field documents; pass --write to normalize them in place",
                args.input.display(),
                files.len()
            ));
        }
        let value = read_field(&files[0])?;
        println!("{}", normalized(&value).to_json_pretty()?);
        return Ok(());
    }

    let mut changed = 0;
    for file in &files {
        let value = read_field(file)?;
        let repaired = normalized(&value);
        if repaired == value {
            println!("  {} {}", "·".dimmed(), file.display());
            continue;
        }

        fs::write(file, repaired.to_json_pretty()?)?;
        info!(path = %file.display(), "Normalized field");
        println!("  {} {}", "✓".green(), file.display());
        changed += 1;
    }

    println!();
    println!(
        "{} Normalized {} of {} files",
        "✅".green(),
        changed,
        files.len()
    );
    Ok(())
}

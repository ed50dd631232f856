use super::key_for_path;
use crate::config::Config;
use anyhow::{anyhow, Result};
use atbd_editor::{DirectoryStore, Editor, EditorError, Input};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Field document to edit (starts blank when missing)
    pub input: PathBuf,

    /// JSON array of commands and key presses
    #[arg(short, long)]
    pub script: PathBuf,

    /// Save into a `<record>/<version>/<field>.json` store rooted here
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Treat the field as required even if the config does not list it
    #[arg(long)]
    pub required: bool,

    /// Stop at the first rejected input
    #[arg(long)]
    pub strict: bool,
}

/// Outcome of running a script
#[derive(Debug, Default)]
pub struct ScriptRun {
    pub applied: usize,
    pub rejected: Vec<(usize, String)>,
}

pub fn apply(args: ApplyArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let mut editor = open_editor(&args.input, &config, args.required)?;

    let script = fs::read_to_string(&args.script)?;
    let inputs: Vec<Input> = serde_json::from_str(&script)
        .map_err(|e| anyhow!("Invalid script {}: {}", args.script.display(), e))?;

    let run = run_script(&mut editor, inputs, args.strict)?;
    for (step, reason) in &run.rejected {
        eprintln!("  {} step {} rejected: {}", "✗".red(), step, reason.red());
    }

    match args.store {
        Some(root) => {
            let mut store = DirectoryStore::new(root);
            editor.save(&mut store)?;
            println!(
                "{} Applied {} inputs, saved {}",
                "✅".green(),
                run.applied,
                store.path_for(editor.key()).display()
            );
        }
        None => println!("{}", editor.value().to_json_pretty()?),
    }
    Ok(())
}

/// Editor on the field stored at `path`, keyed by its store layout
pub fn open_editor(path: &Path, config: &Config, required: bool) -> Result<Editor> {
    let key = key_for_path(path);
    let source = if path.exists() {
        Some(fs::read_to_string(path)?)
    } else {
        None
    };
    let required = required || config.is_required(&key.field);

    Ok(Editor::from_json(key, source.as_deref(), config.editor.clone()).required(required))
}

/// Feed every input to the editor; rejected inputs leave it untouched
pub fn run_script(editor: &mut Editor, inputs: Vec<Input>, strict: bool) -> Result<ScriptRun> {
    let mut run = ScriptRun::default();

    for (step, input) in inputs.into_iter().enumerate() {
        debug!(step, ?input, "Applying input");
        match editor.handle(input) {
            Ok(()) => run.applied += 1,
            Err(EditorError::Command(e)) if !strict => {
                warn!(step, error = %e, "Input rejected");
                run.rejected.push((step, e.to_string()));
            }
            Err(e) => return Err(anyhow!("step {}: {}", step, e)),
        }
    }
    Ok(run)
}

use super::{field_files, key_for_path, read_field};
use crate::config::Config;
use anyhow::{anyhow, Result};
use atbd_editor::{check_field, is_blank, FieldError, Rule, RuleRegistry, Violation};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Field document or directory of field documents
    #[arg(default_value = ".")]
    pub input: PathBuf,

    /// List files without problems too
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

/// Outcome of checking one field document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReport {
    pub path: String,
    pub key: String,
    pub required: bool,
    pub blank: bool,

    /// Required but blank
    pub missing: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,

    pub violations: Vec<Violation>,
}

impl FieldReport {
    pub fn problems(&self) -> usize {
        usize::from(self.parse_error.is_some()) + usize::from(self.missing) + self.violations.len()
    }
}

pub fn check(args: CheckArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let registry = RuleRegistry::new();
    let files = field_files(&args.input)?;

    let reports: Vec<FieldReport> = files
        .iter()
        .map(|file| check_file(file, &config, &registry))
        .collect();
    let problems: usize = reports.iter().map(FieldReport::problems).sum();

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!("🔍 {} ATBD field check", "Starting".green().bold());
        println!("   Input: {}", args.input.display());
        println!("   Found {} field documents", files.len());
        println!();

        for report in &reports {
            print_report(report, args.verbose);
        }

        println!(
            "✨ {} Check complete!",
            if problems > 0 {
                "Done".red().bold()
            } else {
                "Done".green().bold()
            }
        );
        println!("   Fields checked: {}", reports.len());
        if problems == 0 {
            println!("   {} No issues found!", "✓".green());
        } else {
            println!("   {} {}", "Problems:".red(), problems);
        }
    }

    if problems > 0 {
        return Err(anyhow!("{} problem(s) in {} field document(s)", problems, files.len()));
    }
    Ok(())
}

pub fn check_file(path: &Path, config: &Config, registry: &RuleRegistry) -> FieldReport {
    let key = key_for_path(path);
    let required = config.is_required(&key.field);
    debug!(path = %path.display(), field = %key, required, "Checking field");

    let mut report = FieldReport {
        path: path.display().to_string(),
        key: key.to_string(),
        required,
        blank: false,
        missing: false,
        parse_error: None,
        violations: Vec::new(),
    };

    let value = match read_field(path) {
        Ok(value) => value,
        Err(e) => {
            report.parse_error = Some(e.to_string());
            return report;
        }
    };

    report.blank = is_blank(&value.document);
    match check_field(&key, &value.document, required, registry) {
        Ok(()) => {}
        Err(FieldError::Required { .. }) => report.missing = true,
        Err(FieldError::Invalid { violations, .. }) => report.violations = violations,
    }
    report
}

fn print_report(report: &FieldReport, verbose: bool) {
    if report.problems() == 0 {
        if verbose {
            let note = if report.blank { " (blank)".dimmed() } else { "".normal() };
            println!("{} {}{}", "✓".green(), report.path, note);
        }
        return;
    }

    println!("{}", report.path);
    if let Some(error) = &report.parse_error {
        println!("  {} {}", "error".red().bold(), error);
    }
    if report.missing {
        println!("  {} [required] {} is required", "error".red().bold(), report.key);
    }
    for violation in &report.violations {
        println!("  {} {}", "error".red().bold(), violation);
        if matches!(
            violation.rule,
            Rule::MissingTrailingParagraph | Rule::RaggedTable { .. }
        ) {
            println!(
                "    {} {}",
                "💡".dimmed(),
                "run `atbd normalize --write` to repair".dimmed()
            );
        }
    }
    println!();
}

//! List command — prints the pending change set for a project.

use crate::host::Project;
use crate::scm::{self, ChangeSet};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Width entries and commit ids are truncated/padded to in text output.
const ID_WIDTH: usize = 8;

/// Output format for the change list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing.
    Text,
    /// YAML document of the change set.
    Yaml,
}

/// List command options.
#[derive(Parser)]
pub struct ListCommand {
    /// Path to the project definition file.
    #[arg(long, value_name = "FILE")]
    pub project: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

impl ListCommand {
    /// Executes the list command.
    pub fn execute(self) -> Result<()> {
        let project = super::load_project(&self.project)?;

        match scm::global_registry().pending_changes(&project) {
            None => {
                // Unavailable is an answer, not an error: the project has no
                // supported repository, so there is nothing to list.
                println!(
                    "Pending changes are not available for '{}': no supported source-control configuration.",
                    project.name
                );
            }
            Some(set) => match self.output {
                OutputFormat::Text => print!("{}", render_text(&project, &set)),
                OutputFormat::Yaml => {
                    let yaml_output = serde_yaml::to_string(&set)?;
                    println!("{yaml_output}");
                }
            },
        }

        Ok(())
    }
}

/// Renders the change set as a human-readable listing.
fn render_text(project: &Project, set: &ChangeSet) -> String {
    let mut out = String::new();

    let anchor = match set.reference_build() {
        Some(build) => format!(" since build #{}", build.number),
        None => String::new(),
    };

    if set.is_empty() {
        let _ = writeln!(out, "No changes pending for '{}'{anchor}.", project.name);
    } else {
        let noun = if set.len() == 1 { "change" } else { "changes" };
        let _ = writeln!(
            out,
            "{} {noun} pending for '{}'{anchor}:",
            set.len(),
            project.name
        );
        out.push('\n');
        for entry in set {
            let first_line = entry.message().lines().next().unwrap_or("");
            let _ = writeln!(
                out,
                "  {:>ID_WIDTH$}  {:<12}  {}",
                short_id(entry.commit_id()),
                entry.author().full_name,
                first_line
            );
        }
    }

    if !set.skips().is_empty() {
        out.push('\n');
        out.push_str("Skipped locations:\n");
        for skip in set.skips() {
            let _ = writeln!(out, "  {}: {}", skip.location(), skip.reason());
        }
    }

    out
}

/// Abbreviates long commit ids (git hashes) for column display; decimal
/// revision numbers pass through untouched.
fn short_id(id: &str) -> &str {
    if id.len() > ID_WIDTH {
        &id[..ID_WIDTH]
    } else {
        id
    }
}

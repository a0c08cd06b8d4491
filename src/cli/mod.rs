//! CLI interface for pending-changes

use crate::host::Project;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::Path;

pub mod check;
pub mod list;

/// pending-changes: pending source-control changes for build projects
#[derive(Parser)]
#[command(name = "pending-changes")]
#[command(about = "Report source-control changes pending since the last successful build", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The main command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Main command categories
#[derive(Subcommand)]
pub enum Commands {
    /// List the changes pending for a project
    List(list::ListCommand),
    /// Check whether any provider supports a project's repository
    Check(check::CheckCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::List(cmd) => cmd.execute(),
            Commands::Check(cmd) => cmd.execute(),
        }
    }
}

/// Loads a project definition from a YAML file.
pub(crate) fn load_project(path: &Path) -> Result<Project> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read project definition {}", path.display()))?;
    serde_yaml::from_str(&text)
        .with_context(|| format!("Failed to parse project definition {}", path.display()))
}

//! Check command — the affordance check a host would run before showing any
//! pending-changes UI.

use crate::scm;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Check command options.
#[derive(Parser)]
pub struct CheckCommand {
    /// Path to the project definition file.
    #[arg(long, value_name = "FILE")]
    pub project: PathBuf,
}

impl CheckCommand {
    /// Executes the check command.
    pub fn execute(self) -> Result<()> {
        let project = super::load_project(&self.project)?;

        if scm::global_registry().supported(&project) {
            println!(
                "A pending-changes provider is available for '{}'.",
                project.name
            );
        } else {
            println!(
                "No pending-changes provider supports '{}'.",
                project.name
            );
        }

        Ok(())
    }
}

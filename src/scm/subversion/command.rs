//! Subversion access through the `svn` command-line client.
//!
//! Log output is parsed in its plain form. Each entry header declares how
//! many message lines follow (`r42 | alice | <date> | 2 lines`), and the
//! parser consumes exactly that many, so messages containing separator-like
//! lines come through intact.

use crate::scm::subversion::client::{SvnConnector, SvnError, SvnLogRecord, SvnSession};
use std::process::{Command, Output};
use tracing::debug;
use url::Url;

/// Entry separator printed by `svn log`.
const SEPARATOR: &str =
    "------------------------------------------------------------------------";

/// Placeholder `svn log` prints for revisions without an author.
const NO_AUTHOR: &str = "(no author)";

/// Connector backed by the installed `svn` binary.
#[derive(Debug, Clone)]
pub struct CommandLineSvn {
    program: String,
}

impl CommandLineSvn {
    /// Uses `svn` from the search path.
    pub fn new() -> Self {
        Self::with_program("svn")
    }

    /// Uses a specific client binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String, SvnError> {
        // The C locale keeps the header layout stable across installations.
        let output: Output = Command::new(&self.program)
            .args(args)
            .env("LC_ALL", "C")
            .output()
            .map_err(|source| SvnError::Spawn {
                command: format!("{} {}", self.program, args.join(" ")),
                source,
            })?;

        if !output.status.success() {
            return Err(SvnError::CommandFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn latest_revision(&self, url: &Url) -> Result<u64, SvnError> {
        let out = self.run(&[
            "info",
            "--non-interactive",
            "--show-item",
            "revision",
            url.as_str(),
        ])?;
        out.trim()
            .parse()
            .map_err(|_| {
                SvnError::MalformedOutput(format!("expected a revision number, got {:?}", out.trim()))
            })
    }
}

impl Default for CommandLineSvn {
    fn default() -> Self {
        Self::new()
    }
}

impl SvnConnector for CommandLineSvn {
    fn open(&self, url: &Url) -> Result<Box<dyn SvnSession>, SvnError> {
        // Probing the server here makes unreachable repositories fail at
        // session open rather than at query time.
        let latest = self
            .latest_revision(url)
            .map_err(|e| SvnError::Session(e.to_string()))?;
        debug!(url = %url, latest, "opened subversion session");

        Ok(Box::new(CommandLineSession {
            client: self.clone(),
            url: url.clone(),
            latest,
        }))
    }
}

struct CommandLineSession {
    client: CommandLineSvn,
    url: Url,
    latest: u64,
}

impl SvnSession for CommandLineSession {
    fn log(&mut self, start_revision: u64) -> Result<Vec<SvnLogRecord>, SvnError> {
        // The server rejects ranges starting past HEAD; an already-built
        // latest revision simply means there is nothing pending.
        if start_revision > self.latest {
            return Ok(Vec::new());
        }

        let range = format!("{start_revision}:HEAD");
        let out = self.client.run(&[
            "log",
            "--non-interactive",
            "-r",
            &range,
            self.url.as_str(),
        ])?;
        parse_log(&out)
    }
}

/// Parses plain `svn log` output into records.
fn parse_log(output: &str) -> Result<Vec<SvnLogRecord>, SvnError> {
    let mut lines = output.lines();
    let mut records = Vec::new();

    loop {
        match lines.next() {
            None => break,
            Some(line) if line == SEPARATOR => {}
            Some(line) => {
                return Err(SvnError::MalformedOutput(format!(
                    "expected entry separator, got {line:?}"
                )))
            }
        }

        // A trailing separator ends the log.
        let Some(header) = lines.next() else { break };
        let (revision, author, message_lines) = parse_header(header)?;

        match lines.next() {
            Some("") => {}
            other => {
                return Err(SvnError::MalformedOutput(format!(
                    "expected blank line after header of r{revision}, got {other:?}"
                )))
            }
        }

        let mut message = String::new();
        for i in 0..message_lines {
            let Some(line) = lines.next() else {
                return Err(SvnError::MalformedOutput(format!(
                    "log truncated inside message of r{revision}"
                )));
            };
            if i > 0 {
                message.push('\n');
            }
            message.push_str(line);
        }

        records.push(SvnLogRecord {
            revision,
            author,
            message,
        });
    }

    Ok(records)
}

/// Parses an entry header: `r42 | alice | 2026-08-01 ... | 2 lines`.
fn parse_header(header: &str) -> Result<(u64, Option<String>, usize), SvnError> {
    let malformed = || SvnError::MalformedOutput(format!("log entry header {header:?}"));

    let fields: Vec<&str> = header.split(" | ").collect();
    let [revision, author, _date, lines] = fields.as_slice() else {
        return Err(malformed());
    };

    let revision: u64 = revision
        .strip_prefix('r')
        .ok_or_else(malformed)?
        .parse()
        .map_err(|_| malformed())?;

    let author = if *author == NO_AUTHOR {
        None
    } else {
        Some((*author).to_string())
    };

    let message_lines: usize = lines
        .strip_suffix(" lines")
        .or_else(|| lines.strip_suffix(" line"))
        .ok_or_else(malformed)?
        .parse()
        .map_err(|_| malformed())?;

    Ok((revision, author, message_lines))
}

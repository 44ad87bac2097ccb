//! Launch history from the system journal
//!
//! The launch script logs every game start through `logger`; reading those
//! lines back shows what was launched recently even after the game exited.

use std::process::Command;

use anyhow::{Context, Result};
use serde::Serialize;

use super::launch_command_basename;
use crate::constants::SCRIPT_LOG_TAG;
use crate::logging::EngineLogger;

/// Journal entries inspected per query
const JOURNAL_LINES: &str = "50";
const JOURNAL_SINCE: &str = "1 hour ago";

/// Source of recent launch script log lines
pub trait LaunchLogSource {
    fn recent_lines(&self) -> Result<Vec<String>>;
}

/// Reads the user journal, falling back to the system journal
#[derive(Debug, Clone, Default)]
pub struct JournalLaunchLog;

impl JournalLaunchLog {
    pub fn new() -> Self {
        Self
    }

    fn run_journalctl(user: bool) -> Result<Option<String>> {
        let mut cmd = Command::new("journalctl");
        if user {
            cmd.arg("--user");
        }
        let output = cmd
            .args(["--no-pager", "-n", JOURNAL_LINES, "--since", JOURNAL_SINCE])
            .output()
            .context("Failed to execute journalctl")?;

        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}

impl LaunchLogSource for JournalLaunchLog {
    fn recent_lines(&self) -> Result<Vec<String>> {
        let text = match Self::run_journalctl(true)? {
            Some(text) => text,
            None => Self::run_journalctl(false)?
                .context("journalctl failed for both user and system journals")?,
        };

        Ok(text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.to_string())
            .collect())
    }
}

/// Launch log that never has entries
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLaunchLog;

impl LaunchLogSource for NoLaunchLog {
    fn recent_lines(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Most recent launches recorded by the launch script
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LaunchInfo {
    pub last_launch_command: Option<String>,
    pub last_basename: Option<String>,
    /// Distinct executable names, oldest first
    pub recent_basenames: Vec<String>,
}

impl LaunchInfo {
    /// Extract launch commands and executable names from log lines
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let command_marker = format!("{}: game launch command is:", SCRIPT_LOG_TAG);
        let exe_marker = format!("{}: executable is:", SCRIPT_LOG_TAG);

        let mut last_launch_command = None;
        let mut basenames: Vec<String> = Vec::new();

        for line in lines {
            let line = line.as_ref();
            if let Some((_, command)) = line.split_once(command_marker.as_str()) {
                let command = command.trim();
                if let Some(basename) = launch_command_basename(command) {
                    basenames.push(basename);
                }
                last_launch_command = Some(command.to_string());
            } else if let Some((_, exe)) = line.split_once(exe_marker.as_str()) {
                let exe = exe.trim();
                if !exe.is_empty() && !basenames.iter().any(|b| b == exe) {
                    basenames.push(exe.to_string());
                }
            }
        }

        let last_basename = basenames.last().cloned();
        let mut recent_basenames: Vec<String> = Vec::new();
        for name in basenames {
            if !recent_basenames.contains(&name) {
                recent_basenames.push(name);
            }
        }

        Self {
            last_launch_command,
            last_basename,
            recent_basenames,
        }
    }

    /// Read the launch log; an unavailable journal yields no entries
    pub fn read(source: &dyn LaunchLogSource, logger: &EngineLogger) -> Self {
        match source.recent_lines() {
            Ok(lines) => Self::from_lines(&lines),
            Err(e) => {
                logger.log_degradation("launch log", &format!("{:#}", e));
                Self::default()
            }
        }
    }
}

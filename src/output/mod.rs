//! Output formatting module
//!
//! Handles:
//! - Human-readable rendering of configuration responses and profile listings
//! - Detection report rendering
//! - JSON output of any response (`--json`)

use anyhow::Result;
use serde::Serialize;

use crate::detect::{DetectionReport, ProcessInfo};
use crate::models::ConfigurationData;
use crate::schema::{self, FieldValue};
use crate::service::{ConfigurationResponse, ProfileListResponse};

fn display_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Int(i) => i.to_string(),
        FieldValue::Float(f) => f.to_string(),
        FieldValue::Str(s) if s.is_empty() => "(unset)".to_string(),
        FieldValue::Str(s) => s.clone(),
    }
}

/// One `name = value` line per field, in schema order
pub fn format_config(config: &ConfigurationData, indent: &str) -> String {
    let width = schema::FIELDS.iter().map(|f| f.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for field in schema::FIELDS {
        if let Ok(value) = config.get(field.name) {
            out.push_str(&format!(
                "{}{:width$} = {}\n",
                indent,
                field.name,
                display_value(&value),
                width = width
            ));
        }
    }
    out
}

pub fn format_response(response: &ConfigurationResponse) -> String {
    let mut out = String::new();
    if let Some(message) = &response.message {
        out.push_str(&format!("{}\n", message));
    }
    if let Some(error) = &response.error {
        out.push_str(&format!("Error: {}\n", error));
    }
    if let Some(config) = &response.config {
        out.push('\n');
        out.push_str(&format_config(config, "  "));
    }
    out
}

pub fn format_profile_list(response: &ProfileListResponse) -> String {
    let mut out = String::new();
    if let Some(error) = &response.error {
        out.push_str(&format!("Error: {}\n", error));
        return out;
    }
    if let Some(message) = &response.message {
        out.push_str(&format!("{}\n", message));
    }
    for (name, config) in &response.game_profiles.0 {
        out.push_str(&format!("\n{}:\n", name));
        out.push_str(&format_config(config, "  "));
    }
    out
}

fn push_processes(out: &mut String, title: &str, processes: &[ProcessInfo]) {
    out.push_str(&format!("{} ({}):\n", title, processes.len()));
    if processes.is_empty() {
        out.push_str("  (none)\n");
    }
    for process in processes {
        out.push_str(&format!("  {:>7}  {:<15}  {}\n", process.pid, process.name, process.args));
    }
}

pub fn format_detection_report(report: &DetectionReport) -> String {
    let mut out = String::new();
    match (&report.active_profile, report.strategy) {
        (Some(profile), Some(strategy)) => out.push_str(&format!(
            "Active profile: {} (via {})\n",
            profile,
            strategy.as_str()
        )),
        _ => out.push_str("Active profile: none detected\n"),
    }
    out.push('\n');
    push_processes(&mut out, "Vulkan processes", &report.vulkan_processes);
    push_processes(&mut out, "Launcher processes", &report.launcher_processes);
    push_processes(&mut out, "Game processes", &report.game_processes);
    if report.total_game_processes > report.game_processes.len() {
        out.push_str(&format!(
            "  ... {} more not shown\n",
            report.total_game_processes - report.game_processes.len()
        ));
    }

    let launch = &report.launch;
    out.push_str("\nRecent launches:\n");
    match &launch.last_launch_command {
        Some(command) => out.push_str(&format!("  Last command: {}\n", command)),
        None => out.push_str("  (none in the last hour)\n"),
    }
    if let Some(basename) = &launch.last_basename {
        out.push_str(&format!("  Last executable: {}\n", basename));
    }
    if !launch.recent_basenames.is_empty() {
        out.push_str(&format!("  Recent executables: {}\n", launch.recent_basenames.join(", ")));
    }
    out
}

/// Pretty JSON for `--json`
pub fn format_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

//! Active profile detection
//!
//! Best-effort inference of which game profile belongs to the running game.
//! Every strategy works on an injected [`ProcessSource`], so each one can be
//! exercised against a fake process table.
//!
//! Strategies:
//! - environment: Vulkan-using processes of the current user carrying `LSFG_PROCESS`
//! - arguments: `LSFG_PROCESS=<name>` visible in a launcher's command line
//! - executable: `.exe` process names mapped to the profile naming scheme
//!
//! Finding nothing is a normal outcome, not an error.
//!
//! The diagnostic report also reads the launch script's journal entries
//! through a [`LaunchLogSource`].

pub mod journal;
pub mod procfs;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::constants::{DEFAULT_PROFILE, MAX_REPORTED_PROCESSES, PROFILE_SELECTOR_VAR};
use crate::logging::EngineLogger;

pub use journal::{JournalLaunchLog, LaunchInfo, LaunchLogSource, NoLaunchLog};

/// First `*.exe` file name in a command, Unix or Wine path
static EXE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([^/\\\s]+\.exe)(?:\s|$)").expect("exe name pattern is valid")
});

/// `LSFG_PROCESS=<name>` in an argument string
static SELECTOR_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{}=(\S+)", PROFILE_SELECTOR_VAR)).expect("selector pattern is valid")
});

/// Errors from the process table collaborator
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Access denied reading process {pid}")]
    AccessDenied { pid: u32 },

    #[error("Process {pid} no longer exists")]
    NotFound { pid: u32 },

    #[error("I/O error reading process {pid}: {source}")]
    Io {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to enumerate processes: {0}")]
    Enumeration(String),
}

/// One row of the process table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub parent_pid: Option<u32>,
    /// Kernel command name (truncated to 15 characters on Linux)
    pub name: String,
    /// Full argument string, space separated
    pub args: String,
    /// Owning user, when known
    pub uid: Option<u32>,
}

/// Operating system process table
pub trait ProcessSource {
    fn list_processes(&self) -> Result<Vec<ProcessInfo>, ProcessError>;

    /// `KEY=VALUE` entries of a process environment
    fn read_environ(&self, pid: u32) -> Result<Vec<String>, ProcessError>;

    /// Memory mapping listing of a process
    fn read_maps(&self, pid: u32) -> Result<String, ProcessError>;

    fn current_uid(&self) -> u32;
}

/// Which strategy produced a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionStrategy {
    Environment,
    Arguments,
    Executable,
}

impl DetectionStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            DetectionStrategy::Environment => "environment",
            DetectionStrategy::Arguments => "arguments",
            DetectionStrategy::Executable => "executable",
        }
    }
}

/// A resolved active profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub profile: String,
    pub strategy: DetectionStrategy,
}

/// Process table captured for a single detection query
#[derive(Debug, Clone, Default)]
pub struct ProcessSnapshot {
    pub processes: Vec<ProcessInfo>,
    /// Processes of the current user with a Vulkan library mapped
    pub vulkan_pids: Vec<u32>,
}

impl ProcessSnapshot {
    /// Enumerate processes and classify Vulkan users.
    ///
    /// Only enumeration failure is an error; unreadable or vanished
    /// processes are skipped.
    pub fn capture(source: &dyn ProcessSource, logger: &EngineLogger) -> Result<Self, ProcessError> {
        let processes = source.list_processes()?;
        let uid = source.current_uid();

        let mut vulkan_pids = Vec::new();
        for process in processes.iter().filter(|p| p.uid == Some(uid)) {
            match source.read_maps(process.pid) {
                Ok(maps) => {
                    if maps.to_ascii_lowercase().contains("vulkan") {
                        vulkan_pids.push(process.pid);
                    }
                }
                Err(e) => logger.debug(&format!("Skipping process {}: {}", process.pid, e)),
            }
        }

        logger.debug(&format!(
            "Captured {} processes, {} using Vulkan",
            processes.len(),
            vulkan_pids.len()
        ));

        Ok(Self {
            processes,
            vulkan_pids,
        })
    }

    /// Processes whose arguments mention the launch script or the selector variable
    pub fn launcher_processes(&self) -> Vec<&ProcessInfo> {
        self.processes
            .iter()
            .filter(|p| p.args.to_lowercase().contains("lsfg") || p.args.contains(PROFILE_SELECTOR_VAR))
            .collect()
    }

    /// Candidate game processes: Windows executables, Proton or Steam
    pub fn game_processes(&self) -> Vec<&ProcessInfo> {
        self.processes
            .iter()
            .filter(|p| {
                let args = p.args.to_lowercase();
                [".exe", "proton", "steam"].iter().any(|pattern| args.contains(pattern))
            })
            .collect()
    }

    pub fn vulkan_processes(&self) -> Vec<&ProcessInfo> {
        self.processes
            .iter()
            .filter(|p| self.vulkan_pids.contains(&p.pid))
            .collect()
    }
}

/// Profile identifier the launch script derives from an executable name:
/// drop `.exe`, map anything outside `[A-Za-z0-9_-]` to `-`, lowercase
pub fn profile_name_for_executable(exe: &str) -> String {
    let stem = exe.strip_suffix(".exe").unwrap_or(exe);
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

fn strip_quotes(value: &str) -> &str {
    value.trim_matches(|c| c == '"' || c == '\'')
}

/// Executable file name from a launch command.
///
/// Prefers the first `*.exe` file name (Unix or Wine path); otherwise the last
/// path-like token that is not a Steam, Proton or wrapper component.
pub fn launch_command_basename(command: &str) -> Option<String> {
    if let Some(caps) = EXE_NAME.captures(command) {
        let name = strip_quotes(&caps[1]);
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }

    for part in command.split_whitespace().rev() {
        let lower = part.to_lowercase();
        if ["steam", "proton", "reaper", "wrapper"]
            .iter()
            .any(|skip| lower.contains(skip))
        {
            continue;
        }

        if let Some((_, filename)) = part.rsplit_once('/') {
            let filename = strip_quotes(filename);
            if filename.contains('.') && !filename.is_empty() && !filename.starts_with('-') {
                return Some(filename.to_string());
            }
        }
    }

    None
}

/// Infers the running game's profile from process state
pub struct ActiveProfileDetector<'a> {
    source: &'a dyn ProcessSource,
    logger: EngineLogger,
}

impl<'a> ActiveProfileDetector<'a> {
    pub fn new(source: &'a dyn ProcessSource, logger: EngineLogger) -> Self {
        Self { source, logger }
    }

    pub fn capture(&self) -> Result<ProcessSnapshot, ProcessError> {
        ProcessSnapshot::capture(self.source, &self.logger)
    }

    /// Primary strategy over a fresh snapshot
    pub fn detect(&self) -> Option<String> {
        match self.capture() {
            Ok(snapshot) => self.detect_from_environment(&snapshot),
            Err(e) => {
                self.logger.warn(&format!("Process enumeration failed: {}", e));
                None
            }
        }
    }

    /// First non-default `LSFG_PROCESS` value in a Vulkan process environment
    pub fn detect_from_environment(&self, snapshot: &ProcessSnapshot) -> Option<String> {
        let prefix = format!("{}=", PROFILE_SELECTOR_VAR);

        for &pid in &snapshot.vulkan_pids {
            let environ = match self.source.read_environ(pid) {
                Ok(environ) => environ,
                Err(e) => {
                    self.logger.debug(&format!("Skipping environment of {}: {}", pid, e));
                    continue;
                }
            };

            let value = environ
                .iter()
                .find_map(|entry| entry.strip_prefix(prefix.as_str()));
            if let Some(value) = value {
                if !value.is_empty() && value != DEFAULT_PROFILE {
                    self.logger.debug(&format!("Process {} selects profile {}", pid, value));
                    return Some(value.to_string());
                }
            }
        }

        None
    }

    /// `LSFG_PROCESS=<name>` in a launcher's arguments, restricted to known profiles
    pub fn detect_from_arguments(&self, snapshot: &ProcessSnapshot, known: &[String]) -> Option<String> {
        for process in snapshot.launcher_processes() {
            let Some(caps) = SELECTOR_ASSIGNMENT.captures(&process.args) else {
                continue;
            };
            let name = strip_quotes(&caps[1]);
            if name != DEFAULT_PROFILE && known.iter().any(|k| k == name) {
                return Some(name.to_string());
            }
        }

        None
    }

    /// `.exe` process names (or launch arguments) mapped to known profile names
    pub fn detect_from_executables(&self, snapshot: &ProcessSnapshot, known: &[String]) -> Option<String> {
        for process in snapshot.game_processes() {
            let mut candidates = Vec::new();
            if process.name.ends_with(".exe") {
                candidates.push(profile_name_for_executable(&process.name.replace(' ', "-")));
            }
            // Kernel names are truncated, the argument string is not
            if let Some(exe) = launch_command_basename(&process.args) {
                if exe.to_lowercase().ends_with(".exe") {
                    let stem = &exe[..exe.len() - 4];
                    candidates.push(profile_name_for_executable(stem));
                }
            }

            if let Some(name) = candidates.into_iter().find(|c| known.iter().any(|k| k == c)) {
                return Some(name);
            }
        }

        None
    }

    /// Chain every strategy; an environment hit must name a known profile
    pub fn resolve(&self, snapshot: &ProcessSnapshot, known: &[String]) -> Option<Detection> {
        let detection = if let Some(profile) = self.detect_from_environment(snapshot) {
            if known.contains(&profile) {
                Some(Detection {
                    profile,
                    strategy: DetectionStrategy::Environment,
                })
            } else {
                self.logger.warn(&format!(
                    "Profile '{}' found in process environment but not in config file",
                    profile
                ));
                None
            }
        } else {
            None
        };

        let detection = detection
            .or_else(|| {
                self.detect_from_arguments(snapshot, known).map(|profile| Detection {
                    profile,
                    strategy: DetectionStrategy::Arguments,
                })
            })
            .or_else(|| {
                self.detect_from_executables(snapshot, known).map(|profile| Detection {
                    profile,
                    strategy: DetectionStrategy::Executable,
                })
            });

        self.logger.log_profile_detection(
            detection.as_ref().map(|d| d.profile.as_str()),
            detection.as_ref().map(|d| d.strategy.as_str()),
        );
        detection
    }

    /// Diagnostic view of the process table, the detection outcome and recent launches
    pub fn report(
        &self,
        known: &[String],
        launch_log: &dyn LaunchLogSource,
    ) -> Result<DetectionReport, ProcessError> {
        let snapshot = self.capture()?;
        let detection = self.resolve(&snapshot, known);
        let game_processes: Vec<ProcessInfo> = snapshot.game_processes().into_iter().cloned().collect();

        Ok(DetectionReport {
            active_profile: detection.as_ref().map(|d| d.profile.clone()),
            strategy: detection.map(|d| d.strategy),
            vulkan_processes: snapshot.vulkan_processes().into_iter().cloned().collect(),
            launcher_processes: snapshot.launcher_processes().into_iter().cloned().collect(),
            total_game_processes: game_processes.len(),
            game_processes: game_processes.into_iter().take(MAX_REPORTED_PROCESSES).collect(),
            launch: LaunchInfo::read(launch_log, &self.logger),
        })
    }
}

/// Output of the `detect` diagnostic
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub active_profile: Option<String>,
    pub strategy: Option<DetectionStrategy>,
    pub vulkan_processes: Vec<ProcessInfo>,
    pub launcher_processes: Vec<ProcessInfo>,
    pub game_processes: Vec<ProcessInfo>,
    pub total_game_processes: usize,
    #[serde(flatten)]
    pub launch: LaunchInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory process table
    #[derive(Default)]
    struct FakeSource {
        processes: Vec<ProcessInfo>,
        environ: HashMap<u32, Vec<String>>,
        maps: HashMap<u32, String>,
        denied: Vec<u32>,
        fail_listing: bool,
    }

    impl FakeSource {
        fn with_process(mut self, pid: u32, name: &str, args: &str) -> Self {
            self.processes.push(ProcessInfo {
                pid,
                parent_pid: Some(1),
                name: name.to_string(),
                args: args.to_string(),
                uid: Some(1000),
            });
            self
        }

        fn vulkan(mut self, pid: u32, env: &[&str]) -> Self {
            self.maps
                .insert(pid, "7f00 r-xp /usr/lib/libvulkan.so.1\n".to_string());
            self.environ
                .insert(pid, env.iter().map(|s| s.to_string()).collect());
            self
        }
    }

    impl ProcessSource for FakeSource {
        fn list_processes(&self) -> Result<Vec<ProcessInfo>, ProcessError> {
            if self.fail_listing {
                return Err(ProcessError::Enumeration("boom".to_string()));
            }
            Ok(self.processes.clone())
        }

        fn read_environ(&self, pid: u32) -> Result<Vec<String>, ProcessError> {
            if self.denied.contains(&pid) {
                return Err(ProcessError::AccessDenied { pid });
            }
            self.environ
                .get(&pid)
                .cloned()
                .ok_or(ProcessError::NotFound { pid })
        }

        fn read_maps(&self, pid: u32) -> Result<String, ProcessError> {
            self.maps.get(&pid).cloned().ok_or(ProcessError::NotFound { pid })
        }

        fn current_uid(&self) -> u32 {
            1000
        }
    }

    fn known(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // ==================== Naming tests ====================

    #[test]
    fn test_profile_name_matches_script_sanitizer() {
        assert_eq!(profile_name_for_executable("EldenRing.exe"), "eldenring");
        assert_eq!(profile_name_for_executable("Hollow Knight.exe"), "hollow-knight");
        assert_eq!(profile_name_for_executable("game_v1.2.exe"), "game_v1-2");
    }

    #[test]
    fn test_launch_command_basename_prefers_exe() {
        let cmd = "/home/deck/.steam/steam/steamapps/common/Proton 9.0/proton waitforexitandrun /games/Cyberpunk/bin/x64/Cyberpunk2077.exe -skipStartScreen";
        assert_eq!(launch_command_basename(cmd), Some("Cyberpunk2077.exe".to_string()));
    }

    #[test]
    fn test_launch_command_basename_path_fallback() {
        let cmd = "/usr/bin/steam-runtime-wrapper /opt/games/celeste/Celeste.bin.x86_64 --fullscreen";
        assert_eq!(launch_command_basename(cmd), Some("Celeste.bin.x86_64".to_string()));
        assert_eq!(launch_command_basename("bash -c run"), None);
    }

    #[test]
    fn test_patterns_are_shared_across_calls() {
        let first = launch_command_basename("proton run /g/A.exe");
        let second = launch_command_basename("proton run /g/B.EXE --flag");
        assert_eq!(first.as_deref(), Some("A.exe"));
        assert_eq!(second.as_deref(), Some("B.EXE"));
        assert!(SELECTOR_ASSIGNMENT.is_match("env LSFG_PROCESS=hades ~/lsfg"));
    }

    // ==================== Snapshot tests ====================

    #[test]
    fn test_snapshot_classifies_processes() {
        let source = FakeSource::default()
            .with_process(10, "bash", "/bin/bash /home/deck/lsfg /games/Hades.exe")
            .with_process(11, "Hades.exe", "Z:\\games\\Hades.exe")
            .with_process(12, "kwin", "/usr/bin/kwin_wayland")
            .vulkan(11, &[]);
        let snapshot = ProcessSnapshot::capture(&source, &EngineLogger::silent()).expect("capture");

        assert_eq!(snapshot.vulkan_pids, vec![11]);
        let launchers: Vec<u32> = snapshot.launcher_processes().iter().map(|p| p.pid).collect();
        assert_eq!(launchers, vec![10]);
        let games: Vec<u32> = snapshot.game_processes().iter().map(|p| p.pid).collect();
        assert_eq!(games, vec![10, 11]);
    }

    #[test]
    fn test_snapshot_skips_other_users() {
        let mut source = FakeSource::default().with_process(20, "game.exe", "game.exe").vulkan(20, &[]);
        source.processes[0].uid = Some(0);
        let snapshot = ProcessSnapshot::capture(&source, &EngineLogger::silent()).expect("capture");
        assert!(snapshot.vulkan_pids.is_empty(), "Foreign processes are not inspected");
    }

    // ==================== Environment strategy tests ====================

    #[test]
    fn test_environment_skips_default_and_denied() {
        let mut source = FakeSource::default()
            .with_process(30, "a.exe", "a.exe")
            .with_process(31, "b.exe", "b.exe")
            .with_process(32, "c.exe", "c.exe")
            .vulkan(30, &["LSFG_PROCESS=decky-lsfg-vk"])
            .vulkan(31, &["LSFG_PROCESS=secret"])
            .vulkan(32, &["HOME=/home/deck", "LSFG_PROCESS=hades"]);
        source.denied.push(31);

        let detector = ActiveProfileDetector::new(&source, EngineLogger::silent());
        assert_eq!(detector.detect(), Some("hades".to_string()));
    }

    #[test]
    fn test_environment_none_is_normal() {
        let source = FakeSource::default().with_process(40, "kwin", "kwin").vulkan(40, &["PATH=/usr/bin"]);
        let detector = ActiveProfileDetector::new(&source, EngineLogger::silent());
        assert_eq!(detector.detect(), None);
    }

    #[test]
    fn test_enumeration_failure_is_a_miss() {
        let source = FakeSource {
            fail_listing: true,
            ..Default::default()
        };
        let detector = ActiveProfileDetector::new(&source, EngineLogger::silent());
        assert_eq!(detector.detect(), None);
    }

    // ==================== Fallback strategy tests ====================

    #[test]
    fn test_arguments_fallback_requires_known_profile() {
        let source = FakeSource::default()
            .with_process(50, "env", "env LSFG_PROCESS=\"unknown\" /home/deck/lsfg run")
            .with_process(51, "env", "env LSFG_PROCESS='hades' /home/deck/lsfg run");
        let detector = ActiveProfileDetector::new(&source, EngineLogger::silent());
        let snapshot = detector.capture().expect("capture");
        assert_eq!(
            detector.detect_from_arguments(&snapshot, &known(&["hades"])),
            Some("hades".to_string())
        );
        assert_eq!(detector.detect_from_arguments(&snapshot, &known(&["other"])), None);
    }

    #[test]
    fn test_executable_fallback_uses_args_for_truncated_names() {
        let source = FakeSource::default()
            .with_process(60, "HollowKnight.ex", "Z:\\steam\\HollowKnight.exe")
            .with_process(61, "Hades.exe", "/games/Hades.exe");
        let detector = ActiveProfileDetector::new(&source, EngineLogger::silent());
        let snapshot = detector.capture().expect("capture");

        assert_eq!(
            detector.detect_from_executables(&snapshot, &known(&["hollowknight"])),
            Some("hollowknight".to_string()),
            "Truncated kernel name falls back to the Wine path in the arguments"
        );
        assert_eq!(
            detector.detect_from_executables(&snapshot, &known(&["hades"])),
            Some("hades".to_string())
        );
    }

    #[test]
    fn test_resolve_chains_strategies() {
        let source = FakeSource::default()
            .with_process(70, "x.exe", "x.exe")
            .vulkan(70, &["LSFG_PROCESS=not-in-config"])
            .with_process(71, "Hades.exe", "/games/Hades.exe");
        let detector = ActiveProfileDetector::new(&source, EngineLogger::silent());
        let snapshot = detector.capture().expect("capture");

        let detection = detector.resolve(&snapshot, &known(&["hades"])).expect("fallback hit");
        assert_eq!(detection.profile, "hades");
        assert_eq!(detection.strategy, DetectionStrategy::Executable);
    }

    #[test]
    fn test_report_caps_game_processes() {
        let mut source = FakeSource::default();
        for pid in 0..30 {
            source = source.with_process(100 + pid, "steam", "/usr/bin/steam");
        }
        let detector = ActiveProfileDetector::new(&source, EngineLogger::silent());
        let report = detector.report(&[], &NoLaunchLog).expect("report");
        assert_eq!(report.game_processes.len(), MAX_REPORTED_PROCESSES);
        assert_eq!(report.total_game_processes, 30);
        assert!(report.active_profile.is_none());
    }
}

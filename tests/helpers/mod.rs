#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use lsfgctl::detect::{LaunchLogSource, NoLaunchLog, ProcessError, ProcessInfo, ProcessSource};
use lsfgctl::dll::NoDllLocator;
use lsfgctl::logging::EngineLogger;
use lsfgctl::service::{ConfigurationService, EnginePaths};
use tempfile::TempDir;

pub const TEST_UID: u32 = 1000;

/// In-memory process table with optional Vulkan users
#[derive(Debug, Clone, Default)]
pub struct FakeProcessSource {
    pub processes: Vec<ProcessInfo>,
    pub environ: HashMap<u32, Vec<String>>,
    pub maps: HashMap<u32, String>,
    pub fail_listing: bool,
}

impl FakeProcessSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table whose enumeration always fails
    pub fn broken() -> Self {
        Self {
            fail_listing: true,
            ..Self::default()
        }
    }

    pub fn process(mut self, pid: u32, name: &str, args: &str) -> Self {
        self.processes.push(ProcessInfo {
            pid,
            parent_pid: Some(1),
            name: name.to_string(),
            args: args.to_string(),
            uid: Some(TEST_UID),
        });
        self
    }

    /// A running game with Vulkan loaded and a profile selected
    pub fn game(self, pid: u32, exe: &str, profile: &str) -> Self {
        let mut source = self.process(pid, exe, &format!("/games/{}", exe));
        source
            .maps
            .insert(pid, "7f00-7f10 r-xp 00000000 /usr/lib/libvulkan.so.1\n".to_string());
        source
            .environ
            .insert(pid, vec![format!("LSFG_PROCESS={}", profile)]);
        source
    }
}

impl ProcessSource for FakeProcessSource {
    fn list_processes(&self) -> Result<Vec<ProcessInfo>, ProcessError> {
        if self.fail_listing {
            return Err(ProcessError::Enumeration("simulated failure".to_string()));
        }
        Ok(self.processes.clone())
    }

    fn read_environ(&self, pid: u32) -> Result<Vec<String>, ProcessError> {
        self.environ
            .get(&pid)
            .cloned()
            .ok_or(ProcessError::NotFound { pid })
    }

    fn read_maps(&self, pid: u32) -> Result<String, ProcessError> {
        self.maps.get(&pid).cloned().ok_or(ProcessError::AccessDenied { pid })
    }

    fn current_uid(&self) -> u32 {
        TEST_UID
    }
}

/// Launch log with fixed journal lines
#[derive(Debug, Clone, Default)]
pub struct FakeLaunchLog {
    pub lines: Vec<String>,
}

impl FakeLaunchLog {
    pub fn with_lines(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }
}

impl LaunchLogSource for FakeLaunchLog {
    fn recent_lines(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.lines.clone())
    }
}

/// Temporary home with conventional file locations
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub paths: EnginePaths,
}

impl TestEnvironment {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let paths = EnginePaths::in_home(temp_dir.path());
        Ok(Self { temp_dir, paths })
    }

    pub fn home(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.paths.config_file.clone()
    }

    pub fn script_path(&self) -> PathBuf {
        self.paths.script_file.clone()
    }

    /// Service with no DLL on disk and the given process table
    pub fn service(&self, processes: FakeProcessSource) -> ConfigurationService {
        ConfigurationService::new(self.paths.clone())
            .with_logger(EngineLogger::silent())
            .with_process_source(processes)
            .with_dll_locator(NoDllLocator)
            .with_launch_log(NoLaunchLog)
            .with_helper_command("/usr/bin/lsfgctl")
    }

    pub fn write_config(&self, content: &str) -> anyhow::Result<()> {
        let path = self.config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn write_script(&self, content: &str) -> anyhow::Result<()> {
        fs::write(self.script_path(), content)?;
        Ok(())
    }

    pub fn read_config(&self) -> String {
        fs::read_to_string(self.config_path()).unwrap_or_default()
    }

    pub fn read_script(&self) -> String {
        fs::read_to_string(self.script_path()).unwrap_or_default()
    }
}

/// JSON object literal as a request map
pub fn request(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("request must be a JSON object, got {}", other),
    }
}

/// Config file with per-game profiles for the given games; the default
/// profile's flow scale differs from the schema default
pub fn per_game_config(games: &[(&str, i64)]) -> String {
    let mut content = String::from(
        "version = 1\n\n[global]\ndll = \"/opt/Lossless.dll\"\n# per_game_profiles = true\n\n[[game]]\nexe = \"decky-lsfg-vk\"\nmultiplier = 2\nflow_scale = 0.6\n\n",
    );
    for (name, multiplier) in games {
        content.push_str(&format!(
            "[[game]]\nexe = \"{}\"\nmultiplier = {}\nflow_scale = 0.7\nhdr_mode = true\n\n",
            name, multiplier
        ));
    }
    content
}

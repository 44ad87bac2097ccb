//! Live process table backed by sysinfo and `/proc`

use std::io::ErrorKind;
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;

use sysinfo::{PidExt, ProcessExt, System, SystemExt};

use super::{ProcessError, ProcessInfo, ProcessSource};

/// Reads the real process table of this machine
#[derive(Debug, Clone)]
pub struct SystemProcessSource {
    proc_root: PathBuf,
}

impl SystemProcessSource {
    pub fn new() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
        }
    }

    fn proc_path(&self, pid: u32, entry: &str) -> PathBuf {
        self.proc_root.join(pid.to_string()).join(entry)
    }

    /// Owner of `/proc/<pid>`
    fn owner(&self, pid: u32) -> Option<u32> {
        std::fs::metadata(self.proc_root.join(pid.to_string()))
            .ok()
            .map(|meta| meta.uid())
    }

    fn read(&self, pid: u32, entry: &str) -> Result<Vec<u8>, ProcessError> {
        std::fs::read(self.proc_path(pid, entry)).map_err(|e| map_io_error(pid, e))
    }
}

impl Default for SystemProcessSource {
    fn default() -> Self {
        Self::new()
    }
}

fn map_io_error(pid: u32, error: std::io::Error) -> ProcessError {
    match error.kind() {
        ErrorKind::PermissionDenied => ProcessError::AccessDenied { pid },
        ErrorKind::NotFound => ProcessError::NotFound { pid },
        _ => ProcessError::Io { pid, source: error },
    }
}

impl ProcessSource for SystemProcessSource {
    fn list_processes(&self) -> Result<Vec<ProcessInfo>, ProcessError> {
        let system = System::new_all();

        let mut processes: Vec<ProcessInfo> = system
            .processes()
            .iter()
            .map(|(pid, process)| {
                let pid = pid.as_u32();
                ProcessInfo {
                    pid,
                    parent_pid: process.parent().map(|parent| parent.as_u32()),
                    name: process.name().to_string(),
                    args: process.cmd().join(" "),
                    uid: self.owner(pid),
                }
            })
            .collect();

        if processes.is_empty() {
            return Err(ProcessError::Enumeration(
                "process table is empty".to_string(),
            ));
        }

        processes.sort_by_key(|p| p.pid);
        Ok(processes)
    }

    fn read_environ(&self, pid: u32) -> Result<Vec<String>, ProcessError> {
        let raw = self.read(pid, "environ")?;
        Ok(raw
            .split(|b| *b == 0)
            .filter(|entry| !entry.is_empty())
            .map(|entry| String::from_utf8_lossy(entry).into_owned())
            .collect())
    }

    fn read_maps(&self, pid: u32) -> Result<String, ProcessError> {
        let raw = self.read(pid, "maps")?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    fn current_uid(&self) -> u32 {
        nix::unistd::getuid().as_raw()
    }
}

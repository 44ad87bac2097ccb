//! Lossless.dll discovery
//!
//! Only used to seed the `dll` field when no configuration exists yet.

use std::path::PathBuf;

use serde::Serialize;

use crate::constants::FALLBACK_DLL_PATH;

const DLL_RELATIVE_PATH: &str = "steamapps/common/Lossless Scaling/Lossless.dll";

/// Result of a discovery attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DllDetection {
    pub found: bool,
    pub path: String,
}

/// Finds the frame generation DLL
pub trait DllLocator {
    fn detect(&self) -> DllDetection;
}

/// Looks for Lossless.dll in the usual Steam library locations
#[derive(Debug, Clone)]
pub struct SteamDllLocator {
    home: Option<PathBuf>,
    data_home: Option<PathBuf>,
}

impl SteamDllLocator {
    pub fn new() -> Self {
        Self {
            home: dirs::home_dir(),
            data_home: dirs::data_dir(),
        }
    }

    /// Search beneath an explicit home directory
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            data_home: Some(home.join(".local/share")),
            home: Some(home),
        }
    }

    fn candidates(&self) -> Vec<PathBuf> {
        let mut steam_roots = Vec::new();
        if let Some(data) = &self.data_home {
            steam_roots.push(data.join("Steam"));
        }
        if let Some(home) = &self.home {
            steam_roots.push(home.join(".local/share/Steam"));
            steam_roots.push(home.join(".steam/steam"));
            steam_roots.push(home.join(".steam/root"));
            steam_roots.push(home.join(".var/app/com.valvesoftware.Steam/.local/share/Steam"));
        }
        steam_roots.dedup();
        steam_roots.iter().map(|root| root.join(DLL_RELATIVE_PATH)).collect()
    }
}

impl Default for SteamDllLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl DllLocator for SteamDllLocator {
    fn detect(&self) -> DllDetection {
        match self.candidates().iter().find(|path| path.is_file()) {
            Some(path) => DllDetection {
                found: true,
                path: path.display().to_string(),
            },
            None => not_found(),
        }
    }
}

/// Locator that never finds anything; callers fall back to the documented path
#[derive(Debug, Clone, Default)]
pub struct NoDllLocator;

impl DllLocator for NoDllLocator {
    fn detect(&self) -> DllDetection {
        not_found()
    }
}

fn not_found() -> DllDetection {
    DllDetection {
        found: false,
        path: String::new(),
    }
}

/// Detected path, or the documented fallback
pub fn default_dll_path(locator: &dyn DllLocator) -> String {
    let detection = locator.detect();
    if detection.found && !detection.path.is_empty() {
        detection.path
    } else {
        FALLBACK_DLL_PATH.to_string()
    }
}

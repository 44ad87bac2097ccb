//! Locations of the durable files
//!
//! Precedence: explicit override (CLI flag) > environment variable > convention
//! under the home directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::constants::{
    CONFIG_DIR, CONFIG_FILE_ENV, CONFIG_FILE_NAME, HELPER_BINARY, SCRIPT_FILE_ENV, SCRIPT_FILE_NAME,
};

/// Where the structured config file and launch script live
#[derive(Debug, Clone, PartialEq)]
pub struct EnginePaths {
    pub config_file: PathBuf,
    pub script_file: PathBuf,
}

fn from_env(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

impl EnginePaths {
    /// Conventional locations beneath `home`
    pub fn in_home(home: &Path) -> Self {
        Self {
            config_file: home.join(CONFIG_DIR).join(CONFIG_FILE_NAME),
            script_file: home.join(SCRIPT_FILE_NAME),
        }
    }

    /// Apply overrides, then environment, then convention
    pub fn resolve(config_override: Option<PathBuf>, script_override: Option<PathBuf>) -> Result<Self> {
        let config_file = config_override.or_else(|| from_env(CONFIG_FILE_ENV));
        let script_file = script_override.or_else(|| from_env(SCRIPT_FILE_ENV));

        if let (Some(config_file), Some(script_file)) = (&config_file, &script_file) {
            return Ok(Self {
                config_file: config_file.clone(),
                script_file: script_file.clone(),
            });
        }

        let home = dirs::home_dir().context("Could not determine home directory")?;
        let conventional = Self::in_home(&home);
        Ok(Self {
            config_file: config_file.unwrap_or(conventional.config_file),
            script_file: script_file.unwrap_or(conventional.script_file),
        })
    }
}

/// Command the launch script runs to create a missing profile
pub fn default_helper_command() -> String {
    std::env::current_exe()
        .ok()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| HELPER_BINARY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventional_layout() {
        let paths = EnginePaths::in_home(Path::new("/home/deck"));
        assert_eq!(paths.config_file, PathBuf::from("/home/deck/.config/lsfg-vk/conf.toml"));
        assert_eq!(paths.script_file, PathBuf::from("/home/deck/lsfg"));
    }

    #[test]
    fn test_overrides_win() {
        let paths = EnginePaths::resolve(
            Some(PathBuf::from("/tmp/a/conf.toml")),
            Some(PathBuf::from("/tmp/a/lsfg")),
        )
        .expect("resolve");
        assert_eq!(paths.config_file, PathBuf::from("/tmp/a/conf.toml"));
        assert_eq!(paths.script_file, PathBuf::from("/tmp/a/lsfg"));
    }

    #[test]
    fn test_helper_command_not_empty() {
        assert!(!default_helper_command().is_empty());
    }
}

//! Configuration service
//!
//! The operation surface used by the CLI (or any other front end):
//! - get_config / update_config: effective settings and global updates
//! - update_dll_path: change only the DLL location
//! - get_game_profile / update_game_profile / list_game_profiles: per-game profiles
//! - ensure_game_profile: create a profile once, called from the launch script
//! - detection_report: process detection diagnostics and recent launches
//!
//! Every operation returns a response value; nothing raises past this layer.
//! Read-side problems degrade to defaults, write failures fail the call.

pub mod paths;
pub mod response;

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

use crate::codec::config_file::{self, ConfigDocument};
use crate::codec::launch_script::{self, ScriptContext};
use crate::constants::{CONFIG_FILE_MODE, SCRIPT_FILE_MODE};
use crate::detect::procfs::SystemProcessSource;
use crate::detect::{
    ActiveProfileDetector, Detection, DetectionReport, JournalLaunchLog, LaunchLogSource,
    ProcessSource,
};
use crate::dll::{self, DllLocator, SteamDllLocator};
use crate::logging::{EngineLogger, LogLevel};
use crate::merge;
use crate::models::{ConfigurationData, NamedEntries, ProfileSettings, ScriptValues};
use crate::schema;
use crate::storage::{self, FileContent};

pub use paths::{default_helper_command, EnginePaths};
pub use response::{ConfigurationResponse, ProfileListResponse};

/// Structured file as found on disk
enum LoadedConfig {
    Missing,
    /// Present but unusable; defaults are substituted
    Degraded,
    Text(String),
}

/// Effective configuration plus a note when defaults were substituted
struct Effective {
    config: ConfigurationData,
    note: Option<String>,
}

/// Reads and writes lsfg-vk configuration
pub struct ConfigurationService {
    paths: EnginePaths,
    helper_command: String,
    logger: EngineLogger,
    process_source: Box<dyn ProcessSource>,
    dll_locator: Box<dyn DllLocator>,
    launch_log: Box<dyn LaunchLogSource>,
}

impl ConfigurationService {
    pub fn new(paths: EnginePaths) -> Self {
        Self {
            paths,
            helper_command: default_helper_command(),
            logger: EngineLogger::new("service", LogLevel::Debug),
            process_source: Box::new(SystemProcessSource::new()),
            dll_locator: Box::new(SteamDllLocator::new()),
            launch_log: Box::new(JournalLaunchLog::new()),
        }
    }

    pub fn with_logger(mut self, logger: EngineLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_process_source(mut self, source: impl ProcessSource + 'static) -> Self {
        self.process_source = Box::new(source);
        self
    }

    pub fn with_dll_locator(mut self, locator: impl DllLocator + 'static) -> Self {
        self.dll_locator = Box::new(locator);
        self
    }

    pub fn with_launch_log(mut self, launch_log: impl LaunchLogSource + 'static) -> Self {
        self.launch_log = Box::new(launch_log);
        self
    }

    pub fn with_helper_command(mut self, command: impl Into<String>) -> Self {
        self.helper_command = command.into();
        self
    }

    // ==================== Operations ====================

    /// Effective configuration: structured file overlaid with the launch script
    pub fn get_config(&self) -> ConfigurationResponse {
        match self.load_effective() {
            Ok(Effective { config, note }) => {
                let message = note.unwrap_or_else(|| "Configuration loaded".to_string());
                ConfigurationResponse::ok(config, message)
            }
            Err(e) => self.fail("Error reading lsfg config", e),
        }
    }

    /// Replace the global settings with a complete request
    pub fn update_config(&self, raw: &serde_json::Map<String, Value>) -> ConfigurationResponse {
        match self.try_update_config(raw) {
            Ok(config) => ConfigurationResponse::ok(config, "lsfg configuration updated successfully"),
            Err(e) => self.fail("Error updating lsfg config", e),
        }
    }

    /// Change only the DLL location
    pub fn update_dll_path(&self, path: &str) -> ConfigurationResponse {
        match self.try_update_dll_path(path) {
            Ok(config) => ConfigurationResponse::ok(config, format!("DLL path updated to: {}", path)),
            Err(e) => self.fail("Error updating DLL path", e),
        }
    }

    /// Effective configuration for one game
    pub fn get_game_profile(&self, name: &str) -> ConfigurationResponse {
        match self.try_get_game_profile(name) {
            Ok((config, message)) => ConfigurationResponse::ok(config, message),
            Err(e) => self.fail(&format!("Error getting game profile for {}", name), e),
        }
    }

    /// Create or update one game profile, leaving the others untouched
    pub fn update_game_profile(
        &self,
        name: &str,
        raw: &serde_json::Map<String, Value>,
    ) -> ConfigurationResponse {
        match self.write_game_profile(name, raw, true) {
            Ok(config) => ConfigurationResponse::ok(
                config,
                format!("Game profile '{}' updated successfully", name),
            ),
            Err(e) => self.fail(&format!("Error updating game profile '{}'", name), e),
        }
    }

    /// All profiles with their effective configuration
    pub fn list_game_profiles(&self) -> ProfileListResponse {
        match self.try_list_game_profiles() {
            Ok(response) => response,
            Err(e) => {
                let message = format!("Error listing game profiles: {:#}", e);
                self.logger.error(&message);
                ProfileListResponse::failure(message)
            }
        }
    }

    /// Create a profile from the current settings unless it already exists.
    ///
    /// Leaves the launch script alone, since the script is the caller.
    pub fn ensure_game_profile(&self, name: &str) -> ConfigurationResponse {
        let result = (|| -> Result<ConfigurationResponse> {
            let doc = self.read_document()?;
            if doc.profiles.contains(name) {
                let (config, _) = self.try_get_game_profile(name)?;
                return Ok(ConfigurationResponse::ok(
                    config,
                    format!("Profile '{}' already exists", name),
                ));
            }

            let current = self.load_effective()?.config;
            let mut raw = current.to_map();
            raw.insert(schema::PER_GAME_PROFILES.to_string(), Value::Bool(true));
            let config = self.write_game_profile(name, &raw, false)?;
            Ok(ConfigurationResponse::ok(
                config,
                format!("Profile '{}' created", name),
            ))
        })();

        result.unwrap_or_else(|e| self.fail(&format!("Error ensuring game profile '{}'", name), e))
    }

    /// Profile of the running game, trying every detection strategy
    pub fn detect_active_profile(&self) -> Option<Detection> {
        let known = match self.read_document() {
            Ok(doc) => doc.profiles.names(),
            Err(e) => {
                self.logger.warn(&format!("Cannot read profiles for detection: {:#}", e));
                return None;
            }
        };

        let detector = self.detector();
        match detector.capture() {
            Ok(snapshot) => detector.resolve(&snapshot, &known),
            Err(e) => {
                self.logger.warn(&format!("Could not detect active profile: {}", e));
                None
            }
        }
    }

    /// Process table diagnostics plus recent launches from the journal
    pub fn detection_report(&self) -> Result<DetectionReport> {
        let known = self.read_document()?.profiles.names();
        self.detector()
            .report(&known, self.launch_log.as_ref())
            .context("Failed to inspect running processes")
    }

    // ==================== Read path ====================

    fn detector(&self) -> ActiveProfileDetector<'_> {
        ActiveProfileDetector::new(self.process_source.as_ref(), self.logger.child("detect"))
    }

    fn script_context(&self) -> ScriptContext {
        ScriptContext {
            config_file: self.paths.config_file.clone(),
            script_file: self.paths.script_file.clone(),
            helper_command: self.helper_command.clone(),
        }
    }

    fn load_config_text(&self) -> Result<LoadedConfig> {
        let path = &self.paths.config_file;
        let content = storage::read_optional(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;

        Ok(match content {
            FileContent::Missing => LoadedConfig::Missing,
            FileContent::Unreadable => {
                self.logger
                    .log_degradation("config file", "content is not valid UTF-8");
                LoadedConfig::Degraded
            }
            FileContent::Text(text) => LoadedConfig::Text(text),
        })
    }

    /// Profiles and global block currently on disk; empty when absent
    fn read_document(&self) -> Result<ConfigDocument> {
        Ok(match self.load_config_text()? {
            LoadedConfig::Text(text) => config_file::parse_document(&text),
            LoadedConfig::Missing | LoadedConfig::Degraded => ConfigDocument::default(),
        })
    }

    /// Script-only values; any failure degrades to an empty result
    fn read_script_values(&self) -> ScriptValues {
        let path = &self.paths.script_file;
        match storage::read_optional(path) {
            Ok(FileContent::Text(text)) => {
                let values = launch_script::parse(&text);
                if values.is_empty() {
                    self.logger.debug("Launch script exports no script-only values");
                } else {
                    self.logger.debug(&format!("Parsed script values: {:?}", values));
                }
                values
            }
            Ok(FileContent::Missing) => ScriptValues::default(),
            Ok(FileContent::Unreadable) => {
                self.logger
                    .log_degradation("launch script", "content is not valid UTF-8");
                ScriptValues::default()
            }
            Err(e) => {
                self.logger.log_degradation("launch script", &e.to_string());
                ScriptValues::default()
            }
        }
    }

    /// Defaults seeded with a discovered DLL path
    fn seeded_defaults(&self) -> ConfigurationData {
        let mut config = schema::defaults();
        config.dll = dll::default_dll_path(self.dll_locator.as_ref());
        config
    }

    fn load_effective(&self) -> Result<Effective> {
        let (persisted, note) = match self.load_config_text()? {
            LoadedConfig::Text(text) => (config_file::parse_single(&text), None),
            LoadedConfig::Missing => (
                self.seeded_defaults(),
                Some("Using default configuration (config file not found)".to_string()),
            ),
            LoadedConfig::Degraded => (
                self.seeded_defaults(),
                Some("Using default configuration (config file could not be parsed)".to_string()),
            ),
        };

        let config = merge::merge_script_values(persisted, &self.read_script_values());
        Ok(Effective { config, note })
    }

    /// Profile settings laid over the file's global block and the script values
    fn profile_view(&self, doc: &ConfigDocument, settings: &ProfileSettings) -> ConfigurationData {
        let mut config = schema::defaults();
        config.apply_global(&doc.global);
        config.apply_profile(settings);
        merge::merge_script_values(config, &self.read_script_values())
    }

    fn try_get_game_profile(&self, name: &str) -> Result<(ConfigurationData, String)> {
        let doc = match self.load_config_text()? {
            LoadedConfig::Text(text) => config_file::parse_document(&text),
            LoadedConfig::Missing | LoadedConfig::Degraded => {
                let config =
                    merge::merge_script_values(self.seeded_defaults(), &self.read_script_values());
                return Ok((
                    config,
                    format!("Using default configuration for {} (config file not found)", name),
                ));
            }
        };

        Ok(match doc.profiles.get(name) {
            Some(settings) => (
                self.profile_view(&doc, settings),
                format!("Retrieved profile for {}", name),
            ),
            None => (
                self.profile_view(&doc, &ProfileSettings::default()),
                format!("Using default configuration for {} (profile not found)", name),
            ),
        })
    }

    fn try_list_game_profiles(&self) -> Result<ProfileListResponse> {
        let global_config = self.load_effective()?.config;
        let doc = match self.load_config_text()? {
            LoadedConfig::Text(text) => config_file::parse_document(&text),
            LoadedConfig::Missing | LoadedConfig::Degraded => {
                return Ok(ProfileListResponse::ok(
                    global_config,
                    NamedEntries::default(),
                    "No configuration file found",
                ));
            }
        };

        let entries: Vec<(String, ConfigurationData)> = doc
            .profiles
            .iter()
            .map(|profile| (profile.name.clone(), self.profile_view(&doc, &profile.settings)))
            .collect();
        let message = format!("Found {} game profiles", entries.len());
        Ok(ProfileListResponse::ok(global_config, NamedEntries(entries), message))
    }

    // ==================== Write path ====================

    fn write_config_text(&self, content: &str) -> Result<()> {
        let path = &self.paths.config_file;
        storage::write_in_place(path, content, CONFIG_FILE_MODE)
            .with_context(|| format!("Cannot write config file {}", path.display()))?;
        self.logger.log_config_write(path, content.len());
        Ok(())
    }

    /// Regenerate the launch script; failure only warns since the config write already landed
    fn write_script(&self, config: &ConfigurationData) {
        let path = &self.paths.script_file;
        let content = launch_script::generate(config, &self.script_context());
        match storage::write_in_place(path, &content, SCRIPT_FILE_MODE) {
            Ok(()) => self.logger.log_config_write(path, content.len()),
            Err(e) => self.logger.warn(&format!("Failed to update launch script: {}", e)),
        }
    }

    /// Running game's profile, restricted to profiles already in the file
    fn active_profile_for_write(&self, known: &[String]) -> Option<String> {
        let detector = self.detector();
        let snapshot = match detector.capture() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.logger.warn(&format!(
                    "Could not detect active profile: {}, updating default profile only",
                    e
                ));
                return None;
            }
        };
        detector.resolve(&snapshot, known).map(|d| d.profile)
    }

    fn try_update_config(&self, raw: &serde_json::Map<String, Value>) -> Result<ConfigurationData> {
        let config = schema::validate(raw);

        let content = if config.per_game_profiles {
            let mut profiles = self.read_document()?.profiles;
            let active = self.active_profile_for_write(&profiles.names());
            let updated = merge::refresh_profiles(&mut profiles, &config, active.as_deref());
            self.logger.info(&format!("Updating profiles: {}", updated.join(", ")));
            config_file::serialize_profiles(&config, &profiles)
        } else {
            config_file::serialize_single(&config)
        };

        self.write_config_text(&content)?;
        self.write_script(&config);
        Ok(config)
    }

    fn try_update_dll_path(&self, path: &str) -> Result<ConfigurationData> {
        let mut config = self.load_effective()?.config;
        config.dll = path.to_string();

        let content = if config.per_game_profiles {
            let doc = self.read_document()?;
            config_file::serialize_profiles(&config, &doc.profiles)
        } else {
            config_file::serialize_single(&config)
        };

        self.write_config_text(&content)?;
        self.logger.info(&format!("Updated DLL path in lsfg configuration: '{}'", path));
        Ok(config)
    }

    /// Shared body of profile creation and update
    fn write_game_profile(
        &self,
        name: &str,
        raw: &serde_json::Map<String, Value>,
        regenerate_script: bool,
    ) -> Result<ConfigurationData> {
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow!("Profile name must not be empty"));
        }

        let current = self.load_effective()?.config;
        let mut profiles = self.read_document()?.profiles;

        let mut requested = merge::fill_from_current(raw, &current);
        if !raw.contains_key(schema::PER_GAME_PROFILES) {
            requested.per_game_profiles = true;
        }

        profiles.upsert(name, requested.profile_settings());

        // Global block from the request, default profile synthesized from current settings
        let mut base = current.clone();
        base.apply_global(&requested.global_section());

        self.write_config_text(&config_file::serialize_profiles(&base, &profiles))?;
        if regenerate_script {
            self.write_script(&base);
        }
        self.logger.info(&format!("Updated game profile '{}'", name));

        let mut view = base;
        view.apply_profile(&requested.profile_settings());
        Ok(view)
    }

    fn fail(&self, what: &str, error: anyhow::Error) -> ConfigurationResponse {
        let message = format!("{}: {:#}", what, error);
        self.logger.error(&message);
        ConfigurationResponse::failure(message)
    }
}

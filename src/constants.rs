//! Global constants for lsfgctl
//!
//! Centralized location for file locations, environment variable names and
//! identifiers shared with the lsfg-vk layer and the generated launch script.

/// Reserved profile identifier used when no specific game is detected
/// and when per-game profiles are disabled
pub const DEFAULT_PROFILE: &str = "decky-lsfg-vk";

/// Environment variable lsfg-vk reads to select a `[[game]]` profile
pub const PROFILE_SELECTOR_VAR: &str = "LSFG_PROCESS";

/// Launch script variable for the DXVK frame-rate cap
pub const DXVK_FRAME_RATE_VAR: &str = "DXVK_FRAME_RATE";

/// Launch script variable enabling Proton's WOW64 mode for 32-bit games
pub const PROTON_WOW64_VAR: &str = "PROTON_USE_WOW64";

/// Launch script variable games inspect to detect handheld mode
pub const STEAMDECK_VAR: &str = "SteamDeck";

/// Config directory, relative to the home directory
pub const CONFIG_DIR: &str = ".config/lsfg-vk";

/// Structured config file name inside [`CONFIG_DIR`]
pub const CONFIG_FILE_NAME: &str = "conf.toml";

/// Launch script file name, relative to the home directory
pub const SCRIPT_FILE_NAME: &str = "lsfg";

/// Environment override for the structured config file location
pub const CONFIG_FILE_ENV: &str = "LSFGCTL_CONFIG_FILE";

/// Environment override for the launch script location
pub const SCRIPT_FILE_ENV: &str = "LSFGCTL_SCRIPT_FILE";

/// Mode applied to the structured config file
pub const CONFIG_FILE_MODE: u32 = 0o644;

/// Mode applied to the launch script
pub const SCRIPT_FILE_MODE: u32 = 0o755;

/// DLL location used when discovery finds nothing
pub const FALLBACK_DLL_PATH: &str =
    "/home/deck/.local/share/Steam/steamapps/common/Lossless Scaling/Lossless.dll";

/// Binary name used by the launch script when the executable path is unknown
pub const HELPER_BINARY: &str = "lsfgctl";

/// Prefix of every `logger` line written by the launch script
pub const SCRIPT_LOG_TAG: &str = "lsfg-vk-launch";

/// Maximum number of candidate game processes listed in a detection report
pub const MAX_REPORTED_PROCESSES: usize = 20;

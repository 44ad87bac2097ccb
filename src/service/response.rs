//! Response shapes returned by every service operation
//!
//! Operations never return `Err`; failures are carried as `success: false`
//! with an error message.

use serde::Serialize;

use crate::models::{ConfigurationData, NamedEntries};

/// Result of a configuration read or write
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationResponse {
    pub success: bool,
    pub config: Option<ConfigurationData>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ConfigurationResponse {
    pub fn ok(config: ConfigurationData, message: impl Into<String>) -> Self {
        Self {
            success: true,
            config: Some(config),
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            config: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Result of listing game profiles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileListResponse {
    pub success: bool,
    pub global_config: Option<ConfigurationData>,
    /// Effective configuration per profile, in file order
    pub game_profiles: NamedEntries<ConfigurationData>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ProfileListResponse {
    pub fn ok(
        global_config: ConfigurationData,
        game_profiles: NamedEntries<ConfigurationData>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            global_config: Some(global_config),
            game_profiles,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            global_config: None,
            game_profiles: NamedEntries::default(),
            message: None,
            error: Some(error.into()),
        }
    }
}

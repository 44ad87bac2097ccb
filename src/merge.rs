//! Merge engine
//!
//! Combines the structured file, the launch script and incoming requests
//! into the single effective configuration, and decides which game profiles
//! an update touches.
//!
//! Precedence rules:
//! - persisted fields come only from the structured file
//! - script-only fields come only from the launch script, unconditionally when exported
//! - an update always refreshes the default profile, plus the running game's profile

use serde_json::Value;

use crate::constants::DEFAULT_PROFILE;
use crate::models::{ConfigurationData, ProfileMap, ScriptValues};
use crate::schema;

/// Overlay script-only values onto a configuration parsed from the structured file
pub fn merge_script_values(mut config: ConfigurationData, script: &ScriptValues) -> ConfigurationData {
    if let Some(rate) = script.dxvk_frame_rate {
        config.dxvk_frame_rate = rate;
    }
    if let Some(enabled) = script.enable_wow64 {
        config.enable_wow64 = enabled;
    }
    if let Some(disabled) = script.disable_steamdeck_mode {
        config.disable_steamdeck_mode = disabled;
    }
    config
}

/// Apply incoming settings to the default profile and, when a different game
/// is running, to that game's profile as well.
///
/// Returns the names of the profiles that were written.
pub fn refresh_profiles(
    profiles: &mut ProfileMap,
    incoming: &ConfigurationData,
    active: Option<&str>,
) -> Vec<String> {
    let settings = incoming.profile_settings();
    let mut updated = vec![DEFAULT_PROFILE.to_string()];
    profiles.upsert(DEFAULT_PROFILE, settings.clone());

    if let Some(name) = active.filter(|name| *name != DEFAULT_PROFILE && !name.is_empty()) {
        profiles.upsert(name, settings);
        updated.push(name.to_string());
    }

    updated
}

/// Build a full configuration for a single-profile update.
///
/// Fields the caller left out are taken from `current` rather than from the
/// schema defaults, so a freshly created profile is an explicit copy of the
/// settings in effect.
pub fn fill_from_current(
    raw: &serde_json::Map<String, Value>,
    current: &ConfigurationData,
) -> ConfigurationData {
    let mut merged = current.to_map();
    for field in schema::FIELDS {
        if let Some(value) = raw.get(field.name) {
            // Keep the current value when the incoming one does not coerce
            if field.field_type.coerce(value).is_some() {
                merged.insert(field.name.to_string(), value.clone());
            }
        }
    }
    schema::validate(&merged)
}

//! Data models module
//!
//! Defines core data structures:
//! - ConfigurationData: fully populated, typed view of every setting
//! - GlobalSection: settings that live outside any game block
//! - ProfileSettings / GameProfile: the persisted per-game subset
//! - ProfileMap: insertion-ordered collection of game profiles
//! - ScriptValues: script-only settings recovered from the launch script
//!
//! Partial configurations never leave the parse boundary; every
//! `ConfigurationData` carries a value for every schema field.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::schema::{self, FieldType, FieldValue, SchemaError};

/// Effective value of every configuration field, in schema order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationData {
    pub dll: String,
    pub multiplier: i64,
    pub flow_scale: f64,
    pub performance_mode: bool,
    pub hdr_mode: bool,
    pub experimental_present_mode: String,
    pub dxvk_frame_rate: i64,
    pub enable_wow64: bool,
    pub disable_steamdeck_mode: bool,
    pub per_game_profiles: bool,
}

impl Default for ConfigurationData {
    fn default() -> Self {
        schema::defaults()
    }
}

fn mismatch(name: &str) -> SchemaError {
    match schema::field_type(name) {
        Ok(expected) => SchemaError::TypeMismatch {
            field: name.to_string(),
            expected,
        },
        Err(err) => err,
    }
}

impl ConfigurationData {
    /// Zero-valued placeholder, only used while building defaults
    pub(crate) fn empty() -> Self {
        Self {
            dll: String::new(),
            multiplier: 0,
            flow_scale: 0.0,
            performance_mode: false,
            hdr_mode: false,
            experimental_present_mode: String::new(),
            dxvk_frame_rate: 0,
            enable_wow64: false,
            disable_steamdeck_mode: false,
            per_game_profiles: false,
        }
    }

    /// Read a field by schema name
    pub fn get(&self, name: &str) -> Result<FieldValue, SchemaError> {
        let value = match name {
            schema::DLL => FieldValue::Str(self.dll.clone()),
            schema::MULTIPLIER => FieldValue::Int(self.multiplier),
            schema::FLOW_SCALE => FieldValue::Float(self.flow_scale),
            schema::PERFORMANCE_MODE => FieldValue::Bool(self.performance_mode),
            schema::HDR_MODE => FieldValue::Bool(self.hdr_mode),
            schema::EXPERIMENTAL_PRESENT_MODE => {
                FieldValue::Str(self.experimental_present_mode.clone())
            }
            schema::DXVK_FRAME_RATE => FieldValue::Int(self.dxvk_frame_rate),
            schema::ENABLE_WOW64 => FieldValue::Bool(self.enable_wow64),
            schema::DISABLE_STEAMDECK_MODE => FieldValue::Bool(self.disable_steamdeck_mode),
            schema::PER_GAME_PROFILES => FieldValue::Bool(self.per_game_profiles),
            _ => return Err(SchemaError::UnknownField(name.to_string())),
        };
        Ok(value)
    }

    /// Write a field by schema name; the value must already have the declared type
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<(), SchemaError> {
        match (name, value) {
            (schema::DLL, FieldValue::Str(v)) => self.dll = v,
            (schema::MULTIPLIER, FieldValue::Int(v)) => self.multiplier = v,
            (schema::FLOW_SCALE, FieldValue::Float(v)) => self.flow_scale = v,
            (schema::PERFORMANCE_MODE, FieldValue::Bool(v)) => self.performance_mode = v,
            (schema::HDR_MODE, FieldValue::Bool(v)) => self.hdr_mode = v,
            (schema::EXPERIMENTAL_PRESENT_MODE, FieldValue::Str(v)) => {
                self.experimental_present_mode = v
            }
            (schema::DXVK_FRAME_RATE, FieldValue::Int(v)) => self.dxvk_frame_rate = v,
            (schema::ENABLE_WOW64, FieldValue::Bool(v)) => self.enable_wow64 = v,
            (schema::DISABLE_STEAMDECK_MODE, FieldValue::Bool(v)) => {
                self.disable_steamdeck_mode = v
            }
            (schema::PER_GAME_PROFILES, FieldValue::Bool(v)) => self.per_game_profiles = v,
            (name, _) => return Err(mismatch(name)),
        }
        Ok(())
    }

    /// Loosely typed mapping of every field, suitable for `schema::validate`
    pub fn to_map(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }

    pub fn profile_settings(&self) -> ProfileSettings {
        ProfileSettings {
            multiplier: self.multiplier,
            flow_scale: self.flow_scale,
            performance_mode: self.performance_mode,
            hdr_mode: self.hdr_mode,
            experimental_present_mode: self.experimental_present_mode.clone(),
        }
    }

    /// Overwrite the per-game fields with a profile's values
    pub fn apply_profile(&mut self, settings: &ProfileSettings) {
        self.multiplier = settings.multiplier;
        self.flow_scale = settings.flow_scale;
        self.performance_mode = settings.performance_mode;
        self.hdr_mode = settings.hdr_mode;
        self.experimental_present_mode = settings.experimental_present_mode.clone();
    }

    pub fn global_section(&self) -> GlobalSection {
        GlobalSection {
            dll: self.dll.clone(),
            per_game_profiles: self.per_game_profiles,
        }
    }

    pub fn apply_global(&mut self, global: &GlobalSection) {
        self.dll = global.dll.clone();
        self.per_game_profiles = global.per_game_profiles;
    }
}

/// Settings meaningful outside any specific game
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GlobalSection {
    /// Lossless.dll location; empty when unset
    pub dll: String,
    /// Real value of the commented flag line
    pub per_game_profiles: bool,
}

/// Persisted per-game subset of the schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSettings {
    pub multiplier: i64,
    pub flow_scale: f64,
    pub performance_mode: bool,
    pub hdr_mode: bool,
    pub experimental_present_mode: String,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        schema::defaults().profile_settings()
    }
}

impl ProfileSettings {
    pub fn get(&self, name: &str) -> Result<FieldValue, SchemaError> {
        let value = match name {
            schema::MULTIPLIER => FieldValue::Int(self.multiplier),
            schema::FLOW_SCALE => FieldValue::Float(self.flow_scale),
            schema::PERFORMANCE_MODE => FieldValue::Bool(self.performance_mode),
            schema::HDR_MODE => FieldValue::Bool(self.hdr_mode),
            schema::EXPERIMENTAL_PRESENT_MODE => {
                FieldValue::Str(self.experimental_present_mode.clone())
            }
            _ => return Err(SchemaError::UnknownField(name.to_string())),
        };
        Ok(value)
    }

    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<(), SchemaError> {
        match (name, value) {
            (schema::MULTIPLIER, FieldValue::Int(v)) => self.multiplier = v,
            (schema::FLOW_SCALE, FieldValue::Float(v)) => self.flow_scale = v,
            (schema::PERFORMANCE_MODE, FieldValue::Bool(v)) => self.performance_mode = v,
            (schema::HDR_MODE, FieldValue::Bool(v)) => self.hdr_mode = v,
            (schema::EXPERIMENTAL_PRESENT_MODE, FieldValue::Str(v)) => {
                self.experimental_present_mode = v
            }
            (name, _) => return Err(mismatch(name)),
        }
        Ok(())
    }

    /// Set a field from raw file text, leaving the default when conversion fails
    pub fn set_from_text(&mut self, name: &str, text: &str) -> Result<(), SchemaError> {
        let field_type: FieldType = schema::field_type(name)?;
        match field_type.coerce_text(text) {
            Some(value) => self.set(name, value),
            None => Ok(()),
        }
    }
}

/// One `[[game]]` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameProfile {
    /// Value of the block's `exe` key
    pub name: String,
    pub settings: ProfileSettings,
}

/// Game profiles keyed by identifier, in file order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileMap {
    profiles: Vec<GameProfile>,
}

impl ProfileMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&ProfileSettings> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.settings)
    }

    /// Replace an existing profile in place, or append a new one
    pub fn upsert(&mut self, name: &str, settings: ProfileSettings) {
        match self.profiles.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.settings = settings,
            None => self.profiles.push(GameProfile {
                name: name.to_string(),
                settings,
            }),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameProfile> {
        self.profiles.iter()
    }
}

impl Serialize for ProfileMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.profiles.len()))?;
        for profile in &self.profiles {
            map.serialize_entry(&profile.name, &profile.settings)?;
        }
        map.end()
    }
}

/// Ordered name → value pairs that serialize as a JSON object
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamedEntries<T>(pub Vec<(String, T)>);

impl<T> NamedEntries<T> {
    pub fn get(&self, name: &str) -> Option<&T> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Serialize> Serialize for NamedEntries<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Script-only values found in the launch script; `None` when not exported
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScriptValues {
    pub dxvk_frame_rate: Option<i64>,
    pub enable_wow64: Option<bool>,
    pub disable_steamdeck_mode: Option<bool>,
}

impl ScriptValues {
    pub fn is_empty(&self) -> bool {
        self.dxvk_frame_rate.is_none()
            && self.enable_wow64.is_none()
            && self.disable_steamdeck_mode.is_none()
    }
}

//! Schema registry
//!
//! Canonical, ordered field definitions shared by every other component:
//! - FieldSpec: name, type, default and description of one setting
//! - FieldGroup: where a field is persisted (global block, profile, launch script)
//! - Coercion of loosely typed input into the declared field type
//!
//! The set of names is fixed at build time. Unknown names are ignored on read
//! and never emitted on write.

use serde_json::Value;
use thiserror::Error;

use crate::models::ConfigurationData;

pub const DLL: &str = "dll";
pub const MULTIPLIER: &str = "multiplier";
pub const FLOW_SCALE: &str = "flow_scale";
pub const PERFORMANCE_MODE: &str = "performance_mode";
pub const HDR_MODE: &str = "hdr_mode";
pub const EXPERIMENTAL_PRESENT_MODE: &str = "experimental_present_mode";
pub const DXVK_FRAME_RATE: &str = "dxvk_frame_rate";
pub const ENABLE_WOW64: &str = "enable_wow64";
pub const DISABLE_STEAMDECK_MODE: &str = "disable_steamdeck_mode";
pub const PER_GAME_PROFILES: &str = "per_game_profiles";

/// Errors raised by schema lookups
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Unknown configuration field: {0}")]
    UnknownField(String),

    #[error("Field {field} expects a {expected} value")]
    TypeMismatch { field: String, expected: FieldType },
}

/// Declared value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Str,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Str => "string",
        };
        write!(f, "{}", name)
    }
}

/// Where a field lives on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    /// `[global]` block of the structured file
    Global,
    /// Every `[[game]]` block of the structured file
    Profile,
    /// Exported variables of the launch script only
    Script,
}

impl FieldGroup {
    /// Whether fields of this group are written to the structured file
    pub fn is_persisted(self) -> bool {
        !matches!(self, FieldGroup::Script)
    }
}

/// Build-time default, usable in a `static` table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(&'static str),
}

impl DefaultValue {
    pub fn to_value(self) -> FieldValue {
        match self {
            DefaultValue::Bool(b) => FieldValue::Bool(b),
            DefaultValue::Int(i) => FieldValue::Int(i),
            DefaultValue::Float(f) => FieldValue::Float(f),
            DefaultValue::Str(s) => FieldValue::Str(s.to_string()),
        }
    }
}

/// A typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Canonical definition of one configuration field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub default: DefaultValue,
    pub description: &'static str,
    pub group: FieldGroup,
}

/// Every field, in serialization order
pub static FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: DLL,
        field_type: FieldType::Str,
        default: DefaultValue::Str(""),
        description: "specify where Lossless.dll is stored",
        group: FieldGroup::Global,
    },
    FieldSpec {
        name: MULTIPLIER,
        field_type: FieldType::Int,
        default: DefaultValue::Int(1),
        description: "change the fps multiplier",
        group: FieldGroup::Profile,
    },
    FieldSpec {
        name: FLOW_SCALE,
        field_type: FieldType::Float,
        default: DefaultValue::Float(0.8),
        description: "change the flow scale",
        group: FieldGroup::Profile,
    },
    FieldSpec {
        name: PERFORMANCE_MODE,
        field_type: FieldType::Bool,
        default: DefaultValue::Bool(true),
        description: "toggle performance mode",
        group: FieldGroup::Profile,
    },
    FieldSpec {
        name: HDR_MODE,
        field_type: FieldType::Bool,
        default: DefaultValue::Bool(false),
        description: "enable hdr mode",
        group: FieldGroup::Profile,
    },
    FieldSpec {
        name: EXPERIMENTAL_PRESENT_MODE,
        field_type: FieldType::Str,
        default: DefaultValue::Str("fifo"),
        description: "experimental: override vulkan present mode (fifo/mailbox/immediate)",
        group: FieldGroup::Profile,
    },
    FieldSpec {
        name: DXVK_FRAME_RATE,
        field_type: FieldType::Int,
        default: DefaultValue::Int(0),
        description: "base framerate cap for DirectX games, before frame multiplier (0 = disabled, requires game re-launch)",
        group: FieldGroup::Script,
    },
    FieldSpec {
        name: ENABLE_WOW64,
        field_type: FieldType::Bool,
        default: DefaultValue::Bool(false),
        description: "enable PROTON_USE_WOW64=1 for 32-bit games (use with ProtonGE to fix crashing)",
        group: FieldGroup::Script,
    },
    FieldSpec {
        name: DISABLE_STEAMDECK_MODE,
        field_type: FieldType::Bool,
        default: DefaultValue::Bool(false),
        description: "disable Steam Deck mode (unlocks hidden settings in some games)",
        group: FieldGroup::Script,
    },
    FieldSpec {
        name: PER_GAME_PROFILES,
        field_type: FieldType::Bool,
        default: DefaultValue::Bool(false),
        description: "enable per-game profiles instead of global configuration",
        group: FieldGroup::Global,
    },
];

/// Look up a field definition by name
pub fn spec(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Declared type of a field
pub fn field_type(name: &str) -> Result<FieldType, SchemaError> {
    spec(name)
        .map(|f| f.field_type)
        .ok_or_else(|| SchemaError::UnknownField(name.to_string()))
}

/// Fields written into each `[[game]]` block, in order
pub fn profile_fields() -> impl Iterator<Item = &'static FieldSpec> {
    FIELDS.iter().filter(|f| f.group == FieldGroup::Profile)
}

/// Fields that only live in the launch script
pub fn script_fields() -> impl Iterator<Item = &'static FieldSpec> {
    FIELDS.iter().filter(|f| f.group == FieldGroup::Script)
}

/// One default per field
pub fn defaults() -> ConfigurationData {
    let mut config = ConfigurationData::empty();
    for field in FIELDS {
        // Defaults always match their declared type
        let _ = config.set(field.name, field.default.to_value());
    }
    config
}

/// Coerce a loosely typed mapping into a fully populated configuration.
///
/// Never fails: a value that cannot be converted keeps that field's default,
/// absent fields take their default, unknown names are ignored.
pub fn validate(raw: &serde_json::Map<String, Value>) -> ConfigurationData {
    let mut config = defaults();
    for field in FIELDS {
        let Some(value) = raw.get(field.name) else {
            continue;
        };
        if let Some(coerced) = field.field_type.coerce(value) {
            let _ = config.set(field.name, coerced);
        }
    }
    config
}

impl FieldType {
    /// Convert a JSON value into this type, `None` on failure
    pub fn coerce(self, value: &Value) -> Option<FieldValue> {
        match self {
            FieldType::Bool => match value {
                Value::Bool(b) => Some(FieldValue::Bool(*b)),
                Value::Number(n) => n.as_f64().map(|f| FieldValue::Bool(f != 0.0)),
                Value::String(s) => parse_bool(s).map(FieldValue::Bool),
                _ => None,
            },
            FieldType::Int => match value {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                    .map(FieldValue::Int),
                Value::Bool(b) => Some(FieldValue::Int(i64::from(*b))),
                Value::String(s) => s.trim().parse::<i64>().ok().map(FieldValue::Int),
                _ => None,
            },
            FieldType::Float => match value {
                Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(FieldValue::Float),
                Value::Bool(b) => Some(FieldValue::Float(if *b { 1.0 } else { 0.0 })),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(FieldValue::Float),
                _ => None,
            },
            FieldType::Str => match value {
                Value::String(s) => Some(FieldValue::Str(s.clone())),
                Value::Number(n) => Some(FieldValue::Str(n.to_string())),
                Value::Bool(b) => Some(FieldValue::Str(b.to_string())),
                _ => None,
            },
        }
    }

    /// Convert raw text (already unquoted) into this type
    pub fn coerce_text(self, text: &str) -> Option<FieldValue> {
        self.coerce(&Value::String(text.to_string()))
    }
}

/// Boolean literal recognition shared by every text surface
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

//! Structured config file codec
//!
//! Reads and writes the restricted grammar lsfg-vk consumes: a version line,
//! at most one `[global]` block and any number of `[[game]]` blocks, each a
//! flat list of `key = value` lines.
//!
//! Parsing is a single line-oriented scan over a small state machine. Parsing
//! text never fails; unknown keys are skipped and a value that does not
//! convert leaves its field at the schema default.

use crate::constants::DEFAULT_PROFILE;
use crate::models::{ConfigurationData, GlobalSection, ProfileMap, ProfileSettings};
use crate::schema::{self, FieldValue};

const VERSION_LINE: &str = "version = 1";
const GLOBAL_HEADER: &str = "[global]";
const GAME_HEADER: &str = "[[game]]";
const EXE_KEY: &str = "exe";

/// Global block plus every game block found in a config file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigDocument {
    pub global: GlobalSection,
    pub profiles: ProfileMap,
}

/// Game block being accumulated until the next header or end of input
#[derive(Debug, Default)]
struct PendingProfile {
    name: Option<String>,
    settings: ProfileSettings,
}

/// Parser position within the file
#[derive(Debug)]
enum Section {
    None,
    Global,
    Game(PendingProfile),
}

impl Section {
    /// Move a finished game block into the map; blocks without `exe` are dropped
    fn flush_into(self, profiles: &mut ProfileMap) {
        if let Section::Game(PendingProfile {
            name: Some(name),
            settings,
        }) = self
        {
            if !name.is_empty() {
                profiles.upsert(&name, settings);
            }
        }
    }
}

/// The per-game flag line is always written commented out so lsfg-vk's own
/// parser ignores it; only the value after `=` matters here.
///
/// Returns `Some` when the line is the flag line, commented or not.
fn per_game_flag_value(line: &str) -> Option<bool> {
    let body = match line.strip_prefix('#') {
        Some(rest) => rest.trim_start(),
        None => line,
    };
    let rest = body.strip_prefix(schema::PER_GAME_PROFILES)?.trim_start();
    let value = rest.strip_prefix('=')?;
    Some(schema::parse_bool(strip_inline_comment(value)).unwrap_or(false))
}

fn strip_inline_comment(value: &str) -> &str {
    match value.find('#') {
        Some(idx) => value[..idx].trim(),
        None => value.trim(),
    }
}

/// Decode a value token: double quotes support the basic-string escapes
/// written by [`escape`], single quotes are literal, bare values may carry
/// a trailing comment.
fn parse_value(raw: &str) -> String {
    let raw = raw.trim();

    if let Some(rest) = raw.strip_prefix('"') {
        let mut out = String::new();
        let mut chars = rest.chars();
        while let Some(c) = chars.next() {
            match c {
                '"' => return out,
                '\\' => match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some('b') => out.push('\u{8}'),
                    Some('f') => out.push('\u{c}'),
                    Some(marker @ ('u' | 'U')) => {
                        let width = if marker == 'u' { 4 } else { 8 };
                        let hex: String = chars
                            .clone()
                            .take(width)
                            .take_while(|h| h.is_ascii_hexdigit())
                            .collect();
                        for _ in 0..hex.len() {
                            chars.next();
                        }
                        match decode_unicode(&hex, width) {
                            Some(decoded) => out.push(decoded),
                            None => {
                                out.push('\\');
                                out.push(marker);
                                out.push_str(&hex);
                            }
                        }
                    }
                    Some(other @ ('"' | '\\')) => out.push(other),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => out.push('\\'),
                },
                _ => out.push(c),
            }
        }
        // Unterminated quote: treat the whole token as bare text
        return strip_inline_comment(raw).to_string();
    }

    if let Some(rest) = raw.strip_prefix('\'') {
        if let Some(end) = rest.find('\'') {
            return rest[..end].to_string();
        }
    }

    strip_inline_comment(raw).to_string()
}

fn decode_unicode(hex: &str, width: usize) -> Option<char> {
    if hex.len() != width {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

/// Basic-string escaping: quote, backslash and every control character
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// TOML float text: integral values keep one decimal place
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Parse the global block and every game block
pub fn parse_document(content: &str) -> ConfigDocument {
    let mut doc = ConfigDocument::default();
    let mut section = Section::None;

    for raw_line in content.lines() {
        let line = raw_line.trim();

        if let Some(enabled) = per_game_flag_value(line) {
            doc.global.per_game_profiles = enabled;
            continue;
        }

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let header = strip_inline_comment(line);
        if header.starts_with('[') && header.ends_with(']') {
            let next = match header {
                GLOBAL_HEADER => Section::Global,
                GAME_HEADER => Section::Game(PendingProfile::default()),
                _ => Section::None,
            };
            std::mem::replace(&mut section, next).flush_into(&mut doc.profiles);
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = parse_value(value);

        match &mut section {
            Section::Global => {
                if key == schema::DLL {
                    doc.global.dll = value;
                }
            }
            Section::Game(pending) => {
                if key == EXE_KEY {
                    pending.name = Some(value);
                } else if schema::profile_fields().any(|f| f.name == key) {
                    // Known profile field; conversion failure keeps the default
                    let _ = pending.settings.set_from_text(key, &value);
                }
            }
            Section::None => {}
        }
    }

    section.flush_into(&mut doc.profiles);
    doc
}

/// Parse into one configuration: global block plus the default profile.
///
/// Script-only fields keep their defaults; they never live in this file.
pub fn parse_single(content: &str) -> ConfigurationData {
    let doc = parse_document(content);
    let mut config = schema::defaults();
    config.apply_global(&doc.global);
    if let Some(settings) = doc.profiles.get(DEFAULT_PROFILE) {
        config.apply_profile(settings);
    }
    config
}

fn push_header(lines: &mut Vec<String>, global: &GlobalSection) {
    lines.push(VERSION_LINE.to_string());
    lines.push(String::new());
    lines.push(GLOBAL_HEADER.to_string());
    lines.push("# Global settings".to_string());
    if !global.dll.is_empty() {
        if let Some(field) = schema::spec(schema::DLL) {
            lines.push(format!("# {}", field.description));
        }
        lines.push(format!("{} = \"{}\"", schema::DLL, escape(&global.dll)));
    }
    lines.push("# Enable per-game profiles".to_string());
    lines.push(format!(
        "# {} = {}",
        schema::PER_GAME_PROFILES,
        global.per_game_profiles
    ));
    lines.push(String::new());
}

fn push_game(lines: &mut Vec<String>, comment: &str, name: &str, settings: &ProfileSettings) {
    lines.push(GAME_HEADER.to_string());
    lines.push(format!("# {}", comment));
    lines.push(format!("{} = \"{}\"", EXE_KEY, escape(name)));
    lines.push(String::new());

    for field in schema::profile_fields() {
        lines.push(format!("# {}", field.description));
        match settings.get(field.name) {
            Ok(FieldValue::Bool(b)) => lines.push(format!("{} = {}", field.name, b)),
            Ok(FieldValue::Int(i)) => lines.push(format!("{} = {}", field.name, i)),
            Ok(FieldValue::Float(f)) => {
                lines.push(format!("{} = {}", field.name, format_float(f)))
            }
            Ok(FieldValue::Str(s)) if !s.is_empty() => {
                lines.push(format!("{} = \"{}\"", field.name, escape(&s)))
            }
            _ => {}
        }
        lines.push(String::new());
    }
}

fn finish(lines: Vec<String>) -> String {
    // Every block ends with a blank entry, so the join ends in a newline
    lines.join("\n")
}

/// Global-mode form: one managed `[[game]]` entry for the default profile
pub fn serialize_single(config: &ConfigurationData) -> String {
    let mut lines = Vec::new();
    push_header(&mut lines, &config.global_section());
    push_game(
        &mut lines,
        &format!("Plugin-managed game entry (uses LSFG_PROCESS={})", DEFAULT_PROFILE),
        DEFAULT_PROFILE,
        &config.profile_settings(),
    );
    finish(lines)
}

/// Per-game form: every profile in order, the default one synthesized
/// first from `config` when the map lacks it
pub fn serialize_profiles(config: &ConfigurationData, profiles: &ProfileMap) -> String {
    let default_comment = format!("Default profile (uses LSFG_PROCESS={})", DEFAULT_PROFILE);
    let mut lines = Vec::new();
    push_header(&mut lines, &config.global_section());

    if !profiles.contains(DEFAULT_PROFILE) {
        push_game(
            &mut lines,
            &default_comment,
            DEFAULT_PROFILE,
            &config.profile_settings(),
        );
    }

    for profile in profiles.iter() {
        let comment = if profile.name == DEFAULT_PROFILE {
            default_comment.clone()
        } else {
            format!("Profile for {}", profile.name)
        };
        push_game(&mut lines, &comment, &profile.name, &profile.settings);
    }

    finish(lines)
}
